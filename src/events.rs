use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Frames of the real-time channel, tagged by event name with the payload
/// under `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        table_id: i64,
        #[serde(default)]
        nickname: Option<String>,
    },
    Leave {
        table_id: i64,
        #[serde(default)]
        nickname: Option<String>,
    },
    SendAction {
        table_id: i64,
        user_id: i64,
        action_type: String,
        details: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ReceiveAction {
        author_id: i64,
        author_nickname: String,
        action_type: String,
        details: Value,
        timestamp: String,
    },
    Error {
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn join_frame_deserializes() {
        let event: ClientEvent = serde_json::from_str(
            r#"{"event":"join","data":{"table_id":10,"nickname":"Mestre"}}"#,
        )
        .unwrap();
        assert_eq!(
            event,
            ClientEvent::Join { table_id: 10, nickname: Some("Mestre".to_owned()) }
        );
    }

    #[test]
    fn nickname_hint_is_optional() {
        let event: ClientEvent =
            serde_json::from_str(r#"{"event":"leave","data":{"table_id":10}}"#).unwrap();
        assert_eq!(event, ClientEvent::Leave { table_id: 10, nickname: None });
    }

    #[test]
    fn send_action_requires_all_fields() {
        let missing_user =
            r#"{"event":"send_action","data":{"table_id":10,"action_type":"chat","details":{}}}"#;
        assert!(serde_json::from_str::<ClientEvent>(missing_user).is_err());
    }

    #[test]
    fn receive_action_frame_shape() {
        let event = ServerEvent::ReceiveAction {
            author_id: 1,
            author_nickname: "Mestre".to_owned(),
            action_type: "chat".to_owned(),
            details: json!({"message": "Olá"}),
            timestamp: "21:14:03".to_owned(),
        };
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({
                "event": "receive_action",
                "data": {
                    "author_id": 1,
                    "author_nickname": "Mestre",
                    "action_type": "chat",
                    "details": {"message": "Olá"},
                    "timestamp": "21:14:03",
                },
            })
        );
    }
}

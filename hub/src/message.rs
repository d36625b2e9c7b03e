use crate::connection::Presence;
use crate::queue_state::QueueState;
use axum::extract::ws::Utf8Bytes;
use entity::Id;
use serde::Serialize;

/// Messages pushed to subscribers. Serialized as JSON objects tagged by `type`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum OutboundMessage {
    QueueUpdate(QueueState),
    OnlineUsers { data: Vec<OnlineUser> },
}

/// One row of the "online users" panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OnlineUser {
    pub full_name: String,
    pub id: Id,
    pub username: String,
    pub role: String,
    #[serde(rename = "sector")]
    pub department: String,
}

impl From<&Presence> for OnlineUser {
    fn from(presence: &Presence) -> Self {
        Self {
            full_name: presence.full_name.clone(),
            id: presence.user_id,
            username: presence.username.clone(),
            role: presence.role.clone(),
            department: presence.department.clone(),
        }
    }
}

impl OutboundMessage {
    /// Serializes the message once into a payload that is cheap to clone per subscriber.
    pub fn encode(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queue_state;
    use chrono::Utc;
    use entity::buffer::Buffer;
    use entity::packages;
    use entity::profile::Profile;
    use serde_json::{json, Value};

    #[test]
    fn online_users_uses_the_dashboard_field_names() {
        let id = Id::new_v4();
        let message = OutboundMessage::OnlineUsers {
            data: vec![OnlineUser {
                full_name: "Ana Lima".to_owned(),
                id,
                username: "ana".to_owned(),
                role: "leader".to_owned(),
                department: "Outbound".to_owned(),
            }],
        };

        let value: Value = serde_json::from_str(message.encode().unwrap().as_str()).unwrap();

        assert_eq!(
            value,
            json!({
                "type": "online_users",
                "data": [{
                    "fullName": "Ana Lima",
                    "id": id.to_string(),
                    "username": "ana",
                    "role": "leader",
                    "sector": "Outbound",
                }]
            })
        );
    }

    #[test]
    fn queue_update_is_tagged_and_flattened() {
        let message = OutboundMessage::QueueUpdate(QueueState::empty());

        let value: Value = serde_json::from_str(message.encode().unwrap().as_str()).unwrap();

        assert_eq!(value["type"], "queue_update");
        assert_eq!(value["backlogCount"], 0);
        assert_eq!(value["bufferCounts"], json!({"RTS": 0, "EHA": 0, "SAL": 0}));
        assert_eq!(value["bufferAvgTimes"], json!({"RTS": 0.0, "EHA": 0.0}));
        assert!(value["bufferAvgTimes"].get("SAL").is_none());
    }

    #[test]
    fn queued_packages_use_the_dashboard_field_names() {
        let entered_at = Utc::now();
        let package = packages::Model {
            id: Id::new_v4(),
            tracking_id: "CG000042".to_owned(),
            buffer: Buffer::Eha,
            location: "E-03".to_owned(),
            entry_timestamp: Some(entered_at.into()),
            profile: Profile::Medium,
            profile_value: Profile::Medium.value(),
            active: true,
            created_at: entered_at.into(),
            updated_at: entered_at.into(),
        };
        let message =
            OutboundMessage::QueueUpdate(queue_state::compute(vec![package], entered_at));

        let value: Value = serde_json::from_str(message.encode().unwrap().as_str()).unwrap();
        let item = &value["queue"][0];

        assert_eq!(item["trackingId"], "CG000042");
        assert_eq!(item["buffer"], "EHA");
        assert_eq!(item["location"], "E-03");
        assert_eq!(item["profile"], "M");
        assert_eq!(item["profileValue"], 80);
        assert!(item["entryTimestamp"].is_string());
        assert!(item.get("tracking_id").is_none());
        assert!(item.get("active").is_none());
    }
}

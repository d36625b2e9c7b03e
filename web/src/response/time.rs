use chrono::DateTime;
use domain::time::Tz;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ServerTime {
    /// RFC 3339 timestamp in the display time zone.
    pub server_time: String,
}

impl From<DateTime<Tz>> for ServerTime {
    fn from(now: DateTime<Tz>) -> Self {
        Self {
            server_time: now.to_rfc3339(),
        }
    }
}

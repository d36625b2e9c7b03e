use domain::buffer::Buffer;
use domain::profile::Profile;
use domain::queue::Totals;
use domain::{packages, Id};
use sea_orm::prelude::DateTimeWithTimeZone;
use serde::Serialize;
use std::collections::BTreeMap;
use utoipa::ToSchema;

/// A queued package, named the same way as the items of the live `queue_update` message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueuedPackage {
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    pub tracking_id: String,
    pub buffer: Buffer,
    pub location: String,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub entry_timestamp: Option<DateTimeWithTimeZone>,
    pub profile: Profile,
    pub profile_value: i32,
}

impl From<packages::Model> for QueuedPackage {
    fn from(package: packages::Model) -> Self {
        Self {
            id: package.id,
            tracking_id: package.tracking_id,
            buffer: package.buffer,
            location: package.location,
            entry_timestamp: package.entry_timestamp,
            profile: package.profile,
            profile_value: package.profile_value,
        }
    }
}

/// Packages still waiting to ship, across every buffer but SAL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct BacklogCount {
    pub count: i64,
    pub value: i64,
}

impl From<Totals> for BacklogCount {
    fn from(totals: Totals) -> Self {
        Self {
            count: totals.count,
            value: totals.value,
        }
    }
}

/// Per-buffer counts, summed profile values and average dwell seconds. Dwell times are
/// only reported for RTS and EHA.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BufferCounts {
    #[schema(value_type = Object)]
    pub counts: BTreeMap<Buffer, i64>,
    #[schema(value_type = Object)]
    pub values: BTreeMap<Buffer, i64>,
    #[schema(value_type = Object)]
    pub avg_times: BTreeMap<Buffer, f64>,
}

impl BufferCounts {
    pub fn new(totals: BTreeMap<Buffer, Totals>, avg_times: BTreeMap<Buffer, f64>) -> Self {
        Self {
            counts: totals.iter().map(|(buffer, t)| (*buffer, t.count)).collect(),
            values: totals.iter().map(|(buffer, t)| (*buffer, t.value)).collect(),
            avg_times,
        }
    }
}

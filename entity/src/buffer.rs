use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Named holding areas a package can sit in.
///
/// `Pending` is a sentinel: the tracking code has been issued and printed but the
/// package has not physically entered any buffer yet. `Sal` is the finalized
/// (shipped) area, which is excluded from backlog and dwell time statistics.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    PartialOrd,
    Ord,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Buffer {
    #[sea_orm(string_value = "RTS")]
    #[serde(rename = "RTS")]
    Rts,
    #[sea_orm(string_value = "EHA")]
    #[serde(rename = "EHA")]
    Eha,
    #[sea_orm(string_value = "SAL")]
    #[serde(rename = "SAL")]
    Sal,
    #[sea_orm(string_value = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
}

impl Buffer {
    /// The physical buffers reported on dashboards, in display order.
    pub const TRACKED: [Buffer; 3] = [Buffer::Rts, Buffer::Eha, Buffer::Sal];

    pub fn as_str(&self) -> &'static str {
        match self {
            Buffer::Rts => "RTS",
            Buffer::Eha => "EHA",
            Buffer::Sal => "SAL",
            Buffer::Pending => "PENDING",
        }
    }

    /// Parses a buffer name as sent by clients (case-insensitive).
    pub fn parse(name: &str) -> Option<Buffer> {
        match name.trim().to_ascii_uppercase().as_str() {
            "RTS" => Some(Buffer::Rts),
            "EHA" => Some(Buffer::Eha),
            "SAL" => Some(Buffer::Sal),
            "PENDING" => Some(Buffer::Pending),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        *self == Buffer::Pending
    }

    /// Packages in the finalized buffer are shipped and do not count as backlog.
    pub fn is_finalized(&self) -> bool {
        *self == Buffer::Sal
    }

    /// Whether an average waiting time is meaningful for this buffer.
    pub fn tracks_dwell_time(&self) -> bool {
        matches!(self, Buffer::Rts | Buffer::Eha)
    }
}

impl std::fmt::Display for Buffer {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, Eq, PartialEq, EnumIter, DeriveActiveEnum, Serialize, Deserialize, ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
#[serde(rename_all = "UPPERCASE")]
pub enum AuditAction {
    #[sea_orm(string_value = "ENTRY")]
    Entry,
    #[sea_orm(string_value = "EXIT")]
    Exit,
    #[sea_orm(string_value = "MOVE")]
    Move,
}

impl AuditAction {
    pub fn parse(name: &str) -> Option<AuditAction> {
        match name.trim().to_ascii_uppercase().as_str() {
            "ENTRY" => Some(AuditAction::Entry),
            "EXIT" => Some(AuditAction::Exit),
            "MOVE" => Some(AuditAction::Move),
            _ => None,
        }
    }
}

impl std::fmt::Display for AuditAction {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuditAction::Entry => write!(fmt, "ENTRY"),
            AuditAction::Exit => write!(fmt, "EXIT"),
            AuditAction::Move => write!(fmt, "MOVE"),
        }
    }
}

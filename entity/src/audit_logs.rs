//! `SeaORM` Entity for the append-only audit log.

use crate::{audit_action::AuditAction, Id};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, ToSchema, Serialize, Deserialize)]
#[schema(as = entity::audit_logs::Model)]
#[sea_orm(schema_name = "fifo_platform", table_name = "audit_logs")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    pub actor_username: String,
    pub actor_full_name: String,
    pub action: AuditAction,
    #[sea_orm(column_type = "Text")]
    pub details: String,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

//! `SeaORM` Entity for packages.
//!
//! Rows in this table are never physically removed. A row is created the first time a
//! tracking code is confirmed or entered, which makes the table the ledger of every code
//! ever issued. `active` is the mutable projection on top of that ledger: a package
//! "exits" by becoming inactive.

use crate::{buffer::Buffer, profile::Profile, Id};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, ToSchema, Serialize, Deserialize)]
#[schema(as = entity::packages::Model)]
#[sea_orm(schema_name = "fifo_platform", table_name = "packages")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    #[sea_orm(unique)]
    pub tracking_id: String,
    pub buffer: Buffer,
    pub location: String,
    /// When the package entered its current buffer. `None` while pending.
    #[schema(value_type = Option<String>, format = DateTime)]
    pub entry_timestamp: Option<DateTimeWithTimeZone>,
    pub profile: Profile,
    pub profile_value: i32,
    pub active: bool,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub created_at: DateTimeWithTimeZone,
    #[serde(skip_deserializing)]
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// In the FIFO queue: active and physically inside a buffer.
    pub fn is_queued(&self) -> bool {
        self.active && !self.buffer.is_pending()
    }
}

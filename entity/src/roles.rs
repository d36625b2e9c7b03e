use crate::Id;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A named bundle of permissions.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, ToSchema, Serialize, Deserialize)]
#[schema(as = entity::roles::Model)]
#[sea_orm(schema_name = "fifo_platform", table_name = "roles")]
pub struct Model {
    #[serde(skip_deserializing)]
    #[sea_orm(primary_key)]
    #[schema(value_type = String, format = Uuid)]
    pub id: Id,
    #[sea_orm(unique)]
    pub name: String,
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::users::Entity")]
    Users,
    #[sea_orm(has_many = "super::role_permissions::Entity")]
    RolePermissions,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::role_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermissions.def()
    }
}

impl Related<super::permissions::Entity> for Entity {
    fn to() -> RelationDef {
        super::role_permissions::Relation::Permissions.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::role_permissions::Relation::Roles.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The roles seeded at bootstrap. Other roles may exist in the store; they simply have
/// no special meaning to the system.
#[derive(Debug, Clone, Copy, Eq, PartialEq, EnumIter)]
pub enum RoleName {
    Admin,
    Leader,
    Fifo,
}

impl RoleName {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::Leader => "leader",
            RoleName::Fifo => "fifo",
        }
    }

    pub fn parse(name: &str) -> Option<RoleName> {
        match name {
            "admin" => Some(RoleName::Admin),
            "leader" => Some(RoleName::Leader),
            "fifo" => Some(RoleName::Fifo),
            _ => None,
        }
    }

    /// Admins and leaders supervise the floor: they see who is online.
    pub fn is_privileged(name: &str) -> bool {
        matches!(RoleName::parse(name), Some(RoleName::Admin | RoleName::Leader))
    }
}

impl std::fmt::Display for RoleName {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

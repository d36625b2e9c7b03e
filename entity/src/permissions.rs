use crate::Id;
use sea_orm::entity::prelude::*;
use sea_orm::Iterable;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, ToSchema, Serialize, Deserialize)]
#[schema(as = entity::permissions::Model)]
#[sea_orm(schema_name = "fifo_platform", table_name = "permissions")]
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
    #[sea_orm(has_many = "super::role_permissions::Entity")]
    RolePermissions,
}

impl Related<super::role_permissions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RolePermissions.def()
    }
}

impl Related<super::roles::Entity> for Entity {
    fn to() -> RelationDef {
        super::role_permissions::Relation::Roles.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::role_permissions::Relation::Permissions.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// The closed set of capabilities the system checks for. Stored by name in the
/// `permissions` table.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, EnumIter, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    ManageFifo,
    ViewLogs,
    ViewUsers,
    CreateUser,
    EditUser,
    ResetPassword,
    MovePackage,
    GenerateQrCodes,
}

impl Permission {
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ManageFifo => "MANAGE_FIFO",
            Permission::ViewLogs => "VIEW_LOGS",
            Permission::ViewUsers => "VIEW_USERS",
            Permission::CreateUser => "CREATE_USER",
            Permission::EditUser => "EDIT_USER",
            Permission::ResetPassword => "RESET_PASSWORD",
            Permission::MovePackage => "MOVE_PACKAGE",
            Permission::GenerateQrCodes => "GENERATE_QR_CODES",
        }
    }

    pub fn parse(name: &str) -> Option<Permission> {
        Permission::iter().find(|p| p.as_str() == name)
    }

    pub fn description(&self) -> &'static str {
        match self {
            Permission::ManageFifo => "Can register entries and exits in the queue",
            Permission::ViewLogs => "Can view the activity log",
            Permission::ViewUsers => "Can view the user list",
            Permission::CreateUser => "Can create new users",
            Permission::EditUser => "Can edit the role and department of other users",
            Permission::ResetPassword => "Can reset the password of other users",
            Permission::MovePackage => "Can move a package to a new location",
            Permission::GenerateQrCodes => "Can generate new tracking codes",
        }
    }

    /// Stable bit position used by permission sets.
    pub fn bit(&self) -> u16 {
        1 << (*self as u16)
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.as_str())
    }
}

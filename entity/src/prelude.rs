pub use super::audit_logs::Entity as AuditLogs;
pub use super::packages::Entity as Packages;
pub use super::permissions::Entity as Permissions;
pub use super::role_permissions::Entity as RolePermissions;
pub use super::roles::Entity as Roles;
pub use super::users::Entity as Users;

use uuid::Uuid;

pub mod prelude;

// Queue entities
pub mod audit_action;
pub mod audit_logs;
pub mod buffer;
pub mod packages;
pub mod profile;

// Access control entities
pub mod jwt;
pub mod permissions;
pub mod role_permissions;
pub mod roles;
pub mod users;

/// A type alias that represents any Entity's internal id field data type.
/// Aliased so that it's easy to change the underlying type if necessary.
pub type Id = Uuid;

//! Idempotent bootstrap of the access-control tables and the first administrator.

use super::error::Error;
use crate::user::{self, NewUser};
use entity::permissions::{self, Permission};
use entity::roles::{self, RoleName};
use entity::{role_permissions, Id};
use log::*;
use sea_orm::{
    entity::prelude::*, ActiveValue::Set, ConnectionTrait, DatabaseConnection, Iterable,
    TransactionTrait,
};
use service::config::Config;
use std::collections::HashMap;

/// The exact permission set each seeded role must end up with.
pub fn default_permissions(role: RoleName) -> Vec<Permission> {
    match role {
        RoleName::Admin | RoleName::Leader => Permission::iter().collect(),
        RoleName::Fifo => vec![Permission::ManageFifo, Permission::MovePackage],
    }
}

fn role_description(role: RoleName) -> &'static str {
    match role {
        RoleName::Admin => "Full access to the platform",
        RoleName::Leader => "Supervises the floor and manages operators",
        RoleName::Fifo => "Registers package entries, exits and moves",
    }
}

/// Ensures every permission and seeded role exists and that the seeded roles carry exactly
/// their default permissions. Then creates the configured administrator when no user exists.
/// Safe to run on every start.
pub async fn run(db: &DatabaseConnection, config: &Config) -> Result<(), Error> {
    let txn = db.begin().await?;

    let permission_ids = ensure_permissions(&txn).await?;
    let mut admin_role_id = None;
    for role_name in RoleName::iter() {
        let role = ensure_role(&txn, role_name).await?;
        sync_role_permissions(&txn, &role, &default_permissions(role_name), &permission_ids)
            .await?;
        if role_name == RoleName::Admin {
            admin_role_id = Some(role.id);
        }
    }

    if let Some(role_id) = admin_role_id {
        ensure_admin_user(&txn, config, role_id).await?;
    }

    txn.commit().await?;
    Ok(())
}

async fn ensure_permissions(db: &impl ConnectionTrait) -> Result<HashMap<Permission, Id>, Error> {
    let existing = permissions::Entity::find().all(db).await?;
    let mut ids = HashMap::new();

    for permission in Permission::iter() {
        let id = match existing.iter().find(|p| p.name == permission.as_str()) {
            Some(model) => model.id,
            None => {
                info!("Seeding permission {permission}");
                permissions::ActiveModel {
                    id: Set(Id::new_v4()),
                    name: Set(permission.as_str().to_owned()),
                    description: Set(permission.description().to_owned()),
                }
                .insert(db)
                .await?
                .id
            }
        };
        ids.insert(permission, id);
    }

    Ok(ids)
}

async fn ensure_role(db: &impl ConnectionTrait, role_name: RoleName) -> Result<roles::Model, Error> {
    if let Some(role) = crate::role::find_by_name(db, role_name.as_str()).await? {
        return Ok(role);
    }

    info!("Seeding role {role_name}");
    Ok(roles::ActiveModel {
        id: Set(Id::new_v4()),
        name: Set(role_name.as_str().to_owned()),
        description: Set(role_description(role_name).to_owned()),
    }
    .insert(db)
    .await?)
}

async fn sync_role_permissions(
    db: &impl ConnectionTrait,
    role: &roles::Model,
    wanted: &[Permission],
    permission_ids: &HashMap<Permission, Id>,
) -> Result<(), Error> {
    role_permissions::Entity::delete_many()
        .filter(role_permissions::Column::RoleId.eq(role.id))
        .exec(db)
        .await?;

    for permission in wanted {
        if let Some(permission_id) = permission_ids.get(permission) {
            role_permissions::ActiveModel {
                id: Set(Id::new_v4()),
                role_id: Set(role.id),
                permission_id: Set(*permission_id),
            }
            .insert(db)
            .await?;
        }
    }

    debug!("Role {} granted {} permissions", role.name, wanted.len());
    Ok(())
}

async fn ensure_admin_user(
    db: &impl ConnectionTrait,
    config: &Config,
    admin_role_id: Id,
) -> Result<(), Error> {
    if user::count(db).await? > 0 {
        return Ok(());
    }

    let Some(password) = config.admin_password() else {
        warn!("No users exist and ADMIN_PASSWORD is not set; skipping administrator seed");
        return Ok(());
    };

    user::create(
        db,
        NewUser {
            username: config.admin_username.clone(),
            full_name: config.admin_full_name.clone(),
            password: password.to_owned(),
            department: config.admin_department.clone(),
            role_id: admin_role_id,
        },
    )
    .await?;

    info!("Created administrator {}", config.admin_username);
    Ok(())
}

use crate::error::Error;
use crate::identity::Identity;
use crate::{permissions, roles, users, Id};
use entity::roles::RoleName;
use entity_api::error::EntityApiErrorKind;
use entity_api::role;
use entity_api::user::{self as store, NewUser, UserUpdate};
use log::*;
use sea_orm::ConnectionTrait;
use serde::Serialize;

/// A user as listed in management screens, with its role resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserWithRole {
    #[serde(flatten)]
    pub user: users::Model,
    pub role: Option<roles::Model>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoleWithPermissions {
    #[serde(flatten)]
    pub role: roles::Model,
    pub permissions: Vec<permissions::Model>,
}

#[derive(Debug, Clone, Default)]
pub struct CreateParams {
    pub username: String,
    pub full_name: String,
    pub password: String,
    /// Role name, e.g. `fifo`.
    pub role: String,
    pub department: String,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateParams {
    pub full_name: Option<String>,
    pub role_id: Option<Id>,
    pub department: Option<String>,
}

pub async fn create(db: &impl ConnectionTrait, params: CreateParams) -> Result<users::Model, Error> {
    let username = params.username.trim();
    if username.is_empty()
        || params.full_name.trim().is_empty()
        || params.password.is_empty()
        || params.role.trim().is_empty()
        || params.department.trim().is_empty()
    {
        return Err(Error::validation(
            "username, fullName, password, role and department are required",
        ));
    }

    let role = role::find_by_name(db, params.role.trim())
        .await?
        .ok_or_else(|| Error::validation(format!("Role '{}' does not exist", params.role.trim())))?;

    if store::find_by_username(db, username).await?.is_some() {
        return Err(Error::conflict(format!("Username '{username}' is already taken")));
    }

    let user = store::create(
        db,
        NewUser {
            username: username.to_owned(),
            full_name: params.full_name.trim().to_owned(),
            password: params.password,
            department: params.department.trim().to_owned(),
            role_id: role.id,
        },
    )
    .await
    .map_err(|err| {
        let err = Error::from(err);
        if err.is_duplicate() {
            Error::conflict(format!("Username '{username}' is already taken"))
        } else {
            err
        }
    })?;

    info!("Created user {} with role {}", user.username, role.name);
    Ok(user)
}

pub async fn list(db: &impl ConnectionTrait) -> Result<Vec<UserWithRole>, Error> {
    Ok(store::find_all_with_roles(db)
        .await?
        .into_iter()
        .map(|(user, role)| UserWithRole { user, role })
        .collect())
}

pub async fn roles(db: &impl ConnectionTrait) -> Result<Vec<RoleWithPermissions>, Error> {
    Ok(role::find_all_with_permissions(db)
        .await?
        .into_iter()
        .map(|(role, permissions)| RoleWithPermissions { role, permissions })
        .collect())
}

/// Edits another user's profile. Blank fields are left as they are.
pub async fn update(
    db: &impl ConnectionTrait,
    actor: &Identity,
    target_id: Id,
    params: UpdateParams,
) -> Result<users::Model, Error> {
    let target = authorized_target(db, actor, target_id).await?;

    if let Some(role_id) = params.role_id {
        match role::find_by_id(db, role_id).await {
            Ok(_) => {}
            Err(err) if err.error_kind == EntityApiErrorKind::RecordNotFound => {
                return Err(Error::validation("The selected role does not exist"));
            }
            Err(err) => return Err(err.into()),
        }
    }

    let changes = UserUpdate {
        full_name: non_blank(params.full_name),
        role_id: params.role_id,
        department: non_blank(params.department),
    };
    let user = store::update(db, target, changes).await?;

    info!("{} updated user {}", actor.username, user.username);
    Ok(user)
}

pub async fn reset_password(
    db: &impl ConnectionTrait,
    actor: &Identity,
    target_id: Id,
    new_password: String,
) -> Result<(), Error> {
    if new_password.is_empty() {
        return Err(Error::validation("newPassword is required"));
    }

    let target = authorized_target(db, actor, target_id).await?;
    let user = store::update_password(db, target, new_password).await?;

    info!("{} reset the password of {}", actor.username, user.username);
    Ok(())
}

/// Changes the caller's own password after checking the current one.
pub async fn change_password(
    db: &impl ConnectionTrait,
    user_id: Id,
    old_password: &str,
    new_password: String,
) -> Result<(), Error> {
    if old_password.is_empty() || new_password.is_empty() {
        return Err(Error::validation("oldPassword and newPassword are required"));
    }

    let user = store::find_by_id(db, user_id).await?;
    store::verify_password(old_password, &user.password_hash)?;
    store::update_password(db, user, new_password).await?;

    Ok(())
}

/// Loads the target of an edit or reset and applies the hierarchy rules.
async fn authorized_target(
    db: &impl ConnectionTrait,
    actor: &Identity,
    target_id: Id,
) -> Result<users::Model, Error> {
    if actor.user_id == target_id {
        return Err(Error::forbidden("You cannot perform this action on your own profile"));
    }

    let (target, target_role) = store::find_by_id_with_role(db, target_id).await?;
    check_hierarchy(actor.role_name(), RoleName::parse(&target_role.name))?;

    Ok(target)
}

/// Nobody modifies an admin, and leaders do not modify other leaders.
fn check_hierarchy(actor: Option<RoleName>, target: Option<RoleName>) -> Result<(), Error> {
    match (actor, target) {
        (_, Some(RoleName::Admin)) => Err(Error::forbidden("Administrators cannot be modified")),
        (Some(RoleName::Leader), Some(RoleName::Leader)) => {
            Err(Error::forbidden("Leaders cannot modify other leaders"))
        }
        _ => Ok(()),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;

    fn is_forbidden(result: Result<(), Error>) -> bool {
        matches!(result.unwrap_err().error_kind, DomainErrorKind::Forbidden(_))
    }

    #[test]
    fn admins_are_never_modifiable() {
        assert!(is_forbidden(check_hierarchy(
            Some(RoleName::Admin),
            Some(RoleName::Admin)
        )));
        assert!(is_forbidden(check_hierarchy(
            Some(RoleName::Leader),
            Some(RoleName::Admin)
        )));
    }

    #[test]
    fn leaders_cannot_modify_leaders_but_admins_can() {
        assert!(is_forbidden(check_hierarchy(
            Some(RoleName::Leader),
            Some(RoleName::Leader)
        )));
        assert!(check_hierarchy(Some(RoleName::Admin), Some(RoleName::Leader)).is_ok());
        assert!(check_hierarchy(Some(RoleName::Leader), Some(RoleName::Fifo)).is_ok());
    }

    #[test]
    fn blank_updates_are_ignored() {
        assert_eq!(non_blank(Some("  ".to_owned())), None);
        assert_eq!(non_blank(Some(" Outbound ".to_owned())), Some("Outbound".to_owned()));
        assert_eq!(non_blank(None), None);
    }
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod mock_tests {
    use super::*;
    use crate::error::DomainErrorKind;
    use crate::identity::PermissionSet;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn actor(role: &str) -> Identity {
        Identity {
            user_id: Id::new_v4(),
            username: role.to_owned(),
            full_name: format!("{role} user"),
            role: role.to_owned(),
            department: "Management".to_owned(),
            permissions: PermissionSet::all(),
        }
    }

    fn role(name: &str) -> roles::Model {
        roles::Model {
            id: Id::new_v4(),
            name: name.to_owned(),
            description: String::new(),
        }
    }

    fn user(role: &roles::Model) -> users::Model {
        let now = Utc::now();
        users::Model {
            id: Id::new_v4(),
            username: "target".to_owned(),
            full_name: "Target User".to_owned(),
            password_hash: store::generate_hash("old-password".to_owned()),
            department: "Inbound".to_owned(),
            role_id: role.id,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn acting_on_yourself_is_forbidden() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let actor = actor("admin");

        let result = reset_password(&db, &actor, actor.user_id, "new".to_owned()).await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn a_leader_cannot_reset_another_leader() {
        let leader_role = role("leader");
        let target = user(&leader_role);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[(target.clone(), leader_role.clone())]])
            .into_connection();

        let result = reset_password(&db, &actor("leader"), target.id, "new".to_owned()).await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Forbidden(_)
        ));
    }

    #[tokio::test]
    async fn create_rejects_an_unknown_role() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<roles::Model>::new()])
            .into_connection();

        let result = create(
            &db,
            CreateParams {
                username: "new".to_owned(),
                full_name: "New User".to_owned(),
                password: "secret".to_owned(),
                role: "captain".to_owned(),
                department: "Inbound".to_owned(),
            },
        )
        .await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Validation(_)
        ));
    }

    fn role_change(role_id: Id) -> UpdateParams {
        UpdateParams {
            role_id: Some(role_id),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn update_rejects_an_unknown_role() {
        let fifo_role = role("fifo");
        let target = user(&fifo_role);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[(target.clone(), fifo_role)]])
            .append_query_results([Vec::<roles::Model>::new()])
            .into_connection();

        let result = update(&db, &actor("admin"), target.id, role_change(Id::new_v4())).await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Validation(_)
        ));
    }

    #[tokio::test]
    async fn update_reports_role_lookup_failures_as_internal() {
        let fifo_role = role("fifo");
        let target = user(&fifo_role);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[(target.clone(), fifo_role)]])
            .append_query_errors([DbErr::Custom("connection reset".to_owned())])
            .into_connection();

        let result = update(&db, &actor("admin"), target.id, role_change(Id::new_v4())).await;

        assert!(matches!(
            result.unwrap_err().error_kind,
            DomainErrorKind::Internal(_)
        ));
    }

    #[tokio::test]
    async fn change_password_rejects_a_wrong_old_password() {
        let target = user(&role("fifo"));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[target.clone()]])
            .into_connection();

        let result = change_password(&db, target.id, "not-it", "new".to_owned()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            Error::unauthenticated().error_kind
        );
    }
}

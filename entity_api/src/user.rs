use super::error::{EntityApiErrorKind, Error};
use chrono::Utc;
use entity::roles;
use entity::users::{ActiveModel, Column, Entity, Model};
use entity::Id;
use log::*;
use password_auth;
use sea_orm::{entity::prelude::*, ActiveValue::Set, ConnectionTrait, PaginatorTrait, QueryOrder};

/// Fields accepted when creating a user. The password arrives in clear text and is hashed
/// before it reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub full_name: String,
    pub password: String,
    pub department: String,
    pub role_id: Id,
}

/// Partial update of a user's profile; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdate {
    pub full_name: Option<String>,
    pub role_id: Option<Id>,
    pub department: Option<String>,
}

pub async fn create(db: &impl ConnectionTrait, new_user: NewUser) -> Result<Model, Error> {
    debug!("New user to be inserted: {}", new_user.username);

    let now = Utc::now();
    let user_active_model = ActiveModel {
        id: Set(Id::new_v4()),
        username: Set(new_user.username),
        full_name: Set(new_user.full_name),
        password_hash: Set(generate_hash(new_user.password)),
        department: Set(new_user.department),
        role_id: Set(new_user.role_id),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(user_active_model.insert(db).await?)
}

pub async fn find_by_username(
    db: &impl ConnectionTrait,
    username: &str,
) -> Result<Option<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Username.eq(username))
        .one(db)
        .await?)
}

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

/// Loads a user together with its role.
pub async fn find_by_id_with_role(
    db: &impl ConnectionTrait,
    id: Id,
) -> Result<(Model, roles::Model), Error> {
    match Entity::find_by_id(id)
        .find_also_related(roles::Entity)
        .one(db)
        .await?
    {
        Some((user, Some(role))) => Ok((user, role)),
        _ => Err(Error::not_found()),
    }
}

/// All users ordered by username, each paired with its role.
pub async fn find_all_with_roles(
    db: &impl ConnectionTrait,
) -> Result<Vec<(Model, Option<roles::Model>)>, Error> {
    Ok(Entity::find()
        .find_also_related(roles::Entity)
        .order_by_asc(Column::Username)
        .all(db)
        .await?)
}

pub async fn count(db: &impl ConnectionTrait) -> Result<u64, Error> {
    Ok(Entity::find().count(db).await?)
}

pub async fn update(
    db: &impl ConnectionTrait,
    model: Model,
    changes: UserUpdate,
) -> Result<Model, Error> {
    let mut active_model: ActiveModel = model.into();
    if let Some(full_name) = changes.full_name {
        active_model.full_name = Set(full_name);
    }
    if let Some(role_id) = changes.role_id {
        active_model.role_id = Set(role_id);
    }
    if let Some(department) = changes.department {
        active_model.department = Set(department);
    }
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub async fn update_password(
    db: &impl ConnectionTrait,
    model: Model,
    new_password: String,
) -> Result<Model, Error> {
    let mut active_model: ActiveModel = model.into();
    active_model.password_hash = Set(generate_hash(new_password));
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub fn verify_password(password_to_verify: &str, password_hash: &str) -> Result<(), Error> {
    match password_auth::verify_password(password_to_verify, password_hash) {
        Ok(_) => Ok(()),
        Err(_) => Err(Error {
            source: None,
            error_kind: EntityApiErrorKind::RecordUnauthenticated,
        }),
    }
}

pub fn generate_hash(password: String) -> String {
    password_auth::generate_hash(password)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod test {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn user_model() -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            username: "joao".to_owned(),
            full_name: "Joao Silva".to_owned(),
            password_hash: generate_hash("password".to_owned()),
            department: "Inbound".to_owned(),
            role_id: Id::new_v4(),
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn create_returns_a_new_user_model() -> Result<(), Error> {
        let user = user_model();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[user.clone()]])
            .into_connection();

        let created = create(
            &db,
            NewUser {
                username: user.username.clone(),
                full_name: user.full_name.clone(),
                password: "password".to_owned(),
                department: user.department.clone(),
                role_id: user.role_id,
            },
        )
        .await?;

        assert_eq!(created.id, user.id);
        assert_eq!(created.username, "joao");
        Ok(())
    }

    #[tokio::test]
    async fn find_by_id_returns_not_found_for_missing_user() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = find_by_id(&db, Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn update_only_touches_the_given_fields() -> Result<(), Error> {
        let user = user_model();
        let updated_user = Model {
            department: "Outbound".to_owned(),
            ..user.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[updated_user.clone()]])
            .into_connection();

        let updated = update(
            &db,
            user,
            UserUpdate {
                department: Some("Outbound".to_owned()),
                ..Default::default()
            },
        )
        .await?;

        assert_eq!(updated.department, "Outbound");
        Ok(())
    }

    #[test]
    fn verify_password_rejects_a_wrong_password() {
        let hash = generate_hash("correct horse".to_owned());

        assert!(verify_password("correct horse", &hash).is_ok());
        assert_eq!(
            verify_password("battery staple", &hash)
                .unwrap_err()
                .error_kind,
            EntityApiErrorKind::RecordUnauthenticated
        );
    }
}

use super::error::Error;
use entity::permissions;
use entity::roles::{Column, Entity, Model};
use entity::Id;
use sea_orm::{entity::prelude::*, ConnectionTrait, QueryOrder};

pub async fn find_by_id(db: &impl ConnectionTrait, id: Id) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(Error::not_found)
}

pub async fn find_by_name(db: &impl ConnectionTrait, name: &str) -> Result<Option<Model>, Error> {
    Ok(Entity::find().filter(Column::Name.eq(name)).one(db).await?)
}

/// The permissions granted to `role`, resolved through the junction table.
pub async fn find_permissions(
    db: &impl ConnectionTrait,
    role: &Model,
) -> Result<Vec<permissions::Model>, Error> {
    Ok(role.find_related(permissions::Entity).all(db).await?)
}

/// Every role with its permissions preloaded, ordered by name.
pub async fn find_all_with_permissions(
    db: &impl ConnectionTrait,
) -> Result<Vec<(Model, Vec<permissions::Model>)>, Error> {
    Ok(Entity::find()
        .find_with_related(permissions::Entity)
        .order_by_asc(Column::Name)
        .all(db)
        .await?)
}

use super::error::Error;
use chrono::Utc;
use entity::buffer::Buffer;
use entity::packages::{ActiveModel, Column, Entity, Model};
use entity::profile::Profile;
use entity::Id;
use log::*;
use sea_orm::{
    entity::prelude::*, sea_query::Expr, ActiveValue::Set, ConnectionTrait, QueryOrder,
    QuerySelect, Select,
};

/// Where a package is being placed and with which tier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub buffer: Buffer,
    pub location: String,
    pub profile: Profile,
    pub entered_at: DateTimeWithTimeZone,
}

/// Count and summed profile value of a set of packages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Totals {
    pub count: i64,
    pub value: i64,
}

/// Looks a tracking code up in the ledger. With `include_inactive` the lookup also sees
/// packages that have exited.
pub async fn find_by_tracking_id(
    db: &impl ConnectionTrait,
    tracking_id: &str,
    include_inactive: bool,
) -> Result<Option<Model>, Error> {
    Ok(by_tracking_id(tracking_id, include_inactive).one(db).await?)
}

/// Same lookup as [`find_by_tracking_id`], but the row stays locked (`FOR UPDATE`) until the
/// surrounding transaction ends. Concurrent entries or exits of one code queue up behind it.
pub async fn find_by_tracking_id_for_update(
    txn: &impl ConnectionTrait,
    tracking_id: &str,
    include_inactive: bool,
) -> Result<Option<Model>, Error> {
    Ok(by_tracking_id(tracking_id, include_inactive)
        .lock_exclusive()
        .one(txn)
        .await?)
}

/// Loads an active package and locks its row for the rest of the transaction.
pub async fn find_active_by_id_for_update(
    txn: &impl ConnectionTrait,
    id: Id,
) -> Result<Model, Error> {
    Entity::find_by_id(id)
        .filter(Column::Active.eq(true))
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or_else(Error::not_found)
}

fn by_tracking_id(tracking_id: &str, include_inactive: bool) -> Select<Entity> {
    let query = Entity::find().filter(Column::TrackingId.eq(tracking_id));
    if include_inactive {
        query
    } else {
        query.filter(Column::Active.eq(true))
    }
}

/// Creates a package for a tracking code that has never been seen before.
pub async fn create(
    db: &impl ConnectionTrait,
    tracking_id: &str,
    placement: Placement,
) -> Result<Model, Error> {
    debug!("Creating package {tracking_id} in {:?}", placement.buffer);

    let now = Utc::now();
    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        tracking_id: Set(tracking_id.to_owned()),
        buffer: Set(placement.buffer),
        location: Set(placement.location),
        entry_timestamp: Set(Some(placement.entered_at)),
        profile: Set(placement.profile),
        profile_value: Set(placement.profile.value()),
        active: Set(true),
        created_at: Set(now.into()),
        updated_at: Set(now.into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Records freshly issued codes as pending packages. Fails as a whole with `DuplicateKey`
/// when any code already exists, so callers should run it inside a transaction.
pub async fn create_pending(
    db: &impl ConnectionTrait,
    tracking_ids: &[String],
) -> Result<Vec<Model>, Error> {
    let now = Utc::now();
    let mut created = Vec::with_capacity(tracking_ids.len());

    for tracking_id in tracking_ids {
        let active_model = ActiveModel {
            id: Set(Id::new_v4()),
            tracking_id: Set(tracking_id.clone()),
            buffer: Set(Buffer::Pending),
            location: Set(UNASSIGNED_LOCATION.to_owned()),
            entry_timestamp: Set(None),
            profile: Set(Profile::NotApplicable),
            profile_value: Set(Profile::NotApplicable.value()),
            active: Set(true),
            created_at: Set(now.into()),
            updated_at: Set(now.into()),
        };
        created.push(active_model.insert(db).await?);
    }

    Ok(created)
}

/// Location given to pending packages that have not been placed yet.
pub const UNASSIGNED_LOCATION: &str = "UNASSIGNED";

/// Puts an existing ledger entry (exited or pending) back into the queue.
pub async fn reactivate(
    db: &impl ConnectionTrait,
    model: Model,
    placement: Placement,
) -> Result<Model, Error> {
    debug!("Reactivating package {}", model.tracking_id);

    let mut active_model: ActiveModel = model.into();
    active_model.buffer = Set(placement.buffer);
    active_model.location = Set(placement.location);
    active_model.entry_timestamp = Set(Some(placement.entered_at));
    active_model.profile = Set(placement.profile);
    active_model.profile_value = Set(placement.profile.value());
    active_model.active = Set(true);
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

pub async fn update_location(
    db: &impl ConnectionTrait,
    model: Model,
    location: &str,
) -> Result<Model, Error> {
    let mut active_model: ActiveModel = model.into();
    active_model.location = Set(location.to_owned());
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

/// Marks a package as exited. The row stays in the ledger so its code is never reissued.
pub async fn deactivate(db: &impl ConnectionTrait, model: Model) -> Result<Model, Error> {
    let mut active_model: ActiveModel = model.into();
    active_model.active = Set(false);
    active_model.updated_at = Set(Utc::now().into());

    Ok(active_model.update(db).await?)
}

/// Every package currently in the FIFO queue, oldest entry first.
pub async fn find_queue(db: &impl ConnectionTrait) -> Result<Vec<Model>, Error> {
    Ok(Entity::find()
        .filter(Column::Active.eq(true))
        .filter(Column::Buffer.ne(Buffer::Pending))
        .order_by_asc(Column::EntryTimestamp)
        .all(db)
        .await?)
}

/// Count and value of the queued packages, ignoring the given buffers.
pub async fn totals_excluding(
    db: &impl ConnectionTrait,
    excluded: &[Buffer],
) -> Result<Totals, Error> {
    let mut query = Entity::find()
        .select_only()
        .column_as(Column::Id.count(), "count")
        .column_as(Expr::cust("COALESCE(SUM(\"profile_value\"), 0)"), "value")
        .filter(Column::Active.eq(true))
        .filter(Column::Buffer.ne(Buffer::Pending));
    for buffer in excluded {
        query = query.filter(Column::Buffer.ne(*buffer));
    }

    let totals = query.into_tuple::<(i64, i64)>().one(db).await?;
    Ok(totals
        .map(|(count, value)| Totals { count, value })
        .unwrap_or_default())
}

/// Count and value of the active packages in one buffer.
pub async fn totals_in_buffer(db: &impl ConnectionTrait, buffer: Buffer) -> Result<Totals, Error> {
    let totals = Entity::find()
        .select_only()
        .column_as(Column::Id.count(), "count")
        .column_as(Expr::cust("COALESCE(SUM(\"profile_value\"), 0)"), "value")
        .filter(Column::Active.eq(true))
        .filter(Column::Buffer.eq(buffer))
        .into_tuple::<(i64, i64)>()
        .one(db)
        .await?;

    Ok(totals
        .map(|(count, value)| Totals { count, value })
        .unwrap_or_default())
}

/// Every tracking code ever recorded with the given prefix, active or not.
pub async fn find_issued_tracking_ids(
    db: &impl ConnectionTrait,
    prefix: &str,
) -> Result<Vec<String>, Error> {
    Ok(Entity::find()
        .select_only()
        .column(Column::TrackingId)
        .filter(Column::TrackingId.starts_with(prefix))
        .into_tuple::<String>()
        .all(db)
        .await?)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use crate::error::EntityApiErrorKind;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn package_model(tracking_id: &str, buffer: Buffer, active: bool) -> Model {
        let now = Utc::now();
        Model {
            id: Id::new_v4(),
            tracking_id: tracking_id.to_owned(),
            buffer,
            location: "R-01".to_owned(),
            entry_timestamp: Some(now.into()),
            profile: Profile::Small,
            profile_value: Profile::Small.value(),
            active,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[tokio::test]
    async fn find_by_tracking_id_returns_the_matching_package() -> Result<(), Error> {
        let package = package_model("CG000001", Buffer::Rts, false);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[package.clone()]])
            .into_connection();

        let found = find_by_tracking_id(&db, "CG000001", true).await?;

        assert_eq!(found, Some(package));
        Ok(())
    }

    #[tokio::test]
    async fn find_active_by_id_for_update_returns_not_found_for_missing_rows() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        let result = find_active_by_id_for_update(&db, Id::new_v4()).await;

        assert_eq!(
            result.unwrap_err().error_kind,
            EntityApiErrorKind::RecordNotFound
        );
    }

    #[tokio::test]
    async fn locking_lookups_select_for_update() -> Result<(), Error> {
        let package = package_model("CG000001", Buffer::Rts, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[package.clone()]])
            .append_query_results([[package.clone()]])
            .into_connection();

        find_by_tracking_id_for_update(&db, "CG000001", true).await?;
        find_active_by_id_for_update(&db, package.id).await?;

        let log = db.into_transaction_log();
        assert_eq!(log.len(), 2);
        for transaction in log {
            assert!(format!("{transaction:?}").contains("FOR UPDATE"));
        }
        Ok(())
    }

    #[tokio::test]
    async fn plain_lookups_take_no_lock() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<Model>::new()])
            .into_connection();

        find_by_tracking_id(&db, "CG000001", false).await?;

        let log = db.into_transaction_log();
        assert!(!format!("{log:?}").contains("FOR UPDATE"));
        Ok(())
    }

    #[tokio::test]
    async fn create_pending_inserts_every_code() -> Result<(), Error> {
        let first = package_model("CG000001", Buffer::Pending, true);
        let second = package_model("CG000002", Buffer::Pending, true);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[first.clone()]])
            .append_query_results([[second.clone()]])
            .into_connection();

        let created =
            create_pending(&db, &["CG000001".to_owned(), "CG000002".to_owned()]).await?;

        assert_eq!(created.len(), 2);
        assert_eq!(created[1].tracking_id, "CG000002");
        Ok(())
    }

    #[tokio::test]
    async fn deactivate_returns_the_updated_model() -> Result<(), Error> {
        let package = package_model("CG000003", Buffer::Eha, true);
        let exited = Model {
            active: false,
            ..package.clone()
        };
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[exited.clone()]])
            .into_connection();

        let updated = deactivate(&db, package).await?;

        assert!(!updated.active);
        assert_eq!(updated.tracking_id, "CG000003");
        Ok(())
    }

    #[tokio::test]
    async fn find_queue_propagates_database_errors() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".to_owned())])
            .into_connection();

        let result = find_queue(&db).await;

        assert_eq!(result.unwrap_err().error_kind, EntityApiErrorKind::SystemError);
    }
}

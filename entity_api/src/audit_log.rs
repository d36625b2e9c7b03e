use super::error::Error;
use chrono::Utc;
use entity::audit_action::AuditAction;
use entity::audit_logs::{ActiveModel, Column, Entity, Model};
use entity::Id;
use sea_orm::{
    entity::prelude::*,
    sea_query::{Expr, Func, SimpleExpr},
    ActiveValue::Set,
    ConnectionTrait, QueryOrder,
};

/// Optional narrowing of an audit log listing. Empty filter lists everything.
#[derive(Debug, Clone, Default)]
pub struct Filter {
    /// Case-insensitive substring of the actor's username.
    pub username: Option<String>,
    /// Case-insensitive substring of the actor's full name.
    pub full_name: Option<String>,
    pub action: Option<AuditAction>,
    /// Inclusive lower and exclusive upper bound on `created_at`.
    pub period: Option<(DateTimeWithTimeZone, DateTimeWithTimeZone)>,
}

/// Appends one entry to the audit log.
pub async fn append(
    db: &impl ConnectionTrait,
    actor_username: &str,
    actor_full_name: &str,
    action: AuditAction,
    details: String,
) -> Result<Model, Error> {
    let active_model = ActiveModel {
        id: Set(Id::new_v4()),
        actor_username: Set(actor_username.to_owned()),
        actor_full_name: Set(actor_full_name.to_owned()),
        action: Set(action),
        details: Set(details),
        created_at: Set(Utc::now().into()),
    };

    Ok(active_model.insert(db).await?)
}

/// Lists audit entries matching `filter`, newest first.
pub async fn find_by(db: &impl ConnectionTrait, filter: Filter) -> Result<Vec<Model>, Error> {
    let mut query = Entity::find();

    if let Some(username) = filter.username {
        query = query.filter(contains_ignore_case(Column::ActorUsername, &username));
    }
    if let Some(full_name) = filter.full_name {
        query = query.filter(contains_ignore_case(Column::ActorFullName, &full_name));
    }
    if let Some(action) = filter.action {
        query = query.filter(Column::Action.eq(action));
    }
    if let Some((from, until)) = filter.period {
        query = query
            .filter(Column::CreatedAt.gte(from))
            .filter(Column::CreatedAt.lt(until));
    }

    Ok(query.order_by_desc(Column::CreatedAt).all(db).await?)
}

fn contains_ignore_case(column: Column, needle: &str) -> SimpleExpr {
    Expr::expr(Func::lower(Expr::col((Entity, column))))
        .like(format!("%{}%", needle.to_lowercase()))
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn log_model(action: AuditAction) -> Model {
        Model {
            id: Id::new_v4(),
            actor_username: "maria".to_owned(),
            actor_full_name: "Maria Souza".to_owned(),
            action,
            details: "Package CG000001 entered buffer RTS at location R-01".to_owned(),
            created_at: Utc::now().into(),
        }
    }

    #[tokio::test]
    async fn append_returns_the_new_entry() -> Result<(), Error> {
        let entry = log_model(AuditAction::Entry);
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[entry.clone()]])
            .into_connection();

        let appended = append(
            &db,
            "maria",
            "Maria Souza",
            AuditAction::Entry,
            entry.details.clone(),
        )
        .await?;

        assert_eq!(appended.action, AuditAction::Entry);
        assert_eq!(appended.actor_username, "maria");
        Ok(())
    }

    #[tokio::test]
    async fn find_by_returns_all_rows_from_the_store() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[log_model(AuditAction::Exit), log_model(AuditAction::Move)]])
            .into_connection();

        let filter = Filter {
            username: Some("MAR".to_owned()),
            ..Default::default()
        };
        let logs = find_by(&db, filter).await?;

        assert_eq!(logs.len(), 2);
        Ok(())
    }
}

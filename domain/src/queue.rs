//! Read-only views of the FIFO queue served over HTTP.

use crate::error::Error;
use crate::packages;
use entity::buffer::Buffer;
use entity_api::package;
use sea_orm::ConnectionTrait;
use std::collections::BTreeMap;

pub use entity_api::package::Totals;

/// Every queued package, oldest entry first.
pub async fn find_queue(db: &impl ConnectionTrait) -> Result<Vec<packages::Model>, Error> {
    Ok(package::find_queue(db).await?)
}

/// Count and value of the backlog: queued packages that have not reached the finalized
/// buffer.
pub async fn backlog(db: &impl ConnectionTrait) -> Result<Totals, Error> {
    let finalized: Vec<Buffer> = Buffer::TRACKED
        .into_iter()
        .filter(Buffer::is_finalized)
        .collect();
    Ok(package::totals_excluding(db, &finalized).await?)
}

/// Count and value per dashboard buffer.
pub async fn buffer_totals(db: &impl ConnectionTrait) -> Result<BTreeMap<Buffer, Totals>, Error> {
    let mut totals = BTreeMap::new();
    for buffer in Buffer::TRACKED {
        totals.insert(buffer, package::totals_in_buffer(db, buffer).await?);
    }
    Ok(totals)
}

#[cfg(test)]
// We need to gate seaORM's mock feature behind conditional compilation because
// the feature removes the Clone trait implementation from seaORM's DatabaseConnection.
// see https://github.com/SeaQL/sea-orm/issues/830
#[cfg(feature = "mock")]
mod tests {
    use super::*;
    use sea_orm::{DatabaseBackend, MockDatabase, Value};
    use std::collections::BTreeMap as Row;

    fn totals_row(count: i64, value: i64) -> Row<&'static str, Value> {
        Row::from([("count", count.into()), ("value", value.into())])
    }

    #[tokio::test]
    async fn buffer_totals_reports_every_dashboard_buffer() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[totals_row(3, 340)]])
            .append_query_results([[totals_row(1, 80)]])
            .append_query_results([[totals_row(0, 0)]])
            .into_connection();

        let totals = buffer_totals(&db).await?;

        assert_eq!(totals[&Buffer::Rts], Totals { count: 3, value: 340 });
        assert_eq!(totals[&Buffer::Eha], Totals { count: 1, value: 80 });
        assert_eq!(totals[&Buffer::Sal], Totals::default());
        Ok(())
    }

    #[tokio::test]
    async fn backlog_reads_a_single_aggregate() -> Result<(), Error> {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([[totals_row(4, 420)]])
            .into_connection();

        assert_eq!(backlog(&db).await?, Totals { count: 4, value: 420 });
        Ok(())
    }
}

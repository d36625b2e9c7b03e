//! Aggregate view of the FIFO queue pushed to dashboards.

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use entity::buffer::Buffer;
use entity::packages;
use entity::profile::Profile;
use entity::Id;
use entity_api::error::Error;
use log::*;
use sea_orm::{AccessMode, DatabaseConnection, IsolationLevel, TransactionTrait};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueState {
    /// Queued packages, oldest entry first.
    pub queue: Vec<QueuedPackage>,
    pub backlog_count: i64,
    pub backlog_value: i64,
    pub buffer_counts: BTreeMap<Buffer, i64>,
    pub buffer_values: BTreeMap<Buffer, i64>,
    /// Average dwell time in seconds, only for buffers where waiting is meaningful.
    pub buffer_avg_times: BTreeMap<Buffer, f64>,
}

/// A queued package as dashboards read it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuedPackage {
    pub id: Id,
    pub tracking_id: String,
    pub buffer: Buffer,
    pub location: String,
    pub entry_timestamp: Option<DateTime<FixedOffset>>,
    pub profile: Profile,
    pub profile_value: i32,
}

impl From<&packages::Model> for QueuedPackage {
    fn from(package: &packages::Model) -> Self {
        Self {
            id: package.id,
            tracking_id: package.tracking_id.clone(),
            buffer: package.buffer,
            location: package.location.clone(),
            entry_timestamp: package.entry_timestamp,
            profile: package.profile,
            profile_value: package.profile_value,
        }
    }
}

impl QueueState {
    pub fn empty() -> Self {
        Self {
            queue: Vec::new(),
            backlog_count: 0,
            backlog_value: 0,
            buffer_counts: Buffer::TRACKED.iter().map(|b| (*b, 0)).collect(),
            buffer_values: Buffer::TRACKED.iter().map(|b| (*b, 0)).collect(),
            buffer_avg_times: Buffer::TRACKED
                .iter()
                .filter(|b| b.tracks_dwell_time())
                .map(|b| (*b, 0.0))
                .collect(),
        }
    }
}

/// Derives the queue state from the active packages. `now` is captured once by the caller
/// so every dwell time in a snapshot is measured against the same instant.
pub fn compute(packages: Vec<packages::Model>, now: DateTime<Utc>) -> QueueState {
    let mut state = QueueState::empty();
    let mut dwell_totals: BTreeMap<Buffer, f64> = BTreeMap::new();

    let queue: Vec<packages::Model> = packages.into_iter().filter(|p| p.is_queued()).collect();

    for package in &queue {
        let value = i64::from(package.profile_value);

        if !package.buffer.is_finalized() {
            state.backlog_count += 1;
            state.backlog_value += value;
        }

        *state.buffer_counts.entry(package.buffer).or_insert(0) += 1;
        *state.buffer_values.entry(package.buffer).or_insert(0) += value;

        if package.buffer.tracks_dwell_time() {
            *dwell_totals.entry(package.buffer).or_insert(0.0) += dwell_seconds(package, now);
        }
    }

    for (buffer, average) in state.buffer_avg_times.iter_mut() {
        let count = state.buffer_counts.get(buffer).copied().unwrap_or(0);
        if count > 0 {
            *average = dwell_totals.get(buffer).copied().unwrap_or(0.0) / count as f64;
        }
    }

    state.queue = queue.iter().map(QueuedPackage::from).collect();
    state
}

/// Seconds since the package entered its buffer, never negative. Packages that never
/// entered contribute zero.
fn dwell_seconds(package: &packages::Model, now: DateTime<Utc>) -> f64 {
    match package.entry_timestamp {
        Some(entered_at) => {
            let elapsed = now.signed_duration_since(entered_at.with_timezone(&Utc));
            (elapsed.num_milliseconds() as f64 / 1000.0).max(0.0)
        }
        None => 0.0,
    }
}

/// Read side of the store the hub recomputes snapshots from.
#[async_trait]
pub trait QueueStateSource: Send + Sync {
    /// Active, non-pending packages ordered by entry time.
    async fn active_packages(&self) -> Result<Vec<packages::Model>, Error>;
}

/// Reads the queue from the database inside a read-only transaction.
pub struct StoreSource {
    db: Arc<DatabaseConnection>,
}

impl StoreSource {
    pub fn new(db: &Arc<DatabaseConnection>) -> Self {
        Self { db: Arc::clone(db) }
    }
}

#[async_trait]
impl QueueStateSource for StoreSource {
    async fn active_packages(&self) -> Result<Vec<packages::Model>, Error> {
        let txn = self
            .db
            .begin_with_config(
                Some(IsolationLevel::RepeatableRead),
                Some(AccessMode::ReadOnly),
            )
            .await?;
        let packages = entity_api::package::find_queue(&txn).await?;
        txn.commit().await?;
        Ok(packages)
    }
}

/// Computes a fresh snapshot. A failed read yields the empty state; the failure is only
/// logged because a broadcast must never take the hub down.
pub async fn snapshot(source: &dyn QueueStateSource) -> QueueState {
    let now = Utc::now();
    match source.active_packages().await {
        Ok(packages) => compute(packages, now),
        Err(e) => {
            error!("Failed to read queue state, broadcasting an empty snapshot: {e}");
            QueueState::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn package(buffer: Buffer, profile: Profile, entered: Option<DateTime<Utc>>) -> packages::Model {
        let now = Utc::now();
        packages::Model {
            id: Id::new_v4(),
            tracking_id: "CG000001".to_owned(),
            buffer,
            location: "R-01".to_owned(),
            entry_timestamp: entered.map(Into::into),
            profile,
            profile_value: profile.value(),
            active: true,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    #[test]
    fn three_profiles_in_rts_add_up_to_340() {
        let now = Utc::now();
        let packages = vec![
            package(Buffer::Rts, Profile::Small, Some(now)),
            package(Buffer::Rts, Profile::Medium, Some(now)),
            package(Buffer::Rts, Profile::Large, Some(now)),
        ];

        let state = compute(packages, now);

        assert_eq!(state.buffer_counts[&Buffer::Rts], 3);
        assert_eq!(state.buffer_values[&Buffer::Rts], 340);
        assert_eq!(state.backlog_count, 3);
        assert_eq!(state.backlog_value, 340);
        assert_eq!(state.queue.len(), 3);
    }

    #[test]
    fn finalized_buffer_is_counted_but_not_backlog() {
        let now = Utc::now();
        let packages = vec![
            package(Buffer::Eha, Profile::Small, Some(now)),
            package(Buffer::Sal, Profile::NotApplicable, Some(now)),
        ];

        let state = compute(packages, now);

        assert_eq!(state.backlog_count, 1);
        assert_eq!(state.backlog_value, 250);
        assert_eq!(state.buffer_counts[&Buffer::Sal], 1);
        assert!(!state.buffer_avg_times.contains_key(&Buffer::Sal));
    }

    #[test]
    fn empty_buffers_average_exactly_zero() {
        let state = compute(Vec::new(), Utc::now());

        assert_eq!(state.buffer_avg_times[&Buffer::Rts], 0.0);
        assert_eq!(state.buffer_avg_times[&Buffer::Eha], 0.0);
        assert!(!state.buffer_avg_times[&Buffer::Rts].is_nan());
    }

    #[test]
    fn dwell_times_are_averaged_and_clamped() {
        let now = Utc::now();
        let packages = vec![
            package(Buffer::Rts, Profile::Small, Some(now - Duration::seconds(100))),
            package(Buffer::Rts, Profile::Small, Some(now - Duration::seconds(50))),
            // Clock skew: entered "after" now.
            package(Buffer::Eha, Profile::Medium, Some(now + Duration::seconds(30))),
            // Never entered.
            package(Buffer::Eha, Profile::Medium, None),
        ];

        let state = compute(packages, now);

        assert_eq!(state.buffer_avg_times[&Buffer::Rts], 75.0);
        assert_eq!(state.buffer_avg_times[&Buffer::Eha], 0.0);
    }

    #[test]
    fn inactive_and_pending_packages_are_ignored() {
        let now = Utc::now();
        let mut exited = package(Buffer::Rts, Profile::Small, Some(now));
        exited.active = false;
        let pending = package(Buffer::Pending, Profile::NotApplicable, None);

        let state = compute(vec![exited, pending], now);

        assert!(state.queue.is_empty());
        assert_eq!(state, QueueState::empty());
    }

    struct FailingSource;

    #[async_trait]
    impl QueueStateSource for FailingSource {
        async fn active_packages(&self) -> Result<Vec<packages::Model>, Error> {
            Err(sea_orm::DbErr::Custom("connection refused".to_owned()).into())
        }
    }

    #[tokio::test]
    async fn snapshot_falls_back_to_the_empty_state_on_read_errors() {
        assert_eq!(snapshot(&FailingSource).await, QueueState::empty());
    }
}

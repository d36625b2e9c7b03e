//! Entry, exit and move of packages in the FIFO queue.
//!
//! Each operation runs in one transaction together with its audit entry, so a failed audit
//! write rolls the package change back. A [`DomainEvent`] is published only after commit.

use crate::error::Error;
use crate::identity::Identity;
use crate::{packages, Id};
use chrono::Utc;
use entity::audit_action::AuditAction;
use entity::buffer::Buffer;
use entity::profile::Profile;
use entity_api::audit_log;
use entity_api::package::{self as store, Placement};
use events::{DomainEvent, EventPublisher};
use log::*;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde_json::Value;

/// A package entry as submitted by a client, before validation.
#[derive(Debug, Clone, Default)]
pub struct EntryParams {
    pub tracking_id: String,
    pub buffer: String,
    pub location: String,
    pub profile: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MoveOutcome {
    Moved(packages::Model),
    /// The package already sits at the requested location; nothing was written.
    Unchanged(packages::Model),
}

impl MoveOutcome {
    pub fn package(&self) -> &packages::Model {
        match self {
            MoveOutcome::Moved(package) | MoveOutcome::Unchanged(package) => package,
        }
    }
}

/// Registers a package in a buffer.
///
/// A code never seen before creates a new package. A code that exited earlier, or that
/// was issued but never entered, is put back in the queue. A code that is currently
/// queued is a conflict.
pub async fn enter(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    actor: &Identity,
    params: EntryParams,
) -> Result<packages::Model, Error> {
    let tracking_id = required(&params.tracking_id, "trackingId")?;
    let location = required(&params.location, "location")?;
    let buffer = entry_buffer(&params.buffer)?;
    let profile = entry_profile(buffer, params.profile.as_deref())?;

    let placement = Placement {
        buffer,
        location: location.to_owned(),
        profile,
        entered_at: Utc::now().into(),
    };

    let txn = db.begin().await?;

    let package = match store::find_by_tracking_id_for_update(&txn, tracking_id, true).await? {
        None => store::create(&txn, tracking_id, placement).await,
        Some(existing) if existing.is_queued() => {
            return Err(Error::conflict(format!(
                "Package {} is already queued in buffer {} at location {}",
                existing.tracking_id, existing.buffer, existing.location
            )));
        }
        Some(existing) => store::reactivate(&txn, existing, placement).await,
    }
    .map_err(duplicate_as_conflict(tracking_id))?;

    audit_log::append(
        &txn,
        &actor.username,
        &actor.full_name,
        AuditAction::Entry,
        entry_details(&package),
    )
    .await?;

    txn.commit().await?;
    info!(
        "{} registered {} in {} at {}",
        actor.username, package.tracking_id, package.buffer, package.location
    );

    publisher
        .publish(DomainEvent::PackageEntered {
            package_id: package.id,
            tracking_id: package.tracking_id.clone(),
            package: to_value(&package),
            actor_id: actor.user_id,
        })
        .await;

    Ok(package)
}

/// Takes a queued package out of the FIFO. The row is kept (inactive) so its code is
/// never issued again.
pub async fn exit(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    actor: &Identity,
    tracking_id: &str,
) -> Result<packages::Model, Error> {
    let tracking_id = required(tracking_id, "trackingId")?;

    let txn = db.begin().await?;

    let package = store::find_by_tracking_id_for_update(&txn, tracking_id, false)
        .await?
        .ok_or_else(Error::not_found)?;

    if package.buffer.is_pending() {
        return Err(Error::conflict(format!(
            "Package {tracking_id} is pending and has not entered the queue"
        )));
    }

    audit_log::append(
        &txn,
        &actor.username,
        &actor.full_name,
        AuditAction::Exit,
        exit_details(&package),
    )
    .await?;
    let package = store::deactivate(&txn, package).await?;

    txn.commit().await?;
    info!("{} removed {} from the queue", actor.username, package.tracking_id);

    publisher
        .publish(DomainEvent::PackageExited {
            package_id: package.id,
            tracking_id: package.tracking_id.clone(),
            actor_id: actor.user_id,
        })
        .await;

    Ok(package)
}

/// Moves an active package to another location. Moving it where it already is changes
/// nothing: no audit entry and no event.
pub async fn move_to(
    db: &DatabaseConnection,
    publisher: &EventPublisher,
    actor: &Identity,
    package_id: Id,
    location: &str,
) -> Result<MoveOutcome, Error> {
    let location = required(location, "location")?;

    let txn = db.begin().await?;

    let package = store::find_active_by_id_for_update(&txn, package_id).await?;
    if package.location == location {
        txn.rollback().await?;
        debug!("Package {} already at {location}", package.tracking_id);
        return Ok(MoveOutcome::Unchanged(package));
    }

    let from_location = package.location.clone();
    audit_log::append(
        &txn,
        &actor.username,
        &actor.full_name,
        AuditAction::Move,
        move_details(&package, location),
    )
    .await?;
    let package = store::update_location(&txn, package, location).await?;

    txn.commit().await?;
    info!(
        "{} moved {} from {from_location} to {}",
        actor.username, package.tracking_id, package.location
    );

    publisher
        .publish(DomainEvent::PackageMoved {
            package_id: package.id,
            tracking_id: package.tracking_id.clone(),
            from_location,
            package: to_value(&package),
            actor_id: actor.user_id,
        })
        .await;

    Ok(MoveOutcome::Moved(package))
}

fn required<'a>(value: &'a str, field: &str) -> Result<&'a str, Error> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(value)
}

fn entry_buffer(name: &str) -> Result<Buffer, Error> {
    match Buffer::parse(name) {
        Some(Buffer::Pending) => Err(Error::validation(
            "Packages cannot be entered into the PENDING buffer",
        )),
        Some(buffer) => Ok(buffer),
        None => Err(Error::validation(format!(
            "Unknown buffer '{}'. Use RTS, EHA or SAL",
            name.trim()
        ))),
    }
}

/// The finalized buffer always gets the N/A profile; the others require P, M or G.
fn entry_profile(buffer: Buffer, code: Option<&str>) -> Result<Profile, Error> {
    if buffer.is_finalized() {
        return Ok(Profile::NotApplicable);
    }

    match code.map(str::trim).filter(|c| !c.is_empty()) {
        None => Err(Error::validation(format!(
            "A profile is required for buffer {buffer}"
        ))),
        Some(code) => Profile::parse(code).ok_or_else(|| {
            Error::validation(format!("Invalid profile '{code}'. Use P, M or G"))
        }),
    }
}

/// A unique-constraint violation here means a concurrent entry of the same code won.
fn duplicate_as_conflict(
    tracking_id: &str,
) -> impl FnOnce(entity_api::error::Error) -> Error + '_ {
    move |err| {
        let err = Error::from(err);
        if err.is_duplicate() {
            Error::conflict(format!("Package {tracking_id} is already registered"))
        } else {
            err
        }
    }
}

fn profile_fragment(profile: Profile) -> String {
    if profile.is_applicable() {
        format!(" (profile {profile})")
    } else {
        String::new()
    }
}

fn entry_details(package: &packages::Model) -> String {
    format!(
        "Package {}{} entered buffer {} at location {}",
        package.tracking_id,
        profile_fragment(package.profile),
        package.buffer,
        package.location
    )
}

fn exit_details(package: &packages::Model) -> String {
    format!(
        "Package {}{} left buffer {} at location {}",
        package.tracking_id,
        profile_fragment(package.profile),
        package.buffer,
        package.location
    )
}

fn move_details(package: &packages::Model, to: &str) -> String {
    format!(
        "Package {}{} moved from location {} to {}",
        package.tracking_id,
        profile_fragment(package.profile),
        package.location,
        to
    )
}

fn to_value(package: &packages::Model) -> Value {
    serde_json::to_value(package).unwrap_or_else(|e| {
        warn!("Failed to serialize package {}: {e}", package.tracking_id);
        Value::Null
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;

    fn package(buffer: Buffer, profile: Profile) -> packages::Model {
        let now = Utc::now();
        packages::Model {
            id: Id::new_v4(),
            tracking_id: "CG000001".to_owned(),
            buffer,
            location: "R-01".to_owned(),
            entry_timestamp: Some(now.into()),
            profile,
            profile_value: profile.value(),
            active: true,
            created_at: now.into(),
            updated_at: now.into(),
        }
    }

    fn is_validation(result: Result<impl std::fmt::Debug, Error>) -> bool {
        matches!(result.unwrap_err().error_kind, DomainErrorKind::Validation(_))
    }

    #[test]
    fn pending_and_unknown_buffers_are_rejected() {
        assert!(is_validation(entry_buffer("PENDING")));
        assert!(is_validation(entry_buffer("DOCK")));
        assert_eq!(entry_buffer(" eha ").unwrap(), Buffer::Eha);
    }

    #[test]
    fn queue_buffers_require_a_valid_profile() {
        assert!(is_validation(entry_profile(Buffer::Rts, None)));
        assert!(is_validation(entry_profile(Buffer::Eha, Some(" "))));
        assert!(is_validation(entry_profile(Buffer::Rts, Some("XL"))));
        assert!(is_validation(entry_profile(Buffer::Rts, Some("N/A"))));
        assert_eq!(entry_profile(Buffer::Rts, Some("m")).unwrap(), Profile::Medium);
    }

    #[test]
    fn the_finalized_buffer_forces_not_applicable() {
        assert_eq!(
            entry_profile(Buffer::Sal, Some("P")).unwrap(),
            Profile::NotApplicable
        );
        assert_eq!(entry_profile(Buffer::Sal, None).unwrap(), Profile::NotApplicable);
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        assert!(is_validation(required("   ", "location")));
        assert_eq!(required(" R-02 ", "location").unwrap(), "R-02");
    }

    #[test]
    fn audit_details_mention_the_profile_only_when_applicable() {
        assert_eq!(
            entry_details(&package(Buffer::Rts, Profile::Small)),
            "Package CG000001 (profile P) entered buffer RTS at location R-01"
        );
        assert_eq!(
            entry_details(&package(Buffer::Sal, Profile::NotApplicable)),
            "Package CG000001 entered buffer SAL at location R-01"
        );
        assert_eq!(
            exit_details(&package(Buffer::Eha, Profile::Large)),
            "Package CG000001 (profile G) left buffer EHA at location R-01"
        );
        assert_eq!(
            move_details(&package(Buffer::Rts, Profile::Medium), "R-07"),
            "Package CG000001 (profile M) moved from location R-01 to R-07"
        );
    }
}

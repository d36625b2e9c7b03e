//! The tracking code ledger.
//!
//! Every code ever recorded, active or not, is a permanent fact: generation always skips
//! codes that appear anywhere in the packages table, so an exited package's code is never
//! handed out again. Generating does not reserve anything; codes become issued once they
//! are confirmed (printed) and stored as pending packages.

use crate::error::Error;
use crate::packages;
use entity_api::package;
use log::*;
use sea_orm::{ConnectionTrait, DatabaseConnection, TransactionTrait};
use std::collections::HashSet;

pub const CODE_PREFIX: &str = "CG";

/// Upper bound on codes generated or confirmed in one request.
pub const MAX_BATCH: usize = 1000;

pub fn format_code(sequence: u32) -> String {
    format!("{CODE_PREFIX}{sequence:06}")
}

/// The first `quantity` codes in sequence order that are not in `issued`.
pub fn next_codes(issued: &HashSet<String>, quantity: usize) -> Vec<String> {
    (1..=u32::MAX)
        .map(format_code)
        .filter(|code| !issued.contains(code))
        .take(quantity)
        .collect()
}

/// Proposes the next `quantity` unused codes.
pub async fn generate(db: &impl ConnectionTrait, quantity: i64) -> Result<Vec<String>, Error> {
    let quantity = batch_size(quantity)?;
    let issued: HashSet<String> = package::find_issued_tracking_ids(db, CODE_PREFIX)
        .await?
        .into_iter()
        .collect();

    let codes = next_codes(&issued, quantity);
    debug!(
        "Generated {} code(s) skipping {} issued",
        codes.len(),
        issued.len()
    );
    Ok(codes)
}

/// Records printed codes as pending packages. All or nothing: if any code already exists
/// the whole batch is rejected.
pub async fn confirm(
    db: &DatabaseConnection,
    tracking_ids: Vec<String>,
) -> Result<Vec<packages::Model>, Error> {
    let tracking_ids: Vec<String> = tracking_ids
        .into_iter()
        .map(|id| id.trim().to_owned())
        .collect();

    if tracking_ids.is_empty() || tracking_ids.iter().any(String::is_empty) {
        return Err(Error::validation("trackingIds must be a non-empty list of codes"));
    }
    if tracking_ids.len() > MAX_BATCH {
        return Err(Error::validation(format!(
            "At most {MAX_BATCH} codes can be confirmed at once"
        )));
    }
    let unique: HashSet<&String> = tracking_ids.iter().collect();
    if unique.len() != tracking_ids.len() {
        return Err(Error::conflict("The same code appears more than once"));
    }

    let txn = db.begin().await?;
    let created = package::create_pending(&txn, &tracking_ids)
        .await
        .map_err(|err| {
            let err = Error::from(err);
            if err.is_duplicate() {
                Error::conflict("One or more codes have already been issued")
            } else {
                err
            }
        })?;
    txn.commit().await?;

    info!("Confirmed {} tracking code(s)", created.len());
    Ok(created)
}

/// Finds a code in the full history, including packages that have exited.
pub async fn find(db: &impl ConnectionTrait, tracking_id: &str) -> Result<packages::Model, Error> {
    package::find_by_tracking_id(db, tracking_id.trim(), true)
        .await?
        .ok_or_else(Error::not_found)
}

fn batch_size(quantity: i64) -> Result<usize, Error> {
    match usize::try_from(quantity) {
        Ok(n) if (1..=MAX_BATCH).contains(&n) => Ok(n),
        _ => Err(Error::validation(format!(
            "quantity must be between 1 and {MAX_BATCH}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomainErrorKind;

    #[test]
    fn codes_are_prefixed_and_zero_padded() {
        assert_eq!(format_code(1), "CG000001");
        assert_eq!(format_code(123456), "CG123456");
    }

    #[test]
    fn next_codes_starts_at_one() {
        assert_eq!(
            next_codes(&HashSet::new(), 3),
            vec!["CG000001", "CG000002", "CG000003"]
        );
    }

    #[test]
    fn next_codes_skips_every_issued_code() {
        let issued: HashSet<String> = ["CG000001", "CG000002", "CG000004"]
            .into_iter()
            .map(String::from)
            .collect();

        assert_eq!(
            next_codes(&issued, 3),
            vec!["CG000003", "CG000005", "CG000006"]
        );
    }

    #[test]
    fn quantity_must_be_positive_and_bounded() {
        for quantity in [0, -5, MAX_BATCH as i64 + 1] {
            assert!(matches!(
                batch_size(quantity).unwrap_err().error_kind,
                DomainErrorKind::Validation(_)
            ));
        }
        assert_eq!(batch_size(10).unwrap(), 10);
    }
}

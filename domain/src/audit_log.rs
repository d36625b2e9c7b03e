use crate::audit_logs;
use crate::error::Error;
use chrono::{DateTime, Days, FixedOffset, NaiveDate, TimeZone};
use chrono_tz::Tz;
use entity::audit_action::AuditAction;
use entity_api::audit_log::{self, Filter};
use entity_api::naive_date_parse_str;
use sea_orm::ConnectionTrait;

/// Audit log filters as they arrive in a query string. Empty values are ignored.
#[derive(Debug, Clone, Default)]
pub struct LogQuery {
    pub username: Option<String>,
    pub full_name: Option<String>,
    pub action: Option<String>,
    /// `YYYY-MM-DD`. Only applied together with `end_date`.
    pub start_date: Option<String>,
    /// `YYYY-MM-DD`, inclusive of the whole day.
    pub end_date: Option<String>,
}

/// Lists audit entries, newest first. Dates are calendar days in `timezone`.
pub async fn find_by(
    db: &impl ConnectionTrait,
    query: LogQuery,
    timezone: Tz,
) -> Result<Vec<audit_logs::Model>, Error> {
    let filter = to_filter(query, timezone)?;
    Ok(audit_log::find_by(db, filter).await?)
}

fn to_filter(query: LogQuery, timezone: Tz) -> Result<Filter, Error> {
    let action = match present(query.action) {
        Some(name) => Some(AuditAction::parse(&name).ok_or_else(|| {
            Error::validation(format!("Unknown action '{name}'. Use ENTRY, EXIT or MOVE"))
        })?),
        None => None,
    };

    let period = match (present(query.start_date), present(query.end_date)) {
        (Some(start), Some(end)) => Some(day_range(
            parse_day(&start)?,
            parse_day(&end)?,
            timezone,
        )?),
        _ => None,
    };

    Ok(Filter {
        username: present(query.username),
        full_name: present(query.full_name),
        action,
        period,
    })
}

/// From the first instant of `start` to the first instant after `end`.
fn day_range(
    start: NaiveDate,
    end: NaiveDate,
    timezone: Tz,
) -> Result<(DateTime<FixedOffset>, DateTime<FixedOffset>), Error> {
    if end < start {
        return Err(Error::validation("endDate must not be before startDate"));
    }
    let day_after_end = end
        .checked_add_days(Days::new(1))
        .ok_or_else(|| Error::validation("endDate is out of range"))?;

    Ok((
        start_of_day(start, timezone)?,
        start_of_day(day_after_end, timezone)?,
    ))
}

fn start_of_day(day: NaiveDate, timezone: Tz) -> Result<DateTime<FixedOffset>, Error> {
    let midnight = day
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| Error::validation("Invalid date"))?;
    timezone
        .from_local_datetime(&midnight)
        .earliest()
        .map(|at| at.fixed_offset())
        .ok_or_else(|| Error::validation("Invalid date for the configured time zone"))
}

fn parse_day(value: &str) -> Result<NaiveDate, Error> {
    naive_date_parse_str(value.trim())
        .map_err(|_| Error::validation(format!("Invalid date '{value}'. Use YYYY-MM-DD")))
}

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
}

use crate::error::Error;
use chrono::{DateTime, Utc};
use log::*;

pub use chrono_tz::Tz;

/// Parses an IANA zone name such as `America/Sao_Paulo`.
pub fn display_timezone(name: &str) -> Result<Tz, Error> {
    name.parse().map_err(|_| {
        warn!("Invalid display time zone '{name}'");
        Error::config()
    })
}

/// Current server time in the configured display time zone.
pub fn server_time(timezone: &str) -> Result<DateTime<Tz>, Error> {
    let tz = display_timezone(timezone)?;
    Ok(Utc::now().with_timezone(&tz))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_time_uses_the_requested_zone() {
        let now = server_time("America/Sao_Paulo").unwrap();
        assert_eq!(now.timezone(), chrono_tz::America::Sao_Paulo);
    }

    #[test]
    fn unknown_zones_are_a_config_error() {
        assert!(server_time("Mars/Olympus_Mons").is_err());
        assert!(display_timezone("").is_err());
    }
}

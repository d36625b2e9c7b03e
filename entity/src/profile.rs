use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Size/value tier of a package. The monetary weight of each tier is fixed.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Hash,
    Default,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Profile {
    #[sea_orm(string_value = "P")]
    #[serde(rename = "P")]
    Small,
    #[sea_orm(string_value = "M")]
    #[serde(rename = "M")]
    Medium,
    #[sea_orm(string_value = "G")]
    #[serde(rename = "G")]
    Large,
    #[sea_orm(string_value = "N/A")]
    #[serde(rename = "N/A")]
    #[default]
    NotApplicable,
}

impl Profile {
    pub fn code(&self) -> &'static str {
        match self {
            Profile::Small => "P",
            Profile::Medium => "M",
            Profile::Large => "G",
            Profile::NotApplicable => "N/A",
        }
    }

    /// Parses one of the tier codes a client may submit. `N/A` is never accepted from
    /// clients; it is assigned by the system.
    pub fn parse(code: &str) -> Option<Profile> {
        match code.trim().to_ascii_uppercase().as_str() {
            "P" => Some(Profile::Small),
            "M" => Some(Profile::Medium),
            "G" => Some(Profile::Large),
            _ => None,
        }
    }

    pub fn value(&self) -> i32 {
        match self {
            Profile::Small => 250,
            Profile::Medium => 80,
            Profile::Large => 10,
            Profile::NotApplicable => 0,
        }
    }

    pub fn is_applicable(&self) -> bool {
        *self != Profile::NotApplicable
    }
}

impl std::fmt::Display for Profile {
    fn fmt(&self, fmt: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(fmt, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_follow_the_tier_table() {
        assert_eq!(Profile::Small.value(), 250);
        assert_eq!(Profile::Medium.value(), 80);
        assert_eq!(Profile::Large.value(), 10);
        assert_eq!(Profile::NotApplicable.value(), 0);
    }

    #[test]
    fn parse_rejects_not_applicable_and_unknown_codes() {
        assert_eq!(Profile::parse("p"), Some(Profile::Small));
        assert_eq!(Profile::parse("G"), Some(Profile::Large));
        assert_eq!(Profile::parse("N/A"), None);
        assert_eq!(Profile::parse("XL"), None);
    }
}

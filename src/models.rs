//! Domain vocabulary shared by storage, analytics and views
//!
//! Statuses and levels are stored as TEXT in SQLite. Each enum round-trips
//! through `as_str` / `FromStr` so repositories can reject unknown values
//! at the storage boundary instead of passing raw strings around.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;

use crate::error::TrackerError;

/// Date format used for every stored calendar date
pub const DATE_FORMAT: &str = "%Y-%m-%d";

macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
        #[serde(rename_all = "snake_case")]
        #[ts(export)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl FromStr for $name {
            type Err = TrackerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(TrackerError::InvalidInput(format!(
                        "{} '{}' is not valid. Valid values: {:?}",
                        stringify!($name),
                        other,
                        [$($text),+]
                    ))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

text_enum!(
    /// Lifecycle status of a project
    ProjectStatus {
        Planned => "planned",
        InProgress => "in_progress",
        Completed => "completed",
        Delayed => "delayed",
        Cancelled => "cancelled",
    }
);

text_enum!(
    /// Administrative level of a policy objective
    ObjectiveLevel {
        National => "national",
        Provincial => "provincial",
        Territorial => "territorial",
    }
);

text_enum!(
    PhaseStatus {
        Planned => "planned",
        InProgress => "in_progress",
        Completed => "completed",
        Blocked => "blocked",
    }
);

text_enum!(
    /// Kind of planning alert
    AlertType {
        Delay => "delay",
        Blocked => "blocked",
        BudgetDrift => "budget_drift",
    }
);

text_enum!(
    Severity {
        Low => "low",
        Medium => "medium",
        High => "high",
        Critical => "critical",
    }
);

impl Severity {
    /// High and critical alerts mark a project as at risk
    pub fn is_at_risk(&self) -> bool {
        matches!(self, Severity::High | Severity::Critical)
    }
}

/// A deliverable expected from a phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Deliverable {
    pub name: String,
    #[serde(default)]
    pub done: bool,
}

/// Named evidence backing a maturity assessment (reference only, no content)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub reference: Option<String>,
}

/// Parse an optional `YYYY-MM-DD` field, naming the field on failure
pub fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, TrackerError> {
    match value {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
            .map(Some)
            .map_err(|e| {
                TrackerError::InvalidInput(format!("{} '{}' is not a valid date: {}", field, s, e))
            }),
    }
}

/// Serde helper for PATCH fields: absent stays `None`, `null` becomes
/// `Some(None)` and clears the stored value. Pair with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Resolve a patched date against the stored one
pub fn patch_date(
    field: &str,
    update: &Option<Option<String>>,
    current: Option<NaiveDate>,
) -> Result<Option<NaiveDate>, TrackerError> {
    match update {
        None => Ok(current),
        Some(value) => parse_date(field, value.as_deref()),
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_text() {
        for status in PhaseStatus::ALL {
            assert_eq!(status.as_str().parse::<PhaseStatus>().unwrap(), *status);
        }
        assert_eq!("budget_drift".parse::<AlertType>().unwrap(), AlertType::BudgetDrift);
    }

    #[test]
    fn test_unknown_value_is_invalid_input() {
        let err = "paused".parse::<ProjectStatus>().unwrap_err();
        assert!(matches!(err, TrackerError::InvalidInput(_)));
    }

    #[test]
    fn test_at_risk_severities() {
        assert!(Severity::Critical.is_at_risk());
        assert!(Severity::High.is_at_risk());
        assert!(!Severity::Medium.is_at_risk());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("planned_end", Some("2024-01-10")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10)
        );
        assert_eq!(parse_date("planned_end", Some("")).unwrap(), None);
        assert!(parse_date("planned_end", Some("10/01/2024")).is_err());
    }
}

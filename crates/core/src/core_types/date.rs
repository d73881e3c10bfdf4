//! Target calendar date (`MM-DD`) and day-of-year resolution

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Leap year used to resolve Feb 29 when the target year has none
const LEAP_REFERENCE_YEAR: i32 = 2000;

/// Errors from parsing a `MM-DD` date string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DateParseError {
    /// Not of the form `MM-DD`
    #[error("date '{0}' is not in MM-DD form")]
    Format(String),
    /// Month or day out of range for any year
    #[error("date '{0}' does not name a calendar day")]
    OutOfRange(String),
}

/// Month and day the risk estimate is for
///
/// Serialises as its `MM-DD` string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TargetDate {
    /// Month (1-12)
    pub month: u32,
    /// Day of month (1-31)
    pub day: u32,
}

impl TargetDate {
    /// Mid-July; substituted when a request carries an unusable date
    pub const MID_JULY: TargetDate = TargetDate { month: 7, day: 15 };

    /// Create a date, checking it exists in a leap year
    pub fn new(month: u32, day: u32) -> Result<Self, DateParseError> {
        if NaiveDate::from_ymd_opt(LEAP_REFERENCE_YEAR, month, day).is_none() {
            return Err(DateParseError::OutOfRange(format!("{month:02}-{day:02}")));
        }
        Ok(Self { month, day })
    }

    /// Day of year (1-366) in `year`
    ///
    /// Feb 29 in a non-leap year resolves against a leap year.
    pub fn day_of_year(self, year: i32) -> u32 {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
            .or_else(|| NaiveDate::from_ymd_opt(LEAP_REFERENCE_YEAR, self.month, self.day))
            .map_or(196, |d| d.ordinal())
    }

    /// Meteorological summer month in the northern hemisphere (Jun-Aug)
    pub fn is_june_to_august(self) -> bool {
        matches!(self.month, 6..=8)
    }

    /// Meteorological winter month in the northern hemisphere (Dec-Feb)
    pub fn is_december_to_february(self) -> bool {
        matches!(self.month, 12 | 1 | 2)
    }

    /// Spring or autumn month (Mar-May, Sep-Nov)
    pub fn is_transition_season(self) -> bool {
        matches!(self.month, 3..=5 | 9..=11)
    }
}

impl FromStr for TargetDate {
    type Err = DateParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let (month, day) = trimmed
            .split_once('-')
            .ok_or_else(|| DateParseError::Format(trimmed.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| DateParseError::Format(trimmed.to_string()))?;
        let day: u32 = day
            .parse()
            .map_err(|_| DateParseError::Format(trimmed.to_string()))?;
        Self::new(month, day).map_err(|_| DateParseError::OutOfRange(trimmed.to_string()))
    }
}

impl fmt::Display for TargetDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl TryFrom<String> for TargetDate {
    type Error = DateParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TargetDate> for String {
    fn from(date: TargetDate) -> Self {
        date.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_dates() {
        assert_eq!("07-15".parse::<TargetDate>().unwrap(), TargetDate::MID_JULY);
        assert_eq!("1-3".parse::<TargetDate>().unwrap(), TargetDate { month: 1, day: 3 });
        assert_eq!("02-29".parse::<TargetDate>().unwrap().to_string(), "02-29");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(matches!("0715".parse::<TargetDate>(), Err(DateParseError::Format(_))));
        assert!(matches!("xx-01".parse::<TargetDate>(), Err(DateParseError::Format(_))));
        assert!(matches!("13-01".parse::<TargetDate>(), Err(DateParseError::OutOfRange(_))));
        assert!(matches!("04-31".parse::<TargetDate>(), Err(DateParseError::OutOfRange(_))));
    }

    #[test]
    fn test_serde_as_string() {
        assert_eq!(serde_json::to_string(&TargetDate::MID_JULY).unwrap(), "\"07-15\"");
        let back: TargetDate = serde_json::from_str("\"12-31\"").unwrap();
        assert_eq!(back, TargetDate { month: 12, day: 31 });
        assert!(serde_json::from_str::<TargetDate>("\"02-30\"").is_err());
    }

    #[test]
    fn test_day_of_year() {
        assert_eq!(TargetDate::MID_JULY.day_of_year(2023), 196);
        assert_eq!(TargetDate::MID_JULY.day_of_year(2024), 197);
        assert_eq!(TargetDate { month: 1, day: 1 }.day_of_year(2023), 1);
        // Feb 29 in a common year falls back to the leap calendar
        assert_eq!(TargetDate { month: 2, day: 29 }.day_of_year(2023), 60);
    }

    #[test]
    fn test_season_helpers() {
        assert!(TargetDate::MID_JULY.is_june_to_august());
        assert!(TargetDate { month: 1, day: 10 }.is_december_to_february());
        assert!(TargetDate { month: 10, day: 10 }.is_transition_season());
        assert!(!TargetDate { month: 12, day: 10 }.is_transition_season());
    }
}

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";
pub const TIME_FORMAT: &str = "%H:%M";

/// Rejected user input.
///
/// These are raised at the input boundary (web forms, JSON bodies, CLI flags)
/// before anything reaches the scheduler. Messages are safe to show to the user.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("Title is required.")]
    EmptyTitle,

    #[error("Minutes must be a positive integer, got {0}.")]
    NonPositiveDuration(i64),

    #[error("Impact must be a non-negative number, got {0}.")]
    InvalidImpact(f64),

    #[error("Invalid deadline '{0}', expected YYYY-MM-DD.")]
    InvalidDate(String),

    #[error("Invalid start time '{0}', expected HH:MM.")]
    InvalidTime(String),

    #[error("{field} must be numeric, got '{value}'.")]
    NotANumber { field: &'static str, value: String },

    #[error("Hours must be greater than 0 and at most 24, got {0}.")]
    InvalidHours(f64),

    #[error("Urgency window must be at least one day.")]
    InvalidUrgencyWindow,

    #[error("Days must be between 1 and {max}, got {got}.")]
    InvalidDays { got: u32, max: u32 },

    #[error("A {budget_minutes} minute day starting at {start} does not end before midnight.")]
    DayOverflow { start: String, budget_minutes: u32 },
}

/// Parse an optional `YYYY-MM-DD` deadline. Blank input means "no deadline".
pub fn parse_deadline(raw: Option<&str>) -> Result<Option<NaiveDate>, ValidationError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
            .map(Some)
            .map_err(|_| ValidationError::InvalidDate(s.to_string())),
    }
}

/// Parse an `HH:MM` wall-clock time.
pub fn parse_time(raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, TIME_FORMAT)
        .map_err(|_| ValidationError::InvalidTime(raw.to_string()))
}

pub fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyTitle);
    }
    Ok(title.to_string())
}

pub fn validate_minutes(minutes: i64) -> Result<u32, ValidationError> {
    if minutes <= 0 {
        return Err(ValidationError::NonPositiveDuration(minutes));
    }
    u32::try_from(minutes).map_err(|_| ValidationError::NonPositiveDuration(minutes))
}

pub fn validate_impact(impact: f64) -> Result<f64, ValidationError> {
    if !impact.is_finite() || impact < 0.0 {
        return Err(ValidationError::InvalidImpact(impact));
    }
    Ok(impact)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_deadline_is_none() {
        assert_eq!(parse_deadline(None).unwrap(), None);
        assert_eq!(parse_deadline(Some("  ")).unwrap(), None);
    }

    #[test]
    fn deadline_must_be_iso_date() {
        assert_eq!(
            parse_deadline(Some("2024-02-30")),
            Err(ValidationError::InvalidDate("2024-02-30".to_string()))
        );
        assert_eq!(
            parse_deadline(Some("2024-03-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 3, 1)
        );
    }

    #[test]
    fn rejects_non_positive_minutes() {
        assert!(validate_minutes(0).is_err());
        assert!(validate_minutes(-15).is_err());
        assert_eq!(validate_minutes(45), Ok(45));
    }

    #[test]
    fn rejects_negative_or_nan_impact() {
        assert!(validate_impact(-1.0).is_err());
        assert!(validate_impact(f64::NAN).is_err());
        assert_eq!(validate_impact(0.0), Ok(0.0));
    }

    #[test]
    fn parses_start_time() {
        assert_eq!(parse_time("09:30"), Ok(NaiveTime::from_hms_opt(9, 30, 0).unwrap()));
        assert!(parse_time("9.30").is_err());
    }
}

// Query-parameter validation shared by the read-only endpoints
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use thiserror::Error;

// Date-time layouts accepted without an offset; the calendar date is taken as written
const NAIVE_DATE_TIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

// Client-facing validation failures; the only errors these endpoints report
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing or invalid entityId parameter")]
    MissingEntityId,

    #[error("Missing or invalid checkIn parameter")]
    MissingCheckIn,

    #[error("Invalid checkIn date format")]
    InvalidCheckIn,

    #[error("Invalid date range")]
    InvalidDateRange,

    #[error("Missing or invalid placeId parameter")]
    MissingPlaceId,
}

impl ValidationError {
    pub fn message(&self) -> &'static str {
        match self {
            ValidationError::MissingEntityId => {
                "Please provide a valid entity ID as a query parameter: ?entityId=..."
            }
            ValidationError::MissingCheckIn => {
                "Please provide a valid check-in date as ISO string: ?checkIn=2024-01-15"
            }
            ValidationError::InvalidCheckIn => {
                "Please provide checkIn as ISO date string (e.g., 2024-01-15)"
            }
            ValidationError::InvalidDateRange => "Check-out date must be after check-in date",
            ValidationError::MissingPlaceId => {
                "Please provide a valid Google Place ID as a query parameter: ?placeId=..."
            }
        }
    }
}

// Lookup result for one query parameter
#[derive(Debug, PartialEq, Eq)]
pub enum Param<'a> {
    Missing,
    Single(&'a str),
    Repeated,
}

// Empty values count as missing; any of `names` counts towards repetition
pub fn single_param<'a>(pairs: &'a [(String, String)], names: &[&str]) -> Param<'a> {
    let mut values = pairs
        .iter()
        .filter(|(key, _)| names.contains(&key.as_str()))
        .map(|(_, value)| value.as_str());

    match (values.next(), values.next()) {
        (None, _) => Param::Missing,
        (Some(value), None) if value.is_empty() => Param::Missing,
        (Some(value), None) => Param::Single(value),
        (Some(_), Some(_)) => Param::Repeated,
    }
}

// Required, non-empty, given exactly once
pub fn required_param<'a>(
    pairs: &'a [(String, String)],
    names: &[&str],
    err: ValidationError,
) -> Result<&'a str, ValidationError> {
    match single_param(pairs, names) {
        Param::Single(value) => Ok(value),
        Param::Missing | Param::Repeated => Err(err),
    }
}

fn parse_naive_date_time(raw: &str) -> Option<NaiveDate> {
    NAIVE_DATE_TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|dt| dt.date())
}

/// Parses an ISO-8601 calendar date or date-time into a date.
///
/// - `YYYY-MM-DD`
/// - RFC 3339 timestamps, and offsets on a time without seconds
///   (`2024-01-15T10:00+02:00`): reduced to their UTC date
/// - a trailing `Z` on any accepted layout: UTC
/// - date-times without an offset (`2024-01-15T10:00:00`,
///   `2024-01-15T10:00:00.000`, `2024-01-15T10:00`): date as written
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    if let Some(utc) = raw.strip_suffix(['Z', 'z']) {
        return parse_naive_date_time(utc);
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%:z") {
        return Some(dt.with_timezone(&Utc).date_naive());
    }
    parse_naive_date_time(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test_case("2024-01-15", "2024-01-15" ; "plain date")]
    #[test_case("2024-01-15T23:30:00-02:00", "2024-01-16" ; "rfc3339 with offset")]
    #[test_case("2024-01-15T10:00:00.000Z", "2024-01-15" ; "rfc3339 utc millis")]
    #[test_case("2024-01-15T10:00:00", "2024-01-15" ; "date time without offset")]
    #[test_case("2024-01-15T10:00:00.000", "2024-01-15" ; "date time millis without offset")]
    #[test_case("2024-01-15T10:00", "2024-01-15" ; "minutes without offset")]
    #[test_case("2024-01-15T10:00Z", "2024-01-15" ; "minutes utc")]
    #[test_case("2024-01-15T23:30-02:00", "2024-01-16" ; "minutes with offset")]
    #[test_case(" 2024-01-15 ", "2024-01-15" ; "surrounding whitespace")]
    fn test_parse_date_accepts(raw: &str, expected: &str) {
        let expected = NaiveDate::parse_from_str(expected, "%Y-%m-%d").unwrap();
        assert_eq!(parse_date(raw), Some(expected));
    }

    #[test_case("15/01/2024" ; "day first")]
    #[test_case("next tuesday" ; "words")]
    #[test_case("2024-02-30" ; "impossible day")]
    #[test_case("2024-01-15T25:00" ; "impossible hour")]
    #[test_case("" ; "empty")]
    fn test_parse_date_rejects(raw: &str) {
        assert_eq!(parse_date(raw), None);
    }

    #[test]
    fn test_single_param_lookup() {
        let params = pairs(&[("placeId", "p1"), ("a", ""), ("b", "1"), ("b", "2")]);

        assert_eq!(single_param(&params, &["placeId"]), Param::Single("p1"));
        assert_eq!(single_param(&params, &["a"]), Param::Missing);
        assert_eq!(single_param(&params, &["missing"]), Param::Missing);
        assert_eq!(single_param(&params, &["b"]), Param::Repeated);
    }

    #[test]
    fn test_required_param_reports_given_error() {
        let params = pairs(&[("placeId", "a"), ("placeId", "b")]);

        assert_eq!(
            required_param(&params, &["placeId"], ValidationError::MissingPlaceId),
            Err(ValidationError::MissingPlaceId)
        );
        assert_eq!(
            ValidationError::MissingPlaceId.to_string(),
            "Missing or invalid placeId parameter"
        );
    }
}

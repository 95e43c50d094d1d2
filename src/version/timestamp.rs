//! Timestamp wire format: `YYYY-MM-DDTHH:MM:SSZ`

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serializer};

pub const FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

pub fn format(timestamp: &DateTime<Utc>) -> String {
    timestamp.format(FORMAT).to_string()
}

/// Parse any RFC 3339 timestamp into UTC
pub fn parse(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Truncate to the precision that survives persistence
pub fn truncate(timestamp: DateTime<Utc>) -> DateTime<Utc> {
    parse(&timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)).unwrap_or(timestamp)
}

/// Serde adapter for `Option<DateTime<Utc>>` fields
pub mod option {
    use super::*;

    pub fn serialize<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(timestamp) => serializer.serialize_some(&format(timestamp)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<String>::deserialize(deserializer)?;
        match raw {
            None => Ok(None),
            Some(value) if value.trim().is_empty() => Ok(None),
            Some(value) => parse(&value)
                .map(Some)
                .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{value}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn format_uses_second_precision_with_z_suffix() {
        let ts = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 5).unwrap();
        assert_eq!(format(&ts), "2024-01-15T10:30:05Z");
    }

    #[rstest]
    #[case("2024-01-15T10:30:05Z")]
    #[case("2024-01-15T10:30:05.123456Z")]
    #[case("2024-01-15T12:30:05+02:00")]
    fn parse_accepts_rfc3339_variants(#[case] input: &str) {
        let parsed = parse(input).unwrap();
        assert_eq!(format(&parsed), "2024-01-15T10:30:05Z");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse("yesterday"), None);
    }

    #[test]
    fn truncate_drops_subsecond_precision() {
        let precise = parse("2024-01-15T10:30:05.987Z").unwrap();
        assert_eq!(truncate(precise), parse("2024-01-15T10:30:05Z").unwrap());
    }
}

use chrono::{DateTime, Datelike, Utc};
use std::fmt;

/// A shard key value as extracted from the configured `shard_key_field`.
///
/// Keys are routed by their canonical string form, so the same logical value
/// always resolves to the same partition regardless of which variant the
/// caller constructed.
#[derive(Debug, Clone, PartialEq)]
pub enum RouteKey {
    Str(String),
    Int(i64),
    Timestamp(DateTime<Utc>),
}

impl RouteKey {
    /// Canonical string representation used for hashing and lexicographic
    /// bucketing. Timestamps canonicalize to their Unix-second value.
    pub fn canonical(&self) -> String {
        match self {
            RouteKey::Str(s) => s.clone(),
            RouteKey::Int(i) => i.to_string(),
            RouteKey::Timestamp(ts) => ts.timestamp().to_string(),
        }
    }

    /// Zero-based calendar month for timestamp keys, `None` otherwise.
    pub fn month0(&self) -> Option<u32> {
        match self {
            RouteKey::Timestamp(ts) => Some(ts.month0()),
            _ => None,
        }
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical())
    }
}

impl From<&str> for RouteKey {
    fn from(value: &str) -> Self {
        RouteKey::Str(value.to_string())
    }
}

impl From<String> for RouteKey {
    fn from(value: String) -> Self {
        RouteKey::Str(value)
    }
}

impl From<i64> for RouteKey {
    fn from(value: i64) -> Self {
        RouteKey::Int(value)
    }
}

impl From<DateTime<Utc>> for RouteKey {
    fn from(value: DateTime<Utc>) -> Self {
        RouteKey::Timestamp(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_canonical_forms() {
        assert_eq!(RouteKey::from("user-42").canonical(), "user-42");
        assert_eq!(RouteKey::from(42i64).canonical(), "42");

        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(RouteKey::from(ts).canonical(), ts.timestamp().to_string());
    }

    #[test]
    fn test_month0_only_for_timestamps() {
        let ts = Utc.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        assert_eq!(RouteKey::from(ts).month0(), Some(2));
        assert_eq!(RouteKey::from("march").month0(), None);
        assert_eq!(RouteKey::from(3i64).month0(), None);
    }
}

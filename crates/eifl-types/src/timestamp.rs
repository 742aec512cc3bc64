use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A UTC instant serialized as a millisecond-precision ISO-8601 string.
///
/// Spec: "Timestamps are stored as UTC ISO-8601 strings with millisecond
/// precision" (store component).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct UtcTimestamp(pub DateTime<Utc>);

impl UtcTimestamp {
    pub fn now() -> Self {
        Self(Utc::now())
    }

    pub fn inner(&self) -> DateTime<Utc> {
        self.0
    }
}

impl From<DateTime<Utc>> for UtcTimestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }
}

impl fmt::Display for UtcTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl Serialize for UtcTimestamp {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_rfc3339_opts(SecondsFormat::Millis, true))
    }
}

impl<'de> Deserialize<'de> for UtcTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        let dt = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| serde::de::Error::custom(format!("invalid UTC timestamp: {e}")))?;
        Ok(Self(dt.with_timezone(&Utc)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_json() {
        let ts = UtcTimestamp::now();
        let json = serde_json::to_string(&ts).unwrap();
        let back: UtcTimestamp = serde_json::from_str(&json).unwrap();
        // Millisecond precision: compare formatted strings, not raw instants.
        assert_eq!(ts.to_string(), back.to_string());
    }

    #[test]
    fn formats_with_millis_and_z_suffix() {
        let ts = UtcTimestamp::now();
        let s = ts.to_string();
        assert!(s.ends_with('Z'));
        assert!(s.contains('.'));
    }
}

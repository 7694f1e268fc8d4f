//! Serde adapters for config durations
//!
//! Durations are written as whole seconds in TOML; sub-second parts are
//! truncated on the way out.

/// `Duration` as an integer number of seconds
pub mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        value.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_secs)
    }
}

/// `Option<Duration>` as optional seconds; absent means unbounded
pub mod option_duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        value.map(|d| d.as_secs()).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct TestConfig {
        #[serde(with = "duration_secs")]
        timeout: Duration,
        #[serde(default, with = "option_duration_secs", skip_serializing_if = "Option::is_none")]
        limit: Option<Duration>,
    }

    #[test]
    fn test_duration_secs_serialize() {
        let config = TestConfig {
            timeout: Duration::from_secs(30),
            limit: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(json, r#"{"timeout":30}"#);
    }

    #[test]
    fn test_duration_secs_deserialize() {
        let config: TestConfig = serde_json::from_str(r#"{"timeout":60,"limit":5}"#).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.limit, Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_missing_optional_duration_is_none() {
        let config: TestConfig = serde_json::from_str(r#"{"timeout":1}"#).unwrap();
        assert_eq!(config.limit, None);
    }
}

//! Wire format for timestamps: ISO-8601 with millisecond precision and a
//! `Z` suffix, e.g. `2025-11-29T10:00:00.000Z`.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serializer};

const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&ts.format(FORMAT).to_string())
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    NaiveDateTime::parse_from_str(&s, FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize)]
    struct Wrapper {
        #[serde(with = "super")]
        ts: chrono::DateTime<Utc>,
    }

    #[test]
    fn round_trips_millisecond_precision() {
        let wrapper = Wrapper {
            ts: Utc.timestamp_millis_opt(1762325307123).unwrap(),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert!(json.contains(".123Z"));
        let back: Wrapper = serde_json::from_str(&json).unwrap();
        assert_eq!(back.ts, wrapper.ts);
    }

    #[test]
    fn whole_seconds_keep_explicit_milliseconds() {
        let wrapper = Wrapper {
            ts: Utc.with_ymd_and_hms(2025, 11, 29, 10, 0, 0).unwrap(),
        };
        let json = serde_json::to_string(&wrapper).unwrap();
        assert_eq!(json, r#"{"ts":"2025-11-29T10:00:00.000Z"}"#);
    }
}

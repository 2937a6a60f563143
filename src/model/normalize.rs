//! Lenient readers used when rebuilding the model from stored JSON.
//!
//! Stored blobs carry no schema version, so every field is read defensively
//! and anything unusable is reported as `None` for the caller to default.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde_json::Value;
use uuid::Uuid;

/// Distance a stored timestamp must keep from chrono's representable limits,
/// so the spans derived from it during normalization cannot overflow.
const TIME_MARGIN: Duration = Duration::weeks(52);

/// Read a timestamp stored as epoch milliseconds, an RFC 3339 string or a bare date.
///
/// Values too close to the representable limits read as unusable.
pub fn read_time(value: &Value) -> Option<DateTime<Utc>> {
    parse_time(value).filter(|t| {
        t.checked_add_signed(TIME_MARGIN).is_some() && t.checked_sub_signed(TIME_MARGIN).is_some()
    })
}

fn parse_time(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let ms = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(ms)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .map(|dt| dt.and_utc())
        }
        _ => None,
    }
}

/// Read an id, minting a fresh one when it is missing or not a UUID.
pub fn read_id(value: Option<&Value>) -> Uuid {
    value
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
        .unwrap_or_else(Uuid::new_v4)
}

pub fn read_string(value: Option<&Value>) -> Option<String> {
    value.and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn reads_all_time_encodings() {
        let expected = Utc.with_ymd_and_hms(2024, 3, 5, 0, 0, 0).unwrap();
        assert_eq!(read_time(&json!(expected.timestamp_millis())), Some(expected));
        assert_eq!(read_time(&json!("2024-03-05T00:00:00Z")), Some(expected));
        assert_eq!(read_time(&json!("2024-03-05")), Some(expected));
        assert_eq!(read_time(&json!(true)), None);
        assert_eq!(read_time(&json!("soon")), None);
    }

    #[test]
    fn rejects_timestamps_at_the_representable_limits() {
        let max = DateTime::<Utc>::MAX_UTC.timestamp_millis();
        let min = DateTime::<Utc>::MIN_UTC.timestamp_millis();
        assert_eq!(read_time(&json!(max)), None);
        assert_eq!(read_time(&json!(min)), None);
        assert_eq!(read_time(&json!(i64::MAX)), None);
        assert_eq!(read_time(&json!(1e300)), None);
    }

    #[test]
    fn keeps_valid_ids_and_mints_the_rest() {
        let id = Uuid::new_v4();
        assert_eq!(read_id(Some(&json!(id.to_string()))), id);
        assert_ne!(read_id(Some(&json!(17))), Uuid::nil());
        assert_ne!(read_id(None), read_id(None));
    }
}

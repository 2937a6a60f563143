use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::normalize::{read_id, read_string, read_time};

/// Number of entries in the fixed stream color palette.
pub const PALETTE_SIZE: usize = 4;

/// Shortest span a stream may ever have.
pub const MIN_DURATION: Duration = Duration::days(1);

/// Default span of a stream created from the timeline.
pub const DEFAULT_STREAM_DURATION: Duration = Duration::days(7);

/// Map any stored color value onto a valid palette index.
pub fn normalize_color(raw: i64) -> usize {
    if (0..PALETTE_SIZE as i64).contains(&raw) {
        raw as usize
    } else {
        0
    }
}

/// A point-in-time flag attached to a stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    pub id: Uuid,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub date: DateTime<Utc>,
    pub comment: String,
}

impl Deadline {
    pub fn new(date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            comment: String::new(),
        }
    }

    pub(crate) fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        // A flag without a date has nothing to point at.
        let date = obj.get("date").and_then(read_time)?;
        Some(Self {
            id: read_id(obj.get("id")),
            date,
            comment: read_string(obj.get("comment")).unwrap_or_default(),
        })
    }
}

/// A labeled, colored bar spanning `[start_date, end_date)` on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stream {
    pub id: Uuid,
    pub label: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_date: DateTime<Utc>,
    /// Index into the fixed palette, always `< PALETTE_SIZE`.
    pub color: usize,
    pub deadlines: Vec<Deadline>,
}

impl Stream {
    /// Create a stream. The end is pushed out if the span is shorter than `MIN_DURATION`.
    pub fn new(
        label: impl Into<String>,
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
        color: usize,
    ) -> Self {
        let mut stream = Self {
            id: Uuid::new_v4(),
            label: label.into(),
            start_date,
            end_date,
            color: normalize_color(color as i64),
            deadlines: Vec::new(),
        };
        stream.enforce_min_duration();
        stream
    }

    pub fn duration(&self) -> Duration {
        self.end_date - self.start_date
    }

    /// Restore the duration floor by extending the end.
    pub fn enforce_min_duration(&mut self) {
        if self.duration() < MIN_DURATION {
            match self.start_date.checked_add_signed(MIN_DURATION) {
                Some(end) => self.end_date = end,
                // No room after the start: pull the start back instead.
                None => {
                    self.end_date = self.end_date.max(self.start_date);
                    self.start_date = self.end_date - MIN_DURATION;
                }
            }
        }
    }

    /// Replace both bounds, keeping the duration floor.
    pub fn set_span(&mut self, start: DateTime<Utc>, end: DateTime<Utc>) {
        self.start_date = start;
        self.end_date = end;
        self.enforce_min_duration();
    }

    pub fn set_color(&mut self, color: usize) {
        self.color = normalize_color(color as i64);
    }

    pub fn deadline(&self, id: Uuid) -> Option<&Deadline> {
        self.deadlines.iter().find(|d| d.id == id)
    }

    /// Rebuild a stream from loosely-typed stored JSON.
    ///
    /// Missing bounds fall back to `fallback_start` and a one-day span; an
    /// out-of-range or missing color becomes 0; a non-array `deadlines`
    /// becomes empty. Returns `None` only for non-object input.
    pub(crate) fn from_value(value: &Value, fallback_start: DateTime<Utc>) -> Option<Self> {
        let obj = value.as_object()?;
        let start = obj
            .get("startDate")
            .and_then(read_time)
            .unwrap_or(fallback_start);
        let end = obj
            .get("endDate")
            .and_then(read_time)
            .or_else(|| start.checked_add_signed(MIN_DURATION))
            .unwrap_or(start);
        let color = obj
            .get("color")
            .and_then(Value::as_i64)
            .map(normalize_color)
            .unwrap_or(0);
        let deadlines = obj
            .get("deadlines")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Deadline::from_value).collect())
            .unwrap_or_default();

        let mut stream = Self {
            id: read_id(obj.get("id")),
            label: read_string(obj.get("label")).unwrap_or_else(|| "Stream".to_string()),
            start_date: start,
            end_date: end,
            color,
            deadlines,
        };
        stream.enforce_min_duration();
        Some(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn new_stream_extends_short_span() {
        let s = Stream::new("A", day(3), day(3), 1);
        assert_eq!(s.end_date, day(4));
        assert_eq!(s.color, 1);
    }

    #[test]
    fn color_out_of_range_defaults_to_zero() {
        assert_eq!(normalize_color(4), 0);
        assert_eq!(normalize_color(-1), 0);
        assert_eq!(normalize_color(3), 3);
        assert_eq!(Stream::new("A", day(0), day(2), 9).color, 0);
    }

    #[test]
    fn from_value_defaults_missing_fields() {
        let raw = json!({
            "label": "Research",
            "startDate": day(2).timestamp_millis(),
            "color": 17,
            "deadlines": "not a list"
        });
        let s = Stream::from_value(&raw, day(0)).unwrap();
        assert_eq!(s.label, "Research");
        assert_eq!(s.start_date, day(2));
        assert_eq!(s.end_date, day(3));
        assert_eq!(s.color, 0);
        assert!(s.deadlines.is_empty());
    }

    #[test]
    fn from_value_drops_undated_deadlines() {
        let raw = json!({
            "startDate": day(0).timestamp_millis(),
            "endDate": day(5).timestamp_millis(),
            "deadlines": [
                { "date": day(1).timestamp_millis(), "comment": "ship" },
                { "comment": "no date" },
                42
            ]
        });
        let s = Stream::from_value(&raw, day(0)).unwrap();
        assert_eq!(s.deadlines.len(), 1);
        assert_eq!(s.deadlines[0].comment, "ship");
    }

    #[test]
    fn from_value_rejects_non_objects() {
        assert!(Stream::from_value(&json!("stream"), day(0)).is_none());
    }
}

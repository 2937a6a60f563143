use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::normalize::{read_id, read_string, read_time};
use super::stream::{Deadline, Stream, PALETTE_SIZE};

/// A project owning an ordered set of streams.
///
/// The order of `streams` is the lane order on the timeline, top to bottom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub start_date: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub end_date: DateTime<Utc>,
    /// Completion percentage, 0 to 100.
    pub progress: u8,
    pub notes: String,
    pub streams: Vec<Stream>,
}

impl Project {
    pub fn new(name: impl Into<String>, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date: end_date.max(start_date),
            progress: 0,
            notes: String::new(),
            streams: Vec::new(),
        }
    }

    /// Seed project used when storage holds nothing.
    pub fn sample(now: DateTime<Utc>) -> Self {
        let start = now - Duration::days(3);
        let mut project = Self::new("My Project", start, now + Duration::weeks(8));

        let mut research = Stream::new("Research", start, now + Duration::days(6), 0);
        research.deadlines.push(Deadline::new(now + Duration::days(4)));

        let build = Stream::new(
            "Build",
            now + Duration::days(5),
            now + Duration::days(20),
            1,
        );
        let mut launch = Stream::new(
            "Launch",
            now + Duration::days(18),
            now + Duration::days(26),
            2,
        );
        let mut flag = Deadline::new(now + Duration::days(25));
        flag.comment = "Release".to_string();
        launch.deadlines.push(flag);

        project.streams = vec![research, build, launch];
        project
    }

    pub fn stream_index(&self, id: Uuid) -> Option<usize> {
        self.streams.iter().position(|s| s.id == id)
    }

    pub fn stream(&self, id: Uuid) -> Option<&Stream> {
        self.streams.iter().find(|s| s.id == id)
    }

    pub fn stream_mut(&mut self, id: Uuid) -> Option<&mut Stream> {
        self.streams.iter_mut().find(|s| s.id == id)
    }

    /// Palette slot for the next created stream, cycling by stream count.
    pub fn next_color(&self) -> usize {
        self.streams.len() % PALETTE_SIZE
    }

    /// Locate a deadline anywhere in the project.
    pub fn deadline_mut(&mut self, id: Uuid) -> Option<&mut Deadline> {
        self.streams
            .iter_mut()
            .flat_map(|s| s.deadlines.iter_mut())
            .find(|d| d.id == id)
    }

    /// Remove a stream together with its deadlines.
    pub fn remove_stream(&mut self, id: Uuid) -> Option<Stream> {
        let index = self.stream_index(id)?;
        Some(self.streams.remove(index))
    }

    pub fn set_progress(&mut self, progress: i64) {
        self.progress = progress.clamp(0, 100) as u8;
    }

    /// Rebuild a project from loosely-typed stored JSON, defaulting anything
    /// missing or malformed.
    pub fn from_value(value: &Value, now: DateTime<Utc>) -> Self {
        let Some(obj) = value.as_object() else {
            tracing::debug!("stored project is not an object, seeding a sample");
            return Self::sample(now);
        };

        let start = obj.get("startDate").and_then(read_time).unwrap_or(now);
        let end = obj
            .get("endDate")
            .and_then(read_time)
            .filter(|end| *end >= start)
            .or_else(|| start.checked_add_signed(Duration::weeks(8)))
            .unwrap_or(start);
        let streams = obj
            .get("streams")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| Stream::from_value(item, start))
                    .collect()
            })
            .unwrap_or_default();
        let progress = obj
            .get("progress")
            .and_then(|v| v.as_i64().or_else(|| v.as_f64().map(|f| f.round() as i64)))
            .unwrap_or(0);

        let mut project = Self {
            id: read_id(obj.get("id")),
            name: read_string(obj.get("name")).unwrap_or_else(|| "Untitled Project".to_string()),
            start_date: start,
            end_date: end,
            progress: 0,
            notes: read_string(obj.get("notes")).unwrap_or_default(),
            streams,
        };
        project.set_progress(progress);
        project
    }
}

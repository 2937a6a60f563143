//! The point where finished edits reach the project store.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::layout;
use crate::io::store::{first_project, ProjectStore};
use crate::io::StoreError;
use crate::model::Project;

/// A finished interaction, ready to be applied to the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    /// New bounds for a moved or resized stream.
    Reschedule {
        stream_id: Uuid,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },
    /// Move a stream to lane `to`.
    Reorder { stream_id: Uuid, to: usize },
}

impl Commit {
    /// Apply to the project as it is now, not as it was when the drag began.
    ///
    /// Returns `false` when the stream no longer exists or nothing changed.
    pub fn apply(&self, project: &mut Project) -> bool {
        match *self {
            Commit::Reschedule {
                stream_id,
                start,
                end,
            } => match project.stream_mut(stream_id) {
                Some(stream) => {
                    let before = (stream.start_date, stream.end_date);
                    stream.set_span(start, end);
                    before != (stream.start_date, stream.end_date)
                }
                None => false,
            },
            Commit::Reorder { stream_id, to } => match project.stream_index(stream_id) {
                Some(from) if from != to.min(project.streams.len() - 1) => {
                    layout::move_item(&mut project.streams, from, to)
                }
                _ => false,
            },
        }
    }
}

/// Wraps the project store; remembers when the last write failed.
pub struct CommitBoundary {
    store: Box<dyn ProjectStore>,
    dirty: bool,
}

impl CommitBoundary {
    pub fn new(store: Box<dyn ProjectStore>) -> Self {
        Self {
            store,
            dirty: false,
        }
    }

    /// True while the in-memory project has changes the store never accepted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Load the single stored project, seeding a sample when there is none.
    ///
    /// A read failure is logged and treated like empty storage.
    pub fn load(&mut self, now: DateTime<Utc>) -> Project {
        match self.store.load_projects() {
            Ok(projects) => {
                if projects.len() > 1 {
                    tracing::info!(stored = projects.len(), "keeping only the first stored project");
                }
                first_project(projects).unwrap_or_else(|| {
                    tracing::info!("no stored project, seeding sample");
                    Project::sample(now)
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to load projects, seeding sample");
                Project::sample(now)
            }
        }
    }

    /// Apply `commit` and persist the result when it changed anything.
    ///
    /// On a failed write the mutation stays applied and the boundary turns dirty.
    pub fn commit(&mut self, project: &mut Project, commit: Commit) -> Result<bool, StoreError> {
        if !commit.apply(project) {
            return Ok(false);
        }
        tracing::debug!(?commit, "committing");
        self.persist(project).map(|()| true)
    }

    /// Write the project as the one-element stored collection.
    pub fn persist(&mut self, project: &Project) -> Result<(), StoreError> {
        match self.store.save_projects(std::slice::from_ref(project)) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "project save failed, keeping changes in memory");
                self.dirty = true;
                Err(e)
            }
        }
    }

    /// Retry a save that previously failed. No-op when clean.
    pub fn flush(&mut self, project: &Project) -> Result<(), StoreError> {
        if self.dirty {
            self.persist(project)
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::storage::{KeyValueStorage, MemoryStorage};
    use crate::io::store::StorageProjectStore;
    use crate::model::Stream;
    use chrono::{Duration, TimeZone};
    use serde_json::{json, Value};
    use std::cell::Cell;
    use std::rc::Rc;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    fn project() -> Project {
        let mut p = Project::new("P", day(0), day(28));
        p.streams = vec![
            Stream::new("A", day(2), day(5), 0),
            Stream::new("B", day(6), day(9), 1),
            Stream::new("C", day(10), day(14), 2),
        ];
        p
    }

    fn labels(p: &Project) -> Vec<&str> {
        p.streams.iter().map(|s| s.label.as_str()).collect()
    }

    /// Storage that refuses writes while `fail` is set.
    struct FlakyStorage {
        inner: MemoryStorage,
        fail: Rc<Cell<bool>>,
    }

    impl KeyValueStorage for FlakyStorage {
        fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: &Value) -> Result<(), StoreError> {
            if self.fail.get() {
                return Err(StoreError::Io(std::io::Error::other("quota exceeded")));
            }
            self.inner.set(key, value)
        }
    }

    #[test]
    fn reorder_moves_last_to_front() {
        let mut p = project();
        let c = Commit::Reorder {
            stream_id: p.streams[2].id,
            to: 0,
        };
        assert!(c.apply(&mut p));
        assert_eq!(labels(&p), ["C", "A", "B"]);
    }

    #[test]
    fn reorder_reads_current_sequence() {
        let mut p = project();
        let a = p.streams[0].id;
        // Another commit landed after this drag started.
        layout::move_item(&mut p.streams, 0, 2);
        assert!(Commit::Reorder { stream_id: a, to: 1 }.apply(&mut p));
        assert_eq!(labels(&p), ["B", "A", "C"]);
        assert!(!Commit::Reorder { stream_id: a, to: 1 }.apply(&mut p));
    }

    #[test]
    fn reschedule_of_missing_stream_is_ignored() {
        let mut p = project();
        let c = Commit::Reschedule {
            stream_id: Uuid::new_v4(),
            start: day(1),
            end: day(3),
        };
        assert!(!c.apply(&mut p));
    }

    #[test]
    fn commit_persists_single_project() {
        let storage = MemoryStorage::default();
        let mut boundary = CommitBoundary::new(Box::new(StorageProjectStore::new(storage.clone())));
        let mut p = project();
        let id = p.streams[0].id;
        let changed = boundary
            .commit(
                &mut p,
                Commit::Reschedule {
                    stream_id: id,
                    start: day(3),
                    end: day(6),
                },
            )
            .unwrap();
        assert!(changed);
        let stored = storage.get("projects").unwrap().unwrap();
        assert_eq!(stored.as_array().unwrap().len(), 1);
        assert_eq!(stored[0]["streams"][0]["startDate"], json!(day(3).timestamp_millis()));
    }

    #[test]
    fn failed_write_keeps_change_and_marks_dirty() {
        let fail = Rc::new(Cell::new(true));
        let storage = FlakyStorage {
            inner: MemoryStorage::default(),
            fail: fail.clone(),
        };
        let mut boundary = CommitBoundary::new(Box::new(StorageProjectStore::new(storage)));
        let mut p = project();
        let c = Commit::Reorder {
            stream_id: p.streams[2].id,
            to: 0,
        };
        assert!(boundary.commit(&mut p, c).is_err());
        assert!(boundary.is_dirty());
        assert_eq!(labels(&p), ["C", "A", "B"]);

        fail.set(false);
        boundary.flush(&p).unwrap();
        assert!(!boundary.is_dirty());
        assert_eq!(labels(&boundary.load(day(0))), ["C", "A", "B"]);
    }

    #[test]
    fn load_truncates_to_first_project() {
        let mut storage = MemoryStorage::default();
        storage
            .set(
                "projects",
                &json!([{ "name": "one" }, { "name": "two" }, { "name": "three" }]),
            )
            .unwrap();
        let mut boundary = CommitBoundary::new(Box::new(StorageProjectStore::new(storage.clone())));
        let p = boundary.load(day(0));
        assert_eq!(p.name, "one");
        boundary.persist(&p).unwrap();
        assert_eq!(storage.get("projects").unwrap().unwrap().as_array().unwrap().len(), 1);
    }

    #[test]
    fn empty_storage_seeds_sample() {
        let mut boundary =
            CommitBoundary::new(Box::new(StorageProjectStore::new(MemoryStorage::default())));
        assert_eq!(boundary.load(day(0)).streams.len(), 3);
    }
}

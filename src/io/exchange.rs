//! JSON import/export of the project and the todo list.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde_json::Value;

use super::store::{first_project, projects_from_value};
use crate::model::todo::{TodoItem, TodoList};
use crate::model::Project;

#[derive(Debug, thiserror::Error)]
pub enum ExchangeError {
    #[error("failed to access file: {0}")]
    Io(#[from] std::io::Error),
    #[error("file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("unexpected file contents: {0}")]
    Format(&'static str),
}

/// Write the project as a one-element array, the same shape storage uses.
pub fn export_project(project: &Project, path: &Path) -> Result<(), ExchangeError> {
    let json = serde_json::to_string_pretty(std::slice::from_ref(project))?;
    std::fs::write(path, json)?;
    Ok(())
}

pub fn import_project(path: &Path, now: DateTime<Utc>) -> Result<Project, ExchangeError> {
    let text = std::fs::read_to_string(path)?;
    parse_project_document(&serde_json::from_str(&text)?, now)
}

/// Accepts a project object or a collection; a collection yields its first project.
pub fn parse_project_document(value: &Value, now: DateTime<Utc>) -> Result<Project, ExchangeError> {
    let projects = projects_from_value(value, now);
    if projects.len() > 1 {
        tracing::info!(count = projects.len(), "import holds several projects, keeping the first");
    }
    first_project(projects).ok_or(ExchangeError::Format("no project found"))
}

pub fn export_todos(list: &TodoList, path: &Path) -> Result<usize, ExchangeError> {
    std::fs::write(path, serde_json::to_string_pretty(&list.todos)?)?;
    Ok(list.todos.len())
}

/// Read a todo array for replacing the current list.
pub fn import_todos(path: &Path, now: DateTime<Utc>) -> Result<Vec<TodoItem>, ExchangeError> {
    let text = std::fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    TodoList::parse_items(&value, now).ok_or(ExchangeError::Format("expected a list of todos"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::deadline;
    use crate::model::{Stream, TimeMapper, TimelineWindow};
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn hidden_deadlines_survive_round_trip() {
        let mut project = Project::new("P", day(0), day(60));
        let mut stream = Stream::new("A", day(2), day(40), 0);
        let late = crate::model::Deadline::new(day(45));
        let late_id = late.id;
        stream.deadlines.push(late);
        project.streams.push(stream);

        let mapper = TimeMapper::new(TimelineWindow::new(day(0), day(28)), 280.0).unwrap();
        let marker = project.streams[0].deadline(late_id).unwrap();
        assert!(deadline::marker_fraction(marker, &mapper).is_none());

        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("project.json");
        export_project(&project, &path).unwrap();
        let back = import_project(&path, day(0)).unwrap();
        assert_eq!(back, project);
        assert!(back.streams[0].deadline(late_id).is_some());
    }

    #[test]
    fn import_accepts_bare_object_and_truncates_arrays() {
        let solo = parse_project_document(&json!({ "name": "solo" }), day(0)).unwrap();
        assert_eq!(solo.name, "solo");
        let many = json!([{ "name": "a" }, { "name": "b" }]);
        assert_eq!(parse_project_document(&many, day(0)).unwrap().name, "a");
        assert!(matches!(
            parse_project_document(&json!([]), day(0)),
            Err(ExchangeError::Format(_))
        ));
    }

    #[test]
    fn todo_import_requires_array() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("todos.json");
        std::fs::write(&path, r#"{ "text": "nope" }"#).unwrap();
        assert!(matches!(import_todos(&path, day(0)), Err(ExchangeError::Format(_))));

        let mut list = TodoList::default();
        list.add("one", day(0));
        list.add("two", day(0));
        assert_eq!(export_todos(&list, &path).unwrap(), 2);
        assert_eq!(import_todos(&path, day(0)).unwrap(), list.todos);
    }
}

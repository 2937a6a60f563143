use chrono::{DateTime, Utc};
use serde_json::Value;

use super::storage::{KeyValueStorage, StoreError};
use crate::model::todo::TodoList;
use crate::model::Project;

pub const PROJECTS_KEY: &str = "projects";
pub const TODOS_KEY: &str = "todos";
pub const ARCHIVED_TODOS_KEY: &str = "archivedTodos";

/// Persistence for the project collection.
pub trait ProjectStore {
    fn load_projects(&self) -> Result<Vec<Project>, StoreError>;
    fn save_projects(&mut self, projects: &[Project]) -> Result<(), StoreError>;
}

/// Only one project is ever kept; everything after the first is dropped.
pub fn first_project(projects: Vec<Project>) -> Option<Project> {
    projects.into_iter().next()
}

/// Normalize whatever is stored under the projects key.
pub fn projects_from_value(value: &Value, now: DateTime<Utc>) -> Vec<Project> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter(|item| item.is_object())
            .map(|item| Project::from_value(item, now))
            .collect(),
        Value::Object(_) => vec![Project::from_value(value, now)],
        _ => Vec::new(),
    }
}

/// `ProjectStore` over any key-value storage.
#[derive(Debug)]
pub struct StorageProjectStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> StorageProjectStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: KeyValueStorage> ProjectStore for StorageProjectStore<S> {
    fn load_projects(&self) -> Result<Vec<Project>, StoreError> {
        let stored = self.storage.get(PROJECTS_KEY)?;
        Ok(stored
            .map(|value| projects_from_value(&value, Utc::now()))
            .unwrap_or_default())
    }

    fn save_projects(&mut self, projects: &[Project]) -> Result<(), StoreError> {
        let value = serde_json::to_value(projects)?;
        self.storage.set(PROJECTS_KEY, &value)
    }
}

/// Persistence for the todo list and its archive.
#[derive(Debug)]
pub struct TodoStore<S> {
    storage: S,
}

impl<S: KeyValueStorage> TodoStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Read failures leave the list empty rather than blocking startup.
    pub fn load(&self, now: DateTime<Utc>) -> TodoList {
        let read = |key: &str| match self.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "failed to read todos");
                None
            }
        };
        let todos = read(TODOS_KEY);
        let archived = read(ARCHIVED_TODOS_KEY);
        TodoList::from_values(todos.as_ref(), archived.as_ref(), now)
    }

    pub fn save(&mut self, list: &TodoList) -> Result<(), StoreError> {
        self.storage.set(TODOS_KEY, &serde_json::to_value(&list.todos)?)?;
        self.storage
            .set(ARCHIVED_TODOS_KEY, &serde_json::to_value(&list.archived)?)
    }
}

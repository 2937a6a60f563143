use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::normalize::{read_id, read_string, read_time};

/// Which todos the list view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TodoFilter {
    #[default]
    Active,
    Completed,
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subtask {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoItem {
    pub id: Uuid,
    pub text: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub subtasks: Vec<Subtask>,
    pub expanded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub archived_at: Option<DateTime<Utc>>,
}

impl TodoItem {
    fn new(text: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text,
            completed: false,
            created_at: now,
            subtasks: Vec::new(),
            expanded: false,
            archived_at: None,
        }
    }

    fn from_value(value: &Value, now: DateTime<Utc>) -> Option<Self> {
        let obj = value.as_object()?;
        let subtasks = obj
            .get("subtasks")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let sub = item.as_object()?;
                        Some(Subtask {
                            id: read_id(sub.get("id")),
                            text: read_string(sub.get("text")).unwrap_or_default(),
                            completed: sub.get("completed").and_then(Value::as_bool).unwrap_or(false),
                            created_at: sub.get("createdAt").and_then(read_time).unwrap_or(now),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Some(Self {
            id: read_id(obj.get("id")),
            text: read_string(obj.get("text")).unwrap_or_default(),
            completed: obj.get("completed").and_then(Value::as_bool).unwrap_or(false),
            created_at: obj.get("createdAt").and_then(read_time).unwrap_or(now),
            subtasks,
            // Only an explicit `true` keeps an item expanded.
            expanded: obj.get("expanded") == Some(&Value::Bool(true)),
            archived_at: obj.get("archivedAt").and_then(read_time),
        })
    }
}

/// Archived todos sharing one archive date.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryGroup<'a> {
    pub date: NaiveDate,
    pub todos: Vec<&'a TodoItem>,
}

/// The daily todo list plus its archive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TodoList {
    pub todos: Vec<TodoItem>,
    pub archived: Vec<TodoItem>,
}

impl TodoList {
    /// Rebuild from the stored `todos` / `archivedTodos` blobs.
    pub fn from_values(todos: Option<&Value>, archived: Option<&Value>, now: DateTime<Utc>) -> Self {
        let read = |value: Option<&Value>| -> Vec<TodoItem> {
            value
                .and_then(Value::as_array)
                .map(|items| items.iter().filter_map(|v| TodoItem::from_value(v, now)).collect())
                .unwrap_or_default()
        };
        Self {
            todos: read(todos),
            archived: read(archived),
        }
    }

    /// Parse an imported list, or `None` when the input is not an array.
    pub fn parse_items(value: &Value, now: DateTime<Utc>) -> Option<Vec<TodoItem>> {
        value
            .as_array()
            .map(|items| items.iter().filter_map(|v| TodoItem::from_value(v, now)).collect())
    }

    #[cfg(test)]
    pub fn get(&self, id: Uuid) -> Option<&TodoItem> {
        self.todos.iter().find(|t| t.id == id)
    }

    fn get_mut(&mut self, id: Uuid) -> Option<&mut TodoItem> {
        self.todos.iter_mut().find(|t| t.id == id)
    }

    /// Add a todo at the top of the list. Blank text is ignored.
    pub fn add(&mut self, text: &str, now: DateTime<Utc>) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let item = TodoItem::new(text.to_string(), now);
        let id = item.id;
        self.todos.insert(0, item);
        Some(id)
    }

    /// Flip completion. Completing a todo completes all of its subtasks.
    pub fn toggle(&mut self, id: Uuid) -> bool {
        let Some(todo) = self.get_mut(id) else {
            return false;
        };
        todo.completed = !todo.completed;
        if todo.completed {
            for sub in &mut todo.subtasks {
                sub.completed = true;
            }
        }
        true
    }

    /// Flip a subtask and keep the parent's completion in step.
    pub fn toggle_subtask(&mut self, parent: Uuid, id: Uuid) -> bool {
        let Some(todo) = self.get_mut(parent) else {
            return false;
        };
        let Some(sub) = todo.subtasks.iter_mut().find(|s| s.id == id) else {
            return false;
        };
        sub.completed = !sub.completed;
        let completed = sub.completed;
        if !completed {
            todo.completed = false;
        } else if todo.subtasks.iter().all(|s| s.completed) {
            todo.completed = true;
        }
        true
    }

    pub fn delete(&mut self, id: Uuid) -> bool {
        let before = self.todos.len();
        self.todos.retain(|t| t.id != id);
        self.todos.len() != before
    }

    pub fn delete_subtask(&mut self, parent: Uuid, id: Uuid) -> bool {
        let Some(todo) = self.get_mut(parent) else {
            return false;
        };
        let before = todo.subtasks.len();
        todo.subtasks.retain(|s| s.id != id);
        todo.subtasks.len() != before
    }

    pub fn toggle_expanded(&mut self, id: Uuid) -> bool {
        match self.get_mut(id) {
            Some(todo) => {
                todo.expanded = !todo.expanded;
                true
            }
            None => false,
        }
    }

    pub fn edit(&mut self, id: Uuid, text: &str) -> bool {
        let text = text.trim();
        match self.get_mut(id) {
            Some(todo) if !text.is_empty() => {
                todo.text = text.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn edit_subtask(&mut self, parent: Uuid, id: Uuid, text: &str) -> bool {
        let text = text.trim();
        if text.is_empty() {
            return false;
        }
        let Some(sub) = self
            .get_mut(parent)
            .and_then(|t| t.subtasks.iter_mut().find(|s| s.id == id))
        else {
            return false;
        };
        sub.text = text.to_string();
        true
    }

    /// Append a subtask and expand the parent so it stays visible.
    pub fn add_subtask(&mut self, parent: Uuid, text: &str, now: DateTime<Utc>) -> Option<Uuid> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let todo = self.get_mut(parent)?;
        todo.expanded = true;
        let sub = Subtask {
            id: Uuid::new_v4(),
            text: text.to_string(),
            completed: false,
            created_at: now,
        };
        let id = sub.id;
        todo.subtasks.push(sub);
        Some(id)
    }

    pub fn filtered(&self, filter: TodoFilter) -> Vec<&TodoItem> {
        self.todos
            .iter()
            .filter(|t| match filter {
                TodoFilter::Active => !t.completed,
                TodoFilter::Completed => t.completed,
                TodoFilter::All => true,
            })
            .collect()
    }

    /// Move every current todo into the archive, newest batch first.
    pub fn start_new_day(&mut self, now: DateTime<Utc>) -> usize {
        let mut batch: Vec<TodoItem> = std::mem::take(&mut self.todos);
        for todo in &mut batch {
            todo.archived_at = Some(now);
        }
        let count = batch.len();
        batch.append(&mut self.archived);
        self.archived = batch;
        count
    }

    /// Archive grouped by calendar day, most recent day first.
    pub fn history(&self) -> Vec<HistoryGroup<'_>> {
        let mut groups: Vec<HistoryGroup<'_>> = Vec::new();
        for todo in &self.archived {
            let date = todo.archived_at.unwrap_or(todo.created_at).date_naive();
            match groups.iter_mut().find(|g| g.date == date) {
                Some(group) => group.todos.push(todo),
                None => groups.push(HistoryGroup {
                    date,
                    todos: vec![todo],
                }),
            }
        }
        groups.sort_by(|a, b| b.date.cmp(&a.date));
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
    }

    #[test]
    fn add_trims_and_prepends() {
        let mut list = TodoList::default();
        assert!(list.add("   ", now()).is_none());
        list.add("first", now());
        list.add("  second ", now());
        assert_eq!(list.todos[0].text, "second");
        assert_eq!(list.todos[1].text, "first");
    }

    #[test]
    fn completing_parent_completes_subtasks() {
        let mut list = TodoList::default();
        let id = list.add("parent", now()).unwrap();
        list.add_subtask(id, "a", now());
        list.add_subtask(id, "b", now());
        assert!(list.get(id).unwrap().expanded);
        list.toggle(id);
        assert!(list.get(id).unwrap().subtasks.iter().all(|s| s.completed));
    }

    #[test]
    fn subtasks_drive_parent_completion() {
        let mut list = TodoList::default();
        let id = list.add("parent", now()).unwrap();
        let a = list.add_subtask(id, "a", now()).unwrap();
        let b = list.add_subtask(id, "b", now()).unwrap();
        list.toggle_subtask(id, a);
        assert!(!list.get(id).unwrap().completed);
        list.toggle_subtask(id, b);
        assert!(list.get(id).unwrap().completed);
        list.toggle_subtask(id, a);
        assert!(!list.get(id).unwrap().completed);
    }

    #[test]
    fn empty_edits_are_ignored() {
        let mut list = TodoList::default();
        let id = list.add("keep", now()).unwrap();
        assert!(!list.edit(id, "  "));
        assert!(list.edit(id, " renamed "));
        assert_eq!(list.get(id).unwrap().text, "renamed");
    }

    #[test]
    fn filters_split_on_completion() {
        let mut list = TodoList::default();
        let done = list.add("done", now()).unwrap();
        list.add("open", now());
        list.toggle(done);
        assert_eq!(list.filtered(TodoFilter::Active).len(), 1);
        assert_eq!(list.filtered(TodoFilter::Completed)[0].text, "done");
        assert_eq!(list.filtered(TodoFilter::All).len(), 2);
    }

    #[test]
    fn new_day_archives_and_groups_history() {
        let mut list = TodoList::default();
        list.add("monday", now());
        list.start_new_day(now());
        list.add("tuesday", now());
        list.add("tuesday too", now());
        assert_eq!(list.start_new_day(now() + Duration::days(1)), 2);
        assert!(list.todos.is_empty());
        assert_eq!(list.archived.len(), 3);

        let history = list.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].date, (now() + Duration::days(1)).date_naive());
        assert_eq!(history[0].todos.len(), 2);
        assert_eq!(history[1].todos[0].text, "monday");
    }

    #[test]
    fn stored_items_are_normalized() {
        let stored = json!([
            { "text": "no subtasks", "expanded": "yes" },
            { "text": "kept open", "expanded": true, "subtasks": [{ "text": "s" }] }
        ]);
        let list = TodoList::from_values(Some(&stored), None, now());
        assert!(!list.todos[0].expanded);
        assert!(list.todos[0].subtasks.is_empty());
        assert!(list.todos[1].expanded);
        assert_eq!(list.todos[1].subtasks[0].text, "s");
        assert!(list.archived.is_empty());
        assert!(TodoList::parse_items(&json!({}), now()).is_none());
    }
}

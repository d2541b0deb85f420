//! Shared fixtures for unit tests: sample records, an in-memory store that
//! records every call, and a view that records every repaint.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;

use serde_json::Value;

use crate::io::cache::LocalCache;
use crate::io::store::{DocumentStore, StoreError, normalize_path, record_path};
use crate::model::task::{Priority, Status, Task, TaskType, Tasks};
use crate::model::user::{User, Users};
use crate::render::BoardView;

pub fn task(id: &str, status: Status, order: u32) -> Task {
    Task {
        id: id.to_string(),
        titel: format!("Task {}", id),
        description: String::new(),
        finish_date: "2026-11-30".to_string(),
        task_type: TaskType::UserStory,
        priority: Priority::Medium,
        status,
        order,
        assigned_to: Vec::new(),
        sub_tasks: Vec::new(),
    }
}

pub fn tasks_of(list: Vec<Task>) -> Tasks {
    list.into_iter().map(|t| (t.id.clone(), t)).collect()
}

pub fn user(id: &str, given_name: &str) -> User {
    User {
        id: id.to_string(),
        email: format!("{}@example.com", id),
        given_name: given_name.to_string(),
        password: String::new(),
        user_phone: String::new(),
    }
}

pub fn users_of(list: Vec<User>) -> Users {
    list.into_iter().map(|u| (u.id.clone(), u)).collect()
}

// ---------------------------------------------------------------------------
// Mock store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StoreCall {
    Create { collection: String, record: Value },
    Read { path: String },
    Replace { path: String, record: Value },
    Patch { path: String, partial: Value },
    Remove { path: String },
}

/// In-memory [`DocumentStore`] that records calls. `documents` answers reads.
#[derive(Default)]
pub struct MockStore {
    pub calls: RefCell<Vec<StoreCall>>,
    pub documents: RefCell<HashMap<String, Value>>,
    pub fail_writes: Cell<bool>,
    next_id: Cell<u32>,
    /// When set, the cached task slot is snapshotted at every patch and remove
    pub probe: Option<LocalCache>,
    pub probed: RefCell<Vec<Tasks>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(self, path: &str, value: Value) -> Self {
        self.documents
            .borrow_mut()
            .insert(normalize_path(path).to_string(), value);
        self
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.borrow().clone()
    }

    /// Only the patch calls, as `(path, partial)`
    pub fn patches(&self) -> Vec<(String, Value)> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                StoreCall::Patch { path, partial } => Some((path.clone(), partial.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn reset(&self) {
        self.calls.borrow_mut().clear();
    }

    fn snapshot_cache(&self) {
        if let Some(cache) = &self.probe {
            self.probed.borrow_mut().push(cache.load_tasks());
        }
    }

    fn write_result(&self, method: &'static str, path: &str) -> Result<(), StoreError> {
        if self.fail_writes.get() {
            return Err(StoreError::Status {
                method,
                status: 503,
                url: format!("mock://{}", path),
            });
        }
        Ok(())
    }
}

impl DocumentStore for MockStore {
    fn create(&self, collection: &str, record: &Value) -> Result<String, StoreError> {
        let collection = normalize_path(collection).to_string();
        self.calls.borrow_mut().push(StoreCall::Create {
            collection: collection.clone(),
            record: record.clone(),
        });
        self.write_result("POST", &collection)?;
        let n = self.next_id.get() + 1;
        self.next_id.set(n);
        Ok(format!("-N{:03}", n))
    }

    fn read(&self, path: &str) -> Option<Value> {
        let path = normalize_path(path).to_string();
        self.calls
            .borrow_mut()
            .push(StoreCall::Read { path: path.clone() });
        self.documents.borrow().get(&path).cloned()
    }

    fn replace(&self, path: &str, id: &str, record: &Value) -> Result<Value, StoreError> {
        let path = record_path(path, id);
        self.calls.borrow_mut().push(StoreCall::Replace {
            path: path.clone(),
            record: record.clone(),
        });
        self.write_result("PUT", &path)?;
        Ok(record.clone())
    }

    fn patch(&self, path: &str, id: &str, partial: &Value) -> Result<Value, StoreError> {
        let path = record_path(path, id);
        self.snapshot_cache();
        self.calls.borrow_mut().push(StoreCall::Patch {
            path: path.clone(),
            partial: partial.clone(),
        });
        self.write_result("PATCH", &path)?;
        Ok(partial.clone())
    }

    fn remove(&self, path: &str) -> Result<bool, StoreError> {
        let path = normalize_path(path).to_string();
        self.snapshot_cache();
        self.calls
            .borrow_mut()
            .push(StoreCall::Remove { path: path.clone() });
        self.write_result("DELETE", &path)?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Recording view
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    /// Full repaint; carries the number of tasks drawn from
    Board(usize),
    Card(String),
    Subtask(String, usize, bool),
    Marker(Status, usize),
    ClearMarkers,
}

#[derive(Debug, Default)]
pub struct RecordingView {
    pub events: Vec<ViewEvent>,
}

impl RecordingView {
    pub fn boards(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, ViewEvent::Board(_)))
            .count()
    }
}

impl BoardView for RecordingView {
    fn render_board(&mut self, tasks: &Tasks, _users: &Users) {
        self.events.push(ViewEvent::Board(tasks.len()));
    }

    fn render_card(&mut self, task_id: &str, _tasks: &Tasks) {
        self.events.push(ViewEvent::Card(task_id.to_string()));
    }

    fn render_subtask(&mut self, task_id: &str, index: usize, done: bool) {
        self.events
            .push(ViewEvent::Subtask(task_id.to_string(), index, done));
    }

    fn show_insertion_marker(&mut self, lane: Status, index: usize) {
        self.events.push(ViewEvent::Marker(lane, index));
    }

    fn clear_insertion_markers(&mut self) {
        self.events.push(ViewEvent::ClearMarkers);
    }
}

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::model::task::{Priority, Status, SubTask, Task, TaskType, Tasks};
use crate::model::user::{User, Users};

/// Error type for task operations
#[derive(Debug, thiserror::Error)]
pub enum TaskError {
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
    #[error("task {task_id} has no subtask at index {index}")]
    SubtaskOutOfRange { task_id: String, index: usize },
}

/// Form fields a patch may carry. `status` and `order` are owned by the drag engine.
pub const EDITABLE_FIELDS: [&str; 7] = [
    "titel",
    "description",
    "finishDate",
    "priority",
    "type",
    "assignedTo",
    "subTasks",
];

/// A partial task update coming from the edit/add form.
/// Serializes to exactly the fields that are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub titel: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(rename = "finishDate", skip_serializing_if = "Option::is_none")]
    pub finish_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    #[serde(rename = "assignedTo", skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<String>>,
    #[serde(rename = "subTasks", skip_serializing_if = "Option::is_none")]
    pub sub_tasks: Option<Vec<SubTask>>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        *self == TaskPatch::default()
    }

    /// Merge the set fields into `task`, leaving the rest untouched.
    pub fn apply_to(&self, task: &mut Task) {
        if let Some(v) = &self.titel {
            task.titel = v.clone();
        }
        if let Some(v) = &self.description {
            task.description = v.clone();
        }
        if let Some(v) = &self.finish_date {
            task.finish_date = v.clone();
        }
        if let Some(v) = self.priority {
            task.priority = v;
        }
        if let Some(v) = self.task_type {
            task.task_type = v;
        }
        if let Some(v) = &self.assigned_to {
            task.assigned_to = v.clone();
        }
        if let Some(v) = &self.sub_tasks {
            task.sub_tasks = v.clone();
        }
    }
}

/// Lane placement update sent after a drop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    pub order: u32,
}

/// Subtask-only update sent when the dirty ledger is flushed
#[derive(Debug, Clone, Serialize)]
pub struct SubtasksPatch<'a> {
    #[serde(rename = "subTasks")]
    pub sub_tasks: &'a [SubTask],
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Tasks in `status`, ascending by `order`. Ties keep collection order.
pub fn sort_tasks_in_status(status: Status, tasks: &Tasks) -> Vec<(&str, &Task)> {
    let mut lane: Vec<(&str, &Task)> = tasks
        .iter()
        .filter(|(_, t)| t.status == status)
        .map(|(id, t)| (id.as_str(), t))
        .collect();
    lane.sort_by_key(|(_, t)| t.order);
    lane
}

/// Ids in `status`, in display order.
pub fn lane_ids(status: Status, tasks: &Tasks) -> Vec<String> {
    sort_tasks_in_status(status, tasks)
        .into_iter()
        .map(|(id, _)| id.to_string())
        .collect()
}

// ---------------------------------------------------------------------------
// Mutations
// ---------------------------------------------------------------------------

/// Merge `fields` into the task with `id`. Unknown ids are a no-op; returns
/// whether a task was patched.
pub fn patch(tasks: &mut Tasks, id: &str, fields: &TaskPatch) -> bool {
    match tasks.get_mut(id) {
        Some(task) => {
            fields.apply_to(task);
            true
        }
        None => false,
    }
}

/// Rewrite `order` in a lane to 0..n-1, following current display order.
/// Returns `(id, new_order)` for every task whose order changed.
pub fn renumber_lane(tasks: &mut Tasks, status: Status) -> Vec<(String, u32)> {
    let ids = lane_ids(status, tasks);
    assign_orders(tasks, &ids)
}

/// Give each id its position as `order`. Returns the ids whose order changed.
pub(crate) fn assign_orders(tasks: &mut Tasks, ids: &[String]) -> Vec<(String, u32)> {
    let mut changed = Vec::new();
    for (pos, id) in ids.iter().enumerate() {
        let pos = pos as u32;
        if let Some(task) = tasks.get_mut(id)
            && task.order != pos
        {
            task.order = pos;
            changed.push((id.clone(), pos));
        }
    }
    changed
}

/// Flip a subtask's `done`. Returns the new value.
pub fn toggle_subtask(task: &mut Task, index: usize) -> Result<bool, TaskError> {
    let sub = task
        .sub_tasks
        .get_mut(index)
        .ok_or_else(|| TaskError::SubtaskOutOfRange {
            task_id: task.id.clone(),
            index,
        })?;
    sub.done = !sub.done;
    Ok(sub.done)
}

pub fn add_subtask(task: &mut Task, title: &str) -> Result<usize, TaskError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(TaskError::MissingField("title"));
    }
    task.sub_tasks.push(SubTask::new(title));
    Ok(task.sub_tasks.len() - 1)
}

/// Remove a subtask by index. Every later subtask shifts down by one.
pub fn remove_subtask(task: &mut Task, index: usize) -> Result<SubTask, TaskError> {
    if index >= task.sub_tasks.len() {
        return Err(TaskError::SubtaskOutOfRange {
            task_id: task.id.clone(),
            index,
        });
    }
    Ok(task.sub_tasks.remove(index))
}

// ---------------------------------------------------------------------------
// Form projection
// ---------------------------------------------------------------------------

/// Project a raw form payload onto the editable fields. Anything outside
/// [`EDITABLE_FIELDS`] (including `status`/`order`) is dropped.
pub fn build_patch_from_form(data: &Map<String, Value>) -> Result<TaskPatch, TaskError> {
    let mut patch = TaskPatch::default();
    for (key, value) in data {
        match key.as_str() {
            "titel" => patch.titel = Some(string_field("titel", value)?.trim().to_string()),
            "description" => patch.description = Some(string_field("description", value)?),
            "finishDate" => {
                patch.finish_date = Some(string_field("finishDate", value)?.trim().to_string())
            }
            "priority" => patch.priority = Some(enum_field("priority", value)?),
            "type" => patch.task_type = Some(enum_field("type", value)?),
            "assignedTo" => patch.assigned_to = Some(assigned_field(value)?),
            "subTasks" => patch.sub_tasks = Some(subtasks_field(value)?),
            other => tracing::debug!(field = other, "dropping non-editable form field"),
        }
    }
    Ok(patch)
}

/// Check the fields an edit may not blank out.
pub fn validate_edit(patch: &TaskPatch) -> Result<(), TaskError> {
    if let Some(titel) = &patch.titel
        && titel.is_empty()
    {
        return Err(TaskError::MissingField("titel"));
    }
    if let Some(date) = &patch.finish_date {
        check_date(date)?;
    }
    Ok(())
}

/// Build a new task from a form patch. Required: titel, finishDate, type.
pub fn new_task_from_patch(
    patch: &TaskPatch,
    status: Status,
    order: u32,
) -> Result<Task, TaskError> {
    let titel = patch
        .titel
        .clone()
        .filter(|t| !t.is_empty())
        .ok_or(TaskError::MissingField("titel"))?;
    let finish_date = patch
        .finish_date
        .clone()
        .filter(|d| !d.is_empty())
        .ok_or(TaskError::MissingField("finishDate"))?;
    check_date(&finish_date)?;
    let task_type = patch.task_type.ok_or(TaskError::MissingField("type"))?;

    Ok(Task {
        id: String::new(),
        titel,
        description: patch.description.clone().unwrap_or_default(),
        finish_date,
        task_type,
        priority: patch.priority.unwrap_or_default(),
        status,
        order,
        assigned_to: patch.assigned_to.clone().unwrap_or_default(),
        sub_tasks: patch.sub_tasks.clone().unwrap_or_default(),
    })
}

fn check_date(date: &str) -> Result<(), TaskError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map(|_| ())
        .map_err(|e| TaskError::InvalidField {
            field: "finishDate",
            reason: format!("{} ({})", date, e),
        })
}

fn string_field(field: &'static str, value: &Value) -> Result<String, TaskError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Null => Ok(String::new()),
        other => Err(TaskError::InvalidField {
            field,
            reason: format!("expected a string, got {}", other),
        }),
    }
}

fn enum_field<T: serde::de::DeserializeOwned>(
    field: &'static str,
    value: &Value,
) -> Result<T, TaskError> {
    serde_json::from_value(value.clone()).map_err(|e| TaskError::InvalidField {
        field,
        reason: e.to_string(),
    })
}

fn assigned_field(value: &Value) -> Result<Vec<String>, TaskError> {
    let invalid = || TaskError::InvalidField {
        field: "assignedTo",
        reason: "expected a list of user ids".into(),
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => {
            let mut ids: Vec<String> = Vec::with_capacity(items.len());
            for item in items {
                let id = item.as_str().ok_or_else(invalid)?;
                if !ids.iter().any(|existing| existing == id) {
                    ids.push(id.to_string());
                }
            }
            Ok(ids)
        }
        _ => Err(invalid()),
    }
}

/// Subtasks may arrive as full `{title, done}` objects or as bare titles.
fn subtasks_field(value: &Value) -> Result<Vec<SubTask>, TaskError> {
    let invalid = |reason: String| TaskError::InvalidField {
        field: "subTasks",
        reason,
    };
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(title) => Ok(SubTask::new(title.clone())),
                other => serde_json::from_value(other.clone()).map_err(|e| invalid(e.to_string())),
            })
            .collect(),
        other => Err(invalid(format!("expected a list, got {}", other))),
    }
}

// ---------------------------------------------------------------------------
// Extraction from store documents
// ---------------------------------------------------------------------------

/// Decode a store collection (`{id: record, ...}`) into tasks. `null` or a
/// non-object is an empty collection; undecodable records are skipped.
pub fn tasks_from_value(value: Option<Value>) -> Tasks {
    let mut tasks = Tasks::new();
    for (id, record) in collection_entries(value) {
        match serde_json::from_value::<Task>(record) {
            Ok(mut task) => {
                task.id = id.clone();
                tasks.insert(id, task);
            }
            Err(e) => tracing::warn!(task_id = %id, error = %e, "skipping malformed task record"),
        }
    }
    tasks
}

/// Decode a store collection into users, same rules as [`tasks_from_value`].
pub fn users_from_value(value: Option<Value>) -> Users {
    let mut users = Users::new();
    for (id, record) in collection_entries(value) {
        match serde_json::from_value::<User>(record) {
            Ok(mut user) => {
                user.id = id.clone();
                users.insert(id, user);
            }
            Err(e) => tracing::warn!(user_id = %id, error = %e, "skipping malformed user record"),
        }
    }
    users
}

fn collection_entries(value: Option<Value>) -> Vec<(String, Value)> {
    match value {
        Some(Value::Object(map)) => map.into_iter().collect(),
        _ => Vec::new(),
    }
}

use serde::Serialize;

use crate::io::recovery::RecoveryEntry;
use crate::model::task::{Priority, Status, SubTask, Task, TaskType, Tasks};
use crate::model::user::{User, Users};
use crate::ops::task_ops::sort_tasks_in_status;

// ---------------------------------------------------------------------------
// JSON output structs
// ---------------------------------------------------------------------------

#[derive(Serialize)]
pub struct TaskJson {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub due: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub priority: Priority,
    pub status: Status,
    pub lane: &'static str,
    pub order: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub assigned_to: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub subtasks: Vec<SubTask>,
}

#[derive(Serialize)]
pub struct LaneJson {
    pub status: Status,
    pub label: &'static str,
    pub tasks: Vec<TaskJson>,
}

#[derive(Serialize)]
pub struct UserJson {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub phone: String,
    pub initials: String,
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

pub fn task_to_json(task: &Task) -> TaskJson {
    TaskJson {
        id: task.id.clone(),
        title: task.titel.clone(),
        description: task.description.clone(),
        due: task.finish_date.clone(),
        task_type: task.task_type,
        priority: task.priority,
        status: task.status,
        lane: task.status.label(),
        order: task.order,
        assigned_to: task.assigned_to.clone(),
        subtasks: task.sub_tasks.clone(),
    }
}

/// The drawn lanes in board order, each sorted by `order`.
pub fn board_to_json(tasks: &Tasks) -> Vec<LaneJson> {
    Status::BOARD_LANES
        .into_iter()
        .map(|status| LaneJson {
            status,
            label: status.label(),
            tasks: sort_tasks_in_status(status, tasks)
                .into_iter()
                .map(|(_, t)| task_to_json(t))
                .collect(),
        })
        .collect()
}

pub fn user_to_json(user: &User) -> UserJson {
    UserJson {
        id: user.id.clone(),
        name: user.given_name.clone(),
        email: user.email.clone(),
        phone: user.user_phone.clone(),
        initials: user.initials(),
    }
}

// ---------------------------------------------------------------------------
// Text formatting
// ---------------------------------------------------------------------------

pub fn format_user_line(user: &User) -> String {
    format!("{:<4} {}  {}  <{}>", user.initials(), user.id, user.given_name, user.email)
}

pub fn format_users(users: &Users) -> Vec<String> {
    if users.is_empty() {
        return vec!["No users cached. Run `tb reload`.".to_string()];
    }
    users.values().map(format_user_line).collect()
}

/// Header line, the error, then the payload that was not stored.
pub fn format_recovery_entry(entry: &RecoveryEntry) -> Vec<String> {
    let mut lines = vec![
        format!(
            "{} [{}] {}",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.category.as_str(),
            entry.path
        ),
        format!("  error: {}", entry.error),
    ];
    if !entry.payload.is_null() {
        let payload = serde_json::to_string_pretty(&entry.payload)
            .unwrap_or_else(|_| entry.payload.to_string());
        lines.extend(payload.lines().map(|line| format!("    {}", line)));
    }
    lines
}

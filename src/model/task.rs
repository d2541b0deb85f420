use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// The task collection: task id → task, in store iteration order.
pub type Tasks = IndexMap<String, Task>;

/// Board lane a task belongs to. Serialized as its numeric code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Status {
    #[default]
    ToDo,
    InProgress,
    AwaitFeedback,
    Done,
    Cancelled,
}

impl Status {
    /// Every status, in code order
    pub const ALL: [Status; 5] = [
        Status::ToDo,
        Status::InProgress,
        Status::AwaitFeedback,
        Status::Done,
        Status::Cancelled,
    ];

    /// The lanes drawn on the board (cancelled tasks are kept but not shown)
    pub const BOARD_LANES: [Status; 4] = [
        Status::ToDo,
        Status::InProgress,
        Status::AwaitFeedback,
        Status::Done,
    ];

    pub fn code(self) -> u8 {
        match self {
            Status::ToDo => 0,
            Status::InProgress => 1,
            Status::AwaitFeedback => 2,
            Status::Done => 3,
            Status::Cancelled => 4,
        }
    }

    pub fn from_code(code: u8) -> Option<Status> {
        Status::ALL.into_iter().find(|s| s.code() == code)
    }

    /// Human lane label
    pub fn label(self) -> &'static str {
        match self {
            Status::ToDo => "To Do",
            Status::InProgress => "In Progress",
            Status::AwaitFeedback => "Await Feedback",
            Status::Done => "Done",
            Status::Cancelled => "Cancelled",
        }
    }

    /// Parse a lane from its code (`1`) or a loose label (`in-progress`, `done`).
    pub fn parse_lane(s: &str) -> Option<Status> {
        if let Ok(code) = s.parse::<u8>() {
            return Status::from_code(code);
        }
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        match key.as_str() {
            "todo" => Some(Status::ToDo),
            "inprogress" | "progress" => Some(Status::InProgress),
            "awaitfeedback" | "feedback" => Some(Status::AwaitFeedback),
            "done" => Some(Status::Done),
            "cancelled" | "canceled" => Some(Status::Cancelled),
            _ => None,
        }
    }
}

impl TryFrom<u8> for Status {
    type Error = String;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        Status::from_code(code).ok_or_else(|| format!("unknown status code {}", code))
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> u8 {
        status.code()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    #[default]
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Task category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    TechnicalTask,
    UserStory,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskType::TechnicalTask => "technical_task",
            TaskType::UserStory => "user_story",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TaskType::TechnicalTask => "Technical Task",
            TaskType::UserStory => "User Story",
        }
    }
}

/// A checklist entry. Its index in `Task::sub_tasks` is its only identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubTask {
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl SubTask {
    pub fn new(title: impl Into<String>) -> Self {
        SubTask {
            title: title.into(),
            done: false,
        }
    }
}

/// A board task as stored remotely and in the session cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned key. Lives as the collection key, not inside the record.
    #[serde(skip)]
    pub id: String,
    pub titel: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "finishDate")]
    pub finish_date: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub status: Status,
    /// Rank within the lane; absent reads as 0
    #[serde(default)]
    pub order: u32,
    #[serde(rename = "assignedTo", default)]
    pub assigned_to: Vec<String>,
    #[serde(rename = "subTasks", default)]
    pub sub_tasks: Vec<SubTask>,
}

impl Task {
    /// Count of finished subtasks, for card progress display
    pub fn subtasks_done(&self) -> usize {
        self.sub_tasks.iter().filter(|s| s.done).count()
    }
}

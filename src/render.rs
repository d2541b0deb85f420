use std::io::Write;

use crate::model::task::{Status, Task, Tasks};
use crate::model::user::Users;
use crate::ops::task_ops::sort_tasks_in_status;

/// Receives collection changes from [`crate::app::App`] and repaints.
pub trait BoardView {
    /// Repaint every lane from the full collection.
    fn render_board(&mut self, tasks: &Tasks, users: &Users);
    /// Repaint only the card for `task_id`.
    fn render_card(&mut self, task_id: &str, tasks: &Tasks);
    /// Repaint one subtask checkbox inside the open detail view.
    fn render_subtask(&mut self, task_id: &str, index: usize, done: bool);
    /// Show where a dragged card would land.
    fn show_insertion_marker(&mut self, _lane: Status, _index: usize) {}
    /// Remove insertion markers from every lane.
    fn clear_insertion_markers(&mut self) {}
}

// ---------------------------------------------------------------------------
// Plain-text formatting
// ---------------------------------------------------------------------------

/// Placeholder drawn in a lane with no cards
pub fn empty_lane_line(lane: Status) -> String {
    format!("  No tasks in {}", lane.label())
}

/// One-line card: id, title, type, priority, due date, progress, assignees.
pub fn format_card(task: &Task, users: &Users) -> String {
    let mut line = format!(
        "  {}  {}  ({}, {}, due {})",
        task.id,
        task.titel,
        task.task_type.label(),
        task.priority.as_str(),
        task.finish_date
    );
    if !task.sub_tasks.is_empty() {
        line.push_str(&format!(
            "  {}/{} subtasks",
            task.subtasks_done(),
            task.sub_tasks.len()
        ));
    }
    let initials: Vec<String> = task
        .assigned_to
        .iter()
        .filter_map(|id| users.get(id))
        .map(|u| format!("@{}", u.initials()))
        .collect();
    if !initials.is_empty() {
        line.push_str("  ");
        line.push_str(&initials.join(" "));
    }
    line
}

/// The board lanes, each with its cards in order or a single placeholder.
pub fn board_lines(tasks: &Tasks, users: &Users) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, lane) in Status::BOARD_LANES.into_iter().enumerate() {
        if i > 0 {
            lines.push(String::new());
        }
        let cards = sort_tasks_in_status(lane, tasks);
        lines.push(format!("== {} ({}) ==", lane.label(), cards.len()));
        if cards.is_empty() {
            lines.push(empty_lane_line(lane));
        }
        for (_, task) in cards {
            lines.push(format_card(task, users));
        }
    }
    lines
}

/// Detail view of a single task
pub fn detail_lines(task: &Task, users: &Users) -> Vec<String> {
    let mut lines = vec![format!("{}  {}", task.id, task.titel)];
    lines.push(format!("type: {}", task.task_type.label()));
    lines.push(format!("priority: {}", task.priority.as_str()));
    lines.push(format!("status: {} (#{} in lane)", task.status, task.order));
    lines.push(format!("due: {}", task.finish_date));
    if !task.description.is_empty() {
        lines.push("description:".to_string());
        for line in task.description.lines() {
            lines.push(format!("  {}", line));
        }
    }
    if !task.assigned_to.is_empty() {
        let names: Vec<String> = task
            .assigned_to
            .iter()
            .map(|id| match users.get(id) {
                Some(u) => u.given_name.clone(),
                None => format!("{} (unknown)", id),
            })
            .collect();
        lines.push(format!("assigned: {}", names.join(", ")));
    }
    if !task.sub_tasks.is_empty() {
        lines.push("subtasks:".to_string());
        for (i, sub) in task.sub_tasks.iter().enumerate() {
            lines.push(format!("  {} [{}] {}", i, if sub.done { 'x' } else { ' ' }, sub.title));
        }
    }
    lines
}

// ---------------------------------------------------------------------------
// Text view
// ---------------------------------------------------------------------------

/// [`BoardView`] that prints to a writer (stdout for the CLI).
pub struct TextView<W: Write> {
    out: W,
    users: Users,
    marker: Option<(Status, usize)>,
}

impl<W: Write> TextView<W> {
    pub fn new(out: W) -> Self {
        TextView {
            out,
            users: Users::new(),
            marker: None,
        }
    }

    pub fn marker(&self) -> Option<(Status, usize)> {
        self.marker
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, lines: &[String]) {
        for line in lines {
            if let Err(e) = writeln!(self.out, "{}", line) {
                tracing::error!(error = %e, "could not write board output");
                return;
            }
        }
    }
}

impl<W: Write> BoardView for TextView<W> {
    fn render_board(&mut self, tasks: &Tasks, users: &Users) {
        self.users = users.clone();
        let lines = board_lines(tasks, users);
        self.write_lines(&lines);
    }

    fn render_card(&mut self, task_id: &str, tasks: &Tasks) {
        let Some(task) = tasks.get(task_id) else {
            tracing::debug!(task_id, "card not in collection, nothing to repaint");
            return;
        };
        let line = format_card(task, &self.users);
        self.write_lines(&[line]);
    }

    fn render_subtask(&mut self, task_id: &str, index: usize, done: bool) {
        let line = format!("  {} subtask {} [{}]", task_id, index, if done { 'x' } else { ' ' });
        self.write_lines(&[line]);
    }

    fn show_insertion_marker(&mut self, lane: Status, index: usize) {
        self.marker = Some((lane, index));
    }

    fn clear_insertion_markers(&mut self) {
        self.marker = None;
    }
}

//! Drag-and-drop reordering across board lanes.
//!
//! A gesture starts with [`DragEngine::start`], ends with [`DragEngine::end`],
//! and in between a drop is resolved against the rendered card geometry of
//! the destination lane by [`insertion_index`] and applied to the collection
//! by [`reorder_into_lane`].

use crate::model::task::{Status, Tasks};
use crate::ops::task_ops::{assign_orders, lane_ids, renumber_lane};

/// Error type for drag gestures
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DragError {
    #[error("a drag of task {0} is already in progress")]
    AlreadyDragging(String),
    #[error("task not found: {0}")]
    NotFound(String),
}

/// Vertical extent of a rendered card, in viewport coordinates (y grows downward).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CardBox {
    pub top: f64,
    pub height: f64,
}

impl CardBox {
    pub fn new(top: f64, height: f64) -> Self {
        CardBox { top, height }
    }

    pub fn midpoint(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Index of the first card whose midpoint lies below the pointer, or
/// `cards.len()` when the pointer is below every card. `cards` must be in
/// lane display order.
pub fn insertion_index(pointer_y: f64, cards: &[CardBox]) -> usize {
    cards
        .iter()
        .position(|card| card.midpoint() > pointer_y)
        .unwrap_or(cards.len())
}

/// Gesture state: holds the id of the card being dragged, if any.
#[derive(Debug, Default)]
pub struct DragEngine {
    dragged: Option<String>,
}

impl DragEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle → Dragging. Refused while another gesture is active.
    pub fn start(&mut self, task_id: &str) -> Result<(), DragError> {
        if let Some(current) = &self.dragged {
            return Err(DragError::AlreadyDragging(current.clone()));
        }
        self.dragged = Some(task_id.to_string());
        Ok(())
    }

    /// Dragging → Idle, whether or not the drop landed. Returns the id that was held.
    pub fn end(&mut self) -> Option<String> {
        self.dragged.take()
    }

    pub fn dragged(&self) -> Option<&str> {
        self.dragged.as_deref()
    }

    pub fn is_dragging(&self) -> bool {
        self.dragged.is_some()
    }
}

/// The result of applying a drop to the collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaneMove {
    pub task_id: String,
    pub from: Status,
    pub to: Status,
    /// New rank of the dragged task in `to`
    pub order: u32,
    /// Other tasks (in either lane) whose `order` was rewritten
    pub renumbered: Vec<(String, u32)>,
}

impl LaneMove {
    pub fn changed_lane(&self) -> bool {
        self.from != self.to
    }
}

/// Move `task_id` into lane `to` at `raw_index` (as computed against the
/// lane's cards before the move) and renumber. Returns None if the task is
/// not in the collection.
pub fn reorder_into_lane(
    tasks: &mut Tasks,
    task_id: &str,
    to: Status,
    raw_index: usize,
) -> Option<LaneMove> {
    let from = tasks.get(task_id)?.status;
    let mut lane = lane_ids(to, tasks);

    let mut index = raw_index;
    if let Some(current) = lane.iter().position(|id| id == task_id) {
        lane.remove(current);
        // Removing an earlier card shifts everything after it up by one
        if current < index {
            index -= 1;
        }
    }
    let index = index.min(lane.len());
    lane.insert(index, task_id.to_string());

    if let Some(task) = tasks.get_mut(task_id) {
        task.status = to;
    }
    let mut renumbered = assign_orders(tasks, &lane);
    if from != to {
        renumbered.extend(renumber_lane(tasks, from));
    }
    renumbered.retain(|(id, _)| id != task_id);

    Some(LaneMove {
        task_id: task_id.to_string(),
        from,
        to,
        order: index as u32,
        renumbered,
    })
}

//! Session state for the board: the task and user collections, their cache
//! mirror, the remote store, the view, and the drag/ledger state that
//! coordinates them.
//!
//! Every mutation follows the same order: change the in-memory collection,
//! write the whole cache slot, then issue the remote write, then repaint.
//! A failed remote write never rolls back local state; it is written to the
//! recovery log and returned to the caller.

use serde_json::{Map, Value};

use crate::io::cache::{CacheError, LocalCache};
use crate::io::recovery::{self, RecoveryCategory, RecoveryEntry};
use crate::io::store::{DocumentStore, StoreError, record_path};
use crate::model::config::SyncConfig;
use crate::model::task::{Status, Task, Tasks};
use crate::model::user::Users;
use crate::ops::drag::{CardBox, DragEngine, DragError, LaneMove, insertion_index, reorder_into_lane};
use crate::ops::ledger::SubtaskLedger;
use crate::ops::task_ops::{
    self, LanePatch, SubtasksPatch, TaskError, build_patch_from_form, new_task_from_patch,
    renumber_lane, sort_tasks_in_status, tasks_from_value, users_from_value, validate_edit,
};
use crate::render::BoardView;

/// Store collection holding tasks
pub const TASKS_PATH: &str = "tasks";
/// Store collection holding users
pub const USERS_PATH: &str = "users";

/// Error type for board operations
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Task(#[from] TaskError),
    #[error(transparent)]
    Drag(#[from] DragError),
    #[error("remote store: {0}")]
    Store(#[from] StoreError),
    #[error("local cache: {0}")]
    Cache(#[from] CacheError),
    #[error("could not encode record: {0}")]
    Encode(#[from] serde_json::Error),
}

/// How the task detail modal was dismissed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalClose {
    Button,
    Escape,
}

pub struct App<S: DocumentStore, V: BoardView> {
    tasks: Tasks,
    users: Users,
    cache: LocalCache,
    store: S,
    view: V,
    drag: DragEngine,
    ledger: SubtaskLedger,
    sync: SyncConfig,
}

impl<S: DocumentStore, V: BoardView> App<S, V> {
    /// Start a session from whatever the cache holds.
    pub fn new(store: S, view: V, cache: LocalCache, sync: SyncConfig) -> Self {
        App {
            tasks: cache.load_tasks(),
            users: cache.load_users(),
            cache,
            store,
            view,
            drag: DragEngine::new(),
            ledger: SubtaskLedger::new(),
            sync,
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn tasks(&self) -> &Tasks {
        &self.tasks
    }

    pub fn users(&self) -> &Users {
        &self.users
    }

    pub fn task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.get(task_id)
    }

    pub fn lane(&self, status: Status) -> Vec<(&str, &Task)> {
        sort_tasks_in_status(status, &self.tasks)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn ledger(&self) -> &SubtaskLedger {
        &self.ledger
    }

    pub fn dragged(&self) -> Option<&str> {
        self.drag.dragged()
    }

    /// Repaint the whole board.
    pub fn render(&mut self) {
        self.view.render_board(&self.tasks, &self.users);
    }

    // -----------------------------------------------------------------------
    // Collection lifecycle
    // -----------------------------------------------------------------------

    /// Replace both collections with the store's, rebuild the cache, repaint.
    /// An unreachable store reads as empty collections.
    pub fn reload(&mut self) -> Result<(), AppError> {
        self.tasks = tasks_from_value(self.store.read(TASKS_PATH));
        self.users = users_from_value(self.store.read(USERS_PATH));
        self.cache.save_tasks(&self.tasks)?;
        self.cache.save_users(&self.users)?;
        tracing::info!(
            tasks = self.tasks.len(),
            users = self.users.len(),
            "reloaded board from store"
        );
        self.render();
        Ok(())
    }

    /// Create a task from a form payload at the bottom of `status`.
    /// The store assigns the id, so this is the one write that precedes the cache.
    pub fn create_task(
        &mut self,
        form: &Map<String, Value>,
        status: Status,
    ) -> Result<String, AppError> {
        let patch = build_patch_from_form(form)?;
        let order = sort_tasks_in_status(status, &self.tasks).len() as u32;
        let mut task = new_task_from_patch(&patch, status, order)?;
        let record = serde_json::to_value(&task)?;

        let id = match self.store.create(TASKS_PATH, &record) {
            Ok(id) => id,
            Err(e) => {
                self.log_failed_write(RecoveryCategory::Create, TASKS_PATH, &record, &e);
                return Err(e.into());
            }
        };

        task.id = id.clone();
        self.tasks.insert(id.clone(), task);
        self.cache.save_tasks(&self.tasks)?;
        tracing::info!(task_id = %id, lane = %status, "created task");
        self.render();
        Ok(id)
    }

    /// Apply an edit-form payload. Returns false (and does nothing) if the
    /// task no longer exists.
    pub fn edit_task(&mut self, task_id: &str, form: &Map<String, Value>) -> Result<bool, AppError> {
        let patch = build_patch_from_form(form)?;
        validate_edit(&patch)?;
        if !task_ops::patch(&mut self.tasks, task_id, &patch) {
            tracing::debug!(task_id, "edit for unknown task ignored");
            return Ok(false);
        }
        if patch.is_empty() {
            return Ok(true);
        }
        self.cache.save_tasks(&self.tasks)?;

        let result = self.push_patch(task_id, &serde_json::to_value(&patch)?);
        if result.is_ok() && patch.sub_tasks.is_some() {
            // The full subtask list just went out
            self.ledger.clear(task_id);
        }
        self.view.render_card(task_id, &self.tasks);
        result.map(|_| true)
    }

    /// Delete a task locally and remotely. Returns false if it was not present.
    pub fn delete_task(&mut self, task_id: &str) -> Result<bool, AppError> {
        let Some(task) = self.tasks.shift_remove(task_id) else {
            return Ok(false);
        };
        let renumbered = renumber_lane(&mut self.tasks, task.status);
        self.cache.save_tasks(&self.tasks)?;

        let path = record_path(TASKS_PATH, task_id);
        let mut result = match self.store.remove(&path) {
            Ok(_) => Ok(()),
            Err(e) => {
                let record = serde_json::to_value(&task)?;
                self.log_failed_write(RecoveryCategory::Delete, &path, &record, &e);
                Err(AppError::from(e))
            }
        };
        if self.sync.propagate_lane_order {
            let sibling = self.push_orders(&renumbered);
            if result.is_ok() {
                result = sibling;
            }
        }
        tracing::info!(task_id, "deleted task");
        self.render();
        result.map(|_| true)
    }

    // -----------------------------------------------------------------------
    // Drag-and-drop
    // -----------------------------------------------------------------------

    pub fn start_drag(&mut self, task_id: &str) -> Result<(), AppError> {
        if !self.tasks.contains_key(task_id) {
            return Err(DragError::NotFound(task_id.to_string()).into());
        }
        self.drag.start(task_id)?;
        Ok(())
    }

    /// Show where the dragged card would land. None when no gesture is active.
    pub fn drag_over(&mut self, lane: Status, pointer_y: f64, cards: &[CardBox]) -> Option<usize> {
        if !self.drag.is_dragging() {
            return None;
        }
        let index = insertion_index(pointer_y, cards);
        self.view.show_insertion_marker(lane, index);
        Some(index)
    }

    /// Drop the dragged card into `lane` at the pointer position. `cards`
    /// are the lane's rendered cards in display order.
    pub fn drop_task(
        &mut self,
        lane: Status,
        pointer_y: f64,
        cards: &[CardBox],
    ) -> Result<Option<LaneMove>, AppError> {
        let index = insertion_index(pointer_y, cards);
        self.drop_task_at(lane, index)
    }

    /// Drop the dragged card at a raw insertion index (counted over the
    /// lane's cards before the move). Stray drops are a no-op.
    pub fn drop_task_at(
        &mut self,
        lane: Status,
        raw_index: usize,
    ) -> Result<Option<LaneMove>, AppError> {
        let Some(task_id) = self.drag.dragged().map(str::to_string) else {
            tracing::debug!("drop without an active drag ignored");
            return Ok(None);
        };
        let Some(mv) = reorder_into_lane(&mut self.tasks, &task_id, lane, raw_index) else {
            tracing::debug!(task_id, "drop for a task no longer on the board ignored");
            return Ok(None);
        };

        self.cache.save_tasks(&self.tasks)?;

        let mut result = self.push_lane_patch(
            &mv.task_id,
            LanePatch {
                status: Some(mv.to),
                order: mv.order,
            },
        );
        if self.sync.propagate_lane_order {
            let siblings = self.push_orders(&mv.renumbered);
            if result.is_ok() {
                result = siblings;
            }
        }

        tracing::info!(
            task_id = %mv.task_id,
            from = %mv.from,
            to = %mv.to,
            order = mv.order,
            "dropped task"
        );
        self.render();
        result.map(|_| Some(mv))
    }

    /// Finish the gesture, landed or not. Returns the id that was being dragged.
    pub fn end_drag(&mut self) -> Option<String> {
        let id = self.drag.end();
        self.view.clear_insertion_markers();
        id
    }

    /// A whole gesture with a known target index: start, drop, end.
    pub fn move_task(
        &mut self,
        task_id: &str,
        lane: Status,
        raw_index: usize,
    ) -> Result<Option<LaneMove>, AppError> {
        self.start_drag(task_id)?;
        let result = self.drop_task_at(lane, raw_index);
        self.end_drag();
        result
    }

    // -----------------------------------------------------------------------
    // Subtasks
    // -----------------------------------------------------------------------

    /// Flip a subtask. Cached immediately; pushed remotely when the modal closes.
    pub fn toggle_subtask(&mut self, task_id: &str, index: usize) -> Result<bool, AppError> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        let done = task_ops::toggle_subtask(task, index)?;
        self.cache.save_tasks(&self.tasks)?;
        self.ledger.mark_dirty(task_id);
        self.view.render_subtask(task_id, index, done);
        Ok(done)
    }

    /// Append a subtask and persist the full list.
    pub fn add_subtask(&mut self, task_id: &str, title: &str) -> Result<usize, AppError> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        let index = task_ops::add_subtask(task, title)?;
        self.persist_subtasks(task_id)?;
        Ok(index)
    }

    /// Remove a subtask by index and persist the full (shifted) list.
    pub fn remove_subtask(&mut self, task_id: &str, index: usize) -> Result<(), AppError> {
        let task = self
            .tasks
            .get_mut(task_id)
            .ok_or_else(|| TaskError::NotFound(task_id.to_string()))?;
        task_ops::remove_subtask(task, index)?;
        self.persist_subtasks(task_id)
    }

    /// Close the task detail modal. Every close path flushes the ledger.
    pub fn close_modal(&mut self, how: ModalClose) -> Result<usize, AppError> {
        tracing::debug!(?how, pending = self.ledger.len(), "closing task modal");
        self.flush_subtasks()
    }

    /// Push `subTasks` for every dirty task. Ids whose task is gone are
    /// dropped silently; ids whose push fails stay dirty. Returns the number
    /// of tasks pushed.
    pub fn flush_subtasks(&mut self) -> Result<usize, AppError> {
        let mut flushed = 0;
        let mut first_err = None;
        for task_id in self.ledger.pending() {
            let Some(task) = self.tasks.get(&task_id) else {
                tracing::debug!(task_id, "dirty task was deleted, skipping flush");
                self.ledger.clear(&task_id);
                continue;
            };
            let partial = serde_json::to_value(SubtasksPatch {
                sub_tasks: &task.sub_tasks,
            })?;
            match self.push_patch(&task_id, &partial) {
                Ok(()) => {
                    self.ledger.clear(&task_id);
                    flushed += 1;
                    self.view.render_card(&task_id, &self.tasks);
                }
                Err(e) => {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(flushed),
        }
    }

    fn persist_subtasks(&mut self, task_id: &str) -> Result<(), AppError> {
        self.cache.save_tasks(&self.tasks)?;
        let Some(task) = self.tasks.get(task_id) else {
            return Ok(());
        };
        let partial = serde_json::to_value(SubtasksPatch {
            sub_tasks: &task.sub_tasks,
        })?;
        let result = self.push_patch(task_id, &partial);
        if result.is_ok() {
            self.ledger.clear(task_id);
        }
        self.view.render_card(task_id, &self.tasks);
        result
    }

    // -----------------------------------------------------------------------
    // Remote writes
    // -----------------------------------------------------------------------

    fn push_lane_patch(&self, task_id: &str, patch: LanePatch) -> Result<(), AppError> {
        self.push_patch(task_id, &serde_json::to_value(patch)?)
    }

    /// Push `{order}` for renumbered siblings. Every patch is attempted; the
    /// first failure is returned.
    fn push_orders(&self, renumbered: &[(String, u32)]) -> Result<(), AppError> {
        let mut first_err = None;
        for (id, order) in renumbered {
            let patch = LanePatch {
                status: None,
                order: *order,
            };
            if let Err(e) = self.push_lane_patch(id, patch) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    fn push_patch(&self, task_id: &str, partial: &Value) -> Result<(), AppError> {
        match self.store.patch(TASKS_PATH, task_id, partial) {
            Ok(_) => Ok(()),
            Err(e) => {
                let path = record_path(TASKS_PATH, task_id);
                self.log_failed_write(RecoveryCategory::Write, &path, partial, &e);
                Err(e.into())
            }
        }
    }

    fn log_failed_write(
        &self,
        category: RecoveryCategory,
        path: &str,
        payload: &Value,
        error: &StoreError,
    ) {
        tracing::error!(%path, %error, "remote write failed; local cache keeps the change");
        let entry = RecoveryEntry::now(category, path, error.to_string(), payload.clone());
        recovery::log_recovery(self.cache.dir(), &entry);
    }
}

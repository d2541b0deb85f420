use indexmap::IndexSet;

/// Task ids whose subtask toggles are in the local cache but not yet in the
/// remote store. Drained when the task detail modal closes.
#[derive(Debug, Default)]
pub struct SubtaskLedger {
    dirty: IndexSet<String>,
}

impl SubtaskLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if the id was not already dirty.
    pub fn mark_dirty(&mut self, task_id: &str) -> bool {
        self.dirty.insert(task_id.to_string())
    }

    pub fn clear(&mut self, task_id: &str) -> bool {
        self.dirty.shift_remove(task_id)
    }

    pub fn is_dirty(&self, task_id: &str) -> bool {
        self.dirty.contains(task_id)
    }

    pub fn is_empty(&self) -> bool {
        self.dirty.is_empty()
    }

    pub fn len(&self) -> usize {
        self.dirty.len()
    }

    /// Dirty ids in the order they were first toggled.
    pub fn pending(&self) -> Vec<String> {
        self.dirty.iter().cloned().collect()
    }
}

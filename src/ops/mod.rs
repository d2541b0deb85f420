pub mod drag;
pub mod ledger;
pub mod task_ops;

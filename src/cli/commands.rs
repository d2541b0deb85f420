use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tb", about = concat!("taskboard v", env!("CARGO_PKG_VERSION"), " - a kanban board synced to a JSON document store"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file (default: ./board.toml if present)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Base URL of the document store
    #[arg(long = "store-url", env = "TASKBOARD_STORE_URL", global = true)]
    pub store_url: Option<String>,

    /// Directory holding the local cache and recovery log
    #[arg(long = "cache-dir", global = true)]
    pub cache_dir: Option<String>,

    /// Log filter, e.g. "debug" or "taskboard=info" (default: RUST_LOG, else warn)
    #[arg(long = "log-level", global = true)]
    pub log_level: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Pull tasks and users from the store and rebuild the local cache
    Reload,
    /// Print the board from the local cache
    Board,
    /// Show task details
    Show(ShowArgs),
    /// List cached users
    Users,
    /// Create a task at the bottom of a lane
    Add(AddArgs),
    /// Edit task fields
    Edit(EditArgs),
    /// Delete a task
    Rm(RmArgs),
    /// Move a task to a lane position (drag and drop)
    Mv(MvArgs),
    /// Toggle subtasks, then close the task (pushes subtask changes)
    Check(CheckArgs),
    /// Add or remove subtasks
    Sub(SubCmd),
    /// View or clear the recovery log of failed remote writes
    Recovery(RecoveryArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ShowArgs {
    /// Task ID to show
    #[arg(allow_hyphen_values = true)]
    pub id: String,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

/// Editable task fields shared by `add` and `edit`
#[derive(Args, Default)]
pub struct TaskFieldArgs {
    /// Task title
    #[arg(long)]
    pub title: Option<String>,
    /// Description text
    #[arg(long)]
    pub description: Option<String>,
    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
    /// Priority (urgent, medium, low)
    #[arg(long)]
    pub priority: Option<String>,
    /// Task type (user_story, technical_task)
    #[arg(long = "type")]
    pub task_type: Option<String>,
    /// Assign a user by id (repeatable)
    #[arg(long = "assign")]
    pub assign: Vec<String>,
    /// Subtask title (repeatable; on edit, replaces the whole list)
    #[arg(long = "sub")]
    pub sub: Vec<String>,
}

#[derive(Args)]
pub struct AddArgs {
    #[command(flatten)]
    pub fields: TaskFieldArgs,
    /// Lane to add to: todo, progress, feedback, done (or 0-4)
    #[arg(long, default_value = "todo")]
    pub status: String,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    #[arg(allow_hyphen_values = true)]
    pub id: String,
    #[command(flatten)]
    pub fields: TaskFieldArgs,
    /// Remove all assignees
    #[arg(long, conflicts_with = "assign")]
    pub unassign: bool,
}

#[derive(Args)]
pub struct RmArgs {
    /// Task ID to delete
    #[arg(allow_hyphen_values = true)]
    pub id: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID
    #[arg(allow_hyphen_values = true)]
    pub id: String,
    /// Target lane: todo, progress, feedback, done (or 0-4)
    pub lane: String,
    /// Insertion index among the lane's current cards (default: end)
    #[arg(long)]
    pub index: Option<usize>,
}

#[derive(Args)]
pub struct CheckArgs {
    /// Task ID
    #[arg(allow_hyphen_values = true)]
    pub id: String,
    /// Subtask indices to toggle
    #[arg(required = true)]
    pub indices: Vec<usize>,
}

#[derive(Args)]
pub struct SubCmd {
    #[command(subcommand)]
    pub action: SubAction,
}

#[derive(Subcommand)]
pub enum SubAction {
    /// Append a subtask
    Add {
        #[arg(allow_hyphen_values = true)]
        id: String,
        title: String,
    },
    /// Remove a subtask by index
    Rm {
        #[arg(allow_hyphen_values = true)]
        id: String,
        index: usize,
    },
}

// ---------------------------------------------------------------------------
// Recovery log
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct RecoveryArgs {
    /// Maximum number of entries to show (default: 10)
    #[arg(long)]
    pub limit: Option<usize>,
    /// Remove all entries
    #[arg(long)]
    pub clear: bool,
    /// Print the path to the recovery log
    #[arg(long, conflicts_with = "clear")]
    pub path: bool,
}

use std::io::Stdout;
use std::path::Path;

use serde_json::{Map, Value};

use crate::app::{App, ModalClose};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::cache::LocalCache;
use crate::io::config_io;
use crate::io::recovery;
use crate::io::store::HttpStore;
use crate::model::config::BoardConfig;
use crate::model::task::Status;
use crate::render::{TextView, board_lines, detail_lines};

type CmdResult = Result<(), Box<dyn std::error::Error>>;
type CliApp = App<HttpStore, TextView<Stdout>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let session = Session::load(&cli)?;

    match cli.command {
        // Offline: read the cache only
        Commands::Board => cmd_board(&session, json),
        Commands::Show(args) => cmd_show(&session, args, json),
        Commands::Users => cmd_users(&session, json),
        Commands::Recovery(args) => cmd_recovery(&session, args, json),

        // Store-backed
        Commands::Reload => cmd_reload(&session),
        Commands::Add(args) => cmd_add(&session, args),
        Commands::Edit(args) => cmd_edit(&session, args),
        Commands::Rm(args) => cmd_rm(&session, args),
        Commands::Mv(args) => cmd_mv(&session, args),
        Commands::Check(args) => cmd_check(&session, args),
        Commands::Sub(args) => cmd_sub(&session, args),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolved config plus the opened cache for one invocation.
struct Session {
    config: BoardConfig,
    cache: LocalCache,
}

impl Session {
    fn load(cli: &Cli) -> Result<Self, Box<dyn std::error::Error>> {
        let cwd = std::env::current_dir()?;
        let mut config = config_io::load_config(cli.config.as_deref().map(Path::new), &cwd)?;
        if let Some(url) = &cli.store_url {
            config.store.base_url = url.clone();
        }
        if let Some(dir) = &cli.cache_dir {
            config.cache.dir = Some(dir.clone());
        }
        let dir = config_io::cache_dir(&config);
        tracing::debug!(cache = %dir.display(), "opening local cache");
        let cache = LocalCache::open(&dir)?;
        Ok(Session { config, cache })
    }

    fn open_app(&self) -> Result<CliApp, Box<dyn std::error::Error>> {
        let base_url = &self.config.store.base_url;
        if base_url.is_empty() {
            return Err(
                "no store configured: set [store] base_url in board.toml, --store-url, or TASKBOARD_STORE_URL"
                    .into(),
            );
        }
        let store = HttpStore::new(base_url, &self.config.store.suffix)?;
        Ok(App::new(
            store,
            TextView::new(std::io::stdout()),
            self.cache.clone(),
            self.config.sync,
        ))
    }
}

fn parse_lane(s: &str) -> Result<Status, String> {
    Status::parse_lane(s).ok_or_else(|| {
        format!(
            "unknown lane '{}' (expected todo, progress, feedback, done, cancelled or 0-4)",
            s
        )
    })
}

/// Build the edit-form payload from CLI flags. Only flags that were given
/// become fields.
fn fields_to_form(fields: TaskFieldArgs) -> Map<String, Value> {
    let mut form = Map::new();
    if let Some(title) = fields.title {
        form.insert("titel".into(), Value::String(title));
    }
    if let Some(description) = fields.description {
        form.insert("description".into(), Value::String(description));
    }
    if let Some(due) = fields.due {
        form.insert("finishDate".into(), Value::String(due));
    }
    if let Some(priority) = fields.priority {
        form.insert("priority".into(), Value::String(priority.to_lowercase()));
    }
    if let Some(task_type) = fields.task_type {
        form.insert("type".into(), Value::String(task_type.to_lowercase()));
    }
    if !fields.assign.is_empty() {
        form.insert(
            "assignedTo".into(),
            Value::Array(fields.assign.into_iter().map(Value::String).collect()),
        );
    }
    if !fields.sub.is_empty() {
        form.insert(
            "subTasks".into(),
            Value::Array(fields.sub.into_iter().map(Value::String).collect()),
        );
    }
    form
}

fn print_lines(lines: &[String]) {
    for line in lines {
        println!("{}", line);
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_board(session: &Session, json: bool) -> CmdResult {
    let tasks = session.cache.load_tasks();
    if json {
        println!("{}", serde_json::to_string_pretty(&board_to_json(&tasks))?);
    } else {
        let users = session.cache.load_users();
        print_lines(&board_lines(&tasks, &users));
    }
    Ok(())
}

fn cmd_show(session: &Session, args: ShowArgs, json: bool) -> CmdResult {
    let tasks = session.cache.load_tasks();
    let task = tasks
        .get(&args.id)
        .ok_or_else(|| format!("task not found: {}", args.id))?;
    if json {
        println!("{}", serde_json::to_string_pretty(&task_to_json(task))?);
    } else {
        let users = session.cache.load_users();
        print_lines(&detail_lines(task, &users));
    }
    Ok(())
}

fn cmd_users(session: &Session, json: bool) -> CmdResult {
    let users = session.cache.load_users();
    if json {
        let list: Vec<UserJson> = users.values().map(user_to_json).collect();
        println!("{}", serde_json::to_string_pretty(&list)?);
    } else {
        print_lines(&format_users(&users));
    }
    Ok(())
}

fn cmd_recovery(session: &Session, args: RecoveryArgs, json: bool) -> CmdResult {
    let dir = session.cache.dir();
    if args.path {
        println!("{}", recovery::recovery_log_path(dir).display());
        return Ok(());
    }
    if args.clear {
        let removed = recovery::clear_recovery(dir)?;
        println!("Removed {} recovery entries", removed);
        return Ok(());
    }

    let limit = args.limit.unwrap_or(10);
    let entries: Vec<_> = recovery::read_recovery_entries(dir)
        .into_iter()
        .take(limit)
        .collect();
    if json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else if entries.is_empty() {
        println!("Recovery log is empty");
    } else {
        for (i, entry) in entries.iter().enumerate() {
            if i > 0 {
                println!();
            }
            print_lines(&format_recovery_entry(entry));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_reload(session: &Session) -> CmdResult {
    let mut app = session.open_app()?;
    app.reload()?;
    Ok(())
}

fn cmd_add(session: &Session, args: AddArgs) -> CmdResult {
    let status = parse_lane(&args.status)?;
    let form = fields_to_form(args.fields);
    let mut app = session.open_app()?;
    let id = app.create_task(&form, status)?;
    println!("Created {}", id);
    Ok(())
}

fn cmd_edit(session: &Session, args: EditArgs) -> CmdResult {
    let mut form = fields_to_form(args.fields);
    if args.unassign {
        form.insert("assignedTo".into(), Value::Array(Vec::new()));
    }
    if form.is_empty() {
        return Err("nothing to edit: pass at least one field flag".into());
    }
    let mut app = session.open_app()?;
    if !app.edit_task(&args.id, &form)? {
        return Err(format!("task not found: {}", args.id).into());
    }
    Ok(())
}

fn cmd_rm(session: &Session, args: RmArgs) -> CmdResult {
    let mut app = session.open_app()?;
    if !app.delete_task(&args.id)? {
        return Err(format!("task not found: {}", args.id).into());
    }
    println!("Deleted {}", args.id);
    Ok(())
}

fn cmd_mv(session: &Session, args: MvArgs) -> CmdResult {
    let lane = parse_lane(&args.lane)?;
    let mut app = session.open_app()?;
    // No index: past the last card, which clamps to the end of the lane
    let index = args.index.unwrap_or(usize::MAX);
    app.move_task(&args.id, lane, index)?;
    Ok(())
}

fn cmd_check(session: &Session, args: CheckArgs) -> CmdResult {
    let mut app = session.open_app()?;
    let mut toggled = Ok(());
    for index in &args.indices {
        if let Err(e) = app.toggle_subtask(&args.id, *index) {
            toggled = Err(e);
            break;
        }
    }
    // Whatever was toggled gets pushed, even if a later index was bad
    let flushed = app.close_modal(ModalClose::Button);
    toggled?;
    flushed?;
    Ok(())
}

fn cmd_sub(session: &Session, args: SubCmd) -> CmdResult {
    let mut app = session.open_app()?;
    match args.action {
        SubAction::Add { id, title } => {
            let index = app.add_subtask(&id, &title)?;
            println!("Added subtask {} to {}", index, id);
        }
        SubAction::Rm { id, index } => {
            app.remove_subtask(&id, index)?;
            println!("Removed subtask {} from {}", index, id);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn form_contains_only_given_flags() {
        let form = fields_to_form(TaskFieldArgs {
            title: Some("Ship".into()),
            due: Some("2026-12-01".into()),
            priority: Some("Urgent".into()),
            ..Default::default()
        });
        assert_eq!(
            Value::Object(form),
            json!({"titel": "Ship", "finishDate": "2026-12-01", "priority": "urgent"})
        );
    }

    #[test]
    fn form_lists_become_arrays() {
        let form = fields_to_form(TaskFieldArgs {
            assign: vec!["u1".into(), "u2".into()],
            sub: vec!["write".into()],
            ..Default::default()
        });
        assert_eq!(form["assignedTo"], json!(["u1", "u2"]));
        assert_eq!(form["subTasks"], json!(["write"]));
    }

    #[test]
    fn lane_names_and_codes() {
        assert_eq!(parse_lane("progress").unwrap(), Status::InProgress);
        assert_eq!(parse_lane("3").unwrap(), Status::Done);
        assert!(parse_lane("backlog").unwrap_err().contains("backlog"));
    }
}

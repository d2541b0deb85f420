//! Integration tests for the `tb` CLI.
//!
//! Each test seeds a temp cache directory, runs `tb` as a subprocess, and
//! verifies stdout and/or the cache files. Store-backed commands run against
//! a local one-thread HTTP stub or an address nothing listens on.

use std::fs;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::thread::{self, JoinHandle};

use pretty_assertions::assert_eq;
use serde_json::Value;

/// Get the path to the built `tb` binary.
fn tb_bin() -> PathBuf {
    // cargo test builds to target/debug/
    let mut path = std::env::current_exe().unwrap();
    path.pop(); // remove test binary name
    path.pop(); // remove deps/
    path.push("tb");
    path
}

const TASKS: &str = r#"{
  "t1": {
    "titel": "Write docs", "finishDate": "2026-11-01", "type": "user_story",
    "priority": "urgent", "status": 0, "order": 1, "assignedTo": ["u1"],
    "subTasks": [{"title": "outline", "done": true}, {"title": "draft", "done": false}]
  },
  "t2": {
    "titel": "Fix login", "finishDate": "2026-10-30", "type": "technical_task",
    "status": 0, "order": 0
  },
  "t3": {
    "titel": "Release", "finishDate": "2026-12-15", "type": "user_story",
    "priority": "low", "status": 3, "order": 0
  }
}"#;

const USERS: &str = r#"{"u1": {"givenName": "Ada Lovelace", "email": "ada@example.com"}}"#;

/// Seed the cache slots under `root/cache`.
fn create_test_cache(root: &Path) -> PathBuf {
    let cache = root.join("cache");
    fs::create_dir_all(&cache).unwrap();
    fs::write(cache.join("tasks.json"), TASKS).unwrap();
    fs::write(cache.join("users.json"), USERS).unwrap();
    cache
}

/// Run `tb` with the given args, returning (stdout, stderr, success).
fn run_tb(dir: &Path, args: &[&str]) -> (String, String, bool) {
    let cache = dir.join("cache");
    let output = Command::new(tb_bin())
        .arg("--cache-dir")
        .arg(&cache)
        .args(args)
        .current_dir(dir)
        .env_remove("TASKBOARD_STORE_URL")
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run tb");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (stdout, stderr, output.status.success())
}

/// Run `tb` expecting success, return stdout.
fn run_tb_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, success) = run_tb(dir, args);
    if !success {
        panic!(
            "tb {:?} failed:\nstdout: {}\nstderr: {}",
            args, stdout, stderr
        );
    }
    stdout
}

fn cached_tasks(dir: &Path) -> Value {
    let text = fs::read_to_string(dir.join("cache/tasks.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// Answer `count` requests, routing GETs by path; everything else gets `{}`.
/// Returns the base URL and the request lines seen.
fn serve(routes: Vec<(&'static str, &'static str)>, count: usize) -> (String, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..count {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                let lower = line.to_ascii_lowercase();
                if let Some(v) = lower.strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();

            let request_line = request_line.trim_end().to_string();
            let response_body = routes
                .iter()
                .find(|(path, _)| request_line.contains(&format!(" {} ", path)))
                .map(|(_, body)| *body)
                .unwrap_or("{}");
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                response_body.len(),
                response_body
            );
            stream.write_all(response.as_bytes()).unwrap();
            seen.push(request_line);
        }
        seen
    });
    (format!("http://{}", addr), handle)
}

/// A base URL nothing is listening on.
fn dead_base_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

// ---------------------------------------------------------------------------
// Offline commands
// ---------------------------------------------------------------------------

#[test]
fn test_board_from_cache() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let out = run_tb_ok(tmp.path(), &["board"]);
    assert_eq!(
        out,
        "\
== To Do (2) ==
  t2  Fix login  (Technical Task, medium, due 2026-10-30)
  t1  Write docs  (User Story, urgent, due 2026-11-01)  1/2 subtasks  @AL

== In Progress (0) ==
  No tasks in In Progress

== Await Feedback (0) ==
  No tasks in Await Feedback

== Done (1) ==
  t3  Release  (User Story, low, due 2026-12-15)
"
    );
}

#[test]
fn test_board_with_empty_cache() {
    let tmp = tempfile::TempDir::new().unwrap();
    let out = run_tb_ok(tmp.path(), &["board"]);
    assert_eq!(out.matches("No tasks in").count(), 4);
}

#[test]
fn test_board_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let out = run_tb_ok(tmp.path(), &["board", "--json"]);
    let lanes: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(lanes.as_array().unwrap().len(), 4);
    assert_eq!(lanes[0]["tasks"][0]["id"], "t2");
    assert_eq!(lanes[0]["tasks"][1]["id"], "t1");
    assert_eq!(lanes[3]["label"], "Done");
}

#[test]
fn test_show_task() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let out = run_tb_ok(tmp.path(), &["show", "t1"]);
    assert!(out.starts_with("t1  Write docs\n"));
    assert!(out.contains("status: To Do (#1 in lane)"));
    assert!(out.contains("assigned: Ada Lovelace"));
    assert!(out.contains("  0 [x] outline"));
    assert!(out.contains("  1 [ ] draft"));
}

#[test]
fn test_show_json() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let out = run_tb_ok(tmp.path(), &["show", "t3", "--json"]);
    let task: Value = serde_json::from_str(&out).unwrap();
    assert_eq!(task["title"], "Release");
    assert_eq!(task["status"], 3);
    assert_eq!(task["priority"], "low");
}

#[test]
fn test_show_unknown_task_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let (_, stderr, success) = run_tb(tmp.path(), &["show", "nope"]);
    assert!(!success);
    assert!(stderr.contains("task not found: nope"));
}

#[test]
fn test_users() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let out = run_tb_ok(tmp.path(), &["users"]);
    assert_eq!(out, "AL   u1  Ada Lovelace  <ada@example.com>\n");
}

#[test]
fn test_recovery_empty() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let out = run_tb_ok(tmp.path(), &["recovery"]);
    assert_eq!(out, "Recovery log is empty\n");

    let out = run_tb_ok(tmp.path(), &["recovery", "--json"]);
    assert_eq!(out.trim(), "[]");
}

#[test]
fn test_write_without_store_fails() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());

    let (_, stderr, success) = run_tb(tmp.path(), &["rm", "t1"]);
    assert!(!success);
    assert!(stderr.contains("no store configured"));
    assert!(cached_tasks(tmp.path()).get("t1").is_some());
}

// ---------------------------------------------------------------------------
// Store-backed commands
// ---------------------------------------------------------------------------

#[test]
fn test_reload_replaces_cache() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());
    let (url, server) = serve(
        vec![
            (
                "/tasks.json",
                r#"{"r1": {"titel": "Remote", "finishDate": "2026-12-01", "type": "user_story", "status": 2}}"#,
            ),
            ("/users.json", r#"{"u9": {"givenName": "Grace Hopper"}}"#),
        ],
        2,
    );

    let out = run_tb_ok(tmp.path(), &["--store-url", &url, "reload"]);
    assert!(out.contains("== Await Feedback (1) =="));
    assert!(out.contains("  r1  Remote"));

    let tasks = cached_tasks(tmp.path());
    assert_eq!(tasks.as_object().unwrap().len(), 1);
    assert_eq!(tasks["r1"]["status"], 2);

    let seen = server.join().unwrap();
    assert_eq!(seen, vec!["GET /tasks.json HTTP/1.1", "GET /users.json HTTP/1.1"]);
}

#[test]
fn test_mv_patches_dragged_task() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());
    let (url, server) = serve(Vec::new(), 1);

    run_tb_ok(tmp.path(), &["--store-url", &url, "mv", "t2", "done", "--index", "0"]);

    let tasks = cached_tasks(tmp.path());
    assert_eq!(tasks["t2"]["status"], 3);
    assert_eq!(tasks["t2"]["order"], 0);
    assert_eq!(tasks["t3"]["order"], 1);
    assert_eq!(tasks["t1"]["order"], 0);

    let seen = server.join().unwrap();
    assert_eq!(seen, vec!["PATCH /tasks/t2.json HTTP/1.1"]);
}

#[test]
fn test_failed_write_keeps_cache_and_logs_recovery() {
    let tmp = tempfile::TempDir::new().unwrap();
    create_test_cache(tmp.path());
    let url = dead_base_url();

    let (_, stderr, success) = run_tb(tmp.path(), &["--store-url", &url, "mv", "t2", "progress"]);
    assert!(!success);
    assert!(stderr.contains("error:"));

    let tasks = cached_tasks(tmp.path());
    assert_eq!(tasks["t2"]["status"], 1);

    let out = run_tb_ok(tmp.path(), &["recovery"]);
    assert!(out.contains("[write] tasks/t2"));

    let out = run_tb_ok(tmp.path(), &["recovery", "--clear"]);
    assert_eq!(out, "Removed 1 recovery entries\n");
}

//! Structured JSON-lines logging for training sessions.
//!
//! Every record carries a run id, a sequence number and a domain so a run can
//! be filtered and replayed later. When `LOG_DIR` is set, records land in
//! `LOG_DIR/<run_id>/events.jsonl` (trace/debug in `trace.jsonl`); otherwise
//! they are written to stderr, keeping stdout free for the interactive UI.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fs::{create_dir_all, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::process;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock};

// =============================================================================
// Log Levels
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace = 0,
    Debug = 1,
    Info = 2,
    Warn = 3,
    Error = 4,
}

impl Level {
    pub fn from_env() -> Self {
        match std::env::var("LOG_LEVEL").as_deref() {
            Ok("trace") => Level::Trace,
            Ok("debug") => Level::Debug,
            Ok("info") => Level::Info,
            Ok("warn") => Level::Warn,
            Ok("error") => Level::Error,
            _ => Level::Info,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
        }
    }
}

// =============================================================================
// Log Domains
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Catalog,   // Dataset load and validation
    Selection, // Current dilemma changes
    Session,   // Session lifecycle, first interaction
    Scoring,   // Submissions, aggregates, badges
    Export,    // Downloads of session data
    System,    // Startup, config, shutdown
}

impl Domain {
    pub fn as_str(&self) -> &'static str {
        match self {
            Domain::Catalog => "catalog",
            Domain::Selection => "selection",
            Domain::Session => "session",
            Domain::Scoring => "scoring",
            Domain::Export => "export",
            Domain::System => "system",
        }
    }

    pub fn is_enabled(&self) -> bool {
        // LOG_DOMAINS: comma-separated list or "all"
        match std::env::var("LOG_DOMAINS").as_deref() {
            Ok("all") | Err(_) => true,
            Ok(domains) => domains.split(',').any(|d| d.trim() == self.as_str()),
        }
    }
}

// =============================================================================
// Run context
// =============================================================================

static LOG_SEQ: AtomicU64 = AtomicU64::new(0);
static RUN_CONTEXT: OnceLock<RunContext> = OnceLock::new();

fn next_seq() -> u64 {
    LOG_SEQ.fetch_add(1, Ordering::SeqCst)
}

#[derive(Debug)]
enum Sink {
    Stderr,
    Files {
        events: Mutex<BufWriter<File>>,
        trace: Mutex<BufWriter<File>>,
    },
}

#[derive(Debug)]
struct RunContext {
    run_id: String,
    sink: Sink,
}

fn ensure_run_context() -> &'static RunContext {
    RUN_CONTEXT.get_or_init(|| {
        let run_id = std::env::var("RUN_ID")
            .unwrap_or_else(|_| format!("r-{}-{}", ts_epoch_ms(), process::id()));
        let sink = match std::env::var("LOG_DIR") {
            Ok(base) => open_file_sink(PathBuf::from(base).join(&run_id), &run_id),
            Err(_) => Sink::Stderr,
        };
        RunContext { run_id, sink }
    })
}

fn open_file_sink(run_dir: PathBuf, run_id: &str) -> Sink {
    if let Err(err) = create_dir_all(&run_dir) {
        eprintln!("[log] failed to create run dir: {}", err);
        return Sink::Stderr;
    }
    let _ = std::fs::write(
        run_dir.join("manifest.json"),
        json!({
            "run_id": run_id,
            "ts": ts_now(),
            "pid": process::id(),
            "log_dir": run_dir.to_string_lossy(),
        })
        .to_string(),
    );
    match (
        File::create(run_dir.join("events.jsonl")),
        File::create(run_dir.join("trace.jsonl")),
    ) {
        (Ok(events), Ok(trace)) => Sink::Files {
            events: Mutex::new(BufWriter::new(events)),
            trace: Mutex::new(BufWriter::new(trace)),
        },
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("[log] failed to create log files: {}", err);
            Sink::Stderr
        }
    }
}

fn split_fields(mut fields: Map<String, Value>) -> (Map<String, Value>, Map<String, Value>) {
    let mut top = Map::new();
    for key in ["session_id", "dilemma_id", "msg"] {
        if let Some(value) = fields.remove(key) {
            top.insert(key.to_string(), value);
        }
    }
    (top, fields)
}

fn write_line(writer: &Mutex<BufWriter<File>>, line: &str) {
    if let Ok(mut w) = writer.lock() {
        let _ = writeln!(w, "{}", line);
        let _ = w.flush();
    }
}

// =============================================================================
// Core logging functions
// =============================================================================

/// RFC3339 timestamp with milliseconds
pub fn ts_now() -> String {
    Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

/// Epoch milliseconds
pub fn ts_epoch_ms() -> u64 {
    Utc::now().timestamp_millis() as u64
}

/// Emit a structured log entry
pub fn log(level: Level, domain: Domain, event: &str, fields: Map<String, Value>) {
    if level < Level::from_env() || !domain.is_enabled() {
        return;
    }
    emit_record(level, domain.as_str(), event, fields);
}

fn build_record(run_id: &str, level: Level, component: &str, event: &str, fields: Map<String, Value>) -> Value {
    let (mut top, data) = split_fields(fields);
    let msg = top.remove("msg").unwrap_or(Value::String(String::new()));
    let mut entry = Map::new();
    entry.insert("ts".to_string(), json!(ts_now()));
    entry.insert("run_id".to_string(), json!(run_id));
    entry.insert("seq".to_string(), json!(next_seq()));
    entry.insert("lvl".to_string(), json!(level.as_str().to_uppercase()));
    entry.insert("component".to_string(), json!(component));
    entry.insert("event".to_string(), json!(event));
    entry.insert("msg".to_string(), msg);
    for (k, v) in top {
        entry.insert(k, v);
    }
    entry.insert("data".to_string(), Value::Object(data));
    Value::Object(entry)
}

fn emit_record(level: Level, component: &str, event: &str, fields: Map<String, Value>) {
    let ctx = ensure_run_context();
    let line = build_record(&ctx.run_id, level, component, event, fields).to_string();
    match &ctx.sink {
        Sink::Stderr => eprintln!("{}", line),
        Sink::Files { events, trace } => match level {
            Level::Trace | Level::Debug => write_line(trace, &line),
            _ => write_line(events, &line),
        },
    }
}

// =============================================================================
// Domain-Specific Logging Helpers
// =============================================================================

pub fn log_catalog_loaded(source: &str, dilemmas: usize, fingerprint: &str) {
    log(
        Level::Info,
        Domain::Catalog,
        "catalog_loaded",
        obj(&[
            ("source", v_str(source)),
            ("dilemmas", json!(dilemmas)),
            ("fingerprint", v_str(fingerprint)),
        ]),
    );
}

pub fn log_session_started(session_id: &str, start_time: &str) {
    log(
        Level::Info,
        Domain::Session,
        "session_started",
        obj(&[("session_id", v_str(session_id)), ("start_time", v_str(start_time))]),
    );
}

pub fn log_first_interaction(session_id: &str, latency_secs: f64) {
    log(
        Level::Debug,
        Domain::Session,
        "first_interaction",
        obj(&[("session_id", v_str(session_id)), ("latency_secs", v_num(latency_secs))]),
    );
}

pub fn log_selection(session_id: &str, dilemma_id: &str, how: &str) {
    log(
        Level::Debug,
        Domain::Selection,
        "selected",
        obj(&[
            ("session_id", v_str(session_id)),
            ("dilemma_id", v_str(dilemma_id)),
            ("how", v_str(how)),
        ]),
    );
}

pub fn log_submission(session_id: &str, dilemma_id: &str, choice_key: &str, score: u8, responses: usize) {
    log(
        Level::Info,
        Domain::Scoring,
        "submission",
        obj(&[
            ("session_id", v_str(session_id)),
            ("dilemma_id", v_str(dilemma_id)),
            ("choice_key", v_str(choice_key)),
            ("score", json!(score)),
            ("responses", json!(responses)),
        ]),
    );
}

pub fn log_rejected_submission(session_id: &str, dilemma_id: &str, reason: &str) {
    log(
        Level::Warn,
        Domain::Scoring,
        "submission_rejected",
        obj(&[
            ("session_id", v_str(session_id)),
            ("dilemma_id", v_str(dilemma_id)),
            ("reason", v_str(reason)),
        ]),
    );
}

pub fn log_progress(session_id: &str, progress: Value) {
    log(
        Level::Debug,
        Domain::Scoring,
        "progress",
        obj(&[("session_id", v_str(session_id)), ("progress", progress)]),
    );
}

pub fn log_export(session_id: &str, rows: usize, destination: &str) {
    log(
        Level::Info,
        Domain::Export,
        "export",
        obj(&[
            ("session_id", v_str(session_id)),
            ("rows", json!(rows)),
            ("destination", v_str(destination)),
        ]),
    );
}

// =============================================================================
// Utility Functions
// =============================================================================

pub fn obj(pairs: &[(&str, Value)]) -> Map<String, Value> {
    let mut map = Map::new();
    for (k, v) in pairs {
        map.insert((*k).to_string(), v.clone());
    }
    map
}

pub fn v_str(s: &str) -> Value {
    Value::String(s.to_string())
}

pub fn v_num(n: f64) -> Value {
    json!(n)
}

// =============================================================================
// Tests
// =============================================================================

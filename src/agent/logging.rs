//! JSONL run logger for replaying a planning run.
//!
//! Each crew kickoff produces one `run-{ISO8601}.jsonl` file in the configured
//! log directory (by default `{output_dir}/.voyage-logs/`), one JSON object
//! per line.
//!
//! Uses synchronous `std::fs` since writes are small, buffered, and flushed
//! after each event.

use std::fs::{self, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;

use crate::error::CrewError;

/// Returns the current UTC time as an ISO 8601 string with milliseconds.
pub fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// A structured log entry serialized as a single JSON line.
///
/// Tagged with `event_type` so each line is self-describing for replay.
#[derive(Debug, Serialize)]
#[serde(tag = "event_type")]
pub enum LogEntry {
    #[serde(rename = "run_start")]
    RunStart {
        timestamp: String,
        model: String,
        tasks: Vec<String>,
    },

    #[serde(rename = "task_start")]
    TaskStart {
        timestamp: String,
        task: String,
        agent: String,
    },

    /// An assistant text response (the task's final answer).
    #[serde(rename = "assistant_text")]
    AssistantText {
        timestamp: String,
        task: String,
        iteration: usize,
        content: String,
    },

    #[serde(rename = "tool_call")]
    ToolCall {
        timestamp: String,
        task: String,
        iteration: usize,
        call_id: String,
        fn_name: String,
        fn_arguments: serde_json::Value,
    },

    #[serde(rename = "tool_result")]
    ToolResult {
        timestamp: String,
        task: String,
        iteration: usize,
        call_id: String,
        fn_name: String,
        result: String,
    },

    #[serde(rename = "token_usage")]
    TokenUsage {
        timestamp: String,
        task: String,
        iteration: usize,
        prompt_tokens: i32,
        completion_tokens: i32,
    },

    /// A harness-injected message (e.g. the iteration cap notice).
    #[serde(rename = "system_message")]
    SystemMessage {
        timestamp: String,
        task: String,
        content: String,
    },

    #[serde(rename = "task_end")]
    TaskEnd {
        timestamp: String,
        task: String,
        iterations: usize,
        tool_calls: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        output_file: Option<String>,
    },

    #[serde(rename = "error")]
    Error {
        timestamp: String,
        task: String,
        message: String,
    },

    #[serde(rename = "run_end")]
    RunEnd {
        timestamp: String,
        tasks_completed: usize,
        elapsed_secs: f64,
        reason: String,
    },
}

/// Append-only JSONL logger for one crew run.
pub struct RunLogger {
    writer: BufWriter<fs::File>,
    log_path: PathBuf,
}

impl RunLogger {
    /// Create a new run log file inside `log_dir`, creating the directory.
    ///
    /// The file is named `run-{ISO8601}.jsonl` with colons replaced by dashes
    /// for filesystem safety.
    pub fn new_in_dir(log_dir: &Path) -> Result<Self, CrewError> {
        fs::create_dir_all(log_dir).map_err(|e| {
            CrewError::LoggingError(format!("failed to create {}: {e}", log_dir.display()))
        })?;

        let run_id = Utc::now().format("%Y-%m-%dT%H-%M-%S%.3f").to_string();
        let log_path = log_dir.join(format!("run-{run_id}.jsonl"));

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)
            .map_err(|e| {
                CrewError::LoggingError(format!("failed to open {}: {e}", log_path.display()))
            })?;

        Ok(Self {
            writer: BufWriter::new(file),
            log_path,
        })
    }

    /// Serialize a log entry as a single JSON line and flush.
    pub fn log_event(&mut self, event: &LogEntry) -> Result<(), CrewError> {
        let write = |w: &mut BufWriter<fs::File>| -> std::io::Result<()> {
            serde_json::to_writer(&mut *w, event)?;
            w.write_all(b"\n")?;
            w.flush()
        };
        write(&mut self.writer).map_err(|e| CrewError::LoggingError(e.to_string()))
    }

    /// Return the path to the current run log file.
    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use tempfile::TempDir;

    fn read_lines(path: &Path) -> Vec<String> {
        let file = fs::File::open(path).expect("open log");
        std::io::BufReader::new(file)
            .lines()
            .collect::<Result<_, _>>()
            .expect("read lines")
    }

    #[test]
    fn creates_log_file_in_dir() {
        let tmp = TempDir::new().unwrap();
        let log_dir = tmp.path().join(".voyage-logs");
        let logger = RunLogger::new_in_dir(&log_dir).unwrap();

        let log_path = logger.log_path();
        assert!(log_path.exists());
        assert!(log_path.starts_with(&log_dir));

        let name = log_path.file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("run-"));
        assert!(name.ends_with(".jsonl"));
        assert!(!name.contains(':'));
    }

    #[test]
    fn events_are_one_json_object_per_line() {
        let tmp = TempDir::new().unwrap();
        let mut logger = RunLogger::new_in_dir(tmp.path()).unwrap();

        logger
            .log_event(&LogEntry::RunStart {
                timestamp: now_iso(),
                model: "gpt-4o".to_string(),
                tasks: vec!["location".to_string(), "guide".to_string()],
            })
            .unwrap();
        logger
            .log_event(&LogEntry::ToolCall {
                timestamp: now_iso(),
                task: "location".to_string(),
                iteration: 1,
                call_id: "call_001".to_string(),
                fn_name: "search_web_tool".to_string(),
                fn_arguments: serde_json::json!({"query": "Rome visa"}),
            })
            .unwrap();
        logger
            .log_event(&LogEntry::TaskEnd {
                timestamp: now_iso(),
                task: "location".to_string(),
                iterations: 2,
                tool_calls: 1,
                output_file: None,
            })
            .unwrap();

        let lines = read_lines(logger.log_path());
        assert_eq!(lines.len(), 3);

        let start: serde_json::Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(start["event_type"], "run_start");
        assert_eq!(start["tasks"][1], "guide");

        let call: serde_json::Value = serde_json::from_str(&lines[1]).unwrap();
        assert_eq!(call["fn_arguments"]["query"], "Rome visa");

        let end: serde_json::Value = serde_json::from_str(&lines[2]).unwrap();
        assert_eq!(end["event_type"], "task_end");
        assert!(end.get("output_file").is_none(), "output_file should be absent when None");
    }

    #[test]
    fn unwritable_dir_is_logging_error() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("file");
        fs::write(&blocker, "x").unwrap();

        let err = RunLogger::new_in_dir(&blocker.join("logs")).err().unwrap();
        assert!(matches!(err, CrewError::LoggingError(_)));
    }
}

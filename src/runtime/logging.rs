use super::StatePaths;
use crate::shared::logging::append_json_line;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogEntryLevel {
    Info,
    Warn,
    Error,
}

impl LogEntryLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Appends one JSON line to `logs/runs.log`. Logging is best effort: a state
/// root that cannot be written must never interrupt a run.
pub fn append_runtime_log(paths: &StatePaths, level: LogEntryLevel, event: &str, payload: Value) {
    let mut entry = Map::new();
    entry.insert(
        "timestamp".to_string(),
        Value::String(chrono::Utc::now().to_rfc3339()),
    );
    entry.insert("level".to_string(), Value::String(level.as_str().to_string()));
    entry.insert("event".to_string(), Value::String(event.to_string()));
    match payload {
        Value::Object(fields) => {
            for (key, value) in fields {
                entry.entry(key).or_insert(value);
            }
        }
        Value::Null => {}
        other => {
            entry.insert("message".to_string(), other);
        }
    }

    let _ = append_json_line(&paths.runs_log_path(), &Value::Object(entry));
}

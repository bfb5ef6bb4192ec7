use std::{
    fs::{self, OpenOptions},
    io::Write,
    path::{Path, PathBuf},
};

use chrono::Utc;
use serde::Serialize;

use crate::Result;

/// One line of the event log.
#[derive(Clone, Debug, Serialize)]
pub struct EventRecord {
    pub ts: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventRecord {
    pub fn new(event: &str, payload: serde_json::Value) -> Self {
        Self {
            ts: Utc::now().to_rfc3339(),
            event: event.to_string(),
            payload,
        }
    }
}

/// Append-only JSON-lines event writer, one event per line.
#[derive(Clone, Debug)]
pub struct EventLog {
    path: PathBuf,
}

impl EventLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write(&self, event: &str, payload: serde_json::Value) -> Result<EventRecord> {
        let record = EventRecord::new(event, payload);

        if let Some(dir) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }

        let line = serde_json::to_string(&record)?;
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{line}")?;

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_one_json_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let log = EventLog::new(dir.path().join("sub/events.jsonl"));

        log.write("login", serde_json::json!({"user": "ann"})).unwrap();
        log.write("logout", serde_json::json!({"user": "ann", "note": "再見"}))
            .unwrap();

        let written = std::fs::read_to_string(log.path()).unwrap();
        let lines: Vec<serde_json::Value> = written
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["event"], "login");
        assert_eq!(lines[1]["payload"]["note"], "再見");
        assert!(chrono::DateTime::parse_from_rfc3339(lines[0]["ts"].as_str().unwrap()).is_ok());
    }
}

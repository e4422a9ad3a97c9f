//! Log domain types.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Source of every event produced by the platform itself (builder and deployer).
pub const HEROGATE_SOURCE: &str = "herogate";

/// Platform process that produced a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Process {
    /// Image build events
    Builder,
    /// Service lifecycle events
    Deployer,
}

impl Process {
    pub fn as_str(&self) -> &'static str {
        match self {
            Process::Builder => "builder",
            Process::Deployer => "deployer",
        }
    }

    /// Parse a process name; unknown names yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "builder" => Some(Process::Builder),
            "deployer" => Some(Process::Deployer),
            _ => None,
        }
    }
}

impl fmt::Display for Process {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single log line. Immutable once produced by a fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Unique within its source
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub source: String,
    pub process: Process,
    pub message: String,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}[{}]: {}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
            self.source,
            self.process,
            self.message
        )
    }
}

/// Filter applied to a log fetch. Values come straight from the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LogFilter {
    pub process: Option<String>,
    pub source: Option<String>,
}

impl LogFilter {
    /// Whether entries of `process` should be fetched at all.
    pub fn wants(&self, process: Process) -> bool {
        if let Some(source) = self.source.as_deref() {
            if source != HEROGATE_SOURCE {
                return false;
            }
        }

        match self.process.as_deref() {
            None => true,
            Some(name) => Process::parse(name) == Some(process),
        }
    }
}

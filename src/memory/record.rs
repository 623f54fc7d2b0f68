use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

/// One remembered item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub timestamp: DateTime<Utc>,
    pub what: String,
    pub who: String,
    pub user_id: String,
    /// Original name of an attached file. Only the name is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
}

impl MemoryRecord {
    /// New record stamped with the current UTC time.
    pub fn new(
        what: impl Into<String>,
        who: impl Into<String>,
        user_id: impl Into<String>,
        filename: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            what: what.into(),
            who: who.into(),
            user_id: user_id.into(),
            filename,
        }
    }

    fn context_line(&self) -> String {
        let ts = self.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true);
        match &self.filename {
            Some(name) => format!("- [{ts}] {}: {} (file: {name})", self.who, self.what),
            None => format!("- [{ts}] {}: {}", self.who, self.what),
        }
    }
}

/// Result of reading the whole log.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryHistory {
    pub records: Vec<MemoryRecord>,
    /// Lines that could not be parsed and were left out.
    pub skipped: usize,
}

impl MemoryHistory {
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the records as prompt context, one line each.
    /// `None` when there is nothing to remember.
    pub fn to_context(&self) -> Option<String> {
        if self.records.is_empty() {
            return None;
        }
        let lines: Vec<String> = self.records.iter().map(MemoryRecord::context_line).collect();
        Some(lines.join("\n"))
    }
}

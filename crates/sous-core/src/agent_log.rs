//! Append-only diagnostic log of backend exchanges and user actions.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;

/// Actor name used for synthetic entries recording user transitions.
pub const USER_ACTION_ACTOR: &str = "User Action";
/// Actor name used for entries produced by the session itself.
pub const SYSTEM_ACTOR: &str = "System";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[strum(serialize_all = "UPPERCASE")]
pub enum LogLevel {
    #[default]
    Info,
    Success,
    Error,
}

/// One diagnostic record.
///
/// Entries reported by the backend usually carry only `actor`, `input` and
/// `output`; the timestamp then defaults to the moment they were received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentLogEntry {
    #[serde(alias = "agent")]
    pub actor: String,
    #[serde(default)]
    pub input: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub level: LogLevel,
}

impl AgentLogEntry {
    pub fn new(actor: impl Into<String>, level: LogLevel) -> Self {
        Self {
            actor: actor.into(),
            input: None,
            output: None,
            timestamp: Utc::now(),
            level,
        }
    }

    pub fn with_input(mut self, input: impl Into<String>) -> Self {
        self.input = Some(input.into());
        self
    }

    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }
}

impl fmt::Display for AgentLogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} {}",
            self.timestamp.format("%H:%M:%S"),
            self.level,
            self.actor
        )?;
        if let Some(input) = &self.input {
            write!(f, " <- {input}")?;
        }
        if let Some(output) = &self.output {
            write!(f, " -> {output}")?;
        }
        Ok(())
    }
}

/// Time-ordered record of every exchange, in arrival order.
///
/// Entries are never removed or edited.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AgentCallLog {
    entries: Vec<AgentLogEntry>,
}

impl AgentCallLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, entry: AgentLogEntry) {
        self.entries.push(entry);
    }

    /// Appends entries reported by the backend, preserving their order.
    pub fn extend<I>(&mut self, entries: I)
    where
        I: IntoIterator<Item = AgentLogEntry>,
    {
        self.entries.extend(entries);
    }

    pub fn user_action(&mut self, description: impl Into<String>) {
        self.append(AgentLogEntry::new(USER_ACTION_ACTOR, LogLevel::Info).with_input(description));
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.append(AgentLogEntry::new(SYSTEM_ACTOR, LogLevel::Info).with_output(message));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.append(AgentLogEntry::new(SYSTEM_ACTOR, LogLevel::Success).with_output(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.append(AgentLogEntry::new(SYSTEM_ACTOR, LogLevel::Error).with_output(message));
    }

    pub fn entries(&self) -> &[AgentLogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries at or after `index`, for incremental display.
    pub fn since(&self, index: usize) -> &[AgentLogEntry] {
        self.entries.get(index..).unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entries_keep_arrival_order() {
        let mut log = AgentCallLog::new();
        log.user_action("Submitted meal request");
        log.extend(vec![
            AgentLogEntry::new("Strategist", LogLevel::Info).with_output("briefing"),
            AgentLogEntry::new("Chef", LogLevel::Info).with_output("options"),
        ]);
        log.error("Server error: 500");

        let actors: Vec<&str> = log.entries().iter().map(|e| e.actor.as_str()).collect();
        assert_eq!(actors, vec![USER_ACTION_ACTOR, "Strategist", "Chef", SYSTEM_ACTOR]);
        assert_eq!(log.since(3).len(), 1);
        assert!(log.since(10).is_empty());
    }

    #[test]
    fn test_backend_entry_defaults() {
        let entry: AgentLogEntry =
            serde_json::from_str(r#"{"agent": "Judge", "output": "unchanged"}"#).unwrap();
        assert_eq!(entry.actor, "Judge");
        assert_eq!(entry.input, None);
        assert_eq!(entry.level, LogLevel::Info);
    }

    #[test]
    fn test_display_format() {
        let entry = AgentLogEntry::new("Chef", LogLevel::Success).with_output("done");
        let text = entry.to_string();
        assert!(text.ends_with("SUCCESS Chef -> done"));
    }
}

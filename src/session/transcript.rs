//! Append-only conversation transcript.

use std::fmt;
use std::fs;
use std::path::Path;

use chrono::{SecondsFormat, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// `"user"` is the user; any other label is treated as the assistant side.
impl From<&str> for Role {
    fn from(label: &str) -> Self {
        if label == "user" { Role::User } else { Role::Assistant }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// UTC RFC 3339, set when the turn is created.
    pub timestamp: String,
}

impl Turn {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }
}

/// Ordered list of turns. Turns are only ever appended; there is no API to
/// edit or remove one short of [`Transcript::reset`].
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    greeting: Vec<String>,
    turns: Vec<Turn>,
}

impl Transcript {
    /// Empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Transcript seeded with assistant greeting turns, restored on reset.
    pub fn with_greeting<I, S>(greeting: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let greeting: Vec<String> = greeting.into_iter().map(Into::into).collect();
        let mut t = Self { greeting, turns: Vec::new() };
        t.reset();
        t
    }

    pub fn push(&mut self, role: Role, text: impl Into<String>) {
        self.turns.push(Turn::new(role, text));
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Back to the greeting only.
    pub fn reset(&mut self) {
        self.turns = self
            .greeting
            .iter()
            .map(|g| Turn::new(Role::Assistant, g.clone()))
            .collect();
    }

    /// Replace the greeting and reset to it.
    pub fn restart_with<I, S>(&mut self, greeting: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.greeting = greeting.into_iter().map(Into::into).collect();
        self.reset();
    }

    /// Markdown with `### {role} — {timestamp}` delimiters.
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();
        for t in &self.turns {
            out.push_str(&format!("### {} — {}\n\n{}\n\n", t.role, t.timestamp, t.text));
        }
        out
    }

    pub fn save_markdown(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_markdown())
    }
}

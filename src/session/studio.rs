//! Writing-studio settings: what to do with the text, in which tone, for whom.

use std::fmt;
use std::str::FromStr;

pub const DEFAULT_AUDIENCE: &str = "General Audience";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Formal,
    Casual,
    Urgent,
    Persuasive,
    Humorous,
    Academic,
    Concise,
    Friendly,
}

impl Tone {
    pub const ALL: [Tone; 8] = [
        Tone::Formal,
        Tone::Casual,
        Tone::Urgent,
        Tone::Persuasive,
        Tone::Humorous,
        Tone::Academic,
        Tone::Concise,
        Tone::Friendly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Formal => "Formal",
            Tone::Casual => "Casual",
            Tone::Urgent => "Urgent",
            Tone::Persuasive => "Persuasive",
            Tone::Humorous => "Humorous",
            Tone::Academic => "Academic",
            Tone::Concise => "Concise",
            Tone::Friendly => "Friendly",
        }
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Tone::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                let names: Vec<&str> = Tone::ALL.iter().map(|t| t.as_str()).collect();
                format!("unknown tone '{s}' (choose one of: {})", names.join(", "))
            })
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Action {
    #[default]
    GenerateContent,
    RefineTone,
    SummarizeText,
}

impl Action {
    pub const ALL: [Action; 3] = [Action::GenerateContent, Action::RefineTone, Action::SummarizeText];

    pub fn as_str(&self) -> &'static str {
        match self {
            Action::GenerateContent => "Generate Content",
            Action::RefineTone => "Refine Tone",
            Action::SummarizeText => "Summarize Text",
        }
    }
}

/// Accepts the full label (`"Refine Tone"`) or its first word (`refine`).
impl FromStr for Action {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Action::ALL
            .into_iter()
            .find(|a| {
                let label = a.as_str();
                label.eq_ignore_ascii_case(s)
                    || label.split(' ').next().is_some_and(|w| w.eq_ignore_ascii_case(s))
            })
            .ok_or_else(|| format!("unknown action '{s}' (choose generate, refine or summarize)"))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudioSettings {
    pub tone: Tone,
    pub action: Action,
    pub audience: String,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            tone: Tone::default(),
            action: Action::default(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

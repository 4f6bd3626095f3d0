//! Per-run session state.
//!
//! [`SessionContext`] owns everything a user builds up while the process
//! runs: one [`Transcript`] per section, the uploaded document and dataset,
//! and the studio settings. It is passed explicitly (`&mut`) to every
//! section handler and is dropped when the process exits.

mod studio;
mod transcript;

use std::fmt;
use std::str::FromStr;

pub use studio::{Action, DEFAULT_AUDIENCE, StudioSettings, Tone};
pub use transcript::{Role, Transcript, Turn};

#[cfg(feature = "section-data")]
use crate::dataset::Table;

pub const CHAT_GREETING: &str = "Hello! I can answer your questions 🌤️";
pub const DOCS_GREETING: &str = "I can answer questions based on uploaded documents 📄";
pub const STUDIO_GREETING: &str =
    "Hello! Provide your draft or a prompt, and let's define the style you need.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Chat,
    Docs,
    Data,
    Studio,
}

impl Section {
    pub const ALL: [Section; 4] = [Section::Chat, Section::Docs, Section::Data, Section::Studio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Section::Chat => "chat",
            Section::Docs => "docs",
            Section::Data => "data",
            Section::Studio => "studio",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Section::Chat => "💬 Q/A Chat",
            Section::Docs => "📄 Document Q/A",
            Section::Data => "📊 Data Analysis",
            Section::Studio => "✍️ Writing Studio",
        }
    }
}

impl FromStr for Section {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Section::ALL
            .into_iter()
            .find(|x| x.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown section '{s}'"))
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Text extracted from the last uploaded document.
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub name: String,
    pub text: String,
}

/// The last uploaded dataset.
#[cfg(feature = "section-data")]
#[derive(Debug, Clone)]
pub struct LoadedDataset {
    pub name: String,
    pub table: Table,
}

#[derive(Debug)]
pub struct SessionContext {
    pub id: uuid::Uuid,
    pub active: Section,
    pub chat: Transcript,
    pub docs: Transcript,
    pub data: Transcript,
    pub studio: Transcript,
    pub document: Option<LoadedDocument>,
    #[cfg(feature = "section-data")]
    pub dataset: Option<LoadedDataset>,
    pub studio_settings: StudioSettings,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    /// Fresh session: every section at its greeting, nothing uploaded.
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4(),
            active: Section::Chat,
            chat: Transcript::with_greeting([CHAT_GREETING]),
            docs: Transcript::with_greeting([DOCS_GREETING]),
            data: Transcript::new(),
            studio: Transcript::with_greeting([STUDIO_GREETING]),
            document: None,
            #[cfg(feature = "section-data")]
            dataset: None,
            studio_settings: StudioSettings::default(),
        }
    }

    pub fn transcript(&self, section: Section) -> &Transcript {
        match section {
            Section::Chat => &self.chat,
            Section::Docs => &self.docs,
            Section::Data => &self.data,
            Section::Studio => &self.studio,
        }
    }

    pub fn transcript_mut(&mut self, section: Section) -> &mut Transcript {
        match section {
            Section::Chat => &mut self.chat,
            Section::Docs => &mut self.docs,
            Section::Data => &mut self.data,
            Section::Studio => &mut self.studio,
        }
    }

    /// Reset every section. The active section is kept.
    pub fn reset(&mut self) {
        for section in Section::ALL {
            self.reset_section(section);
        }
    }

    /// Reset one section's transcript and whatever was uploaded into it.
    pub fn reset_section(&mut self, section: Section) {
        match section {
            Section::Docs => self.document = None,
            Section::Data => {
                #[cfg(feature = "section-data")]
                {
                    self.dataset = None;
                }
                // The data greeting only exists while a dataset is loaded.
                self.data.restart_with(Vec::<String>::new());
                return;
            }
            Section::Studio => self.studio_settings = StudioSettings::default(),
            Section::Chat => {}
        }
        self.transcript_mut(section).reset();
    }
}

//! Prompt templates.
//!
//! Each section's prompt is a plain-text template with `{{key}}` placeholders.
//! Templates are read once, when [`Prompts`] is built, from the configured
//! prompts directory (`config/prompts/` by default); a missing file falls back
//! to the built-in text below, so the directory is optional. Edits to the
//! files take effect on the next start.
//!
//! Substitution is a single left-to-right pass: text coming *in* through a
//! variable (an uploaded document, a dataset) is never re-scanned for
//! placeholders.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::llm::providers::gemini::DEFAULT_SYSTEM_INSTRUCTION;

const SEPARATOR: &str = "\n\n";

pub const DOCS_QA: &str = "{{document}}\n\nQuestion: {{question}}";

pub const DATA_SUMMARY: &str = "Given the following calculation result:\n{{result}}\n\n\
Please summarize this information for the user in a helpful, conversational manner. \
Do not mention that you've performed a calculation or use the term 'pandas'.";

pub const DATA_ANALYST: &str = "You are an AI data analyst. Your task is to answer questions about a provided dataset. \
When answering, you must use the context provided below. \
If the question requires a calculation or specific value, \
you MUST perform the calculation and provide the result based on the provided data context. \
If the user asks for information not present in the provided context, \
you must explicitly state that the information cannot be found in the dataset and refrain from generating a fabricated answer. \
Do not make up any information.\n\n\
Dataset Context:\n{{dataset}}\n\
User Question: {{question}}";

pub const STUDIO_EDITOR: &str = "You are a professional editor. Your task is to {{action}} the provided text \
to be {{tone}} for a {{audience}} audience.";

/// Read `dir/filename`, or `fallback` when the file is missing or empty.
pub fn load_template(dir: &Path, filename: &str, fallback: &str) -> String {
    let path = dir.join(filename);
    match fs::read_to_string(&path) {
        Ok(text) if !text.trim().is_empty() => text,
        Ok(_) | Err(_) => {
            tracing::debug!("prompt: '{}' not found, using built-in template", path.display());
            fallback.to_string()
        }
    }
}

/// Fluent builder that assembles a prompt from template fragments.
#[derive(Default)]
pub struct PromptBuilder {
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Directly append a text fragment.
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim();
        if !trimmed.is_empty() {
            self.parts.push(trimmed.to_string());
        }
        self
    }

    /// Register `{{key}}` → `value` substitution pairs applied at build time.
    pub fn with_vars<'a, I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        for (k, v) in vars {
            self.vars.insert(k.to_string(), v.to_string());
        }
        self
    }

    /// Register a single variable.
    pub fn var(mut self, key: &str, value: impl Into<String>) -> Self {
        self.vars.insert(key.to_string(), value.into());
        self
    }

    /// Join all parts with blank lines and substitute variables.
    /// Unknown placeholders are left as written.
    pub fn build(self) -> String {
        render(&self.parts.join(SEPARATOR), &self.vars)
    }
}

fn render(template: &str, vars: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match vars.get(key) {
                    Some(value) => out.push_str(value),
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Section prompt templates, loaded from one directory at startup.
#[derive(Debug, Clone)]
pub struct Prompts {
    system: String,
    docs_qa: String,
    data_summary: String,
    data_analyst: String,
    studio_editor: String,
}

impl Prompts {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            system: load_template(dir, "system.txt", DEFAULT_SYSTEM_INSTRUCTION),
            docs_qa: load_template(dir, "docs_qa.txt", DOCS_QA),
            data_summary: load_template(dir, "data_summary.txt", DATA_SUMMARY),
            data_analyst: load_template(dir, "data_analyst.txt", DATA_ANALYST),
            studio_editor: load_template(dir, "studio_editor.txt", STUDIO_EDITOR),
        }
    }

    /// System instruction for chat, docs and data requests.
    pub fn system(&self) -> String {
        PromptBuilder::new().append(self.system.as_str()).build()
    }

    /// Document text followed by the question.
    ///
    /// The document is not trimmed: it goes to the model exactly as extracted.
    pub fn docs_qa(&self, document: &str, question: &str) -> String {
        PromptBuilder::new()
            .append(self.docs_qa.as_str())
            .var("document", document)
            .var("question", question)
            .build()
    }

    pub fn data_summary(&self, result: &str) -> String {
        PromptBuilder::new().append(self.data_summary.as_str()).var("result", result).build()
    }

    pub fn data_analyst(&self, dataset_markdown: &str, question: &str) -> String {
        PromptBuilder::new()
            .append(self.data_analyst.as_str())
            .with_vars([("dataset", dataset_markdown), ("question", question)])
            .build()
    }

    pub fn studio_editor(&self, action: &str, tone: &str, audience: &str) -> String {
        PromptBuilder::new()
            .append(self.studio_editor.as_str())
            .with_vars([("action", action), ("tone", tone), ("audience", audience)])
            .build()
    }
}

//! Persona prompt templates.
//!
//! Each persona's system prompt is a plain-text template under
//! `config/prompts/`. Files are read once at startup into [`Personas`]; a
//! missing or empty file falls back to the built-in text below so the server
//! still runs from a bare checkout.
//!
//! ```text
//! chat.md         direct relay persona
//! coordinator.md  routing persona; {{context}}, {{user_input}}
//! scout.md        external-data specialist; {{request}}
//! trained.md      domain-expert specialist; {{request}}
//! final.md        final composer; {{history}}
//! ```
//!
//! Variable substitution uses `{{key}}` syntax and is applied once at
//! [`build()`](PromptBuilder::build) time, after all layers are joined.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SEPARATOR: &str = "\n\n";

const CHAT: &str = "You are James, a helpful personal assistant.";

const COORDINATOR: &str = "\
You are James, a sophisticated AI coordinator with a subtle James Bond-inspired personality.
You coordinate between specialists:
- Scout: external data (web, news, APIs)
- Trained: domain expert
Handle the request yourself if possible.

Routing:
- reply with ROUTE_TO_SCOUT followed by the request for current/live data
- reply with ROUTE_TO_TRAINED followed by the request for expert knowledge
- otherwise, respond directly

Context: {{context}}
User: {{user_input}}";

const SCOUT: &str = "\
You are Scout, focused on external data (web, APIs, news).
Respond with:
1. How you would retrieve the data
2. What source you would use
3. The response

Request: {{request}}";

const TRAINED: &str = "\
You are Trained, a domain expert. Provide professional advice or insight.

Request: {{request}}";

const FINAL: &str = "\
You are James. Review the full conversation and specialist input. Respond as a coordinated, charming assistant.

Conversation:
{{history}}";

/// Fluent builder that assembles a prompt from template files and fragments.
pub struct PromptBuilder {
    prompts_dir: PathBuf,
    parts: Vec<String>,
    vars: HashMap<String, String>,
}

impl PromptBuilder {
    /// Create a builder rooted at `prompts_dir` (e.g. `"config/prompts"`).
    pub fn new(prompts_dir: impl Into<PathBuf>) -> Self {
        Self {
            prompts_dir: prompts_dir.into(),
            parts: Vec::new(),
            vars: HashMap::new(),
        }
    }

    /// Append a layer by loading `filename` from the prompts directory.
    /// Silently skips the layer when the file does not exist.
    pub fn layer(mut self, filename: &str) -> Self {
        let path = self.prompts_dir.join(filename);
        match fs::read_to_string(&path) {
            Ok(text) => {
                let trimmed = text.trim().to_string();
                if !trimmed.is_empty() {
                    self.parts.push(trimmed);
                }
            }
            Err(_) => {
                tracing::debug!("prompt: layer '{}' not found, skipped", path.display());
            }
        }
        self
    }

    /// Directly append a text fragment (e.g. an already-loaded template body).
    pub fn append(mut self, text: impl Into<String>) -> Self {
        let s = text.into();
        let trimmed = s.trim().to_string();
        if !trimmed.is_empty() {
            self.parts.push(trimmed);
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

    /// Assemble all layers, join with blank lines, and apply variable substitution.
    pub fn build(self) -> String {
        let mut prompt = self.parts.join(SEPARATOR);
        for (k, v) in &self.vars {
            let placeholder = format!("{{{{{}}}}}", k);
            prompt = prompt.replace(&placeholder, v);
        }
        prompt
    }
}

/// Persona templates, loaded once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Personas {
    pub chat: String,
    pub coordinator: String,
    pub scout: String,
    pub trained: String,
    pub final_composer: String,
}

impl Default for Personas {
    fn default() -> Self {
        Self {
            chat: CHAT.to_string(),
            coordinator: COORDINATOR.to_string(),
            scout: SCOUT.to_string(),
            trained: TRAINED.to_string(),
            final_composer: FINAL.to_string(),
        }
    }
}

impl Personas {
    /// Read every persona file from `dir`, keeping the built-in text for
    /// files that are missing or empty.
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        let read = |file: &str, fallback: &str| {
            let text = PromptBuilder::new(dir).layer(file).build();
            if text.is_empty() {
                tracing::warn!(file, dir = %dir.display(), "persona file missing, using built-in prompt");
                fallback.to_string()
            } else {
                text
            }
        };

        Self {
            chat: read("chat.md", CHAT),
            coordinator: read("coordinator.md", COORDINATOR),
            scout: read("scout.md", SCOUT),
            trained: read("trained.md", TRAINED),
            final_composer: read("final.md", FINAL),
        }
    }

    pub fn coordinator(&self, context: &str, user_input: &str) -> String {
        render(&self.coordinator, [("context", context), ("user_input", user_input)])
    }

    pub fn scout(&self, request: &str) -> String {
        render(&self.scout, [("request", request)])
    }

    pub fn trained(&self, request: &str) -> String {
        render(&self.trained, [("request", request)])
    }

    pub fn final_composer(&self, history: &str) -> String {
        render(&self.final_composer, [("history", history)])
    }
}

fn render<'a>(template: &str, vars: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    PromptBuilder::new(PathBuf::new()).append(template).with_vars(vars).build()
}

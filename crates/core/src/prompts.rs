//! Prompt Templates
//!
//! Generation prompts are Markdown files in a directory, keyed by file stem
//! (e.g. `module_content.md`). Placeholders use `{name}` syntax. All templates
//! the course needs are checked once, at construction, so rendering never fails.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

pub const SYSTEM_PROMPT: &str = "system_prompt";
pub const EXTRACT_PROFILE: &str = "extract_profile";
pub const MODULE_CONTENT: &str = "module_content";
pub const MODULE_TRANSITION: &str = "module_transition";
pub const ONBOARDING_COMPLETE: &str = "onboarding_complete";
pub const GENERATE_QUIZ: &str = "generate_quiz";
pub const FREE_RESPONSE: &str = "free_response";

const REQUIRED: [&str; 7] = [
    SYSTEM_PROMPT,
    EXTRACT_PROFILE,
    MODULE_CONTENT,
    MODULE_TRANSITION,
    ONBOARDING_COMPLETE,
    GENERATE_QUIZ,
    FREE_RESPONSE,
];

#[derive(Debug, Clone)]
pub struct Prompts {
    templates: HashMap<String, String>,
}

impl Prompts {
    /// Wraps a template map, failing if any required template is missing.
    pub fn new(templates: HashMap<String, String>) -> Result<Self> {
        for key in REQUIRED {
            templates
                .get(key)
                .with_context(|| format!("Missing prompt template: '{}'", key))?;
        }
        Ok(Self { templates })
    }

    /// Loads every `.md` file in `dir` as a template.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut templates = HashMap::new();
        let entries = fs::read_dir(dir)
            .with_context(|| format!("Failed to read prompts directory {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("md") {
                let key = path
                    .file_stem()
                    .and_then(|s| s.to_str())
                    .context("Could not get file stem")?
                    .to_string();
                let content = fs::read_to_string(&path)?;
                templates.insert(key, content);
            }
        }
        Self::new(templates)
    }

    /// The raw template for `key`, empty when unknown.
    pub fn template(&self, key: &str) -> &str {
        self.templates.get(key).map(String::as_str).unwrap_or_default()
    }

    /// Substitutes each `{name}` placeholder in the `key` template.
    ///
    /// The template is scanned once, so substituted values are never expanded
    /// again. Braces that do not name a variable are kept as written.
    pub fn render(&self, key: &str, vars: &[(&str, &str)]) -> String {
        let template = self.template(key);
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let value = after.find('}').and_then(|close| {
                let name = &after[..close];
                vars.iter()
                    .find(|(n, _)| *n == name)
                    .map(|(_, v)| (close, *v))
            });
            match value {
                Some((close, v)) => {
                    out.push_str(v);
                    rest = &after[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

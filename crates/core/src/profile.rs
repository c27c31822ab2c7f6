//! Profile Extractor
//!
//! Infers onboarding answers from the conversation transcript. Extraction is
//! best-effort: any failure, whether the capability is down or the reply cannot
//! be parsed, yields an empty update so onboarding simply asks the next question.

use crate::{
    llm_client::LLMClient,
    prompts::{self, Prompts},
    student::{ProfileField, StudentProfile, Transcript},
};
use std::sync::Arc;
use tracing::warn;

const EMPTY_VALUES: [&str; 6] = ["none", "n/a", "null", "-", "não informado", "nao informado"];

pub struct ProfileExtractor {
    llm: Arc<dyn LLMClient>,
    prompts: Arc<Prompts>,
}

impl ProfileExtractor {
    pub fn new(llm: Arc<dyn LLMClient>, prompts: Arc<Prompts>) -> Self {
        Self { llm, prompts }
    }

    /// Returns whatever fields the capability could infer from `transcript`.
    pub async fn extract(&self, transcript: &Transcript) -> StudentProfile {
        let rendered = transcript.render();
        let prompt = self
            .prompts
            .render(prompts::EXTRACT_PROFILE, &[("transcript", rendered.as_str())]);
        match self.llm.generate_text(&prompt).await {
            Ok(reply) => parse_profile(&reply),
            Err(e) => {
                warn!(error = ?e, "Profile extraction failed; treating as no new information");
                StudentProfile::default()
            }
        }
    }
}

/// Parses `key: value` lines into a partial profile. Unknown keys, empty
/// values and unreadable knowledge levels are skipped.
pub fn parse_profile(text: &str) -> StudentProfile {
    let mut profile = StudentProfile::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let Some(field) = field_for_key(key) else {
            continue;
        };
        let Some(value) = clean_value(value) else {
            continue;
        };
        // The first occurrence of a key in one reply wins.
        if profile.is_set(field) {
            continue;
        }
        match field {
            ProfileField::Name => profile.name = Some(value),
            ProfileField::Course => profile.course = Some(value),
            ProfileField::Term => profile.term = Some(value),
            ProfileField::Experience => profile.experience = Some(value),
            ProfileField::Goals => profile.goals = Some(value),
            ProfileField::Knowledge => profile.knowledge = parse_level(&value),
            ProfileField::Interests => profile.interests = Some(value),
        }
    }
    profile
}

fn field_for_key(raw: &str) -> Option<ProfileField> {
    let key: String = raw
        .trim()
        .trim_start_matches(|c: char| c.is_ascii_digit() || matches!(c, '.' | ')' | '-' | '*' | ' '))
        .chars()
        .filter(|c| *c != '*' && *c != '_')
        .map(fold_accent)
        .collect::<String>()
        .to_lowercase();
    ProfileField::ALL
        .into_iter()
        .find(|f| f.key() == key.trim())
}

fn fold_accent(c: char) -> char {
    match c {
        'á' | 'à' | 'â' | 'ã' => 'a',
        'é' | 'ê' => 'e',
        'í' => 'i',
        'ó' | 'ô' | 'õ' => 'o',
        'ú' => 'u',
        'ç' => 'c',
        other => other,
    }
}

fn clean_value(raw: &str) -> Option<String> {
    let value = raw
        .trim()
        .trim_matches(|c| matches!(c, '*' | '[' | ']' | '"'))
        .trim();
    if value.is_empty() || EMPTY_VALUES.contains(&value.to_lowercase().as_str()) {
        None
    } else {
        Some(value.to_string())
    }
}

/// First digit in `1..=5`, so "3", "3/5" and "nível 3" all read as 3.
fn parse_level(value: &str) -> Option<u8> {
    value
        .chars()
        .find_map(|c| c.to_digit(10))
        .filter(|d| (1..=5).contains(d))
        .map(|d| d as u8)
}

//! Content Generator
//!
//! Produces the course prose through the text capability: submodule lessons,
//! module transitions, the post-onboarding welcome and free-form answers. Every
//! method is a pure function of its inputs plus network fallibility; callers
//! decide what to do on failure.

use crate::{
    curriculum::Module,
    llm_client::LLMClient,
    prompts::{self, Prompts},
    student::{StudentProfile, Transcript},
};
use anyhow::{Context, Result};
use std::sync::Arc;

/// Inputs for a free-form answer.
pub struct FreeResponseRequest<'a> {
    pub message: &'a str,
    pub profile: &'a StudentProfile,
    pub transcript: &'a Transcript,
    pub module: &'a Module,
    pub submodule: Option<&'a str>,
    pub points: u32,
}

pub struct ContentGenerator {
    llm: Arc<dyn LLMClient>,
    prompts: Arc<Prompts>,
}

impl ContentGenerator {
    pub fn new(llm: Arc<dyn LLMClient>, prompts: Arc<Prompts>) -> Self {
        Self { llm, prompts }
    }

    /// Lesson text for one submodule, personalised to `profile`.
    pub async fn generate(
        &self,
        module: &Module,
        submodule_index: usize,
        profile: &StudentProfile,
    ) -> Result<String> {
        let submodule = module.submodules.get(submodule_index).with_context(|| {
            format!(
                "Module '{}' has no submodule at index {}",
                module.id, submodule_index
            )
        })?;
        let profile = profile.to_string();
        let objectives = module.objectives.join("\n");
        let prompt = self.prompts.render(
            prompts::MODULE_CONTENT,
            &[
                ("module", module.title.as_str()),
                ("submodule", submodule.as_str()),
                ("profile", profile.as_str()),
                ("objectives", objectives.as_str()),
            ],
        );
        self.llm.generate_text(&prompt).await
    }

    /// A short message congratulating the student on leaving `from` for `to`.
    pub async fn transition(&self, from: &Module, to: &Module) -> Result<String> {
        let prompt = self.prompts.render(
            prompts::MODULE_TRANSITION,
            &[("from", from.title.as_str()), ("to", to.title.as_str())],
        );
        self.llm.generate_text(&prompt).await
    }

    /// The enthusiastic message sent once onboarding is complete.
    pub async fn welcome(&self, profile: &StudentProfile) -> Result<String> {
        let profile = profile.to_string();
        let prompt = self
            .prompts
            .render(prompts::ONBOARDING_COMPLETE, &[("profile", profile.as_str())]);
        self.llm.generate_text(&prompt).await
    }

    /// An open-ended answer to the student's message, in course context.
    pub async fn free_response(&self, request: FreeResponseRequest<'_>) -> Result<String> {
        let profile = request.profile.to_string();
        let transcript = request.transcript.render();
        let points = request.points.to_string();
        let prompt = self.prompts.render(
            prompts::FREE_RESPONSE,
            &[
                ("profile", profile.as_str()),
                ("module", request.module.title.as_str()),
                ("submodule", request.submodule.unwrap_or("-")),
                ("points", points.as_str()),
                ("transcript", transcript.as_str()),
                ("message", request.message),
            ],
        );
        self.llm.generate_text(&prompt).await
    }
}

//! Quiz Engine
//!
//! Quizzes are generated by the text capability in a semi-structured format
//! and parsed with a line-prefix grammar:
//!
//! ```text
//! Pergunta 1: <prompt>
//! a) <option>
//! b) <option>
//! Resposta: <letter>
//! ```
//!
//! A question that is missing its prompt, has fewer than two options, or whose
//! answer is not one of its own option letters is dropped rather than kept half
//! populated. Answers are single option letters, compared case-insensitively.

use crate::{
    curriculum::Module,
    llm_client::LLMClient,
    prompts::{self, Prompts},
};
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

const QUESTION_PREFIXES: [&str; 2] = ["pergunta", "question"];
const ANSWER_PREFIXES: [&str; 3] = ["resposta", "answer", "gabarito"];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizOption {
    pub key: char,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub prompt: String,
    pub options: Vec<QuizOption>,
    pub answer: char,
}

impl Question {
    pub fn has_option(&self, key: char) -> bool {
        self.options.iter().any(|o| o.key == key)
    }

    /// Prompt followed by one `x) text` line per option.
    pub fn render(&self) -> String {
        let mut text = self.prompt.clone();
        for option in &self.options {
            text.push_str(&format!("\n{}) {}", option.key, option.text));
        }
        text
    }

    /// Option letters as "a, b, c ou d".
    pub fn option_keys(&self) -> String {
        let keys: Vec<String> = self.options.iter().map(|o| o.key.to_string()).collect();
        match keys.split_last() {
            Some((last, rest)) if !rest.is_empty() => format!("{} ou {}", rest.join(", "), last),
            _ => keys.join(""),
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum QuizParseError {
    #[error("the generated quiz contained no complete questions")]
    NoQuestions,
}

/// Parses generated quiz text, keeping at most `max` complete questions.
pub fn parse_quiz(text: &str, max: usize) -> Result<Vec<Question>, QuizParseError> {
    let mut questions = Vec::new();
    let mut draft: Option<Draft> = None;

    for raw in text.lines() {
        let line = strip_markup(raw);
        if line.is_empty() {
            continue;
        }
        if let Some(prompt) = question_line(line) {
            if let Some(done) = draft.take().and_then(Draft::finish) {
                questions.push(done);
            }
            draft = Some(Draft::new(prompt));
        } else if let Some(answer) = answer_line(line) {
            // A question's answer is fixed by its first answer line; a later one
            // belongs to a question whose header did not parse.
            if let Some(d) = draft.as_mut().filter(|d| d.answer.is_none()) {
                d.answer = answer;
            }
        } else if let Some(option) = option_line(line) {
            if let Some(d) = draft.as_mut() {
                if d.answer.is_none() && !d.options.iter().any(|o| o.key == option.key) {
                    d.options.push(option);
                }
            }
        }
    }
    if let Some(done) = draft.and_then(Draft::finish) {
        questions.push(done);
    }

    questions.truncate(max);
    if questions.is_empty() {
        return Err(QuizParseError::NoQuestions);
    }
    Ok(questions)
}

struct Draft {
    prompt: String,
    options: Vec<QuizOption>,
    answer: Option<char>,
}

impl Draft {
    fn new(prompt: String) -> Self {
        Self {
            prompt,
            options: Vec::new(),
            answer: None,
        }
    }

    fn finish(self) -> Option<Question> {
        let answer = self.answer?;
        if self.prompt.is_empty()
            || self.options.len() < 2
            || !self.options.iter().any(|o| o.key == answer)
        {
            debug!(prompt = %self.prompt, "Dropping incomplete quiz question");
            return None;
        }
        Some(Question {
            prompt: self.prompt,
            options: self.options,
            answer,
        })
    }
}

fn strip_markup(line: &str) -> &str {
    line.trim().trim_matches(|c| c == '*' || c == '_').trim()
}

/// `Pergunta 1: text` → `text`.
fn question_line(line: &str) -> Option<String> {
    let lower = line.to_lowercase();
    if !QUESTION_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    let (_, prompt) = line.split_once(':')?;
    Some(strip_markup(prompt).to_string())
}

/// `Resposta: b` / `Resposta: b) text` → `b`.
fn answer_line(line: &str) -> Option<Option<char>> {
    let lower = line.to_lowercase();
    if !ANSWER_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return None;
    }
    let value = lower.split_once(':').map(|(_, v)| v).unwrap_or("");
    let letter = strip_markup(value)
        .trim_start_matches(['(', '['])
        .chars()
        .next()
        .filter(|c| c.is_ascii_alphabetic());
    Some(letter)
}

/// `a) text`, `a. text`, `(a) text` → option `a`.
fn option_line(line: &str) -> Option<QuizOption> {
    let line = line.strip_prefix('(').unwrap_or(line);
    let mut chars = line.chars();
    let key = chars.next()?.to_ascii_lowercase();
    if !key.is_ascii_lowercase() {
        return None;
    }
    let rest = chars.as_str();
    let text = rest.strip_prefix(')').or_else(|| rest.strip_prefix('.'))?;
    let text = strip_markup(text);
    if text.is_empty() {
        return None;
    }
    Some(QuizOption {
        key,
        text: text.to_string(),
    })
}

/// Reads a student's reply as an option letter: `b`, `B`, `b)`, `(b)` or `b.`.
pub fn parse_answer(input: &str) -> Option<char> {
    let trimmed = input.trim().to_lowercase();
    let inner = trimmed.strip_prefix('(').unwrap_or(&trimmed);
    let inner = inner
        .strip_suffix(')')
        .or_else(|| inner.strip_suffix('.'))
        .unwrap_or(inner);
    let mut chars = inner.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_lowercase() => Some(c),
        _ => None,
    }
}

/// Result of scoring one answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Score {
    pub correct: bool,
    pub correct_key: char,
}

/// Why an answer was not accepted into the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnswerError {
    #[error("answer is not one of the current question's options")]
    InvalidOption,
    #[error("the quiz is already complete")]
    Finished,
}

/// An in-progress quiz for one module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    pub module: usize,
    questions: Vec<Question>,
    answers: Vec<char>,
}

impl QuizSession {
    pub fn new(module: usize, questions: Vec<Question>) -> Self {
        Self {
            module,
            questions,
            answers: Vec::new(),
        }
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn answers(&self) -> &[char] {
        &self.answers
    }

    /// The question awaiting an answer.
    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.answers.len())
    }

    pub fn is_complete(&self) -> bool {
        self.answers.len() >= self.questions.len()
    }

    /// Validates `input` against the current question, records it and scores it.
    ///
    /// Rejected input is never recorded.
    pub fn answer(&mut self, input: &str) -> Result<Score, AnswerError> {
        let question = self.current().ok_or(AnswerError::Finished)?;
        let key = parse_answer(input)
            .filter(|k| question.has_option(*k))
            .ok_or(AnswerError::InvalidOption)?;
        let score = Score {
            correct: key == question.answer,
            correct_key: question.answer,
        };
        self.answers.push(key);
        Ok(score)
    }
}

/// Generates module quizzes through the text capability.
pub struct QuizGenerator {
    llm: Arc<dyn LLMClient>,
    prompts: Arc<Prompts>,
    question_count: usize,
}

impl QuizGenerator {
    pub fn new(llm: Arc<dyn LLMClient>, prompts: Arc<Prompts>, question_count: usize) -> Self {
        Self {
            llm,
            prompts,
            question_count: question_count.max(1),
        }
    }

    /// Asks for a quiz about `module` and parses it. Both a failed call and an
    /// unparsable reply are errors; the caller must not enter quiz state.
    pub async fn generate(&self, module: &Module) -> Result<Vec<Question>> {
        let count = self.question_count.to_string();
        let prompt = self.prompts.render(
            prompts::GENERATE_QUIZ,
            &[("count", count.as_str()), ("module", module.title.as_str())],
        );
        let reply = self.llm.generate_text(&prompt).await?;
        let questions = parse_quiz(&reply, self.question_count).inspect_err(|e| {
            warn!(module = %module.id, error = %e, "Could not parse generated quiz");
        })?;
        if questions.len() < self.question_count {
            warn!(
                module = %module.id,
                parsed = questions.len(),
                requested = self.question_count,
                "Generated quiz is shorter than requested"
            );
        }
        Ok(questions)
    }
}

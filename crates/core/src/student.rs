use crate::{curriculum::Cursor, ledger::PointsBalance, quiz::QuizSession};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// The onboarding fields, in the fixed order they are asked about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileField {
    Name,
    Course,
    Term,
    Experience,
    Goals,
    Knowledge,
    Interests,
}

impl ProfileField {
    pub const ALL: [ProfileField; 7] = [
        ProfileField::Name,
        ProfileField::Course,
        ProfileField::Term,
        ProfileField::Experience,
        ProfileField::Goals,
        ProfileField::Knowledge,
        ProfileField::Interests,
    ];

    /// The key used for this field in extraction prompts and responses.
    pub fn key(self) -> &'static str {
        match self {
            ProfileField::Name => "nome",
            ProfileField::Course => "curso",
            ProfileField::Term => "periodo",
            ProfileField::Experience => "experiencia",
            ProfileField::Goals => "objetivos",
            ProfileField::Knowledge => "conhecimento",
            ProfileField::Interests => "interesses",
        }
    }

    /// The question asked when this field is the first one missing.
    pub fn question(self) -> &'static str {
        match self {
            ProfileField::Name => "qual é o seu nome completo",
            ProfileField::Course => "qual curso você está fazendo na UVV",
            ProfileField::Term => "em qual período/semestre você está",
            ProfileField::Experience => {
                "se você já teve alguma experiência empreendedora (mesmo que informal)"
            }
            ProfileField::Goals => "quais são seus principais objetivos com este curso",
            ProfileField::Knowledge => {
                "em uma escala de 1 a 5, como você avalia seu conhecimento sobre empreendedorismo"
            }
            ProfileField::Interests => "quais áreas do empreendedorismo te interessam mais",
        }
    }
}

/// Answers to the onboarding questions. Fields only ever go from unset to set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentProfile {
    pub name: Option<String>,
    pub course: Option<String>,
    pub term: Option<String>,
    pub experience: Option<String>,
    pub goals: Option<String>,
    /// Self-rated knowledge, 1 to 5.
    pub knowledge: Option<u8>,
    pub interests: Option<String>,
}

impl StudentProfile {
    pub fn is_set(&self, field: ProfileField) -> bool {
        match field {
            ProfileField::Name => self.name.is_some(),
            ProfileField::Course => self.course.is_some(),
            ProfileField::Term => self.term.is_some(),
            ProfileField::Experience => self.experience.is_some(),
            ProfileField::Goals => self.goals.is_some(),
            ProfileField::Knowledge => self.knowledge.is_some(),
            ProfileField::Interests => self.interests.is_some(),
        }
    }

    /// The first unset field in question order.
    pub fn first_missing(&self) -> Option<ProfileField> {
        ProfileField::ALL.into_iter().find(|f| !self.is_set(*f))
    }

    /// Onboarding is complete exactly when every field is populated.
    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    /// Merges an extraction result, keeping any value that is already set.
    pub fn merge(&mut self, update: StudentProfile) {
        fn fill<T>(slot: &mut Option<T>, value: Option<T>) {
            if slot.is_none() {
                *slot = value;
            }
        }
        fill(&mut self.name, update.name);
        fill(&mut self.course, update.course);
        fill(&mut self.term, update.term);
        fill(&mut self.experience, update.experience);
        fill(&mut self.goals, update.goals);
        fill(&mut self.knowledge, update.knowledge);
        fill(&mut self.interests, update.interests);
    }
}

impl fmt::Display for StudentProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        writeln!(f, "nome: {}", show(&self.name))?;
        writeln!(f, "curso: {}", show(&self.course))?;
        writeln!(f, "periodo: {}", show(&self.term))?;
        writeln!(f, "experiencia: {}", show(&self.experience))?;
        writeln!(f, "objetivos: {}", show(&self.goals))?;
        match self.knowledge {
            Some(level) => writeln!(f, "conhecimento: {}/5", level)?,
            None => writeln!(f, "conhecimento: -")?,
        }
        write!(f, "interesses: {}", show(&self.interests))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Speaker {
    Student,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::Student => write!(f, "Aluno"),
            Speaker::Assistant => write!(f, "Assistente"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Append-only conversation log for one student.
///
/// When a limit is set, the oldest entries are dropped first so ordering and
/// recency are preserved.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    entries: VecDeque<TranscriptEntry>,
    limit: Option<usize>,
}

impl Transcript {
    pub fn with_limit(limit: usize) -> Self {
        Self {
            entries: VecDeque::new(),
            limit: Some(limit.max(1)),
        }
    }

    pub fn push(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.entries.push_back(TranscriptEntry {
            speaker,
            text: text.into(),
        });
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &TranscriptEntry> {
        self.entries.iter()
    }

    /// Renders the transcript as `Speaker: text` lines for prompt context.
    pub fn render(&self) -> String {
        self.entries
            .iter()
            .map(|e| format!("{}: {}", e.speaker, e.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Where the student is in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Context {
    Onboarding,
    PresentingContent,
    Quiz,
    FreeInteraction,
    Completed,
}

/// Everything the bot knows about one student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudentState {
    pub profile: StudentProfile,
    pub transcript: Transcript,
    pub cursor: Cursor,
    pub quiz: Option<QuizSession>,
    pub points: PointsBalance,
    pub context: Context,
    /// Set once, when the last onboarding field is filled.
    pub onboarding_complete: bool,
    /// The submodule under the cursor failed to generate and has not been delivered.
    pub content_pending: bool,
    /// The onboarding question awaiting an answer. It joins the transcript
    /// together with the answer.
    #[serde(default)]
    pub pending_question: Option<String>,
}

impl StudentState {
    pub fn new(transcript_limit: Option<usize>) -> Self {
        Self {
            profile: StudentProfile::default(),
            transcript: transcript_limit
                .map(Transcript::with_limit)
                .unwrap_or_default(),
            cursor: Cursor::default(),
            quiz: None,
            points: PointsBalance::default(),
            context: Context::Onboarding,
            onboarding_complete: false,
            content_pending: false,
            pending_question: None,
        }
    }
}

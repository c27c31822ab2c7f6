//! Conversation State Machine
//!
//! `CourseAgent` consumes one inbound message at a time for a student, decides
//! which side effects apply (profile update, cursor advance, quiz scoring, point
//! debit) and returns the ordered list of replies. Commands are matched first;
//! anything else is dispatched on the student's current [`Context`].
//!
//! Generation failures are recovered here with an apology and no progression
//! change. Any other error escaping dispatch is logged and answered with a single
//! generic failure message; state already mutated stays mutated.

use crate::{
    Command,
    content::{ContentGenerator, FreeResponseRequest},
    curriculum::{Catalog, Cursor, Module},
    ledger::{MENTORING_COST, Redemption},
    llm_client::LLMClient,
    messages,
    profile::ProfileExtractor,
    prompts::Prompts,
    quiz::{AnswerError, QuizGenerator, QuizSession},
    store::StudentStore,
    student::{Context, Speaker, StudentState},
};
use anyhow::{Context as _, Result};
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// Tunables for the state machine.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Number of questions requested per quiz.
    pub quiz_questions: usize,
    /// Maximum transcript entries kept per student; `None` keeps everything.
    pub transcript_limit: Option<usize>,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            quiz_questions: 5,
            transcript_limit: Some(200),
        }
    }
}

pub struct CourseAgent {
    store: StudentStore,
    catalog: Arc<Catalog>,
    extractor: ProfileExtractor,
    content: ContentGenerator,
    quizzes: QuizGenerator,
}

impl CourseAgent {
    pub fn new(
        llm: Arc<dyn LLMClient>,
        prompts: Prompts,
        catalog: Catalog,
        settings: AgentSettings,
    ) -> Self {
        let prompts = Arc::new(prompts);
        Self {
            store: StudentStore::new(settings.transcript_limit),
            catalog: Arc::new(catalog),
            extractor: ProfileExtractor::new(llm.clone(), prompts.clone()),
            content: ContentGenerator::new(llm.clone(), prompts.clone()),
            quizzes: QuizGenerator::new(llm, prompts, settings.quiz_questions),
        }
    }

    pub fn store(&self) -> &StudentStore {
        &self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Processes one inbound message to completion and returns the replies in
    /// delivery order. Messages from the same sender are serialised on the
    /// student's lock.
    #[instrument(name = "handle_message", skip_all, fields(sender = %sender_id))]
    pub async fn handle_message(&self, sender_id: &str, body: &str) -> Vec<String> {
        let handle = self.store.get_or_create(sender_id);
        let mut student = handle.lock().await;
        match self.dispatch(&mut student, body).await {
            Ok(replies) => replies,
            Err(e) => {
                error!(error = ?e, context = ?student.context, "Failed to process message");
                vec![messages::GENERIC_FAILURE.to_string()]
            }
        }
    }

    async fn dispatch(&self, student: &mut StudentState, body: &str) -> Result<Vec<String>> {
        if let Some(command) = Command::parse(body) {
            info!(?command, context = ?student.context, "Command received");
            // The course only starts once the profile is complete.
            if student.context == Context::Onboarding
                && matches!(command, Command::Quiz | Command::Continue)
            {
                if let Some(field) = student.profile.first_missing() {
                    let question = messages::question(field.question());
                    student.pending_question = Some(question.clone());
                    return Ok(vec![messages::ONBOARDING_PENDING.to_string(), question]);
                }
            }
            return self.run_command(student, command).await;
        }
        match student.context {
            Context::Onboarding => Ok(self.onboard(student, body).await),
            Context::Quiz => self.answer_quiz(student, body).await,
            Context::PresentingContent | Context::FreeInteraction | Context::Completed => {
                self.respond_freely(student, body).await
            }
        }
    }

    async fn run_command(&self, student: &mut StudentState, command: Command) -> Result<Vec<String>> {
        match command {
            Command::Quiz => self.start_quiz(student).await,
            Command::Continue => {
                if student.content_pending {
                    info!(cursor = ?student.cursor, "Retrying undelivered submodule");
                } else {
                    student.cursor = self.catalog.advance(student.cursor);
                }
                if student.quiz.take().is_some() {
                    info!("Quiz abandoned");
                }
                student.context = Context::PresentingContent;
                Ok(self.present_content(student).await)
            }
            Command::Points => Ok(vec![messages::points(student.points.get())]),
            Command::Mentoring => {
                let unlocked = self.catalog.reached_mentoring(student.cursor);
                let reply = match student.points.redeem_mentoring(unlocked) {
                    Redemption::Redeemed { remaining } => {
                        info!(remaining, "Mentoring redeemed");
                        messages::mentoring_redeemed(remaining)
                    }
                    Redemption::Insufficient { balance } => {
                        messages::mentoring_insufficient(balance, MENTORING_COST)
                    }
                    Redemption::NotYetAvailable => messages::MENTORING_NOT_YET.to_string(),
                };
                Ok(vec![reply])
            }
            Command::Help => Ok(vec![messages::HELP.to_string()]),
            Command::Progress => {
                let cursor = student.cursor;
                let module = self.current_module(cursor)?;
                let position = self
                    .catalog
                    .submodule(cursor)
                    .map(|s| (cursor.submodule + 1, module.submodules.len(), s));
                Ok(vec![messages::progress(
                    &module.title,
                    position,
                    student.points.get(),
                )])
            }
        }
    }

    /// Records the message, merges whatever the extractor finds and either asks
    /// the next missing question or finishes onboarding and starts the course.
    ///
    /// A question is written to the transcript when its answer arrives, directly
    /// ahead of that answer, so the extractor always sees what was being answered.
    async fn onboard(&self, student: &mut StudentState, body: &str) -> Vec<String> {
        let first_contact = student.transcript.is_empty();
        if let Some(question) = student.pending_question.take() {
            student.transcript.push(Speaker::Assistant, question);
        }
        student.transcript.push(Speaker::Student, body);

        let update = self.extractor.extract(&student.transcript).await;
        student.profile.merge(update);

        if let Some(field) = student.profile.first_missing() {
            let mut replies = Vec::new();
            if first_contact {
                replies.push(messages::pick(messages::GREETINGS).to_string());
            }
            let question = messages::question(field.question());
            student.pending_question = Some(question.clone());
            replies.push(question);
            return replies;
        }

        student.onboarding_complete = true;
        student.context = Context::PresentingContent;
        info!("Onboarding complete");

        let welcome = match self.content.welcome(&student.profile).await {
            Ok(text) => {
                student.transcript.push(Speaker::Assistant, text.as_str());
                text
            }
            Err(e) => {
                warn!(error = ?e, "Welcome generation failed; using fallback");
                messages::ONBOARDING_FALLBACK.to_string()
            }
        };
        let mut replies = vec![welcome];
        replies.extend(self.present_content(student).await);
        replies
    }

    /// Presents the submodule under the cursor, first walking past exhausted
    /// modules. Each skipped module contributes a transition message. The walk is
    /// bounded by the module count.
    async fn present_content(&self, student: &mut StudentState) -> Vec<String> {
        let mut replies = Vec::new();

        for _ in 0..=self.catalog.len() {
            let cursor = student.cursor;
            let Some(module) = self.catalog.module(cursor.module) else {
                error!(?cursor, "Cursor points outside the curriculum");
                replies.push(messages::GENERIC_FAILURE.to_string());
                return replies;
            };

            if let Some(submodule) = self.catalog.submodule(cursor) {
                match self
                    .content
                    .generate(module, cursor.submodule, &student.profile)
                    .await
                {
                    Ok(text) => {
                        let message = format!(
                            "*{} - {}*\n\n{}\n\n{}",
                            module.title,
                            submodule,
                            text,
                            messages::reflection(submodule)
                        );
                        student.transcript.push(Speaker::Assistant, message.as_str());
                        student.content_pending = false;
                        replies.push(message);
                        replies.push(messages::CALL_TO_ACTION.to_string());
                    }
                    Err(e) => {
                        warn!(error = ?e, module = %module.id, submodule = cursor.submodule, "Content generation failed");
                        student.content_pending = true;
                        replies.push(messages::content_unavailable(submodule));
                    }
                }
                return replies;
            }

            let Some(next) = self
                .catalog
                .next_module(cursor.module)
                .and_then(|i| self.catalog.module(i).map(|m| (i, m)))
            else {
                info!("Course completed");
                student.context = Context::Completed;
                student.content_pending = false;
                replies.push(messages::COURSE_COMPLETED.to_string());
                return replies;
            };

            let (next_index, next_module) = next;
            let transition = match self.content.transition(module, next_module).await {
                Ok(text) => {
                    student.transcript.push(Speaker::Assistant, text.as_str());
                    text
                }
                Err(e) => {
                    warn!(error = ?e, "Transition generation failed; using fallback");
                    messages::transition_fallback(&module.title, &next_module.title)
                }
            };
            replies.push(transition);
            student.cursor = Cursor {
                module: next_index,
                submodule: 0,
            };
            info!(module = %next_module.id, "Advanced to next module");
        }

        error!(cursor = ?student.cursor, "Module advancement did not settle");
        replies.push(messages::GENERIC_FAILURE.to_string());
        replies
    }

    async fn start_quiz(&self, student: &mut StudentState) -> Result<Vec<String>> {
        let module = self.current_module(student.cursor)?;
        let questions = match self.quizzes.generate(module).await {
            Ok(questions) => questions,
            Err(e) => {
                warn!(error = ?e, module = %module.id, "Quiz generation failed");
                return Ok(vec![messages::QUIZ_UNAVAILABLE.to_string()]);
            }
        };

        let session = QuizSession::new(student.cursor.module, questions);
        let Some(first) = session.current().map(|q| q.render()) else {
            return Ok(vec![messages::QUIZ_UNAVAILABLE.to_string()]);
        };
        info!(module = %module.id, questions = session.questions().len(), "Quiz started");
        student.quiz = Some(session);
        student.context = Context::Quiz;
        Ok(vec![messages::quiz_header(&module.title, &first)])
    }

    async fn answer_quiz(&self, student: &mut StudentState, body: &str) -> Result<Vec<String>> {
        let Some(session) = student.quiz.as_mut() else {
            warn!("Quiz context without an active session; resuming content");
            student.context = Context::PresentingContent;
            return self.respond_freely(student, body).await;
        };

        let score = match session.answer(body) {
            Ok(score) => score,
            Err(AnswerError::InvalidOption) => {
                let keys = session.current().map(|q| q.option_keys()).unwrap_or_default();
                return Ok(vec![messages::invalid_option(&keys)]);
            }
            Err(AnswerError::Finished) => {
                warn!("Answer received for a finished quiz; discarding session");
                student.quiz = None;
                student.context = Context::PresentingContent;
                return Ok(self.present_content(student).await);
            }
        };

        let next = session.current().map(|q| q.render());

        let feedback = if score.correct {
            student.points.credit_correct_answer();
            messages::pick(messages::CORRECT_ANSWER).to_string()
        } else {
            messages::wrong_answer(score.correct_key)
        };
        info!(correct = score.correct, points = student.points.get(), "Quiz answer scored");

        match next {
            Some(question) => Ok(vec![messages::next_question(&feedback, &question)]),
            None => {
                student.quiz = None;
                student.cursor = self.catalog.advance(student.cursor);
                student.content_pending = false;
                student.context = Context::PresentingContent;
                info!(cursor = ?student.cursor, "Quiz completed");

                let mut replies = vec![messages::quiz_finished(&feedback, student.points.get())];
                replies.extend(self.present_content(student).await);
                Ok(replies)
            }
        }
    }

    async fn respond_freely(&self, student: &mut StudentState, body: &str) -> Result<Vec<String>> {
        let cursor = student.cursor;
        let module = self.current_module(cursor)?;
        let request = FreeResponseRequest {
            message: body,
            profile: &student.profile,
            transcript: &student.transcript,
            module,
            submodule: self.catalog.submodule(cursor),
            points: student.points.get(),
        };

        match self.content.free_response(request).await {
            Ok(text) => {
                student.transcript.push(Speaker::Student, body);
                student.transcript.push(Speaker::Assistant, text.as_str());
                if student.context == Context::PresentingContent {
                    student.context = Context::FreeInteraction;
                }
                Ok(vec![text])
            }
            Err(e) => {
                warn!(error = ?e, "Free response generation failed");
                Ok(vec![messages::pick(messages::GENERATION_ERRORS).to_string()])
            }
        }
    }

    fn current_module(&self, cursor: Cursor) -> Result<&Module> {
        self.catalog
            .module(cursor.module)
            .with_context(|| format!("Cursor {:?} points outside the curriculum", cursor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curriculum::tests::sample_catalog;
    use crate::ledger::PointsBalance;
    use crate::llm_client::MockLLMClient;
    use crate::prompts::tests::test_prompts;
    use crate::quiz::tests::quiz_text;
    use crate::student::ProfileField;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const SENDER: &str = "whatsapp:+5527999990000";

    /// Deterministic stand-in for the text capability, routed on the test
    /// templates' leading keyword. Profile extraction echoes the student's own
    /// `key: value` lines back, so tests control onboarding by what they send.
    fn fake_reply(prompt: &str) -> Result<String> {
        let header = prompt.lines().next().unwrap_or_default();
        let reply = if header == "EXTRACT" {
            prompt
                .lines()
                .skip(1)
                .map(|l| l.strip_prefix("Aluno: ").unwrap_or(l))
                .collect::<Vec<_>>()
                .join("\n")
        } else if let Some(rest) = header.strip_prefix("CONTENT ") {
            format!("lesson about {}", rest)
        } else if header.starts_with("TRANSITION") {
            header.to_string()
        } else if header.starts_with("WELCOME") {
            "Bem-vinda ao curso!".to_string()
        } else if header.starts_with("QUIZ") {
            quiz_text(3)
        } else if header.starts_with("FREE") {
            "free answer".to_string()
        } else {
            return Err(anyhow!("unexpected prompt: {}", header));
        };
        Ok(reply)
    }

    /// Reads the transcript the way a model would: each answer fills the field
    /// whose question immediately precedes it.
    fn extract_from_pairs(prompt: &str) -> String {
        let lines: Vec<&str> = prompt.lines().skip(1).collect();
        lines
            .windows(2)
            .filter_map(|pair| {
                let question = pair[0].strip_prefix("Assistente: ")?;
                let answer = pair[1].strip_prefix("Aluno: ")?;
                let field = ProfileField::ALL
                    .into_iter()
                    .find(|f| question.contains(f.question()))?;
                Some(format!("{}: {}", field.key(), answer))
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn agent_with(llm: MockLLMClient) -> CourseAgent {
        CourseAgent::new(
            Arc::new(llm),
            test_prompts(),
            sample_catalog(),
            AgentSettings {
                quiz_questions: 3,
                transcript_limit: None,
            },
        )
    }

    fn agent() -> CourseAgent {
        let mut llm = MockLLMClient::new();
        llm.expect_generate_text().returning(fake_reply);
        agent_with(llm)
    }

    /// An agent whose text capability fails for prompts starting with `failing`.
    fn agent_failing(failing: &'static str) -> CourseAgent {
        let mut llm = MockLLMClient::new();
        llm.expect_generate_text().returning(move |prompt| {
            if prompt.starts_with(failing) {
                Err(anyhow!("service unavailable"))
            } else {
                fake_reply(prompt)
            }
        });
        agent_with(llm)
    }

    /// Puts the student straight into content presentation at `cursor`.
    async fn seed(agent: &CourseAgent, cursor: Cursor, points: u32) {
        let handle = agent.store().get_or_create(SENDER);
        let mut student = handle.lock().await;
        student.context = Context::PresentingContent;
        student.onboarding_complete = true;
        student.cursor = cursor;
        student.points = PointsBalance::new(points);
    }

    async fn snapshot(agent: &CourseAgent) -> StudentState {
        agent.store().get(SENDER).unwrap().lock().await.clone()
    }

    fn at(module: usize, submodule: usize) -> Cursor {
        Cursor { module, submodule }
    }

    #[tokio::test]
    async fn test_new_sender_is_greeted_and_asked_for_name() {
        let agent = agent();
        let replies = agent.handle_message(SENDER, "Oi").await;

        assert_eq!(replies.len(), 2);
        assert!(messages::GREETINGS.contains(&replies[0].as_str()));
        assert!(replies[1].contains("qual é o seu nome completo"));

        let state = snapshot(&agent).await;
        assert_eq!(state.context, Context::Onboarding);
        assert_eq!(state.transcript.len(), 1);
        assert_eq!(state.profile, Default::default());
        assert!(!state.onboarding_complete);
    }

    #[tokio::test]
    async fn test_onboarding_asks_missing_fields_in_order_then_presents_content() {
        let agent = agent();

        let replies = agent.handle_message(SENDER, "nome: Ana").await;
        assert_eq!(replies.len(), 2);
        assert!(replies[1].contains("qual curso"));

        let replies = agent
            .handle_message(SENDER, "curso: Administração\nperiodo: 3")
            .await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].contains("experiência empreendedora"));

        // A later, conflicting name never overwrites the first one.
        let replies = agent
            .handle_message(SENDER, "nome: Beatriz\nexperiencia: nenhuma\nobjetivos: abrir uma startup\nconhecimento: 3")
            .await;
        assert!(replies[0].contains("áreas do empreendedorismo"));
        assert_eq!(snapshot(&agent).await.context, Context::Onboarding);

        let replies = agent.handle_message(SENDER, "interesses: tecnologia").await;
        assert_eq!(
            replies,
            vec![
                "Bem-vinda ao curso!".to_string(),
                replies[1].clone(),
                messages::CALL_TO_ACTION.to_string(),
            ]
        );
        assert!(replies[1].starts_with("*Title intro - What*\n\nlesson about Title intro / What"));

        let state = snapshot(&agent).await;
        assert!(state.onboarding_complete);
        assert_eq!(state.context, Context::PresentingContent);
        assert_eq!(state.cursor, at(0, 0));
        assert_eq!(state.profile.name.as_deref(), Some("Ana"));
        assert_eq!(state.profile.knowledge, Some(3));
    }

    #[tokio::test]
    async fn test_bare_answers_are_read_against_the_question_asked() {
        let extract_prompts = Arc::new(std::sync::Mutex::new(Vec::<String>::new()));
        let seen = extract_prompts.clone();
        let mut llm = MockLLMClient::new();
        llm.expect_generate_text().returning(move |prompt| {
            if prompt.starts_with("EXTRACT") {
                seen.lock().unwrap().push(prompt.to_string());
                Ok(extract_from_pairs(prompt))
            } else {
                fake_reply(prompt)
            }
        });
        let agent = agent_with(llm);

        let mut asked = agent.handle_message(SENDER, "Oi").await.pop().unwrap();
        assert_eq!(snapshot(&agent).await.transcript.len(), 1);

        for answer in ["Ana Souza", "Administração", "3", "nenhuma", "abrir uma startup", "2"] {
            let replies = agent.handle_message(SENDER, answer).await;
            let prompt = extract_prompts.lock().unwrap().last().cloned().unwrap();
            assert!(
                prompt.ends_with(&format!("Assistente: {}\nAluno: {}", asked, answer)),
                "question missing before {:?}: {}",
                answer,
                prompt
            );
            asked = replies.last().unwrap().clone();
        }

        let replies = agent.handle_message(SENDER, "tecnologia").await;
        assert_eq!(replies[0], "Bem-vinda ao curso!");

        let state = snapshot(&agent).await;
        assert_eq!(state.context, Context::PresentingContent);
        assert_eq!(state.profile.name.as_deref(), Some("Ana Souza"));
        assert_eq!(state.profile.term.as_deref(), Some("3"));
        assert_eq!(state.profile.experience.as_deref(), Some("nenhuma"));
        assert_eq!(state.profile.knowledge, Some(2));
        assert_eq!(state.profile.interests.as_deref(), Some("tecnologia"));
        assert!(state.pending_question.is_none());
    }

    #[tokio::test]
    async fn test_onboarding_survives_extraction_failure() {
        let agent = agent_failing("EXTRACT");
        let replies = agent.handle_message(SENDER, "nome: Ana").await;
        assert!(replies.last().unwrap().contains("qual é o seu nome completo"));
        assert_eq!(snapshot(&agent).await.context, Context::Onboarding);
    }

    #[tokio::test]
    async fn test_course_commands_wait_for_onboarding() {
        let agent = agent();
        agent.handle_message(SENDER, "nome: Ana").await;

        for body in ["continuar", "quiz"] {
            let replies = agent.handle_message(SENDER, body).await;
            assert_eq!(replies[0], messages::ONBOARDING_PENDING);
            assert!(replies[1].contains("qual curso"));
        }

        let replies = agent.handle_message(SENDER, "pontos").await;
        assert_eq!(replies, vec![messages::points(0)]);
        let replies = agent.handle_message(SENDER, "mentoria").await;
        assert_eq!(replies, vec![messages::MENTORING_NOT_YET.to_string()]);

        let state = snapshot(&agent).await;
        assert_eq!(state.context, Context::Onboarding);
        assert_eq!(state.cursor, at(0, 0));
        assert!(state.quiz.is_none());
        assert_eq!(state.transcript.len(), 1);
    }

    #[tokio::test]
    async fn test_onboarding_is_never_reentered() {
        let agent = agent();
        seed(&agent, at(0, 0), 0).await;

        for body in ["nome: Ana", "continuar", "o que é MVP?", "quiz", "a", "pontos"] {
            agent.handle_message(SENDER, body).await;
            assert_ne!(snapshot(&agent).await.context, Context::Onboarding);
        }
    }

    #[tokio::test]
    async fn test_continue_advances_one_submodule() {
        let agent = agent();
        seed(&agent, at(0, 0), 0).await;

        let replies = agent.handle_message(SENDER, "Continuar").await;
        assert_eq!(replies.len(), 2);
        assert!(replies[0].starts_with("*Title intro - Why*"));
        assert_eq!(replies[1], messages::CALL_TO_ACTION);
        assert_eq!(snapshot(&agent).await.cursor, at(0, 1));
    }

    #[tokio::test]
    async fn test_continue_cascades_into_next_module() {
        let agent = agent();
        seed(&agent, at(0, 1), 0).await;

        let replies = agent.handle_message(SENDER, "próximo").await;
        assert_eq!(replies.len(), 3);
        assert_eq!(replies[0], "TRANSITION Title intro -> Title basics");
        assert!(replies[1].starts_with("*Title basics - First*"));
        assert_eq!(replies[2], messages::CALL_TO_ACTION);

        let state = snapshot(&agent).await;
        assert_eq!(state.cursor, at(1, 0));
        assert_eq!(state.context, Context::PresentingContent);
    }

    #[tokio::test]
    async fn test_transition_failure_uses_fallback() {
        let agent = agent_failing("TRANSITION");
        seed(&agent, at(0, 1), 0).await;

        let replies = agent.handle_message(SENDER, "seguir").await;
        assert_eq!(
            replies[0],
            messages::transition_fallback("Title intro", "Title basics")
        );
        assert_eq!(snapshot(&agent).await.cursor, at(1, 0));
    }

    #[tokio::test]
    async fn test_last_module_completes_course() {
        let agent = agent();
        seed(&agent, at(2, 0), 0).await;

        let replies = agent.handle_message(SENDER, "continuar").await;
        assert_eq!(replies, vec![messages::COURSE_COMPLETED.to_string()]);
        let state = snapshot(&agent).await;
        assert_eq!(state.context, Context::Completed);
        assert_eq!(state.cursor, at(2, 1));

        // Continuing after completion stays put.
        let replies = agent.handle_message(SENDER, "continuar").await;
        assert_eq!(replies, vec![messages::COURSE_COMPLETED.to_string()]);
        assert_eq!(snapshot(&agent).await.cursor, at(2, 1));

        let replies = agent.handle_message(SENDER, "e agora?").await;
        assert_eq!(replies, vec!["free answer".to_string()]);
        assert_eq!(snapshot(&agent).await.context, Context::Completed);
    }

    #[tokio::test]
    async fn test_content_failure_keeps_position_and_retries() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let mut llm = MockLLMClient::new();
        llm.expect_generate_text().returning(move |prompt| {
            if prompt.starts_with("CONTENT") && counter.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(anyhow!("timeout"))
            } else {
                fake_reply(prompt)
            }
        });
        let agent = agent_with(llm);
        seed(&agent, at(0, 0), 0).await;

        let replies = agent.handle_message(SENDER, "continuar").await;
        assert_eq!(replies, vec![messages::content_unavailable("Why")]);
        let state = snapshot(&agent).await;
        assert_eq!(state.cursor, at(0, 1));
        assert!(state.content_pending);

        let replies = agent.handle_message(SENDER, "continuar").await;
        assert!(replies[0].starts_with("*Title intro - Why*"));
        let state = snapshot(&agent).await;
        assert_eq!(state.cursor, at(0, 1));
        assert!(!state.content_pending);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_quiz_scores_and_rejects_invalid_answers() {
        let agent = agent();
        seed(&agent, at(0, 0), 0).await;

        let replies = agent.handle_message(SENDER, "quiz").await;
        assert_eq!(replies.len(), 1);
        assert!(replies[0].starts_with("*Quiz do módulo Title intro*\n\nQuestion 1?\na) one"));
        assert_eq!(snapshot(&agent).await.context, Context::Quiz);

        let replies = agent.handle_message(SENDER, "a").await;
        assert!(replies[0].contains("10 pontos"));
        assert!(replies[0].contains("Question 2?"));

        agent.handle_message(SENDER, "B").await;

        let replies = agent.handle_message(SENDER, "talvez").await;
        assert_eq!(replies, vec![messages::invalid_option("a, b, c ou d")]);

        let state = snapshot(&agent).await;
        assert_eq!(state.points.get(), 20);
        assert_eq!(state.quiz.as_ref().unwrap().answers().len(), 2);
        assert_eq!(state.context, Context::Quiz);
        assert_eq!(state.cursor, at(0, 0));
    }

    #[tokio::test]
    async fn test_quiz_completion_advances_once_and_presents_next_content() {
        let agent = agent();
        seed(&agent, at(0, 0), 5).await;

        agent.handle_message(SENDER, "quiz").await;
        agent.handle_message(SENDER, "a").await;
        agent.handle_message(SENDER, "d").await;
        let replies = agent.handle_message(SENDER, "c").await;

        assert_eq!(replies.len(), 3);
        assert!(replies[0].contains("Quiz concluído! Você tem agora 25 pontos."));
        assert!(replies[1].starts_with("*Title intro - Why*"));
        assert_eq!(replies[2], messages::CALL_TO_ACTION);

        let state = snapshot(&agent).await;
        assert!(state.quiz.is_none());
        assert_eq!(state.points.get(), 25);
        assert_eq!(state.cursor, at(0, 1));
        assert_eq!(state.context, Context::PresentingContent);
    }

    #[tokio::test]
    async fn test_wrong_answer_names_correct_option() {
        let agent = agent();
        seed(&agent, at(0, 0), 0).await;

        agent.handle_message(SENDER, "quiz").await;
        let replies = agent.handle_message(SENDER, "c").await;
        assert!(replies[0].contains("resposta correta é: a"));
        assert_eq!(snapshot(&agent).await.points.get(), 0);
    }

    #[tokio::test]
    async fn test_quiz_generation_failure_changes_nothing() {
        let agent = agent_failing("QUIZ");
        seed(&agent, at(1, 0), 0).await;

        let replies = agent.handle_message(SENDER, "quiz").await;
        assert_eq!(replies, vec![messages::QUIZ_UNAVAILABLE.to_string()]);

        let state = snapshot(&agent).await;
        assert_eq!(state.context, Context::PresentingContent);
        assert!(state.quiz.is_none());
        assert_eq!(state.cursor, at(1, 0));
    }

    #[tokio::test]
    async fn test_unparsable_quiz_is_a_failure() {
        let mut llm = MockLLMClient::new();
        llm.expect_generate_text().returning(|prompt| {
            if prompt.starts_with("QUIZ") {
                Ok("Pergunta 1: sem opções".to_string())
            } else {
                fake_reply(prompt)
            }
        });
        let agent = agent_with(llm);
        seed(&agent, at(0, 0), 0).await;

        let replies = agent.handle_message(SENDER, "quiz").await;
        assert_eq!(replies, vec![messages::QUIZ_UNAVAILABLE.to_string()]);
        assert_eq!(snapshot(&agent).await.context, Context::PresentingContent);
    }

    #[tokio::test]
    async fn test_continue_during_quiz_abandons_session() {
        let agent = agent();
        seed(&agent, at(0, 0), 0).await;

        agent.handle_message(SENDER, "quiz").await;
        agent.handle_message(SENDER, "continuar").await;

        let state = snapshot(&agent).await;
        assert!(state.quiz.is_none());
        assert_eq!(state.context, Context::PresentingContent);
        assert_eq!(state.cursor, at(0, 1));
    }

    #[tokio::test]
    async fn test_mentoring_redemption_at_mentoring_module() {
        let agent = agent();
        seed(&agent, at(2, 0), 60).await;

        let replies = agent.handle_message(SENDER, "mentoria").await;
        assert_eq!(replies, vec![messages::mentoring_redeemed(10)]);
        assert_eq!(snapshot(&agent).await.points.get(), 10);

        let replies = agent.handle_message(SENDER, "mentoria").await;
        assert_eq!(replies, vec![messages::mentoring_insufficient(10, MENTORING_COST)]);
        assert_eq!(snapshot(&agent).await.points.get(), 10);
    }

    #[tokio::test]
    async fn test_mentoring_not_yet_available() {
        let agent = agent();
        seed(&agent, at(1, 0), 20).await;

        let replies = agent.handle_message(SENDER, "Mentoria").await;
        assert_eq!(replies, vec![messages::MENTORING_NOT_YET.to_string()]);
        assert_eq!(snapshot(&agent).await.points.get(), 20);
    }

    #[tokio::test]
    async fn test_points_and_progress_are_read_only() {
        let agent = agent();
        seed(&agent, at(0, 1), 30).await;

        let replies = agent.handle_message(SENDER, "pontos").await;
        assert_eq!(replies, vec![messages::points(30)]);

        let replies = agent.handle_message(SENDER, "módulo").await;
        assert_eq!(
            replies,
            vec![messages::progress("Title intro", Some((2, 2, "Why")), 30)]
        );

        let replies = agent.handle_message(SENDER, "ajuda").await;
        assert_eq!(replies, vec![messages::HELP.to_string()]);

        let state = snapshot(&agent).await;
        assert_eq!(state.points.get(), 30);
        assert_eq!(state.cursor, at(0, 1));
        assert_eq!(state.context, Context::PresentingContent);
    }

    #[tokio::test]
    async fn test_free_text_switches_to_free_interaction() {
        let agent = agent();
        seed(&agent, at(0, 0), 0).await;

        let replies = agent.handle_message(SENDER, "O que é um MVP?").await;
        assert_eq!(replies, vec!["free answer".to_string()]);

        let state = snapshot(&agent).await;
        assert_eq!(state.context, Context::FreeInteraction);
        let entries: Vec<_> = state.transcript.entries().cloned().collect();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].speaker, Speaker::Student);
        assert_eq!(entries[0].text, "O que é um MVP?");
        assert_eq!(entries[1].text, "free answer");

        // Continuing from free interaction resumes the course.
        agent.handle_message(SENDER, "continuar").await;
        assert_eq!(snapshot(&agent).await.context, Context::PresentingContent);
    }

    #[tokio::test]
    async fn test_free_response_failure_changes_nothing() {
        let agent = agent_failing("FREE");
        seed(&agent, at(0, 0), 0).await;

        let replies = agent.handle_message(SENDER, "O que é um MVP?").await;
        assert_eq!(replies.len(), 1);
        assert!(messages::GENERATION_ERRORS.contains(&replies[0].as_str()));

        let state = snapshot(&agent).await;
        assert_eq!(state.context, Context::PresentingContent);
        assert!(state.transcript.is_empty());
    }

    #[tokio::test]
    async fn test_unexpected_error_yields_generic_failure() {
        let agent = agent();
        seed(&agent, at(42, 0), 0).await;

        let replies = agent.handle_message(SENDER, "quiz").await;
        assert_eq!(replies, vec![messages::GENERIC_FAILURE.to_string()]);
    }

    #[tokio::test]
    async fn test_module_order_is_monotonic() {
        let agent = agent();
        seed(&agent, at(0, 0), 0).await;

        let script = [
            "continuar", "quiz", "a", "b", "c", "pergunta livre", "continuar", "quiz", "x",
            "continuar", "continuar", "mentoria", "continuar", "continuar", "pontos",
        ];
        let mut last_module = 0;
        for body in script {
            agent.handle_message(SENDER, body).await;
            let state = snapshot(&agent).await;
            assert!(state.cursor.module >= last_module, "regressed on {:?}", body);
            let len = agent.catalog().module(state.cursor.module).unwrap().submodules.len();
            assert!(state.cursor.submodule <= len);
            if let Some(quiz) = &state.quiz {
                assert!(quiz.answers().len() < quiz.questions().len());
            }
            last_module = state.cursor.module;
        }
        assert_eq!(snapshot(&agent).await.context, Context::Completed);
    }

    #[tokio::test]
    async fn test_senders_are_independent() {
        let agent = Arc::new(agent());
        let a = tokio::spawn({
            let agent = agent.clone();
            async move { agent.handle_message("a", "Oi").await }
        });
        let b = tokio::spawn({
            let agent = agent.clone();
            async move { agent.handle_message("b", "Olá").await }
        });
        assert_eq!(a.await.unwrap().len(), 2);
        assert_eq!(b.await.unwrap().len(), 2);
        assert_eq!(agent.store().len(), 2);
    }
}

//! services/app/src/intake/controller.rs
//!
//! Drives the questionnaire as a two-party conversation. Answers are validated
//! and recorded synchronously; the system's replies appear after a pause run by
//! a background task, during which input is refused.
//!
//!   Idle --start--> Presenting --delay--> AwaitingInput --answer--> Presenting ...
//!   ... last answer --> Presenting --delays--> Completed

use adoption_core::domain::{Message, Sender};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::format;
use super::script::{self, AnswerRecord, AnswerValue, InputFormat, IntakeSeed, Question, QuestionKind};
use super::{IntakeError, IntakeSubmission, IntakeTiming};

pub const COMPLETION_MESSAGE: &str =
    "Obrigado! Recebemos suas respostas e já podemos procurar o pet ideal para você.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntakeStatus {
    /// `start` has not been called.
    Idle,
    /// The system is "typing"; submissions are refused.
    Presenting,
    AwaitingInput,
    /// Input is replaced by the finish action.
    Completed,
}

/// What happened to a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Recorded; the next message is on its way.
    Accepted,
    /// Not a valid option, or a phone/amount without digits. A correction was
    /// added to the transcript and the same question is still open; the UI
    /// should clear the input.
    Rejected,
    /// Blank input, nothing happened.
    Ignored,
    /// Input is disabled right now.
    Busy,
}

/// Notifications for the UI layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntakeEvent {
    Typing(bool),
    Message(Message),
    StatusChanged(IntakeStatus),
}

enum Step {
    Ask(Question),
    Complete,
}

struct IntakeState {
    status: IntakeStatus,
    current: usize,
    answers: AnswerRecord,
    transcript: Vec<Message>,
    next_id: u64,
    events: mpsc::UnboundedSender<IntakeEvent>,
}

impl IntakeState {
    fn emit(&self, event: IntakeEvent) {
        // Nobody listening is fine; the transcript is the source of truth.
        let _ = self.events.send(event);
    }

    fn push(&mut self, sender: Sender, text: impl Into<String>) {
        self.next_id += 1;
        let message = Message {
            id: self.next_id,
            text: text.into(),
            sender,
            timestamp: Utc::now(),
        };
        self.transcript.push(message.clone());
        self.emit(IntakeEvent::Message(message));
    }

    fn set_status(&mut self, status: IntakeStatus) {
        if self.status != status {
            self.status = status;
            self.emit(IntakeEvent::StatusChanged(status));
        }
    }

    fn begin_presenting(&mut self) {
        self.set_status(IntakeStatus::Presenting);
        self.emit(IntakeEvent::Typing(true));
    }
}

/// Sleeps unless the controller is torn down first. Returns `false` on teardown.
async fn pause(token: &CancellationToken, duration: std::time::Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}

fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}

fn parse_choice(raw: &str, option_count: usize) -> Option<u8> {
    let n = raw.trim().parse::<usize>().ok()?;
    if (1..=option_count).contains(&n) {
        u8::try_from(n).ok()
    } else {
        None
    }
}

pub struct IntakeController {
    state: Arc<Mutex<IntakeState>>,
    timing: IntakeTiming,
    pending: Mutex<Option<JoinHandle<()>>>,
    cancellation_token: CancellationToken,
}

impl IntakeController {
    /// Creates an idle controller and the channel its UI events arrive on.
    pub fn new(timing: IntakeTiming) -> (Self, mpsc::UnboundedReceiver<IntakeEvent>) {
        let (events, receiver) = mpsc::unbounded_channel();
        let state = IntakeState {
            status: IntakeStatus::Idle,
            current: 0,
            answers: AnswerRecord::default(),
            transcript: Vec::new(),
            next_id: 0,
            events,
        };
        let controller = Self {
            state: Arc::new(Mutex::new(state)),
            timing,
            pending: Mutex::new(None),
            cancellation_token: CancellationToken::new(),
        };
        (controller, receiver)
    }

    /// Seeds the record with what signup already knows and opens the
    /// conversation. The first question appears after the typing pause.
    pub async fn start(&self, seed: IntakeSeed) -> Result<(), IntakeError> {
        let first = {
            let mut state = self.state.lock().await;
            if state.status != IntakeStatus::Idle {
                return Err(IntakeError::AlreadyStarted);
            }

            state.answers = AnswerRecord::from_seed(&seed);
            let first = script::resolve(0, &state.answers)?;
            state.push(
                Sender::System,
                format!(
                    "Olá, {}! Vou fazer algumas perguntas para encontrarmos o pet ideal para você.",
                    first_name(&seed.name)
                ),
            );
            state.begin_presenting();
            first
        };

        info!(email = %seed.email, "Intake form started.");
        self.schedule(Step::Ask(first)).await;
        Ok(())
    }

    pub async fn submit_answer(&self, raw: &str) -> Result<SubmitOutcome, IntakeError> {
        let step = {
            let mut state = self.state.lock().await;
            match state.status {
                IntakeStatus::AwaitingInput => {}
                IntakeStatus::Idle => return Err(IntakeError::NotStarted),
                IntakeStatus::Presenting | IntakeStatus::Completed => {
                    debug!("Answer refused while input is disabled.");
                    return Ok(SubmitOutcome::Busy);
                }
            }

            if raw.trim().is_empty() {
                return Ok(SubmitOutcome::Ignored);
            }

            let question = script::resolve(state.current, &state.answers)?;
            let value = match &question.kind {
                QuestionKind::SingleChoice(options) => match parse_choice(raw, options.len()) {
                    Some(n) => AnswerValue::Choice(n),
                    None => {
                        state.push(
                            Sender::System,
                            format!(
                                "Por favor, digite um número entre 1 e {}.",
                                options.len()
                            ),
                        );
                        return Ok(SubmitOutcome::Rejected);
                    }
                },
                QuestionKind::FreeText => match question.format {
                    InputFormat::Phone | InputFormat::Currency => {
                        let digits = format::digits(raw);
                        if digits.is_empty() {
                            let hint = if question.format == InputFormat::Phone {
                                "Por favor, digite um telefone com DDD usando apenas números."
                            } else {
                                "Por favor, digite um valor em reais usando apenas números."
                            };
                            state.push(Sender::System, hint);
                            return Ok(SubmitOutcome::Rejected);
                        }
                        AnswerValue::Digits(digits)
                    }
                    InputFormat::None => AnswerValue::Text(raw.to_string()),
                },
            };

            // Resolve what comes next against the updated record before showing
            // anything, so a broken branch leaves the conversation untouched.
            let mut answers = state.answers.clone();
            answers.record(question.key, value)?;
            let next = question.ordinal + 1;
            let step = if next < script::QUESTION_COUNT {
                Step::Ask(script::resolve(next, &answers)?)
            } else {
                Step::Complete
            };

            state.push(Sender::User, raw);
            state.answers = answers;
            state.begin_presenting();
            debug!(key = question.key.as_str(), "Answer recorded.");
            step
        };

        self.schedule(step).await;
        Ok(SubmitOutcome::Accepted)
    }

    /// Applies the open question's input mask to what the user has typed so far.
    pub async fn format_input(&self, text: &str) -> String {
        let state = self.state.lock().await;
        match script::resolve(state.current, &state.answers) {
            Ok(question) => format::apply(question.format, text),
            Err(_) => text.to_string(),
        }
    }

    /// The finished record. Only available once the conversation is over.
    pub async fn finish(&self) -> Result<IntakeSubmission, IntakeError> {
        let state = self.state.lock().await;
        if state.status != IntakeStatus::Completed {
            return Err(IntakeError::NotCompleted);
        }
        info!(email = %state.answers.email, "Intake form finished.");
        Ok(state.answers.clone())
    }

    /// Waits for the pause currently running, if any.
    pub async fn settle(&self) {
        let handle = self.pending.lock().await.take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }

    /// Stops the pending pause for good; no further system messages appear.
    pub fn cancel(&self) {
        self.cancellation_token.cancel();
    }

    pub async fn status(&self) -> IntakeStatus {
        self.state.lock().await.status
    }

    pub async fn current_index(&self) -> usize {
        self.state.lock().await.current
    }

    /// The open question, once one has been shown.
    pub async fn current_question(&self) -> Option<Question> {
        let state = self.state.lock().await;
        if state.status == IntakeStatus::Idle {
            return None;
        }
        script::resolve(state.current, &state.answers).ok()
    }

    pub async fn transcript(&self) -> Vec<Message> {
        self.state.lock().await.transcript.clone()
    }

    pub async fn answers(&self) -> AnswerRecord {
        self.state.lock().await.answers.clone()
    }

    async fn schedule(&self, step: Step) {
        let state_lock = self.state.clone();
        let timing = self.timing;
        let token = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            match step {
                Step::Ask(question) => {
                    if !pause(&token, timing.typing).await {
                        return;
                    }
                    let mut state = state_lock.lock().await;
                    state.current = question.ordinal;
                    state.emit(IntakeEvent::Typing(false));
                    state.push(Sender::System, question.render());
                    state.set_status(IntakeStatus::AwaitingInput);
                }
                Step::Complete => {
                    if !pause(&token, timing.completion).await {
                        return;
                    }
                    {
                        let mut state = state_lock.lock().await;
                        state.emit(IntakeEvent::Typing(false));
                        state.push(Sender::System, COMPLETION_MESSAGE);
                    }
                    if !pause(&token, timing.finish).await {
                        return;
                    }
                    state_lock.lock().await.set_status(IntakeStatus::Completed);
                    info!("Intake conversation completed.");
                }
            }
        });

        *self.pending.lock().await = Some(handle);
    }
}

impl Drop for IntakeController {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

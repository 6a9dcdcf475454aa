//! services/app/src/intake/mod.rs
//!
//! The conversational adoption questionnaire shown right after signup.

pub mod controller;
pub mod format;
pub mod script;

pub use controller::{IntakeController, IntakeEvent, IntakeStatus, SubmitOutcome};
pub use script::{
    AnswerKey, AnswerRecord, AnswerValue, HousingType, InputFormat, IntakeSeed, Question,
    QuestionKind, SpeciesPreference, QUESTION_COUNT,
};

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeError {
    #[error("validation error: {0}")]
    Validation(String),
    /// A question depends on an answer that has not been recorded.
    #[error("question depends on '{}' which has no answer", .0.as_str())]
    UnresolvedBranch(AnswerKey),
    #[error("no question with ordinal {0}")]
    NoSuchQuestion(usize),
    #[error("the form has not been started")]
    NotStarted,
    #[error("the form was already started")]
    AlreadyStarted,
    #[error("the form is not finished yet")]
    NotCompleted,
}

/// What a finished conversation hands to onboarding: the signup seed plus every
/// answer.
pub type IntakeSubmission = AnswerRecord;

/// Pauses of the simulated conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntakeTiming {
    /// Between "system starts typing" and the message appearing.
    pub typing: Duration,
    /// Between the last answer and the closing message.
    pub completion: Duration,
    /// Between the closing message and the finish action becoming available.
    pub finish: Duration,
}

impl Default for IntakeTiming {
    fn default() -> Self {
        Self {
            typing: Duration::from_millis(1000),
            completion: Duration::from_millis(1000),
            finish: Duration::from_millis(1500),
        }
    }
}

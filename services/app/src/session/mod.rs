//! services/app/src/session/mod.rs
//!
//! Everything about "who is logged in": the local session manager backed by the
//! key-value store, and the alternate remote authentication pathway.

pub mod manager;
pub mod remote;
mod storage;

pub use manager::{PasswordPolicy, SessionManager, SessionPhase, SessionSnapshot};
pub use remote::RemoteAuth;
pub use storage::keys;

/// Failures of session operations. The `Display` text is short and meant to be
/// shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("Este email já está cadastrado")]
    DuplicateEmail,
    #[error("Email ou senha inválidos")]
    InvalidCredentials,
    #[error("Nenhum usuário logado")]
    NotAuthenticated,
    #[error("Email não encontrado")]
    EmailNotFound,
    /// The underlying cause is logged where it happened, never shown.
    #[error("Não foi possível acessar seus dados. Tente novamente.")]
    StorageFailure,
    /// The remote API refused the request; carries its explanation.
    #[error("{0}")]
    Remote(String),
}

pub type SessionResult<T> = Result<T, SessionError>;

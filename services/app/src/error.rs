//! services/app/src/error.rs
//!
//! Defines the primary error type for the entire app service.

use crate::catalog::CatalogError;
use crate::config::ConfigError;
use crate::intake::IntakeError;
use crate::session::SessionError;
use adoption_core::ports::PortError;

/// The primary error type for the `app` service.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Represents an error that occurred during configuration loading.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Represents an error that propagated up from one of the core service ports.
    #[error("Service Port Error: {0}")]
    Port(#[from] PortError),

    /// A session operation failed; the message is already user facing.
    #[error("{0}")]
    Session(#[from] SessionError),

    #[error("Intake form error: {0}")]
    Intake(#[from] IntakeError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// Represents a standard Input/Output error (e.g., reading the terminal).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A catch-all for any other unexpected errors.
    #[error("An unexpected internal error occurred: {0}")]
    Internal(String),
}

//! crates/adoption_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete key-value store, the remote REST API and the
//! UI collaborators (alerts, navigation).

use crate::domain::{Animal, AuthSnapshot};
use async_trait::async_trait;
use std::fmt;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., disk, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
    /// The remote side refused the request and explained why.
    #[error("{0}")]
    Rejected(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Persistence
//=========================================================================================

/// Asynchronous string-keyed storage. Values are serialized records (JSON).
#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Returns `None` when the key was never written or has been removed.
    async fn get(&self, key: &str) -> PortResult<Option<String>>;

    async fn set(&self, key: &str, value: String) -> PortResult<()>;

    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> PortResult<()>;
}

//=========================================================================================
// Remote REST collaborators
//=========================================================================================

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /auth/login`
    async fn login(&self, email: &str, password: &str) -> PortResult<AuthSnapshot>;

    /// `POST /auth/register`
    async fn register(&self, name: &str, email: &str, password: &str) -> PortResult<AuthSnapshot>;
}

#[cfg_attr(feature = "testing", mockall::automock)]
#[async_trait]
pub trait AnimalSource: Send + Sync {
    /// Fetches every animal currently listed.
    async fn fetch_all(&self) -> PortResult<Vec<Animal>>;
}

//=========================================================================================
// UI collaborators
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Error,
    Info,
    Confirm,
}

/// A modal the presenter should display. The core never inspects what the user
/// did with it beyond invoking `on_confirm`.
pub struct Alert {
    pub kind: AlertKind,
    pub title: String,
    pub message: String,
    pub on_confirm: Option<Box<dyn FnOnce() + Send>>,
}

impl Alert {
    pub fn new(kind: AlertKind, title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            title: title.into(),
            message: message.into(),
            on_confirm: None,
        }
    }

    pub fn on_confirm(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_confirm = Some(Box::new(callback));
        self
    }
}

impl fmt::Debug for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Alert")
            .field("kind", &self.kind)
            .field("title", &self.title)
            .field("message", &self.message)
            .field("on_confirm", &self.on_confirm.is_some())
            .finish()
    }
}

#[cfg_attr(feature = "testing", mockall::automock)]
pub trait Presenter: Send + Sync {
    fn show(&self, alert: Alert);
}

/// Fire-and-forget navigation requests.
#[cfg_attr(feature = "testing", mockall::automock)]
pub trait Navigator: Send + Sync {
    fn replace(&self, route: &str);
    fn push(&self, route: &str);
    fn back(&self);
}

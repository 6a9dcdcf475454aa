//! services/app/src/lib.rs
//!
//! The adoption app service: session management, the intake conversation, the
//! animal catalog and the onboarding funnel, plus the adapters that connect them
//! to disk, the REST API and the terminal.

pub mod adapters;
pub mod catalog;
pub mod config;
pub mod error;
pub mod intake;
pub mod onboarding;
pub mod session;

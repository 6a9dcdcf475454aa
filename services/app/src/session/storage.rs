//! Typed JSON access on top of the raw `KeyValueStore` port.

use adoption_core::ports::{KeyValueStore, PortError, PortResult};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Fixed storage keys.
pub mod keys {
    pub const CURRENT_USER: &str = "current_user";
    pub const USERS: &str = "users";
    /// user id -> argon2 hash, only written when password verification is on.
    pub const USER_CREDENTIALS: &str = "user_credentials";
    pub const AUTH_TOKEN: &str = "auth_token";
    pub const AUTH_USER: &str = "auth_user";
}

pub(crate) async fn load<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> PortResult<Option<T>> {
    match store.get(key).await? {
        None => Ok(None),
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| PortError::Unexpected(format!("corrupt value under '{}': {}", key, e))),
    }
}

pub(crate) async fn save<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> PortResult<()> {
    let raw = serde_json::to_string(value)
        .map_err(|e| PortError::Unexpected(format!("cannot serialize '{}': {}", key, e)))?;
    store.set(key, raw).await
}

//! services/app/src/session/remote.rs
//!
//! The alternate authentication pathway: credentials go to the remote API and
//! the returned token and user summary are kept in the key-value store.

use adoption_core::domain::{AuthSnapshot, RemoteUser};
use adoption_core::ports::{AuthApi, KeyValueStore, PortError};
use std::sync::Arc;
use tracing::{error, info};

use super::storage::{keys, load, save};
use super::{SessionError, SessionResult};

fn api_failure(e: PortError) -> SessionError {
    match e {
        PortError::Rejected(message) => SessionError::Remote(message),
        PortError::Unauthorized => SessionError::InvalidCredentials,
        other => {
            error!("Remote auth call failed: {:?}", other);
            SessionError::Remote(crate::adapters::http::GENERIC_FAILURE.to_string())
        }
    }
}

fn storage_failure(e: PortError) -> SessionError {
    error!("Remote auth storage failure: {:?}", e);
    SessionError::StorageFailure
}

pub struct RemoteAuth {
    api: Arc<dyn AuthApi>,
    store: Arc<dyn KeyValueStore>,
}

impl RemoteAuth {
    pub fn new(api: Arc<dyn AuthApi>, store: Arc<dyn KeyValueStore>) -> Self {
        Self { api, store }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> SessionResult<RemoteUser> {
        let snapshot = self.api.login(email, password).await.map_err(api_failure)?;
        self.keep(snapshot).await
    }

    pub async fn sign_up(&self, name: &str, email: &str, password: &str) -> SessionResult<RemoteUser> {
        let snapshot = self
            .api
            .register(name, email, password)
            .await
            .map_err(api_failure)?;
        self.keep(snapshot).await
    }

    pub async fn sign_out(&self) -> SessionResult<()> {
        self.store
            .remove(keys::AUTH_TOKEN)
            .await
            .map_err(storage_failure)?;
        self.store
            .remove(keys::AUTH_USER)
            .await
            .map_err(storage_failure)?;
        info!("Remote session cleared.");
        Ok(())
    }

    pub async fn token(&self) -> SessionResult<Option<String>> {
        load::<String>(self.store.as_ref(), keys::AUTH_TOKEN)
            .await
            .map_err(storage_failure)
    }

    pub async fn user(&self) -> SessionResult<Option<RemoteUser>> {
        load::<RemoteUser>(self.store.as_ref(), keys::AUTH_USER)
            .await
            .map_err(storage_failure)
    }

    pub async fn is_signed_in(&self) -> bool {
        matches!(self.token().await, Ok(Some(_)))
    }

    async fn keep(&self, snapshot: AuthSnapshot) -> SessionResult<RemoteUser> {
        save(self.store.as_ref(), keys::AUTH_TOKEN, &snapshot.token)
            .await
            .map_err(storage_failure)?;
        save(self.store.as_ref(), keys::AUTH_USER, &snapshot.user)
            .await
            .map_err(storage_failure)?;
        info!(user_id = %snapshot.user.id, "Remote session stored.");
        Ok(snapshot.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::MemoryStore;
    use adoption_core::ports::MockAuthApi;

    fn snapshot() -> AuthSnapshot {
        AuthSnapshot {
            token: "tok-123".into(),
            user: RemoteUser {
                id: "42".into(),
                name: "Ana".into(),
                email: "ana@x.com".into(),
            },
        }
    }

    #[tokio::test]
    async fn sign_in_persists_token_and_user() {
        let mut api = MockAuthApi::new();
        api.expect_login()
            .withf(|email, password| email == "ana@x.com" && password == "pwd123")
            .times(1)
            .returning(|_, _| Ok(snapshot()));

        let auth = RemoteAuth::new(Arc::new(api), Arc::new(MemoryStore::new()));
        let user = auth.sign_in("ana@x.com", "pwd123").await.unwrap();

        assert_eq!(user.id, "42");
        assert_eq!(auth.token().await.unwrap().as_deref(), Some("tok-123"));
        assert_eq!(auth.user().await.unwrap(), Some(snapshot().user));
        assert!(auth.is_signed_in().await);
    }

    #[tokio::test]
    async fn rejection_message_reaches_the_caller() {
        let mut api = MockAuthApi::new();
        api.expect_register()
            .returning(|_, _, _| Err(PortError::Rejected("Email já cadastrado".into())));

        let store = Arc::new(MemoryStore::new());
        let auth = RemoteAuth::new(Arc::new(api), store.clone());
        let err = auth.sign_up("Ana", "ana@x.com", "pwd123").await.unwrap_err();

        assert_eq!(err.to_string(), "Email já cadastrado");
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn sign_out_clears_both_keys() {
        let mut api = MockAuthApi::new();
        api.expect_login().returning(|_, _| Ok(snapshot()));

        let auth = RemoteAuth::new(Arc::new(api), Arc::new(MemoryStore::new()));
        auth.sign_in("ana@x.com", "pwd123").await.unwrap();
        auth.sign_out().await.unwrap();

        assert!(!auth.is_signed_in().await);
        assert_eq!(auth.user().await.unwrap(), None);
    }
}

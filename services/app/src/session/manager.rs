//! services/app/src/session/manager.rs
//!
//! The session manager owns the authenticated-user lifecycle. It is created once
//! with `restore`, handed to whoever needs it (screens, the onboarding funnel),
//! and publishes every state change through a `watch` channel.
//!
//! Persistence layout: the whole user collection lives under one key and the
//! current user under another. Every mutation is a read-modify-write of the
//! collection, serialized by `write_lock` so two updates issued from the same
//! manager cannot overwrite each other.

use adoption_core::domain::{User, UserPatch};
use adoption_core::ports::{KeyValueStore, PortError};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::storage::{keys, load, save};
use super::{SessionError, SessionResult};

//=========================================================================================
// Session state
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    #[default]
    Anonymous,
    Authenticating,
    Authenticated,
    LoggingOut,
}

/// What observers see: who is logged in and whether an operation is running.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionSnapshot {
    pub phase: SessionPhase,
    pub user: Option<User>,
    pub loading: bool,
}

impl SessionSnapshot {
    /// The phase an idle session rests in.
    fn settled_phase(&self) -> SessionPhase {
        if self.user.is_some() {
            SessionPhase::Authenticated
        } else {
            SessionPhase::Anonymous
        }
    }
}

/// How `login` treats the password.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordPolicy {
    /// Presence of the email is enough; the password is ignored.
    #[default]
    EmailOnly,
    /// Registration stores an argon2 hash and login verifies against it.
    Argon2,
}

impl PasswordPolicy {
    pub fn from_flag(verify_passwords: bool) -> Self {
        if verify_passwords {
            Self::Argon2
        } else {
            Self::EmailOnly
        }
    }
}

/// Holds `loading` (and optionally a transitional phase) for the lifetime of one
/// operation. The last guard to drop settles the session whatever the outcome
/// was; overlapping operations keep `loading` up until all of them finish.
struct Busy<'a> {
    state: &'a watch::Sender<SessionSnapshot>,
    in_flight: &'a AtomicUsize,
}

impl<'a> Busy<'a> {
    fn enter(
        state: &'a watch::Sender<SessionSnapshot>,
        in_flight: &'a AtomicUsize,
        phase: Option<SessionPhase>,
    ) -> Self {
        // The counter only changes inside `send_modify`, which holds the value lock.
        state.send_modify(|s| {
            in_flight.fetch_add(1, Ordering::Relaxed);
            s.loading = true;
            if let Some(phase) = phase {
                s.phase = phase;
            }
        });
        Self { state, in_flight }
    }
}

impl Drop for Busy<'_> {
    fn drop(&mut self) {
        let in_flight = self.in_flight;
        self.state.send_modify(|s| {
            if in_flight.fetch_sub(1, Ordering::Relaxed) == 1 {
                s.loading = false;
                s.phase = s.settled_phase();
            }
        });
    }
}

fn same_email(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn storage_failure(context: &'static str) -> impl FnOnce(PortError) -> SessionError {
    move |e| {
        error!("Session storage failure while {}: {:?}", context, e);
        SessionError::StorageFailure
    }
}

//=========================================================================================
// SessionManager
//=========================================================================================

pub struct SessionManager {
    store: Arc<dyn KeyValueStore>,
    policy: PasswordPolicy,
    state: watch::Sender<SessionSnapshot>,
    in_flight: AtomicUsize,
    write_lock: Mutex<()>,
}

impl SessionManager {
    /// Starts a session from whatever current-user pointer was persisted.
    /// An unreadable pointer is logged and the session starts anonymous.
    pub async fn restore(store: Arc<dyn KeyValueStore>, policy: PasswordPolicy) -> Self {
        let user = match load::<User>(store.as_ref(), keys::CURRENT_USER).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Could not restore the persisted session: {:?}", e);
                None
            }
        };

        let snapshot = SessionSnapshot {
            phase: if user.is_some() {
                SessionPhase::Authenticated
            } else {
                SessionPhase::Anonymous
            },
            user,
            loading: false,
        };
        if let Some(user) = &snapshot.user {
            info!(user_id = %user.id, "Session restored.");
        }

        let (state, _) = watch::channel(snapshot);
        Self {
            store,
            policy,
            state,
            in_flight: AtomicUsize::new(0),
            write_lock: Mutex::new(()),
        }
    }

    /// Ends this session object's lifetime. Persisted data is left untouched.
    pub fn teardown(&self) {
        self.state.send_replace(SessionSnapshot::default());
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn phase(&self) -> SessionPhase {
        self.state.borrow().phase
    }

    // --- Operations ---

    pub async fn register(
        &self,
        name: &str,
        email: &str,
        cpf: Option<&str>,
        password: &str,
    ) -> SessionResult<User> {
        let _busy = Busy::enter(
            &self.state,
            &self.in_flight,
            Some(SessionPhase::Authenticating),
        );
        let _guard = self.write_lock.lock().await;

        let mut users = self.load_users().await?;
        if users.iter().any(|u| same_email(&u.email, email)) {
            warn!(email, "Registration refused: email already registered.");
            return Err(SessionError::DuplicateEmail);
        }

        let user = User::new(
            Uuid::now_v7().to_string(),
            name.trim(),
            email.trim(),
            cpf.map(str::trim).filter(|c| !c.is_empty()).map(str::to_string),
            Utc::now(),
        );

        users.push(user.clone());
        save(self.store.as_ref(), keys::USERS, &users)
            .await
            .map_err(storage_failure("saving the user collection"))?;
        if self.policy == PasswordPolicy::Argon2 {
            self.store_password(&user.id, password).await?;
        }
        self.persist_current(&user).await?;

        info!(user_id = %user.id, "User registered.");
        Ok(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> SessionResult<User> {
        let _busy = Busy::enter(
            &self.state,
            &self.in_flight,
            Some(SessionPhase::Authenticating),
        );

        let user = self
            .load_users()
            .await?
            .into_iter()
            .find(|u| same_email(&u.email, email))
            .ok_or_else(|| {
                warn!(email, "Login refused: unknown email.");
                SessionError::InvalidCredentials
            })?;

        if self.policy == PasswordPolicy::Argon2 {
            self.verify_password(&user.id, password).await?;
        }

        self.persist_current(&user).await?;
        info!(user_id = %user.id, "User logged in.");
        Ok(user)
    }

    pub async fn logout(&self) -> SessionResult<()> {
        let _busy = Busy::enter(
            &self.state,
            &self.in_flight,
            Some(SessionPhase::LoggingOut),
        );

        self.store
            .remove(keys::CURRENT_USER)
            .await
            .map_err(storage_failure("clearing the current user"))?;
        self.state.send_modify(|s| s.user = None);

        info!("User logged out.");
        Ok(())
    }

    /// Shallow-merges `patch` into the current user and writes the result to both
    /// the collection and the current-user pointer.
    pub async fn update_profile(&self, patch: UserPatch) -> SessionResult<User> {
        self.update_with(|_| patch).await
    }

    /// Confirms the email is registered. Nothing is changed or sent.
    pub async fn reset_password(&self, email: &str) -> SessionResult<()> {
        let _busy = Busy::enter(&self.state, &self.in_flight, None);

        let users = self.load_users().await?;
        if !users.iter().any(|u| same_email(&u.email, email)) {
            return Err(SessionError::EmailNotFound);
        }

        info!(email, "Password reset requested.");
        Ok(())
    }

    /// Adds the animal to the current user's favorites, or removes it when it is
    /// already there. Returns `false` when nobody is logged in or saving failed.
    pub async fn toggle_favorite(&self, animal_id: &str) -> bool {
        let result = self
            .update_with(|user| {
                let mut favorites = user.favorites.clone();
                if !favorites.remove(animal_id) {
                    favorites.insert(animal_id.to_string());
                }
                UserPatch::favorites(favorites)
            })
            .await;

        match result {
            Ok(_) => true,
            Err(SessionError::NotAuthenticated) => false,
            Err(e) => {
                warn!(animal_id, "Could not toggle favorite: {}", e);
                false
            }
        }
    }

    // --- Helpers ---

    /// Builds a patch from the current user and applies it. The user is read
    /// under `write_lock`, so overlapping updates see each other's result.
    async fn update_with<F>(&self, make_patch: F) -> SessionResult<User>
    where
        F: FnOnce(&User) -> UserPatch,
    {
        let _busy = Busy::enter(&self.state, &self.in_flight, None);
        let _guard = self.write_lock.lock().await;
        let mut merged = self.current_user().ok_or(SessionError::NotAuthenticated)?;
        let patch = make_patch(&merged);

        let mut users = self.load_users().await?;
        if let Some(email) = &patch.email {
            if users
                .iter()
                .any(|u| u.id != merged.id && same_email(&u.email, email))
            {
                warn!(email = %email, "Profile update refused: email already registered.");
                return Err(SessionError::DuplicateEmail);
            }
        }

        merged.apply(patch);
        match users.iter_mut().find(|u| u.id == merged.id) {
            Some(slot) => *slot = merged.clone(),
            None => users.push(merged.clone()),
        }

        save(self.store.as_ref(), keys::USERS, &users)
            .await
            .map_err(storage_failure("saving the user collection"))?;
        self.persist_current(&merged).await?;

        info!(user_id = %merged.id, "Profile updated.");
        Ok(merged)
    }

    async fn load_users(&self) -> SessionResult<Vec<User>> {
        load::<Vec<User>>(self.store.as_ref(), keys::USERS)
            .await
            .map(Option::unwrap_or_default)
            .map_err(storage_failure("loading the user collection"))
    }

    async fn persist_current(&self, user: &User) -> SessionResult<()> {
        save(self.store.as_ref(), keys::CURRENT_USER, user)
            .await
            .map_err(storage_failure("saving the current user"))?;
        self.state.send_modify(|s| s.user = Some(user.clone()));
        Ok(())
    }

    async fn store_password(&self, user_id: &str, password: &str) -> SessionResult<()> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                error!("Failed to hash password: {:?}", e);
                SessionError::StorageFailure
            })?
            .to_string();

        let mut credentials = load::<HashMap<String, String>>(self.store.as_ref(), keys::USER_CREDENTIALS)
            .await
            .map_err(storage_failure("loading credentials"))?
            .unwrap_or_default();
        credentials.insert(user_id.to_string(), hash);
        save(self.store.as_ref(), keys::USER_CREDENTIALS, &credentials)
            .await
            .map_err(storage_failure("saving credentials"))
    }

    async fn verify_password(&self, user_id: &str, password: &str) -> SessionResult<()> {
        let credentials = load::<HashMap<String, String>>(self.store.as_ref(), keys::USER_CREDENTIALS)
            .await
            .map_err(storage_failure("loading credentials"))?
            .unwrap_or_default();

        let stored = credentials
            .get(user_id)
            .ok_or(SessionError::InvalidCredentials)?;
        let parsed_hash = PasswordHash::new(stored).map_err(|e| {
            error!("Failed to parse password hash: {:?}", e);
            SessionError::InvalidCredentials
        })?;

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .map_err(|_| SessionError::InvalidCredentials)
    }
}

//! services/app/src/onboarding.rs
//!
//! The last step of signup: a finished intake conversation becomes a registered,
//! logged-in user, and the screen flow moves on to the home tabs.

use adoption_core::domain::{User, UserPatch};
use adoption_core::ports::{Alert, AlertKind, Navigator, Presenter};
use std::sync::Arc;
use tracing::{info, warn};

use crate::intake::IntakeSubmission;
use crate::session::{SessionManager, SessionResult};

pub mod routes {
    pub const LOGIN: &str = "/login";
    pub const SIGNUP: &str = "/signup";
    pub const CHAT_FORM: &str = "/chat-form";
    pub const HOME: &str = "/(tabs)";
}

/// Registers the user described by `submission`, copies the contact answers
/// into the profile and tells the user how it went. On success the alert's
/// confirm action takes them to the home tabs; if registration fails they stay
/// put. Once registered the account exists, so a failed profile fill is only
/// logged and the user still moves on.
pub async fn complete_onboarding(
    submission: &IntakeSubmission,
    session: &SessionManager,
    presenter: &dyn Presenter,
    navigator: Arc<dyn Navigator>,
) -> SessionResult<User> {
    let registered = match session
        .register(
            &submission.name,
            &submission.email,
            None,
            &submission.password,
        )
        .await
    {
        Ok(user) => user,
        Err(e) => {
            warn!(email = %submission.email, "Onboarding failed: {}", e);
            presenter.show(Alert::new(AlertKind::Error, "Erro", e.to_string()));
            return Err(e);
        }
    };

    let patch = UserPatch {
        phone: submission.phone.clone(),
        address: submission.address.clone(),
        ..UserPatch::default()
    };
    let user = match session.update_profile(patch).await {
        Ok(user) => user,
        Err(e) => {
            warn!(user_id = %registered.id, "Could not copy intake answers into the profile: {}", e);
            registered
        }
    };

    info!(user_id = %user.id, "Onboarding completed.");
    presenter.show(
        Alert::new(
            AlertKind::Success,
            "Cadastro concluído!",
            "Agora é só encontrar seu novo melhor amigo.",
        )
        .on_confirm(move || navigator.replace(routes::HOME)),
    );
    Ok(user)
}

/// Asks before logging out. `on_confirm` runs only if the user agrees.
pub fn confirm_logout(presenter: &dyn Presenter, on_confirm: impl FnOnce() + Send + 'static) {
    presenter.show(
        Alert::new(AlertKind::Confirm, "Sair", "Tem certeza que deseja sair da sua conta?")
            .on_confirm(on_confirm),
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStore, RouteStack};
    use crate::intake::{AnswerKey, AnswerRecord, AnswerValue, IntakeSeed};
    use crate::session::PasswordPolicy;
    use adoption_core::domain::UserType;
    use adoption_core::ports::{KeyValueStore, MockPresenter, PortError, PortResult};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// Accepts a fixed number of writes, then fails every later one.
    struct WriteBudgetStore {
        inner: MemoryStore,
        writes_left: AtomicUsize,
    }

    #[async_trait]
    impl KeyValueStore for WriteBudgetStore {
        async fn get(&self, key: &str) -> PortResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: String) -> PortResult<()> {
            let allowed = self
                .writes_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if !allowed {
                return Err(PortError::Unexpected("disk full".into()));
            }
            self.inner.set(key, value).await
        }

        async fn remove(&self, key: &str) -> PortResult<()> {
            self.inner.remove(key).await
        }
    }

    /// Keeps every alert so the test can look at it and press confirm.
    #[derive(Default)]
    struct RecordingPresenter {
        alerts: Mutex<Vec<Alert>>,
    }

    impl Presenter for RecordingPresenter {
        fn show(&self, alert: Alert) {
            self.alerts.lock().unwrap().push(alert);
        }
    }

    fn submission() -> IntakeSubmission {
        let mut answers = AnswerRecord::from_seed(&IntakeSeed {
            name: "Ana Souza".into(),
            email: "ana@x.com".into(),
            password: "pwd123".into(),
            user_type: UserType::Adotante,
        });
        answers
            .record(AnswerKey::Phone, AnswerValue::Digits("11999998888".into()))
            .unwrap();
        answers
            .record(AnswerKey::Address, AnswerValue::Text("Rua das Flores, 10".into()))
            .unwrap();
        answers
    }

    async fn session() -> SessionManager {
        SessionManager::restore(Arc::new(MemoryStore::new()), PasswordPolicy::EmailOnly).await
    }

    #[tokio::test]
    async fn success_registers_fills_profile_and_navigates_on_confirm() {
        let session = session().await;
        let presenter = RecordingPresenter::default();
        let navigator = Arc::new(RouteStack::new(routes::CHAT_FORM));

        let user = complete_onboarding(&submission(), &session, &presenter, navigator.clone())
            .await
            .unwrap();

        assert_eq!(user.phone, "11999998888");
        assert_eq!(user.address, "Rua das Flores, 10");
        assert_eq!(session.current_user(), Some(user));
        assert_eq!(navigator.current(), routes::CHAT_FORM);

        let alert = presenter.alerts.lock().unwrap().pop().unwrap();
        assert_eq!(alert.kind, AlertKind::Success);
        (alert.on_confirm.unwrap())();
        assert_eq!(navigator.current(), routes::HOME);
        assert_eq!(navigator.depth(), 1);
    }

    #[tokio::test]
    async fn duplicate_email_shows_error_and_stays() {
        let session = session().await;
        session
            .register("Outra Ana", "ana@x.com", None, "x")
            .await
            .unwrap();
        session.logout().await.unwrap();

        let mut presenter = MockPresenter::new();
        presenter
            .expect_show()
            .withf(|alert| {
                alert.kind == AlertKind::Error
                    && alert.message == "Este email já está cadastrado"
                    && alert.on_confirm.is_none()
            })
            .times(1)
            .return_const(());
        let navigator = Arc::new(RouteStack::new(routes::CHAT_FORM));

        let result = complete_onboarding(&submission(), &session, &presenter, navigator.clone()).await;

        assert!(result.is_err());
        assert_eq!(navigator.current(), routes::CHAT_FORM);
        assert_eq!(session.current_user(), None);
    }

    #[tokio::test]
    async fn failed_profile_fill_still_lands_the_new_user_home() {
        // Registration writes the collection and the current user; nothing after.
        let store = WriteBudgetStore {
            inner: MemoryStore::new(),
            writes_left: AtomicUsize::new(2),
        };
        let session = SessionManager::restore(Arc::new(store), PasswordPolicy::EmailOnly).await;
        let presenter = RecordingPresenter::default();
        let navigator = Arc::new(RouteStack::new(routes::CHAT_FORM));

        let user = complete_onboarding(&submission(), &session, &presenter, navigator.clone())
            .await
            .unwrap();

        assert_eq!(user.email, "ana@x.com");
        assert_eq!(user.phone, "");
        assert_eq!(session.current_user(), Some(user));

        let alert = presenter.alerts.lock().unwrap().pop().unwrap();
        assert_eq!(alert.kind, AlertKind::Success);
        (alert.on_confirm.unwrap())();
        assert_eq!(navigator.current(), routes::HOME);
    }

    #[test]
    fn logout_runs_callback_only_through_confirm() {
        let presenter = RecordingPresenter::default();
        let fired = Arc::new(AtomicBool::new(false));
        let flag = fired.clone();

        confirm_logout(&presenter, move || flag.store(true, Ordering::SeqCst));
        assert!(!fired.load(Ordering::SeqCst));

        let alert = presenter.alerts.lock().unwrap().pop().unwrap();
        assert_eq!(alert.kind, AlertKind::Confirm);
        (alert.on_confirm.unwrap())();
        assert!(fired.load(Ordering::SeqCst));
    }
}

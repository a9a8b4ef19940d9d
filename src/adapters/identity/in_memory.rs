//! In-memory identity provider for tests and local development.
//!
//! Behaves like a hosted auth SDK: `InitialSession` is delivered
//! synchronously while a listener registers, and successful sign-in/out push
//! `SignedIn`/`SignedOut` to every listener before the call returns.
//!
//! # Example
//!
//! ```ignore
//! let provider = InMemoryIdentityProvider::new()
//!     .with_account("ana@example.com", "s3cret", "user-ana");
//!
//! let session = provider.sign_in_with_password("ana@example.com", "s3cret").await?;
//! assert_eq!(session.user_id().as_str(), "user-ana");
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use crate::domain::foundation::{AuthError, Timestamp, UserId};
use crate::domain::session::{AuthChangeEvent, Credential, Identity, Session};
use crate::ports::{AuthStateListener, AuthSubscription, IdentityProvider};

use super::listeners::ListenerRegistry;

/// Message the hosted provider returns for a bad email/password pair.
pub const INVALID_LOGIN_MESSAGE: &str = "Invalid login credentials";

const DEFAULT_SESSION_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// In-memory implementation of [`IdentityProvider`].
///
/// Unknown emails and wrong passwords both fail with
/// `AuthError::InvalidCredentials(INVALID_LOGIN_MESSAGE)`.
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    current: RwLock<Option<Session>>,
    listeners: ListenerRegistry,
    push_initial_session: bool,
    session_ttl_secs: i64,
    sign_in_error: RwLock<Option<AuthError>>,
    sign_out_error: RwLock<Option<AuthError>>,
    /// `current_session` waits until this is `true`.
    session_reads_open: watch::Sender<bool>,
    sign_in_calls: AtomicUsize,
    sign_out_calls: AtomicUsize,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryIdentityProvider {
    /// Creates a provider with no accounts and no session.
    pub fn new() -> Self {
        let (session_reads_open, _) = watch::channel(true);
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: RwLock::new(None),
            listeners: ListenerRegistry::new(),
            push_initial_session: true,
            session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
            sign_in_error: RwLock::new(None),
            sign_out_error: RwLock::new(None),
            session_reads_open,
            sign_in_calls: AtomicUsize::new(0),
            sign_out_calls: AtomicUsize::new(0),
        }
    }

    /// Registers an account that can sign in with `email`/`password`.
    pub fn with_account(
        self,
        email: impl Into<String>,
        password: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        self.add_account(email, password, user_id);
        self
    }

    /// Starts the provider with an already-established session, as if one
    /// had been restored from storage.
    pub fn with_session(self, session: Session) -> Self {
        *write(&self.current) = Some(session);
        self
    }

    /// Stops delivering `InitialSession` on registration, like providers
    /// that never re-push a dormant session.
    pub fn without_initial_push(mut self) -> Self {
        self.push_initial_session = false;
        self
    }

    /// Makes every sign-in fail with `error`.
    pub fn with_sign_in_error(self, error: AuthError) -> Self {
        *write(&self.sign_in_error) = Some(error);
        self
    }

    /// Makes every sign-out fail with `error`; the session is kept.
    pub fn with_sign_out_error(self, error: AuthError) -> Self {
        *write(&self.sign_out_error) = Some(error);
        self
    }

    /// Adds an account at runtime.
    pub fn add_account(
        &self,
        email: impl Into<String>,
        password: impl Into<String>,
        user_id: impl Into<String>,
    ) {
        let email = email.into();
        let id = match UserId::new(user_id) {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(%email, "Skipping account with invalid user id: {}", e);
                return;
            }
        };
        write(&self.accounts).insert(
            email.clone(),
            Account {
                password: password.into(),
                identity: Identity::new(id, email),
            },
        );
    }

    /// Clears any forced sign-in/sign-out errors.
    pub fn clear_errors(&self) {
        *write(&self.sign_in_error) = None;
        *write(&self.sign_out_error) = None;
    }

    /// Holds `current_session` calls until [`resume_session_reads`] is called.
    ///
    /// The session is captured when the call starts, so a held read returns
    /// whatever was current at that moment.
    ///
    /// [`resume_session_reads`]: Self::resume_session_reads
    pub fn pause_session_reads(&self) {
        self.session_reads_open.send_replace(false);
    }

    pub fn resume_session_reads(&self) {
        self.session_reads_open.send_replace(true);
    }

    /// Replaces the session and pushes `event` to every listener, as the
    /// hosted provider does for refreshes, remote sign-outs, and expiry.
    pub fn push(&self, event: AuthChangeEvent, session: Option<Session>) {
        *write(&self.current) = session.clone();
        self.listeners.notify(event, session);
    }

    /// Builds a fresh session for a user without going through sign-in.
    pub fn issue_session(&self, identity: Identity) -> Session {
        Session::new(identity, Credential::new(format!("access-{}", Uuid::new_v4())))
            .with_refresh_token(Credential::new(format!("refresh-{}", Uuid::new_v4())))
            .with_expires_at(Timestamp::now().plus_secs(self.session_ttl_secs))
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn sign_in_calls(&self) -> usize {
        self.sign_in_calls.load(Ordering::SeqCst)
    }

    pub fn sign_out_calls(&self) -> usize {
        self.sign_out_calls.load(Ordering::SeqCst)
    }

    pub fn has_session(&self) -> bool {
        read(&self.current).is_some()
    }
}

#[async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    fn on_auth_state_change(&self, listener: Arc<dyn AuthStateListener>) -> AuthSubscription {
        let subscription = self.listeners.register(listener.clone());
        if self.push_initial_session {
            let session = read(&self.current).clone();
            listener.on_auth_state_change(AuthChangeEvent::InitialSession, session);
        }
        subscription
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let session = read(&self.current).clone();

        let mut open = self.session_reads_open.subscribe();
        open.wait_for(|open| *open)
            .await
            .map_err(|e| AuthError::service_unavailable(e.to_string()))?;

        Ok(session)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        self.sign_in_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = read(&self.sign_in_error).clone() {
            return Err(error);
        }

        let identity = read(&self.accounts)
            .get(email)
            .filter(|account| account.password == password)
            .map(|account| account.identity.clone())
            .ok_or_else(|| AuthError::invalid_credentials(INVALID_LOGIN_MESSAGE))?;

        let session = self.issue_session(identity);
        self.push(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        self.sign_out_calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = read(&self.sign_out_error).clone() {
            return Err(error);
        }

        self.push(AuthChangeEvent::SignedOut, None);
        Ok(())
    }
}

fn read<T>(lock: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        seen: Mutex<Vec<(AuthChangeEvent, Option<String>)>>,
    }

    impl AuthStateListener for Recorder {
        fn on_auth_state_change(&self, event: AuthChangeEvent, session: Option<Session>) {
            self.seen
                .lock()
                .unwrap()
                .push((event, session.map(|s| s.user_id().to_string())));
        }
    }

    fn provider() -> InMemoryIdentityProvider {
        InMemoryIdentityProvider::new().with_account("ana@example.com", "s3cret", "user-ana")
    }

    #[tokio::test]
    async fn sign_in_with_valid_credentials_returns_session() {
        let provider = provider();

        let session = provider
            .sign_in_with_password("ana@example.com", "s3cret")
            .await
            .unwrap();

        assert_eq!(session.user_id().as_str(), "user-ana");
        assert_eq!(session.identity.email, "ana@example.com");
        assert!(provider.has_session());
    }

    #[tokio::test]
    async fn sign_in_with_wrong_password_is_rejected() {
        let provider = provider();

        let result = provider
            .sign_in_with_password("ana@example.com", "wrong")
            .await;

        assert_eq!(
            result.unwrap_err(),
            AuthError::invalid_credentials(INVALID_LOGIN_MESSAGE)
        );
        assert!(!provider.has_session());
    }

    #[tokio::test]
    async fn sign_in_with_unknown_email_is_rejected() {
        let result = provider().sign_in_with_password("bob@example.com", "s3cret").await;
        assert!(matches!(result, Err(AuthError::InvalidCredentials(_))));
    }

    #[tokio::test]
    async fn forced_sign_in_error_is_returned() {
        let provider = provider().with_sign_in_error(AuthError::service_unavailable("down"));

        let result = provider.sign_in_with_password("ana@example.com", "s3cret").await;

        assert!(matches!(result, Err(AuthError::ServiceUnavailable(_))));
        assert_eq!(provider.sign_in_calls(), 1);
    }

    #[tokio::test]
    async fn registration_delivers_initial_session_synchronously() {
        let provider = provider();
        let recorder = Arc::new(Recorder::default());

        let _subscription = provider.on_auth_state_change(recorder.clone());

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![(AuthChangeEvent::InitialSession, None)]
        );
    }

    #[tokio::test]
    async fn without_initial_push_registration_is_silent() {
        let provider = provider().without_initial_push();
        let recorder = Arc::new(Recorder::default());

        let _subscription = provider.on_auth_state_change(recorder.clone());

        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_in_and_out_push_to_listeners() {
        let provider = provider().without_initial_push();
        let recorder = Arc::new(Recorder::default());
        let _subscription = provider.on_auth_state_change(recorder.clone());

        provider
            .sign_in_with_password("ana@example.com", "s3cret")
            .await
            .unwrap();
        provider.sign_out().await.unwrap();

        assert_eq!(
            *recorder.seen.lock().unwrap(),
            vec![
                (AuthChangeEvent::SignedIn, Some("user-ana".to_string())),
                (AuthChangeEvent::SignedOut, None),
            ]
        );
    }

    #[tokio::test]
    async fn failed_sign_out_keeps_session_and_pushes_nothing() {
        let provider = provider()
            .without_initial_push()
            .with_sign_out_error(AuthError::service_unavailable("down"));
        provider
            .sign_in_with_password("ana@example.com", "s3cret")
            .await
            .unwrap();
        let recorder = Arc::new(Recorder::default());
        let _subscription = provider.on_auth_state_change(recorder.clone());

        assert!(provider.sign_out().await.is_err());

        assert!(provider.has_session());
        assert!(recorder.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn paused_session_read_returns_value_captured_at_call_time() {
        let provider = Arc::new(provider());
        provider.pause_session_reads();

        let reader = {
            let provider = provider.clone();
            tokio::spawn(async move { provider.current_session().await })
        };
        tokio::task::yield_now().await;

        provider
            .sign_in_with_password("ana@example.com", "s3cret")
            .await
            .unwrap();
        provider.resume_session_reads();

        let stale = reader.await.unwrap().unwrap();
        assert!(stale.is_none());
    }
}

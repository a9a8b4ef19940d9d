//! Supabase Auth (GoTrue) adapter for the identity provider port.
//!
//! Talks to the hosted auth API over HTTP:
//!
//! 1. `POST /auth/v1/token?grant_type=password` for sign-in
//! 2. `POST /auth/v1/token?grant_type=refresh_token` to renew an expired session
//! 3. `POST /auth/v1/logout` for sign-out
//!
//! The session itself lives in memory only; a refresh token can be seeded
//! at startup to restore a previous login.
//!
//! # Example
//!
//! ```ignore
//! let config = GoTrueConfig::new("https://xyz.supabase.co", anon_key)
//!     .with_timeout(Duration::from_secs(10));
//! let provider = GoTrueIdentityProvider::new(config)?;
//! let session = provider.sign_in_with_password("ana@example.com", "s3cret").await?;
//! ```

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{AuthError, Timestamp, UserId};
use crate::domain::session::{AuthChangeEvent, Credential, Identity, Session};
use crate::ports::{AuthStateListener, AuthSubscription, IdentityProvider};

use super::listeners::ListenerRegistry;

/// Configuration for the GoTrue adapter.
#[derive(Debug)]
pub struct GoTrueConfig {
    /// Project URL (e.g., "https://xyz.supabase.co").
    pub base_url: String,
    /// Public anon key, sent as the `apikey` header.
    anon_key: SecretString,
    /// Request timeout.
    pub timeout: Duration,
}

impl GoTrueConfig {
    pub fn new(base_url: impl Into<String>, anon_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            anon_key: SecretString::new(anon_key.into()),
            timeout: Duration::from_secs(10),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }

    fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Debug, Serialize)]
struct RefreshGrant<'a> {
    refresh_token: &'a str,
}

/// Token endpoint response body.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(default)]
    expires_at: Option<i64>,
    user: GoTrueUser,
}

#[derive(Debug, Deserialize)]
struct GoTrueUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Error body. Older deployments send `error_description`, newer ones `msg`.
#[derive(Debug, Default, Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

impl ErrorResponse {
    fn into_message(self, status: StatusCode) -> String {
        self.msg
            .or(self.error_description)
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| format!("Auth request failed with status {}", status))
    }
}

impl TokenResponse {
    fn into_session(self, now: Timestamp) -> Result<Session, AuthError> {
        let id = UserId::new(self.user.id)
            .map_err(|e| AuthError::UnexpectedResponse(format!("invalid user id: {}", e)))?;
        let identity = Identity::new(id, self.user.email.unwrap_or_default());

        let mut session = Session::new(identity, Credential::new(self.access_token));
        if let Some(refresh_token) = self.refresh_token {
            session = session.with_refresh_token(Credential::new(refresh_token));
        }
        let expires_at = match (self.expires_at, self.expires_in) {
            (Some(at), _) => Some(Timestamp::from_unix_secs(at).ok_or_else(|| {
                AuthError::UnexpectedResponse(format!("expires_at out of range: {}", at))
            })?),
            (None, Some(secs)) => Some(now.checked_plus_secs(secs).ok_or_else(|| {
                AuthError::UnexpectedResponse(format!("expires_in out of range: {}", secs))
            })?),
            (None, None) => None,
        };
        if let Some(expires_at) = expires_at {
            session = session.with_expires_at(expires_at);
        }
        Ok(session)
    }
}

/// Where the adapter's in-memory session stands.
enum Stored {
    Empty,
    /// Refresh token seeded at startup, not yet exchanged.
    Seed(Credential),
    Active(Session),
}

/// Supabase Auth implementation of [`IdentityProvider`].
pub struct GoTrueIdentityProvider {
    config: GoTrueConfig,
    client: Client,
    stored: RwLock<Stored>,
    listeners: ListenerRegistry,
}

impl GoTrueIdentityProvider {
    /// Creates the adapter. No request is made until the first call.
    pub fn new(config: GoTrueConfig) -> Result<Self, AuthError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::service_unavailable(format!("HTTP client: {}", e)))?;

        Ok(Self {
            config,
            client,
            stored: RwLock::new(Stored::Empty),
            listeners: ListenerRegistry::new(),
        })
    }

    /// Seeds a refresh token from a previous login. The first
    /// `current_session` call exchanges it for a session.
    pub fn with_refresh_token(self, refresh_token: impl Into<String>) -> Self {
        *self.stored.write().unwrap_or_else(PoisonError::into_inner) =
            Stored::Seed(Credential::new(refresh_token));
        self
    }

    fn snapshot(&self) -> Option<Session> {
        match &*self.stored.read().unwrap_or_else(PoisonError::into_inner) {
            Stored::Active(session) => Some(session.clone()),
            _ => None,
        }
    }

    fn has_seed(&self) -> bool {
        matches!(
            &*self.stored.read().unwrap_or_else(PoisonError::into_inner),
            Stored::Seed(_)
        )
    }

    fn store(&self, event: AuthChangeEvent, session: Option<Session>) {
        *self.stored.write().unwrap_or_else(PoisonError::into_inner) = match &session {
            Some(session) => Stored::Active(session.clone()),
            None => Stored::Empty,
        };
        self.listeners.notify(event, session);
    }

    /// Refresh token to exchange, if the stored state calls for a refresh.
    fn pending_refresh(&self, now: &Timestamp) -> Option<Credential> {
        match &*self.stored.read().unwrap_or_else(PoisonError::into_inner) {
            Stored::Seed(token) => Some(token.clone()),
            Stored::Active(session) if session.is_expired_at(now) => session.refresh_token.clone(),
            _ => None,
        }
    }

    async fn token_request<B: Serialize + ?Sized>(
        &self,
        grant_type: &str,
        body: &B,
    ) -> Result<Session, AuthError> {
        let response = self
            .client
            .post(self.config.auth_url("token"))
            .query(&[("grant_type", grant_type)])
            .header("apikey", self.config.anon_key())
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(classify_error(status, response.json().await.unwrap_or_default()));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| AuthError::UnexpectedResponse(format!("token response: {}", e)))?;
        token.into_session(Timestamp::now())
    }
}

#[async_trait]
impl IdentityProvider for GoTrueIdentityProvider {
    fn on_auth_state_change(&self, listener: Arc<dyn AuthStateListener>) -> AuthSubscription {
        let subscription = self.listeners.register(listener.clone());
        // A seeded token is announced by the refresh instead
        // (TokenRefreshed or SignedOut).
        if !self.has_seed() {
            listener.on_auth_state_change(AuthChangeEvent::InitialSession, self.snapshot());
        }
        subscription
    }

    async fn current_session(&self) -> Result<Option<Session>, AuthError> {
        let Some(refresh_token) = self.pending_refresh(&Timestamp::now()) else {
            let session = self.snapshot();
            return Ok(session.filter(|s| !s.is_expired_at(&Timestamp::now())));
        };

        tracing::debug!("Refreshing auth session");
        let grant = RefreshGrant {
            refresh_token: refresh_token.expose(),
        };
        match self.token_request("refresh_token", &grant).await {
            Ok(session) => {
                self.store(AuthChangeEvent::TokenRefreshed, Some(session.clone()));
                Ok(Some(session))
            }
            Err(AuthError::InvalidCredentials(message)) => {
                tracing::info!("Stored session could not be refreshed: {}", message);
                self.store(AuthChangeEvent::SignedOut, None);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        let session = self
            .token_request("password", &PasswordGrant { email, password })
            .await?;
        tracing::debug!(user_id = %session.user_id(), "Password grant accepted");
        self.store(AuthChangeEvent::SignedIn, Some(session.clone()));
        Ok(session)
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        let Some(session) = self.snapshot() else {
            self.store(AuthChangeEvent::SignedOut, None);
            return Ok(());
        };

        let response = self
            .client
            .post(self.config.auth_url("logout"))
            .header("apikey", self.config.anon_key())
            .bearer_auth(session.access_token.expose())
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        // 401/404: the provider already forgot this session.
        if status.is_success() || status == StatusCode::UNAUTHORIZED || status == StatusCode::NOT_FOUND
        {
            self.store(AuthChangeEvent::SignedOut, None);
            return Ok(());
        }

        Err(classify_error(status, response.json().await.unwrap_or_default()))
    }
}

fn transport_error(e: reqwest::Error) -> AuthError {
    if e.is_timeout() {
        AuthError::service_unavailable("Auth request timed out")
    } else if e.is_connect() {
        AuthError::service_unavailable(format!("Connection failed: {}", e))
    } else {
        AuthError::service_unavailable(e.to_string())
    }
}

/// 4xx means the provider rejected what we sent; its message goes to the user.
fn classify_error(status: StatusCode, body: ErrorResponse) -> AuthError {
    let message = body.into_message(status);
    if status.is_client_error() {
        AuthError::InvalidCredentials(message)
    } else {
        tracing::error!(%status, "Auth provider error: {}", message);
        AuthError::ServiceUnavailable(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_url_joins_without_double_slash() {
        let config = GoTrueConfig::new("https://xyz.supabase.co/", "anon");
        assert_eq!(config.auth_url("token"), "https://xyz.supabase.co/auth/v1/token");
    }

    #[test]
    fn config_debug_hides_anon_key() {
        let config = GoTrueConfig::new("https://xyz.supabase.co", "anon-secret-key");
        assert!(!format!("{:?}", config).contains("anon-secret-key"));
    }

    #[test]
    fn token_response_maps_to_session() {
        let json = r#"{
            "access_token": "jwt",
            "token_type": "bearer",
            "expires_in": 3600,
            "expires_at": 1700003600,
            "refresh_token": "r1",
            "user": {"id": "6f1c", "email": "ana@example.com", "role": "authenticated"}
        }"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let session = token.into_session(Timestamp::now()).unwrap();

        assert_eq!(session.user_id().as_str(), "6f1c");
        assert_eq!(session.identity.email, "ana@example.com");
        assert_eq!(session.access_token.expose(), "jwt");
        assert_eq!(session.refresh_token.unwrap().expose(), "r1");
        assert_eq!(session.expires_at.unwrap().as_unix_secs(), 1_700_003_600);
    }

    #[test]
    fn token_response_without_expires_at_uses_expires_in() {
        let json = r#"{"access_token": "jwt", "expires_in": 60, "user": {"id": "6f1c"}}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        let now = Timestamp::from_unix_secs(1_700_000_000).unwrap();

        let session = token.into_session(now).unwrap();

        assert_eq!(session.expires_at.unwrap().as_unix_secs(), 1_700_000_060);
        assert_eq!(session.identity.email, "");
    }

    #[test]
    fn token_response_with_blank_user_id_is_unexpected() {
        let json = r#"{"access_token": "jwt", "user": {"id": ""}}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            token.into_session(Timestamp::now()),
            Err(AuthError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn token_response_with_huge_expires_in_is_unexpected() {
        let json = r#"{"access_token": "jwt", "expires_in": 9223372036854775807, "user": {"id": "6f1c"}}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            token.into_session(Timestamp::now()),
            Err(AuthError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn token_response_with_out_of_range_expires_at_is_unexpected() {
        let json = r#"{"access_token": "jwt", "expires_at": 9223372036854775807, "user": {"id": "6f1c"}}"#;
        let token: TokenResponse = serde_json::from_str(json).unwrap();
        assert!(matches!(
            token.into_session(Timestamp::now()),
            Err(AuthError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn client_error_surfaces_provider_message() {
        let body: ErrorResponse = serde_json::from_str(
            r#"{"code": 400, "error_code": "invalid_credentials", "msg": "Invalid login credentials"}"#,
        )
        .unwrap();

        let err = classify_error(StatusCode::BAD_REQUEST, body);

        assert_eq!(err, AuthError::invalid_credentials("Invalid login credentials"));
    }

    #[test]
    fn legacy_error_description_is_used() {
        let body: ErrorResponse = serde_json::from_str(
            r#"{"error": "invalid_grant", "error_description": "Email not confirmed"}"#,
        )
        .unwrap();

        let err = classify_error(StatusCode::BAD_REQUEST, body);

        assert_eq!(err.user_message(), "Email not confirmed");
    }

    #[test]
    fn server_error_is_service_unavailable() {
        let err = classify_error(StatusCode::BAD_GATEWAY, ErrorResponse::default());
        assert!(err.is_transient());
        assert!(err.to_string().contains("502"));
    }

    struct Recorder(std::sync::Mutex<Vec<AuthChangeEvent>>);

    impl AuthStateListener for Recorder {
        fn on_auth_state_change(&self, event: AuthChangeEvent, _session: Option<Session>) {
            self.0.lock().unwrap().push(event);
        }
    }

    #[test]
    fn registration_pushes_initial_session() {
        let provider =
            GoTrueIdentityProvider::new(GoTrueConfig::new("http://127.0.0.1:9", "anon")).unwrap();
        let recorder = Arc::new(Recorder(std::sync::Mutex::new(Vec::new())));

        let _subscription = provider.on_auth_state_change(recorder.clone());

        assert_eq!(*recorder.0.lock().unwrap(), vec![AuthChangeEvent::InitialSession]);
    }

    #[test]
    fn seeded_token_defers_initial_push_to_refresh() {
        let provider =
            GoTrueIdentityProvider::new(GoTrueConfig::new("http://127.0.0.1:9", "anon"))
                .unwrap()
                .with_refresh_token("r1");
        let recorder = Arc::new(Recorder(std::sync::Mutex::new(Vec::new())));

        let _subscription = provider.on_auth_state_change(recorder.clone());

        assert!(recorder.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn sign_out_without_session_clears_locally() {
        let provider =
            GoTrueIdentityProvider::new(GoTrueConfig::new("http://127.0.0.1:9", "anon")).unwrap();

        assert!(provider.sign_out().await.is_ok());
        assert!(provider.current_session().await.unwrap().is_none());
    }
}

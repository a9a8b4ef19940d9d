//! SignInHandler - Command handler for password sign-in.

use std::sync::Arc;

use crate::domain::foundation::AuthError;
use crate::domain::session::Session;
use crate::ports::{IdentityProvider, Notice, Notifier};

/// Title of the notice shown when the provider rejects a sign-in.
pub const SIGN_IN_FAILED_TITLE: &str = "Erro ao fazer login";

/// Command to sign in with email and password.
#[derive(Clone)]
pub struct SignInCommand {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SignInCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignInCommand")
            .field("email", &self.email)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// What the caller of a sign-in gets back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInOutcome {
    Success,
    Failure { error_message: String },
}

impl SignInOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SignInOutcome::Success)
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SignInOutcome::Success => None,
            SignInOutcome::Failure { error_message } => Some(error_message),
        }
    }
}

/// Handler for password sign-in.
///
/// Delegates verification to the identity provider. A rejection raises a
/// destructive notice carrying the provider's message; transport failures
/// are logged only. No retries, no lockout.
pub struct SignInHandler {
    identity: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn Notifier>,
}

impl SignInHandler {
    pub fn new(identity: Arc<dyn IdentityProvider>, notifier: Arc<dyn Notifier>) -> Self {
        Self { identity, notifier }
    }

    pub async fn handle(&self, cmd: SignInCommand) -> Result<Session, AuthError> {
        match self
            .identity
            .sign_in_with_password(&cmd.email, &cmd.password)
            .await
        {
            Ok(session) => {
                tracing::info!(user_id = %session.user_id(), "Signed in");
                Ok(session)
            }
            Err(e) if e.is_transient() => {
                tracing::error!(error = %e, "Sign-in request failed");
                Err(e)
            }
            Err(e) => {
                tracing::info!(error = %e, "Sign-in rejected");
                self.notifier
                    .notify(Notice::destructive(SIGN_IN_FAILED_TITLE, e.user_message()));
                Err(e)
            }
        }
    }
}

impl From<&AuthError> for SignInOutcome {
    fn from(error: &AuthError) -> Self {
        SignInOutcome::Failure {
            error_message: error.user_message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::identity::{InMemoryIdentityProvider, INVALID_LOGIN_MESSAGE};
    use crate::adapters::notify::RecordingNotifier;
    use crate::domain::foundation::UserId;
    use crate::ports::NoticeSeverity;

    fn command(email: &str, password: &str) -> SignInCommand {
        SignInCommand {
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    fn handler(
        provider: InMemoryIdentityProvider,
    ) -> (SignInHandler, Arc<InMemoryIdentityProvider>, Arc<RecordingNotifier>) {
        let provider = Arc::new(provider);
        let notifier = Arc::new(RecordingNotifier::new());
        (
            SignInHandler::new(provider.clone(), notifier.clone()),
            provider,
            notifier,
        )
    }

    #[tokio::test]
    async fn valid_credentials_return_session_without_notice() {
        let (handler, _, notifier) = handler(InMemoryIdentityProvider::new().with_account(
            "ana@example.com",
            "s3nha",
            "user-ana",
        ));

        let session = handler
            .handle(command("ana@example.com", "s3nha"))
            .await
            .unwrap();

        assert_eq!(session.user_id(), &UserId::new("user-ana").unwrap());
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn rejection_raises_destructive_notice_with_provider_message() {
        let (handler, _, notifier) = handler(InMemoryIdentityProvider::new().with_account(
            "ana@example.com",
            "s3nha",
            "user-ana",
        ));

        let err = handler
            .handle(command("ana@example.com", "wrong"))
            .await
            .unwrap_err();

        assert_eq!(err.user_message(), INVALID_LOGIN_MESSAGE);
        let notices = notifier.notices();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].title, SIGN_IN_FAILED_TITLE);
        assert_eq!(notices[0].description, INVALID_LOGIN_MESSAGE);
        assert_eq!(notices[0].severity, NoticeSeverity::Destructive);
    }

    #[tokio::test]
    async fn transport_failure_is_not_surfaced_as_notice() {
        let (handler, _, notifier) = handler(
            InMemoryIdentityProvider::new()
                .with_sign_in_error(AuthError::service_unavailable("connection refused")),
        );

        let err = handler.handle(command("ana@example.com", "x")).await.unwrap_err();

        assert!(err.is_transient());
        assert!(notifier.notices().is_empty());
    }

    #[tokio::test]
    async fn no_retry_on_failure() {
        let (handler, provider, _) = handler(
            InMemoryIdentityProvider::new()
                .with_sign_in_error(AuthError::service_unavailable("connection refused")),
        );

        let _ = handler.handle(command("ana@example.com", "x")).await;

        assert_eq!(provider.sign_in_calls(), 1);
    }

    #[test]
    fn outcome_from_error_uses_user_message() {
        let outcome = SignInOutcome::from(&AuthError::invalid_credentials("Email not confirmed"));
        assert_eq!(outcome.error_message(), Some("Email not confirmed"));
        assert!(!outcome.is_success());
    }

    #[test]
    fn command_debug_hides_password() {
        let rendered = format!("{:?}", command("ana@example.com", "s3nha"));
        assert!(!rendered.contains("s3nha"));
    }
}

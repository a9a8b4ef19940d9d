//! Session probe.
//!
//! Resolves the member session against the configured Supabase project and
//! logs what the portal would show: status, login countdown and owned
//! products. Signs in first when `MEMBER_PORTAL_EMAIL` and
//! `MEMBER_PORTAL_PASSWORD` are set; resumes from `MEMBER_PORTAL_REFRESH_TOKEN`
//! otherwise.

use std::error::Error;
use std::sync::Arc;

use secrecy::ExposeSecret;

use member_portal::adapters::{
    GoTrueConfig, GoTrueIdentityProvider, PostgrestConfig, PostgrestProfileReader,
    TracingNotifier,
};
use member_portal::application::{SessionDeps, SessionManager, SignInOutcome};
use member_portal::config::AppConfig;
use member_portal::ports::IdentityProvider;
use member_portal::telemetry;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    telemetry::init_tracing(&config.logging);
    config.validate()?;

    let supabase = &config.supabase;
    tracing::info!(environment = %config.environment, url = %supabase.url, "Starting session probe");

    let mut gotrue = GoTrueIdentityProvider::new(
        GoTrueConfig::new(&supabase.url, supabase.anon_key.expose_secret())
            .with_timeout(supabase.request_timeout()),
    )?;
    if let Ok(token) = std::env::var("MEMBER_PORTAL_REFRESH_TOKEN") {
        gotrue = gotrue.with_refresh_token(token);
    }
    let identity: Arc<dyn IdentityProvider> = Arc::new(gotrue);

    let profiles = PostgrestProfileReader::new(
        PostgrestConfig::new(&supabase.url, supabase.anon_key.expose_secret())
            .with_timeout(supabase.request_timeout())
            .with_tables(&supabase.profiles_table, &supabase.entitlements_table),
    )?
    .with_identity_provider(identity.clone());

    let manager = SessionManager::start(SessionDeps::new(
        identity,
        Arc::new(profiles),
        Arc::new(TracingNotifier),
    ))
    .await;

    let resolved = tokio::time::timeout(supabase.request_timeout(), manager.wait_until_resolved())
        .await
        .map_err(|_| "identity provider did not answer in time")?;
    tracing::info!(status = %resolved.status, "Session resolved");

    if let (Ok(email), Ok(password)) = (
        std::env::var("MEMBER_PORTAL_EMAIL"),
        std::env::var("MEMBER_PORTAL_PASSWORD"),
    ) {
        if let SignInOutcome::Failure { error_message } = manager.sign_in(&email, &password).await {
            tracing::warn!(error = %error_message, "Sign-in failed");
        }
    }

    if manager.status().is_authenticated() {
        // Member data arrives asynchronously after the session is set.
        let mut updates = manager.subscribe();
        let _ = tokio::time::timeout(
            supabase.request_timeout(),
            updates.wait_for(|s| s.is_member_data_loaded() || !s.status.is_authenticated()),
        )
        .await;

        let snapshot = manager.snapshot();
        tracing::info!(
            user_id = ?snapshot.user_id().map(|id| id.as_str()),
            expires_in = ?manager.time_until_expiry(),
            products = ?snapshot.entitlements.sorted_keys(),
            "Member session"
        );
    } else {
        tracing::info!(status = %manager.status(), "No member signed in");
    }

    manager.dispose();
    Ok(())
}

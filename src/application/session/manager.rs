//! SessionManager - the query surface presentation code binds to.
//!
//! Lifecycle is explicit: `start` subscribes to the identity provider and
//! kicks off a one-shot read of the current session; `dispose` (or drop)
//! unsubscribes. Profile and entitlement loads always run on spawned tasks,
//! never inside the provider's callback.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError, Weak};

use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::application::handlers::auth::{
    SignInCommand, SignInHandler, SignInOutcome, SignOutHandler,
};
use crate::domain::foundation::AuthError;
use crate::domain::membership::{EntitlementSet, ExpiryCountdown, Profile};
use crate::domain::session::{AuthChangeEvent, Session, SessionStatus};
use crate::ports::{
    AuthStateListener, AuthSubscription, Clock, IdentityProvider, Notifier, ProfileReader,
    SystemClock,
};

use super::loader::ProfileLoader;
use super::store::{LoadTicket, SessionSnapshot, SessionStore, StaleUpdate};

/// Collaborators a [`SessionManager`] is built from.
pub struct SessionDeps {
    pub identity: Arc<dyn IdentityProvider>,
    pub profiles: Arc<dyn ProfileReader>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

impl SessionDeps {
    /// Dependencies with the wall clock.
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        profiles: Arc<dyn ProfileReader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            identity,
            profiles,
            notifier,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Client-side session and entitlement state for one consumer.
pub struct SessionManager {
    inner: Arc<Inner>,
    subscription: AuthSubscription,
    initial_fetch: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    store: Arc<SessionStore>,
    loader: Arc<ProfileLoader>,
    sign_in: SignInHandler,
    sign_out: SignOutHandler,
    clock: Arc<dyn Clock>,
    runtime: Handle,
    disposed: AtomicBool,
}

impl Inner {
    fn apply(&self, session: Option<Session>) {
        if let Some(ticket) = self.store.apply_session(session) {
            self.schedule_load(ticket);
        }
    }

    fn apply_initial(&self, observed_sequence: u64, result: Result<Option<Session>, AuthError>) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read current session; treating as signed out");
                None
            }
        };

        match self.store.apply_initial_session(observed_sequence, session) {
            Ok(Some(ticket)) => self.schedule_load(ticket),
            Ok(None) => {}
            Err(StaleUpdate) => {
                tracing::debug!("Initial session read superseded by a pushed update");
            }
        }
    }

    fn schedule_load(&self, ticket: LoadTicket) {
        if self.disposed.load(Ordering::SeqCst) {
            return;
        }
        let loader = self.loader.clone();
        self.runtime.spawn(async move { loader.load(ticket).await });
    }
}

/// Provider callback bridge. Holds the manager weakly so a forgotten
/// subscription cannot keep it alive.
struct StoreListener {
    inner: Weak<Inner>,
}

impl AuthStateListener for StoreListener {
    fn on_auth_state_change(&self, event: AuthChangeEvent, session: Option<Session>) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if inner.disposed.load(Ordering::SeqCst) {
            return;
        }
        tracing::debug!(
            event = event.as_str(),
            has_session = session.is_some(),
            "Auth state change"
        );
        inner.apply(session);
    }
}

impl SessionManager {
    /// Creates the manager, subscribes to provider pushes and starts the
    /// initial session read.
    ///
    /// Must be awaited inside a tokio runtime; loads are spawned on it.
    pub async fn start(deps: SessionDeps) -> Self {
        let store = Arc::new(SessionStore::new());
        let inner = Arc::new(Inner {
            loader: Arc::new(ProfileLoader::new(deps.profiles, store.clone())),
            store,
            sign_in: SignInHandler::new(deps.identity.clone(), deps.notifier),
            sign_out: SignOutHandler::new(deps.identity.clone()),
            clock: deps.clock,
            runtime: Handle::current(),
            disposed: AtomicBool::new(false),
        });

        // Anything pushed from here on outranks the initial read.
        let observed_sequence = inner.store.sequence();

        let subscription = deps.identity.on_auth_state_change(Arc::new(StoreListener {
            inner: Arc::downgrade(&inner),
        }));

        let weak = Arc::downgrade(&inner);
        let identity = deps.identity;
        let initial_fetch = tokio::spawn(async move {
            let result = identity.current_session().await;
            if let Some(inner) = weak.upgrade() {
                inner.apply_initial(observed_sequence, result);
            }
        });

        tracing::debug!(subscription = ?subscription.id(), "Session manager started");

        Self {
            inner,
            subscription,
            initial_fetch: Mutex::new(Some(initial_fetch)),
        }
    }

    /// Unsubscribes from the provider. Safe to call more than once.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.subscription.unsubscribe();
        let pending = self
            .initial_fetch
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = pending {
            task.abort();
        }
        tracing::debug!("Session manager disposed");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::SeqCst)
    }

    // ════════════════════════════════════════════════════════════════════
    // Queries
    // ════════════════════════════════════════════════════════════════════

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.store.snapshot()
    }

    pub fn session(&self) -> Option<Session> {
        self.inner.store.read(|s| s.session.clone())
    }

    pub fn is_loading(&self) -> bool {
        self.inner.store.read(SessionSnapshot::is_loading)
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.store.read(|s| s.status)
    }

    pub fn profile(&self) -> Option<Profile> {
        self.inner.store.read(|s| s.profile.clone())
    }

    pub fn entitlements(&self) -> EntitlementSet {
        self.inner.store.read(|s| s.entitlements.clone())
    }

    /// True iff the signed-in user owns `product_key`. False while nothing
    /// is loaded.
    pub fn has_entitlement(&self, product_key: &str) -> bool {
        self.inner.store.read(|s| s.has_entitlement(product_key))
    }

    pub fn expiry_countdown(&self) -> Option<ExpiryCountdown> {
        let now = self.inner.clock.now();
        self.inner.store.read(|s| s.time_until_expiry(&now))
    }

    /// Rendered login countdown: `"Expirado"`, `"2d 2h"`, `"1h"`, or `None`
    /// without a profile expiry.
    pub fn time_until_expiry(&self) -> Option<String> {
        self.expiry_countdown().map(|countdown| countdown.to_string())
    }

    /// Receiver that yields a fresh snapshot after every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.store.subscribe()
    }

    /// Waits for the first resolution and returns the state at that point.
    ///
    /// Never returns while neither the provider push nor the initial read
    /// has answered.
    pub async fn wait_until_resolved(&self) -> SessionSnapshot {
        let mut rx = self.inner.store.subscribe();
        let resolved = match rx.wait_for(|s| !s.is_loading()).await {
            Ok(snapshot) => snapshot.clone(),
            Err(_) => self.snapshot(),
        };
        resolved
    }

    // ════════════════════════════════════════════════════════════════════
    // Actions
    // ════════════════════════════════════════════════════════════════════

    /// Signs in with email and password.
    ///
    /// The returned session is applied immediately, so callers see
    /// `Authenticated` once this resolves even if the provider's push is
    /// still in flight.
    pub async fn sign_in(&self, email: &str, password: &str) -> SignInOutcome {
        let cmd = SignInCommand {
            email: email.to_string(),
            password: password.to_string(),
        };
        match self.inner.sign_in.handle(cmd).await {
            Ok(session) => {
                self.inner.apply(Some(session));
                SignInOutcome::Success
            }
            Err(e) => SignInOutcome::from(&e),
        }
    }

    /// Signs out. Local session, profile and entitlements are cleared even
    /// when the provider call fails.
    pub async fn sign_out(&self) {
        if let Err(e) = self.inner.sign_out.handle().await {
            tracing::debug!(error = %e, "Resetting local session after failed provider sign-out");
        }
        self.inner.apply(None);
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        self.dispose();
    }
}

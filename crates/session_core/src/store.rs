//! crates/session_core/src/store.rs
//!
//! The session state machine: `Uninitialized -> Hydrating -> {Authenticated, Unauthenticated}`.
//!
//! The store is created once at the application root with its ports injected.
//! Every login and logout bumps a generation counter; an asynchronous result is
//! applied only if the generation it captured is still current, so a logout
//! always wins over whatever was in flight.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Duration;
use parking_lot::Mutex;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use crate::domain::{
    Ack, Credentials, LoginGrant, Phase, ProfilePatch, SessionState, TokenRecord, UserProfile,
};
use crate::error::{AuthError, SessionError, SessionResult};
use crate::ports::{AuthGateway, Clock, GatewayResult, PersistError, Persister};
use crate::snapshot::PersistedSession;
use crate::token_clock;
use crate::validation::{self, PasswordChangeForm, RegistrationForm};

//=========================================================================================
// Settings
//=========================================================================================

/// How a persisted session is trusted at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HydrationPolicy {
    /// Trust the local expiry check alone.
    #[default]
    Offline,
    /// Additionally ask the gateway whether the credential is still accepted.
    Online,
}

#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub session_lifetime: Duration,
    pub hydration: HydrationPolicy,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            session_lifetime: token_clock::default_session_lifetime(),
            hydration: HydrationPolicy::Offline,
        }
    }
}

//=========================================================================================
// Capability interface
//=========================================================================================

/// The narrow surface the rest of the client uses to drive the session.
#[async_trait]
pub trait SessionControl: Send + Sync {
    fn state(&self) -> SessionState;

    async fn login(&self, credentials: Credentials) -> SessionResult<UserProfile>;

    async fn logout(&self);

    async fn register(&self, form: RegistrationForm) -> SessionResult<Ack>;

    async fn update_profile(&self, patch: ProfilePatch) -> SessionResult<UserProfile>;

    async fn change_password(&self, form: PasswordChangeForm) -> SessionResult<Ack>;

    async fn refresh_profile(&self) -> SessionResult<UserProfile>;

    fn clear_error(&self);
}

//=========================================================================================
// SessionStore
//=========================================================================================

struct Inner {
    phase: Phase,
    state: SessionState,
    generation: u64,
}

/// Clears the loading flag when a login future is dropped before its result
/// is applied, unless a newer operation already took over.
struct LoginAttempt<'a> {
    store: &'a SessionStore,
    generation: u64,
    settled: bool,
}

impl Drop for LoginAttempt<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let mut inner = self.store.inner.lock();
        if inner.generation == self.generation && inner.state.is_loading {
            warn!("Login abandoned before the gateway answered");
            inner.state.is_loading = false;
            self.store.publish(&inner);
        }
    }
}

pub struct SessionStore {
    gateway: Arc<dyn AuthGateway>,
    persister: Arc<dyn Persister>,
    clock: Arc<dyn Clock>,
    settings: StoreSettings,
    inner: Mutex<Inner>,
    notifier: watch::Sender<SessionState>,
}

impl SessionStore {
    pub fn new(
        gateway: Arc<dyn AuthGateway>,
        persister: Arc<dyn Persister>,
        clock: Arc<dyn Clock>,
        settings: StoreSettings,
    ) -> Self {
        let (notifier, _) = watch::channel(SessionState::initial());
        Self {
            gateway,
            persister,
            clock,
            settings,
            inner: Mutex::new(Inner {
                phase: Phase::Uninitialized,
                state: SessionState::initial(),
                generation: 0,
            }),
            notifier,
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state.clone()
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// A receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.notifier.subscribe()
    }

    fn publish(&self, inner: &Inner) {
        self.notifier.send_replace(inner.state.clone());
    }

    //-------------------------------------------------------------------------------------
    // Hydration
    //-------------------------------------------------------------------------------------

    /// Restores the persisted session. Runs once per store; later calls are no-ops.
    pub async fn hydrate(&self) {
        let generation = {
            let mut inner = self.inner.lock();
            if inner.phase != Phase::Uninitialized {
                debug!(phase = ?inner.phase, "Hydration already ran, skipping");
                return;
            }
            inner.phase = Phase::Hydrating;
            inner.generation
        };

        info!("Restoring persisted session...");
        let restored = self.restore().await;

        let restored = {
            let mut inner = self.inner.lock();
            inner.state.is_hydrated = true;
            inner.state.is_loading = false;

            let restored = match restored {
                Some((user, token)) if inner.generation == generation => {
                    // Attached under the lock so a concurrent logout is ordered after it.
                    self.gateway.attach_credential(&token.credential);
                    inner.state.user = Some(user);
                    inner.state.token = Some(token);
                    inner.state.is_authenticated = true;
                    inner.phase = Phase::Authenticated;
                    true
                }
                restored => {
                    if restored.is_some() {
                        info!("Logout arrived during hydration, dropping restored session");
                    }
                    inner.state.user = None;
                    inner.state.token = None;
                    inner.state.is_authenticated = false;
                    inner.phase = Phase::Unauthenticated;
                    false
                }
            };
            self.publish(&inner);
            restored
        };

        if restored {
            info!("Session restored");
        } else {
            info!("Starting unauthenticated");
        }
    }

    async fn restore(&self) -> Option<(UserProfile, TokenRecord)> {
        let snapshot = match self.persister.load() {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                info!("No persisted session found");
                return None;
            }
            Err(PersistError::Corrupt(reason)) => {
                warn!(%reason, "Persisted session is corrupt, purging it");
                self.wipe();
                return None;
            }
            Err(err) => {
                warn!(error = %err, "Could not read persisted session");
                return None;
            }
        };

        let Some((user, token)) = snapshot.into_session() else {
            debug!("Persisted blob holds no authenticated session, clearing it");
            self.wipe();
            return None;
        };

        if token_clock::is_expired(&token, self.clock.now()) {
            info!(expired_at = %token.expires_at, "Persisted session expired");
            self.release_gateway().await;
            self.wipe();
            return None;
        }

        if self.settings.hydration == HydrationPolicy::Online {
            self.gateway.attach_credential(&token.credential);
            match self.gateway.verify_session().await {
                Ok(true) => {}
                Ok(false) => {
                    info!("Gateway no longer accepts the persisted session");
                    self.release_gateway().await;
                    self.wipe();
                    return None;
                }
                Err(err) => {
                    warn!(error = %err, "Session verification failed, discarding session");
                    self.release_gateway().await;
                    self.wipe();
                    return None;
                }
            }
        }

        Some((user, token))
    }

    fn wipe(&self) {
        if let Err(err) = self.persister.clear() {
            warn!(error = %err, "Failed to clear persisted session");
        }
    }

    async fn release_gateway(&self) {
        if let Err(err) = self.gateway.logout().await {
            warn!(error = %err, "Gateway logout failed");
        }
    }

    //-------------------------------------------------------------------------------------
    // Login / logout
    //-------------------------------------------------------------------------------------

    pub async fn login(&self, credentials: Credentials) -> SessionResult<UserProfile> {
        let generation = {
            let mut inner = self.inner.lock();
            match inner.phase {
                Phase::Uninitialized | Phase::Hydrating => return Err(SessionError::NotHydrated),
                Phase::Authenticated => return Err(SessionError::AlreadyAuthenticated),
                Phase::Unauthenticated => {}
            }
            if inner.state.is_loading {
                warn!("Login requested while another is in flight, rejecting");
                return Err(SessionError::LoginInFlight);
            }
            if let Err(err) = validation::validate_credentials(&credentials) {
                inner.state.error = Some(err.clone().into());
                self.publish(&inner);
                return Err(err.into());
            }

            inner.state.is_loading = true;
            inner.state.error = None;
            inner.generation += 1;
            self.publish(&inner);
            inner.generation
        };
        let mut attempt = LoginAttempt {
            store: self,
            generation,
            settled: false,
        };

        info!(email = %credentials.email, "Attempting login...");
        let outcome = self.gateway.login(&credentials).await;
        attempt.settled = true;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            info!("Login result arrived after a newer operation, discarding");
            return Err(SessionError::Superseded);
        }
        inner.state.is_loading = false;
        let applied = self.apply_grant(&mut inner, outcome);
        if let Ok((_, credential)) = &applied {
            // Attached under the lock so a concurrent logout is ordered after it.
            self.gateway.attach_credential(credential);
        }
        self.publish(&inner);
        drop(inner);

        let (user, _) = applied?;
        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    fn apply_grant(
        &self,
        inner: &mut Inner,
        outcome: GatewayResult<LoginGrant>,
    ) -> SessionResult<(UserProfile, String)> {
        let grant = match outcome {
            Ok(grant) => grant,
            Err(err) => {
                warn!(error = %err, "Login rejected");
                let err = AuthError::for_login(err);
                inner.state.error = Some(err.clone());
                return Err(err.into());
            }
        };

        let (credential, user) = match (grant.credential, grant.user) {
            (Some(credential), Some(user)) if !credential.is_empty() => (credential, user),
            _ => {
                error!("Login response is missing the credential or the user");
                inner.state.error = Some(AuthError::MalformedResponse);
                return Err(AuthError::MalformedResponse.into());
            }
        };

        let token = token_clock::issue(
            credential.clone(),
            self.clock.now(),
            self.settings.session_lifetime,
        );
        let snapshot = PersistedSession {
            version: crate::snapshot::SCHEMA_VERSION,
            user: Some(user.clone()),
            token: Some(token.clone()),
            is_authenticated: true,
        };
        if let Err(err) = self.persister.save(&snapshot) {
            error!(error = %err, "Failed to persist session, login not applied");
            return Err(err.into());
        }

        inner.state.user = Some(user.clone());
        inner.state.token = Some(token);
        inner.state.is_authenticated = true;
        inner.state.error = None;
        inner.phase = Phase::Authenticated;
        Ok((user, credential))
    }

    /// Ends the session locally. Never fails; always wins over pending work.
    pub async fn logout(&self) {
        {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            inner.state.reset();
            if inner.phase == Phase::Authenticated {
                inner.phase = Phase::Unauthenticated;
            }
            self.publish(&inner);
        }
        info!("Logging out...");
        self.wipe();
        self.release_gateway().await;
    }

    //-------------------------------------------------------------------------------------
    // Profile operations
    //-------------------------------------------------------------------------------------

    /// Starts a call on behalf of the current session and returns its generation.
    fn begin_session_call(&self) -> SessionResult<u64> {
        let mut inner = self.inner.lock();
        if inner.phase != Phase::Authenticated {
            return Err(SessionError::NotAuthenticated);
        }
        inner.state.error = None;
        self.publish(&inner);
        Ok(inner.generation)
    }

    /// Records `err` as the current error unless the session moved on.
    fn fail(&self, generation: u64, err: AuthError) -> SessionError {
        let mut inner = self.inner.lock();
        if inner.generation != generation {
            return SessionError::Superseded;
        }
        inner.state.error = Some(err.clone());
        self.publish(&inner);
        err.into()
    }

    fn set_error(&self, err: AuthError) {
        let mut inner = self.inner.lock();
        inner.state.error = Some(err);
        self.publish(&inner);
    }

    /// Fetches the profile from the gateway and replaces the local copy.
    async fn replace_user(&self, generation: u64) -> SessionResult<UserProfile> {
        let fetched = self.gateway.fetch_profile().await;

        let mut inner = self.inner.lock();
        if inner.generation != generation {
            info!("Profile result arrived after logout, discarding");
            return Err(SessionError::Superseded);
        }
        match fetched {
            Ok(user) => {
                inner.state.user = Some(user.clone());
                let snapshot = PersistedSession::from_state(&inner.state);
                if let Err(err) = self.persister.save(&snapshot) {
                    warn!(error = %err, "Failed to persist refreshed profile");
                }
                self.publish(&inner);
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "Profile fetch failed");
                let err = AuthError::for_session(err);
                inner.state.error = Some(err.clone());
                self.publish(&inner);
                Err(err.into())
            }
        }
    }

    pub async fn update_profile(&self, patch: ProfilePatch) -> SessionResult<UserProfile> {
        let generation = self.begin_session_call()?;
        let patch = validation::validate_patch(patch)
            .map_err(|err| self.fail(generation, err.into()))?;

        if let Err(err) = self.gateway.update_profile(&patch).await {
            return Err(self.fail(generation, AuthError::for_session(err)));
        }
        self.replace_user(generation).await
    }

    pub async fn change_password(&self, form: PasswordChangeForm) -> SessionResult<Ack> {
        let generation = self.begin_session_call()?;
        let change = form
            .validate()
            .map_err(|err| self.fail(generation, err.into()))?;

        match self.gateway.change_password(&change).await {
            Ok(ack) => {
                info!("Password changed");
                Ok(ack)
            }
            Err(err) => Err(self.fail(generation, AuthError::for_session(err))),
        }
    }

    /// A failed refresh is reported but leaves the session in place.
    pub async fn refresh_profile(&self) -> SessionResult<UserProfile> {
        let generation = self.begin_session_call()?;
        self.replace_user(generation).await
    }

    /// Registers a new account. The current session is not touched.
    pub async fn register(&self, form: RegistrationForm) -> SessionResult<Ack> {
        let draft = match form.validate() {
            Ok(draft) => draft,
            Err(err) => {
                self.set_error(err.clone().into());
                return Err(err.into());
            }
        };

        match self.gateway.register(&draft).await {
            Ok(ack) => {
                info!(email = %draft.email, "Registration accepted");
                Ok(ack)
            }
            Err(err) => {
                warn!(error = %err, "Registration rejected");
                let err = AuthError::for_login(err);
                self.set_error(err.clone());
                Err(err.into())
            }
        }
    }

    pub fn clear_error(&self) {
        let mut inner = self.inner.lock();
        if inner.state.error.take().is_some() {
            self.publish(&inner);
        }
    }
}

#[async_trait]
impl SessionControl for SessionStore {
    fn state(&self) -> SessionState {
        SessionStore::state(self)
    }

    async fn login(&self, credentials: Credentials) -> SessionResult<UserProfile> {
        SessionStore::login(self, credentials).await
    }

    async fn logout(&self) {
        SessionStore::logout(self).await;
    }

    async fn register(&self, form: RegistrationForm) -> SessionResult<Ack> {
        SessionStore::register(self, form).await
    }

    async fn update_profile(&self, patch: ProfilePatch) -> SessionResult<UserProfile> {
        SessionStore::update_profile(self, patch).await
    }

    async fn change_password(&self, form: PasswordChangeForm) -> SessionResult<Ack> {
        SessionStore::change_password(self, form).await
    }

    async fn refresh_profile(&self) -> SessionResult<UserProfile> {
        SessionStore::refresh_profile(self).await
    }

    fn clear_error(&self) {
        SessionStore::clear_error(self);
    }
}

//! Shared fixtures for the session_core integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use session_core::{
    Ack, AuthGateway, Credentials, GatewayError, GatewayResult, LoginGrant, ManualClock,
    MemoryPersister, PasswordChange, PersistError, PersistResult, PersistedSession, Persister,
    ProfileDraft, ProfilePatch, Role, SessionStore, StoreSettings, TokenRecord, UserProfile,
    SCHEMA_VERSION,
};
use tokio::sync::Notify;
use uuid::Uuid;

pub fn epoch() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

pub fn user(first_name: &str) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        email: format!("{}@example.com", first_name.to_lowercase()),
        first_name: first_name.to_string(),
        last_name: "Tester".to_string(),
        role: Role::User,
        active: true,
        created_at: "2025-11-02T09:30:00".to_string(),
    }
}

pub fn grant(credential: &str, user: UserProfile) -> LoginGrant {
    LoginGrant {
        credential: Some(credential.to_string()),
        user: Some(user),
    }
}

pub fn persisted(user: UserProfile, expires_at: DateTime<Utc>) -> PersistedSession {
    PersistedSession {
        version: SCHEMA_VERSION,
        user: Some(user),
        token: Some(TokenRecord {
            credential: "persisted-token".to_string(),
            expires_at,
        }),
        is_authenticated: true,
    }
}

/// A scripted gateway that records every call it receives.
#[derive(Default)]
pub struct FakeGateway {
    calls: Mutex<Vec<&'static str>>,
    login: Mutex<Option<GatewayResult<LoginGrant>>>,
    profile: Mutex<Option<GatewayResult<UserProfile>>>,
    update: Mutex<Option<GatewayResult<Ack>>>,
    password: Mutex<Option<GatewayResult<Ack>>>,
    verify: Mutex<Option<GatewayResult<bool>>>,
    attached: Mutex<Option<String>>,
    hold_login: Mutex<Option<Arc<Notify>>>,
    hold_profile: Mutex<Option<Arc<Notify>>>,
    hold_verify: Mutex<Option<Arc<Notify>>>,
}

impl FakeGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on_login(&self, result: GatewayResult<LoginGrant>) {
        *self.login.lock() = Some(result);
    }

    pub fn on_fetch_profile(&self, result: GatewayResult<UserProfile>) {
        *self.profile.lock() = Some(result);
    }

    pub fn on_update_profile(&self, result: GatewayResult<Ack>) {
        *self.update.lock() = Some(result);
    }

    pub fn on_change_password(&self, result: GatewayResult<Ack>) {
        *self.password.lock() = Some(result);
    }

    pub fn on_verify(&self, result: GatewayResult<bool>) {
        *self.verify.lock() = Some(result);
    }

    /// Makes the next logins wait until the returned handle is notified.
    pub fn hold_logins(&self) -> Arc<Notify> {
        Self::hold(&self.hold_login)
    }

    /// Makes the next profile fetches wait until the returned handle is notified.
    pub fn hold_profile_fetches(&self) -> Arc<Notify> {
        Self::hold(&self.hold_profile)
    }

    /// Makes the next session verifications wait until the returned handle is notified.
    pub fn hold_verifications(&self) -> Arc<Notify> {
        Self::hold(&self.hold_verify)
    }

    fn hold(slot: &Mutex<Option<Arc<Notify>>>) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        *slot.lock() = Some(notify.clone());
        notify
    }

    async fn wait(slot: &Mutex<Option<Arc<Notify>>>) {
        let hold = slot.lock().clone();
        if let Some(notify) = hold {
            notify.notified().await;
        }
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    /// Calls that would have gone over the network.
    pub fn remote_calls(&self) -> Vec<&'static str> {
        self.calls()
            .into_iter()
            .filter(|c| *c != "attach_credential" && *c != "logout")
            .collect()
    }

    pub fn attached(&self) -> Option<String> {
        self.attached.lock().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().push(call);
    }

    fn ack() -> GatewayResult<Ack> {
        Ok(Ack {
            message: "ok".to_string(),
            success: true,
        })
    }
}

#[async_trait]
impl AuthGateway for FakeGateway {
    async fn login(&self, _credentials: &Credentials) -> GatewayResult<LoginGrant> {
        self.record("login");
        Self::wait(&self.hold_login).await;
        self.login
            .lock()
            .clone()
            .unwrap_or_else(|| Ok(grant("fresh-token", user("Ana"))))
    }

    async fn register(&self, _draft: &ProfileDraft) -> GatewayResult<Ack> {
        self.record("register");
        Self::ack()
    }

    async fn verify_session(&self) -> GatewayResult<bool> {
        self.record("verify_session");
        Self::wait(&self.hold_verify).await;
        self.verify.lock().clone().unwrap_or(Ok(true))
    }

    async fn fetch_profile(&self) -> GatewayResult<UserProfile> {
        self.record("fetch_profile");
        Self::wait(&self.hold_profile).await;
        self.profile
            .lock()
            .clone()
            .unwrap_or(Err(GatewayError::Server { status: 500 }))
    }

    async fn update_profile(&self, _patch: &ProfilePatch) -> GatewayResult<Ack> {
        self.record("update_profile");
        self.update.lock().clone().unwrap_or_else(Self::ack)
    }

    async fn change_password(&self, _change: &PasswordChange) -> GatewayResult<Ack> {
        self.record("change_password");
        self.password.lock().clone().unwrap_or_else(Self::ack)
    }

    async fn logout(&self) -> GatewayResult<()> {
        self.record("logout");
        self.attached.lock().take();
        Ok(())
    }

    fn attach_credential(&self, credential: &str) {
        self.record("attach_credential");
        *self.attached.lock() = Some(credential.to_string());
    }
}

/// A persister whose writes always fail, as on a full or read-only disk.
pub struct ReadOnlyPersister;

impl Persister for ReadOnlyPersister {
    fn load(&self) -> PersistResult<Option<PersistedSession>> {
        Ok(None)
    }

    fn save(&self, _snapshot: &PersistedSession) -> PersistResult<()> {
        Err(PersistError::Io("read-only file system".to_string()))
    }

    fn clear(&self) -> PersistResult<()> {
        Ok(())
    }
}

pub struct Harness {
    pub store: Arc<SessionStore>,
    pub gateway: Arc<FakeGateway>,
    pub persister: Arc<MemoryPersister>,
    pub clock: Arc<ManualClock>,
}

impl Harness {
    pub fn with_persister(persister: MemoryPersister, settings: StoreSettings) -> Self {
        let gateway = FakeGateway::new();
        let persister = Arc::new(persister);
        let clock = Arc::new(ManualClock::new(epoch()));
        let store = Arc::new(SessionStore::new(
            gateway.clone(),
            persister.clone(),
            clock.clone(),
            settings,
        ));
        Self {
            store,
            gateway,
            persister,
            clock,
        }
    }

    pub fn empty() -> Self {
        Self::with_persister(MemoryPersister::new(), StoreSettings::default())
    }

    pub fn restoring(snapshot: &PersistedSession) -> Self {
        let persister = MemoryPersister::with_snapshot(snapshot).unwrap();
        Self::with_persister(persister, StoreSettings::default())
    }

    /// A hydrated store with a signed-in user.
    pub async fn signed_in() -> Self {
        let harness = Self::empty();
        harness.store.hydrate().await;
        harness
            .store
            .login(Credentials::new("ana@example.com", "correct horse"))
            .await
            .unwrap();
        harness
    }

    pub fn in_one_hour(&self) -> DateTime<Utc> {
        epoch() + Duration::hours(1)
    }
}

pub mod domain;
pub mod error;
pub mod gate;
pub mod memory;
pub mod navigator;
pub mod ports;
pub mod redirect;
pub mod snapshot;
pub mod store;
pub mod token_clock;
pub mod validation;

pub use domain::{
    Ack, Credentials, LoginGrant, PasswordChange, Phase, ProfileDraft, ProfilePatch, Role,
    SessionState, TokenRecord, UserProfile,
};
pub use error::{AuthError, SessionError, SessionResult, ValidationError};
pub use gate::{GateAction, RouteTable, SessionGate};
pub use memory::MemoryPersister;
pub use navigator::Navigator;
pub use ports::{
    AuthGateway, Clock, GatewayError, GatewayResult, PersistError, PersistResult, Persister,
    SystemClock,
};
pub use redirect::RedirectMemory;
pub use snapshot::{PersistedSession, SCHEMA_VERSION};
pub use store::{HydrationPolicy, SessionControl, SessionStore, StoreSettings};
pub use token_clock::ManualClock;
pub use validation::{PasswordChangeForm, RegistrationForm};

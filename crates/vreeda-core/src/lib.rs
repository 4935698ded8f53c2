//! Device control and sign-in token lifecycle between `vreeda-api` and
//! UI consumers (CLI today, any rendering surface tomorrow).
//!
//! - **[`DeviceStateController`]**: Owns one device's locally cached
//!   state. Every mutation is applied optimistically, then sent through a
//!   [`DeviceGateway`]; a failed call rolls the touched fields back.
//!   Calls for one device are serialized, so completion order matches
//!   invocation order.
//!
//! - **[`RemoteDeviceGateway`]**: The production [`DeviceGateway`]: one
//!   PATCH per state change, no retries.
//!
//! - **[`SelectionCoordinator`]**: Which devices the user has marked for
//!   bulk actions. Pure bookkeeping.
//!
//! - **[`AuthSessionManager`]**: Runs the authorization-code exchange
//!   through an injected [`IdentityProvider`], records the token pair in a
//!   [`UserContextRepository`], and issues the signed session token.
//!
//! - **Stores** ([`store`]): [`MemoryUserContextStore`] and
//!   [`RedbUserContextStore`], both with atomic upsert keyed by user id.

pub mod auth;
pub mod config;
pub mod control;
pub mod convert;
pub mod error;
pub mod gateway;
pub mod model;
pub mod selection;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::{
    AuthPhase, AuthSessionManager, IdentityProvider, ProviderProfile, ProviderTokens,
    SessionCodec, SignInResult, SignedSession,
};
pub use config::{ApiConfig, AuthConfig, IdentityProviderConfig, TlsVerification};
pub use control::{DeviceOp, DeviceStateController};
pub use error::CoreError;
pub use gateway::{lookup_device, DeviceGateway, GatewayError, RemoteDeviceGateway};
pub use selection::SelectionCoordinator;
pub use store::{
    MemoryUserContextStore, PersistenceError, RedbUserContextStore, UserContextRepository,
};

pub use model::{
    Channel, ColorTriple, Device, DeviceState, DeviceTags, PendingUpdate, Preset, Session,
    SessionUser, TokenPair, UserContext, COLOR_PROGRAM,
};

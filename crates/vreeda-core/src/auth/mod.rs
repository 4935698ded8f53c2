// ── Sign-in and session lifecycle ──
//
// An authorization-code exchange with the identity provider yields a
// profile and token set; the token pair is persisted per user and the
// access token is sealed into a signed application session.

mod manager;
mod provider;
mod session;

pub use manager::{AuthPhase, AuthSessionManager};
pub use provider::{IdentityProvider, ProviderProfile, ProviderTokens, SignInResult};
pub use session::{SessionCodec, SignedSession};

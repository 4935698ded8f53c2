// vreeda-api: Async Rust client for the Vreeda device API and its OAuth provider

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod oauth;
pub mod transport;

pub use auth::ApiCredentials;
pub use client::DeviceApiClient;
pub use error::Error;
pub use models::{
    AckPayload, ConnectedModel, DeviceMap, DeviceRequestModel, DeviceRequestStateModel,
    DeviceResponseModel, DeviceStatesModel, DeviceTagsModel, PatchDeviceBody, StateValue,
};
pub use oauth::{IdTokenClaims, OAuthClient, ProviderEndpoints, TokenResponse};
pub use transport::{TlsMode, TransportConfig};

//! Identity and credential primitives shared across the connector.

pub mod grant;
pub mod id;
pub mod secret;

pub use grant::TokenGrant;
pub use id::{IntegrationId, SiteContext, SiteId};
pub use secret::TokenSecret;

//! Feishu app identities
//!
//! Each identity wires one or two `TokenRefresher`s to the Feishu auth
//! endpoints and exposes the cached tokens through the `feishu-auth`
//! provider traits.
//!
//! Identities:
//! 1. `InternalApp`: app token + tenant token from app id and secret
//! 2. `PublicApp`: app token, bound to the app ticket pushed by the webhook
//! 3. `PublicAppTenant`: tenant token for one tenant key, exchanged from a
//!    public app's app token
//!
//! Dependencies between identities only go through provider reads, so a
//! tenant identity whose app identity is still failing fails its own fetch
//! and heals on its retry cadence once the app token shows up.

pub mod error;
pub mod internal;
pub mod public;
pub mod public_tenant;
pub mod sources;

pub use error::{Error, Result};
pub use internal::{InternalApp, InternalAppBuilder};
pub use public::{PublicApp, PublicAppBuilder};
pub use public_tenant::{PublicAppTenant, PublicAppTenantBuilder};
pub use sources::{
    InternalAppTokenSource, InternalTenantTokenSource, PublicAppTokenSource,
    PublicTenantTokenSource,
};

#[cfg(test)]
pub(crate) mod testing;

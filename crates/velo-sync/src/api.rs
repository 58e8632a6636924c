//! Server cart transport and identity contracts.

use crate::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use velo_commerce::cart::Cart;
use velo_commerce::ids::CustomerId;

/// The authenticated state the sync manager reads before every attempt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// Whether a customer is signed in.
    pub is_authenticated: bool,
    /// The signed-in customer, when authenticated.
    pub user_id: Option<CustomerId>,
}

impl Identity {
    /// An anonymous (never-synced) identity.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// An authenticated identity.
    pub fn authenticated(user_id: CustomerId) -> Self {
        Self {
            is_authenticated: true,
            user_id: Some(user_id),
        }
    }
}

/// Supplies the current identity; typically backed by the auth/token
/// manager outside this engine.
pub trait IdentityProvider: Send + Sync {
    /// The identity at this moment.
    fn identity(&self) -> Identity;
}

/// Server-held cart endpoint.
///
/// Implementations must either persist for real or return
/// [`SyncError::Unsupported`]; a log-and-return-ok stub breaks the
/// convergence guarantee.
#[async_trait]
pub trait ServerCartApi: Send + Sync {
    /// Fetch the server-held cart for an identity.
    async fn get_cart(&self, identity: &Identity) -> Result<Option<Cart>, SyncError>;

    /// Replace the server-held cart for an identity.
    async fn put_cart(&self, identity: &Identity, cart: &Cart) -> Result<(), SyncError>;
}

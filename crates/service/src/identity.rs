//! Who owns an order.
//!
//! Ledger operations take a `UserIdentity` explicitly. `IdentityResolver`
//! derives one from the stored "current user" record for callers that only
//! have the ambient login state to go on.

use std::{fmt, sync::Arc};

use models::UserRecord;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::errors::ServiceError;
use crate::storage::KvStore;

/// Owner key stamped on orders.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserIdentity(String);

impl UserIdentity {
    /// No user record stored at all.
    pub const GUEST: &'static str = "guest-user";
    /// A user record exists but names nobody usable.
    pub const UNKNOWN: &'static str = "unknown-user";

    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn guest() -> Self {
        Self(Self::GUEST.to_string())
    }

    pub fn unknown() -> Self {
        Self(Self::UNKNOWN.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_sentinel(&self) -> bool {
        self.0 == Self::GUEST || self.0 == Self::UNKNOWN
    }

    /// Guest when there is no record, otherwise its id/username or unknown.
    pub fn from_record(record: Option<&UserRecord>) -> Self {
        match record {
            None => Self::guest(),
            Some(r) => r.owner_key().map_or_else(Self::unknown, Self::new),
        }
    }
}

impl fmt::Display for UserIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UserIdentity {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Reads and writes the "current user" slot.
#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn KvStore>,
    user_key: String,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn KvStore>, user_key: impl Into<String>) -> Self {
        Self { store, user_key: user_key.into() }
    }

    /// Resolve the current identity. Never fails: an unreadable slot counts
    /// as absent and an undecodable record as unknown.
    pub async fn resolve(&self) -> UserIdentity {
        let raw = match self.store.get(&self.user_key).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %self.user_key, error = %e, "user slot unreadable; treating as guest");
                None
            }
        };
        let Some(raw) = raw else {
            return UserIdentity::guest();
        };
        match serde_json::from_str::<UserRecord>(&raw) {
            Ok(record) => {
                let identity = UserIdentity::from_record(Some(&record));
                debug!(%identity, "resolved current user");
                identity
            }
            Err(e) => {
                error!(key = %self.user_key, error = %e, "error parsing user data");
                UserIdentity::unknown()
            }
        }
    }

    /// Record the logged-in user.
    pub async fn store_identity(&self, record: &UserRecord) -> Result<(), ServiceError> {
        let raw = serde_json::to_string(record)?;
        self.store.set(&self.user_key, raw).await
    }

    /// Forget the logged-in user; later resolutions yield the guest identity.
    pub async fn clear(&self) -> Result<bool, ServiceError> {
        self.store.remove(&self.user_key).await
    }
}

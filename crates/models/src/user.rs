use serde::{Deserialize, Serialize};

/// The "current user" record kept in the identity slot.
///
/// Only `id` and `username` matter to order ownership; anything else the
/// login flow stored alongside them is ignored. `id` may be written as a
/// JSON number or string; a falsy id (`0`, `""`) counts as missing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct UserRecord {
    #[serde(default, deserialize_with = "crate::de::truthy_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl UserRecord {
    /// First non-empty of `id`, then `username`.
    pub fn owner_key(&self) -> Option<&str> {
        [self.id.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
    }
}

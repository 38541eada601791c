use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The local user of this ledger instance.
///
/// There is no authentication: each browser/CLI profile is its own
/// single-user ledger, and the owner profile only provides the identity
/// that equbs created or joined here are attributed to.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerProfile {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub created_at: NaiveDateTime,
}

impl OwnerProfile {
    /// Create a new owner profile with a fresh id
    pub fn new(name: impl Into<String>, contact: Option<String>, created_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            contact,
            photo: None,
            created_at,
        }
    }
}

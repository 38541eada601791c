use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A member of an equb. Identity is stable across payout rounds; the
/// payout order and contribution records reference members by id.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Member {
    pub id: Uuid,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub joined_at: NaiveDateTime,
}

impl Member {
    /// Create a new member with a fresh id
    pub fn new(name: impl Into<String>, phone: Option<String>, joined_at: NaiveDateTime) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            phone,
            joined_at,
        }
    }

    /// Rebuild a member with a known id (import path)
    pub fn with_id(
        id: Uuid,
        name: impl Into<String>,
        phone: Option<String>,
        joined_at: NaiveDateTime,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            phone,
            joined_at,
        }
    }
}

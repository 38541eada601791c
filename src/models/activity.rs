use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One entry in the store-level activity feed.
///
/// Entries with an `equb_id` belong to that equb's feed; entries without
/// one (profile changes, deletions) show up everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    pub date: NaiveDateTime,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equb_id: Option<Uuid>,
}

impl ActivityEntry {
    pub fn new(message: impl Into<String>, equb_id: Option<Uuid>, date: NaiveDateTime) -> Self {
        Self {
            date,
            message: message.into(),
            equb_id,
        }
    }
}

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A distribution of the full pool to one member.
///
/// `round` is a 1-based counter across the equb's whole lifetime; it is
/// never reset when a cycle completes. `amount` equals the equb's goal
/// amount at the time of payout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub round: u32,
    pub recipient_id: Uuid,
    pub date: NaiveDateTime,
    pub amount: Decimal,
}

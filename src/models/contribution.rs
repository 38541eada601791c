use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded payment toward the pool.
///
/// `amount` is what was actually paid; it may exceed or fall short of the
/// computed requirement when the admin confirms an override. `cycle_used`
/// tags the contribution with the payout cycle it belongs to; records from
/// old documents may be untagged, and are then attributed by date (see
/// `cycle::is_in_current_cycle`).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contribution {
    pub amount: Decimal,
    pub user_id: Uuid,
    pub date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cycle_used: Option<u32>,
}

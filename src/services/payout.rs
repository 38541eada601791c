//! Payout Processor: eligibility checks, distribution records, and the
//! cycle boundary.
//!
//! Completion policy: an equb completes after exactly one full rotation,
//! once every original member has been paid once. This matches the
//! classic equb lifecycle; the alternative of reshuffling and collecting
//! forever is deliberately not implemented.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::cycle;
use crate::error::{EqubError, EqubResult};
use crate::models::{Equb, EqubStatus, Payout};

/// Result of a recorded payout
#[derive(Debug, Clone)]
pub struct PayoutReceipt {
    pub equb_id: Uuid,
    pub recipient_id: Uuid,
    /// Lifetime round number of this payout (1-based, never reset)
    pub round: u32,
    pub amount: Decimal,
    /// True when this payout finished the rotation and completed the equb
    pub completed: bool,
}

/// Validate eligibility and distribute the full pool to a member.
///
/// All preconditions are checked before anything is mutated: admin
/// caller, active status, full collection, no member with missed
/// periods, and a recipient who has not been paid within this cycle.
pub fn payout(
    equb: &mut Equb,
    caller_id: Uuid,
    recipient_id: Uuid,
    now: NaiveDateTime,
) -> EqubResult<PayoutReceipt> {
    if !equb.is_creator(caller_id) {
        return Err(EqubError::Permission(
            "Only the equb creator can record a payout".to_string(),
        ));
    }
    if equb.status != EqubStatus::Active {
        return Err(EqubError::Conflict(
            "Payouts can only be recorded while the equb is active".to_string(),
        ));
    }
    let recipient = equb
        .member(recipient_id)
        .ok_or_else(|| EqubError::NotFound("Recipient is not a member of this equb".to_string()))?;
    let recipient_name = recipient.name.clone();

    if equb.progress < Decimal::from(100) {
        return Err(EqubError::Conflict(format!(
            "The pool is not fully collected yet ({}% of goal)",
            equb.progress.round_dp(0)
        )));
    }

    let today = now.date();
    let owing = equb
        .members
        .iter()
        .filter(|m| cycle::missed_cycles(equb, m.id, today) > 0)
        .count();
    if owing > 0 {
        return Err(EqubError::Conflict(format!(
            "{} member(s) still owe contributions for this cycle",
            owing
        )));
    }

    // One payout per member per cycle: look only at this cycle's slice
    // of the payout history
    let cycle_start = cycle::current_cycle_index(equb) as usize * equb.target_members as usize;
    let cycle_end = (cycle_start + equb.target_members as usize).min(equb.payout_history.len());
    let already_paid = equb.payout_history[cycle_start..cycle_end]
        .iter()
        .any(|p| p.recipient_id == recipient_id);
    if already_paid {
        return Err(EqubError::Conflict(format!(
            "{} already received a payout this cycle",
            recipient_name
        )));
    }

    let round = equb.payout_history.len() as u32 + 1;
    let amount = equb.goal_amount;
    equb.payout_history.push(Payout {
        round,
        recipient_id,
        date: now,
        amount,
    });

    // Start collecting the next round immediately
    equb.progress = Decimal::ZERO;
    equb.celebrated = false;

    let completed = equb.payout_history.len() as u32 >= equb.target_members;
    if completed {
        equb.status = EqubStatus::Completed;
    }

    info!(
        equb = %equb.name,
        recipient = %recipient_name,
        round,
        %amount,
        completed,
        "Payout recorded"
    );

    Ok(PayoutReceipt {
        equb_id: equb.id,
        recipient_id,
        round,
        amount,
        completed,
    })
}

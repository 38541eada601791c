//! Contribution Processor: validates and records payments and keeps the
//! cycle's progress and celebration state consistent.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::cycle;
use crate::error::{EqubError, EqubResult};
use crate::models::{Contribution, Equb, EqubStatus};

/// Result of a recorded contribution
#[derive(Debug, Clone)]
pub struct ContributionReceipt {
    pub equb_id: Uuid,
    pub member_id: Uuid,
    pub amount: Decimal,
    /// Requirement at the time of payment:
    /// `contribution_amount * (1 + missed_cycles)`
    pub required: Decimal,
    /// Progress after recomputation
    pub progress: Decimal,
    /// True when this payment completed the cycle's collection for the
    /// first time (fires at most once per cycle)
    pub goal_reached: bool,
}

/// Validate and record a payment for a member.
///
/// A payment below the computed requirement is not a hard failure: the
/// first attempt returns [`EqubError::BelowRequired`] and the caller may
/// re-submit with `accept_shortfall` once the user confirms.
pub fn contribute(
    equb: &mut Equb,
    member_id: Uuid,
    amount: Decimal,
    accept_shortfall: bool,
    now: NaiveDateTime,
) -> EqubResult<ContributionReceipt> {
    if equb.status != EqubStatus::Active {
        return Err(EqubError::Conflict(
            "Contributions are only accepted while the equb is active".to_string(),
        ));
    }
    let member = equb
        .member(member_id)
        .ok_or_else(|| EqubError::NotFound("Member not found in this equb".to_string()))?;
    let member_name = member.name.clone();
    if amount <= Decimal::ZERO {
        return Err(EqubError::Validation(
            "Contribution amount must be positive".to_string(),
        ));
    }

    let today = now.date();
    let missed = cycle::missed_cycles(equb, member_id, today);
    let required = equb.contribution_amount * Decimal::from(missed as u64 + 1);
    if amount < required && !accept_shortfall {
        return Err(EqubError::BelowRequired {
            required,
            offered: amount,
        });
    }

    // Duplicate check is scoped to the current cycle: one payment per
    // contribution period per member
    let duplicate = cycle::current_cycle_contributions(equb).any(|c| {
        c.user_id == member_id && cycle::same_period(equb.frequency, c.date.date(), today)
    });
    if duplicate {
        return Err(EqubError::Conflict(format!(
            "{} already contributed this {}",
            member_name,
            equb.frequency.period_label()
        )));
    }

    let cycle_used = cycle::current_cycle_index(equb);
    equb.contributions.push(Contribution {
        amount,
        user_id: member_id,
        date: now,
        cycle_used: Some(cycle_used),
    });

    equb.progress = cycle::progress(equb);

    let goal_reached = equb.progress >= Decimal::from(100)
        && cycle::is_fully_paid_up(equb, today)
        && !equb.celebrated;
    if goal_reached {
        equb.celebrated = true;
    }

    info!(
        equb = %equb.name,
        member = %member_name,
        %amount,
        progress = %equb.progress,
        goal_reached,
        "Contribution recorded"
    );

    Ok(ContributionReceipt {
        equb_id: equb.id,
        member_id,
        amount,
        required,
        progress: equb.progress,
        goal_reached,
    })
}

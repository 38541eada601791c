//! Cycle Calculator
//!
//! Pure, side-effect-free arithmetic over an equb's payout cycles: which
//! cycle the pool is currently collecting for, when that cycle started,
//! how many contribution periods a member has missed, and how far the
//! current cycle's collection has progressed toward the goal.
//!
//! Nothing here reads the clock; callers pass `today` explicitly so every
//! function is deterministic and directly testable.

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::models::{Contribution, Equb, EqubStatus, Frequency};

/// Per-member payment standing for the current period, the data behind
/// a "today's payments" view.
#[derive(Debug, Clone)]
pub struct MemberPaymentStatus {
    pub member_id: Uuid,
    pub member_name: String,
    /// Whether the member has a current-cycle contribution in the period
    /// containing `today`
    pub paid_this_period: bool,
    pub missed_cycles: u32,
    /// `missed_cycles * contribution_amount`
    pub outstanding: Decimal,
}

/// Index of the cycle the pool is currently collecting for.
///
/// Cycle 0 is the pool's first distribution cycle; the index advances
/// every `target_members` payouts.
pub fn current_cycle_index(equb: &Equb) -> u32 {
    if equb.target_members == 0 {
        return 0;
    }
    equb.payout_history.len() as u32 / equb.target_members
}

/// Calendar date the current cycle began.
///
/// The payout at index `cycle * target_members` marks the cycle boundary
/// when it exists; otherwise the cycle begins the day after the most
/// recent payout, or on the equb's start date when nothing has been paid
/// out yet.
pub fn cycle_start_date(equb: &Equb) -> NaiveDate {
    let boundary = current_cycle_index(equb) as usize * equb.target_members as usize;
    if let Some(payout) = equb.payout_history.get(boundary) {
        return payout.date.date();
    }
    if let Some(last) = equb.payout_history.last() {
        return last.date.date() + Duration::days(1);
    }
    equb.start_date
}

/// Whether a contribution counts toward the current cycle.
///
/// Tagged contributions match on their cycle tag. Untagged records from
/// legacy documents fall back to a date comparison: anything dated
/// strictly after the most recent payout, or any date at all when no
/// payout has occurred. This is the single attribution rule shared by
/// missed-cycle, progress, and payout computations.
pub fn is_in_current_cycle(equb: &Equb, contribution: &Contribution) -> bool {
    match contribution.cycle_used {
        Some(tag) => tag == current_cycle_index(equb),
        None => match equb.payout_history.last() {
            Some(last) => contribution.date > last.date,
            None => true,
        },
    }
}

/// Iterator over the contributions attributed to the current cycle
pub fn current_cycle_contributions<'a>(equb: &'a Equb) -> impl Iterator<Item = &'a Contribution> {
    equb.contributions
        .iter()
        .filter(move |c| is_in_current_cycle(equb, c))
}

/// Number of contribution periods expected from `cycle_start` through
/// yesterday. Today never counts: the member has until end of day to pay.
pub fn expected_cycles(frequency: Frequency, cycle_start: NaiveDate, today: NaiveDate) -> u32 {
    let yesterday = today - Duration::days(1);
    if yesterday < cycle_start {
        return 0;
    }
    let count = match frequency {
        Frequency::Daily => (yesterday - cycle_start).num_days() + 1,
        Frequency::Weekly => week_ordinal(yesterday) - week_ordinal(cycle_start) + 1,
        Frequency::Monthly => month_ordinal(yesterday) - month_ordinal(cycle_start) + 1,
        Frequency::Yearly => (yesterday.year() - cycle_start.year()) as i64 + 1,
    };
    count.max(0) as u32
}

/// How many contribution periods a member has missed in the current cycle.
///
/// One contribution satisfies one period regardless of amount.
pub fn missed_cycles(equb: &Equb, member_id: Uuid, today: NaiveDate) -> u32 {
    if equb.status != EqubStatus::Active {
        return 0;
    }
    let start = cycle_start_date(equb);
    // A cycle that has not begun cannot have missed payments
    if start > today {
        return 0;
    }
    let expected = expected_cycles(equb.frequency, start, today);
    let paid = current_cycle_contributions(equb)
        .filter(|c| c.user_id == member_id)
        .count() as u32;
    expected.saturating_sub(paid)
}

/// Percentage (0-100, capped) of the goal collected in the current cycle.
///
/// Always recomputed from the cycle's contributions, never patched
/// incrementally.
pub fn progress(equb: &Equb) -> Decimal {
    if equb.goal_amount <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let collected: Decimal = current_cycle_contributions(equb).map(|c| c.amount).sum();
    let hundred = Decimal::from(100);
    (collected / equb.goal_amount * hundred).min(hundred)
}

/// True when no member has missed periods in the current cycle
pub fn is_fully_paid_up(equb: &Equb, today: NaiveDate) -> bool {
    equb.members
        .iter()
        .all(|m| missed_cycles(equb, m.id, today) == 0)
}

/// Whether two dates fall in the same contribution period for a frequency
pub fn same_period(frequency: Frequency, a: NaiveDate, b: NaiveDate) -> bool {
    match frequency {
        Frequency::Daily => a == b,
        Frequency::Weekly => week_ordinal(a) == week_ordinal(b),
        Frequency::Monthly => month_ordinal(a) == month_ordinal(b),
        Frequency::Yearly => a.year() == b.year(),
    }
}

/// Payment standing of every member for the period containing `today`
pub fn payment_status(equb: &Equb, today: NaiveDate) -> Vec<MemberPaymentStatus> {
    equb.members
        .iter()
        .map(|m| {
            let paid_this_period = current_cycle_contributions(equb)
                .any(|c| c.user_id == m.id && same_period(equb.frequency, c.date.date(), today));
            let missed = missed_cycles(equb, m.id, today);
            MemberPaymentStatus {
                member_id: m.id,
                member_name: m.name.clone(),
                paid_this_period,
                missed_cycles: missed,
                outstanding: equb.contribution_amount * Decimal::from(missed),
            }
        })
        .collect()
}

/// Ordinal of the ISO week containing `date`, stable across year
/// boundaries. Weeks are anchored on their Monday.
fn week_ordinal(date: NaiveDate) -> i64 {
    let monday = date - Duration::days(date.weekday().num_days_from_monday() as i64);
    monday.num_days_from_ce() as i64 / 7
}

fn month_ordinal(date: NaiveDate) -> i64 {
    date.year() as i64 * 12 + date.month0() as i64
}

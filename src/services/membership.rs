//! Membership Manager: roster changes, join codes, payout-order upkeep,
//! and the forming -> active transition.

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use rand::Rng;
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::cycle;
use crate::error::{EqubError, EqubResult};
use crate::models::{Equb, EqubParams, EqubStatus, Member};

/// What happened when a member was removed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Member removed; ownership moved when the creator left
    Removed { new_creator: Option<Uuid> },
    /// The last member left; the caller should delete the equb
    EqubEmptied,
}

/// Generate a join code of the form `EQ-XXXX-<year>` that no existing
/// equb uses (comparison is case-insensitive)
pub fn generate_join_code<F>(code_taken: F, year: i32) -> String
where
    F: Fn(&str) -> bool,
{
    let mut rng = rand::thread_rng();
    loop {
        let tag: String = (0..4)
            .map(|_| {
                let c = rng.sample(rand::distributions::Alphanumeric) as char;
                c.to_ascii_uppercase()
            })
            .collect();
        let code = format!("EQ-{}-{}", tag, year);
        if !code_taken(&code) {
            return code;
        }
    }
}

/// Build a new equb in the forming state
pub fn create_equb(
    params: EqubParams,
    code: String,
    creator: Member,
    today: NaiveDate,
) -> EqubResult<Equb> {
    params.validate_for_create(today)?;
    let equb = Equb::new(params, code, creator);
    info!(equb = %equb.name, code = %equb.code, "Created equb");
    Ok(equb)
}

/// Add a member to the roster, either through a join code or directly by
/// the admin. Returns true when the roster filled and the equb activated.
pub fn add_member(equb: &mut Equb, member: Member) -> EqubResult<bool> {
    if equb.status == EqubStatus::Completed {
        return Err(EqubError::Conflict("This equb has completed".to_string()));
    }
    if equb.is_full() {
        return Err(EqubError::Conflict("Equb is already full".to_string()));
    }
    if equb.is_member(member.id) {
        return Err(EqubError::Conflict(
            "Already a member of this equb".to_string(),
        ));
    }

    let name = member.name.clone();
    equb.members.push(member);

    // Only a forming equb activates and deals a fresh order; a
    // replacement joining an active equb goes to the end of the
    // existing rotation
    let activated =
        equb.status == EqubStatus::Forming && equb.members.len() as u32 == equb.target_members;
    if activated {
        activate(equb);
    } else if equb.status == EqubStatus::Active {
        sync_payout_order(equb);
    }
    info!(equb = %equb.name, member = %name, activated, "Member added");
    Ok(activated)
}

/// Transition forming -> active and deal the initial payout order.
///
/// The shuffle is an unbiased Fisher-Yates, so every permutation of the
/// roster is equally likely.
fn activate(equb: &mut Equb) {
    equb.status = EqubStatus::Active;
    let mut order: Vec<Uuid> = equb.members.iter().map(|m| m.id).collect();
    order.shuffle(&mut rand::thread_rng());
    equb.payout_order = order;
}

/// Remove a member along with all of their contributions.
///
/// When the creator leaves and members remain, ownership transfers to the
/// earliest remaining member by position. Progress is recomputed because
/// the cycle's collected total shrinks with the removed contributions.
pub fn remove_member(equb: &mut Equb, member_id: Uuid) -> EqubResult<RemovalOutcome> {
    let position = equb
        .members
        .iter()
        .position(|m| m.id == member_id)
        .ok_or_else(|| EqubError::NotFound("Member not found in this equb".to_string()))?;

    let removed = equb.members.remove(position);
    equb.contributions.retain(|c| c.user_id != member_id);
    equb.payout_order.retain(|id| *id != member_id);

    if equb.members.is_empty() {
        info!(equb = %equb.name, member = %removed.name, "Last member removed");
        return Ok(RemovalOutcome::EqubEmptied);
    }

    let mut new_creator = None;
    if equb.creator_id == member_id {
        equb.creator_id = equb.members[0].id;
        new_creator = Some(equb.creator_id);
    }

    equb.progress = cycle::progress(equb);
    info!(equb = %equb.name, member = %removed.name, ?new_creator, "Member removed");
    Ok(RemovalOutcome::Removed { new_creator })
}

/// Keep the payout order equal (as an id set) to the member list:
/// entries for removed members are pruned, new members appended.
pub fn sync_payout_order(equb: &mut Equb) {
    equb.payout_order
        .retain(|id| equb.members.iter().any(|m| m.id == *id));
    for member in &equb.members {
        if !equb.payout_order.contains(&member.id) {
            equb.payout_order.push(member.id);
        }
    }
}

/// Move one entry of the payout order. A no-op when the indices match.
pub fn reorder_payout(equb: &mut Equb, from: usize, to: usize) -> EqubResult<()> {
    sync_payout_order(equb);
    let len = equb.payout_order.len();
    if from >= len || to >= len {
        return Err(EqubError::Validation(format!(
            "Payout order index out of range (have {} members)",
            len
        )));
    }
    if from == to {
        return Ok(());
    }
    let id = equb.payout_order.remove(from);
    equb.payout_order.insert(to, id);
    Ok(())
}

/// Apply validated parameter changes to an existing equb.
///
/// Progress is a ratio against the goal, so it is recomputed whenever
/// the parameters change; a goal change that drops the cycle below full
/// collection also clears the celebration flag.
pub fn edit_equb(equb: &mut Equb, params: EqubParams) -> EqubResult<()> {
    params.validate()?;
    if (equb.members.len() as u32) > params.target_members {
        return Err(EqubError::Validation(format!(
            "Cannot reduce target below the current roster of {}",
            equb.members.len()
        )));
    }
    equb.name = params.name;
    equb.frequency = params.frequency;
    equb.target_members = params.target_members;
    equb.goal_amount = params.goal_amount;
    equb.contribution_amount = params.contribution_amount;
    equb.start_date = params.start_date;

    equb.progress = cycle::progress(equb);
    if equb.progress < Decimal::from(100) {
        equb.celebrated = false;
    }
    Ok(())
}

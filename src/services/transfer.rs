//! Equb portability: export to a tagged JSON document and import with
//! identifier regeneration.
//!
//! Export strips the administrative fields (creator id); import assigns
//! a fresh equb id and join code so merged data can never collide with
//! what is already in the local store.

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::{EqubError, EqubResult};
use crate::models::{Contribution, Equb, EqubStatus, Frequency, Member, OwnerProfile, Payout};
use crate::store::SCHEMA_VERSION;

/// The export file format
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EqubExport {
    pub is_equb_export: bool,
    pub schema_version: u32,
    pub equb: PortableEqub,
    pub owner_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner_photo: Option<String>,
    pub exported_at: NaiveDateTime,
}

/// An equb as carried by an export file: no creator/admin fields, and
/// everything that might be absent in files from older builds defaults
/// to empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableEqub {
    pub name: String,
    pub frequency: Frequency,
    pub goal_amount: Decimal,
    pub contribution_amount: Decimal,
    pub target_members: u32,
    pub start_date: NaiveDate,
    pub status: EqubStatus,
    #[serde(default)]
    pub members: Vec<PortableMember>,
    #[serde(default)]
    pub contributions: Vec<Contribution>,
    #[serde(default)]
    pub payout_order: Vec<Uuid>,
    #[serde(default)]
    pub payout_history: Vec<Payout>,
    #[serde(default)]
    pub progress: Decimal,
    #[serde(default)]
    pub celebrated: bool,
}

/// Member record in an export file; ids and join dates are backfilled
/// on import when missing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortableMember {
    #[serde(default)]
    pub id: Option<Uuid>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default)]
    pub joined_at: Option<NaiveDateTime>,
}

/// Build the export document for an equb
pub fn export_equb(equb: &Equb, owner: Option<&OwnerProfile>, now: NaiveDateTime) -> EqubExport {
    EqubExport {
        is_equb_export: true,
        schema_version: SCHEMA_VERSION,
        equb: PortableEqub {
            name: equb.name.clone(),
            frequency: equb.frequency,
            goal_amount: equb.goal_amount,
            contribution_amount: equb.contribution_amount,
            target_members: equb.target_members,
            start_date: equb.start_date,
            status: equb.status,
            members: equb
                .members
                .iter()
                .map(|m| PortableMember {
                    id: Some(m.id),
                    name: m.name.clone(),
                    phone: m.phone.clone(),
                    joined_at: Some(m.joined_at),
                })
                .collect(),
            contributions: equb.contributions.clone(),
            payout_order: equb.payout_order.clone(),
            payout_history: equb.payout_history.clone(),
            progress: equb.progress,
            celebrated: equb.celebrated,
        },
        owner_name: owner.map(|o| o.name.clone()),
        owner_photo: owner.and_then(|o| o.photo.clone()),
        exported_at: now,
    }
}

/// Parse and validate an export file, rebuilding the equb under the
/// importing owner with a fresh id and the given join code.
///
/// The importer becomes the creator. When the importer is not among the
/// carried members they are appended if capacity allows; otherwise the
/// earliest member holds creatorship so the creator always references a
/// current member.
pub fn import_equb(
    raw: &str,
    owner: &OwnerProfile,
    code: String,
    now: NaiveDateTime,
) -> EqubResult<Equb> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| EqubError::Validation(format!("Not a valid JSON document: {}", e)))?;

    if value.get("isEqubExport").and_then(Value::as_bool) != Some(true) {
        return Err(EqubError::Validation(
            "Not an equb export file (missing export tag)".to_string(),
        ));
    }
    if value.get("equb").is_none() {
        return Err(EqubError::Validation(
            "Export file is missing the equb payload".to_string(),
        ));
    }

    let export: EqubExport = serde_json::from_value(value)
        .map_err(|e| EqubError::Validation(format!("Malformed export file: {}", e)))?;
    let portable = export.equb;

    let mut members: Vec<Member> = portable
        .members
        .into_iter()
        .map(|m| {
            Member::with_id(
                m.id.unwrap_or_else(Uuid::new_v4),
                m.name,
                m.phone,
                m.joined_at.unwrap_or(now),
            )
        })
        .collect();

    let creator_id = if members.iter().any(|m| m.id == owner.id) {
        owner.id
    } else if (members.len() as u32) < portable.target_members {
        let member = Member::with_id(owner.id, owner.name.clone(), owner.contact.clone(), now);
        members.push(member);
        owner.id
    } else {
        members
            .first()
            .map(|m| m.id)
            .ok_or_else(|| EqubError::Validation("Export file carries no members".to_string()))?
    };

    let mut payout_order = portable.payout_order;
    payout_order.retain(|id| members.iter().any(|m| m.id == *id));

    let equb = Equb {
        id: Uuid::new_v4(),
        code,
        name: portable.name,
        frequency: portable.frequency,
        creator_id,
        members,
        goal_amount: portable.goal_amount,
        contribution_amount: portable.contribution_amount,
        target_members: portable.target_members,
        start_date: portable.start_date,
        status: portable.status,
        contributions: portable.contributions,
        payout_order,
        payout_history: portable.payout_history,
        progress: portable.progress,
        celebrated: portable.celebrated,
    };

    info!(equb = %equb.name, code = %equb.code, "Imported equb");
    Ok(equb)
}

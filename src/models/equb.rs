use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{EqubError, EqubResult};

use super::{Contribution, Member, Payout};

/// Contribution frequency of an equb
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
            Frequency::Yearly => "yearly",
        }
    }

    /// Human label for the period covered by one contribution
    pub fn period_label(&self) -> &'static str {
        match self {
            Frequency::Daily => "day",
            Frequency::Weekly => "week",
            Frequency::Monthly => "month",
            Frequency::Yearly => "year",
        }
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            "yearly" => Ok(Frequency::Yearly),
            _ => Err(format!("Invalid frequency: {}", s)),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lifecycle state of an equb: forming -> active -> completed (terminal)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EqubStatus {
    Forming,
    Active,
    Completed,
}

impl EqubStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            EqubStatus::Forming => "forming",
            EqubStatus::Active => "active",
            EqubStatus::Completed => "completed",
        }
    }
}

/// Parameters for creating or editing an equb
#[derive(Debug, Clone)]
pub struct EqubParams {
    pub name: String,
    pub frequency: Frequency,
    pub target_members: u32,
    pub goal_amount: Decimal,
    pub contribution_amount: Decimal,
    pub start_date: NaiveDate,
}

impl EqubParams {
    /// Validate the field values shared by create and edit
    pub fn validate(&self) -> EqubResult<()> {
        if self.name.trim().is_empty() {
            return Err(EqubError::Validation("Equb name is required".to_string()));
        }
        if self.target_members < 2 {
            return Err(EqubError::Validation(
                "Target members must be at least 2".to_string(),
            ));
        }
        if self.goal_amount <= Decimal::ZERO {
            return Err(EqubError::Validation(
                "Goal amount must be positive".to_string(),
            ));
        }
        if self.contribution_amount <= Decimal::ZERO {
            return Err(EqubError::Validation(
                "Contribution amount must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Creation additionally requires the first cycle not to start in the past
    pub fn validate_for_create(&self, today: NaiveDate) -> EqubResult<()> {
        self.validate()?;
        if self.start_date < today {
            return Err(EqubError::Validation(
                "Start date must not be in the past".to_string(),
            ));
        }
        Ok(())
    }

    /// Even split of the goal across the roster, rounded to cents
    pub fn suggested_contribution(goal_amount: Decimal, target_members: u32) -> Decimal {
        if target_members == 0 {
            return Decimal::ZERO;
        }
        (goal_amount / Decimal::from(target_members)).round_dp(2)
    }
}

/// A rotating savings group.
///
/// Contributions and payout history are append-only; `progress` and
/// `celebrated` are derived per collection cycle and reset when a payout
/// is recorded. `payout_order` is a permutation of the current members.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Equb {
    pub id: Uuid,
    /// Human-shareable join code, unique (case-insensitively) across the store
    pub code: String,
    pub name: String,
    pub frequency: Frequency,
    pub creator_id: Uuid,
    pub members: Vec<Member>,
    pub goal_amount: Decimal,
    pub contribution_amount: Decimal,
    pub target_members: u32,
    pub start_date: NaiveDate,
    pub status: EqubStatus,
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

impl Equb {
    /// Create a new equb in the forming state with its creator as the
    /// only member
    pub fn new(params: EqubParams, code: String, creator: Member) -> Self {
        Self {
            id: Uuid::new_v4(),
            code,
            name: params.name,
            frequency: params.frequency,
            creator_id: creator.id,
            members: vec![creator],
            goal_amount: params.goal_amount,
            contribution_amount: params.contribution_amount,
            target_members: params.target_members,
            start_date: params.start_date,
            status: EqubStatus::Forming,
            contributions: Vec::new(),
            payout_order: Vec::new(),
            payout_history: Vec::new(),
            progress: Decimal::ZERO,
            celebrated: false,
        }
    }

    pub fn member(&self, member_id: Uuid) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn is_member(&self, member_id: Uuid) -> bool {
        self.member(member_id).is_some()
    }

    pub fn is_creator(&self, user_id: Uuid) -> bool {
        self.creator_id == user_id
    }

    pub fn is_full(&self) -> bool {
        self.members.len() as u32 >= self.target_members
    }

    /// Case-insensitive join-code comparison
    pub fn matches_code(&self, code: &str) -> bool {
        self.code.eq_ignore_ascii_case(code.trim())
    }
}

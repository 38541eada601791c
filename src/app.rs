//! Application facade: the command/query surface the UI layer drives.
//!
//! `EqubApp` owns the ledger store and a clock. Every command validates
//! fully before mutating, records an activity entry, and persists the
//! whole document before returning, so callers never observe a torn
//! state.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;
use uuid::Uuid;

use crate::cycle::{self, MemberPaymentStatus};
use crate::error::{EqubError, EqubResult};
use crate::models::{ActivityEntry, Equb, EqubParams, Member, OwnerProfile};
use crate::services::{contribution, membership, payout, transfer};
use crate::services::{ContributionReceipt, PayoutReceipt, RemovalOutcome};
use crate::store::{LedgerStore, StorageBackend};

/// Current-time source. Injected so date-sensitive logic is testable
/// with a fixed clock.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;

    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Wall-clock time in UTC
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Utc::now().naive_utc()
    }
}

/// The top-level application object owning all ledger state
pub struct EqubApp {
    store: LedgerStore,
    clock: Box<dyn Clock>,
}

impl EqubApp {
    /// Open the ledger with the system clock
    pub fn open(backend: Box<dyn StorageBackend>) -> EqubResult<Self> {
        Self::with_clock(backend, Box::new(SystemClock))
    }

    /// Open the ledger with an explicit clock (tests)
    pub fn with_clock(backend: Box<dyn StorageBackend>, clock: Box<dyn Clock>) -> EqubResult<Self> {
        let store = LedgerStore::open(backend)?;
        Ok(Self { store, clock })
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub fn owner(&self) -> Option<&OwnerProfile> {
        self.store.owner()
    }

    pub fn equb(&self, equb_id: Uuid) -> EqubResult<&Equb> {
        self.store
            .equb(equb_id)
            .ok_or_else(|| EqubError::NotFound("Equb not found".to_string()))
    }

    pub fn current_equb(&self) -> Option<&Equb> {
        self.store
            .document()
            .current_equb_id
            .and_then(|id| self.store.equb(id))
    }

    pub fn equbs_for_user(&self, user_id: Uuid) -> Vec<&Equb> {
        self.store.equbs_for_user(user_id)
    }

    /// All equbs in the store
    pub fn equbs(&self) -> &[Equb] {
        &self.store.document().equbs
    }

    pub fn missed_cycles(&self, equb_id: Uuid, member_id: Uuid) -> EqubResult<u32> {
        let equb = self.equb(equb_id)?;
        Ok(cycle::missed_cycles(equb, member_id, self.clock.today()))
    }

    pub fn is_fully_paid_up(&self, equb_id: Uuid) -> EqubResult<bool> {
        let equb = self.equb(equb_id)?;
        Ok(cycle::is_fully_paid_up(equb, self.clock.today()))
    }

    pub fn progress(&self, equb_id: Uuid) -> EqubResult<Decimal> {
        Ok(self.equb(equb_id)?.progress)
    }

    /// Per-member payment standing for the current period
    pub fn payment_status(&self, equb_id: Uuid) -> EqubResult<Vec<MemberPaymentStatus>> {
        let equb = self.equb(equb_id)?;
        Ok(cycle::payment_status(equb, self.clock.today()))
    }

    /// Activity feed, newest first; scoped to one equb when an id is given
    pub fn activity(&self, equb_id: Option<Uuid>) -> Vec<&ActivityEntry> {
        self.store.activity(equb_id)
    }

    // =========================================================================
    // COMMANDS
    // =========================================================================

    /// Set or replace the owner profile of this ledger instance
    pub fn set_owner(
        &mut self,
        name: &str,
        contact: Option<String>,
        photo: Option<String>,
    ) -> EqubResult<Uuid> {
        if name.trim().is_empty() {
            return Err(EqubError::Validation("Owner name is required".to_string()));
        }
        let now = self.clock.now();
        let mut profile = OwnerProfile::new(name.trim(), contact, now);
        profile.photo = photo;
        let owner_id = profile.id;
        self.store.document_mut().owner = Some(profile);
        self.record_activity(format!("{} set up this ledger", name.trim()), None)?;
        Ok(owner_id)
    }

    /// Create a new equb with the owner as its creator and first member
    pub fn create_equb(&mut self, params: EqubParams) -> EqubResult<Uuid> {
        let owner = self.require_owner()?.clone();
        let now = self.clock.now();
        let today = self.clock.today();

        let code = membership::generate_join_code(|c| self.store.code_exists(c), today.year());
        let creator = Member::with_id(owner.id, owner.name.clone(), owner.contact.clone(), now);
        let equb = membership::create_equb(params, code, creator, today)?;

        let equb_id = equb.id;
        let name = equb.name.clone();
        self.store.document_mut().equbs.push(equb);
        self.store.document_mut().current_equb_id = Some(equb_id);
        self.record_activity(format!("{} created {}", owner.name, name), Some(equb_id))?;
        Ok(equb_id)
    }

    /// Join an equb by its shareable code (case-insensitive)
    pub fn join_equb(&mut self, code: &str) -> EqubResult<Uuid> {
        let owner = self.require_owner()?.clone();
        let now = self.clock.now();

        let equb_id = self
            .store
            .equb_by_code(code)
            .map(|e| e.id)
            .ok_or_else(|| EqubError::NotFound("Invalid join code".to_string()))?;

        let member = Member::with_id(owner.id, owner.name.clone(), owner.contact.clone(), now);
        let (name, activated) = {
            let equb = self.equb_mut(equb_id)?;
            let activated = membership::add_member(equb, member)?;
            (equb.name.clone(), activated)
        };

        self.store.document_mut().current_equb_id = Some(equb_id);
        self.record_activity(format!("{} joined {}", owner.name, name), Some(equb_id))?;
        if activated {
            self.record_activity(
                format!("{} is now active with a full roster", name),
                Some(equb_id),
            )?;
        }
        Ok(equb_id)
    }

    /// Add a member to the roster directly (creator only)
    pub fn add_member(
        &mut self,
        equb_id: Uuid,
        name: &str,
        phone: Option<String>,
    ) -> EqubResult<Uuid> {
        let owner = self.require_owner()?.clone();
        let now = self.clock.now();
        if name.trim().is_empty() {
            return Err(EqubError::Validation("Member name is required".to_string()));
        }

        let member = Member::new(name.trim(), phone, now);
        let member_id = member.id;
        let (equb_name, activated) = {
            let equb = self.equb_mut(equb_id)?;
            if !equb.is_creator(owner.id) {
                return Err(EqubError::Permission(
                    "Only the equb creator can add members".to_string(),
                ));
            }
            let activated = membership::add_member(equb, member)?;
            (equb.name.clone(), activated)
        };

        self.record_activity(
            format!("{} added {} to {}", owner.name, name.trim(), equb_name),
            Some(equb_id),
        )?;
        if activated {
            self.record_activity(
                format!("{} is now active with a full roster", equb_name),
                Some(equb_id),
            )?;
        }
        Ok(member_id)
    }

    /// Remove a member. The creator can remove anyone; a member can only
    /// remove themself. Removing the last member deletes the equb.
    pub fn remove_member(&mut self, equb_id: Uuid, member_id: Uuid) -> EqubResult<()> {
        let owner = self.require_owner()?.clone();

        let (equb_name, outcome, member_name) = {
            let equb = self.equb_mut(equb_id)?;
            if !equb.is_creator(owner.id) && member_id != owner.id {
                return Err(EqubError::Permission(
                    "Only the equb creator can remove other members".to_string(),
                ));
            }
            let member_name = equb
                .member(member_id)
                .map(|m| m.name.clone())
                .ok_or_else(|| EqubError::NotFound("Member not found in this equb".to_string()))?;
            let outcome = membership::remove_member(equb, member_id)?;
            (equb.name.clone(), outcome, member_name)
        };

        match outcome {
            RemovalOutcome::EqubEmptied => {
                self.store.remove_equb(equb_id);
                self.record_activity(
                    format!("{} left and {} was deleted", member_name, equb_name),
                    None,
                )?;
            }
            RemovalOutcome::Removed { new_creator } => {
                self.record_activity(
                    format!("{} left {}", member_name, equb_name),
                    Some(equb_id),
                )?;
                if let Some(creator_id) = new_creator {
                    let creator_name = self
                        .equb(equb_id)?
                        .member(creator_id)
                        .map(|m| m.name.clone())
                        .unwrap_or_default();
                    self.record_activity(
                        format!("{} now manages {}", creator_name, equb_name),
                        Some(equb_id),
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Record a contribution for a member of an equb
    pub fn contribute(
        &mut self,
        equb_id: Uuid,
        member_id: Uuid,
        amount: Decimal,
        accept_shortfall: bool,
    ) -> EqubResult<ContributionReceipt> {
        self.require_owner()?;
        let now = self.clock.now();

        let (receipt, equb_name, member_name) = {
            let equb = self.equb_mut(equb_id)?;
            let receipt = contribution::contribute(equb, member_id, amount, accept_shortfall, now)?;
            let member_name = equb
                .member(member_id)
                .map(|m| m.name.clone())
                .unwrap_or_default();
            (receipt, equb.name.clone(), member_name)
        };

        self.record_activity(
            format!("{} paid {} ETB into {}", member_name, amount, equb_name),
            Some(equb_id),
        )?;
        if receipt.goal_reached {
            self.record_activity(
                format!("{} reached its goal for this round", equb_name),
                Some(equb_id),
            )?;
        }
        Ok(receipt)
    }

    /// Distribute the pool to a member (creator only)
    pub fn payout(&mut self, equb_id: Uuid, recipient_id: Uuid) -> EqubResult<PayoutReceipt> {
        let owner = self.require_owner()?.clone();
        let now = self.clock.now();

        let (receipt, equb_name, recipient_name) = {
            let equb = self.equb_mut(equb_id)?;
            let recipient_name = equb
                .member(recipient_id)
                .map(|m| m.name.clone())
                .unwrap_or_default();
            let receipt = payout::payout(equb, owner.id, recipient_id, now)?;
            (receipt, equb.name.clone(), recipient_name)
        };

        self.record_activity(
            format!(
                "{} received the round {} payout of {} ETB from {}",
                recipient_name, receipt.round, receipt.amount, equb_name
            ),
            Some(equb_id),
        )?;
        if receipt.completed {
            self.record_activity(
                format!("{} completed its rotation", equb_name),
                Some(equb_id),
            )?;
        }
        Ok(receipt)
    }

    /// Manually reorder the payout sequence (creator only)
    pub fn reorder_payout(&mut self, equb_id: Uuid, from: usize, to: usize) -> EqubResult<()> {
        let owner = self.require_owner()?.clone();
        {
            let equb = self.equb_mut(equb_id)?;
            if !equb.is_creator(owner.id) {
                return Err(EqubError::Permission(
                    "Only the equb creator can reorder payouts".to_string(),
                ));
            }
            membership::reorder_payout(equb, from, to)?;
        }
        self.persist()?;
        Ok(())
    }

    /// Edit an equb's parameters (creator only)
    pub fn edit_equb(&mut self, equb_id: Uuid, params: EqubParams) -> EqubResult<()> {
        let owner = self.require_owner()?.clone();
        let name = {
            let equb = self.equb_mut(equb_id)?;
            if !equb.is_creator(owner.id) {
                return Err(EqubError::Permission(
                    "Only the equb creator can edit this equb".to_string(),
                ));
            }
            membership::edit_equb(equb, params)?;
            equb.name.clone()
        };
        self.record_activity(format!("{} updated {}", owner.name, name), Some(equb_id))?;
        Ok(())
    }

    /// Delete an equb outright (creator only)
    pub fn delete_equb(&mut self, equb_id: Uuid) -> EqubResult<()> {
        let owner = self.require_owner()?.clone();
        let name = {
            let equb = self.equb(equb_id)?;
            if !equb.is_creator(owner.id) {
                return Err(EqubError::Permission(
                    "Only the equb creator can delete this equb".to_string(),
                ));
            }
            equb.name.clone()
        };
        self.store.remove_equb(equb_id);
        self.record_activity(format!("{} deleted {}", owner.name, name), None)?;
        Ok(())
    }

    /// Remember which equb the user is looking at
    pub fn select_equb(&mut self, equb_id: Uuid) -> EqubResult<()> {
        self.equb(equb_id)?;
        self.store.document_mut().current_equb_id = Some(equb_id);
        self.persist()
    }

    /// Serialize an equb to the portable export format
    pub fn export_equb(&self, equb_id: Uuid) -> EqubResult<String> {
        let equb = self.equb(equb_id)?;
        let export = transfer::export_equb(equb, self.owner(), self.clock.now());
        Ok(serde_json::to_string_pretty(&export)?)
    }

    /// Import an equb from an export document, regenerating identifiers
    pub fn import_equb(&mut self, raw: &str) -> EqubResult<Uuid> {
        let owner = self.require_owner()?.clone();
        let now = self.clock.now();
        let today = self.clock.today();

        let code = membership::generate_join_code(|c| self.store.code_exists(c), today.year());
        let equb = transfer::import_equb(raw, &owner, code, now)?;

        let equb_id = equb.id;
        let name = equb.name.clone();
        self.store.document_mut().equbs.push(equb);
        self.store.document_mut().current_equb_id = Some(equb_id);
        self.record_activity(format!("{} imported {}", owner.name, name), Some(equb_id))?;
        Ok(equb_id)
    }

    // =========================================================================
    // INTERNAL
    // =========================================================================

    fn equb_mut(&mut self, equb_id: Uuid) -> EqubResult<&mut Equb> {
        self.store
            .equb_mut(equb_id)
            .ok_or_else(|| EqubError::NotFound("Equb not found".to_string()))
    }

    fn require_owner(&self) -> EqubResult<&OwnerProfile> {
        self.store.owner().ok_or_else(|| {
            EqubError::Validation(
                "No owner profile set; initialize the ledger first".to_string(),
            )
        })
    }

    /// Append an activity entry and persist the document
    fn record_activity(&mut self, message: String, equb_id: Option<Uuid>) -> EqubResult<()> {
        info!(?equb_id, "{}", message);
        let entry = ActivityEntry::new(message, equb_id, self.clock.now());
        self.store.push_activity(entry);
        self.persist()
    }

    fn persist(&self) -> EqubResult<()> {
        self.store.persist()
    }
}

//! Persistence: the whole application state as one document, saved
//! atomically after every mutation.

pub mod backend;
pub mod migration;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use migration::SCHEMA_VERSION;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;
use uuid::Uuid;

use crate::error::EqubResult;
use crate::models::{ActivityEntry, Equb, OwnerProfile};

/// The persisted state document: everything one ledger instance knows
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDocument {
    pub schema_version: u32,
    #[serde(default)]
    pub owner: Option<OwnerProfile>,
    #[serde(default)]
    pub current_equb_id: Option<Uuid>,
    #[serde(default)]
    pub equbs: Vec<Equb>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

impl Default for StateDocument {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            owner: None,
            current_equb_id: None,
            equbs: Vec::new(),
            activity: Vec::new(),
        }
    }
}

/// Owns the in-memory document and its persistence backend.
///
/// All queries read the in-memory document; `persist` serializes it whole
/// and hands it to the backend. A failed persist is surfaced as a hard
/// error while the in-memory state stays authoritative for the session.
pub struct LedgerStore {
    document: StateDocument,
    backend: Box<dyn StorageBackend>,
}

impl LedgerStore {
    /// Load the document from the backend, running forward migrations
    /// when the stored schema is older than current
    pub fn open(backend: Box<dyn StorageBackend>) -> EqubResult<Self> {
        let document = match backend.load()? {
            Some(raw) => {
                let value: Value = serde_json::from_str(&raw)?;
                let migrated = migration::migrate(value)?;
                let document: StateDocument = serde_json::from_value(migrated)?;
                info!(
                    equbs = document.equbs.len(),
                    "Loaded state document (schema v{})", document.schema_version
                );
                document
            }
            None => {
                info!("No stored document found, starting with an empty ledger");
                StateDocument::default()
            }
        };
        Ok(Self { document, backend })
    }

    pub fn document(&self) -> &StateDocument {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut StateDocument {
        &mut self.document
    }

    /// Serialize and write the whole document
    pub fn persist(&self) -> EqubResult<()> {
        let raw = serde_json::to_string_pretty(&self.document)?;
        self.backend.save(&raw)
    }

    pub fn owner(&self) -> Option<&OwnerProfile> {
        self.document.owner.as_ref()
    }

    pub fn equb(&self, equb_id: Uuid) -> Option<&Equb> {
        self.document.equbs.iter().find(|e| e.id == equb_id)
    }

    pub fn equb_mut(&mut self, equb_id: Uuid) -> Option<&mut Equb> {
        self.document.equbs.iter_mut().find(|e| e.id == equb_id)
    }

    /// Find an equb by join code, case-insensitively
    pub fn equb_by_code(&self, code: &str) -> Option<&Equb> {
        self.document.equbs.iter().find(|e| e.matches_code(code))
    }

    pub fn code_exists(&self, code: &str) -> bool {
        self.equb_by_code(code).is_some()
    }

    /// Equbs the given user belongs to
    pub fn equbs_for_user(&self, user_id: Uuid) -> Vec<&Equb> {
        self.document
            .equbs
            .iter()
            .filter(|e| e.is_member(user_id))
            .collect()
    }

    pub fn remove_equb(&mut self, equb_id: Uuid) {
        self.document.equbs.retain(|e| e.id != equb_id);
        if self.document.current_equb_id == Some(equb_id) {
            self.document.current_equb_id = None;
        }
    }

    pub fn push_activity(&mut self, entry: ActivityEntry) {
        self.document.activity.push(entry);
    }

    /// Activity feed, newest first. With an equb id, returns that equb's
    /// entries plus global ones.
    pub fn activity(&self, equb_id: Option<Uuid>) -> Vec<&ActivityEntry> {
        let mut entries: Vec<&ActivityEntry> = self
            .document
            .activity
            .iter()
            .filter(|a| match equb_id {
                Some(id) => a.equb_id == Some(id) || a.equb_id.is_none(),
                None => true,
            })
            .collect();
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        entries
    }
}

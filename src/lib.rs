//! Equb Ledger
//!
//! A local-first rotating savings club ("equb") engine: members of a
//! group contribute toward a shared goal each period, and the pool is
//! paid out to one member per round until everyone has been paid once.
//!
//! All state lives in a single JSON document persisted atomically after
//! every mutation. The [`app::EqubApp`] facade exposes the query and
//! command surface; the cycle arithmetic behind missed payments and
//! collection progress lives in [`cycle`].

pub mod app;
pub mod config;
pub mod cycle;
pub mod error;
pub mod models;
pub mod services;
pub mod store;

// Re-export commonly used types
pub use app::{Clock, EqubApp, SystemClock};
pub use config::AppConfig;
pub use error::{EqubError, EqubResult};
pub use store::{FileBackend, LedgerStore, MemoryBackend, StateDocument, StorageBackend};

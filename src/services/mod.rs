//! Business logic for the ledger: membership, contributions, payouts,
//! and equb portability. Functions here mutate a single equb (or build a
//! new one) and never touch persistence; the application facade in
//! `crate::app` persists after every successful mutation.

pub mod contribution;
pub mod membership;
pub mod payout;
pub mod transfer;

pub use contribution::ContributionReceipt;
pub use membership::RemovalOutcome;
pub use payout::PayoutReceipt;
pub use transfer::EqubExport;

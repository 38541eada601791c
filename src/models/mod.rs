//! Data models for the equb ledger

pub mod activity;
pub mod contribution;
pub mod equb;
pub mod member;
pub mod owner;
pub mod payout;

pub use activity::ActivityEntry;
pub use contribution::Contribution;
pub use equb::{Equb, EqubParams, EqubStatus, Frequency};
pub use member::Member;
pub use owner::OwnerProfile;
pub use payout::Payout;

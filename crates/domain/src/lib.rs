//! Facts a bid submission depends on.
//!
//! This crate provides:
//! - Identity resolution (credential → company → supplier id)
//! - Need inspection (item costs and proposal deadline)
//! - Marketplace wall-clock timestamps
//! - The timing gate that holds submission until its window opens

pub mod deadline;
pub mod error;
pub mod identity;
pub mod need;
pub mod timing;

pub use deadline::{MARKET_DATETIME_FORMAT, MarketTimestamp, TimestampError, offset_from_hours};
pub use error::DomainError;
pub use identity::{Identity, IdentityResolver};
pub use need::{NeedDetails, NeedInspector};
pub use timing::{
    Clock, FixedClock, GateDecision, SystemClock, TimingGate, TimingMode, TimingPolicy,
    is_window_open, wait_duration, window_opens_at,
};

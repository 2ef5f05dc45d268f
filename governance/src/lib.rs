//! Stake-weighted slate governance.
//!
//! Voters lock stake into the [`ApprovalLedger`] and pick one slate (an
//! ordered list of candidate addresses). Every candidate carries an approval
//! counter equal to the summed weight of all voters whose current slate names
//! it, once per occurrence. The most-approved candidate can be lifted to the
//! hat.
//!
//! Key invariant: `approvals[a] == Σ weight(v)` over voters `v` whose slate
//! contains `a`, after every operation.

pub mod approvals;
pub mod error;
pub mod params;
pub mod polling;
pub mod slate;

pub use approvals::{ApprovalLedger, LedgerSnapshot, VoterRecord};
pub use error::GovernanceError;
pub use params::ChiefParams;
pub use polling::{Poll, PollEvent, PollingEmitter};
pub use slate::SlateRegistry;

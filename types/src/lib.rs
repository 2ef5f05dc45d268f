//! Fundamental types for the chief governance engine.
//!
//! This crate defines the core types shared across every other crate in the workspace:
//! addresses, token amounts, slate identifiers and the per-call gas meter.

pub mod address;
pub mod amount;
pub mod error;
pub mod gas;
pub mod hash;

pub use address::Address;
pub use amount::Amount;
pub use error::ParseError;
pub use gas::{CallContext, GasError, GasMeter};
pub use hash::SlateId;

//! Balance ledger for the chief governance engine.
//!
//! Two fungible tokens take part in every deposit:
//! - the **stake** token, locked into the approval ledger to gain weight
//! - the **receipt** token, minted 1:1 on deposit and burned 1:1 on withdrawal
//!
//! The engine only talks to them through [`TokenLedger`], so any ledger with
//! the same transfer/mint/burn semantics can be plugged in. [`Token`] is the
//! in-memory implementation the runtime deploys.

pub mod error;
pub mod ledger;
pub mod token;

pub use error::TokenError;
pub use ledger::{Ledgers, TokenLedger};
pub use token::Token;

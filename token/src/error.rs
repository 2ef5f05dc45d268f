//! Token ledger errors.

use chief_types::{Address, Amount, GasError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("insufficient balance for {holder}: need {needed}, have {available}")]
    InsufficientBalance { holder: Address, needed: Amount, available: Amount },

    #[error("insufficient allowance from {owner} to {spender}: need {needed}, have {available}")]
    InsufficientAllowance {
        owner: Address,
        spender: Address,
        needed: Amount,
        available: Amount,
    },

    #[error("{0} is not the token authority")]
    NotAuthority(Address),

    #[error("mint would overflow the total supply")]
    SupplyOverflow,

    #[error(transparent)]
    Gas(#[from] GasError),
}

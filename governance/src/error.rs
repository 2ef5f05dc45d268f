use chief_token::TokenError;
use chief_types::{Address, Amount, GasError, SlateId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GovernanceError {
    #[error("slate has {len} addresses, maximum is {max}")]
    SlateTooLarge { len: usize, max: usize },

    #[error("slate {0} is not registered")]
    UnknownSlate(SlateId),

    #[error("insufficient weight for {voter}: have {have}, need {need}")]
    InsufficientWeight { voter: Address, have: Amount, need: Amount },

    #[error("arithmetic overflow")]
    ArithmeticOverflow,

    #[error("invariant violated: {0}")]
    InvariantViolation(String),

    #[error("{candidate} has {candidate_approvals} approvals, hat {hat} has {hat_approvals}")]
    NotMoreApproved {
        candidate: Address,
        candidate_approvals: Amount,
        hat: Address,
        hat_approvals: Amount,
    },

    #[error("poll {0} not found")]
    UnknownPoll(u64),

    #[error("poll {0} has been withdrawn")]
    PollWithdrawn(u64),

    #[error("{caller} did not create poll {poll_id}")]
    NotPollCreator { poll_id: u64, caller: Address },

    #[error("snapshot error: {0}")]
    Snapshot(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Gas(#[from] GasError),
}

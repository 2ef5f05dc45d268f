use chief_governance::GovernanceError;
use chief_token::TokenError;
use chief_types::{Address, GasError};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProxyError {
    #[error("{caller} is neither the cold nor the hot key of proxy {proxy}")]
    Unauthorized { caller: Address, proxy: Address },

    #[error("hot key {hot} already controls proxy {proxy}")]
    ProxyAlreadyExists { hot: Address, proxy: Address },

    #[error("proxy is bound to engine {expected}, not {got}")]
    WrongEngine { expected: Address, got: Address },

    #[error("proxy is bound to polling emitter {expected}, not {got}")]
    WrongPolling { expected: Address, got: Address },

    #[error("cold and hot keys must be non-zero")]
    ZeroKey,

    #[error("{polls} poll ids but {options} options")]
    PollBatchMismatch { polls: usize, options: usize },

    #[error(transparent)]
    Governance(#[from] GovernanceError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Gas(#[from] GasError),
}

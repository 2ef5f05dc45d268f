use chief_types::{Address, GasError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("governance error: {0}")]
    Governance(#[from] chief_governance::GovernanceError),

    #[error("proxy error: {0}")]
    Proxy(#[from] chief_proxy::ProxyError),

    #[error("token error: {0}")]
    Token(#[from] chief_token::TokenError),

    #[error(transparent)]
    Gas(#[from] GasError),

    #[error("no proxy at {0}")]
    UnknownProxy(Address),

    #[error("no proxy bound to hot key {0}")]
    NoProxyForHotKey(Address),

    #[error("config error: {0}")]
    Config(String),

    #[error("logging error: {0}")]
    Logging(String),

    #[error("scenario error at step {step}: {message}")]
    Scenario { step: usize, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

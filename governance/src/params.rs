//! Construction parameters of the approval ledger.

use serde::{Deserialize, Serialize};

/// Default maximum number of addresses in one slate.
pub const DEFAULT_MAX_SLATE_SIZE: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChiefParams {
    /// Longest slate that may be registered or voted for.
    pub max_slate_size: usize,
}

impl ChiefParams {
    pub fn with_max_slate_size(max_slate_size: usize) -> Self {
        Self { max_slate_size }
    }
}

impl Default for ChiefParams {
    fn default() -> Self {
        Self { max_slate_size: DEFAULT_MAX_SLATE_SIZE }
    }
}

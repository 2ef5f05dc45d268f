//! Host runtime for the governance components.
//!
//! Owns the stake and receipt tokens, the approval ledger, the polling
//! emitter, the proxy registry and every deployed proxy, and executes calls
//! against them one at a time with all-or-nothing semantics.

pub mod config;
pub mod error;
pub mod logging;
pub mod runtime;
pub mod scenario;

pub use config::RuntimeConfig;
pub use error::RuntimeError;
pub use logging::{init_logging, LogFormat};
pub use runtime::{Receipt, Runtime, World};
pub use scenario::{Call, Report, Scenario, Step, StepOutcome};

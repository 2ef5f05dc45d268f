//! Voting proxies: split custody from voting.
//!
//! A [`VoteProxy`] binds a cold key (ultimate owner) and a hot key
//! (day-to-day operator) to one pool of stake. Either key may lock, vote and
//! withdraw, but every path that moves stake out of the proxy ends at the
//! cold key, so the hot key can be exposed operationally without ever being
//! able to take the funds.
//!
//! The [`ProxyRegistry`] creates proxies and guarantees that a hot key is
//! bound to at most one of them.

pub mod capability;
pub mod error;
pub mod proxy;
pub mod registry;

pub use capability::{Action, ProxyKey};
pub use error::ProxyError;
pub use proxy::VoteProxy;
pub use registry::ProxyRegistry;

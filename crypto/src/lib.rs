//! Hashing primitives for the chief governance engine.
//!
//! - **Blake2b-256** content hashes identify slates
//! - Component and test-key addresses are derived from Blake2b digests

pub mod address;
pub mod hash;

pub use address::{address_from_seed, contract_address};
pub use hash::{blake2b_256, blake2b_256_multi, hash_slate};

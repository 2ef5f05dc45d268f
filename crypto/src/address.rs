//! Deterministic address derivation.
//!
//! Component addresses are `Blake2b-256(deployer || nonce)` truncated to the
//! trailing 20 bytes, so redeploying the same sequence yields the same layout.

use crate::hash::blake2b_256_multi;
use chief_types::Address;

/// Address of the `nonce`-th component deployed by `deployer`.
pub fn contract_address(deployer: &Address, nonce: u64) -> Address {
    let digest = blake2b_256_multi(&[b"contract", deployer.as_bytes(), &nonce.to_be_bytes()]);
    Address::from_digest(&digest)
}

/// Address derived from an arbitrary seed, e.g. a key label in a scenario.
pub fn address_from_seed(seed: &[u8]) -> Address {
    let digest = blake2b_256_multi(&[b"key", seed]);
    Address::from_digest(&digest)
}

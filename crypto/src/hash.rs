//! Blake2b hashing for slate identifiers.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use chief_types::{Address, SlateId};

type Blake2b256 = Blake2b<U32>;

/// Compute a 256-bit Blake2b hash of arbitrary data.
pub fn blake2b_256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    hasher.update(data);
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Hash multiple byte slices in sequence (avoids concatenation allocation).
pub fn blake2b_256_multi(parts: &[&[u8]]) -> [u8; 32] {
    let mut hasher = Blake2b256::new();
    for part in parts {
        hasher.update(part);
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}

/// Content hash of an ordered address list.
///
/// Addresses are fixed-width, so hashing the plain concatenation is
/// unambiguous. Order and repetition both change the result.
pub fn hash_slate(addresses: &[Address]) -> SlateId {
    let mut hasher = Blake2b256::new();
    for addr in addresses {
        hasher.update(addr.as_bytes());
    }
    let result = hasher.finalize();
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    SlateId::new(output)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn blake2b_deterministic() {
        assert_eq!(blake2b_256(b"hello chief"), blake2b_256(b"hello chief"));
    }

    #[test]
    fn blake2b_multi_equivalent() {
        let single = blake2b_256(b"helloworld");
        let multi = blake2b_256_multi(&[b"hello", b"world"]);
        assert_eq!(single, multi);
    }

    #[test]
    fn slate_hash_matches_concatenation() {
        let a = addr(1);
        let b = addr(2);
        let expected = blake2b_256_multi(&[a.as_bytes(), b.as_bytes()]);
        assert_eq!(hash_slate(&[a, b]), SlateId::new(expected));
    }

    #[test]
    fn slate_hash_is_order_sensitive() {
        assert_ne!(hash_slate(&[addr(1), addr(2)]), hash_slate(&[addr(2), addr(1)]));
    }

    #[test]
    fn slate_hash_counts_duplicates() {
        assert_ne!(hash_slate(&[addr(1)]), hash_slate(&[addr(1), addr(1)]));
    }

    #[test]
    fn empty_slate_has_a_stable_id() {
        assert_eq!(hash_slate(&[]), SlateId::new(blake2b_256(b"")));
    }
}

//! Slate registry: content-addressed, append-only store of candidate lists.

use crate::error::GovernanceError;
use chief_crypto::hash_slate;
use chief_types::{Address, SlateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Maps a slate's content hash to its ordered address list.
///
/// Slates are never removed or modified. The empty slate is always present
/// and is the selection of every voter that has not voted yet.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SlateRegistry {
    slates: HashMap<SlateId, Vec<Address>>,
    max_slate_size: usize,
}

impl SlateRegistry {
    pub fn new(max_slate_size: usize) -> Self {
        let mut slates = HashMap::new();
        slates.insert(Self::empty_slate(), Vec::new());
        Self { slates, max_slate_size }
    }

    /// Identifier of the empty slate (abstention).
    pub fn empty_slate() -> SlateId {
        hash_slate(&[])
    }

    pub fn max_slate_size(&self) -> usize {
        self.max_slate_size
    }

    /// Register `addresses` and return its identifier, plus whether it was
    /// newly stored. Order is significant; duplicates are kept as given.
    pub fn register(&mut self, addresses: &[Address]) -> Result<(SlateId, bool), GovernanceError> {
        if addresses.len() > self.max_slate_size {
            return Err(GovernanceError::SlateTooLarge {
                len: addresses.len(),
                max: self.max_slate_size,
            });
        }
        let id = hash_slate(addresses);
        if self.slates.contains_key(&id) {
            return Ok((id, false));
        }
        self.slates.insert(id, addresses.to_vec());
        Ok((id, true))
    }

    pub fn resolve(&self, id: &SlateId) -> Result<&[Address], GovernanceError> {
        self.slates
            .get(id)
            .map(Vec::as_slice)
            .ok_or(GovernanceError::UnknownSlate(*id))
    }

    pub fn contains(&self, id: &SlateId) -> bool {
        self.slates.contains_key(id)
    }

    /// Number of registered slates, including the empty one.
    pub fn len(&self) -> usize {
        self.slates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn empty_slate_is_preregistered() {
        let registry = SlateRegistry::new(2);
        assert!(registry.contains(&SlateRegistry::empty_slate()));
        assert_eq!(registry.resolve(&SlateRegistry::empty_slate()).unwrap(), &[] as &[Address]);
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_is_idempotent() {
        let mut registry = SlateRegistry::new(5);
        let (first, created) = registry.register(&[addr(1), addr(3)]).unwrap();
        assert!(created);
        let (second, created) = registry.register(&[addr(1), addr(3)]).unwrap();
        assert!(!created);
        assert_eq!(first, second);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn exactly_max_size_is_accepted() {
        let mut registry = SlateRegistry::new(5);
        let full: Vec<Address> = (1..=5).map(addr).collect();
        let (id, _) = registry.register(&full).unwrap();
        assert_eq!(registry.resolve(&id).unwrap(), full.as_slice());
    }

    #[test]
    fn oversize_slate_is_rejected() {
        let mut registry = SlateRegistry::new(5);
        let too_full: Vec<Address> = (1..=6).map(addr).collect();
        let err = registry.register(&too_full).unwrap_err();
        assert_eq!(err, GovernanceError::SlateTooLarge { len: 6, max: 5 });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn unsorted_and_duplicate_addresses_are_kept() {
        let mut registry = SlateRegistry::new(5);
        let slate = [addr(9), addr(1), addr(9)];
        let (id, _) = registry.register(&slate).unwrap();
        assert_eq!(registry.resolve(&id).unwrap(), &slate);
    }

    #[test]
    fn unknown_slate_fails() {
        let registry = SlateRegistry::new(5);
        let id = hash_slate(&[addr(7)]);
        assert_eq!(registry.resolve(&id).unwrap_err(), GovernanceError::UnknownSlate(id));
    }
}

//! Proxy registry: creates proxies and binds each hot key to at most one.

use crate::error::ProxyError;
use crate::proxy::VoteProxy;
use chief_crypto::contract_address;
use chief_governance::{ApprovalLedger, PollingEmitter};
use chief_token::Ledgers;
use chief_types::{Address, CallContext};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Factory for [`VoteProxy`] instances.
///
/// A hot-key binding, once made, is never overwritten or cleared. A cold key
/// may back any number of proxies through different hot keys.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProxyRegistry {
    address: Address,
    by_hot: HashMap<Address, Address>,
    by_cold: HashMap<Address, Vec<Address>>,
    deployed: u64,
}

impl ProxyRegistry {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            by_hot: HashMap::new(),
            by_cold: HashMap::new(),
            deployed: 0,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Deploy a proxy for `(cold, hot)` bound to `chief` and `polling`.
    ///
    /// Anyone may call this. The new proxy's address is derived from the
    /// registry's address and its deployment counter.
    pub fn new_proxy(
        &mut self,
        ctx: &mut CallContext<'_>,
        chief: &ApprovalLedger,
        polling: &PollingEmitter,
        cold: Address,
        hot: Address,
        ledgers: &mut Ledgers<'_>,
    ) -> Result<VoteProxy, ProxyError> {
        ctx.charge_reads(1)?;
        if let Some(existing) = self.by_hot.get(&hot) {
            return Err(ProxyError::ProxyAlreadyExists { hot, proxy: *existing });
        }
        let address = contract_address(&self.address, self.deployed);
        let proxy = {
            let mut inner = ctx.nested(self.address)?;
            VoteProxy::deploy(&mut inner, address, chief, polling, cold, hot, ledgers)?
        };
        ctx.charge_writes(2)?;
        ctx.charge_log()?;
        self.by_hot.insert(hot, address);
        self.by_cold.entry(cold).or_default().push(address);
        self.deployed += 1;
        tracing::info!(proxy = %address, %cold, %hot, "proxy created");
        Ok(proxy)
    }

    /// The proxy bound to `hot`, if any.
    pub fn proxy_of(&self, hot: &Address) -> Option<Address> {
        self.by_hot.get(hot).copied()
    }

    /// Every proxy backed by `cold`, in creation order.
    pub fn proxies_of_cold(&self, cold: &Address) -> &[Address] {
        self.by_cold.get(cold).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self) -> u64 {
        self.deployed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chief_governance::ChiefParams;
    use chief_token::Token;
    use chief_types::GasMeter;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    struct Fixture {
        registry: ProxyRegistry,
        chief: ApprovalLedger,
        polling: PollingEmitter,
        stake: Token,
        receipt: Token,
        meter: GasMeter,
    }

    impl Fixture {
        fn new() -> Self {
            let chief = ApprovalLedger::new(addr(0xcc), ChiefParams::default());
            Self {
                registry: ProxyRegistry::new(addr(0xfa)),
                polling: PollingEmitter::new(addr(0x50)),
                stake: Token::new(addr(1), "MKR", addr(0xd0)),
                receipt: Token::new(addr(2), "IOU", chief.address()),
                chief,
                meter: GasMeter::unlimited(),
            }
        }

        fn create(&mut self, caller: u8, cold: u8, hot: u8) -> Result<VoteProxy, ProxyError> {
            self.registry.new_proxy(
                &mut CallContext::new(addr(caller), &mut self.meter),
                &self.chief,
                &self.polling,
                addr(cold),
                addr(hot),
                &mut Ledgers::new(&mut self.stake, &mut self.receipt),
            )
        }
    }

    #[test]
    fn creates_and_records_proxy() {
        let mut f = Fixture::new();
        let proxy = f.create(0x99, 0xc1, 0x41).unwrap();
        assert_eq!(proxy.cold(), addr(0xc1));
        assert_eq!(proxy.hot(), addr(0x41));
        assert_eq!(proxy.chief(), addr(0xcc));
        assert_eq!(f.registry.proxy_of(&addr(0x41)), Some(proxy.address()));
        assert_eq!(f.registry.proxy_of(&addr(0x42)), None);
        assert_eq!(f.registry.count(), 1);
    }

    #[test]
    fn hot_key_binds_once() {
        let mut f = Fixture::new();
        let first = f.create(0x99, 0xc1, 0x41).unwrap();
        let err = f.create(0x98, 0xc2, 0x41).unwrap_err();
        assert_eq!(err, ProxyError::ProxyAlreadyExists { hot: addr(0x41), proxy: first.address() });
        assert_eq!(f.registry.proxy_of(&addr(0x41)), Some(first.address()));
        assert_eq!(f.registry.count(), 1);
    }

    #[test]
    fn cold_key_backs_many_proxies() {
        let mut f = Fixture::new();
        let a = f.create(0xc1, 0xc1, 0x41).unwrap();
        let b = f.create(0xc1, 0xc1, 0x42).unwrap();
        assert_ne!(a.address(), b.address());
        assert_eq!(f.registry.proxies_of_cold(&addr(0xc1)), &[a.address(), b.address()]);
        assert!(f.registry.proxies_of_cold(&addr(0xc2)).is_empty());
    }

    #[test]
    fn zero_key_is_rejected_without_binding() {
        let mut f = Fixture::new();
        let err = f.create(0x99, 0xc1, 0x00).unwrap_err();
        assert_eq!(err, ProxyError::ZeroKey);
        assert_eq!(f.registry.proxy_of(&Address::ZERO), None);
        assert_eq!(f.registry.count(), 0);
    }
}

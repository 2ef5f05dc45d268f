//! The serialized call runtime.
//!
//! Every public method is one top-level call: it gets a fresh gas meter, runs
//! to completion, and either commits or restores the world to exactly what
//! it was before the call. No call observes another's partial state.

use std::collections::HashMap;

use chief_crypto::{address_from_seed, contract_address};
use chief_governance::{ApprovalLedger, ChiefParams, PollingEmitter};
use chief_proxy::{ProxyRegistry, VoteProxy};
use chief_token::{Ledgers, Token, TokenLedger};
use chief_types::gas::cost;
use chief_types::{Address, Amount, CallContext, GasMeter, SlateId};

use crate::config::RuntimeConfig;
use crate::error::RuntimeError;

const DEPLOYER_SEED: &[u8] = b"chief-runtime/deployer";

/// All component state, cloned before each call and restored on failure.
#[derive(Clone, Debug)]
pub struct World {
    pub stake: Token,
    pub receipt: Token,
    pub chief: ApprovalLedger,
    pub polling: PollingEmitter,
    pub registry: ProxyRegistry,
    pub proxies: HashMap<Address, VoteProxy>,
}

fn lookup<'w>(
    proxies: &'w HashMap<Address, VoteProxy>,
    address: &Address,
) -> Result<&'w VoteProxy, RuntimeError> {
    proxies.get(address).ok_or(RuntimeError::UnknownProxy(*address))
}

/// Outcome of a successful call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Receipt<T> {
    pub value: T,
    pub gas_used: u64,
}

pub struct Runtime {
    config: RuntimeConfig,
    deployer: Address,
    world: World,
}

impl Runtime {
    /// Deploy a fresh set of components.
    ///
    /// Addresses are derived from a fixed deployer key and a nonce, so two
    /// runtimes built from the same config agree on every address.
    pub fn new(config: RuntimeConfig) -> Self {
        let deployer = address_from_seed(DEPLOYER_SEED);
        let stake_address = contract_address(&deployer, 0);
        let receipt_address = contract_address(&deployer, 1);
        let polling_address = contract_address(&deployer, 2);
        let chief_address = contract_address(&deployer, 3);
        let registry_address = contract_address(&deployer, 4);

        let world = World {
            stake: Token::new(stake_address, config.stake_symbol.clone(), deployer),
            receipt: Token::new(receipt_address, config.receipt_symbol.clone(), chief_address),
            chief: ApprovalLedger::new(
                chief_address,
                ChiefParams::with_max_slate_size(config.max_slate_size),
            ),
            polling: PollingEmitter::new(polling_address),
            registry: ProxyRegistry::new(registry_address),
            proxies: HashMap::new(),
        };
        tracing::info!(
            %deployer,
            stake = %stake_address,
            receipt = %receipt_address,
            chief = %chief_address,
            registry = %registry_address,
            max_slate_size = config.max_slate_size,
            "runtime deployed"
        );
        Self { config, deployer, world }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// The key that deployed the components and may mint stake.
    pub fn deployer(&self) -> Address {
        self.deployer
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn chief_address(&self) -> Address {
        self.world.chief.address()
    }

    pub fn stake_address(&self) -> Address {
        self.world.stake.address()
    }

    pub fn receipt_address(&self) -> Address {
        self.world.receipt.address()
    }

    pub fn polling_address(&self) -> Address {
        self.world.polling.address()
    }

    pub fn registry_address(&self) -> Address {
        self.world.registry.address()
    }

    /// Run `call` as `sender` with all-or-nothing semantics.
    ///
    /// The rollback snapshot is a full clone of the world, poll event log
    /// included, so every call costs time linear in the accumulated state.
    fn execute<T, E>(
        &mut self,
        op: &'static str,
        sender: Address,
        call: impl FnOnce(&mut World, &mut CallContext<'_>) -> Result<T, E>,
    ) -> Result<Receipt<T>, RuntimeError>
    where
        RuntimeError: From<E>,
    {
        let mut meter = GasMeter::new(self.config.gas_limit);
        let snapshot = self.world.clone();
        let outcome = {
            let mut ctx = CallContext::new(sender, &mut meter);
            match ctx.charge(cost::CALL_BASE) {
                Ok(()) => call(&mut self.world, &mut ctx).map_err(RuntimeError::from),
                Err(e) => Err(e.into()),
            }
        };
        match outcome {
            Ok(value) => {
                tracing::debug!(op, %sender, gas_used = meter.used(), "call applied");
                Ok(Receipt { value, gas_used: meter.used() })
            }
            Err(err) => {
                self.world = snapshot;
                tracing::warn!(op, %sender, gas_used = meter.used(), error = %err, "call rejected");
                Err(err)
            }
        }
    }

    // ── Tokens ──────────────────────────────────────────────────────────

    /// Create `amount` stake for `to`. Only the deployer holds this power.
    pub fn mint_stake(&mut self, to: Address, amount: Amount) -> Result<Receipt<()>, RuntimeError> {
        let deployer = self.deployer;
        self.execute("mint_stake", deployer, |w, ctx| w.stake.mint(ctx, &to, amount))
    }

    pub fn transfer_stake(
        &mut self,
        sender: Address,
        to: Address,
        amount: Amount,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("transfer_stake", sender, |w, ctx| w.stake.transfer(ctx, &to, amount))
    }

    pub fn approve_stake(
        &mut self,
        sender: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("approve_stake", sender, |w, ctx| w.stake.approve(ctx, &spender, amount))
    }

    pub fn approve_receipt(
        &mut self,
        sender: Address,
        spender: Address,
        amount: Amount,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("approve_receipt", sender, |w, ctx| w.receipt.approve(ctx, &spender, amount))
    }

    pub fn stake_balance(&self, holder: &Address) -> Amount {
        self.world.stake.balance_of(holder)
    }

    pub fn receipt_balance(&self, holder: &Address) -> Amount {
        self.world.receipt.balance_of(holder)
    }

    // ── Approval ledger ─────────────────────────────────────────────────

    pub fn register_slate(
        &mut self,
        sender: Address,
        addresses: &[Address],
    ) -> Result<Receipt<SlateId>, RuntimeError> {
        self.execute("register_slate", sender, |w, ctx| w.chief.register_slate(ctx, addresses))
    }

    pub fn deposit(&mut self, sender: Address, amount: Amount) -> Result<Receipt<()>, RuntimeError> {
        self.execute("deposit", sender, |w, ctx| {
            w.chief.deposit(ctx, amount, &mut Ledgers::new(&mut w.stake, &mut w.receipt))
        })
    }

    pub fn withdraw(&mut self, sender: Address, amount: Amount) -> Result<Receipt<()>, RuntimeError> {
        self.execute("withdraw", sender, |w, ctx| {
            w.chief.withdraw(ctx, amount, &mut Ledgers::new(&mut w.stake, &mut w.receipt))
        })
    }

    pub fn vote(&mut self, sender: Address, slate: SlateId) -> Result<Receipt<()>, RuntimeError> {
        self.execute("vote", sender, |w, ctx| w.chief.vote(ctx, &slate))
    }

    pub fn vote_addresses(
        &mut self,
        sender: Address,
        addresses: &[Address],
    ) -> Result<Receipt<SlateId>, RuntimeError> {
        self.execute("vote_addresses", sender, |w, ctx| w.chief.vote_addresses(ctx, addresses))
    }

    pub fn lift(&mut self, sender: Address, candidate: Address) -> Result<Receipt<()>, RuntimeError> {
        self.execute("lift", sender, |w, ctx| w.chief.lift(ctx, &candidate))
    }

    pub fn approvals(&self, candidate: &Address) -> Amount {
        self.world.chief.approvals(candidate)
    }

    pub fn weight_of(&self, voter: &Address) -> Amount {
        self.world.chief.weight_of(voter)
    }

    pub fn hat(&self) -> Address {
        self.world.chief.hat()
    }

    // ── Proxies ─────────────────────────────────────────────────────────

    /// Deploy a proxy for `(cold, hot)`. Returns the proxy's address.
    pub fn new_proxy(
        &mut self,
        sender: Address,
        cold: Address,
        hot: Address,
    ) -> Result<Receipt<Address>, RuntimeError> {
        self.execute("new_proxy", sender, |w, ctx| {
            let proxy = w.registry.new_proxy(
                ctx,
                &w.chief,
                &w.polling,
                cold,
                hot,
                &mut Ledgers::new(&mut w.stake, &mut w.receipt),
            )?;
            let address = proxy.address();
            w.proxies.insert(address, proxy);
            Ok::<_, RuntimeError>(address)
        })
    }

    pub fn proxy_of(&self, hot: &Address) -> Option<Address> {
        self.world.registry.proxy_of(hot)
    }

    pub fn proxy(&self, address: &Address) -> Option<&VoteProxy> {
        self.world.proxies.get(address)
    }

    pub fn proxy_lock(
        &mut self,
        sender: Address,
        proxy: Address,
    ) -> Result<Receipt<Amount>, RuntimeError> {
        self.execute("proxy_lock", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.lock(
                ctx,
                &mut w.chief,
                &mut Ledgers::new(&mut w.stake, &mut w.receipt),
            )?)
        })
    }

    pub fn proxy_vote_addresses(
        &mut self,
        sender: Address,
        proxy: Address,
        addresses: &[Address],
    ) -> Result<Receipt<SlateId>, RuntimeError> {
        self.execute("proxy_vote_addresses", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.vote_addresses(
                ctx,
                &mut w.chief,
                &mut Ledgers::new(&mut w.stake, &mut w.receipt),
                addresses,
            )?)
        })
    }

    pub fn proxy_vote_slate(
        &mut self,
        sender: Address,
        proxy: Address,
        slate: SlateId,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("proxy_vote_slate", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.vote_slate(
                ctx,
                &mut w.chief,
                &mut Ledgers::new(&mut w.stake, &mut w.receipt),
                &slate,
            )?)
        })
    }

    pub fn proxy_free(
        &mut self,
        sender: Address,
        proxy: Address,
        amount: Amount,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("proxy_free", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.free(
                ctx,
                &mut w.chief,
                &mut Ledgers::new(&mut w.stake, &mut w.receipt),
                amount,
            )?)
        })
    }

    /// Withdraw everything from `proxy` to its cold key. Returns the amount paid.
    pub fn proxy_release(
        &mut self,
        sender: Address,
        proxy: Address,
    ) -> Result<Receipt<Amount>, RuntimeError> {
        self.execute("proxy_release", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.release(
                ctx,
                &mut w.chief,
                &mut Ledgers::new(&mut w.stake, &mut w.receipt),
            )?)
        })
    }

    pub fn proxy_vote_poll(
        &mut self,
        sender: Address,
        proxy: Address,
        poll_id: u64,
        option_id: u64,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("proxy_vote_poll", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.vote_poll(ctx, &mut w.polling, poll_id, option_id)?)
        })
    }

    pub fn proxy_vote_polls(
        &mut self,
        sender: Address,
        proxy: Address,
        poll_ids: &[u64],
        option_ids: &[u64],
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("proxy_vote_polls", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.vote_polls(ctx, &mut w.polling, poll_ids, option_ids)?)
        })
    }

    pub fn proxy_withdraw_poll(
        &mut self,
        sender: Address,
        proxy: Address,
        poll_id: u64,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("proxy_withdraw_poll", sender, |w, ctx| {
            let proxy = lookup(&w.proxies, &proxy)?;
            Ok::<_, RuntimeError>(proxy.withdraw_poll(ctx, &mut w.polling, poll_id)?)
        })
    }

    // ── Polling ─────────────────────────────────────────────────────────

    pub fn create_poll(
        &mut self,
        sender: Address,
        start_date: u64,
        end_date: u64,
        multi_hash: &str,
        url: &str,
    ) -> Result<Receipt<u64>, RuntimeError> {
        self.execute("create_poll", sender, |w, ctx| {
            w.polling.create_poll(ctx, start_date, end_date, multi_hash, url)
        })
    }

    pub fn withdraw_poll(&mut self, sender: Address, poll_id: u64) -> Result<Receipt<()>, RuntimeError> {
        self.execute("withdraw_poll", sender, |w, ctx| w.polling.withdraw_poll(ctx, poll_id))
    }

    pub fn poll_vote(
        &mut self,
        sender: Address,
        poll_id: u64,
        option_id: u64,
    ) -> Result<Receipt<()>, RuntimeError> {
        self.execute("poll_vote", sender, |w, ctx| w.polling.vote(ctx, poll_id, option_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    #[test]
    fn deployment_is_deterministic() {
        let a = Runtime::new(RuntimeConfig::default());
        let b = Runtime::new(RuntimeConfig::default());
        assert_eq!(a.chief_address(), b.chief_address());
        assert_eq!(a.registry_address(), b.registry_address());
        assert_ne!(a.chief_address(), a.stake_address());
        assert_eq!(a.world().receipt.authority(), a.chief_address());
        assert_eq!(a.world().stake.authority(), a.deployer());
    }

    #[test]
    fn only_deployer_mints_stake() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.mint_stake(addr(1), Amount::new(10)).unwrap();
        assert_eq!(rt.stake_balance(&addr(1)), Amount::new(10));
        assert!(rt
            .execute("mint_stake", addr(1), |w, ctx| w.stake.mint(ctx, &addr(1), Amount::new(1)))
            .is_err());
    }

    #[test]
    fn failed_call_restores_every_component() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        rt.mint_stake(addr(1), Amount::new(100)).unwrap();
        let before = rt.world().clone();
        // Credits the chief, then fails on a later step of the same call.
        let err = rt
            .execute("partial", addr(1), |w, ctx| {
                w.stake.transfer(ctx, &w.chief.address(), Amount::new(40))?;
                w.chief.withdraw(ctx, Amount::new(1), &mut Ledgers::new(&mut w.stake, &mut w.receipt))?;
                Ok::<_, RuntimeError>(())
            })
            .unwrap_err();
        assert!(matches!(err, RuntimeError::Governance(_)));
        assert_eq!(rt.stake_balance(&addr(1)), before.stake.balance_of(&addr(1)));
        assert_eq!(rt.stake_balance(&rt.chief_address()), Amount::ZERO);
    }

    #[test]
    fn out_of_gas_rolls_back() {
        let config = RuntimeConfig { gas_limit: cost::CALL_BASE + 100, ..RuntimeConfig::default() };
        let mut rt = Runtime::new(config);
        let err = rt.register_slate(addr(1), &[addr(2)]).unwrap_err();
        assert!(matches!(err, RuntimeError::Gas(_)));
        let id = chief_crypto::hash_slate(&[addr(2)]);
        assert!(rt.world().chief.slate(&id).is_err());
    }

    #[test]
    fn unknown_proxy_is_reported() {
        let mut rt = Runtime::new(RuntimeConfig::default());
        let err = rt.proxy_lock(addr(1), addr(9)).unwrap_err();
        assert!(matches!(err, RuntimeError::UnknownProxy(a) if a == addr(9)));
    }
}

//! A single cold/hot voting proxy.

use crate::capability::{Action, ProxyKey};
use crate::error::ProxyError;
use chief_governance::{ApprovalLedger, PollingEmitter};
use chief_token::Ledgers;
use chief_types::{Address, Amount, CallContext, SlateId};
use serde::{Deserialize, Serialize};

/// Custodies stake for one (cold, hot) key pair and votes with it.
///
/// The proxy holds no balances itself: its stake and receipt tokens live in
/// the token ledgers under the proxy's address, and its weight lives in the
/// approval ledger. All fields are fixed at deployment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteProxy {
    address: Address,
    cold: Address,
    hot: Address,
    chief: Address,
    polling: Address,
}

impl VoteProxy {
    /// Deploy a proxy at `address`.
    ///
    /// The proxy grants `chief` an unlimited allowance on both tokens so the
    /// engine can pull stake on deposit and burn receipts on withdrawal.
    pub fn deploy(
        ctx: &mut CallContext<'_>,
        address: Address,
        chief: &ApprovalLedger,
        polling: &PollingEmitter,
        cold: Address,
        hot: Address,
        ledgers: &mut Ledgers<'_>,
    ) -> Result<Self, ProxyError> {
        if cold.is_zero() || hot.is_zero() {
            return Err(ProxyError::ZeroKey);
        }
        ctx.charge_writes(4)?;
        {
            let mut inner = ctx.nested(address)?;
            ledgers.stake.approve(&mut inner, &chief.address(), Amount::MAX)?;
            ledgers.receipt.approve(&mut inner, &chief.address(), Amount::MAX)?;
        }
        tracing::debug!(proxy = %address, %cold, %hot, "proxy deployed");
        Ok(Self {
            address,
            cold,
            hot,
            chief: chief.address(),
            polling: polling.address(),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn cold(&self) -> Address {
        self.cold
    }

    pub fn hot(&self) -> Address {
        self.hot
    }

    pub fn chief(&self) -> Address {
        self.chief
    }

    pub fn polling(&self) -> Address {
        self.polling
    }

    /// Where withdrawn stake goes: the key holding the receive capability.
    pub fn payee(&self) -> Address {
        debug_assert!(ProxyKey::Cold.permits(Action::Receive));
        self.cold
    }

    /// Identify the caller's key and check it may perform `action`.
    pub fn authorize(
        &self,
        ctx: &mut CallContext<'_>,
        action: Action,
    ) -> Result<ProxyKey, ProxyError> {
        ctx.charge_reads(2)?;
        let caller = ctx.sender();
        let key = if caller == self.cold {
            ProxyKey::Cold
        } else if caller == self.hot {
            ProxyKey::Hot
        } else {
            return Err(ProxyError::Unauthorized { caller, proxy: self.address });
        };
        if !key.permits(action) {
            return Err(ProxyError::Unauthorized { caller, proxy: self.address });
        }
        Ok(key)
    }

    /// Lock whatever stake the proxy holds. Returns the amount locked.
    ///
    /// With nothing to lock this returns right after reading the balance,
    /// without calling into the engine.
    pub fn lock(
        &self,
        ctx: &mut CallContext<'_>,
        chief: &mut ApprovalLedger,
        ledgers: &mut Ledgers<'_>,
    ) -> Result<Amount, ProxyError> {
        self.authorize(ctx, Action::Lock)?;
        self.sweep(ctx, chief, ledgers)
    }

    /// Lock idle stake, then vote for `addresses` (registering the slate).
    pub fn vote_addresses(
        &self,
        ctx: &mut CallContext<'_>,
        chief: &mut ApprovalLedger,
        ledgers: &mut Ledgers<'_>,
        addresses: &[Address],
    ) -> Result<SlateId, ProxyError> {
        self.authorize(ctx, Action::Vote)?;
        self.sweep(ctx, chief, ledgers)?;
        let mut inner = ctx.nested(self.address)?;
        Ok(chief.vote_addresses(&mut inner, addresses)?)
    }

    /// Lock idle stake, then vote for an already registered slate.
    pub fn vote_slate(
        &self,
        ctx: &mut CallContext<'_>,
        chief: &mut ApprovalLedger,
        ledgers: &mut Ledgers<'_>,
        slate: &SlateId,
    ) -> Result<(), ProxyError> {
        self.authorize(ctx, Action::Vote)?;
        self.sweep(ctx, chief, ledgers)?;
        let mut inner = ctx.nested(self.address)?;
        Ok(chief.vote(&mut inner, slate)?)
    }

    /// Withdraw `amount` from the engine and send exactly that to the cold key.
    pub fn free(
        &self,
        ctx: &mut CallContext<'_>,
        chief: &mut ApprovalLedger,
        ledgers: &mut Ledgers<'_>,
        amount: Amount,
    ) -> Result<(), ProxyError> {
        self.authorize(ctx, Action::Withdraw)?;
        self.check_engine(chief)?;
        let mut inner = ctx.nested(self.address)?;
        chief.withdraw(&mut inner, amount, ledgers)?;
        if !amount.is_zero() {
            ledgers.stake.transfer(&mut inner, &self.payee(), amount)?;
        }
        tracing::debug!(proxy = %self.address, %amount, to = %self.payee(), "stake freed to cold key");
        Ok(())
    }

    /// Withdraw the proxy's entire weight and send every unit of stake the
    /// proxy holds to the cold key, whichever key called. Returns the amount
    /// paid out.
    pub fn release(
        &self,
        ctx: &mut CallContext<'_>,
        chief: &mut ApprovalLedger,
        ledgers: &mut Ledgers<'_>,
    ) -> Result<Amount, ProxyError> {
        self.authorize(ctx, Action::Withdraw)?;
        self.check_engine(chief)?;
        ctx.charge_reads(1)?;
        let weight = chief.weight_of(&self.address);
        let mut inner = ctx.nested(self.address)?;
        chief.withdraw(&mut inner, weight, ledgers)?;
        inner.charge_reads(1)?;
        let balance = ledgers.stake.balance_of(&self.address);
        if !balance.is_zero() {
            ledgers.stake.transfer(&mut inner, &self.payee(), balance)?;
        }
        tracing::debug!(proxy = %self.address, %weight, paid = %balance, to = %self.payee(), "proxy released");
        Ok(balance)
    }

    /// Vote in a signalling poll as the proxy.
    pub fn vote_poll(
        &self,
        ctx: &mut CallContext<'_>,
        polling: &mut PollingEmitter,
        poll_id: u64,
        option_id: u64,
    ) -> Result<(), ProxyError> {
        self.authorize(ctx, Action::PollVote)?;
        self.check_polling(polling)?;
        let mut inner = ctx.nested(self.address)?;
        Ok(polling.vote(&mut inner, poll_id, option_id)?)
    }

    /// Vote in several polls at once; `poll_ids[i]` gets `option_ids[i]`.
    pub fn vote_polls(
        &self,
        ctx: &mut CallContext<'_>,
        polling: &mut PollingEmitter,
        poll_ids: &[u64],
        option_ids: &[u64],
    ) -> Result<(), ProxyError> {
        self.authorize(ctx, Action::PollVote)?;
        self.check_polling(polling)?;
        if poll_ids.len() != option_ids.len() {
            return Err(ProxyError::PollBatchMismatch {
                polls: poll_ids.len(),
                options: option_ids.len(),
            });
        }
        let mut inner = ctx.nested(self.address)?;
        for (poll_id, option_id) in poll_ids.iter().zip(option_ids) {
            polling.vote(&mut inner, *poll_id, *option_id)?;
        }
        Ok(())
    }

    /// Withdraw a poll the proxy created.
    pub fn withdraw_poll(
        &self,
        ctx: &mut CallContext<'_>,
        polling: &mut PollingEmitter,
        poll_id: u64,
    ) -> Result<(), ProxyError> {
        self.authorize(ctx, Action::PollVote)?;
        self.check_polling(polling)?;
        let mut inner = ctx.nested(self.address)?;
        Ok(polling.withdraw_poll(&mut inner, poll_id)?)
    }

    fn sweep(
        &self,
        ctx: &mut CallContext<'_>,
        chief: &mut ApprovalLedger,
        ledgers: &mut Ledgers<'_>,
    ) -> Result<Amount, ProxyError> {
        self.check_engine(chief)?;
        ctx.charge_reads(1)?;
        let balance = ledgers.stake.balance_of(&self.address);
        if balance.is_zero() {
            return Ok(Amount::ZERO);
        }
        let mut inner = ctx.nested(self.address)?;
        chief.deposit(&mut inner, balance, ledgers)?;
        tracing::debug!(proxy = %self.address, amount = %balance, "stake locked");
        Ok(balance)
    }

    fn check_engine(&self, chief: &ApprovalLedger) -> Result<(), ProxyError> {
        if chief.address() != self.chief {
            return Err(ProxyError::WrongEngine { expected: self.chief, got: chief.address() });
        }
        Ok(())
    }

    fn check_polling(&self, polling: &PollingEmitter) -> Result<(), ProxyError> {
        if polling.address() != self.polling {
            return Err(ProxyError::WrongPolling {
                expected: self.polling,
                got: polling.address(),
            });
        }
        Ok(())
    }
}

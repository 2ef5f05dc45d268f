//! The balance ledger interface consumed by the engine and the proxies.

use crate::error::TokenError;
use chief_types::{Address, Amount, CallContext};

/// Operations the governance engine needs from a fungible token.
///
/// Mutating methods take the caller's [`CallContext`]; the sender is the
/// account whose authority or allowance is checked. Every method either
/// applies fully or returns an error without touching any balance.
pub trait TokenLedger {
    /// Where this token lives.
    fn address(&self) -> Address;

    fn symbol(&self) -> &str;

    fn balance_of(&self, holder: &Address) -> Amount;

    fn total_supply(&self) -> Amount;

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount;

    /// Let `spender` move up to `amount` of the sender's tokens.
    /// [`Amount::MAX`] is an unlimited allowance that is never decremented.
    fn approve(
        &mut self,
        ctx: &mut CallContext<'_>,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Move `amount` from `from` to `to`. Needs an allowance unless the
    /// sender is `from`.
    fn transfer_from(
        &mut self,
        ctx: &mut CallContext<'_>,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Move `amount` from the sender to `to`.
    fn transfer(
        &mut self,
        ctx: &mut CallContext<'_>,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let from = ctx.sender();
        self.transfer_from(ctx, &from, to, amount)
    }

    /// Create `amount` new tokens for `to`. Authority only.
    fn mint(
        &mut self,
        ctx: &mut CallContext<'_>,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;

    /// Destroy `amount` of `from`'s tokens. Authority only, and needs an
    /// allowance unless the sender is `from`.
    fn burn(
        &mut self,
        ctx: &mut CallContext<'_>,
        from: &Address,
        amount: Amount,
    ) -> Result<(), TokenError>;
}

/// The stake and receipt ledgers borrowed together for one call.
pub struct Ledgers<'a> {
    pub stake: &'a mut dyn TokenLedger,
    pub receipt: &'a mut dyn TokenLedger,
}

impl<'a> Ledgers<'a> {
    pub fn new(stake: &'a mut dyn TokenLedger, receipt: &'a mut dyn TokenLedger) -> Self {
        Self { stake, receipt }
    }
}

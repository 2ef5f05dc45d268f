//! In-memory fungible token.

use std::collections::HashMap;

use crate::error::TokenError;
use crate::ledger::TokenLedger;
use chief_types::{Address, Amount, CallContext};

/// A fungible token with balances, allowances and a single mint/burn authority.
///
/// Every mutation checks all of its preconditions before it writes anything,
/// so a failed call leaves the token untouched.
#[derive(Clone, Debug)]
pub struct Token {
    address: Address,
    symbol: String,
    /// The only account allowed to mint and burn.
    authority: Address,
    supply: Amount,
    balances: HashMap<Address, Amount>,
    /// (owner, spender) → remaining allowance.
    allowances: HashMap<(Address, Address), Amount>,
}

impl Token {
    pub fn new(address: Address, symbol: impl Into<String>, authority: Address) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            authority,
            supply: Amount::ZERO,
            balances: HashMap::new(),
            allowances: HashMap::new(),
        }
    }

    pub fn authority(&self) -> Address {
        self.authority
    }

    fn require_authority(&self, ctx: &mut CallContext<'_>) -> Result<(), TokenError> {
        ctx.charge_reads(1)?;
        if ctx.sender() != self.authority {
            return Err(TokenError::NotAuthority(ctx.sender()));
        }
        Ok(())
    }

    /// Allowance left after spending `amount`, or `None` when no allowance
    /// is needed (self-spend or unlimited).
    fn spend_allowance(
        &self,
        ctx: &mut CallContext<'_>,
        owner: &Address,
        amount: Amount,
    ) -> Result<Option<Amount>, TokenError> {
        let spender = ctx.sender();
        if spender == *owner {
            return Ok(None);
        }
        ctx.charge_reads(1)?;
        let available = self.allowance(owner, &spender);
        if available == Amount::MAX {
            return Ok(None);
        }
        available
            .checked_sub(amount)
            .map(Some)
            .ok_or(TokenError::InsufficientAllowance {
                owner: *owner,
                spender,
                needed: amount,
                available,
            })
    }

    fn debit(&self, holder: &Address, amount: Amount) -> Result<Amount, TokenError> {
        let available = self.balance_of(holder);
        available.checked_sub(amount).ok_or(TokenError::InsufficientBalance {
            holder: *holder,
            needed: amount,
            available,
        })
    }

    fn set_balance(&mut self, holder: Address, amount: Amount) {
        if amount.is_zero() {
            self.balances.remove(&holder);
        } else {
            self.balances.insert(holder, amount);
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        if amount.is_zero() {
            self.allowances.remove(&(owner, spender));
        } else {
            self.allowances.insert((owner, spender), amount);
        }
    }
}

impl TokenLedger for Token {
    fn address(&self) -> Address {
        self.address
    }

    fn symbol(&self) -> &str {
        &self.symbol
    }

    fn balance_of(&self, holder: &Address) -> Amount {
        self.balances.get(holder).copied().unwrap_or(Amount::ZERO)
    }

    fn total_supply(&self) -> Amount {
        self.supply
    }

    fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn approve(
        &mut self,
        ctx: &mut CallContext<'_>,
        spender: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        ctx.charge_writes(1)?;
        ctx.charge_log()?;
        self.set_allowance(ctx.sender(), *spender, amount);
        Ok(())
    }

    fn transfer_from(
        &mut self,
        ctx: &mut CallContext<'_>,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        let allowance_left = self.spend_allowance(ctx, from, amount)?;
        ctx.charge_reads(2)?;
        let from_after = self.debit(from, amount)?;
        let to_after = if from == to {
            self.balance_of(to)
        } else {
            self.balance_of(to)
                .checked_add(amount)
                .ok_or(TokenError::SupplyOverflow)?
        };
        ctx.charge_writes(2)?;
        ctx.charge_log()?;
        if let Some(left) = allowance_left {
            self.set_allowance(*from, ctx.sender(), left);
        }
        self.set_balance(*from, from_after);
        self.set_balance(*to, to_after);
        tracing::trace!(token = %self.symbol, %from, %to, %amount, "transfer");
        Ok(())
    }

    fn mint(
        &mut self,
        ctx: &mut CallContext<'_>,
        to: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.require_authority(ctx)?;
        ctx.charge_reads(2)?;
        let supply = self.supply.checked_add(amount).ok_or(TokenError::SupplyOverflow)?;
        let balance = self
            .balance_of(to)
            .checked_add(amount)
            .ok_or(TokenError::SupplyOverflow)?;
        ctx.charge_writes(2)?;
        ctx.charge_log()?;
        self.supply = supply;
        self.set_balance(*to, balance);
        tracing::trace!(token = %self.symbol, %to, %amount, "mint");
        Ok(())
    }

    fn burn(
        &mut self,
        ctx: &mut CallContext<'_>,
        from: &Address,
        amount: Amount,
    ) -> Result<(), TokenError> {
        self.require_authority(ctx)?;
        let allowance_left = self.spend_allowance(ctx, from, amount)?;
        ctx.charge_reads(2)?;
        let balance = self.debit(from, amount)?;
        // supply >= any single balance
        let supply = self.supply.saturating_sub(amount);
        ctx.charge_writes(2)?;
        ctx.charge_log()?;
        if let Some(left) = allowance_left {
            self.set_allowance(*from, ctx.sender(), left);
        }
        self.supply = supply;
        self.set_balance(*from, balance);
        tracing::trace!(token = %self.symbol, %from, %amount, "burn");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chief_types::GasMeter;

    fn addr(byte: u8) -> Address {
        Address::new([byte; 20])
    }

    fn owner() -> Address {
        addr(0xaa)
    }

    fn token() -> Token {
        Token::new(addr(0x01), "MKR", owner())
    }

    fn minted(holder: Address, amount: u128) -> Token {
        let mut t = token();
        let mut meter = GasMeter::unlimited();
        t.mint(&mut CallContext::new(owner(), &mut meter), &holder, Amount::new(amount))
            .unwrap();
        t
    }

    #[test]
    fn mint_increases_balance_and_supply() {
        let t = minted(addr(2), 1_000);
        assert_eq!(t.balance_of(&addr(2)), Amount::new(1_000));
        assert_eq!(t.total_supply(), Amount::new(1_000));
    }

    #[test]
    fn mint_requires_authority() {
        let mut t = token();
        let mut meter = GasMeter::unlimited();
        let err = t
            .mint(&mut CallContext::new(addr(2), &mut meter), &addr(2), Amount::new(1))
            .unwrap_err();
        assert_eq!(err, TokenError::NotAuthority(addr(2)));
        assert_eq!(t.total_supply(), Amount::ZERO);
    }

    #[test]
    fn transfer_moves_balance() {
        let mut t = minted(addr(2), 1_000);
        let mut meter = GasMeter::unlimited();
        t.transfer(&mut CallContext::new(addr(2), &mut meter), &addr(3), Amount::new(400))
            .unwrap();
        assert_eq!(t.balance_of(&addr(2)), Amount::new(600));
        assert_eq!(t.balance_of(&addr(3)), Amount::new(400));
        assert_eq!(t.total_supply(), Amount::new(1_000));
    }

    #[test]
    fn transfer_to_self_keeps_balance() {
        let mut t = minted(addr(2), 1_000);
        let mut meter = GasMeter::unlimited();
        t.transfer(&mut CallContext::new(addr(2), &mut meter), &addr(2), Amount::new(1_000))
            .unwrap();
        assert_eq!(t.balance_of(&addr(2)), Amount::new(1_000));
    }

    #[test]
    fn transfer_insufficient_balance_is_untouched() {
        let mut t = minted(addr(2), 10);
        let mut meter = GasMeter::unlimited();
        let err = t
            .transfer(&mut CallContext::new(addr(2), &mut meter), &addr(3), Amount::new(11))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientBalance { .. }));
        assert_eq!(t.balance_of(&addr(2)), Amount::new(10));
        assert_eq!(t.balance_of(&addr(3)), Amount::ZERO);
    }

    #[test]
    fn transfer_from_needs_allowance() {
        let mut t = minted(addr(2), 100);
        let mut meter = GasMeter::unlimited();
        let err = t
            .transfer_from(
                &mut CallContext::new(addr(3), &mut meter),
                &addr(2),
                &addr(3),
                Amount::new(1),
            )
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));
    }

    #[test]
    fn finite_allowance_is_spent() {
        let mut t = minted(addr(2), 100);
        let mut meter = GasMeter::unlimited();
        t.approve(&mut CallContext::new(addr(2), &mut meter), &addr(3), Amount::new(60))
            .unwrap();
        t.transfer_from(
            &mut CallContext::new(addr(3), &mut meter),
            &addr(2),
            &addr(4),
            Amount::new(50),
        )
        .unwrap();
        assert_eq!(t.allowance(&addr(2), &addr(3)), Amount::new(10));
        assert_eq!(t.balance_of(&addr(4)), Amount::new(50));
    }

    #[test]
    fn unlimited_allowance_is_not_decremented() {
        let mut t = minted(addr(2), 100);
        let mut meter = GasMeter::unlimited();
        t.approve(&mut CallContext::new(addr(2), &mut meter), &addr(3), Amount::MAX)
            .unwrap();
        t.transfer_from(
            &mut CallContext::new(addr(3), &mut meter),
            &addr(2),
            &addr(3),
            Amount::new(100),
        )
        .unwrap();
        assert_eq!(t.allowance(&addr(2), &addr(3)), Amount::MAX);
    }

    #[test]
    fn burn_by_authority_with_allowance() {
        let mut t = minted(addr(2), 100);
        let mut meter = GasMeter::unlimited();
        t.approve(&mut CallContext::new(addr(2), &mut meter), &owner(), Amount::MAX)
            .unwrap();
        t.burn(&mut CallContext::new(owner(), &mut meter), &addr(2), Amount::new(30))
            .unwrap();
        assert_eq!(t.balance_of(&addr(2)), Amount::new(70));
        assert_eq!(t.total_supply(), Amount::new(70));
    }

    #[test]
    fn burn_without_allowance_fails() {
        let mut t = minted(addr(2), 100);
        let mut meter = GasMeter::unlimited();
        let err = t
            .burn(&mut CallContext::new(owner(), &mut meter), &addr(2), Amount::new(30))
            .unwrap_err();
        assert!(matches!(err, TokenError::InsufficientAllowance { .. }));
        assert_eq!(t.total_supply(), Amount::new(100));
    }

    #[test]
    fn mint_overflow_is_rejected() {
        let mut t = minted(addr(2), u128::MAX);
        let mut meter = GasMeter::unlimited();
        let err = t
            .mint(&mut CallContext::new(owner(), &mut meter), &addr(3), Amount::new(1))
            .unwrap_err();
        assert_eq!(err, TokenError::SupplyOverflow);
        assert_eq!(t.balance_of(&addr(3)), Amount::ZERO);
    }
}

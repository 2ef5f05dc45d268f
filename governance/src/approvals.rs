//! Approval ledger: locked weight per voter, approval totals per candidate.
//!
//! Every entry point computes the complete set of counter changes first and
//! commits them only once every check (slate size, weight, overflow, token
//! calls) has passed. A failing call leaves the ledger exactly as it was.

use crate::error::GovernanceError;
use crate::params::ChiefParams;
use crate::slate::SlateRegistry;
use chief_token::Ledgers;
use chief_types::{Address, Amount, CallContext, SlateId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What the ledger knows about one voter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoterRecord {
    /// Stake currently locked by this voter.
    pub weight: Amount,
    /// The slate this voter's weight currently backs.
    pub slate: SlateId,
}

impl Default for VoterRecord {
    fn default() -> Self {
        Self { weight: Amount::ZERO, slate: SlateRegistry::empty_slate() }
    }
}

/// A signed change applied to every member of a slate.
#[derive(Clone, Copy, Debug)]
enum Delta {
    Credit(Amount),
    Debit(Amount),
}

/// New approval values staged on top of the committed counters.
///
/// Members are visited once per occurrence, so a duplicated candidate gets
/// the delta applied once per appearance. Debiting and then crediting the
/// same slate by the same amount lands every counter back where it started.
struct StagedApprovals<'a> {
    committed: &'a HashMap<Address, Amount>,
    staged: HashMap<Address, Amount>,
}

impl<'a> StagedApprovals<'a> {
    fn new(committed: &'a HashMap<Address, Amount>) -> Self {
        Self { committed, staged: HashMap::new() }
    }

    fn current(&self, candidate: &Address) -> Amount {
        self.staged
            .get(candidate)
            .or_else(|| self.committed.get(candidate))
            .copied()
            .unwrap_or(Amount::ZERO)
    }

    fn apply(&mut self, members: &[Address], delta: Delta) -> Result<(), GovernanceError> {
        for candidate in members {
            let current = self.current(candidate);
            let next = match delta {
                Delta::Credit(amount) => current
                    .checked_add(amount)
                    .ok_or(GovernanceError::ArithmeticOverflow)?,
                Delta::Debit(amount) => current.checked_sub(amount).ok_or_else(|| {
                    GovernanceError::InvariantViolation(format!(
                        "approvals for {candidate} would drop below zero ({current} - {amount})"
                    ))
                })?,
            };
            self.staged.insert(*candidate, next);
        }
        Ok(())
    }

    fn into_changes(self) -> HashMap<Address, Amount> {
        self.staged
    }
}

/// The governance engine: voter weights, slate selections, approval totals
/// and the currently elected hat.
#[derive(Clone, Debug)]
pub struct ApprovalLedger {
    address: Address,
    slates: SlateRegistry,
    voters: HashMap<Address, VoterRecord>,
    approvals: HashMap<Address, Amount>,
    /// Sum of all voter weights; always equals the stake the ledger holds.
    total_weight: Amount,
    hat: Address,
}

impl ApprovalLedger {
    pub fn new(address: Address, params: ChiefParams) -> Self {
        Self {
            address,
            slates: SlateRegistry::new(params.max_slate_size),
            voters: HashMap::new(),
            approvals: HashMap::new(),
            total_weight: Amount::ZERO,
            hat: Address::ZERO,
        }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn max_slate_size(&self) -> usize {
        self.slates.max_slate_size()
    }

    // ── Reads ───────────────────────────────────────────────────────────

    /// Current approval total of `candidate`; zero if never seen.
    pub fn approvals(&self, candidate: &Address) -> Amount {
        self.approvals.get(candidate).copied().unwrap_or(Amount::ZERO)
    }

    pub fn weight_of(&self, voter: &Address) -> Amount {
        self.voters.get(voter).map(|v| v.weight).unwrap_or(Amount::ZERO)
    }

    pub fn selected_slate(&self, voter: &Address) -> SlateId {
        self.voters
            .get(voter)
            .map(|v| v.slate)
            .unwrap_or_else(SlateRegistry::empty_slate)
    }

    pub fn voter(&self, voter: &Address) -> Option<&VoterRecord> {
        self.voters.get(voter)
    }

    pub fn slate(&self, id: &SlateId) -> Result<&[Address], GovernanceError> {
        self.slates.resolve(id)
    }

    pub fn total_weight(&self) -> Amount {
        self.total_weight
    }

    pub fn hat(&self) -> Address {
        self.hat
    }

    pub fn is_hat(&self, candidate: &Address) -> bool {
        !candidate.is_zero() && *candidate == self.hat
    }

    /// Candidates with a non-zero approval total, highest first.
    pub fn leaderboard(&self) -> Vec<(Address, Amount)> {
        let mut rows: Vec<(Address, Amount)> =
            self.approvals.iter().map(|(a, w)| (*a, *w)).collect();
        rows.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
        rows
    }

    // ── Slates ──────────────────────────────────────────────────────────

    /// Register a slate (`etch`). Idempotent; returns the slate's id.
    pub fn register_slate(
        &mut self,
        ctx: &mut CallContext<'_>,
        addresses: &[Address],
    ) -> Result<SlateId, GovernanceError> {
        ctx.charge_reads(1)?;
        if addresses.len() > self.slates.max_slate_size() {
            return Err(GovernanceError::SlateTooLarge {
                len: addresses.len(),
                max: self.slates.max_slate_size(),
            });
        }
        let id = chief_crypto::hash_slate(addresses);
        if !self.slates.contains(&id) {
            ctx.charge_writes(addresses.len() + 1)?;
        }
        let (id, created) = self.slates.register(addresses)?;
        if created {
            tracing::debug!(slate = %id, len = addresses.len(), "slate registered");
        }
        Ok(id)
    }

    // ── Deposits ────────────────────────────────────────────────────────

    /// Lock `amount` of the sender's stake (`lock`).
    ///
    /// Pulls the stake into the ledger, mints the same amount of receipt
    /// tokens to the sender, and credits the sender's current slate so the
    /// new weight counts immediately. A zero amount does nothing.
    pub fn deposit(
        &mut self,
        ctx: &mut CallContext<'_>,
        amount: Amount,
        ledgers: &mut Ledgers<'_>,
    ) -> Result<(), GovernanceError> {
        let voter = ctx.sender();
        if amount.is_zero() {
            tracing::debug!(%voter, "zero deposit ignored");
            return Ok(());
        }
        ctx.charge_reads(2)?;
        let record = self.voters.get(&voter).cloned().unwrap_or_default();
        let weight = record
            .weight
            .checked_add(amount)
            .ok_or(GovernanceError::ArithmeticOverflow)?;
        let total_weight = self
            .total_weight
            .checked_add(amount)
            .ok_or(GovernanceError::ArithmeticOverflow)?;
        let members = self.slates.resolve(&record.slate)?;
        ctx.charge_reads(members.len())?;
        let mut staged = StagedApprovals::new(&self.approvals);
        staged.apply(members, Delta::Credit(amount))?;
        let changes = staged.into_changes();

        {
            let mut inner = ctx.nested(self.address)?;
            ledgers.stake.transfer_from(&mut inner, &voter, &self.address, amount)?;
            ledgers.receipt.mint(&mut inner, &voter, amount)?;
        }

        ctx.charge_writes(changes.len() + 2)?;
        self.commit_approvals(changes);
        self.voters.insert(voter, VoterRecord { weight, ..record });
        self.total_weight = total_weight;
        tracing::debug!(%voter, %amount, %weight, "stake locked");
        Ok(())
    }

    /// Unlock `amount` of the sender's stake (`free`).
    ///
    /// Burns the sender's receipt tokens, debits the current slate and
    /// returns the stake to the sender. A zero amount does nothing.
    pub fn withdraw(
        &mut self,
        ctx: &mut CallContext<'_>,
        amount: Amount,
        ledgers: &mut Ledgers<'_>,
    ) -> Result<(), GovernanceError> {
        let voter = ctx.sender();
        if amount.is_zero() {
            tracing::debug!(%voter, "zero withdrawal ignored");
            return Ok(());
        }
        ctx.charge_reads(2)?;
        let record = self.voters.get(&voter).cloned().unwrap_or_default();
        let weight = record.weight.checked_sub(amount).ok_or(
            GovernanceError::InsufficientWeight { voter, have: record.weight, need: amount },
        )?;
        let total_weight = self.total_weight.checked_sub(amount).ok_or_else(|| {
            GovernanceError::InvariantViolation(format!(
                "total weight {} below withdrawal {amount}",
                self.total_weight
            ))
        })?;
        let members = self.slates.resolve(&record.slate)?;
        ctx.charge_reads(members.len())?;
        let mut staged = StagedApprovals::new(&self.approvals);
        staged.apply(members, Delta::Debit(amount))?;
        let changes = staged.into_changes();

        {
            let mut inner = ctx.nested(self.address)?;
            ledgers.receipt.burn(&mut inner, &voter, amount)?;
            ledgers.stake.transfer(&mut inner, &voter, amount)?;
        }

        ctx.charge_writes(changes.len() + 2)?;
        self.commit_approvals(changes);
        self.voters.insert(voter, VoterRecord { weight, ..record });
        self.total_weight = total_weight;
        tracing::debug!(%voter, %amount, %weight, "stake freed");
        Ok(())
    }

    // ── Voting ──────────────────────────────────────────────────────────

    /// Move the sender's whole weight from their current slate to `slate`.
    pub fn vote(
        &mut self,
        ctx: &mut CallContext<'_>,
        slate: &SlateId,
    ) -> Result<(), GovernanceError> {
        let voter = ctx.sender();
        ctx.charge_reads(2)?;
        let new_members = self.slates.resolve(slate)?;
        let record = self.voters.get(&voter).cloned().unwrap_or_default();
        let old_members = self.slates.resolve(&record.slate)?;
        ctx.charge_reads(old_members.len() + new_members.len())?;

        let mut staged = StagedApprovals::new(&self.approvals);
        staged.apply(old_members, Delta::Debit(record.weight))?;
        staged.apply(new_members, Delta::Credit(record.weight))?;
        let changes = staged.into_changes();

        ctx.charge_writes(changes.len() + 1)?;
        self.commit_approvals(changes);
        tracing::debug!(%voter, from = %record.slate, to = %slate, weight = %record.weight, "vote");
        self.voters.insert(voter, VoterRecord { slate: *slate, ..record });
        Ok(())
    }

    /// Register `addresses` as a slate and vote for it.
    pub fn vote_addresses(
        &mut self,
        ctx: &mut CallContext<'_>,
        addresses: &[Address],
    ) -> Result<SlateId, GovernanceError> {
        let slate = self.register_slate(ctx, addresses)?;
        self.vote(ctx, &slate)?;
        Ok(slate)
    }

    /// Make `candidate` the hat if it has strictly more approvals than the
    /// current hat.
    pub fn lift(
        &mut self,
        ctx: &mut CallContext<'_>,
        candidate: &Address,
    ) -> Result<(), GovernanceError> {
        ctx.charge_reads(3)?;
        let candidate_approvals = self.approvals(candidate);
        let hat_approvals = self.approvals(&self.hat);
        if candidate_approvals <= hat_approvals {
            return Err(GovernanceError::NotMoreApproved {
                candidate: *candidate,
                candidate_approvals,
                hat: self.hat,
                hat_approvals,
            });
        }
        ctx.charge_writes(1)?;
        tracing::info!(old = %self.hat, new = %candidate, approvals = %candidate_approvals, "hat lifted");
        self.hat = *candidate;
        Ok(())
    }

    fn commit_approvals(&mut self, changes: HashMap<Address, Amount>) {
        for (candidate, value) in changes {
            if value.is_zero() {
                self.approvals.remove(&candidate);
            } else {
                self.approvals.insert(candidate, value);
            }
        }
    }

    // ── Consistency ─────────────────────────────────────────────────────

    /// Recompute every approval total from the voter records and compare it
    /// with the stored counters.
    pub fn audit(&self) -> Result<(), GovernanceError> {
        let mut expected: HashMap<Address, Amount> = HashMap::new();
        let mut total = Amount::ZERO;
        for (voter, record) in &self.voters {
            total = total
                .checked_add(record.weight)
                .ok_or(GovernanceError::ArithmeticOverflow)?;
            if record.weight.is_zero() {
                continue;
            }
            let members = self.slates.resolve(&record.slate).map_err(|_| {
                GovernanceError::InvariantViolation(format!("{voter} selects an unknown slate"))
            })?;
            for candidate in members {
                let entry = expected.entry(*candidate).or_default();
                *entry = entry
                    .checked_add(record.weight)
                    .ok_or(GovernanceError::ArithmeticOverflow)?;
            }
        }
        if total != self.total_weight {
            return Err(GovernanceError::InvariantViolation(format!(
                "total weight {} but voters sum to {total}",
                self.total_weight
            )));
        }
        if expected != self.approvals {
            return Err(GovernanceError::InvariantViolation(
                "approval counters disagree with voter records".to_string(),
            ));
        }
        Ok(())
    }
}

/// Serializable snapshot of the ledger's state.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    pub address: Address,
    pub slates: SlateRegistry,
    pub voters: HashMap<Address, VoterRecord>,
    pub approvals: HashMap<Address, Amount>,
    pub total_weight: Amount,
    pub hat: Address,
}

impl ApprovalLedger {
    /// Serialize the ledger to bytes.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        let snapshot = LedgerSnapshot {
            address: self.address,
            slates: self.slates.clone(),
            voters: self.voters.clone(),
            approvals: self.approvals.clone(),
            total_weight: self.total_weight,
            hat: self.hat,
        };
        bincode::serialize(&snapshot).map_err(|e| GovernanceError::Snapshot(e.to_string()))
    }

    /// Restore a ledger from [`ApprovalLedger::save_state`] output. The
    /// restored state is audited before it is returned.
    pub fn load_state(data: &[u8]) -> Result<Self, GovernanceError> {
        let snapshot: LedgerSnapshot =
            bincode::deserialize(data).map_err(|e| GovernanceError::Snapshot(e.to_string()))?;
        let ledger = Self {
            address: snapshot.address,
            slates: snapshot.slates,
            voters: snapshot.voters,
            approvals: snapshot.approvals,
            total_weight: snapshot.total_weight,
            hat: snapshot.hat,
        };
        ledger.audit()?;
        Ok(ledger)
    }
}

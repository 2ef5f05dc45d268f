//! Per-call gas metering.
//!
//! Every public operation runs against a [`GasMeter`] owned by the runtime.
//! Components charge the meter for the storage they touch through the
//! [`CallContext`] they are handed, so the cost of a call reflects the work
//! it actually did (an empty `lock` is measurably cheaper than a real one).

use crate::address::Address;
use thiserror::Error;

/// Fixed cost schedule, in gas units.
pub mod cost {
    /// Charged once per top-level call.
    pub const CALL_BASE: u64 = 21_000;
    /// Charged when one component calls into another.
    pub const NESTED_CALL: u64 = 700;
    /// Reading one storage slot.
    pub const STORAGE_READ: u64 = 200;
    /// Writing one storage slot.
    pub const STORAGE_WRITE: u64 = 5_000;
    /// Appending one event to a log.
    pub const LOG: u64 = 375;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GasError {
    #[error("out of gas: needed {needed} more, {remaining} remaining of {limit}")]
    OutOfGas { needed: u64, remaining: u64, limit: u64 },
}

/// Accumulates gas for a single top-level call and enforces its limit.
#[derive(Debug, Clone)]
pub struct GasMeter {
    used: u64,
    limit: u64,
}

impl GasMeter {
    pub fn new(limit: u64) -> Self {
        Self { used: 0, limit }
    }

    /// A meter with no practical limit, for reads and tests.
    pub fn unlimited() -> Self {
        Self::new(u64::MAX)
    }

    pub fn charge(&mut self, units: u64) -> Result<(), GasError> {
        let remaining = self.remaining();
        if units > remaining {
            return Err(GasError::OutOfGas { needed: units, remaining, limit: self.limit });
        }
        self.used += units;
        Ok(())
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }
}

/// The caller of the current (possibly nested) call plus the shared meter.
pub struct CallContext<'m> {
    sender: Address,
    meter: &'m mut GasMeter,
}

impl<'m> CallContext<'m> {
    pub fn new(sender: Address, meter: &'m mut GasMeter) -> Self {
        Self { sender, meter }
    }

    /// The address that made this call.
    pub fn sender(&self) -> Address {
        self.sender
    }

    pub fn charge(&mut self, units: u64) -> Result<(), GasError> {
        self.meter.charge(units)
    }

    pub fn charge_reads(&mut self, slots: usize) -> Result<(), GasError> {
        self.charge(cost::STORAGE_READ.saturating_mul(slots as u64))
    }

    pub fn charge_writes(&mut self, slots: usize) -> Result<(), GasError> {
        self.charge(cost::STORAGE_WRITE.saturating_mul(slots as u64))
    }

    pub fn charge_log(&mut self) -> Result<(), GasError> {
        self.charge(cost::LOG)
    }

    /// Enter a nested call made by `caller` (usually the current component's
    /// own address). The nested context shares this call's meter.
    pub fn nested(&mut self, caller: Address) -> Result<CallContext<'_>, GasError> {
        self.meter.charge(cost::NESTED_CALL)?;
        Ok(CallContext { sender: caller, meter: &mut *self.meter })
    }

    pub fn gas_used(&self) -> u64 {
        self.meter.used()
    }
}

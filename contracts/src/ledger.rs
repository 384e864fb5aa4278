//! # Balance Ledger
//!
//! The ledger is deliberately dumb: a map from address to balance with
//! checked credit and debit. It knows nothing about enrollment or
//! ownership; the gate in [`crate::bank`] decides *whether* a mutation may
//! happen, the ledger only makes sure the arithmetic never wraps.
//!
//! Absent entries read as zero, so every address "has" a balance from
//! genesis without the map having to hold it.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::address::Address;
use crate::error::BankError;

/// Address → balance in base units.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceLedger {
    balances: BTreeMap<Address, u64>,
}

impl BalanceLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balance of `address`; 0 if it has never been credited.
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Balance `address` would have after crediting `amount`, without
    /// applying it.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::BalanceOverflow`] if the result exceeds `u64::MAX`.
    pub fn checked_credit(&self, address: &Address, amount: u64) -> Result<u64, BankError> {
        let current = self.balance_of(address);
        current
            .checked_add(amount)
            .ok_or(BankError::BalanceOverflow {
                current,
                credit: amount,
            })
    }

    /// Balance `address` would have after debiting `amount`, without
    /// applying it.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::Underflow`] if `amount` exceeds the balance.
    pub fn checked_debit(&self, address: &Address, amount: u64) -> Result<u64, BankError> {
        let balance = self.balance_of(address);
        balance.checked_sub(amount).ok_or(BankError::Underflow {
            balance,
            requested: amount,
        })
    }

    /// Adds `amount` to `address` and returns the new balance.
    pub fn credit(&mut self, address: &Address, amount: u64) -> Result<u64, BankError> {
        let updated = self.checked_credit(address, amount)?;
        self.set(address, updated);
        Ok(updated)
    }

    /// Removes `amount` from `address` and returns the new balance.
    pub fn debit(&mut self, address: &Address, amount: u64) -> Result<u64, BankError> {
        let updated = self.checked_debit(address, amount)?;
        self.set(address, updated);
        Ok(updated)
    }

    /// Sum of all balances, widened so it cannot overflow.
    pub fn total(&self) -> u128 {
        self.balances.values().map(|b| u128::from(*b)).sum()
    }

    /// Non-zero balances in ascending address order.
    pub fn iter(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.balances.iter()
    }

    fn set(&mut self, address: &Address, balance: u64) {
        if balance == 0 {
            self.balances.remove(address);
        } else {
            self.balances.insert(*address, balance);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_address_reads_zero() {
        let ledger = BalanceLedger::new();
        assert_eq!(ledger.balance_of(&Address::from_index(9)), 0);
        assert_eq!(ledger.total(), 0);
    }

    #[test]
    fn credit_then_debit() {
        let mut ledger = BalanceLedger::new();
        let a = Address::from_index(1);
        assert_eq!(ledger.credit(&a, 1_000).unwrap(), 1_000);
        assert_eq!(ledger.debit(&a, 400).unwrap(), 600);
        assert_eq!(ledger.balance_of(&a), 600);
    }

    #[test]
    fn debit_past_zero_is_rejected_without_effect() {
        let mut ledger = BalanceLedger::new();
        let a = Address::from_index(1);
        ledger.credit(&a, 10).unwrap();
        let err = ledger.debit(&a, 11).unwrap_err();
        assert_eq!(
            err,
            BankError::Underflow {
                balance: 10,
                requested: 11
            }
        );
        assert_eq!(ledger.balance_of(&a), 10);
    }

    #[test]
    fn credit_overflow_is_rejected() {
        let mut ledger = BalanceLedger::new();
        let a = Address::from_index(1);
        ledger.credit(&a, u64::MAX).unwrap();
        assert!(matches!(
            ledger.credit(&a, 1),
            Err(BankError::BalanceOverflow { .. })
        ));
        assert_eq!(ledger.balance_of(&a), u64::MAX);
    }

    #[test]
    fn total_does_not_overflow() {
        let mut ledger = BalanceLedger::new();
        ledger.credit(&Address::from_index(1), u64::MAX).unwrap();
        ledger.credit(&Address::from_index(2), u64::MAX).unwrap();
        assert_eq!(ledger.total(), 2 * u128::from(u64::MAX));
    }

    #[test]
    fn drained_entries_are_dropped() {
        let mut ledger = BalanceLedger::new();
        let a = Address::from_index(1);
        ledger.credit(&a, 5).unwrap();
        ledger.debit(&a, 5).unwrap();
        assert_eq!(ledger.iter().count(), 0);
    }
}

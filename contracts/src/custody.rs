//! # Value Custody
//!
//! The bank keeps books; it does not move money. Value actually changes
//! hands through a [`Custody`] implementation supplied by the hosting
//! environment, which pulls the genesis funding in from the owner and pays
//! withdrawals and deposits out of the pooled amount.
//!
//! [`InMemoryCustody`] is a self-contained simulation of that environment:
//! it tracks every address's external balance next to the pool, which is
//! what tests and the CLI harness use to observe the external effect of a
//! call ("the owner's wallet went up by 1000").

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::address::Address;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised by a custody provider when moving value.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CustodyError {
    /// The pool does not hold enough to cover a payout.
    #[error("insufficient custody: requested {requested}, held {held}")]
    InsufficientPool {
        /// Amount the payout needed.
        requested: u64,
        /// Amount the pool currently holds.
        held: u64,
    },

    /// The sender's external balance cannot cover the amount pulled in.
    #[error("insufficient external balance for {address}: requested {requested}, available {available}")]
    InsufficientExternal {
        /// The account the value was pulled from.
        address: Address,
        /// Amount requested.
        requested: u64,
        /// External balance actually available.
        available: u64,
    },

    /// A balance would exceed `u64::MAX`.
    #[error("custody overflow while moving {amount}")]
    Overflow {
        /// The amount being moved.
        amount: u64,
    },
}

// ---------------------------------------------------------------------------
// Custody trait
// ---------------------------------------------------------------------------

/// Moves value into and out of the bank's pooled custody.
///
/// Implementations must be all-or-nothing: a call that returns `Err` leaves
/// every balance exactly as it was.
pub trait Custody {
    /// Total value currently held in the pool.
    fn held(&self) -> u64;

    /// Pulls `amount` from `from` into the pool.
    fn receive(&mut self, from: &Address, amount: u64) -> Result<(), CustodyError>;

    /// Pays `amount` out of the pool to `to`.
    fn pay_out(&mut self, to: &Address, amount: u64) -> Result<(), CustodyError>;

    /// Whether the pool holds at least `amount`.
    fn can_pay(&self, amount: u64) -> bool {
        self.held() >= amount
    }

    /// Validates a payout without performing it. When this returns `Ok`,
    /// an immediately following [`pay_out`](Self::pay_out) with the same
    /// arguments must succeed.
    fn check_pay_out(&self, _to: &Address, amount: u64) -> Result<(), CustodyError> {
        if !self.can_pay(amount) {
            return Err(CustodyError::InsufficientPool {
                requested: amount,
                held: self.held(),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryCustody
// ---------------------------------------------------------------------------

/// Simulated value environment: a pool plus one external balance per
/// address.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InMemoryCustody {
    /// Value held on behalf of the bank.
    pool: u64,
    /// Balances held outside the bank, keyed by address.
    external: HashMap<Address, u64>,
}

impl InMemoryCustody {
    /// An empty environment: nothing pooled, no external funds.
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment where each of `accounts` starts with `balance`
    /// externally.
    pub fn with_accounts<'a, I>(accounts: I, balance: u64) -> Self
    where
        I: IntoIterator<Item = &'a Address>,
    {
        let mut custody = Self::new();
        for a in accounts {
            custody.external.insert(*a, balance);
        }
        custody
    }

    /// Sets the external balance of `address`, replacing any previous value.
    pub fn set_external_balance(&mut self, address: Address, balance: u64) {
        self.external.insert(address, balance);
    }

    /// External balance of `address`, or 0 if it has never held value.
    pub fn external_balance_of(&self, address: &Address) -> u64 {
        self.external.get(address).copied().unwrap_or(0)
    }

    /// Non-zero external balances, ordered by address.
    pub fn external_balances(&self) -> BTreeMap<Address, u64> {
        self.external
            .iter()
            .filter(|(_, b)| **b > 0)
            .map(|(a, b)| (*a, *b))
            .collect()
    }
}

impl Custody for InMemoryCustody {
    fn held(&self) -> u64 {
        self.pool
    }

    fn receive(&mut self, from: &Address, amount: u64) -> Result<(), CustodyError> {
        let available = self.external_balance_of(from);
        let remaining = available
            .checked_sub(amount)
            .ok_or(CustodyError::InsufficientExternal {
                address: *from,
                requested: amount,
                available,
            })?;
        let pool = self
            .pool
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { amount })?;

        self.external.insert(*from, remaining);
        self.pool = pool;
        Ok(())
    }

    fn check_pay_out(&self, to: &Address, amount: u64) -> Result<(), CustodyError> {
        if self.pool < amount {
            return Err(CustodyError::InsufficientPool {
                requested: amount,
                held: self.pool,
            });
        }
        self.external_balance_of(to)
            .checked_add(amount)
            .map(|_| ())
            .ok_or(CustodyError::Overflow { amount })
    }

    fn pay_out(&mut self, to: &Address, amount: u64) -> Result<(), CustodyError> {
        let pool = self
            .pool
            .checked_sub(amount)
            .ok_or(CustodyError::InsufficientPool {
                requested: amount,
                held: self.pool,
            })?;
        let credited = self
            .external_balance_of(to)
            .checked_add(amount)
            .ok_or(CustodyError::Overflow { amount })?;

        self.pool = pool;
        self.external.insert(*to, credited);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receive_moves_external_into_pool() {
        let alice = Address::from_index(1);
        let mut c = InMemoryCustody::with_accounts([&alice], 500);
        c.receive(&alice, 200).unwrap();
        assert_eq!(c.held(), 200);
        assert_eq!(c.external_balance_of(&alice), 300);
    }

    #[test]
    fn receive_beyond_external_balance_is_atomic() {
        let alice = Address::from_index(1);
        let mut c = InMemoryCustody::with_accounts([&alice], 100);
        let err = c.receive(&alice, 101).unwrap_err();
        assert!(matches!(err, CustodyError::InsufficientExternal { .. }));
        assert_eq!(c.held(), 0);
        assert_eq!(c.external_balance_of(&alice), 100);
    }

    #[test]
    fn pay_out_beyond_pool_is_rejected() {
        let alice = Address::from_index(1);
        let mut c = InMemoryCustody::with_accounts([&alice], 100);
        c.receive(&alice, 50).unwrap();
        assert!(!c.can_pay(51));
        let err = c.pay_out(&alice, 51).unwrap_err();
        assert_eq!(
            err,
            CustodyError::InsufficientPool {
                requested: 51,
                held: 50
            }
        );
        assert_eq!(c.external_balance_of(&alice), 50);
    }

    #[test]
    fn pay_out_to_unknown_address_creates_balance() {
        let alice = Address::from_index(1);
        let bob = Address::from_index(2);
        let mut c = InMemoryCustody::with_accounts([&alice], 100);
        c.receive(&alice, 100).unwrap();
        c.pay_out(&bob, 40).unwrap();
        assert_eq!(c.external_balance_of(&bob), 40);
        assert_eq!(c.held(), 60);
        assert_eq!(c.external_balances().len(), 1);
    }
}

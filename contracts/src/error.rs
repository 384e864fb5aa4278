//! Error types for the bank.
//!
//! Every rejected call returns a [`BankError`]. A rejected call has no
//! effect: all checks run before the first mutation.

use thiserror::Error;

use crate::address::Address;
use crate::config;
use crate::custody::CustodyError;

/// Errors that can reject a bank operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BankError {
    /// The caller (or deposit target) has not enrolled.
    #[error("account is not registered: {0}")]
    NotRegistered(Address),

    /// `enroll` was called by an account that is already enrolled.
    #[error("user already enrolled: {0}")]
    AlreadyEnrolled(Address),

    /// The supplied amount is not strictly positive.
    #[error("amount is not valid: {0}")]
    InvalidAmount(u64),

    /// `withdraw_all` was called with a zero balance.
    #[error("insufficient funds: {0} has nothing to withdraw")]
    InsufficientFunds(Address),

    /// A privileged operation was called by a non-owner.
    #[error("caller {caller} is not the owner")]
    NotOwner {
        /// The rejected caller.
        caller: Address,
    },

    /// A debit larger than the balance.
    #[error("arithmetic underflow: balance {balance}, requested {requested}")]
    Underflow {
        /// Balance at the time of the call.
        balance: u64,
        /// Amount the caller tried to debit.
        requested: u64,
    },

    /// A credit that would overflow `u64`.
    #[error("balance overflow: current {current}, credit {credit}")]
    BalanceOverflow {
        /// Balance before the credit.
        current: u64,
        /// Amount that caused the overflow.
        credit: u64,
    },

    /// The pooled custody cannot cover the payout.
    #[error("insufficient custody: requested {requested}, held {held}")]
    InsufficientCustody {
        /// Amount the payout needed.
        requested: u64,
        /// Amount the pool holds.
        held: u64,
    },

    /// The custody provider refused to move value.
    #[error("custody error: {0}")]
    Custody(#[from] CustodyError),
}

impl BankError {
    /// Short revert reason, as surfaced to external callers.
    pub fn reason(&self) -> &'static str {
        match self {
            BankError::NotRegistered(_) => config::REASON_NOT_REGISTERED,
            BankError::AlreadyEnrolled(_) => config::REASON_ALREADY_ENROLLED,
            BankError::InvalidAmount(_) => config::REASON_INVALID_AMOUNT,
            BankError::InsufficientFunds(_) => config::REASON_INSUFFICIENT_FUNDS,
            BankError::NotOwner { .. } => config::REASON_NOT_OWNER,
            BankError::Underflow { .. } => config::REASON_UNDERFLOW,
            BankError::BalanceOverflow { .. } => config::REASON_OVERFLOW,
            BankError::InsufficientCustody { .. } => config::REASON_INSUFFICIENT_CUSTODY,
            BankError::Custody(CustodyError::Overflow { .. }) => config::REASON_OVERFLOW,
            BankError::Custody(_) => config::REASON_INSUFFICIENT_CUSTODY,
        }
    }
}

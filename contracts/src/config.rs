//! # Ledger Configuration & Constants
//!
//! Every magic number the bank relies on lives here: value units, genesis
//! defaults, the development accounts used by the harness, and the revert
//! reasons surfaced to callers.
//!
//! The revert reasons are part of the observable interface. Clients match on
//! them, so treat a change here like a breaking API change.

// ---------------------------------------------------------------------------
// Value Units
// ---------------------------------------------------------------------------

/// Name of the smallest indivisible value unit. All balances and amounts in
/// the crate are integers of this unit.
pub const BASE_UNIT: &str = "wei";

/// One gwei expressed in base units.
pub const ONE_GWEI: u64 = 1_000_000_000;

/// Funding used by the reference fixture when none is specified.
pub const DEFAULT_GENESIS_FUNDING: u64 = ONE_GWEI;

// ---------------------------------------------------------------------------
// Addresses
// ---------------------------------------------------------------------------

/// Length of an account address in bytes (EVM-style, 160 bits).
pub const ADDRESS_LENGTH: usize = 20;

/// Hex prefix used when rendering addresses.
pub const ADDRESS_PREFIX: &str = "0x";

/// Well-known development accounts, in signer order. Index 0 deploys and
/// owns the bank in the reference fixture; index 1 is the "other account".
pub const DEV_ACCOUNTS: [&str; 3] = [
    "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
    "0x70997970c51812dc3a010c7d01b50e0d17dc79c8",
    "0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc",
];

/// External balance each development account starts with in the simulated
/// custody environment. Large enough to fund any fixture many times over.
pub const DEV_ACCOUNT_STARTING_BALANCE: u64 = 10_000 * ONE_GWEI;

// ---------------------------------------------------------------------------
// Revert Reasons
// ---------------------------------------------------------------------------

/// The caller (or deposit target) has never enrolled.
pub const REASON_NOT_REGISTERED: &str = "Account is not registered";

/// `enroll` on an address that is already enrolled.
pub const REASON_ALREADY_ENROLLED: &str = "User already enrolled";

/// A zero amount was supplied.
pub const REASON_INVALID_AMOUNT: &str = "Amount is not valid";

/// `withdraw_all` with nothing to withdraw.
pub const REASON_INSUFFICIENT_FUNDS: &str = "Insufficient funds";

/// A privileged operation was called by someone other than the owner.
pub const REASON_NOT_OWNER: &str = "Caller is not the owner";

/// A debit would have taken a balance below zero.
pub const REASON_UNDERFLOW: &str = "Arithmetic underflow";

/// A credit would have overflowed the balance type.
pub const REASON_OVERFLOW: &str = "Arithmetic overflow";

/// The pool cannot cover a payout.
pub const REASON_INSUFFICIENT_CUSTODY: &str = "Insufficient custody";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dev_accounts_are_distinct_and_well_formed() {
        for (i, a) in DEV_ACCOUNTS.iter().enumerate() {
            assert!(a.starts_with(ADDRESS_PREFIX));
            assert_eq!(a.len(), ADDRESS_PREFIX.len() + ADDRESS_LENGTH * 2);
            for b in DEV_ACCOUNTS.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_dev_balance_covers_default_funding() {
        assert!(DEV_ACCOUNT_STARTING_BALANCE > DEFAULT_GENESIS_FUNDING);
    }
}

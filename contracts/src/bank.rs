//! # SimpleBank
//!
//! A single owner-funded pool with per-account books. The lifecycle is:
//!
//! 1. **Deploy**: the owner funds the pool; the funding becomes the
//!    owner's opening balance and the owner is enrolled.
//! 2. **Enroll**: any other address registers itself, once.
//! 3. **Withdraw / Withdraw all**: an enrolled account pulls value out of
//!    its own balance.
//! 4. **Deposit**: the owner credits an enrolled account, which is paid
//!    immediately from the pool.
//!
//! Every mutating call follows the same shape: run all checks, then move
//! value through the [`Custody`] provider, then update the books, then log
//! the event. Custody is the only step that can fail once checks pass, and
//! it runs first, so a rejected call never leaves partial effects.
//!
//! ## Deposit drift
//!
//! `deposit` credits the target's ledger balance *and* pays the target out
//! of the pool, without debiting the owner. The ledger total therefore grows
//! while custody shrinks. The drift is reported through
//! [`SimpleBank::audit`] rather than corrected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;
use crate::custody::{Custody, CustodyError, InMemoryCustody};
use crate::error::BankError;
use crate::events::{BankEvent, EventLog};
use crate::ledger::BalanceLedger;
use crate::registry::{IdentityRegistry, Registration};

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Read-only view of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// The account's address.
    pub address: Address,
    /// Whether the account has enrolled (the owner always has).
    pub enrolled: bool,
    /// Ledger balance in base units.
    pub balance: u64,
}

/// Comparison of the books against the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustodyAudit {
    /// Sum of every ledger balance.
    pub ledger_total: u128,
    /// Value the custody provider holds for the bank.
    pub custody_held: u64,
    /// `ledger_total - custody_held`. Positive means the books promise more
    /// than the pool holds.
    pub drift: i128,
}

impl CustodyAudit {
    /// Whether the books and the pool agree exactly.
    pub fn is_balanced(&self) -> bool {
        self.drift == 0
    }
}

/// Serializable picture of the whole bank.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankSnapshot {
    /// Instance identifier.
    pub bank_id: Uuid,
    /// The owner address.
    pub owner: Address,
    /// When the instance was deployed.
    pub deployed_at: DateTime<Utc>,
    /// Every enrolled account, ascending by address.
    pub accounts: Vec<Account>,
    /// Books-versus-pool comparison.
    pub audit: CustodyAudit,
    /// Number of events emitted so far.
    pub event_count: usize,
}

// ---------------------------------------------------------------------------
// SimpleBank
// ---------------------------------------------------------------------------

/// The bank instance: owner, registry, ledger, event log, and the custody
/// provider that actually holds the pooled value.
///
/// All mutating operations take `&mut self`, so calls are serialized by
/// construction.
#[derive(Debug, Clone)]
pub struct SimpleBank<C: Custody = InMemoryCustody> {
    bank_id: Uuid,
    owner: Address,
    deployed_at: DateTime<Utc>,
    registry: IdentityRegistry,
    ledger: BalanceLedger,
    events: EventLog,
    custody: C,
}

impl<C: Custody> SimpleBank<C> {
    /// Deploys a new bank owned by `owner`, pulling `funding` into custody.
    ///
    /// The owner starts enrolled with a ledger balance of `funding`. Zero
    /// funding is allowed.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::Custody`] if the owner cannot supply the funding.
    pub fn deploy(owner: Address, funding: u64, mut custody: C) -> Result<Self, BankError> {
        custody.receive(&owner, funding)?;

        let bank_id = Uuid::new_v4();
        let mut registry = IdentityRegistry::new();
        registry.enroll(owner)?;
        let mut ledger = BalanceLedger::new();
        ledger.credit(&owner, funding)?;

        tracing::info!(%bank_id, %owner, funding, "bank deployed");

        Ok(Self {
            bank_id,
            owner,
            deployed_at: Utc::now(),
            registry,
            ledger,
            events: EventLog::new(bank_id),
            custody,
        })
    }

    // -- Identity Registry ---------------------------------------------------

    /// Enrolls `caller`.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::AlreadyEnrolled`] if `caller` is already enrolled,
    /// including the owner.
    pub fn enroll(&mut self, caller: Address) -> Result<BankEvent, BankError> {
        self.registry.enroll(caller)?;
        tracing::info!(%caller, "account enrolled");
        Ok(self.emit(BankEvent::Enrolled { account: caller }))
    }

    // -- Operation Gate ------------------------------------------------------

    /// Withdraws `amount` from the caller's balance and pays it out.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`BankError::NotRegistered`] if the caller is not enrolled.
    /// - [`BankError::InvalidAmount`] if `amount` is zero.
    /// - [`BankError::Underflow`] if `amount` exceeds the balance.
    /// - [`BankError::InsufficientCustody`] if the pool cannot cover it.
    pub fn withdraw(&mut self, caller: Address, amount: u64) -> Result<BankEvent, BankError> {
        self.require_enrolled(&caller)?;
        require_positive(amount)?;
        let new_balance = self.ledger.checked_debit(&caller, amount)?;
        self.require_payable(&caller, amount)?;

        self.custody.pay_out(&caller, amount)?;
        self.ledger.debit(&caller, amount)?;

        tracing::info!(%caller, amount, new_balance, "withdrawal processed");
        Ok(self.emit(BankEvent::Withdrawal {
            account: caller,
            amount,
            new_balance,
        }))
    }

    /// Withdraws the caller's entire balance.
    ///
    /// Enrollment is implied: an unenrolled account's balance is always
    /// zero, which is rejected.
    ///
    /// # Errors
    ///
    /// - [`BankError::InsufficientFunds`] if the balance is zero.
    /// - [`BankError::InsufficientCustody`] if the pool cannot cover it.
    pub fn withdraw_all(&mut self, caller: Address) -> Result<BankEvent, BankError> {
        let amount = self.ledger.balance_of(&caller);
        if amount == 0 {
            return Err(BankError::InsufficientFunds(caller));
        }
        self.require_payable(&caller, amount)?;

        self.custody.pay_out(&caller, amount)?;
        let new_balance = self.ledger.debit(&caller, amount)?;

        tracing::info!(%caller, amount, "full withdrawal processed");
        Ok(self.emit(BankEvent::Withdrawal {
            account: caller,
            amount,
            new_balance,
        }))
    }

    /// Owner-only: credits `target` with `amount` and pays it out of the
    /// pool. The owner's own balance is not touched (see the module docs).
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`BankError::NotOwner`] if `caller` is not the owner.
    /// - [`BankError::NotRegistered`] if `target` is not enrolled.
    /// - [`BankError::InvalidAmount`] if `amount` is zero.
    /// - [`BankError::BalanceOverflow`] if the credit would overflow.
    /// - [`BankError::InsufficientCustody`] if the pool cannot cover it.
    pub fn deposit(
        &mut self,
        caller: Address,
        target: Address,
        amount: u64,
    ) -> Result<BankEvent, BankError> {
        if caller != self.owner {
            return Err(BankError::NotOwner { caller });
        }
        self.require_enrolled(&target)?;
        require_positive(amount)?;
        self.ledger.checked_credit(&target, amount)?;
        self.require_payable(&target, amount)?;

        self.custody.pay_out(&target, amount)?;
        let new_balance = self.ledger.credit(&target, amount)?;

        let audit = self.audit();
        tracing::info!(%target, amount, new_balance, "deposit made");
        if !audit.is_balanced() {
            tracing::warn!(
                drift = %audit.drift,
                ledger_total = %audit.ledger_total,
                custody_held = audit.custody_held,
                "ledger total no longer matches custody"
            );
        }

        Ok(self.emit(BankEvent::DepositMade {
            account: target,
            amount,
        }))
    }

    // -- Queries -------------------------------------------------------------

    /// The owner fixed at deployment.
    pub fn owner(&self) -> Address {
        self.owner
    }

    /// The caller's own ledger balance. 0 for unenrolled callers.
    pub fn get_balance(&self, caller: &Address) -> u64 {
        self.ledger.balance_of(caller)
    }

    /// Ledger balance of any address.
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.ledger.balance_of(address)
    }

    /// Whether `address` has enrolled.
    pub fn is_enrolled(&self, address: &Address) -> bool {
        self.registry.is_enrolled(address)
    }

    /// Registration state of `address`.
    pub fn registration(&self, address: &Address) -> Registration {
        self.registry.status(address)
    }

    /// Combined view of one account.
    pub fn account(&self, address: &Address) -> Account {
        Account {
            address: *address,
            enrolled: self.registry.is_enrolled(address),
            balance: self.ledger.balance_of(address),
        }
    }

    /// Number of enrolled accounts, owner included.
    pub fn enrolled_count(&self) -> usize {
        self.registry.len()
    }

    /// The event log.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// The custody provider.
    pub fn custody(&self) -> &C {
        &self.custody
    }

    /// Instance identifier.
    pub fn bank_id(&self) -> Uuid {
        self.bank_id
    }

    /// Compares the books against the pool.
    pub fn audit(&self) -> CustodyAudit {
        let ledger_total = self.ledger.total();
        let custody_held = self.custody.held();
        CustodyAudit {
            ledger_total,
            custody_held,
            drift: i128::try_from(ledger_total).unwrap_or(i128::MAX) - i128::from(custody_held),
        }
    }

    /// Serializable picture of the current state.
    pub fn snapshot(&self) -> BankSnapshot {
        BankSnapshot {
            bank_id: self.bank_id,
            owner: self.owner,
            deployed_at: self.deployed_at,
            accounts: self.registry.iter().map(|a| self.account(a)).collect(),
            audit: self.audit(),
            event_count: self.events.len(),
        }
    }

    // -- Internals -----------------------------------------------------------

    fn require_enrolled(&self, address: &Address) -> Result<(), BankError> {
        if !self.registry.is_enrolled(address) {
            return Err(BankError::NotRegistered(*address));
        }
        Ok(())
    }

    fn require_payable(&self, to: &Address, amount: u64) -> Result<(), BankError> {
        self.custody
            .check_pay_out(to, amount)
            .map_err(|e| match e {
                CustodyError::InsufficientPool { requested, held } => {
                    BankError::InsufficientCustody { requested, held }
                }
                other => BankError::Custody(other),
            })
    }

    fn emit(&mut self, event: BankEvent) -> BankEvent {
        self.events.emit(event).event
    }
}

fn require_positive(amount: u64) -> Result<(), BankError> {
    if amount == 0 {
        return Err(BankError::InvalidAmount(amount));
    }
    Ok(())
}

//! # Sessions
//!
//! A session is a scripted sequence of calls against one freshly deployed
//! bank. The harness stands in for the caller identity provider: it vouches
//! for each call's `caller`, seeds external balances, and reports what every
//! call did to the books, the event log and the external balances.
//!
//! ## File format
//!
//! ```json
//! {
//!   "owner": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
//!   "funding": 1000000000,
//!   "balances": { "0x70997970c51812dc3a010c7d01b50e0d17dc79c8": 5000 },
//!   "calls": [
//!     { "caller": "0x7099...79c8", "op": "enroll" },
//!     { "caller": "0xf39f...2266", "op": "deposit", "target": "0x7099...79c8", "amount": 1000 },
//!     { "caller": "0x7099...79c8", "op": "withdraw_all" }
//!   ]
//! }
//! ```
//!
//! `funding` defaults to one gwei. Any participant missing from `balances`
//! starts with the development account balance.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use simplebank_contracts::config::{DEFAULT_GENESIS_FUNDING, DEV_ACCOUNTS, DEV_ACCOUNT_STARTING_BALANCE};
use simplebank_contracts::{
    Address, AddressError, BankError, BankEvent, BankSnapshot, EventRecord, InMemoryCustody,
    SimpleBank,
};

use crate::metrics::RunMetrics;

// ---------------------------------------------------------------------------
// Session definition
// ---------------------------------------------------------------------------

fn default_funding() -> u64 {
    DEFAULT_GENESIS_FUNDING
}

/// A scripted run: who deploys, with how much, and which calls follow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Deployer and owner of the bank.
    pub owner: Address,
    /// Genesis funding pulled from the owner.
    #[serde(default = "default_funding")]
    pub funding: u64,
    /// Starting external balances. Unlisted participants get the default.
    #[serde(default)]
    pub balances: BTreeMap<Address, u64>,
    /// Calls, executed in order.
    #[serde(default)]
    pub calls: Vec<Call>,
}

/// One call: an authenticated caller and the operation it invokes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    /// Address the identity provider vouches for.
    pub caller: Address,
    /// What the caller invokes.
    #[serde(flatten)]
    pub op: Operation,
}

/// Every public bank operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Operation {
    /// Query the owner.
    Owner,
    /// Query the caller's balance.
    GetBalance,
    /// Enroll the caller.
    Enroll,
    /// Withdraw part of the caller's balance.
    Withdraw {
        /// Amount to withdraw.
        amount: u64,
    },
    /// Withdraw the caller's whole balance.
    WithdrawAll,
    /// Owner credits an enrolled target.
    Deposit {
        /// Account to credit.
        target: Address,
        /// Amount to credit.
        amount: u64,
    },
}

impl Operation {
    /// Operation name as used in reports and metric labels.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::Owner => "owner",
            Operation::GetBalance => "get_balance",
            Operation::Enroll => "enroll",
            Operation::Withdraw { .. } => "withdraw",
            Operation::WithdrawAll => "withdraw_all",
            Operation::Deposit { .. } => "deposit",
        }
    }
}

impl Session {
    /// Every address the session touches, ascending.
    pub fn participants(&self) -> BTreeSet<Address> {
        let mut set: BTreeSet<Address> = self.balances.keys().copied().collect();
        set.insert(self.owner);
        for call in &self.calls {
            set.insert(call.caller);
            if let Operation::Deposit { target, .. } = call.op {
                set.insert(target);
            }
        }
        set
    }

    /// The built-in reference scenario on the development accounts: the
    /// guarded failure paths, a partial withdrawal, enrollment, an owner
    /// deposit, and full withdrawals on both sides of the resulting drift.
    pub fn reference(funding: u64) -> Result<Self, AddressError> {
        let owner: Address = DEV_ACCOUNTS[0].parse()?;
        let other: Address = DEV_ACCOUNTS[1].parse()?;
        let call = |caller, op| Call { caller, op };

        Ok(Self {
            owner,
            funding,
            balances: BTreeMap::new(),
            calls: vec![
                call(owner, Operation::Owner),
                call(owner, Operation::GetBalance),
                call(other, Operation::Withdraw { amount: funding }),
                call(owner, Operation::Withdraw { amount: 0 }),
                call(owner, Operation::Enroll),
                call(owner, Operation::Withdraw { amount: 1_000 }),
                call(other, Operation::Enroll),
                call(other, Operation::Deposit { target: other, amount: 1_000 }),
                call(
                    owner,
                    Operation::Deposit {
                        target: other,
                        amount: funding / 1_000,
                    },
                ),
                call(owner, Operation::WithdrawAll),
                call(other, Operation::WithdrawAll),
                call(other, Operation::GetBalance),
            ],
        })
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// Whether a call was accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CallStatus {
    /// Accepted and applied.
    Ok,
    /// Rejected with no effect.
    Reverted,
}

/// Value returned by a query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ReturnValue {
    /// `owner()`.
    Address(Address),
    /// `get_balance()`.
    Amount(u64),
}

/// What one call did.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOutcome {
    /// Position in the session's call list.
    pub index: usize,
    /// The caller.
    pub caller: Address,
    /// Operation name.
    pub operation: String,
    /// Accepted or reverted.
    pub status: CallStatus,
    /// Emitted event, for accepted mutations.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<BankEvent>,
    /// Returned value, for queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub returned: Option<ReturnValue>,
    /// Short revert reason.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Detailed error message.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    /// Signed change in each participant's external balance. Zero entries
    /// are omitted.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub balance_changes: BTreeMap<Address, i128>,
}

/// Full result of a session run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionReport {
    /// When execution began.
    pub started_at: DateTime<Utc>,
    /// When execution finished.
    pub finished_at: DateTime<Utc>,
    /// One entry per call, in order.
    pub outcomes: Vec<CallOutcome>,
    /// The bank's event log.
    pub events: Vec<EventRecord>,
    /// Final state of the bank.
    pub snapshot: BankSnapshot,
    /// Final external balances of every participant.
    pub external_balances: BTreeMap<Address, u64>,
}

impl SessionReport {
    /// Number of accepted calls.
    pub fn accepted(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == CallStatus::Ok)
            .count()
    }

    /// Number of reverted calls.
    pub fn reverted(&self) -> usize {
        self.outcomes.len() - self.accepted()
    }
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

/// Deploys a bank for `session` and executes its calls in order.
///
/// Reverted calls are recorded, not propagated; only a failed deployment
/// aborts the run.
///
/// # Errors
///
/// Returns [`BankError::Custody`] if the owner cannot supply the funding.
pub fn execute(session: &Session, metrics: Option<&RunMetrics>) -> Result<SessionReport, BankError> {
    let started_at = Utc::now();
    let participants = session.participants();

    let mut custody = InMemoryCustody::new();
    for a in &participants {
        let balance = session
            .balances
            .get(a)
            .copied()
            .unwrap_or(DEV_ACCOUNT_STARTING_BALANCE);
        custody.set_external_balance(*a, balance);
    }

    let mut bank = SimpleBank::deploy(session.owner, session.funding, custody)?;
    tracing::info!(
        bank_id = %bank.bank_id(),
        owner = %session.owner,
        calls = session.calls.len(),
        "session started"
    );

    let mut outcomes = Vec::with_capacity(session.calls.len());
    for (index, call) in session.calls.iter().enumerate() {
        let before = external_balances(&bank, &participants);
        let result = dispatch(&mut bank, call);
        let after = external_balances(&bank, &participants);

        let mut outcome = CallOutcome {
            index,
            caller: call.caller,
            operation: call.op.name().to_string(),
            status: CallStatus::Ok,
            event: None,
            returned: None,
            reason: None,
            detail: None,
            balance_changes: diff(&before, &after),
        };

        match result {
            Ok(Dispatched::Event(event)) => outcome.event = Some(event),
            Ok(Dispatched::Value(value)) => outcome.returned = Some(value),
            Err(e) => {
                tracing::warn!(index, caller = %call.caller, op = call.op.name(), error = %e, "call reverted");
                outcome.status = CallStatus::Reverted;
                outcome.reason = Some(e.reason().to_string());
                outcome.detail = Some(e.to_string());
            }
        }

        if let Some(m) = metrics {
            m.record_call(call.op.name(), outcome.status == CallStatus::Ok);
        }
        outcomes.push(outcome);
    }

    if let Some(m) = metrics {
        m.observe(&bank);
    }

    let report = SessionReport {
        started_at,
        finished_at: Utc::now(),
        outcomes,
        events: bank.events().records().to_vec(),
        snapshot: bank.snapshot(),
        external_balances: external_balances(&bank, &participants),
    };

    tracing::info!(
        accepted = report.accepted(),
        reverted = report.reverted(),
        drift = %report.snapshot.audit.drift,
        "session finished"
    );
    Ok(report)
}

enum Dispatched {
    Event(BankEvent),
    Value(ReturnValue),
}

fn dispatch(bank: &mut SimpleBank, call: &Call) -> Result<Dispatched, BankError> {
    let caller = call.caller;
    match call.op {
        Operation::Owner => Ok(Dispatched::Value(ReturnValue::Address(bank.owner()))),
        Operation::GetBalance => Ok(Dispatched::Value(ReturnValue::Amount(
            bank.get_balance(&caller),
        ))),
        Operation::Enroll => bank.enroll(caller).map(Dispatched::Event),
        Operation::Withdraw { amount } => bank.withdraw(caller, amount).map(Dispatched::Event),
        Operation::WithdrawAll => bank.withdraw_all(caller).map(Dispatched::Event),
        Operation::Deposit { target, amount } => {
            bank.deposit(caller, target, amount).map(Dispatched::Event)
        }
    }
}

fn external_balances(bank: &SimpleBank, participants: &BTreeSet<Address>) -> BTreeMap<Address, u64> {
    participants
        .iter()
        .map(|a| (*a, bank.custody().external_balance_of(a)))
        .collect()
}

fn diff(before: &BTreeMap<Address, u64>, after: &BTreeMap<Address, u64>) -> BTreeMap<Address, i128> {
    after
        .iter()
        .filter_map(|(a, now)| {
            let was = before.get(a).copied().unwrap_or(0);
            let delta = i128::from(*now) - i128::from(was);
            (delta != 0).then_some((*a, delta))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplebank_contracts::config::ONE_GWEI;

    fn outcome_of(report: &SessionReport, index: usize) -> &CallOutcome {
        &report.outcomes[index]
    }

    #[test]
    fn parse_session_file_format() {
        let json = r#"{
            "owner": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "calls": [
                { "caller": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8", "op": "enroll" },
                { "caller": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266", "op": "deposit",
                  "target": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8", "amount": 5 },
                { "caller": "0x70997970c51812dc3a010c7d01b50e0d17dc79c8", "op": "withdraw_all" }
            ]
        }"#;
        let session: Session = serde_json::from_str(json).unwrap();
        assert_eq!(session.funding, ONE_GWEI);
        assert_eq!(session.calls.len(), 3);
        assert_eq!(session.calls[2].op, Operation::WithdrawAll);
        assert_eq!(session.participants().len(), 2);
    }

    #[test]
    fn unknown_operation_is_rejected() {
        let json = r#"{
            "owner": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266",
            "calls": [{ "caller": "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266", "op": "borrow" }]
        }"#;
        assert!(serde_json::from_str::<Session>(json).is_err());
    }

    #[test]
    fn reference_scenario_outcomes() {
        let session = Session::reference(ONE_GWEI).unwrap();
        let owner = session.owner;
        let other: Address = DEV_ACCOUNTS[1].parse().unwrap();
        let report = execute(&session, None).unwrap();

        assert_eq!(
            outcome_of(&report, 0).returned,
            Some(ReturnValue::Address(owner))
        );
        assert_eq!(
            outcome_of(&report, 1).returned,
            Some(ReturnValue::Amount(ONE_GWEI))
        );
        assert_eq!(
            outcome_of(&report, 2).reason.as_deref(),
            Some("Account is not registered")
        );
        assert_eq!(
            outcome_of(&report, 3).reason.as_deref(),
            Some("Amount is not valid")
        );
        assert_eq!(
            outcome_of(&report, 4).reason.as_deref(),
            Some("User already enrolled")
        );

        let withdrawal = outcome_of(&report, 5);
        assert_eq!(
            withdrawal.event,
            Some(BankEvent::Withdrawal {
                account: owner,
                amount: 1_000,
                new_balance: 999_999_000,
            })
        );
        assert_eq!(withdrawal.balance_changes.get(&owner), Some(&1_000));

        assert_eq!(outcome_of(&report, 6).status, CallStatus::Ok);
        assert_eq!(
            outcome_of(&report, 7).reason.as_deref(),
            Some("Caller is not the owner")
        );

        let deposit = outcome_of(&report, 8);
        assert_eq!(
            deposit.event,
            Some(BankEvent::DepositMade {
                account: other,
                amount: 1_000_000,
            })
        );
        assert_eq!(deposit.balance_changes.get(&other), Some(&1_000_000));
        assert!(!deposit.balance_changes.contains_key(&owner));

        // The owner's books now exceed what the pool holds.
        assert_eq!(
            outcome_of(&report, 9).reason.as_deref(),
            Some("Insufficient custody")
        );
        assert_eq!(outcome_of(&report, 10).status, CallStatus::Ok);
        assert_eq!(
            outcome_of(&report, 11).returned,
            Some(ReturnValue::Amount(0))
        );

        assert_eq!(report.accepted(), 7);
        assert_eq!(report.reverted(), 5);
        assert_eq!(report.events.len(), 4);
    }

    #[test]
    fn deploy_failure_aborts_run() {
        let owner = Address::from_index(1);
        let session = Session {
            owner,
            funding: 10,
            balances: BTreeMap::from([(owner, 5)]),
            calls: Vec::new(),
        };
        assert!(matches!(execute(&session, None), Err(BankError::Custody(_))));
    }

    #[test]
    fn metrics_are_recorded() {
        let session = Session::reference(ONE_GWEI).unwrap();
        let metrics = RunMetrics::new().unwrap();
        execute(&session, Some(&metrics)).unwrap();
        assert_eq!(
            metrics
                .calls_total
                .with_label_values(&["withdraw", "reverted"])
                .get(),
            2
        );
        assert_eq!(metrics.events_emitted_total.get(), 4);
        assert_eq!(metrics.enrolled_accounts.get(), 2);
    }

    #[test]
    fn report_serializes_with_snake_case_ops() {
        let report = execute(&Session::reference(ONE_GWEI).unwrap(), None).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["outcomes"][9]["operation"], "withdraw_all");
        assert_eq!(json["outcomes"][9]["status"], "reverted");
        assert_eq!(json["events"][0]["event"]["type"], "Withdrawal");
    }
}

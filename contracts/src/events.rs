//! # Audit Events
//!
//! Every successful mutation appends exactly one [`EventRecord`] to the
//! bank's log. The log is append-only and is never consulted by the bank's
//! own logic; it exists for whoever is watching from outside.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::address::Address;

/// What happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum BankEvent {
    /// An account enrolled.
    Enrolled {
        /// The newly enrolled account.
        account: Address,
    },
    /// Value was withdrawn by its holder (`withdraw` or `withdraw_all`).
    Withdrawal {
        /// The withdrawing account.
        account: Address,
        /// Amount paid out.
        amount: u64,
        /// Ledger balance after the withdrawal.
        new_balance: u64,
    },
    /// The owner credited an account.
    DepositMade {
        /// The credited account.
        account: Address,
        /// Amount credited and paid out.
        amount: u64,
    },
}

impl BankEvent {
    /// Canonical log name.
    pub fn name(&self) -> &'static str {
        match self {
            BankEvent::Enrolled { .. } => "LogEnrolled",
            BankEvent::Withdrawal { .. } => "LogWithdrawal",
            BankEvent::DepositMade { .. } => "LogDepositMade",
        }
    }

    /// The account the event is about.
    pub fn account(&self) -> &Address {
        match self {
            BankEvent::Enrolled { account }
            | BankEvent::Withdrawal { account, .. }
            | BankEvent::DepositMade { account, .. } => account,
        }
    }
}

impl std::fmt::Display for BankEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BankEvent::Enrolled { account } => write!(f, "{}({})", self.name(), account),
            BankEvent::Withdrawal {
                account,
                amount,
                new_balance,
            } => write!(f, "{}({}, {}, {})", self.name(), account, amount, new_balance),
            BankEvent::DepositMade { account, amount } => {
                write!(f, "{}({}, {})", self.name(), account, amount)
            }
        }
    }
}

/// A logged event with its envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    /// Position in the log, starting at 0.
    pub sequence: u64,
    /// The bank instance that emitted the event.
    pub bank_id: Uuid,
    /// When the event was appended.
    pub emitted_at: DateTime<Utc>,
    /// The event payload.
    pub event: BankEvent,
}

/// Append-only event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLog {
    bank_id: Uuid,
    records: Vec<EventRecord>,
}

impl EventLog {
    /// Creates an empty log for the given instance.
    pub fn new(bank_id: Uuid) -> Self {
        Self {
            bank_id,
            records: Vec::new(),
        }
    }

    /// Appends `event` and returns a copy of the stored record.
    pub fn emit(&mut self, event: BankEvent) -> EventRecord {
        let record = EventRecord {
            sequence: self.records.len() as u64,
            bank_id: self.bank_id,
            emitted_at: Utc::now(),
            event,
        };
        tracing::debug!(sequence = record.sequence, event = %record.event, "event emitted");
        self.records.push(record.clone());
        record
    }

    /// All records in emission order.
    pub fn records(&self) -> &[EventRecord] {
        &self.records
    }

    /// The most recent record, if any.
    pub fn last(&self) -> Option<&EventRecord> {
        self.records.last()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been emitted yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records whose event concerns `account`.
    pub fn for_account<'a>(&'a self, account: &'a Address) -> impl Iterator<Item = &'a EventRecord> {
        self.records.iter().filter(move |r| r.event.account() == account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic() {
        let mut log = EventLog::new(Uuid::new_v4());
        let a = Address::from_index(1);
        log.emit(BankEvent::Enrolled { account: a });
        log.emit(BankEvent::DepositMade { account: a, amount: 5 });
        let seqs: Vec<u64> = log.records().iter().map(|r| r.sequence).collect();
        assert_eq!(seqs, vec![0, 1]);
        assert_eq!(log.last().unwrap().event.name(), "LogDepositMade");
    }

    #[test]
    fn emit_returns_the_stored_record() {
        let mut log = EventLog::new(Uuid::new_v4());
        let a = Address::from_index(1);
        log.emit(BankEvent::Enrolled { account: a });
        let returned = log.emit(BankEvent::DepositMade { account: a, amount: 7 });

        let stored = log.last().unwrap();
        assert_eq!(returned.sequence, 1);
        assert_eq!(returned.sequence, stored.sequence);
        assert_eq!(returned.emitted_at, stored.emitted_at);
        assert_eq!(returned.event, stored.event);
    }

    #[test]
    fn display_matches_log_signature() {
        let a = Address::from_index(1);
        let e = BankEvent::Withdrawal {
            account: a,
            amount: 1_000,
            new_balance: 999_999_000,
        };
        assert_eq!(e.to_string(), format!("LogWithdrawal({}, 1000, 999999000)", a));
    }

    #[test]
    fn filter_by_account() {
        let mut log = EventLog::new(Uuid::new_v4());
        let a = Address::from_index(1);
        let b = Address::from_index(2);
        log.emit(BankEvent::Enrolled { account: a });
        log.emit(BankEvent::Enrolled { account: b });
        assert_eq!(log.for_account(&b).count(), 1);
    }
}

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # SimpleBank: Custodial Ledger Contract
//!
//! A single owner-funded pool from which enrolled participants withdraw and
//! into which the owner credits enrolled participants. Small on purpose:
//! the interesting part is the gate in front of the books, not the books.
//!
//! ## Modules
//!
//! - **address**: 20-byte account addresses and their canonical hex form.
//! - **registry**: who has enrolled. One-way, one-shot.
//! - **ledger**: address → balance, with checked arithmetic and nothing else.
//! - **bank**: the operation gate: ownership, enrollment and amount checks
//!   in front of every mutation, plus the queries.
//! - **custody**: the seam to whatever actually holds the value, and an
//!   in-memory simulation of it.
//! - **events**: the append-only audit log.
//! - **config**: units, development accounts, revert reasons.
//!
//! ## Design Principles
//!
//! 1. Check everything, then act. A rejected call leaves no trace.
//! 2. All monetary arithmetic is checked.
//! 3. No global state: a [`SimpleBank`] is a plain value you own.
//! 4. Every public type that leaves the crate is serializable (serde).

pub mod address;
pub mod bank;
pub mod config;
pub mod custody;
pub mod error;
pub mod events;
pub mod ledger;
pub mod registry;

pub use address::{Address, AddressError};
pub use bank::{Account, BankSnapshot, CustodyAudit, SimpleBank};
pub use custody::{Custody, CustodyError, InMemoryCustody};
pub use error::BankError;
pub use events::{BankEvent, EventLog, EventRecord};
pub use registry::Registration;

//! # Identity Registry
//!
//! Tracks which addresses have enrolled. Enrollment is a one-way door:
//! there is no un-enroll, and enrolling twice is an error rather than a
//! reset.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::address::Address;
use crate::error::BankError;

/// Per-account registration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Registration {
    /// Never enrolled. Every address starts here.
    Unregistered,
    /// Enrolled; may use value-moving operations.
    Enrolled,
}

/// The set of enrolled addresses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IdentityRegistry {
    enrolled: BTreeSet<Address>,
}

impl IdentityRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registration state of `address`.
    pub fn status(&self, address: &Address) -> Registration {
        if self.enrolled.contains(address) {
            Registration::Enrolled
        } else {
            Registration::Unregistered
        }
    }

    /// Whether `address` has enrolled.
    pub fn is_enrolled(&self, address: &Address) -> bool {
        self.enrolled.contains(address)
    }

    /// Enrolls `address`.
    ///
    /// # Errors
    ///
    /// Returns [`BankError::AlreadyEnrolled`] if the address is already
    /// enrolled; the registry is left untouched.
    pub fn enroll(&mut self, address: Address) -> Result<(), BankError> {
        if !self.enrolled.insert(address) {
            return Err(BankError::AlreadyEnrolled(address));
        }
        Ok(())
    }

    /// Number of enrolled addresses.
    pub fn len(&self) -> usize {
        self.enrolled.len()
    }

    /// Whether no address has enrolled.
    pub fn is_empty(&self) -> bool {
        self.enrolled.is_empty()
    }

    /// Enrolled addresses in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &Address> {
        self.enrolled.iter()
    }
}

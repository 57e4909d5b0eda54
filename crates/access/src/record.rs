// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use alloy::primitives::Address;
use cg_ledger::RecordFields;

/// Where a record stands on the way from encrypted handle to verified clear value.
/// `Verified` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecryptionState {
    #[default]
    Unresolved,
    /// Obtained from the oracle but not (yet) proven on-chain
    LocallyDecrypted(u64),
    Verified(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub creator: Address,
    /// Ledger timestamp in seconds
    pub created_at: u64,
    pub access_level_public_estimate: u32,
    pub aux_public_value: u32,
    state: DecryptionState,
}

impl ContentRecord {
    pub fn from_ledger(id: impl Into<String>, fields: RecordFields) -> Self {
        let state = if fields.is_verified {
            DecryptionState::Verified(fields.decrypted_value as u64)
        } else {
            DecryptionState::Unresolved
        };
        Self {
            id: id.into(),
            title: fields.title,
            description: fields.description,
            creator: fields.creator,
            created_at: fields.created_at,
            access_level_public_estimate: fields.public_value1,
            aux_public_value: fields.public_value2,
            state,
        }
    }

    pub fn state(&self) -> DecryptionState {
        self.state
    }

    pub fn is_verified(&self) -> bool {
        matches!(self.state, DecryptionState::Verified(_))
    }

    pub fn verified_clear_value(&self) -> Option<u64> {
        match self.state {
            DecryptionState::Verified(value) => Some(value),
            _ => None,
        }
    }

    pub fn locally_decrypted_value(&self) -> Option<u64> {
        match self.state {
            DecryptionState::LocallyDecrypted(value) => Some(value),
            _ => None,
        }
    }

    /// The value to show: verified wins over local
    pub fn display_value(&self) -> Option<u64> {
        match self.state {
            DecryptionState::Verified(value) | DecryptionState::LocallyDecrypted(value) => {
                Some(value)
            }
            DecryptionState::Unresolved => None,
        }
    }

    /// Returns false when the record is already verified and nothing changed
    pub(crate) fn apply_local_decryption(&mut self, value: u64) -> bool {
        if self.is_verified() {
            return false;
        }
        self.state = DecryptionState::LocallyDecrypted(value);
        true
    }

    pub(crate) fn mark_verified(&mut self, value: u64) {
        self.state = DecryptionState::Verified(value);
    }

    /// Merge what this session already knew about a record into freshly fetched data
    pub(crate) fn reconcile(mut self, previous: Option<&ContentRecord>) -> Self {
        if self.is_verified() {
            return self;
        }
        if let Some(previous) = previous {
            match previous.state {
                DecryptionState::Verified(_) | DecryptionState::LocallyDecrypted(_) => {
                    self.state = previous.state
                }
                DecryptionState::Unresolved => {}
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(is_verified: bool, decrypted_value: u32) -> RecordFields {
        RecordFields {
            title: "Title".to_string(),
            description: "Description".to_string(),
            creator: Address::ZERO,
            created_at: 1,
            public_value1: 4,
            public_value2: 0,
            is_verified,
            decrypted_value,
        }
    }

    #[test]
    fn test_verified_takes_precedence() {
        let mut record = ContentRecord::from_ledger("content-1", fields(false, 0));
        assert_eq!(record.display_value(), None);

        assert!(record.apply_local_decryption(4));
        assert_eq!(record.locally_decrypted_value(), Some(4));
        assert_eq!(record.display_value(), Some(4));

        record.mark_verified(4);
        assert!(record.is_verified());
        assert_eq!(record.locally_decrypted_value(), None);
        assert!(!record.apply_local_decryption(9));
        assert_eq!(record.display_value(), Some(4));
    }

    #[test]
    fn test_reconcile_keeps_local_value_until_verified() {
        let mut previous = ContentRecord::from_ledger("content-1", fields(false, 0));
        previous.apply_local_decryption(4);

        let fresh = ContentRecord::from_ledger("content-1", fields(false, 0));
        assert_eq!(
            fresh.reconcile(Some(&previous)).state(),
            DecryptionState::LocallyDecrypted(4)
        );

        let fresh = ContentRecord::from_ledger("content-1", fields(true, 4));
        assert_eq!(
            fresh.reconcile(Some(&previous)).state(),
            DecryptionState::Verified(4)
        );
    }

    #[test]
    fn test_reconcile_never_downgrades() {
        let previous = ContentRecord::from_ledger("content-1", fields(true, 7));
        let stale = ContentRecord::from_ledger("content-1", fields(false, 0));
        assert_eq!(
            stale.reconcile(Some(&previous)).verified_clear_value(),
            Some(7)
        );
    }
}

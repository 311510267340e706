//! Registration records and read-side shapes.
//!
//! A [`RegistrationRecord`] is created exactly once per digest and never
//! mutated or destroyed. [`Verification`] is the stable read shape returned
//! to verifiers, and [`RecordEntry`] is the persistence row used by
//! file-backed registries.

use serde::{Deserialize, Serialize};

use crate::constants::UNREGISTERED_AT;
use crate::types::{Digest, SubmitterId};

/// The immutable (owner, timestamp) pair bound to a digest.
///
/// Presence of a record *is* the existence proof; there is no separate
/// registered flag anywhere in storage. `registered_at` is always > 0 for
/// a real record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationRecord {
    /// Identity of the caller that performed the registration.
    pub owner: SubmitterId,
    /// Unix timestamp (seconds) assigned by the registry at write time.
    pub registered_at: u64,
}

/// Receipt returned by a successful write.
///
/// `sequence` is the position of the write in the registry's global write
/// order; it plays the role a block number plays on a public ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    /// Global write ordinal of this registration (1-based).
    pub sequence: u64,
    /// Timestamp assigned to the registration.
    pub registered_at: u64,
}

/// Answer to a verify query.
///
/// The shape is stable regardless of whether the digest was ever
/// registered: unknown digests report `registered = false` with the zero
/// identity and the zero timestamp, and no error is raised. Absence is a
/// normal outcome, not a failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    /// Whether a registration record exists for the digest.
    pub registered: bool,
    /// Owner of the record, or the zero identity.
    pub owner: SubmitterId,
    /// Registration timestamp, or 0.
    pub registered_at: u64,
}

impl Verification {
    /// The answer for a digest that was never registered.
    pub fn absent() -> Self {
        Self {
            registered: false,
            owner: SubmitterId::ZERO,
            registered_at: UNREGISTERED_AT,
        }
    }

    /// The answer for an existing record.
    pub fn of(record: &RegistrationRecord) -> Self {
        Self {
            registered: true,
            owner: record.owner,
            registered_at: record.registered_at,
        }
    }

    /// Returns the underlying record, if one exists.
    pub fn record(&self) -> Option<RegistrationRecord> {
        self.registered.then_some(RegistrationRecord {
            owner: self.owner,
            registered_at: self.registered_at,
        })
    }
}

/// One persisted registration: record plus its optional storage pointer.
///
/// Used as the export/import row and as the on-disk representation. The
/// pointer rides along here even though live registries keep it in a
/// separate mapping, so a single file round-trip restores both tables.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordEntry {
    /// The registered digest.
    pub digest: Digest,
    /// Identity that registered it.
    pub owner: SubmitterId,
    /// Timestamp assigned at write time.
    pub registered_at: u64,
    /// Storage pointer, if one was supplied at registration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pointer: Option<String>,
}

/// Statistics about a registry's contents.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    /// Total number of registration records.
    pub total_count: u64,
    /// Records that carry a storage pointer.
    pub with_pointer_count: u64,
    /// Earliest registration timestamp.
    pub earliest_timestamp: Option<u64>,
    /// Latest registration timestamp.
    pub latest_timestamp: Option<u64>,
}

impl RegistryStats {
    /// Creates empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates stats with a newly created record.
    pub fn add(&mut self, record: &RegistrationRecord, has_pointer: bool) {
        self.total_count += 1;
        if has_pointer {
            self.with_pointer_count += 1;
        }

        match self.earliest_timestamp {
            Some(t) if record.registered_at < t => {
                self.earliest_timestamp = Some(record.registered_at);
            }
            None => {
                self.earliest_timestamp = Some(record.registered_at);
            }
            _ => {}
        }

        match self.latest_timestamp {
            Some(t) if record.registered_at > t => {
                self.latest_timestamp = Some(record.registered_at);
            }
            None => {
                self.latest_timestamp = Some(record.registered_at);
            }
            _ => {}
        }
    }
}

//! In-memory digest registry.
//!
//! Thread-safe storage suitable for development, testing, and as the
//! working set of the file-backed registry.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::{Mutex, RwLock};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument};

use attestor_core::constants::UNREGISTERED_AT;
use attestor_core::error::{AttestorError, Result};
use attestor_core::event::RegistryEvent;
use attestor_core::traits::ReportRegistry;
use attestor_core::types::{
    Digest, Receipt, RecordEntry, RegistrationRecord, RegistryStats, SubmitterId, Verification,
};

/// Default capacity of the event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// In-memory digest registry.
///
/// # State
///
/// Two mappings keyed by digest, exactly as persisted:
/// - digest → registration record (absent until written)
/// - digest → storage pointer (absent unless written with one)
///
/// Absence in the record map *is* "not registered"; no sentinel values are
/// stored.
///
/// # Write ordering
///
/// Every state-mutating call runs under a single mutex, giving writes one
/// global total order. Within a write, the pointer lands before the record;
/// the record insert is the commit point, and all reads gate on record
/// presence, so a concurrently observed registration is always complete.
/// Reads themselves take no lock.
#[derive(Debug)]
pub struct MemoryRegistry {
    /// Primary table: digest → registration record
    records: DashMap<Digest, RegistrationRecord>,
    /// Secondary table: digest → storage pointer
    pointers: DashMap<Digest, String>,
    /// Serializes all writes into one global order
    write_lock: Mutex<()>,
    /// Timestamp of the most recent committed write, for monotonicity
    last_timestamp: AtomicU64,
    /// Number of committed writes; the next receipt gets this + 1
    sequence: AtomicU64,
    /// Registry statistics
    stats: RwLock<RegistryStats>,
    /// Notification channel for auditors/indexers
    events: broadcast::Sender<RegistryEvent>,
}

impl MemoryRegistry {
    /// Creates a new empty in-memory registry.
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            records: DashMap::new(),
            pointers: DashMap::new(),
            write_lock: Mutex::new(()),
            last_timestamp: AtomicU64::new(UNREGISTERED_AT),
            sequence: AtomicU64::new(0),
            stats: RwLock::new(RegistryStats::new()),
            events,
        }
    }

    /// Creates a registry with preallocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            records: DashMap::with_capacity(capacity),
            pointers: DashMap::new(),
            write_lock: Mutex::new(()),
            last_timestamp: AtomicU64::new(UNREGISTERED_AT),
            sequence: AtomicU64::new(0),
            stats: RwLock::new(RegistryStats::new()),
            events,
        }
    }

    /// Subscribes to registration notifications.
    ///
    /// Only writes committed after this call are delivered. Slow consumers
    /// that fall more than the channel capacity behind observe a lagged
    /// receive error, never a blocked writer.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.events.subscribe()
    }

    /// Returns the current statistics.
    pub fn stats(&self) -> RegistryStats {
        self.stats.read().clone()
    }

    /// Returns the number of registration records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns all registrations as persistence rows, ordered by
    /// (timestamp, digest) for deterministic output.
    pub fn export(&self) -> Vec<RecordEntry> {
        let mut entries: Vec<RecordEntry> = self
            .records
            .iter()
            .map(|entry| RecordEntry {
                digest: *entry.key(),
                owner: entry.value().owner,
                registered_at: entry.value().registered_at,
                pointer: self.pointers.get(entry.key()).map(|p| p.clone()),
            })
            .collect();

        entries.sort_by_key(|e| (e.registered_at, *e.digest.as_array()));
        entries
    }

    /// Imports persistence rows, preserving their owners and timestamps.
    ///
    /// Used to restore a registry from disk; no notification events are
    /// emitted, since these are not new writes. The monotonic clock is
    /// advanced past the newest imported timestamp so later registrations
    /// stay non-decreasing.
    ///
    /// # Errors
    /// Rejects rows with the reserved zero timestamp and digests that are
    /// already present - a duplicate in an import means the source file
    /// violated write-once and cannot be trusted.
    pub fn import(&self, entries: Vec<RecordEntry>) -> Result<usize> {
        let _guard = self.write_lock.lock();
        let mut imported = 0;

        for entry in entries {
            if entry.registered_at == UNREGISTERED_AT {
                return Err(AttestorError::RegistryError(format!(
                    "record {} carries the reserved zero timestamp",
                    entry.digest
                )));
            }
            if self.records.contains_key(&entry.digest) {
                return Err(AttestorError::RegistryError(format!(
                    "duplicate record for digest {}",
                    entry.digest
                )));
            }

            let record = RegistrationRecord {
                owner: entry.owner,
                registered_at: entry.registered_at,
            };

            if let Some(pointer) = entry.pointer {
                self.pointers.insert(entry.digest, pointer);
            }
            self.records.insert(entry.digest, record);

            self.stats
                .write()
                .add(&record, self.pointers.contains_key(&entry.digest));

            let last = self.last_timestamp.load(Ordering::SeqCst);
            if entry.registered_at > last {
                self.last_timestamp.store(entry.registered_at, Ordering::SeqCst);
            }
            self.sequence.fetch_add(1, Ordering::SeqCst);

            imported += 1;
        }

        Ok(imported)
    }

    /// Assigns the timestamp for the write being committed.
    ///
    /// Non-decreasing across all writes, and never the reserved zero
    /// sentinel even if the system clock reports the epoch. Called only
    /// under the write lock.
    fn next_timestamp(&self) -> u64 {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();

        let last = self.last_timestamp.load(Ordering::SeqCst);
        let assigned = now.max(last).max(UNREGISTERED_AT + 1);
        self.last_timestamp.store(assigned, Ordering::SeqCst);
        assigned
    }

    /// The single write path shared by both register operations.
    fn commit(
        &self,
        digest: Digest,
        owner: SubmitterId,
        pointer: Option<&str>,
    ) -> Result<Receipt> {
        let _guard = self.write_lock.lock();

        if self.records.contains_key(&digest) {
            return Err(AttestorError::AlreadyRegistered(digest));
        }

        let registered_at = self.next_timestamp();
        let record = RegistrationRecord {
            owner,
            registered_at,
        };

        // Pointer before record: the record insert is the commit point.
        if let Some(pointer) = pointer {
            self.pointers.insert(digest, pointer.to_string());
        }
        self.records.insert(digest, record);

        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;
        self.stats.write().add(&record, pointer.is_some());

        let event = match pointer {
            Some(pointer) => RegistryEvent::RegisteredWithPointer {
                digest,
                owner,
                pointer: pointer.to_string(),
                registered_at,
            },
            None => RegistryEvent::Registered {
                digest,
                owner,
                registered_at,
            },
        };
        info!(
            digest = %digest,
            owner = %owner,
            registered_at,
            sequence,
            has_pointer = pointer.is_some(),
            "digest registered"
        );
        // No receivers is fine; auditors are optional.
        let _ = self.events.send(event);

        Ok(Receipt {
            sequence,
            registered_at,
        })
    }
}

impl Default for MemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReportRegistry for MemoryRegistry {
    #[instrument(skip(self), fields(digest = %digest))]
    async fn register(&self, digest: Digest, owner: SubmitterId) -> Result<Receipt> {
        self.commit(digest, owner, None)
    }

    #[instrument(skip(self, pointer), fields(digest = %digest))]
    async fn register_with_pointer(
        &self,
        digest: Digest,
        owner: SubmitterId,
        pointer: &str,
    ) -> Result<Receipt> {
        self.commit(digest, owner, Some(pointer))
    }

    async fn verify(&self, digest: Digest) -> Result<Verification> {
        let verification = match self.records.get(&digest) {
            Some(record) => Verification::of(record.value()),
            None => Verification::absent(),
        };
        debug!(digest = %digest, registered = verification.registered, "verify");
        Ok(verification)
    }

    async fn get_pointer(&self, digest: Digest) -> Result<String> {
        // Gate on record presence so a pointer mid-write is never visible.
        if !self.records.contains_key(&digest) {
            return Ok(String::new());
        }
        Ok(self
            .pointers
            .get(&digest)
            .map(|p| p.clone())
            .unwrap_or_default())
    }

    async fn count(&self) -> Result<u64> {
        Ok(self.records.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn digest(fill: u8) -> Digest {
        Digest::from_array([fill; 32])
    }

    fn alice() -> SubmitterId {
        SubmitterId::from_array([0xA1; 20])
    }

    fn bob() -> SubmitterId {
        SubmitterId::from_array([0xB2; 20])
    }

    #[tokio::test]
    async fn test_register_and_verify() {
        let registry = MemoryRegistry::new();

        let receipt = registry.register(digest(0xAA), alice()).await.unwrap();
        assert!(receipt.registered_at > 0);
        assert_eq!(receipt.sequence, 1);

        let proof = registry.verify(digest(0xAA)).await.unwrap();
        assert!(proof.registered);
        assert_eq!(proof.owner, alice());
        assert_eq!(proof.registered_at, receipt.registered_at);
    }

    #[tokio::test]
    async fn test_verify_unknown_digest_is_absent_not_error() {
        let registry = MemoryRegistry::new();

        let proof = registry.verify(digest(0x77)).await.unwrap();
        assert!(!proof.registered);
        assert!(proof.owner.is_zero());
        assert_eq!(proof.registered_at, 0);
    }

    #[tokio::test]
    async fn test_duplicate_register_fails_and_preserves_record() {
        let registry = MemoryRegistry::new();

        let first = registry.register(digest(0xAA), alice()).await.unwrap();

        let err = registry.register(digest(0xAA), bob()).await.unwrap_err();
        assert!(matches!(err, AttestorError::AlreadyRegistered(d) if d == digest(0xAA)));

        // Also via the pointer variant, and the pointer stays untouched too.
        let err = registry
            .register_with_pointer(digest(0xAA), bob(), "late-pointer")
            .await
            .unwrap_err();
        assert!(err.is_conflict());

        let proof = registry.verify(digest(0xAA)).await.unwrap();
        assert_eq!(proof.owner, alice());
        assert_eq!(proof.registered_at, first.registered_at);
        assert_eq!(registry.get_pointer(digest(0xAA)).await.unwrap(), "");
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_register_with_pointer() {
        let registry = MemoryRegistry::new();

        registry
            .register_with_pointer(digest(0xBB), alice(), "ipfs-cid-123")
            .await
            .unwrap();

        assert_eq!(
            registry.get_pointer(digest(0xBB)).await.unwrap(),
            "ipfs-cid-123"
        );
        let proof = registry.verify(digest(0xBB)).await.unwrap();
        assert!(proof.registered);
        assert_eq!(proof.owner, alice());
    }

    #[tokio::test]
    async fn test_pointer_empty_for_unknown_and_pointerless() {
        let registry = MemoryRegistry::new();
        registry.register(digest(0x01), alice()).await.unwrap();

        // Registered without a pointer and never registered look the same
        // here; only verify tells them apart.
        assert_eq!(registry.get_pointer(digest(0x01)).await.unwrap(), "");
        assert_eq!(registry.get_pointer(digest(0x02)).await.unwrap(), "");

        assert!(registry.verify(digest(0x01)).await.unwrap().registered);
        assert!(!registry.verify(digest(0x02)).await.unwrap().registered);
    }

    #[tokio::test]
    async fn test_timestamps_non_decreasing_and_sequence_increments() {
        let registry = MemoryRegistry::new();

        let r1 = registry.register(digest(0x01), alice()).await.unwrap();
        let r2 = registry.register(digest(0x02), alice()).await.unwrap();
        let r3 = registry.register(digest(0x03), bob()).await.unwrap();

        assert!(r2.registered_at >= r1.registered_at);
        assert!(r3.registered_at >= r2.registered_at);
        assert_eq!((r1.sequence, r2.sequence, r3.sequence), (1, 2, 3));
    }

    #[tokio::test]
    async fn test_events_emitted_once_per_successful_write() {
        let registry = MemoryRegistry::new();
        let mut events = registry.subscribe();

        registry.register(digest(0xAA), alice()).await.unwrap();
        registry
            .register_with_pointer(digest(0xBB), bob(), "cid-1")
            .await
            .unwrap();

        let first = events.recv().await.unwrap();
        assert_eq!(first.digest(), digest(0xAA));
        assert!(matches!(first, RegistryEvent::Registered { .. }));

        let second = events.recv().await.unwrap();
        assert!(matches!(
            second,
            RegistryEvent::RegisteredWithPointer { ref pointer, .. } if pointer.as_str() == "cid-1"
        ));
    }

    #[tokio::test]
    async fn test_no_event_on_failed_write() {
        let registry = MemoryRegistry::new();
        registry.register(digest(0xAA), alice()).await.unwrap();

        let mut events = registry.subscribe();
        let _ = registry.register(digest(0xAA), bob()).await.unwrap_err();

        assert!(matches!(
            events.try_recv(),
            Err(broadcast::error::TryRecvError::Empty)
        ));
    }

    #[tokio::test]
    async fn test_concurrent_distinct_registrations_all_succeed() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let registry = Arc::new(MemoryRegistry::new());
        let mut tasks = JoinSet::new();

        for i in 0..100u8 {
            let reg = registry.clone();
            tasks.spawn(async move { reg.register(digest(i), alice()).await.unwrap() });
        }

        while let Some(result) = tasks.join_next().await {
            result.unwrap();
        }

        assert_eq!(registry.count().await.unwrap(), 100);
    }

    #[tokio::test]
    async fn test_concurrent_same_digest_has_exactly_one_winner() {
        use std::sync::Arc;
        use tokio::task::JoinSet;

        let registry = Arc::new(MemoryRegistry::new());
        let mut tasks = JoinSet::new();

        for i in 0..16u8 {
            let reg = registry.clone();
            tasks.spawn(async move {
                let owner = SubmitterId::from_array([i; 20]);
                reg.register(digest(0xAA), owner).await
            });
        }

        let mut successes = 0;
        let mut conflicts = 0;
        while let Some(result) = tasks.join_next().await {
            match result.unwrap() {
                Ok(_) => successes += 1,
                Err(e) if e.is_conflict() => conflicts += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(successes, 1);
        assert_eq!(conflicts, 15);
        assert_eq!(registry.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_export_import_preserves_records() {
        let source = MemoryRegistry::new();
        source.register(digest(0x01), alice()).await.unwrap();
        source
            .register_with_pointer(digest(0x02), bob(), "cid-2")
            .await
            .unwrap();

        let entries = source.export();
        assert_eq!(entries.len(), 2);

        let restored = MemoryRegistry::new();
        assert_eq!(restored.import(entries).unwrap(), 2);

        let original = source.verify(digest(0x01)).await.unwrap();
        let roundtrip = restored.verify(digest(0x01)).await.unwrap();
        assert_eq!(original, roundtrip);
        assert_eq!(restored.get_pointer(digest(0x02)).await.unwrap(), "cid-2");
    }

    #[tokio::test]
    async fn test_import_rejects_duplicates_and_zero_timestamps() {
        let registry = MemoryRegistry::new();
        registry.register(digest(0x01), alice()).await.unwrap();

        let duplicate = vec![RecordEntry {
            digest: digest(0x01),
            owner: bob(),
            registered_at: 123,
            pointer: None,
        }];
        assert!(registry.import(duplicate).is_err());

        let zero_ts = vec![RecordEntry {
            digest: digest(0x02),
            owner: bob(),
            registered_at: 0,
            pointer: None,
        }];
        assert!(registry.import(zero_ts).is_err());
    }

    #[tokio::test]
    async fn test_import_keeps_timestamps_monotonic_afterwards() {
        let registry = MemoryRegistry::new();
        let future_ts = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + 3600;

        registry
            .import(vec![RecordEntry {
                digest: digest(0x01),
                owner: alice(),
                registered_at: future_ts,
                pointer: None,
            }])
            .unwrap();

        // A fresh write must not go backwards past an imported timestamp.
        let receipt = registry.register(digest(0x02), bob()).await.unwrap();
        assert!(receipt.registered_at >= future_ts);
    }

    #[tokio::test]
    async fn test_stats() {
        let registry = MemoryRegistry::new();

        registry.register(digest(0x01), alice()).await.unwrap();
        registry
            .register_with_pointer(digest(0x02), alice(), "cid")
            .await
            .unwrap();

        let stats = registry.stats();
        assert_eq!(stats.total_count, 2);
        assert_eq!(stats.with_pointer_count, 1);
        assert!(stats.earliest_timestamp.is_some());
    }

    // The concrete scenario from the registry contract.
    #[tokio::test]
    async fn test_registration_scenario() {
        let registry = MemoryRegistry::new();
        let mut events = registry.subscribe();

        let receipt = registry.register(digest(0xAA), alice()).await.unwrap();
        let event = events.recv().await.unwrap();
        assert_eq!(
            event,
            RegistryEvent::Registered {
                digest: digest(0xAA),
                owner: alice(),
                registered_at: receipt.registered_at,
            }
        );

        let err = registry.register(digest(0xAA), bob()).await.unwrap_err();
        assert!(err.is_conflict());
        let proof = registry.verify(digest(0xAA)).await.unwrap();
        assert_eq!((proof.registered, proof.owner), (true, alice()));
        assert_eq!(proof.registered_at, receipt.registered_at);

        registry
            .register_with_pointer(digest(0xBB), alice(), "ipfs-cid-123")
            .await
            .unwrap();
        assert_eq!(
            registry.get_pointer(digest(0xBB)).await.unwrap(),
            "ipfs-cid-123"
        );
    }
}

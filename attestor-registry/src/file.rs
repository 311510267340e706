//! File-based digest registry with persistence.
//!
//! Wraps the in-memory registry with saves to a single file. Suitable for
//! single-node deployments where the proof has to survive restarts.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::fs;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::sync::broadcast;
use tracing::{debug, info, instrument, warn};

use attestor_core::constants::FORMAT_VERSION;
use attestor_core::error::{AttestorError, Result};
use attestor_core::event::RegistryEvent;
use attestor_core::traits::ReportRegistry;
use attestor_core::types::{
    Digest, Receipt, RecordEntry, RegistryStats, SubmitterId, Verification,
};

use crate::MemoryRegistry;

/// File format magic bytes
const MAGIC: &[u8; 4] = b"ATTR";

/// Size of the fixed header: magic (4) + version (1) + count (8)
const HEADER_SIZE: usize = 13;

/// File-based digest registry.
///
/// Uses a memory registry internally with periodic persistence to disk.
///
/// # File Format
///
/// ```text
/// magic (4 bytes): "ATTR"
/// version (1 byte): 1
/// count (8 bytes): number of records, little-endian
/// records (variable): JSON array of record entries
/// ```
///
/// Saves are atomic (write to temp, then rename), so a crash mid-save
/// leaves the previous file intact. The write-once guarantee holds across
/// restarts: loading restores the monotonic clock from the newest
/// persisted timestamp.
#[derive(Debug)]
pub struct FileRegistry {
    /// Path to the storage file
    path: PathBuf,
    /// In-memory storage
    memory: MemoryRegistry,
    /// Whether there are unsaved changes
    dirty: AtomicBool,
    /// Auto-save threshold (save after N writes)
    auto_save_threshold: u64,
    /// Writes since last save
    writes_since_save: AtomicU64,
}

impl FileRegistry {
    /// Creates a new file registry at the given path.
    ///
    /// If the file exists, it is loaded. Otherwise an empty registry is
    /// created and the file appears on first save.
    pub async fn new(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let registry = Self {
            path,
            memory: MemoryRegistry::new(),
            dirty: AtomicBool::new(false),
            auto_save_threshold: 100,
            writes_since_save: AtomicU64::new(0),
        };

        if registry.path.exists() {
            registry.load().await?;
        }

        Ok(registry)
    }

    /// Creates a file registry with a custom auto-save threshold.
    pub async fn with_auto_save(path: impl AsRef<Path>, threshold: u64) -> Result<Self> {
        let mut registry = Self::new(path).await?;
        registry.auto_save_threshold = threshold;
        Ok(registry)
    }

    /// Loads registrations from the file.
    #[instrument(skip(self))]
    async fn load(&self) -> Result<()> {
        let mut file = fs::File::open(&self.path).await.map_err(|e| {
            AttestorError::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open registry file: {}", e),
            ))
        })?;

        let mut contents = Vec::new();
        file.read_to_end(&mut contents).await?;

        if contents.len() < HEADER_SIZE {
            return Err(AttestorError::RegistryError("file too short".into()));
        }

        if &contents[0..4] != MAGIC {
            return Err(AttestorError::RegistryError("invalid magic bytes".into()));
        }

        let version = contents[4];
        if version != FORMAT_VERSION {
            return Err(AttestorError::VersionMismatch {
                expected: FORMAT_VERSION,
                actual: version,
            });
        }

        let count = u64::from_le_bytes(
            contents[5..HEADER_SIZE]
                .try_into()
                .expect("header slice has fixed length"),
        );
        info!(count, "loading registrations from file");

        if contents.len() > HEADER_SIZE {
            let entries: Vec<RecordEntry> = serde_json::from_slice(&contents[HEADER_SIZE..])?;

            if entries.len() as u64 != count {
                return Err(AttestorError::RegistryError(format!(
                    "header count {} does not match body count {}",
                    count,
                    entries.len()
                )));
            }

            self.memory.import(entries)?;
        } else if count != 0 {
            return Err(AttestorError::RegistryError(
                "header count nonzero but body is empty".into(),
            ));
        }

        self.dirty.store(false, Ordering::SeqCst);
        debug!("registry loaded");

        Ok(())
    }

    /// Saves registrations to the file.
    #[instrument(skip(self))]
    pub async fn save(&self) -> Result<()> {
        let entries = self.memory.export();
        let count = entries.len() as u64;

        info!(count, path = ?self.path, "saving registry to file");

        let serialized = serde_json::to_vec(&entries)?;

        let mut contents = Vec::with_capacity(HEADER_SIZE + serialized.len());
        contents.extend_from_slice(MAGIC);
        contents.push(FORMAT_VERSION);
        contents.extend_from_slice(&count.to_le_bytes());
        contents.extend_from_slice(&serialized);

        // Write atomically (write to temp, then rename)
        let temp_path = self.path.with_extension("tmp");
        let mut file = fs::File::create(&temp_path).await?;
        file.write_all(&contents).await?;
        file.sync_all().await?;

        fs::rename(&temp_path, &self.path).await?;

        self.dirty.store(false, Ordering::SeqCst);
        self.writes_since_save.store(0, Ordering::SeqCst);

        debug!("registry saved");
        Ok(())
    }

    /// Checks if there are unsaved changes.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::SeqCst)
    }

    /// Forces a save if dirty.
    pub async fn flush(&self) -> Result<()> {
        if self.is_dirty() {
            self.save().await?;
        }
        Ok(())
    }

    /// Returns the file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the underlying memory registry for direct access.
    pub fn memory(&self) -> &MemoryRegistry {
        &self.memory
    }

    /// Subscribes to registration notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<RegistryEvent> {
        self.memory.subscribe()
    }

    /// Returns statistics.
    pub fn stats(&self) -> RegistryStats {
        self.memory.stats()
    }

    /// Returns the number of registrations.
    pub fn len(&self) -> usize {
        self.memory.len()
    }

    /// Returns true if empty.
    pub fn is_empty(&self) -> bool {
        self.memory.is_empty()
    }

    /// Checks if the auto-save threshold is reached and saves if needed.
    async fn maybe_auto_save(&self) -> Result<()> {
        let writes = self.writes_since_save.fetch_add(1, Ordering::SeqCst);
        if writes >= self.auto_save_threshold {
            self.save().await?;
        }
        Ok(())
    }
}

impl Drop for FileRegistry {
    fn drop(&mut self) {
        // Best-effort only; async save is not possible in Drop.
        if self.is_dirty() {
            warn!("FileRegistry dropped with unsaved changes");
        }
    }
}

#[async_trait]
impl ReportRegistry for FileRegistry {
    async fn register(&self, digest: Digest, owner: SubmitterId) -> Result<Receipt> {
        let receipt = self.memory.register(digest, owner).await?;
        self.dirty.store(true, Ordering::SeqCst);
        self.maybe_auto_save().await?;
        Ok(receipt)
    }

    async fn register_with_pointer(
        &self,
        digest: Digest,
        owner: SubmitterId,
        pointer: &str,
    ) -> Result<Receipt> {
        let receipt = self
            .memory
            .register_with_pointer(digest, owner, pointer)
            .await?;
        self.dirty.store(true, Ordering::SeqCst);
        self.maybe_auto_save().await?;
        Ok(receipt)
    }

    async fn verify(&self, digest: Digest) -> Result<Verification> {
        self.memory.verify(digest).await
    }

    async fn get_pointer(&self, digest: Digest) -> Result<String> {
        self.memory.get_pointer(digest).await
    }

    async fn count(&self) -> Result<u64> {
        self.memory.count().await
    }
}

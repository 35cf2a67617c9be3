//! Persistence for enforcement records, reached only through submissions.
//!
//! Two backends:
//! - [`MemoryEnforcementStore`] keeps records in process and can be told to
//!   fail the next write.
//! - [`FileEnforcementStore`] writes one JSON document per record.
//!   Layout: `<root>/tickets/<ticket_id>.json`,
//!   `<root>/sessions/<bay_id>-<uuid>.json`.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tempfile::NamedTempFile;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ticket::EnforcementRecord;
use crate::wizard::SubmitFailure;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("record rejected: {0}")]
    Rejected(String),

    #[error("ticket digest does not match its contents: {0}")]
    DigestMismatch(String),
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

impl From<StoreError> for SubmitFailure {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Rejected(msg) => SubmitFailure::Rejected(msg),
            StoreError::DigestMismatch(id) => {
                SubmitFailure::Rejected(format!("ticket {id} failed its integrity check"))
            }
            other => SubmitFailure::Unavailable(other.to_string()),
        }
    }
}

/// Destination for tickets and session changes.
#[async_trait]
pub trait EnforcementStore: Send + Sync {
    async fn record(&self, record: &EnforcementRecord) -> StoreResult<()>;

    async fn records(&self) -> StoreResult<Vec<EnforcementRecord>>;
}

fn check_integrity(record: &EnforcementRecord) -> StoreResult<()> {
    match record {
        EnforcementRecord::Ticket(ticket) if !ticket.verify_integrity() => Err(
            StoreError::DigestMismatch(ticket.ticket_id().to_string()),
        ),
        _ => Ok(()),
    }
}

#[derive(Debug, Default)]
pub struct MemoryEnforcementStore {
    records: Mutex<Vec<EnforcementRecord>>,
    fail_next: Mutex<Option<String>>,
}

impl MemoryEnforcementStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `record` call fail as unavailable.
    pub fn fail_next(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.fail_next.lock() {
            *slot = Some(reason.into());
        }
    }

    pub fn len(&self) -> usize {
        self.records.lock().map(|r| r.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> StoreError {
    StoreError::Unavailable("store lock poisoned".into())
}

#[async_trait]
impl EnforcementStore for MemoryEnforcementStore {
    async fn record(&self, record: &EnforcementRecord) -> StoreResult<()> {
        if let Some(reason) = self.fail_next.lock().map_err(poisoned)?.take() {
            return Err(StoreError::Unavailable(reason));
        }
        check_integrity(record)?;
        self.records.lock().map_err(poisoned)?.push(record.clone());
        Ok(())
    }

    async fn records(&self) -> StoreResult<Vec<EnforcementRecord>> {
        Ok(self.records.lock().map_err(poisoned)?.clone())
    }
}

#[derive(Debug, Clone)]
pub struct FileEnforcementStore {
    root: PathBuf,
}

impl FileEnforcementStore {
    /// Create a store rooted at `root`, creating its directories if needed.
    pub fn new(root: impl AsRef<Path>) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(root.join("tickets"))?;
        fs::create_dir_all(root.join("sessions"))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, record: &EnforcementRecord) -> PathBuf {
        match record {
            EnforcementRecord::Ticket(ticket) => self
                .root
                .join("tickets")
                .join(format!("{}.json", ticket.ticket_id())),
            EnforcementRecord::Session(change) => self.root.join("sessions").join(format!(
                "{}-{}.json",
                change.bay_id(),
                Uuid::new_v4().simple()
            )),
        }
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> StoreResult<()> {
    let dir = path
        .parent()
        .ok_or_else(|| StoreError::Unavailable(format!("{} has no parent", path.display())))?;
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

fn read_dir_sorted(dir: &Path) -> StoreResult<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[async_trait]
impl EnforcementStore for FileEnforcementStore {
    async fn record(&self, record: &EnforcementRecord) -> StoreResult<()> {
        check_integrity(record)?;
        let path = self.path_for(record);
        let bytes = serde_json::to_vec_pretty(record)?;
        debug!(event = "store.write", path = %path.display());
        tokio::task::spawn_blocking(move || write_atomic(&path, &bytes))
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }

    async fn records(&self) -> StoreResult<Vec<EnforcementRecord>> {
        let root = self.root.clone();
        tokio::task::spawn_blocking(move || -> StoreResult<Vec<EnforcementRecord>> {
            let mut out = Vec::new();
            for sub in ["tickets", "sessions"] {
                for path in read_dir_sorted(&root.join(sub))? {
                    let bytes = fs::read(&path)?;
                    out.push(serde_json::from_slice(&bytes)?);
                }
            }
            Ok(out)
        })
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    use crate::domain::bay::BayId;
    use crate::domain::ticket::{SessionChange, Ticket, TicketDraft, ViolationKind};

    fn ticket() -> EnforcementRecord {
        EnforcementRecord::Ticket(Ticket::issue(
            TicketDraft {
                bay_id: BayId::new("1"),
                registration: "ABC123".into(),
                bay_number: "B-042".into(),
                zone_id: "zone-b".into(),
                violation_kind: ViolationKind::Overstay,
                notes: Some("blocking exit".into()),
                photos: Vec::new(),
            },
            Utc::now(),
        ))
    }

    fn session() -> EnforcementRecord {
        EnforcementRecord::Session(SessionChange::Created {
            bay_id: BayId::new("11"),
            registration: "XYZ-111".into(),
            photos: Vec::new(),
        })
    }

    #[tokio::test]
    async fn test_memory_store_fail_next_once() {
        let store = MemoryEnforcementStore::new();
        store.fail_next("offline");
        let err = store.record(&ticket()).await.unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
        assert!(store.is_empty());

        store.record(&ticket()).await.unwrap();
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_file_store_writes_and_reads_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileEnforcementStore::new(dir.path()).unwrap();
        let t = ticket();
        store.record(&t).await.unwrap();
        store.record(&session()).await.unwrap();

        let records = store.records().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], t);
        assert!(matches!(records[1], EnforcementRecord::Session(_)));
        assert_eq!(fs::read_dir(dir.path().join("tickets")).unwrap().count(), 1);
    }

    #[test]
    fn test_store_error_maps_to_submit_failure() {
        let failure: SubmitFailure = StoreError::Rejected("duplicate".into()).into();
        assert_eq!(failure, SubmitFailure::Rejected("duplicate".into()));
        let failure: SubmitFailure = StoreError::Unavailable("down".into()).into();
        assert!(matches!(failure, SubmitFailure::Unavailable(_)));
    }
}

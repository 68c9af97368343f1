use std::{
    fs::{self, OpenOptions, create_dir_all, rename},
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use schema::CallbackRecord;
use serde::Serialize;
use uuid::Uuid;

const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const LOCK_RETRY_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The exclusive store lock could not be acquired within the deadline.
    Lock(String),
    Io(String),
    Serialize(String),
}

impl From<std::io::Error> for StoreError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialize(value.to_string())
    }
}

/// Contents of the store document at a point in time.
///
/// `corrupt_recovered` is set when the document existed but was not valid
/// JSON; the store treats that as an empty sequence rather than failing, and
/// the caller is expected to log it prominently since it implies prior data
/// loss.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StoreSnapshot {
    pub records: Vec<CallbackRecord>,
    pub corrupt_recovered: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendReceipt {
    pub id: String,
    pub total_records: usize,
    pub corrupt_recovered: bool,
}

/// Read-only metadata about the store, for the diagnostics surface.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreReport {
    pub path: PathBuf,
    pub exists: bool,
    pub size_bytes: u64,
    pub readable: bool,
    pub writable: bool,
    pub record_count: usize,
    pub corrupt_recovered: bool,
    pub recent: Vec<CallbackRecord>,
}

/// Sole owner of the on-disk JSON array of [`CallbackRecord`]s.
///
/// Appends run as one critical section: an exclusive advisory lock on a
/// sidecar lock file is held across the re-read, the in-memory append, and
/// the atomic replace of the document (write to a temp file in the same
/// directory, sync, rename). Readers never take the lock; rename guarantees
/// they observe either the old or the new complete document.
#[derive(Debug, Clone)]
pub struct CallbackStore {
    path: PathBuf,
    lock_timeout: Duration,
}

struct StoreLockGuard {
    file: fs::File,
}

impl Drop for StoreLockGuard {
    fn drop(&mut self) {
        let _ = fs2::FileExt::unlock(&self.file);
    }
}

impl CallbackStore {
    pub fn open(path: impl AsRef<Path>) -> Self {
        Self::open_with_lock_timeout(path, DEFAULT_LOCK_TIMEOUT)
    }

    pub fn open_with_lock_timeout(path: impl AsRef<Path>, lock_timeout: Duration) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock_timeout,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        let mut lock_path = self.path.clone().into_os_string();
        lock_path.push(".lock");
        PathBuf::from(lock_path)
    }

    /// Returns the current contents. An absent document is an empty
    /// sequence; an unparsable document is recovered as empty with
    /// `corrupt_recovered` set. Neither condition is an error.
    pub fn read_all(&self) -> Result<StoreSnapshot, StoreError> {
        self.read_document()
    }

    /// Appends one record under the exclusive store lock.
    ///
    /// The document is re-read fresh inside the critical section — a cached
    /// copy would lose concurrent appends — and replaced atomically, so a
    /// crash at any point leaves either the old or the new document.
    pub fn append(&self, record: CallbackRecord) -> Result<AppendReceipt, StoreError> {
        let _guard = self.acquire_lock()?;
        let snapshot = self.read_document()?;
        let mut records = snapshot.records;
        let id = record.id.clone();
        records.push(record);
        self.write_document(&records)?;
        Ok(AppendReceipt {
            id,
            total_records: records.len(),
            corrupt_recovered: snapshot.corrupt_recovered,
        })
    }

    /// Initializes the document to an empty array iff it is absent.
    /// Returns `true` when this call created it. Idempotent.
    pub fn ensure_exists(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        let _guard = self.acquire_lock()?;
        if self.path.exists() {
            return Ok(false);
        }
        self.write_document(&[])?;
        Ok(true)
    }

    /// Existence, size, permission, and content metadata, plus the most
    /// recent `recent` records. Never mutates the document.
    pub fn report(&self, recent: usize) -> Result<StoreReport, StoreError> {
        let exists = self.path.exists();
        let size_bytes = if exists {
            fs::metadata(&self.path)?.len()
        } else {
            0
        };
        let readable = exists && fs::File::open(&self.path).is_ok();
        let writable = exists
            && OpenOptions::new()
                .append(true)
                .open(&self.path)
                .is_ok();

        let snapshot = self.read_document()?;
        let skip = snapshot.records.len().saturating_sub(recent);
        Ok(StoreReport {
            path: self.path.clone(),
            exists,
            size_bytes,
            readable,
            writable,
            record_count: snapshot.records.len(),
            corrupt_recovered: snapshot.corrupt_recovered,
            recent: snapshot.records[skip..].to_vec(),
        })
    }

    fn acquire_lock(&self) -> Result<StoreLockGuard, StoreError> {
        let lock_path = self.lock_path();
        if let Some(parent) = lock_path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&lock_path)?;

        let deadline = Instant::now() + self.lock_timeout;
        loop {
            match fs2::FileExt::try_lock_exclusive(&lock_file) {
                Ok(()) => return Ok(StoreLockGuard { file: lock_file }),
                Err(err) => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::Lock(format!(
                            "store lock '{}' not acquired within {}ms: {err}",
                            lock_path.display(),
                            self.lock_timeout.as_millis()
                        )));
                    }
                    std::thread::sleep(LOCK_RETRY_INTERVAL);
                }
            }
        }
    }

    fn read_document(&self) -> Result<StoreSnapshot, StoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StoreSnapshot::default()),
            Err(err) => return Err(err.into()),
        };
        if bytes.iter().all(|byte| byte.is_ascii_whitespace()) {
            return Ok(StoreSnapshot::default());
        }
        match serde_json::from_slice::<Vec<CallbackRecord>>(&bytes) {
            Ok(records) => Ok(StoreSnapshot {
                records,
                corrupt_recovered: false,
            }),
            Err(_) => Ok(StoreSnapshot {
                records: Vec::new(),
                corrupt_recovered: true,
            }),
        }
    }

    fn write_document(&self, records: &[CallbackRecord]) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)?;
        }

        let payload = serde_json::to_vec_pretty(records)?;
        let tmp_path = self
            .path
            .with_extension(format!("{}.tmp", Uuid::new_v4().simple()));

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        file.write_all(&payload)?;
        file.sync_all()?;
        rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

//! Bearer credential storage
//!
//! The store holds at most one access token: the one attached to outgoing
//! requests. It has no logic beyond storage; expiry is discovered by the
//! server rejecting a request, never predicted from the token itself.
//!
//! `FileCredentialStore` keeps the token in memory and mirrors every change
//! to a JSON file from a background writer task using atomic temp-file +
//! rename, so a CLI invocation can pick up the session left by the previous
//! one. Store operations never block on disk I/O.

use std::fmt;
use std::path::{Path, PathBuf};

use common::Secret;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

/// Opaque bearer access token.
///
/// Redacted in `Debug` output and zeroized on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(Secret<String>);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(Secret::new(token.into()))
    }

    /// The raw token, for building an `Authorization` header.
    pub fn expose(&self) -> &str {
        self.0.expose()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Credential").field(&self.0).finish()
    }
}

/// Holds the current access credential.
///
/// Operations are synchronous and infallible from the caller's point of view:
/// the in-memory value is authoritative for the running process.
pub trait CredentialStore: Send + Sync {
    fn get(&self) -> Option<Credential>;

    fn set(&self, credential: Credential);

    fn clear(&self);

    fn exists(&self) -> bool {
        self.get().is_some()
    }
}

/// Process-local store with no persistence.
#[derive(Default)]
pub struct MemoryCredentialStore {
    current: Mutex<Option<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_credential(credential: Credential) -> Self {
        Self {
            current: Mutex::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current.lock().clone()
    }

    fn set(&self, credential: Credential) {
        *self.current.lock() = Some(credential);
    }

    fn clear(&self) {
        *self.current.lock() = None;
    }
}

/// On-disk shape of the session file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct StoredSession {
    #[serde(default)]
    access_token: Option<String>,
}

/// Latest in-memory value queued for the writer task.
#[derive(Clone, Default)]
struct Snapshot {
    generation: u64,
    credential: Option<Credential>,
}

/// File-backed store.
///
/// `get`/`set`/`clear` only touch memory; a writer task spawned by `load`
/// mirrors each change to disk, always writing the most recent value. Persist
/// failures are logged and do not roll back memory. Call `flush` before the
/// process exits.
pub struct FileCredentialStore {
    path: PathBuf,
    current: Mutex<Option<Credential>>,
    pending: watch::Sender<Snapshot>,
    persisted: watch::Receiver<u64>,
}

impl FileCredentialStore {
    /// Load the session from `path` and start its writer task.
    ///
    /// If the file doesn't exist, creates it empty (logged out).
    pub async fn load(path: PathBuf) -> Result<Self> {
        let current = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .map_err(|e| Error::Io(format!("reading session file: {e}")))?;
            let stored: StoredSession = serde_json::from_str(&contents)
                .map_err(|e| Error::CredentialParse(format!("parsing session file: {e}")))?;
            info!(
                path = %path.display(),
                logged_in = stored.access_token.is_some(),
                "loaded session"
            );
            stored.access_token.map(Credential::new)
        } else {
            info!(path = %path.display(), "session file not found, starting logged out");
            if let Some(dir) = path.parent() {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| Error::Io(format!("creating session directory: {e}")))?;
            }
            write_atomic(&path, &StoredSession::default()).await?;
            None
        };

        let (pending, pending_rx) = watch::channel(Snapshot::default());
        let (persisted_tx, persisted) = watch::channel(0);
        tokio::spawn(run_writer(path.clone(), pending_rx, persisted_tx));

        Ok(Self {
            path,
            current: Mutex::new(current),
            pending,
            persisted,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Wait until every change made so far has been written (or failed to).
    pub async fn flush(&self) {
        let target = self.pending.borrow().generation;
        let mut persisted = self.persisted.clone();
        // An error means the writer is gone and nothing more will land
        let _ = persisted.wait_for(|written| *written >= target).await;
    }

    /// Queue `current` for the writer. Called with the memory lock held so
    /// queued values follow the order of in-memory changes.
    fn queue_write(&self, current: &Option<Credential>) {
        self.pending.send_modify(|snapshot| {
            snapshot.generation += 1;
            snapshot.credential = current.clone();
        });
    }
}

impl CredentialStore for FileCredentialStore {
    fn get(&self) -> Option<Credential> {
        self.current.lock().clone()
    }

    fn set(&self, credential: Credential) {
        let mut current = self.current.lock();
        *current = Some(credential);
        self.queue_write(&current);
        debug!("stored access token");
    }

    fn clear(&self) {
        let mut current = self.current.lock();
        *current = None;
        self.queue_write(&current);
        debug!("cleared access token");
    }
}

/// Write the newest queued snapshot until the store is dropped. Intermediate
/// values that were superseded before the writer got to them are skipped.
async fn run_writer(
    path: PathBuf,
    mut pending: watch::Receiver<Snapshot>,
    persisted: watch::Sender<u64>,
) {
    while pending.changed().await.is_ok() {
        let snapshot = pending.borrow_and_update().clone();
        let stored = StoredSession {
            access_token: snapshot.credential.as_ref().map(|c| c.expose().to_owned()),
        };
        if let Err(e) = write_atomic(&path, &stored).await {
            warn!(path = %path.display(), error = %e, "failed to persist session");
        }
        persisted.send_replace(snapshot.generation);
    }
    debug!(path = %path.display(), "session writer stopped");
}

/// Write the session file atomically with 0600 permissions.
async fn write_atomic(path: &Path, data: &StoredSession) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::CredentialParse(format!("serializing session: {e}")))?;

    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("session path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".session.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, json.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp session file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting session file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp session file: {e}")))?;

    debug!(path = %path.display(), "persisted session");
    Ok(())
}

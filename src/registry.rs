//! The authoritative registry of monitored targets.
//!
//! A single async mutex guards both the in-memory set and the persisted
//! file, so mutations are totally ordered and the file always reflects the
//! last acknowledged state. The file is a plain JSON array of address
//! strings, rewritten wholesale on every mutation, and is human-editable
//! between process runs. A missing file at startup means an empty list.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::Mutex;

/// Errors surfaced by registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("target address must not be empty")]
    EmptyAddress,
    #[error("target {0} already exists")]
    AlreadyExists(String),
    #[error("target {0} not found")]
    NotFound(String),
    #[error("failed to persist target list: {0}")]
    Persistence(#[from] std::io::Error),
    #[error("failed to decode target list: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The single source of truth for which targets exist.
///
/// All operations take the same lock; a mutation is acknowledged only
/// after the file write succeeded. If the write fails, the in-memory
/// change is rolled back and the error returned to the caller.
pub struct TargetRegistry {
    path: PathBuf,
    targets: Mutex<BTreeSet<String>>,
}

impl TargetRegistry {
    /// Loads the registry from `path`. A missing file yields an empty
    /// registry; a present-but-corrupt file is an error.
    pub async fn load(path: PathBuf) -> Result<Self, RegistryError> {
        let targets = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice::<Vec<String>>(&bytes)?
                .into_iter()
                .collect(),
            Err(e) if e.kind() == ErrorKind::NotFound => BTreeSet::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path,
            targets: Mutex::new(targets),
        })
    }

    /// Returns a snapshot copy of the current target list.
    pub async fn list(&self) -> Vec<String> {
        self.targets.lock().await.iter().cloned().collect()
    }

    /// Adds a new target. Duplicates are rejected.
    pub async fn add(&self, address: &str) -> Result<(), RegistryError> {
        let address = normalize(address)?;
        let mut targets = self.targets.lock().await;
        if !targets.insert(address.clone()) {
            return Err(RegistryError::AlreadyExists(address));
        }
        if let Err(e) = self.persist(&targets).await {
            targets.remove(&address);
            return Err(e);
        }
        Ok(())
    }

    /// Atomically renames `old` to `new`. Renaming onto a different,
    /// already-present address is rejected; renaming to itself is a no-op.
    pub async fn rename(&self, old: &str, new: &str) -> Result<(), RegistryError> {
        let old = old.trim();
        let new = normalize(new)?;
        let mut targets = self.targets.lock().await;
        if !targets.contains(old) {
            return Err(RegistryError::NotFound(old.to_string()));
        }
        if old == new {
            return Ok(());
        }
        if targets.contains(&new) {
            return Err(RegistryError::AlreadyExists(new));
        }
        targets.remove(old);
        targets.insert(new.clone());
        if let Err(e) = self.persist(&targets).await {
            targets.remove(&new);
            targets.insert(old.to_string());
            return Err(e);
        }
        Ok(())
    }

    /// Removes a target. The caller is responsible for cascading the
    /// removal to the metrics exporter; the registry knows nothing about
    /// metric series.
    pub async fn remove(&self, address: &str) -> Result<(), RegistryError> {
        let address = address.trim();
        let mut targets = self.targets.lock().await;
        if !targets.remove(address) {
            return Err(RegistryError::NotFound(address.to_string()));
        }
        if let Err(e) = self.persist(&targets).await {
            targets.insert(address.to_string());
            return Err(e);
        }
        Ok(())
    }

    async fn persist(&self, targets: &BTreeSet<String>) -> Result<(), RegistryError> {
        let list: Vec<&String> = targets.iter().collect();
        let bytes = serde_json::to_vec_pretty(&list)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

fn normalize(address: &str) -> Result<String, RegistryError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(RegistryError::EmptyAddress);
    }
    Ok(address.to_string())
}

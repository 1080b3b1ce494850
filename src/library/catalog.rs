//! Per-owner catalog of uploaded CSV files.
//!
//! One JSON document per owner, keyed by a hash of the owner identity.
//! Saving a file under a name that already exists replaces it in place.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tokio::fs;
use uuid::Uuid;

/// All files stored for one owner
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileCatalog {
    /// Catalog format version
    pub version: u32,

    /// Owner identity this catalog belongs to
    pub owner: String,

    /// Stored files, in upload order
    pub files: Vec<StoredFile>,
}

/// A stored CSV snapshot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredFile {
    pub id: Uuid,
    pub name: String,
    /// Size of `data` in bytes
    pub size: u64,
    /// Raw CSV text
    pub data: String,
    pub uploaded_at: DateTime<Utc>,
}

impl FileCatalog {
    /// Create a new empty catalog
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            version: 1,
            owner: owner.into(),
            files: Vec::new(),
        }
    }

    /// Stable storage key for an owner: SHA256(owner)[0:16] as hex
    pub fn owner_key(owner: &str) -> String {
        let hash = Sha256::digest(owner.as_bytes());
        hex::encode(&hash[..8])
    }

    /// Catalog file for `owner` under `files_dir`
    pub fn path_for(files_dir: &Path, owner: &str) -> PathBuf {
        files_dir.join(format!("{}.json", Self::owner_key(owner)))
    }

    /// Load the owner's catalog, or an empty one if none exists yet
    pub async fn load(files_dir: &Path, owner: &str) -> Result<Self> {
        let path = Self::path_for(files_dir, owner);

        if !path.exists() {
            return Ok(Self::new(owner));
        }

        let content = fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read file catalog: {}", path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse file catalog: {}", path.display()))
    }

    /// Save the catalog to disk
    pub async fn save(&self, files_dir: &Path) -> Result<PathBuf> {
        let path = Self::path_for(files_dir, &self.owner);

        fs::create_dir_all(files_dir)
            .await
            .with_context(|| format!("Failed to create directory: {}", files_dir.display()))?;

        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .with_context(|| format!("Failed to write file catalog: {}", path.display()))?;

        Ok(path)
    }

    /// Store `data` under `name`, replacing a same-named entry in place
    pub fn upsert(&mut self, name: &str, data: impl Into<String>) -> &StoredFile {
        let data = data.into();
        let size = data.len() as u64;
        let now = Utc::now();

        let pos = match self.files.iter().position(|f| f.name == name) {
            Some(pos) => {
                let existing = &mut self.files[pos];
                existing.data = data;
                existing.size = size;
                existing.uploaded_at = now;
                pos
            }
            None => {
                self.files.push(StoredFile {
                    id: Uuid::new_v4(),
                    name: name.to_string(),
                    size,
                    data,
                    uploaded_at: now,
                });
                self.files.len() - 1
            }
        };

        &self.files[pos]
    }

    /// Get a file by name
    pub fn get(&self, name: &str) -> Option<&StoredFile> {
        self.files.iter().find(|f| f.name == name)
    }

    /// All files, most recently uploaded first
    pub fn list(&self) -> Vec<&StoredFile> {
        let mut files: Vec<_> = self.files.iter().collect();
        files.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at));
        files
    }

    /// Remove a file by name
    pub fn remove(&mut self, name: &str) -> Option<StoredFile> {
        let pos = self.files.iter().position(|f| f.name == name)?;
        Some(self.files.remove(pos))
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upsert_replaces_same_name() {
        let mut catalog = FileCatalog::new("auditor@example.org");
        let id = catalog.upsert("cases.csv", "a,b\n1,2\n").id;
        catalog.upsert("other.csv", "x\n");
        let updated = catalog.upsert("cases.csv", "a,b\n");

        assert_eq!(updated.id, id);
        assert_eq!(updated.size, 4);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_owner_key_is_stable() {
        let key = FileCatalog::owner_key("auditor@example.org");
        assert_eq!(key.len(), 16);
        assert_eq!(key, FileCatalog::owner_key("auditor@example.org"));
        assert_ne!(key, FileCatalog::owner_key("someone@example.org"));
    }

    #[test]
    fn test_remove() {
        let mut catalog = FileCatalog::new("owner");
        catalog.upsert("cases.csv", "a\n");

        assert!(catalog.remove("missing.csv").is_none());
        assert_eq!(catalog.remove("cases.csv").map(|f| f.name), Some("cases.csv".to_string()));
        assert!(catalog.is_empty());
    }
}

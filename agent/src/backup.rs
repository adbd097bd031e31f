//! Backup storage (spec §1: "filesystem backup-storage adapters" are an
//! external collaborator; we specify the operations the core requires).
//! `BackupStorage` is the narrow trait `Snapshot`/`Restore` drive against;
//! `LocalFsBackupStorage` is a reference implementation sufficient to
//! exercise snapshot -> manifest -> restore end to end without a real cloud
//! backend.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncReadExt, AsyncWriteExt};

use common::err::decode_error::ReError;
use common::err::CResult;

#[async_trait]
pub trait BackupStorage: Send + Sync {
    async fn put_file(&self, name: &str, contents: &[u8]) -> CResult<()>;
    async fn get_file(&self, name: &str) -> CResult<Vec<u8>>;
    async fn list(&self, prefix: &str) -> CResult<Vec<String>>;
}

pub struct LocalFsBackupStorage {
    root: PathBuf,
}

impl LocalFsBackupStorage {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        LocalFsBackupStorage { root: root.into() }
    }

    fn path_for(&self, name: &str) -> PathBuf {
        self.root.join(name)
    }
}

#[async_trait]
impl BackupStorage for LocalFsBackupStorage {
    async fn put_file(&self, name: &str, contents: &[u8]) -> CResult<()> {
        let path = self.path_for(name);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(&path).await?;
        file.write_all(contents).await?;
        Ok(())
    }

    async fn get_file(&self, name: &str) -> CResult<Vec<u8>> {
        let mut file = tokio::fs::File::open(self.path_for(name))
            .await
            .map_err(|e| ReError::IoError(e))?;
        let mut buf = Vec::new();
        file.read_to_end(&mut buf).await?;
        Ok(buf)
    }

    async fn list(&self, prefix: &str) -> CResult<Vec<String>> {
        let dir = self.path_for(prefix);
        if !dir.exists() {
            return Ok(vec![]);
        }
        let mut entries = tokio::fs::read_dir(&dir).await?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(format!("{}/{}", prefix, name));
            }
        }
        Ok(names)
    }
}

/// spec §4.6.2 "Snapshot": a JSON manifest referencing the copied data files
/// and the replication position they were taken at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Manifest {
    pub db_name: String,
    pub files: Vec<String>,
    /// opaque replication position the data files reflect
    pub replication_position: String,
    pub server_mode: bool,
    pub created_at_ms: i64,
    /// set only for `MultiSnapshot`: the key-range this manifest covers
    pub key_range: Option<topo::KeyRange>,
}

impl Manifest {
    pub fn manifest_name(db_name: &str, created_at_ms: i64) -> String {
        format!("{}/manifest-{}.json", db_name, created_at_ms)
    }

    pub fn to_json(&self) -> CResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| ReError::Error(e.to_string()))
    }

    pub fn from_json(s: &str) -> CResult<Self> {
        serde_json::from_str(s).map_err(|e| ReError::Error(e.to_string()))
    }
}

/// copies `src` into the backup storage under `manifest_dir/name`, returning
/// the stored path. Stands in for the teacher's real InnoDB file copy (spec
/// §1 out-of-scope collaborator) — tests exercise it against tempdir files.
pub async fn copy_data_file(storage: &dyn BackupStorage, manifest_dir: &str, src: &Path) -> CResult<String> {
    let contents = tokio::fs::read(src).await?;
    let name = src
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| ReError::InvalidArgument(format!("non-utf8 file name: {:?}", src)))?;
    let stored = format!("{}/{}", manifest_dir, name);
    storage.put_file(&stored, &contents).await?;
    Ok(stored)
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn round_trips_a_file_through_local_storage() {
        let dir = tempdir();
        let storage = LocalFsBackupStorage::new(&dir);
        storage.put_file("ks/0/ibdata1", b"innodb-bytes").await.unwrap();
        let got = storage.get_file("ks/0/ibdata1").await.unwrap();
        assert_eq!(got, b"innodb-bytes");

        let listed = storage.list("ks/0").await.unwrap();
        assert_eq!(listed, vec!["ks/0/ibdata1".to_string()]);
    }

    #[test]
    fn manifest_json_roundtrip() {
        let manifest = Manifest {
            db_name: "ks_0".to_string(),
            files: vec!["ks/0/ibdata1".to_string()],
            replication_position: "mysql-bin.000005:1234".to_string(),
            server_mode: false,
            created_at_ms: 42,
            key_range: None,
        };
        let json = manifest.to_json().unwrap();
        let back = Manifest::from_json(&json).unwrap();
        assert_eq!(back.db_name, "ks_0");
        assert_eq!(back.replication_position, manifest.replication_position);
    }

    fn tempdir() -> PathBuf {
        let mut p = std::env::temp_dir();
        p.push(format!("agent-backup-test-{}", uuid::Uuid::new_v4()));
        p
    }
}

//! Backup manager
//!
//! Byte-identical timestamped copies of the save file, stored in a
//! `backups/` directory next to it, with a JSON metadata index. The
//! repair path creates a backup automatically before writing anything.

use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::{Result, SaveError};

/// Metadata index file inside the backup directory.
pub const INDEX_FILE_NAME: &str = "backups.json";

// =============================================================================
// METADATA
// =============================================================================

/// One recorded backup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackupEntry {
    /// File name inside the backup directory.
    pub filename: String,
    /// Local timestamp, `YYYY-mm-dd HH:MM:SS`.
    pub timestamp: String,
    /// What produced the backup: `manual` or `fix`.
    pub operation: String,
    /// Optional caller-supplied description.
    #[serde(default)]
    pub description: String,
    /// Size of the copied file in bytes.
    pub file_size: u64,
}

// =============================================================================
// MANAGER
// =============================================================================

/// Manages the backup directory of one save file.
pub struct BackupManager {
    save_path: PathBuf,
    backup_dir: PathBuf,
}

impl BackupManager {
    /// Backups go to `backups/` next to the save file.
    pub fn new(save_path: impl Into<PathBuf>) -> Self {
        let save_path = save_path.into();
        let backup_dir = save_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join("backups");
        Self {
            save_path,
            backup_dir,
        }
    }

    /// Use an explicit backup directory instead of the default.
    pub fn with_backup_dir(save_path: impl Into<PathBuf>, backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            save_path: save_path.into(),
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn index_path(&self) -> PathBuf {
        self.backup_dir.join(INDEX_FILE_NAME)
    }

    fn read_index(&self) -> Vec<BackupEntry> {
        fs::read_to_string(self.index_path())
            .ok()
            .and_then(|text| serde_json::from_str(&text).ok())
            .unwrap_or_default()
    }

    fn write_index(&self, entries: &[BackupEntry]) -> Result<()> {
        let json = serde_json::to_string_pretty(entries)?;
        fs::write(self.index_path(), json)?;
        Ok(())
    }

    /// Copy the save file into the backup directory and record it.
    /// Returns the path of the new copy.
    pub fn create_backup(&self, description: &str, operation: &str) -> Result<PathBuf> {
        if !self.save_path.exists() {
            return Err(SaveError::InvalidArgument(format!(
                "save file not found: {}",
                self.save_path.display()
            )));
        }
        fs::create_dir_all(&self.backup_dir)?;

        let now = Local::now();
        let stem = self
            .save_path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("save");
        let filename = format!("{stem}.{}.bak", now.format("%Y%m%d_%H%M%S"));
        let backup_path = self.backup_dir.join(&filename);

        fs::copy(&self.save_path, &backup_path)?;
        let file_size = fs::metadata(&backup_path)?.len();

        let mut entries = self.read_index();
        entries.push(BackupEntry {
            filename: filename.clone(),
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            operation: operation.to_string(),
            description: description.to_string(),
            file_size,
        });
        self.write_index(&entries)?;

        info!(backup = %backup_path.display(), operation, "backup created");
        Ok(backup_path)
    }

    /// Backup taken automatically before a repair writes to disk.
    pub fn create_pre_write_backup(&self, operation: &str) -> Result<PathBuf> {
        self.create_backup("automatic pre-write backup", operation)
    }

    /// Recorded backups, oldest first. Entries whose file vanished are
    /// filtered out.
    pub fn list_backups(&self) -> Vec<BackupEntry> {
        self.read_index()
            .into_iter()
            .filter(|entry| self.backup_dir.join(&entry.filename).exists())
            .collect()
    }

    /// Copy a recorded backup back over the save file.
    pub fn restore_backup(&self, filename: &str) -> Result<()> {
        let backup_path = self.backup_dir.join(filename);
        if !backup_path.exists() {
            return Err(SaveError::InvalidArgument(format!(
                "backup not found: {filename}"
            )));
        }
        fs::copy(&backup_path, &self.save_path)?;
        info!(backup = %backup_path.display(), "backup restored");
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================

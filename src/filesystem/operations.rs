use std::path::Path;
use std::sync::Arc;
use std::time::SystemTime;

use tokio::fs;

use crate::protocol::{FileEntry, FileSystemError};

use super::display;
use super::security::{PathValidator, ResolvedPath};

/// Metadata for one listed entry, taken after symlink resolution
#[derive(Debug, Clone, PartialEq)]
pub struct EntryDescriptor {
    pub name: String,
    /// Path of the entry as seen from the root (the link, not its target)
    pub relative_path: String,
    pub is_directory: bool,
    /// Immediate children; `None` for files
    pub item_count: Option<usize>,
    pub size_label: String,
    pub modified_at: SystemTime,
}

impl EntryDescriptor {
    pub fn to_protocol(&self) -> FileEntry {
        FileEntry {
            name: self.name.clone(),
            path: self.relative_path.clone(),
            isdir: self.is_directory,
            nitems: self.item_count,
            size: self.size_label.clone(),
            modtime: display::format_modtime(self.modified_at),
        }
    }
}

#[derive(Clone)]
pub struct FileOperations {
    validator: Arc<PathValidator>,
}

impl FileOperations {
    pub fn new(validator: Arc<PathValidator>) -> Self {
        Self { validator }
    }

    /// List the immediate children of a directory.
    ///
    /// Children that cannot be classified (dangling symlinks, permission
    /// errors, links leaving the root) are logged and left out.
    pub async fn list_directory(&self, logical: &str) -> Result<Vec<EntryDescriptor>, FileSystemError> {
        let dir = self.validator.resolve(logical)?;
        let shown = logical.trim_matches('/').to_string();

        let metadata = fs::metadata(dir.as_path())
            .await
            .map_err(|e| FileSystemError::StatFailure {
                path: shown.clone(),
                message: e.to_string(),
            })?;
        if !metadata.is_dir() {
            return Err(FileSystemError::NotADirectory { path: shown });
        }

        let mut read_dir = fs::read_dir(dir.as_path())
            .await
            .map_err(|e| FileSystemError::StatFailure {
                path: shown.clone(),
                message: e.to_string(),
            })?;

        let mut entries = Vec::new();
        loop {
            let entry = match read_dir.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    tracing::warn!("Stopped scanning {:?} early: {}", shown, e);
                    break;
                }
            };

            let entry_path = entry.path();
            let name = entry.file_name().to_string_lossy().to_string();
            match self.classify(&entry_path, &name).await {
                Ok(descriptor) => entries.push(descriptor),
                Err(e) => tracing::warn!("Skipping entry: {}", e),
            }
        }

        Ok(entries)
    }

    /// Describe one directory entry, following it if it is a symlink
    pub async fn classify(&self, path: &Path, name: &str) -> Result<EntryDescriptor, FileSystemError> {
        let relative_path = self.validator.relative(path);
        let target = self.validator.confine(path)?;

        let metadata = fs::metadata(target.as_path())
            .await
            .map_err(|e| FileSystemError::StatFailure {
                path: relative_path.clone(),
                message: e.to_string(),
            })?;

        let is_directory = metadata.is_dir();
        let item_count = if is_directory {
            Some(count_children(&target).await.unwrap_or_else(|e| {
                tracing::debug!("Unable to count items in {:?}: {}", relative_path, e);
                0
            }))
        } else {
            None
        };
        let size_label = if is_directory {
            display::DIRECTORY_SIZE_LABEL.to_string()
        } else {
            display::size_label(metadata.len())
        };

        Ok(EntryDescriptor {
            name: name.to_string(),
            relative_path,
            is_directory,
            item_count,
            size_label,
            modified_at: metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH),
        })
    }
}

async fn count_children(dir: &ResolvedPath) -> std::io::Result<usize> {
    let mut read_dir = fs::read_dir(dir.as_path()).await?;
    let mut count = 0;
    while read_dir.next_entry().await?.is_some() {
        count += 1;
    }
    Ok(count)
}

//! HTTP wire types
//!
//! JSON shapes returned by the `/api/*` endpoints.

use serde::{Deserialize, Serialize};

/// Query string accepted by `/api/files` and `/api/file`
#[derive(Debug, Default, Deserialize)]
pub struct PathQuery {
    #[serde(default)]
    pub path: Option<String>,
}

/// One row of a directory listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FileEntry {
    pub name: String,
    /// Path relative to the served root, `/`-separated
    pub path: String,
    pub isdir: bool,
    /// Immediate children; omitted for files
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nitems: Option<usize>,
    /// "N.NN MB" for files, "0" for directories
    pub size: String,
    pub modtime: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiskUsage {
    pub filesystem: String,
    pub total_size: String,
    pub used: String,
    pub available: String,
    pub use_percentage: String,
    pub mount_point: String,
}

/// Body of every non-2xx API response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum FileSystemError {
    /// The logical path leaves the served root or cannot be resolved
    #[error("Invalid path: {attempted_path}")]
    PathEscape { attempted_path: String },
    #[error("Path is not a directory: {path}")]
    NotADirectory { path: String },
    #[error("File not found: {path}")]
    NotFound { path: String },
    #[error("Unable to stat {path}: {message}")]
    StatFailure { path: String, message: String },
    #[error("{tool} failed: {message}")]
    ToolFailure { tool: String, message: String },
    #[error("File too large: {path} ({size} bytes, limit {max_size})")]
    FileTooLarge { path: String, size: u64, max_size: u64 },
}

impl FileSystemError {
    /// Stable machine-readable name, used as `error` in [`ErrorBody`]
    pub fn code(&self) -> &'static str {
        match self {
            FileSystemError::PathEscape { .. } => "path_escape",
            FileSystemError::NotADirectory { .. } => "not_a_directory",
            FileSystemError::NotFound { .. } => "not_found",
            FileSystemError::StatFailure { .. } => "stat_failure",
            FileSystemError::ToolFailure { .. } => "tool_failure",
            FileSystemError::FileTooLarge { .. } => "file_too_large",
        }
    }

    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_entry_omits_item_count_for_files() {
        let entry = FileEntry {
            name: "a.txt".to_string(),
            path: "docs/a.txt".to_string(),
            isdir: false,
            nitems: None,
            size: "0.01 MB".to_string(),
            modtime: "Mon Jan  1 00:00:00 2024".to_string(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json.get("nitems").is_none());
        assert_eq!(json["isdir"], false);
        assert_eq!(json["path"], "docs/a.txt");
    }

    #[test]
    fn test_disk_usage_uses_camel_case_keys() {
        let usage = DiskUsage {
            filesystem: "/dev/sda1".to_string(),
            total_size: "100G".to_string(),
            used: "40G".to_string(),
            available: "60G".to_string(),
            use_percentage: "40%".to_string(),
            mount_point: "/".to_string(),
        };
        let json = serde_json::to_value(&usage).unwrap();
        assert_eq!(json["totalSize"], "100G");
        assert_eq!(json["usePercentage"], "40%");
        assert_eq!(json["mountPoint"], "/");
    }

    #[test]
    fn test_error_body_carries_message() {
        let err = FileSystemError::NotFound {
            path: "missing.txt".to_string(),
        };
        let body = err.to_body();
        assert_eq!(body.error, "not_found");
        assert_eq!(body.message, "File not found: missing.txt");
    }
}

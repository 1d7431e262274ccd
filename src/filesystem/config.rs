use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("root directory does not exist: {0}")]
    MissingRoot(PathBuf),

    #[error("root is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    #[error("port must be greater than 0")]
    InvalidPort,

    #[error("max_read_size must be greater than 0")]
    InvalidMaxReadSize,

    #[error("{0} command must not be empty")]
    EmptyToolCommand(&'static str),
}

/// Programs the dispatcher hands files to
#[derive(Debug, Clone, PartialEq)]
pub struct ToolConfig {
    /// Document converter; called as `<converter> <file> -t html`
    pub converter: String,
    /// Media streamer; called as `<streamer> -n -p <file>`
    pub streamer: String,
    /// Desktop opener; called as `<opener> <file>`
    pub opener: String,
    /// Filesystem statistics; called as `<disk_usage> -P -h <root>`
    pub disk_usage: String,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            converter: "pandoc".to_string(),
            streamer: "DXR_".to_string(),
            opener: "xdg-open".to_string(),
            disk_usage: "df".to_string(),
        }
    }
}

/// Configuration for the explorer service
#[derive(Debug, Clone)]
pub struct ExplorerConfig {
    /// Directory every request is confined to
    pub root: PathBuf,

    /// Listening port
    pub port: u16,

    /// Front-end assets served for non-API paths
    pub static_dir: PathBuf,

    /// Maximum file size for text previews (bytes)
    pub max_read_size: u64,

    pub tools: ToolConfig,

    /// Upper bound on a synchronous conversion; `None` waits indefinitely
    pub convert_timeout: Option<Duration>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            root: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            port: DEFAULT_PORT,
            static_dir: PathBuf::from("public"),
            max_read_size: 50 * 1024 * 1024,
            tools: ToolConfig::default(),
            convert_timeout: None,
        }
    }
}

impl ExplorerConfig {
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// Apply `PORT` and `XPLORE_*` environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(port) = std::env::var("PORT") {
            match port.trim().parse::<u16>() {
                Ok(port) => {
                    tracing::info!("Overriding port from environment: {}", port);
                    self.port = port;
                }
                Err(_) => tracing::warn!("Ignoring unparsable PORT value: {:?}", port),
            }
        }

        let overrides = [
            ("XPLORE_CONVERTER", &mut self.tools.converter),
            ("XPLORE_STREAMER", &mut self.tools.streamer),
            ("XPLORE_OPENER", &mut self.tools.opener),
        ];
        for (var, slot) in overrides {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    tracing::info!("Overriding {} from environment: {}", var, value);
                    *slot = value;
                }
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.root.exists() {
            return Err(ConfigError::MissingRoot(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ConfigError::RootNotADirectory(self.root.clone()));
        }
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.max_read_size == 0 {
            return Err(ConfigError::InvalidMaxReadSize);
        }

        let tools = [
            ("converter", &self.tools.converter),
            ("streamer", &self.tools.streamer),
            ("opener", &self.tools.opener),
            ("disk_usage", &self.tools.disk_usage),
        ];
        for (name, command) in tools {
            if command.trim().is_empty() {
                return Err(ConfigError::EmptyToolCommand(name));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_validate_accepts_existing_directory() {
        let temp = TempDir::new().unwrap();
        let config = ExplorerConfig::with_root(temp.path());
        assert_eq!(config.validate(), Ok(()));
    }

    #[test]
    fn test_validate_rejects_missing_root() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("nope");
        let config = ExplorerConfig::with_root(&missing);
        assert_eq!(config.validate(), Err(ConfigError::MissingRoot(missing)));
    }

    #[test]
    fn test_validate_rejects_file_root() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        let config = ExplorerConfig::with_root(&file);
        assert_eq!(config.validate(), Err(ConfigError::RootNotADirectory(file)));
    }

    #[test]
    fn test_validate_rejects_zero_port_and_empty_tools() {
        let temp = TempDir::new().unwrap();
        let mut config = ExplorerConfig::with_root(temp.path());
        config.port = 0;
        assert_eq!(config.validate(), Err(ConfigError::InvalidPort));

        config.port = DEFAULT_PORT;
        config.tools.converter = "  ".to_string();
        assert_eq!(
            config.validate(),
            Err(ConfigError::EmptyToolCommand("converter"))
        );
    }
}

use std::path::Path;
use std::sync::Arc;

use tokio::fs;
use tokio::io::{AsyncRead, AsyncReadExt};

use crate::protocol::FileSystemError;

use super::config::ExplorerConfig;
use super::mime::{ContentStrategy, ExternalTool};
use super::security::{PathValidator, ResolvedPath};
use super::tools::{ToolInvocation, ToolRunner};

/// What `/api/file` hands back for one file
#[derive(Debug)]
pub enum ContentResponse {
    /// Open handle to stream unchanged
    Binary {
        mime_type: &'static str,
        file: fs::File,
        len: u64,
    },
    /// Converter stdout, already HTML
    Converted { body: Vec<u8> },
    /// A viewer was started; nothing to send but an acknowledgement
    Launched { tool: String },
    Text { body: String },
}

pub struct ContentDispatcher {
    validator: Arc<PathValidator>,
    config: Arc<ExplorerConfig>,
    runner: Arc<dyn ToolRunner>,
}

impl ContentDispatcher {
    pub fn new(
        validator: Arc<PathValidator>,
        config: Arc<ExplorerConfig>,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            validator,
            config,
            runner,
        }
    }

    /// Resolve a logical path and deliver the file according to its extension
    pub async fn serve(&self, logical: &str) -> Result<ContentResponse, FileSystemError> {
        let shown = logical.trim_matches('/').to_string();
        let resolved = self.validator.resolve(logical)?;

        let metadata = fs::metadata(resolved.as_path())
            .await
            .map_err(|_| FileSystemError::NotFound { path: shown.clone() })?;
        if !metadata.is_file() {
            return Err(FileSystemError::NotFound { path: shown });
        }

        let strategy = ContentStrategy::for_path(resolved.as_path());
        tracing::debug!("Serving {:?} as {:?}", shown, strategy);

        match strategy {
            ContentStrategy::PassthroughBinary(mime_type) => {
                let file = fs::File::open(resolved.as_path())
                    .await
                    .map_err(|_| FileSystemError::NotFound { path: shown })?;
                Ok(ContentResponse::Binary {
                    mime_type,
                    file,
                    len: metadata.len(),
                })
            }
            ContentStrategy::ExternalConvert(tool) => self.convert(tool, &resolved).await,
            ContentStrategy::ExternalOpen(tool) => self.open(tool, &resolved),
            ContentStrategy::RawText => self.read_text(&resolved, metadata.len(), shown).await,
        }
    }

    async fn convert(
        &self,
        tool: ExternalTool,
        path: &ResolvedPath,
    ) -> Result<ContentResponse, FileSystemError> {
        let invocation = self.invocation(tool, path.as_path());
        let program = invocation.program.clone();

        let run = self.runner.run(&invocation);
        let result = match self.config.convert_timeout {
            Some(limit) => match tokio::time::timeout(limit, run).await {
                Ok(result) => result,
                Err(_) => {
                    tracing::warn!("{} timed out after {:?}", program, limit);
                    return Err(FileSystemError::ToolFailure {
                        tool: program,
                        message: format!("timed out after {}s", limit.as_secs()),
                    });
                }
            },
            None => run.await,
        };

        match result {
            Ok(output) if output.success => Ok(ContentResponse::Converted {
                body: output.stdout,
            }),
            Ok(output) => {
                let message = self.validator.redact(&output.diagnostic());
                tracing::warn!("{} failed: {}", program, message);
                Err(FileSystemError::ToolFailure {
                    tool: program,
                    message,
                })
            }
            Err(e) => {
                let message = self.validator.redact(&e.to_string());
                tracing::warn!("Unable to run {}: {}", program, message);
                Err(FileSystemError::ToolFailure {
                    tool: program,
                    message,
                })
            }
        }
    }

    fn open(
        &self,
        tool: ExternalTool,
        path: &ResolvedPath,
    ) -> Result<ContentResponse, FileSystemError> {
        let invocation = self.invocation(tool, path.as_path());
        self.runner.launch(&invocation).map_err(|e| {
            let message = self.validator.redact(&e.to_string());
            tracing::warn!("Unable to launch {}: {}", invocation.program, message);
            FileSystemError::ToolFailure {
                tool: invocation.program.clone(),
                message,
            }
        })?;

        tracing::info!("Launched {} for {:?}", invocation.program, path.file_name());
        Ok(ContentResponse::Launched {
            tool: invocation.program,
        })
    }

    async fn read_text(
        &self,
        path: &ResolvedPath,
        size: u64,
        shown: String,
    ) -> Result<ContentResponse, FileSystemError> {
        let max_size = self.config.max_read_size;
        if size > max_size {
            return Err(FileSystemError::FileTooLarge {
                path: shown,
                size,
                max_size,
            });
        }

        let file = fs::File::open(path.as_path())
            .await
            .map_err(|_| FileSystemError::NotFound { path: shown.clone() })?;

        // The file may have grown since it was stat'ed
        let bytes = read_capped(file, max_size)
            .await
            .map_err(|_| FileSystemError::NotFound { path: shown.clone() })?
            .ok_or_else(|| FileSystemError::FileTooLarge {
                path: shown.clone(),
                size: size.max(max_size + 1),
                max_size,
            })?;
        let body = String::from_utf8(bytes).map_err(|_| FileSystemError::ToolFailure {
            tool: "text preview".to_string(),
            message: format!("{} is not valid UTF-8", shown),
        })?;

        Ok(ContentResponse::Text { body })
    }

    fn invocation(&self, tool: ExternalTool, path: &Path) -> ToolInvocation {
        let tools = &self.config.tools;
        match tool {
            ExternalTool::DocumentConverter => ToolInvocation::new(tools.converter.as_str())
                .arg(path)
                .arg("-t")
                .arg("html"),
            ExternalTool::MediaStreamer => ToolInvocation::new(tools.streamer.as_str())
                .arg("-n")
                .arg("-p")
                .arg(path),
            ExternalTool::DesktopOpener => ToolInvocation::new(tools.opener.as_str()).arg(path),
        }
    }
}

/// Read at most `max_size` bytes; `None` if the reader holds more
async fn read_capped<R: AsyncRead + Unpin>(reader: R, max_size: u64) -> std::io::Result<Option<Vec<u8>>> {
    let mut bytes = Vec::new();
    reader.take(max_size + 1).read_to_end(&mut bytes).await?;
    if bytes.len() as u64 > max_size {
        return Ok(None);
    }
    Ok(Some(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_capped_stops_past_limit() {
        let data = vec![b'x'; 64];
        assert_eq!(read_capped(&data[..], 64).await.unwrap(), Some(data.clone()));
        assert_eq!(read_capped(&data[..], 63).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_read_capped_ignores_stale_size() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("log.txt");
        std::fs::write(&path, "short").unwrap();
        let stale = std::fs::metadata(&path).unwrap().len();
        std::fs::write(&path, vec![b'y'; 100]).unwrap();

        let file = fs::File::open(&path).await.unwrap();
        assert!(stale <= 16);
        assert_eq!(read_capped(file, 16).await.unwrap(), None);
    }
}

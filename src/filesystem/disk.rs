use std::sync::Arc;

use crate::protocol::{DiskUsage, FileSystemError};

use super::config::ExplorerConfig;
use super::security::PathValidator;
use super::tools::{ToolInvocation, ToolRunner};

/// Reports capacity of the volume holding the root
pub struct DiskUsageReporter {
    validator: Arc<PathValidator>,
    config: Arc<ExplorerConfig>,
    runner: Arc<dyn ToolRunner>,
}

impl DiskUsageReporter {
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

    pub async fn report(&self) -> Result<DiskUsage, FileSystemError> {
        let program = self.config.tools.disk_usage.clone();
        // -P keeps each filesystem on one line even with long device names
        let invocation = ToolInvocation::new(program.as_str())
            .arg("-P")
            .arg("-h")
            .arg(self.validator.root());

        let output = self.runner.run(&invocation).await.map_err(|e| {
            tracing::error!("Disk usage error: {}", e);
            FileSystemError::ToolFailure {
                tool: program.clone(),
                message: self.validator.redact(&e.to_string()),
            }
        })?;

        if !output.success {
            let message = self.validator.redact(&output.diagnostic());
            tracing::error!("Disk usage error: {}", message);
            return Err(FileSystemError::ToolFailure {
                tool: program,
                message,
            });
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_df_output(&stdout).ok_or_else(|| {
            tracing::error!("Unparsable {} output: {:?}", program, stdout);
            FileSystemError::ToolFailure {
                tool: program,
                message: "Unable to parse disk usage".to_string(),
            }
        })
    }
}

/// Parse POSIX `df` output: a header line, then
/// `filesystem size used avail capacity mounted-on`
pub fn parse_df_output(stdout: &str) -> Option<DiskUsage> {
    let mut lines = stdout.lines().filter(|line| !line.trim().is_empty());
    lines.next()?;

    let fields: Vec<&str> = lines.flat_map(str::split_whitespace).collect();
    if fields.len() < 6 {
        return None;
    }

    let use_percentage = fields[4];
    if !use_percentage.ends_with('%') {
        return None;
    }

    Some(DiskUsage {
        filesystem: fields[0].to_string(),
        total_size: fields[1].to_string(),
        used: fields[2].to_string(),
        available: fields[3].to_string(),
        use_percentage: use_percentage.to_string(),
        // Mount points may contain spaces
        mount_point: fields[5..].join(" "),
    })
}

//! Command-execution seam for external viewers and converters.
//!
//! Programs always get an explicit argument vector; nothing is ever passed
//! through a shell, so file names cannot inject commands.

use std::ffi::{OsStr, OsString};
use std::io;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

/// A program plus its argument list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<OsString>,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }
}

/// Captured result of a finished tool run
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    /// Short diagnostic for a failed run: stderr, or the exit status
    pub fn diagnostic(&self) -> String {
        let stderr = String::from_utf8_lossy(&self.stderr).trim().to_string();
        if !stderr.is_empty() {
            return stderr;
        }
        match self.code {
            Some(code) => format!("exited with status {}", code),
            None => "terminated by signal".to_string(),
        }
    }
}

#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run to completion and capture its output
    async fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput>;

    /// Start the program and return once it has been spawned
    fn launch(&self, invocation: &ToolInvocation) -> io::Result<()>;
}

/// Runs tools as real host processes
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemToolRunner;

impl SystemToolRunner {
    fn command(invocation: &ToolInvocation) -> io::Result<Command> {
        let program = which::which(&invocation.program).map_err(|_| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} not found on PATH", invocation.program),
            )
        })?;
        let mut command = Command::new(program);
        command.args(&invocation.args).stdin(Stdio::null());
        Ok(command)
    }
}

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, invocation: &ToolInvocation) -> io::Result<ToolOutput> {
        let output = Self::command(invocation)?.kill_on_drop(true).output().await?;
        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn launch(&self, invocation: &ToolInvocation) -> io::Result<()> {
        let mut child = Self::command(invocation)?
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()?;

        // Reap in the background so the child never lingers as a zombie.
        let program = invocation.program.clone();
        tokio::spawn(async move {
            match child.wait().await {
                Ok(status) if status.success() => {
                    tracing::debug!("{} finished", program);
                }
                Ok(status) => tracing::warn!("{} exited with {}", program, status),
                Err(e) => tracing::warn!("Failed to wait for {}: {}", program, e),
            }
        });

        Ok(())
    }
}

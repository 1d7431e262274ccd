//! File system service for xplore

pub mod config;
pub mod disk;
pub mod dispatch;
pub mod display;
pub mod mime;
pub mod operations;
pub mod security;
pub mod tools;


use std::io;
use std::sync::Arc;

use config::ExplorerConfig;
use disk::DiskUsageReporter;
use dispatch::ContentDispatcher;
use operations::FileOperations;
use security::PathValidator;
use tools::{SystemToolRunner, ToolRunner};

pub struct FileSystemService {
    config: Arc<ExplorerConfig>,
    validator: Arc<PathValidator>,
    ops: FileOperations,
    dispatcher: ContentDispatcher,
    disk: DiskUsageReporter,
}

impl FileSystemService {
    pub fn new(config: ExplorerConfig) -> io::Result<Self> {
        Self::with_runner(config, Arc::new(SystemToolRunner))
    }

    /// Build the service with a custom command runner
    pub fn with_runner(config: ExplorerConfig, runner: Arc<dyn ToolRunner>) -> io::Result<Self> {
        let config = Arc::new(config);
        let validator = Arc::new(PathValidator::new(&config.root)?);
        let ops = FileOperations::new(validator.clone());
        let dispatcher = ContentDispatcher::new(validator.clone(), config.clone(), runner.clone());
        let disk = DiskUsageReporter::new(validator.clone(), config.clone(), runner);
        Ok(Self {
            config,
            validator,
            ops,
            dispatcher,
            disk,
        })
    }

    pub fn config(&self) -> &ExplorerConfig {
        self.config.as_ref()
    }

    pub fn validator(&self) -> &PathValidator {
        self.validator.as_ref()
    }

    pub fn ops(&self) -> &FileOperations {
        &self.ops
    }

    pub fn dispatcher(&self) -> &ContentDispatcher {
        &self.dispatcher
    }

    pub fn disk(&self) -> &DiskUsageReporter {
        &self.disk
    }
}

use crate::config::BuildConfig;
use crate::progress::{ConsoleProgressHandler, ProgressHandler};
use crate::toolchain::{ProcessToolchain, Toolchain};
use std::sync::Arc;

/// Dependency injection container
/// Manages all shared dependencies of a build invocation
pub struct Container {
    config: Arc<BuildConfig>,
    toolchain: Arc<dyn Toolchain>,
    progress: Arc<dyn ProgressHandler>,
}

impl Container {
    /// Create a new container with production dependencies
    pub fn new(config: BuildConfig) -> Self {
        let toolchain = Arc::new(ProcessToolchain::new(config.toolchain.clone()));
        let progress = Arc::new(ConsoleProgressHandler::new());

        Container {
            config: Arc::new(config),
            toolchain,
            progress,
        }
    }

    /// Create a container with custom dependencies (for testing)
    pub fn with_dependencies(
        config: BuildConfig,
        toolchain: Arc<dyn Toolchain>,
        progress: Arc<dyn ProgressHandler>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            toolchain,
            progress,
        }
    }

    pub fn config(&self) -> &Arc<BuildConfig> {
        &self.config
    }

    pub fn toolchain(&self) -> &Arc<dyn Toolchain> {
        &self.toolchain
    }

    pub fn progress(&self) -> &Arc<dyn ProgressHandler> {
        &self.progress
    }
}

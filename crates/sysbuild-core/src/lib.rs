pub mod cache;
pub mod config;
pub mod di;
pub mod errors;
pub mod includes;
pub mod layout;
pub mod orchestrator;
pub mod progress;
pub mod stages;
pub mod toolchain;

pub use config::{BuildConfig, BuildOptions, CliOverrides, ToolchainConfig};
pub use di::Container;
pub use errors::BuildError;
pub use layout::{BuildLayout, CompilationUnit, DirectoryGroup};
pub use orchestrator::{run_build, BuildOrchestrator, BuildPhase, BuildSummary};
pub use progress::{
    BuildEvent, CollectingProgressHandler, ConsoleProgressHandler, ProgressHandler,
};
pub use toolchain::{ProcessToolchain, ToolCommand, ToolKind, Toolchain, ToolchainError};

//! The compile, archive and link steps of the pipeline
//!
//! Each stage is a thin wrapper that prepares output directories, calls the
//! [`Toolchain`](crate::toolchain::Toolchain) and attaches the failing
//! unit, archive or binary to any error.

mod archive;
mod compile;
mod link;

pub use archive::{archive_group, ArchiveOutcome};
pub use compile::compile_unit;
pub use link::link_binary;

use std::path::Path;

use crate::errors::BuildError;

fn ensure_parent_dir(path: &Path) -> Result<(), BuildError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            std::fs::create_dir_all(parent).map_err(BuildError::io(parent))
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use std::path::{Path, PathBuf};
    use std::sync::Mutex;

    use crate::toolchain::{ToolKind, Toolchain, ToolchainError};

    /// Writes placeholder outputs and remembers each call
    #[derive(Default)]
    pub struct RecordingToolchain {
        pub calls: Mutex<Vec<(ToolKind, PathBuf)>>,
        pub fail: Option<ToolKind>,
    }

    impl RecordingToolchain {
        pub fn failing(tool: ToolKind) -> Self {
            Self {
                fail: Some(tool),
                ..Self::default()
            }
        }

        fn record(&self, tool: ToolKind, output: &Path) -> Result<(), ToolchainError> {
            self.calls.lock().unwrap().push((tool, output.to_path_buf()));
            if self.fail == Some(tool) {
                return Err(ToolchainError::Failed {
                    tool,
                    command: format!("fake {}", tool),
                    code: Some(1),
                    stderr: String::new(),
                });
            }
            std::fs::write(output, tool.to_string()).unwrap();
            Ok(())
        }
    }

    impl Toolchain for RecordingToolchain {
        fn compile(&self, _source: &Path, object: &Path) -> Result<(), ToolchainError> {
            self.record(ToolKind::Compiler, object)
        }

        fn archive(&self, archive: &Path, _objects: &[PathBuf]) -> Result<(), ToolchainError> {
            self.record(ToolKind::Archiver, archive)
        }

        fn link(&self, output: &Path, _archives: &[PathBuf]) -> Result<(), ToolchainError> {
            self.record(ToolKind::Linker, output)
        }
    }
}

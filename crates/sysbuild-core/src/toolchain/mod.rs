//! External tool invocation
//!
//! The build core never assembles argv itself. It talks to a [`Toolchain`],
//! and the production [`ProcessToolchain`] turns each request into a
//! [`ToolCommand`] run as a blocking subprocess. Tests substitute a fake
//! toolchain that records requests instead.

mod command;
mod process;

use std::fmt;
use std::path::{Path, PathBuf};

pub use crate::errors::ToolchainError;
pub use command::ToolCommand;
pub use process::ProcessToolchain;

/// The external programs the build and its collaborators drive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Compiler,
    Archiver,
    Linker,
    Debugger,
    MemoryChecker,
    Emulator,
    /// The built binary itself
    Program,
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolKind::Compiler => "compiler",
            ToolKind::Archiver => "archiver",
            ToolKind::Linker => "linker",
            ToolKind::Debugger => "debugger",
            ToolKind::MemoryChecker => "memory checker",
            ToolKind::Emulator => "emulator",
            ToolKind::Program => "program",
        };
        f.write_str(name)
    }
}

/// Capability interface over the compiler, archiver and linker.
///
/// Every call blocks until the tool exits. Any failure is fatal to the build.
pub trait Toolchain: Send + Sync {
    /// Translate one source into one object file
    fn compile(&self, source: &Path, object: &Path) -> Result<(), ToolchainError>;

    /// Create a fresh static archive from `objects`
    fn archive(&self, archive: &Path, objects: &[PathBuf]) -> Result<(), ToolchainError>;

    /// Link `archives` into the executable at `output`
    fn link(&self, output: &Path, archives: &[PathBuf]) -> Result<(), ToolchainError>;
}

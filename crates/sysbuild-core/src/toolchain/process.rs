use std::path::{Path, PathBuf};

use super::{ToolCommand, ToolKind, Toolchain, ToolchainError};
use crate::config::ToolchainConfig;

/// Archiver mode: replace members, create the archive, write a symbol index
const ARCHIVE_MODE: &str = "rcs";

/// Toolchain backed by real subprocesses
#[derive(Debug, Clone)]
pub struct ProcessToolchain {
    config: ToolchainConfig,
}

impl ProcessToolchain {
    pub fn new(config: ToolchainConfig) -> Self {
        Self { config }
    }

    /// `<compiler> -c -std=<std> -g <source> -o <object>`
    pub fn compile_command(&self, source: &Path, object: &Path) -> ToolCommand {
        ToolCommand::new(&self.config.compiler)
            .arg("-c")
            .arg(format!("-std={}", self.config.std))
            .arg("-g")
            .arg(source)
            .arg("-o")
            .arg(object)
    }

    /// `<archiver> rcs <archive> <objects...>`
    pub fn archive_command(&self, archive: &Path, objects: &[PathBuf]) -> ToolCommand {
        ToolCommand::new(&self.config.archiver)
            .arg(ARCHIVE_MODE)
            .arg(archive)
            .args(objects)
    }

    /// `<linker> -o <output> <archives...>`
    pub fn link_command(&self, output: &Path, archives: &[PathBuf]) -> ToolCommand {
        ToolCommand::new(&self.config.linker)
            .arg("-o")
            .arg(output)
            .args(archives)
    }
}

impl Toolchain for ProcessToolchain {
    fn compile(&self, source: &Path, object: &Path) -> Result<(), ToolchainError> {
        self.compile_command(source, object).run(ToolKind::Compiler)
    }

    fn archive(&self, archive: &Path, objects: &[PathBuf]) -> Result<(), ToolchainError> {
        self.archive_command(archive, objects).run(ToolKind::Archiver)
    }

    fn link(&self, output: &Path, archives: &[PathBuf]) -> Result<(), ToolchainError> {
        self.link_command(output, archives).run(ToolKind::Linker)
    }
}

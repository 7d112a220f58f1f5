//! Launching the built binary, optionally under a debugger, memory checker or emulator

use std::ffi::OsString;
use std::path::Path;
use sysbuild_core::{ToolCommand, ToolKind};
use tracing::info;

/// How to launch the produced binary after a successful build
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    Native,
    Debugger,
    MemoryChecker,
    Emulator(String),
}

impl RunMode {
    /// Pick a mode from the CLI flags; `None` means build only
    pub fn from_flags(run: bool, gdb: bool, valgrind: bool, qemu: Option<String>) -> Option<Self> {
        if gdb {
            Some(RunMode::Debugger)
        } else if valgrind {
            Some(RunMode::MemoryChecker)
        } else if let Some(program) = qemu {
            Some(RunMode::Emulator(program))
        } else if run {
            Some(RunMode::Native)
        } else {
            None
        }
    }

    pub fn tool(&self) -> ToolKind {
        match self {
            RunMode::Native => ToolKind::Program,
            RunMode::Debugger => ToolKind::Debugger,
            RunMode::MemoryChecker => ToolKind::MemoryChecker,
            RunMode::Emulator(_) => ToolKind::Emulator,
        }
    }

    pub fn command(&self, binary: &Path, args: &[OsString]) -> ToolCommand {
        match self {
            RunMode::Native => ToolCommand::new(binary).args(args),
            RunMode::Debugger => ToolCommand::new("gdb").arg("--args").arg(binary).args(args),
            RunMode::MemoryChecker => ToolCommand::new("valgrind")
                .args(["--leak-check=full", "--error-exitcode=1"])
                .arg(binary)
                .args(args),
            RunMode::Emulator(program) => ToolCommand::new(program).arg(binary).args(args),
        }
    }
}

/// Launch `binary` and return the exit code to propagate.
///
/// A collaborator killed by a signal reports 1.
pub fn run_binary(mode: &RunMode, binary: &Path, args: &[OsString]) -> anyhow::Result<i32> {
    let command = mode.command(binary, args);
    info!("Running {}", command);
    let status = command.run_interactive(mode.tool())?;
    Ok(status.code().unwrap_or(1))
}

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use tracing::debug;

use super::{ToolKind, ToolchainError};

/// A fully-specified external command: program plus arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: OsString,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: program.as_ref().to_os_string(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &OsStr {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }

    fn to_command(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }

    /// Run to completion, capturing stderr for the error report.
    ///
    /// Stdout is inherited so tool output stays visible.
    pub fn run(&self, tool: ToolKind) -> Result<(), ToolchainError> {
        debug!("Running {}: {}", tool, self);

        let output = self
            .to_command()
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::piped())
            .output()
            .map_err(|source| self.spawn_error(tool, source))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(ToolchainError::Failed {
                tool,
                command: self.to_string(),
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            })
        }
    }

    /// Run with the terminal attached, returning the exit status.
    ///
    /// Used for interactive collaborators such as a debugger, where the
    /// tool's own exit code is the result rather than a failure.
    pub fn run_interactive(&self, tool: ToolKind) -> Result<ExitStatus, ToolchainError> {
        debug!("Launching {}: {}", tool, self);
        self.to_command()
            .status()
            .map_err(|source| self.spawn_error(tool, source))
    }

    fn spawn_error(&self, tool: ToolKind, source: std::io::Error) -> ToolchainError {
        ToolchainError::Spawn {
            tool,
            program: self.program.to_string_lossy().into_owned(),
            source,
        }
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Path::new(&self.program).display())?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_renders_command_line() {
        let command = ToolCommand::new("ar")
            .arg("rcs")
            .arg("build/opt/opt.a")
            .args(["build/opt/DCE.o", "build/opt/GVN.o"]);

        insta::assert_snapshot!(command.to_string(), @"ar rcs build/opt/opt.a build/opt/DCE.o build/opt/GVN.o");
    }

    #[test]
    fn test_spawn_failure_names_program() {
        let command = ToolCommand::new("sysbuild-definitely-not-a-real-tool");
        let err = command.run(ToolKind::Archiver).unwrap_err();

        assert!(matches!(err, ToolchainError::Spawn { .. }));
        assert!(err.to_string().contains("sysbuild-definitely-not-a-real-tool"));
        assert_eq!(err.tool(), ToolKind::Archiver);
    }

    #[cfg(unix)]
    #[test]
    fn test_nonzero_exit_is_failure() {
        let err = ToolCommand::new("sh")
            .args(["-c", "echo broken >&2; exit 3"])
            .run(ToolKind::Compiler)
            .unwrap_err();

        match err {
            ToolchainError::Failed {
                code, ref stderr, ..
            } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr.trim(), "broken");
            }
            other => panic!("expected failure, got {:?}", other),
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_zero_exit_is_success() {
        ToolCommand::new("true").run(ToolKind::Linker).unwrap();
    }
}

//! Mock implementations for testing

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use sysbuild_core::toolchain::{ToolKind, Toolchain, ToolchainError};

/// One recorded toolchain request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub tool: ToolKind,
    pub output: PathBuf,
    pub inputs: Vec<PathBuf>,
}

/// A toolchain that records invocations instead of compiling.
///
/// Each call writes a small placeholder output so later stages and the
/// staleness check see real files on disk. Archives and binaries list their
/// inputs, one per line, which lets tests check what was packed or linked.
#[derive(Debug, Default)]
pub struct MockToolchain {
    invocations: Mutex<Vec<Invocation>>,
    fail_tool: Option<ToolKind>,
    fail_input: Option<PathBuf>,
}

impl MockToolchain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call to `tool` exits non-zero
    pub fn failing(tool: ToolKind) -> Self {
        Self {
            fail_tool: Some(tool),
            ..Self::default()
        }
    }

    /// Only compiling `source` exits non-zero
    pub fn failing_on_source(source: impl Into<PathBuf>) -> Self {
        Self {
            fail_tool: Some(ToolKind::Compiler),
            fail_input: Some(source.into()),
            ..Self::default()
        }
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    pub fn calls_to(&self, tool: ToolKind) -> Vec<Invocation> {
        self.invocations()
            .into_iter()
            .filter(|i| i.tool == tool)
            .collect()
    }

    /// Sources passed to the compiler, in call order
    pub fn compiled_sources(&self) -> Vec<PathBuf> {
        self.calls_to(ToolKind::Compiler)
            .into_iter()
            .flat_map(|i| i.inputs)
            .collect()
    }

    pub fn reset(&self) {
        self.invocations.lock().unwrap().clear();
    }

    fn invoke(&self, tool: ToolKind, output: &Path, inputs: &[PathBuf]) -> Result<(), ToolchainError> {
        self.invocations.lock().unwrap().push(Invocation {
            tool,
            output: output.to_path_buf(),
            inputs: inputs.to_vec(),
        });

        let should_fail = self.fail_tool == Some(tool)
            && self
                .fail_input
                .as_ref()
                .map_or(true, |wanted| inputs.contains(wanted));
        if should_fail {
            return Err(ToolchainError::Failed {
                tool,
                command: format!("mock-{} {}", tool, output.display()),
                code: Some(1),
                stderr: "mock failure".to_string(),
            });
        }

        let body: String = inputs
            .iter()
            .map(|p| format!("{}\n", p.display()))
            .collect();
        std::fs::write(output, body).map_err(|source| ToolchainError::Spawn {
            tool,
            program: "mock".to_string(),
            source,
        })
    }
}

impl Toolchain for MockToolchain {
    fn compile(&self, source: &Path, object: &Path) -> Result<(), ToolchainError> {
        self.invoke(ToolKind::Compiler, object, &[source.to_path_buf()])
    }

    fn archive(&self, archive: &Path, objects: &[PathBuf]) -> Result<(), ToolchainError> {
        self.invoke(ToolKind::Archiver, archive, objects)
    }

    fn link(&self, output: &Path, archives: &[PathBuf]) -> Result<(), ToolchainError> {
        self.invoke(ToolKind::Linker, output, archives)
    }
}

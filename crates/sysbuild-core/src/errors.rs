use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::cache::CacheError;
use crate::toolchain::ToolKind;

/// Failure of an external tool invocation
#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("failed to launch {tool} `{program}`: {source}")]
    Spawn {
        tool: ToolKind,
        program: String,
        source: std::io::Error,
    },

    #[error("{tool} {} while running `{command}`{}", describe_exit(.code), stderr_suffix(.stderr))]
    Failed {
        tool: ToolKind,
        command: String,
        code: Option<i32>,
        stderr: String,
    },
}

impl ToolchainError {
    pub fn tool(&self) -> ToolKind {
        match self {
            ToolchainError::Spawn { tool, .. } | ToolchainError::Failed { tool, .. } => *tool,
        }
    }
}

fn describe_exit(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exited with status {}", code),
        None => "was terminated by a signal".to_string(),
    }
}

fn stderr_suffix(stderr: &str) -> String {
    let trimmed = stderr.trim();
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("\n{}", trimmed)
    }
}

/// Fatal build errors. Any of these aborts the build before the cache is persisted.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("cannot read source {path}: {source}")]
    SourceRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("compiling {unit} failed: {source}")]
    Compile {
        unit: PathBuf,
        source: ToolchainError,
    },

    #[error("building archive {archive} failed: {source}")]
    Archive {
        archive: PathBuf,
        source: ToolchainError,
    },

    #[error("linking {output} failed: {source}")]
    Link {
        output: PathBuf,
        source: ToolchainError,
    },

    #[error("no source files found under {dir}")]
    NoSources { dir: PathBuf },

    #[error("{first} and {second} both compile to {object}; rename one of them")]
    ObjectCollision {
        object: PathBuf,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("failed to write build cache: {0}")]
    CacheWrite(#[from] CacheError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("failed to start worker pool: {0}")]
    ThreadPool(String),
}

impl BuildError {
    /// Adapter for `map_err` on filesystem operations against `path`
    pub fn io(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
        move |source| BuildError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Adapter for `map_err` when reading a source or header
    pub fn source_read(path: &Path) -> impl FnOnce(std::io::Error) -> BuildError + '_ {
        move |source| BuildError::SourceRead {
            path: path.to_path_buf(),
            source,
        }
    }

    /// The external tool that failed, if this is a toolchain failure
    pub fn failed_tool(&self) -> Option<ToolKind> {
        match self {
            BuildError::Compile { source, .. }
            | BuildError::Archive { source, .. }
            | BuildError::Link { source, .. } => Some(source.tool()),
            _ => None,
        }
    }
}

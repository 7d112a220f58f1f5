//! Local include discovery
//!
//! Scans a source for `#include "name"` directives and resolves each name
//! against the including file's directory. Angle-bracket includes are system
//! headers and are never tracked. Only the directives written in the file
//! itself are reported; the headers are not scanned in turn.

use std::path::{Component, Path, PathBuf};

use crate::errors::BuildError;

/// Read `path` and return its existing local includes in order of appearance
pub fn local_includes(path: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let bytes = std::fs::read(path).map_err(BuildError::source_read(path))?;
    Ok(resolve_local_includes(path, &String::from_utf8_lossy(&bytes)))
}

/// Resolve the quoted includes found in `content` relative to `source`'s directory.
///
/// Names that do not resolve to an existing file are skipped. A header named
/// twice is reported once, at its first position.
pub fn resolve_local_includes(source: &Path, content: &str) -> Vec<PathBuf> {
    let base = source.parent().unwrap_or_else(|| Path::new(""));
    let mut resolved: Vec<PathBuf> = Vec::new();

    for name in parse_include_names(content) {
        let candidate = normalize(&base.join(name));
        if candidate.is_file() && !resolved.contains(&candidate) {
            resolved.push(candidate);
        }
    }

    resolved
}

/// Extract the file names of every `#include "..."` directive
pub fn parse_include_names(content: &str) -> Vec<&str> {
    content.lines().filter_map(quoted_include).collect()
}

fn quoted_include(line: &str) -> Option<&str> {
    let rest = line.trim_start().strip_prefix('#')?;
    let rest = rest.trim_start().strip_prefix("include")?;
    let rest = rest.trim_start().strip_prefix('"')?;
    let end = rest.find('"')?;
    let name = &rest[..end];
    if name.is_empty() {
        None
    } else {
        Some(name)
    }
}

/// Lexically collapse `.` and `dir/..` so one header always maps to one key
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

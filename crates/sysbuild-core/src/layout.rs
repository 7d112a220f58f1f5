//! Mapping between the source tree and the build output tree
//!
//! `src/<dir>/<name>.<ext>` compiles to `build/<dir>/<name>.o`, every source
//! directory is packed into `build/<dir>/<last component of dir>.a`, and the
//! linked binary lands at `build/<binary name>`.

use indexmap::IndexMap;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cache::CACHE_FILE_NAME;
use crate::errors::BuildError;

/// Object file suffix
pub const OBJECT_EXTENSION: &str = "o";

/// Static archive suffix
pub const ARCHIVE_EXTENSION: &str = "a";

/// Fallback archive name for the source root when it has no usable name (e.g. `.`)
const ROOT_GROUP_NAME: &str = "root";

/// One source file translated independently into one object file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnit {
    pub source: PathBuf,
    pub object: PathBuf,
    /// Directory of the source relative to the source root (empty for the root)
    pub group: PathBuf,
}

/// All objects produced from one source directory, packed into one archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    pub dir: PathBuf,
    pub archive: PathBuf,
    pub sources: Vec<PathBuf>,
    pub objects: Vec<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildLayout {
    source_dir: PathBuf,
    build_dir: PathBuf,
    binary_name: String,
}

impl BuildLayout {
    pub fn new(
        source_dir: impl Into<PathBuf>,
        build_dir: impl Into<PathBuf>,
        binary_name: impl Into<String>,
    ) -> Self {
        Self {
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            binary_name: binary_name.into(),
        }
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// Final executable path
    pub fn binary_path(&self) -> PathBuf {
        self.build_dir.join(&self.binary_name)
    }

    /// Persisted build cache path
    pub fn cache_path(&self) -> PathBuf {
        self.build_dir.join(CACHE_FILE_NAME)
    }

    fn relative<'p>(&self, source: &'p Path) -> &'p Path {
        source.strip_prefix(&self.source_dir).unwrap_or(source)
    }

    /// Object file for a source under the source root
    pub fn object_path(&self, source: &Path) -> PathBuf {
        self.build_dir
            .join(self.relative(source))
            .with_extension(OBJECT_EXTENSION)
    }

    /// Source directory of a unit, relative to the source root
    pub fn group_dir(&self, source: &Path) -> PathBuf {
        self.relative(source)
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default()
    }

    /// Archive for a group directory, named after the directory's last component
    pub fn archive_path(&self, group_dir: &Path) -> PathBuf {
        let name = group_dir
            .file_name()
            .or_else(|| self.source_dir.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| ROOT_GROUP_NAME.to_string());
        self.build_dir
            .join(group_dir)
            .join(format!("{}.{}", name, ARCHIVE_EXTENSION))
    }

    pub fn unit(&self, source: PathBuf) -> CompilationUnit {
        CompilationUnit {
            object: self.object_path(&source),
            group: self.group_dir(&source),
            source,
        }
    }

    /// Walk the source root and collect every file with one of `extensions`.
    ///
    /// Units come back sorted by path. A missing or unreadable source tree is
    /// a fatal read error.
    pub fn scan_sources(&self, extensions: &[String]) -> Result<Vec<CompilationUnit>, BuildError> {
        let mut sources = Vec::new();

        for entry in WalkDir::new(&self.source_dir).follow_links(true) {
            let entry = entry.map_err(|e| {
                let path = e
                    .path()
                    .map(Path::to_path_buf)
                    .unwrap_or_else(|| self.source_dir.clone());
                BuildError::SourceRead {
                    path,
                    source: std::io::Error::from(e),
                }
            })?;

            if !entry.file_type().is_file() {
                continue;
            }

            let matches = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| extensions.iter().any(|wanted| wanted == ext))
                .unwrap_or(false);

            if matches {
                sources.push(entry.into_path());
            }
        }

        sources.sort();
        let units: Vec<CompilationUnit> = sources.into_iter().map(|s| self.unit(s)).collect();
        check_object_collisions(&units)?;
        Ok(units)
    }

    /// Group units by source directory, groups sorted by directory
    pub fn group_units(&self, units: &[CompilationUnit]) -> Vec<DirectoryGroup> {
        let mut groups: IndexMap<PathBuf, DirectoryGroup> = IndexMap::new();

        for unit in units {
            let group = groups
                .entry(unit.group.clone())
                .or_insert_with(|| DirectoryGroup {
                    dir: unit.group.clone(),
                    archive: self.archive_path(&unit.group),
                    sources: Vec::new(),
                    objects: Vec::new(),
                });
            group.sources.push(unit.source.clone());
            group.objects.push(unit.object.clone());
        }

        groups.sort_keys();
        groups.into_values().collect()
    }
}

/// Reject two sources differing only by extension, e.g. `util.cpp` and `util.cc`
fn check_object_collisions(units: &[CompilationUnit]) -> Result<(), BuildError> {
    let mut seen: FxHashMap<&Path, &Path> = FxHashMap::default();
    for unit in units {
        if let Some(first) = seen.insert(&unit.object, &unit.source) {
            return Err(BuildError::ObjectCollision {
                object: unit.object.clone(),
                first: first.to_path_buf(),
                second: unit.source.clone(),
            });
        }
    }
    Ok(())
}

use std::path::{Path, PathBuf};

use crate::errors::BuildError;
use crate::toolchain::Toolchain;

use super::ensure_parent_dir;

/// Link every group archive into the final executable.
///
/// Not gated on staleness: a build that reaches this stage always relinks.
pub fn link_binary(
    toolchain: &dyn Toolchain,
    archives: &[PathBuf],
    output: &Path,
) -> Result<(), BuildError> {
    ensure_parent_dir(output)?;
    toolchain
        .link(output, archives)
        .map_err(|source| BuildError::Link {
            output: output.to_path_buf(),
            source,
        })
}

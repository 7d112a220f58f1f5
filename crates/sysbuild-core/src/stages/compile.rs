use crate::errors::BuildError;
use crate::layout::CompilationUnit;
use crate::toolchain::Toolchain;

use super::ensure_parent_dir;

/// Compile one stale unit, creating the mirrored object directory on demand
pub fn compile_unit(toolchain: &dyn Toolchain, unit: &CompilationUnit) -> Result<(), BuildError> {
    ensure_parent_dir(&unit.object)?;
    toolchain
        .compile(&unit.source, &unit.object)
        .map_err(|source| BuildError::Compile {
            unit: unit.source.clone(),
            source,
        })
}

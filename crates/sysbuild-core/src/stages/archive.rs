use crate::errors::BuildError;
use crate::layout::DirectoryGroup;
use crate::toolchain::Toolchain;

use super::ensure_parent_dir;

/// What the archive stage did for one directory group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOutcome {
    Rebuilt,
    Skipped,
}

/// Rebuild a group's archive if any member was recompiled or the archive is missing.
///
/// Archives are never patched in place: the old file is removed and the
/// archiver packs every current object of the group into a new one.
pub fn archive_group(
    toolchain: &dyn Toolchain,
    group: &DirectoryGroup,
    changed: bool,
) -> Result<ArchiveOutcome, BuildError> {
    if !changed && group.archive.is_file() {
        return Ok(ArchiveOutcome::Skipped);
    }

    ensure_parent_dir(&group.archive)?;
    if group.archive.exists() {
        std::fs::remove_file(&group.archive).map_err(BuildError::io(&group.archive))?;
    }

    toolchain
        .archive(&group.archive, &group.objects)
        .map_err(|source| BuildError::Archive {
            archive: group.archive.clone(),
            source,
        })?;

    Ok(ArchiveOutcome::Rebuilt)
}

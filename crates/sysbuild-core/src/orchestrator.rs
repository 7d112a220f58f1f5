//! Build pipeline: scan, decide, compile, archive, link, persist
//!
//! The orchestrator owns the in-memory cache for one invocation. It is loaded
//! before scanning, updated as each stale unit compiles, and written back only
//! after the link succeeds. Any failure before that point leaves the cache
//! file from the last successful build untouched.

use rayon::prelude::*;
use rustc_hash::FxHashSet;
use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, info};

use crate::cache::{CacheManager, CacheManifest, Staleness, StalenessOracle, UnitDigests};
use crate::config::BuildConfig;
use crate::di::Container;
use crate::errors::BuildError;
use crate::layout::{BuildLayout, CompilationUnit};
use crate::progress::BuildEvent;
use crate::stages::{archive_group, compile_unit, link_binary, ArchiveOutcome};

/// Pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildPhase {
    Scanning,
    Deciding,
    Compiling,
    Archiving,
    Linking,
    CachePersist,
}

impl fmt::Display for BuildPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BuildPhase::Scanning => "scanning",
            BuildPhase::Deciding => "staleness check",
            BuildPhase::Compiling => "compile",
            BuildPhase::Archiving => "archive",
            BuildPhase::Linking => "link",
            BuildPhase::CachePersist => "cache write",
        };
        f.write_str(name)
    }
}

/// What a successful build did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSummary {
    /// Number of compilation units found
    pub units: usize,
    /// Recompiled sources, sorted
    pub compiled: Vec<PathBuf>,
    pub archives_rebuilt: Vec<PathBuf>,
    pub archives_skipped: Vec<PathBuf>,
    pub binary: PathBuf,
}

impl BuildSummary {
    pub fn up_to_date(&self) -> usize {
        self.units - self.compiled.len()
    }
}

struct UnitPlan<'u> {
    unit: &'u CompilationUnit,
    digests: UnitDigests,
}

pub struct BuildOrchestrator {
    container: Container,
    layout: BuildLayout,
    cache: CacheManager,
}

impl BuildOrchestrator {
    pub fn new(container: Container) -> Self {
        let layout = container.config().layout();
        let cache = CacheManager::new(layout.cache_path());
        Self {
            container,
            layout,
            cache,
        }
    }

    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Run one full build invocation
    pub fn run(&self) -> Result<BuildSummary, BuildError> {
        let config = self.container.config();
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.build_options.jobs)
            .build()
            .map_err(|e| BuildError::ThreadPool(e.to_string()))?;

        pool.install(|| self.run_pipeline(config))
    }

    fn run_pipeline(&self, config: &BuildConfig) -> Result<BuildSummary, BuildError> {
        let options = &config.build_options;

        let units = phase(BuildPhase::Scanning, || {
            self.layout.scan_sources(&options.extensions)
        })?;
        if units.is_empty() {
            return Err(BuildError::NoSources {
                dir: self.layout.source_dir().to_path_buf(),
            });
        }
        let groups = self.layout.group_units(&units);
        info!(
            "Found {} source file(s) in {} directory group(s)",
            units.len(),
            groups.len()
        );

        let manifest = if options.no_cache {
            info!("Build cache disabled, recompiling everything");
            CacheManifest::new()
        } else {
            self.cache.load()
        };

        let stale = phase(BuildPhase::Deciding, || self.decide(&units, &manifest))?;
        if stale.is_empty() {
            info!("All {} unit(s) up to date", units.len());
        } else {
            info!(
                "{} of {} unit(s) need recompilation",
                stale.len(),
                units.len()
            );
        }

        let (manifest, changed_groups) =
            phase(BuildPhase::Compiling, || self.compile(&stale, manifest))?;

        let (archives_rebuilt, archives_skipped) = phase(BuildPhase::Archiving, || {
            let outcomes = groups
                .par_iter()
                .map(|group| {
                    let changed = changed_groups.contains(&group.dir);
                    archive_group(self.container.toolchain().as_ref(), group, changed)
                        .map(|outcome| (group.archive.clone(), outcome))
                })
                .collect::<Result<Vec<_>, BuildError>>()?;

            let mut rebuilt = Vec::new();
            let mut skipped = Vec::new();
            for (archive, outcome) in outcomes {
                match outcome {
                    ArchiveOutcome::Rebuilt => {
                        self.report(BuildEvent::ArchiveRebuilt {
                            archive: archive.clone(),
                        });
                        rebuilt.push(archive);
                    }
                    ArchiveOutcome::Skipped => {
                        self.report(BuildEvent::ArchiveSkipped {
                            archive: archive.clone(),
                        });
                        skipped.push(archive);
                    }
                }
            }
            Ok((rebuilt, skipped))
        })?;

        let binary = self.layout.binary_path();
        phase(BuildPhase::Linking, || {
            let archives: Vec<PathBuf> = groups.iter().map(|g| g.archive.clone()).collect();
            link_binary(self.container.toolchain().as_ref(), &archives, &binary)?;
            self.report(BuildEvent::Linked {
                output: binary.clone(),
            });
            Ok(())
        })?;

        phase(BuildPhase::CachePersist, || {
            self.cache.save(&manifest).map_err(BuildError::from)
        })?;

        let mut compiled: Vec<PathBuf> = stale.iter().map(|p| p.unit.source.clone()).collect();
        compiled.sort();

        Ok(BuildSummary {
            units: units.len(),
            compiled,
            archives_rebuilt,
            archives_skipped,
            binary,
        })
    }

    /// Hash every unit and keep the ones that need recompiling
    fn decide<'u>(
        &self,
        units: &'u [CompilationUnit],
        manifest: &CacheManifest,
    ) -> Result<Vec<UnitPlan<'u>>, BuildError> {
        let oracle = StalenessOracle::new(manifest);

        let evaluated = units
            .par_iter()
            .map(|unit| {
                let digests = UnitDigests::compute(&unit.source)?;
                let staleness = oracle.evaluate(unit, &digests);
                Ok((UnitPlan { unit, digests }, staleness))
            })
            .collect::<Result<Vec<_>, BuildError>>()?;

        let mut stale = Vec::new();
        for (plan, staleness) in evaluated {
            match staleness {
                Staleness::Fresh => debug!("Up to date: {}", plan.unit.source.display()),
                Staleness::Stale(reason) => {
                    debug!("Stale ({}): {}", reason, plan.unit.source.display());
                    stale.push(plan);
                }
            }
        }
        Ok(stale)
    }

    /// Compile stale units in parallel, stopping at the first failure.
    ///
    /// Returns the updated cache and the set of groups with a recompiled member.
    fn compile(
        &self,
        stale: &[UnitPlan<'_>],
        manifest: CacheManifest,
    ) -> Result<(CacheManifest, FxHashSet<PathBuf>), BuildError> {
        let manifest = Mutex::new(manifest);
        let changed_groups = Mutex::new(FxHashSet::default());
        let toolchain = self.container.toolchain().as_ref();

        stale.par_iter().try_for_each(|plan| {
            compile_unit(toolchain, plan.unit)?;

            manifest
                .lock()
                .unwrap()
                .insert_entry(plan.unit.source.clone(), plan.digests.to_entry());
            changed_groups.lock().unwrap().insert(plan.unit.group.clone());

            self.report(BuildEvent::Compiled {
                source: plan.unit.source.clone(),
            });
            Ok::<(), BuildError>(())
        })?;

        Ok((
            manifest.into_inner().unwrap(),
            changed_groups.into_inner().unwrap(),
        ))
    }

    fn report(&self, event: BuildEvent) {
        self.container.progress().report(event);
    }
}

fn phase<T>(
    current: BuildPhase,
    step: impl FnOnce() -> Result<T, BuildError>,
) -> Result<T, BuildError> {
    debug!("Entering {} phase", current);
    step().map_err(|e| {
        debug!("Build aborted during {} phase", current);
        e
    })
}

/// Build with production tools and console progress
pub fn run_build(config: BuildConfig) -> Result<BuildSummary, BuildError> {
    BuildOrchestrator::new(Container::new(config)).run()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectingProgressHandler, ProgressHandler};
    use crate::stages::fake::RecordingToolchain;
    use crate::toolchain::ToolKind;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn config_for(dir: &TempDir) -> BuildConfig {
        let mut config = BuildConfig::default();
        config.build_options.source_dir = dir.path().join("src").to_string_lossy().into_owned();
        config.build_options.build_dir = dir.path().join("build").to_string_lossy().into_owned();
        config.build_options.jobs = 2;
        config
    }

    fn orchestrator(
        config: BuildConfig,
        toolchain: RecordingToolchain,
    ) -> (BuildOrchestrator, Arc<CollectingProgressHandler>) {
        let progress = Arc::new(CollectingProgressHandler::new());
        let container =
            Container::with_dependencies(config, Arc::new(toolchain), progress.clone());
        (BuildOrchestrator::new(container), progress)
    }

    #[test]
    fn test_empty_source_tree_is_an_error() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        let (orchestrator, _) = orchestrator(config_for(&dir), RecordingToolchain::default());

        assert!(matches!(
            orchestrator.run().unwrap_err(),
            BuildError::NoSources { .. }
        ));
    }

    #[test]
    fn test_failed_link_does_not_persist_cache() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.cpp"), "int main() {}\n").unwrap();
        let config = config_for(&dir);
        let cache_path = config.layout().cache_path();
        let (orchestrator, progress) =
            orchestrator(config, RecordingToolchain::failing(ToolKind::Linker));

        let err = orchestrator.run().unwrap_err();

        assert_eq!(err.failed_tool(), Some(ToolKind::Linker));
        assert!(!cache_path.exists());
        assert_eq!(progress.compiled_count(), 1);
    }

    #[test]
    fn test_no_cache_recompiles_everything() {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("src")).unwrap();
        fs::write(dir.path().join("src/main.cpp"), "int main() {}\n").unwrap();

        let (first, _) = orchestrator(config_for(&dir), RecordingToolchain::default());
        first.run().unwrap();

        let mut config = config_for(&dir);
        config.build_options.no_cache = true;
        let (second, _) = orchestrator(config, RecordingToolchain::default());
        let summary = second.run().unwrap();

        assert_eq!(summary.compiled.len(), 1);
        assert_eq!(summary.archives_rebuilt.len(), 1);
    }

    #[test]
    fn test_invalid_config_fails_before_scanning() {
        let dir = TempDir::new().unwrap();
        let mut config = config_for(&dir);
        config.build_options.extensions.clear();
        let (orchestrator, _) = orchestrator(config, RecordingToolchain::default());

        assert!(matches!(orchestrator.run().unwrap_err(), BuildError::Config(_)));
    }
}

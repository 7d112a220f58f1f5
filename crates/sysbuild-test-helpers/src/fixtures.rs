//! Test fixtures - throwaway project trees for build tests

use std::path::{Path, PathBuf};
use std::sync::Arc;
use sysbuild_core::{
    BuildConfig, BuildError, BuildOrchestrator, BuildSummary, CollectingProgressHandler,
    Container,
};
use tempfile::TempDir;

use crate::mocks::MockToolchain;

/// A temporary project with `src/` and `build/` under one root
pub struct ProjectFixture {
    dir: TempDir,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("create temp project");
        std::fs::create_dir_all(dir.path().join("src")).expect("create src dir");
        Self { dir }
    }

    /// `src/a.cpp` including `a.h`, and `src/b.cpp` with no local includes
    pub fn two_file_project() -> Self {
        let project = Self::new();
        project.write("src/a.h", "int a();\n");
        project.write(
            "src/a.cpp",
            "#include \"a.h\"\n#include <cstdio>\nint a() { return 1; }\n",
        );
        project.write("src/b.cpp", "int main() { return 0; }\n");
        project
    }

    /// Sources spread over `src/main`, `src/parse` and `src/utils`
    pub fn multi_dir_project() -> Self {
        let project = Self::new();
        project.write("src/main/main.cpp", "#include \"../parse/Parser.h\"\nint main() {}\n");
        project.write("src/parse/Parser.h", "struct Parser {};\n");
        project.write("src/parse/Parser.cpp", "#include \"Parser.h\"\n");
        project.write("src/parse/Lexer.cpp", "#include \"Lexer.h\"\n");
        project.write("src/parse/Lexer.h", "struct Lexer {};\n");
        project.write("src/utils/Exec.cpp", "#include \"Exec.h\"\n");
        project.write("src/utils/Exec.h", "int exec();\n");
        project
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn path(&self, rel: &str) -> PathBuf {
        self.dir.path().join(rel)
    }

    /// Write a file, creating parent directories
    pub fn write(&self, rel: &str, content: &str) {
        let path = self.path(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write fixture file");
    }

    pub fn remove(&self, rel: &str) {
        std::fs::remove_file(self.path(rel)).expect("remove fixture file");
    }

    pub fn read(&self, rel: &str) -> String {
        std::fs::read_to_string(self.path(rel)).expect("read fixture file")
    }

    /// Default config with source and build roots inside this project
    pub fn config(&self) -> BuildConfig {
        let mut config = BuildConfig::default();
        config.build_options.source_dir = self.path("src").to_string_lossy().into_owned();
        config.build_options.build_dir = self.path("build").to_string_lossy().into_owned();
        config
    }

    /// Run a build with `toolchain` and a collecting progress handler
    pub fn build_with(
        &self,
        toolchain: &Arc<MockToolchain>,
    ) -> (Result<BuildSummary, BuildError>, Arc<CollectingProgressHandler>) {
        self.build_with_config(self.config(), toolchain)
    }

    pub fn build_with_config(
        &self,
        config: BuildConfig,
        toolchain: &Arc<MockToolchain>,
    ) -> (Result<BuildSummary, BuildError>, Arc<CollectingProgressHandler>) {
        let progress = Arc::new(CollectingProgressHandler::new());
        let container = Container::with_dependencies(config, toolchain.clone(), progress.clone());
        let result = BuildOrchestrator::new(container).run();
        (result, progress)
    }
}

impl Default for ProjectFixture {
    fn default() -> Self {
        Self::new()
    }
}

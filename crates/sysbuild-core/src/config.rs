use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::errors::BuildError;
use crate::includes::normalize;
use crate::layout::BuildLayout;

/// Default configuration file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "sysbuild.yaml";

/// Written by `--init`; parses to `BuildConfig::default()`
const CONFIG_TEMPLATE: &str = r#"# sysbuild configuration

buildOptions:
  sourceDir: "src"          # Root of the source tree
  buildDir: "build"         # Objects, archives, the binary and the cache go here
  binaryName: "sysc"        # Executable name inside buildDir
  extensions: ["cpp", "cc", "cxx"]
  jobs: 0                   # Parallel compile jobs, 0 = one per CPU
  noCache: false            # Ignore the build cache and recompile everything

toolchain:
  compiler: "clang++"
  std: "c++17"
  archiver: "ar"
  linker: "clang++"
"#;

/// Options that shape the build tree and scheduling
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Root of the source tree (default: src)
    #[serde(default = "default_source_dir")]
    pub source_dir: String,

    /// Root of the build output tree (default: build)
    #[serde(default = "default_build_dir")]
    pub build_dir: String,

    /// File name of the linked executable inside the build dir (default: sysc)
    #[serde(default = "default_binary_name")]
    pub binary_name: String,

    /// Source file extensions treated as compilation units
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,

    /// Maximum parallel compile jobs, 0 = one per CPU (default: 0)
    #[serde(default)]
    pub jobs: usize,

    /// Ignore the build cache and recompile everything (default: false)
    #[serde(default)]
    pub no_cache: bool,
}

fn default_source_dir() -> String {
    "src".to_string()
}

fn default_build_dir() -> String {
    "build".to_string()
}

fn default_binary_name() -> String {
    "sysc".to_string()
}

fn default_extensions() -> Vec<String> {
    vec!["cpp".to_string(), "cc".to_string(), "cxx".to_string()]
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            build_dir: default_build_dir(),
            binary_name: default_binary_name(),
            extensions: default_extensions(),
            jobs: 0,
            no_cache: false,
        }
    }
}

/// External programs used for each build stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolchainConfig {
    /// Compiler driver (default: clang++)
    #[serde(default = "default_compiler")]
    pub compiler: String,

    /// Language standard passed as -std= (default: c++17)
    #[serde(default = "default_std")]
    pub std: String,

    /// Static archiver (default: ar)
    #[serde(default = "default_archiver")]
    pub archiver: String,

    /// Linker driver (default: clang++)
    #[serde(default = "default_compiler")]
    pub linker: String,
}

fn default_compiler() -> String {
    "clang++".to_string()
}

fn default_std() -> String {
    "c++17".to_string()
}

fn default_archiver() -> String {
    "ar".to_string()
}

impl Default for ToolchainConfig {
    fn default() -> Self {
        Self {
            compiler: default_compiler(),
            std: default_std(),
            archiver: default_archiver(),
            linker: default_compiler(),
        }
    }
}

/// Main build configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    #[serde(default)]
    pub build_options: BuildOptions,

    #[serde(default)]
    pub toolchain: ToolchainConfig,
}

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub source_dir: Option<String>,
    pub build_dir: Option<String>,
    pub binary_name: Option<String>,
    pub jobs: Option<usize>,
    pub no_cache: Option<bool>,
    pub compiler: Option<String>,
    pub linker: Option<String>,
}

impl BuildConfig {
    /// Load configuration from a YAML file
    pub fn from_file(path: &Path) -> Result<Self, BuildError> {
        let content = std::fs::read_to_string(path).map_err(BuildError::io(path))?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, BuildError> {
        serde_yaml::from_str(content).map_err(|e| BuildError::Config(e.to_string()))
    }

    /// Write the commented default configuration to a file
    pub fn init_file(path: &Path) -> Result<(), BuildError> {
        std::fs::write(path, CONFIG_TEMPLATE).map_err(BuildError::io(path))
    }

    /// Render this configuration as YAML
    pub fn to_yaml(&self) -> Result<String, BuildError> {
        serde_yaml::to_string(self).map_err(|e| BuildError::Config(e.to_string()))
    }

    /// Merge CLI overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        let options = &mut self.build_options;
        if let Some(ref source_dir) = overrides.source_dir {
            options.source_dir = source_dir.clone();
        }
        if let Some(ref build_dir) = overrides.build_dir {
            options.build_dir = build_dir.clone();
        }
        if let Some(ref binary_name) = overrides.binary_name {
            options.binary_name = binary_name.clone();
        }
        if let Some(jobs) = overrides.jobs {
            options.jobs = jobs;
        }
        if let Some(no_cache) = overrides.no_cache {
            options.no_cache = no_cache;
        }
        if let Some(ref compiler) = overrides.compiler {
            self.toolchain.compiler = compiler.clone();
        }
        if let Some(ref linker) = overrides.linker {
            self.toolchain.linker = linker.clone();
        }
    }

    /// Reject settings the build cannot work with
    pub fn validate(&self) -> Result<(), BuildError> {
        let options = &self.build_options;
        if options.binary_name.is_empty() || options.binary_name.contains(['/', '\\']) {
            return Err(BuildError::Config(format!(
                "binaryName must be a plain file name, got '{}'",
                options.binary_name
            )));
        }
        if options.extensions.is_empty() {
            return Err(BuildError::Config(
                "extensions must name at least one source suffix".to_string(),
            ));
        }
        if self.build_dir_contains_sources() {
            return Err(BuildError::Config(format!(
                "buildDir '{}' must not be or contain sourceDir '{}'",
                options.build_dir, options.source_dir
            )));
        }
        Ok(())
    }

    /// Lexical check first, then on resolved paths when both directories exist
    fn build_dir_contains_sources(&self) -> bool {
        let source = Path::new(&self.build_options.source_dir);
        let build = Path::new(&self.build_options.build_dir);
        if normalize(source).starts_with(normalize(build)) {
            return true;
        }
        match (std::fs::canonicalize(source), std::fs::canonicalize(build)) {
            (Ok(source), Ok(build)) => source.starts_with(build),
            _ => false,
        }
    }

    pub fn layout(&self) -> BuildLayout {
        BuildLayout::new(
            &self.build_options.source_dir,
            &self.build_options.build_dir,
            &self.build_options.binary_name,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;
    use std::path::PathBuf;

    #[test]
    fn test_default_config() {
        let config = BuildConfig::default();
        assert_eq!(config.build_options.source_dir, "src");
        assert_eq!(config.build_options.build_dir, "build");
        assert_eq!(config.toolchain.std, "c++17");
        assert_eq!(config.layout().binary_path(), PathBuf::from("build/sysc"));
    }

    #[test]
    fn test_serialize_config() {
        let config = BuildConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("buildOptions"));
        assert!(json.contains("binaryName"));
    }

    #[test]
    fn test_deserialize_partial_yaml() {
        let yaml = indoc! {r#"
            buildOptions:
              binaryName: "compiler"
              jobs: 4
            toolchain:
              compiler: "g++"
        "#};
        let config = BuildConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.build_options.binary_name, "compiler");
        assert_eq!(config.build_options.jobs, 4);
        assert_eq!(config.build_options.source_dir, "src");
        assert_eq!(config.toolchain.compiler, "g++");
        assert_eq!(config.toolchain.linker, "clang++");
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        let err = BuildConfig::from_yaml("buildOptions: [1, 2").unwrap_err();
        assert!(matches!(err, BuildError::Config(_)));
    }

    #[test]
    fn test_init_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        BuildConfig::init_file(&path).unwrap();

        assert_eq!(BuildConfig::from_file(&path).unwrap(), BuildConfig::default());
    }

    #[test]
    fn test_yaml_roundtrip_keeps_overrides() {
        let mut config = BuildConfig::default();
        config.build_options.binary_name = "compiler".to_string();
        config.toolchain.archiver = "llvm-ar".to_string();

        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("binaryName: compiler"));
        assert_eq!(BuildConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut config = BuildConfig::default();
        config.merge(&CliOverrides {
            build_dir: Some("out".to_string()),
            jobs: Some(2),
            no_cache: Some(true),
            compiler: Some("g++".to_string()),
            ..CliOverrides::default()
        });

        assert_eq!(config.build_options.build_dir, "out");
        assert_eq!(config.build_options.jobs, 2);
        assert!(config.build_options.no_cache);
        assert_eq!(config.toolchain.compiler, "g++");
        assert_eq!(config.toolchain.linker, "clang++");
    }

    #[test]
    fn test_validate_rejects_nested_binary_name() {
        let mut config = BuildConfig::default();
        config.build_options.binary_name = "bin/sysc".to_string();
        assert!(config.validate().is_err());

        config.build_options.binary_name = "sysc".to_string();
        config.build_options.build_dir = "src".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_build_dir_enclosing_sources() {
        let mut config = BuildConfig::default();
        for build_dir in ["./src", "src/", ".", "project/..", ""] {
            config.build_options.build_dir = build_dir.to_string();
            assert!(config.validate().is_err(), "accepted buildDir {:?}", build_dir);
        }

        config.build_options.source_dir = "code/src".to_string();
        config.build_options.build_dir = "code".to_string();
        assert!(config.validate().is_err());

        config.build_options.build_dir = "code/build".to_string();
        assert!(config.validate().is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn test_validate_resolves_existing_directories() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("proj/src")).unwrap();
        std::os::unix::fs::symlink(dir.path().join("proj"), dir.path().join("out")).unwrap();
        let mut config = BuildConfig::default();
        config.build_options.source_dir =
            dir.path().join("proj/src").to_string_lossy().into_owned();
        config.build_options.build_dir = dir.path().join("out").to_string_lossy().into_owned();

        assert!(config.validate().is_err());

        config.build_options.build_dir = dir.path().join("proj/build").to_string_lossy().into_owned();
        assert!(config.validate().is_ok());
    }
}

use clap::Parser;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use sysbuild_core::config::CONFIG_FILE_NAME;
use sysbuild_core::{run_build, BuildConfig, BuildSummary, CliOverrides};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

mod runner;

use runner::{run_binary, RunMode};

/// sysbuild - incremental builder for multi-directory C++ projects
#[derive(Parser, Debug, Clone)]
#[command(name = "sysbuild")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to sysbuild.yaml configuration file
    #[arg(short, long, value_name = "FILE")]
    project: Option<PathBuf>,

    /// Maximum parallel compile jobs (0 = one per CPU)
    #[arg(short, long, value_name = "N")]
    jobs: Option<usize>,

    /// Root of the source tree
    #[arg(long, value_name = "DIR")]
    source_dir: Option<String>,

    /// Root of the build output tree
    #[arg(long, value_name = "DIR")]
    build_dir: Option<String>,

    /// File name of the linked executable
    #[arg(long, value_name = "NAME")]
    binary_name: Option<String>,

    /// Compiler driver, also used as the linker unless configured otherwise
    #[arg(long, value_name = "PROGRAM")]
    compiler: Option<String>,

    /// Ignore the build cache and recompile everything
    #[arg(long)]
    no_cache: bool,

    /// Initialize a new project
    #[arg(long)]
    init: bool,

    /// Remove the build directory
    #[arg(long)]
    clean: bool,

    /// Rebuild whenever a source file changes; never runs the binary
    #[arg(short, long, conflicts_with_all = ["run", "gdb", "valgrind", "qemu"])]
    watch: bool,

    /// Run the binary after a successful build
    #[arg(short, long)]
    run: bool,

    /// Run the binary under gdb
    #[arg(short, long)]
    gdb: bool,

    /// Run the binary under valgrind's leak checker
    #[arg(long)]
    valgrind: bool,

    /// Run the binary under an emulator such as qemu-riscv64
    #[arg(long, value_name = "PROGRAM")]
    qemu: Option<String>,

    /// Arguments passed to the binary when running it
    #[arg(last = true, value_name = "ARGS")]
    args: Vec<OsString>,
}

fn main() {
    // Set RUST_LOG=debug for per-unit staleness decisions
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(1);
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<i32> {
    if cli.init {
        init_project()?;
        return Ok(0);
    }

    let config = load_config(&cli)?;
    debug!("Effective configuration:\n{}", config.to_yaml()?);

    if cli.clean {
        config.validate()?;
        clean(&config)?;
        return Ok(0);
    }

    if cli.watch {
        watch_mode(&config)?;
        return Ok(0);
    }

    let summary = run_build(config)?;
    print_summary(&summary);

    match RunMode::from_flags(cli.run, cli.gdb, cli.valgrind, cli.qemu.clone()) {
        Some(mode) => run_binary(&mode, &summary.binary, &cli.args),
        None => Ok(0),
    }
}

/// Initialize a new project with a configuration file and a source root
fn init_project() -> anyhow::Result<()> {
    let config_path = Path::new(CONFIG_FILE_NAME);
    if config_path.exists() {
        anyhow::bail!("{} already exists", CONFIG_FILE_NAME);
    }

    println!("Initializing new sysbuild project...");
    BuildConfig::init_file(config_path)?;
    println!("Created {}", CONFIG_FILE_NAME);

    std::fs::create_dir_all("src")?;
    println!("Created src/ directory");

    let sample = Path::new("src/main.cpp");
    if !sample.exists() {
        std::fs::write(sample, "int main() {\n    return 0;\n}\n")?;
        println!("Created src/main.cpp");
    }

    Ok(())
}

/// Config file (explicit, or `sysbuild.yaml` if present) overlaid with CLI flags
fn load_config(cli: &Cli) -> anyhow::Result<BuildConfig> {
    let mut config = match &cli.project {
        Some(path) => {
            info!("Using configuration {}", path.display());
            BuildConfig::from_file(path)?
        }
        None if Path::new(CONFIG_FILE_NAME).is_file() => {
            BuildConfig::from_file(Path::new(CONFIG_FILE_NAME))?
        }
        None => BuildConfig::default(),
    };

    config.merge(&CliOverrides {
        source_dir: cli.source_dir.clone(),
        build_dir: cli.build_dir.clone(),
        binary_name: cli.binary_name.clone(),
        jobs: cli.jobs,
        no_cache: cli.no_cache.then_some(true),
        compiler: cli.compiler.clone(),
        linker: cli.compiler.clone(),
    });

    Ok(config)
}

fn clean(config: &BuildConfig) -> anyhow::Result<()> {
    let layout = config.layout();
    let build_dir = layout.build_dir();
    if build_dir.exists() {
        std::fs::remove_dir_all(build_dir)?;
        println!("Removed {}", build_dir.display());
    } else {
        println!("Nothing to clean");
    }
    Ok(())
}

fn print_summary(summary: &BuildSummary) {
    println!(
        "Build finished: {} compiled, {} up to date, {} archive(s) rebuilt -> {}",
        summary.compiled.len(),
        summary.up_to_date(),
        summary.archives_rebuilt.len(),
        summary.binary.display()
    );
}

/// Build once, printing failures instead of returning them
fn build_and_report(config: &BuildConfig) {
    match run_build(config.clone()) {
        Ok(summary) => print_summary(&summary),
        Err(e) => eprintln!("error: {}", e),
    }
}

fn watch_mode(config: &BuildConfig) -> anyhow::Result<()> {
    use notify::{event::EventKind, Event, RecursiveMode, Watcher};
    use std::sync::mpsc::{channel, RecvTimeoutError};
    use std::time::{Duration, Instant};

    let layout = config.layout();
    println!(
        "Watching {} for changes... (Press Ctrl+C to stop)",
        layout.source_dir().display()
    );

    println!("\nInitial build:");
    build_and_report(config);

    // Outputs must not retrigger a build when the build dir sits inside the source dir
    let build_dir = std::fs::canonicalize(layout.build_dir()).ok();

    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(move |res: Result<Event, notify::Error>| {
        if let Ok(event) = res {
            let _ = tx.send(event);
        }
    })?;
    watcher.watch(layout.source_dir(), RecursiveMode::Recursive)?;

    let debounce = Duration::from_millis(100);
    let mut pending = false;
    let mut last_change = Instant::now();

    loop {
        match rx.recv_timeout(debounce) {
            Ok(event) => {
                let is_change = matches!(
                    event.kind,
                    EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
                );
                let touches_sources = event.paths.iter().any(|path| {
                    build_dir
                        .as_ref()
                        .map_or(true, |build| !path.starts_with(build))
                });

                if is_change && touches_sources {
                    pending = true;
                    last_change = Instant::now();
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                if pending && last_change.elapsed() >= debounce {
                    pending = false;
                    println!("\nChange detected, rebuilding...");
                    build_and_report(config);
                }
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(anyhow::anyhow!("File watcher disconnected"));
            }
        }
    }
}

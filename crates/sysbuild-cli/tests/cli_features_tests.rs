use assert_cmd::Command;
use indoc::indoc;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn sysbuild_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("sysbuild"))
}

/// A project whose every tool is `true`, so builds succeed without a C++ toolchain
fn stub_toolchain_project() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src/util")).unwrap();
    fs::write(temp_dir.path().join("src/main.cpp"), "int main() {}\n").unwrap();
    fs::write(temp_dir.path().join("src/util/str.cpp"), "#include \"str.h\"\n").unwrap();
    fs::write(temp_dir.path().join("src/util/str.h"), "int len();\n").unwrap();
    fs::write(
        temp_dir.path().join("sysbuild.yaml"),
        indoc! {r#"
            buildOptions:
              binaryName: "app"
            toolchain:
              compiler: "true"
              archiver: "true"
              linker: "true"
        "#},
    )
    .unwrap();
    temp_dir
}

// ============================================================================
// PROJECT INITIALIZATION TESTS
// ============================================================================

#[test]
fn test_init_creates_project_structure() {
    let temp_dir = TempDir::new().unwrap();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .arg("--init")
        .assert()
        .success()
        .stdout(predicate::str::contains("sysbuild.yaml"));

    assert!(temp_dir.path().join("sysbuild.yaml").exists());
    assert!(temp_dir.path().join("src/main.cpp").exists());

    let config = fs::read_to_string(temp_dir.path().join("sysbuild.yaml")).unwrap();
    assert!(config.contains("buildOptions"));
    assert!(config.contains("toolchain"));
}

#[test]
fn test_init_refuses_to_overwrite_config() {
    let temp_dir = TempDir::new().unwrap();
    fs::write(temp_dir.path().join("sysbuild.yaml"), "buildOptions: {}\n").unwrap();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .arg("--init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    let config = fs::read_to_string(temp_dir.path().join("sysbuild.yaml")).unwrap();
    assert_eq!(config, "buildOptions: {}\n");
}

// ============================================================================
// BUILD TESTS
// ============================================================================

#[cfg(unix)]
#[test]
fn test_build_with_stub_toolchain_succeeds() {
    let temp_dir = stub_toolchain_project();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("2 compiled"));

    assert!(temp_dir
        .path()
        .join("build/.sysbuild-cache.bin")
        .is_file());
}

#[cfg(unix)]
#[test]
fn test_failing_compiler_exits_nonzero_and_names_it() {
    let temp_dir = stub_toolchain_project();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .args(["--compiler", "false"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("error:"))
        .stderr(predicate::str::contains("compiler"));

    assert!(!temp_dir.path().join("build/.sysbuild-cache.bin").exists());
}

#[test]
fn test_missing_compiler_program_is_reported() {
    let temp_dir = stub_toolchain_project();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .args(["--compiler", "sysbuild-no-such-compiler"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("sysbuild-no-such-compiler"));
}

#[test]
fn test_empty_source_tree_fails() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .assert()
        .failure()
        .stderr(predicate::str::contains("no source files"));
}

#[test]
fn test_missing_project_file_fails() {
    let temp_dir = TempDir::new().unwrap();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .args(["--project", "nope.yaml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope.yaml"));
}

#[test]
fn test_invalid_binary_name_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .args(["--binary-name", "bin/app"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("binaryName"));
}

// ============================================================================
// CLEAN AND RUN TESTS
// ============================================================================

#[test]
fn test_clean_removes_build_dir() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("out/util")).unwrap();
    fs::write(temp_dir.path().join("out/util/util.a"), "").unwrap();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .args(["--clean", "--build-dir", "out"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removed"));

    assert!(!temp_dir.path().join("out").exists());
}

#[test]
fn test_clean_refuses_to_remove_source_dir() {
    let temp_dir = TempDir::new().unwrap();
    fs::create_dir_all(temp_dir.path().join("src")).unwrap();
    fs::write(temp_dir.path().join("src/main.cpp"), "int main() {}\n").unwrap();

    for build_dir in ["src", "./src", "."] {
        sysbuild_cmd()
            .current_dir(&temp_dir)
            .args(["--clean", "--build-dir", build_dir])
            .assert()
            .code(1)
            .stderr(predicate::str::contains("buildDir"));
    }

    assert!(temp_dir.path().join("src/main.cpp").is_file());
}

#[test]
fn test_watch_rejects_run_flags() {
    let temp_dir = TempDir::new().unwrap();

    for flag in ["--run", "--gdb", "--valgrind"] {
        sysbuild_cmd()
            .current_dir(&temp_dir)
            .args(["--watch", flag])
            .assert()
            .failure()
            .stderr(predicate::str::contains("cannot be used with"));
    }
}

#[cfg(unix)]
#[test]
fn test_run_under_emulator_passes_arguments() {
    let temp_dir = stub_toolchain_project();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .args(["--qemu", "echo", "--", "hello-from-args"])
        .assert()
        .success()
        .stdout(predicate::str::contains("hello-from-args"));
}

#[cfg(unix)]
#[test]
fn test_run_exit_code_is_propagated() {
    let temp_dir = stub_toolchain_project();

    sysbuild_cmd()
        .current_dir(&temp_dir)
        .args(["--qemu", "false"])
        .assert()
        .code(1);
}

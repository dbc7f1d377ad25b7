// routing-filter - Build Task Runner
// Unified build system using cargo xtask pattern

use anyhow::{Context, Result};
use std::path::PathBuf;
use xshell::{Shell, cmd};

fn main() -> Result<()> {
    let sh = Shell::new()?;
    sh.change_dir(project_root());
    let args: Vec<_> = std::env::args().skip(1).collect();

    match args.first().map(|s| s.as_str()) {
        Some("build") => {
            let release = args.contains(&"--release".to_string());
            build(&sh, release)
        },
        Some("test") => test(&sh),
        Some("format") => {
            let check = args.contains(&"--check".to_string());
            format(&sh, check)
        },
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("clean") => clean(&sh),
        Some("ci") => ci(&sh),
        _ => {
            print_help();
            Ok(())
        },
    }
}

fn print_help() {
    println!("routing-filter - Build Commands:");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  build [--release]   Build the library and demo server");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code (check mode doesn't modify)");
    println!("  clippy              Run clippy checks");
    println!("  run [ARGS...]       Build and run the demo server");
    println!("  clean               Clean build artifacts");
    println!("  ci                  Run all CI checks (format + clippy + build + test)");
    println!();
    println!("Examples:");
    println!("  cargo xtask build --release");
    println!("  cargo xtask run -- --port 3000");
    println!("  cargo xtask format --check");
}

/// Build the routing-filter crate
fn build(sh: &Shell, release: bool) -> Result<()> {
    println!("🦀 Building routing-filter{}...", if release { " (release)" } else { "" });

    if release {
        cmd!(sh, "cargo build --release -p routing-filter")
            .run()
            .context("Failed to build in release mode")?;
    } else {
        cmd!(sh, "cargo build -p routing-filter")
            .run()
            .context("Failed to build")?;
    }

    println!("✅ Build complete");
    Ok(())
}

/// Run all tests
fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");

    cmd!(sh, "cargo test --workspace").run().context("Tests failed")?;

    println!("✅ All tests passed!");
    Ok(())
}

/// Format code
fn format(sh: &Shell, check: bool) -> Result<()> {
    println!("🎨 Formatting Rust code...");

    if check {
        cmd!(sh, "cargo fmt --all -- --check")
            .run()
            .context("Rust code is not formatted")?;
        println!("✅ Rust code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format Rust code")?;
        println!("✅ Rust code formatted");
    }

    Ok(())
}

/// Run clippy checks
fn clippy(sh: &Shell) -> Result<()> {
    cmd!(sh, "cargo clippy --workspace --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;

    Ok(())
}

/// Build and run the demo server
fn run(sh: &Shell, args: &[String]) -> Result<()> {
    build(sh, false)?;

    println!();
    println!("▶️  Starting routing-filter...");

    let mut cmd = cmd!(sh, "cargo run -p routing-filter --");
    for arg in args.iter().filter(|a| a.as_str() != "--") {
        cmd = cmd.arg(arg);
    }

    cmd.run().context("Failed to run application")?;
    Ok(())
}

/// Clean build artifacts
fn clean(sh: &Shell) -> Result<()> {
    println!("🧹 Cleaning build artifacts...");

    cmd!(sh, "cargo clean").run()?;

    let logs = project_root().join("logs");
    if logs.exists() {
        sh.remove_path(&logs)?;
    }

    println!("✅ Clean complete!");
    Ok(())
}

/// Run all CI checks (format + clippy + build + test)
fn ci(sh: &Shell) -> Result<()> {
    println!("🔄 Running CI pipeline...");
    println!();

    println!("📝 [1/4] Checking code format...");
    format(sh, true)?;
    println!();

    println!("🔍 [2/4] Running clippy checks...");
    clippy(sh)?;
    println!();

    println!("🔨 [3/4] Building project...");
    build(sh, true)?;
    println!();

    println!("🧪 [4/4] Running tests...");
    test(sh)?;
    println!();

    println!("🎉 CI pipeline completed successfully!");
    Ok(())
}

fn project_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
}

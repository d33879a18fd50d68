//! Build automation for the ldap-conn-pool workspace.
//!
//! Run with `cargo xtask <command>`. Every check runs once per feature set
//! of the pool crate, so the optional `ldap3` backend is linted and tested
//! alongside the trait-only build.

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use xshell::{Shell, cmd};

const POOL_CRATE: &str = "ldap-conn-pool";

/// Feature sets the pool crate must build and pass tests with.
const FEATURE_SETS: &[&[&str]] = &[&[], &["ldap3"]];

/// Selects the ldap3-gated integration tests.
const INTEGRATION: &[&str] = &["-p", POOL_CRATE, "--features", "ldap3", "--test", "integration"];

/// Variables the live-server tests read.
const LIVE_ENV: &[&str] = &[
    "LDAP_URL",
    "LDAP_BIND_DN",
    "LDAP_BIND_PASSWORD",
    "LDAP_BASE_DN",
];

#[derive(Parser)]
#[command(name = "xtask", about = "Build automation for ldap-conn-pool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Formatting, lints for each feature set, mock-backed tests and docs
    Ci,
    /// Check formatting and run clippy for each feature set
    Lint {
        /// Apply formatting instead of checking it
        #[arg(long)]
        fix: bool,
    },
    /// Run the test suites
    Test {
        /// Which ignored suites to include besides the mock-backed tests
        #[arg(long, value_enum, default_value_t = Suite::Mock)]
        suite: Suite,
    },
    /// Build the API docs with the ldap3 backend included
    Doc {
        /// Open documentation in browser
        #[arg(long)]
        open: bool,
    },
    /// Run the pool example against the server named by LDAP_URL
    Example,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Suite {
    /// In-memory mock directory only
    Mock,
    /// Tests marked `Requires LDAP server`; needs LDAP_URL
    Live,
    /// Tests marked `Requires Docker`; starts an OpenLDAP container
    Docker,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let sh = Shell::new()?;
    sh.change_dir(workspace_root()?);

    match cli.command {
        Command::Ci => {
            lint(&sh, false)?;
            test(&sh, Suite::Mock)?;
            doc(&sh, false)?;
            println!("\n✅ All CI checks passed!");
        }
        Command::Lint { fix } => lint(&sh, fix)?,
        Command::Test { suite } => test(&sh, suite)?,
        Command::Doc { open } => doc(&sh, open)?,
        Command::Example => example(&sh)?,
    }

    Ok(())
}

fn workspace_root() -> Result<PathBuf> {
    let manifest = env!("CARGO_MANIFEST_DIR");
    PathBuf::from(manifest)
        .parent()
        .map(PathBuf::from)
        .context("xtask must live one level below the workspace root")
}

/// `--features a,b` arguments for one feature set.
fn feature_args(features: &[&str]) -> Vec<String> {
    if features.is_empty() {
        Vec::new()
    } else {
        vec!["--features".to_string(), features.join(",")]
    }
}

fn label(features: &[&str]) -> String {
    if features.is_empty() {
        "no features".to_string()
    } else {
        features.join(", ")
    }
}

fn lint(sh: &Shell, fix: bool) -> Result<()> {
    if fix {
        cmd!(sh, "cargo fmt --all").run()?;
    } else {
        cmd!(sh, "cargo fmt --all -- --check").run()?;
    }

    for features in FEATURE_SETS {
        println!("Clippy ({})...", label(features));
        let args = feature_args(features);
        let packages = ["-p", POOL_CRATE, "-p", "ldap-pool-testing"];
        cmd!(sh, "cargo clippy {packages...} {args...} --all-targets -- -D warnings").run()?;
    }
    cmd!(sh, "cargo clippy -p xtask -- -D warnings").run()?;

    println!("✅ Lints passed.");
    Ok(())
}

fn test(sh: &Shell, suite: Suite) -> Result<()> {
    match suite {
        Suite::Mock => {
            cmd!(sh, "cargo test -p ldap-pool-testing").run()?;
            for features in FEATURE_SETS {
                println!("Tests ({})...", label(features));
                let args = feature_args(features);
                cmd!(sh, "cargo test -p {POOL_CRATE} {args...}").run()?;
            }
        }
        Suite::Live => {
            if std::env::var_os("LDAP_URL").is_none() {
                bail!("LDAP_URL must point at a test server for the live suite");
            }
            for var in LIVE_ENV.iter().filter(|var| std::env::var_os(var).is_none()) {
                println!("{var} not set, the tests fall back to their defaults");
            }
            let filter = ["--ignored", "--skip", "container"];
            cmd!(sh, "cargo test {INTEGRATION...} -- {filter...}").run()?;
        }
        Suite::Docker => {
            let filter = ["--ignored", "container"];
            cmd!(sh, "cargo test {INTEGRATION...} -- {filter...}").run()?;
        }
    }

    println!("✅ Tests passed.");
    Ok(())
}

fn doc(sh: &Shell, open: bool) -> Result<()> {
    let open = open.then_some("--open");
    let _env = sh.push_env("RUSTDOCFLAGS", "-D warnings");
    cmd!(sh, "cargo doc -p {POOL_CRATE} --features ldap3 --no-deps {open...}").run()?;
    Ok(())
}

fn example(sh: &Shell) -> Result<()> {
    if std::env::var_os("LDAP_URL").is_none() {
        println!("LDAP_URL not set, the example connects to ldap://localhost:389");
    }
    cmd!(sh, "cargo run -p {POOL_CRATE} --features ldap3 --example ldap_pool").run()?;
    Ok(())
}

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

use incdiff_core::manifest::{self, Manifest, ScanOptions};
use incdiff_core::materialize::materialize;
use incdiff_core::path_safety::is_absent_or_empty_dir;
use incdiff_core::script::ScriptDialect;
use incdiff_core::Error;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ScriptType {
    Bash,
    Bat,
    Psh,
}

impl ScriptType {
    fn native() -> Self {
        match ScriptDialect::native() {
            ScriptDialect::PowerShell => ScriptType::Psh,
            ScriptDialect::Batch => ScriptType::Bat,
            ScriptDialect::Bash => ScriptType::Bash,
        }
    }
}

impl From<ScriptType> for ScriptDialect {
    fn from(t: ScriptType) -> Self {
        match t {
            ScriptType::Bash => ScriptDialect::Bash,
            ScriptType::Bat => ScriptDialect::Batch,
            ScriptType::Psh => ScriptDialect::PowerShell,
        }
    }
}

#[derive(Parser)]
#[command(name = "incdiff", version, about = "Snapshot a directory and build incremental diffs")]
struct Cli {
    /// More log output (-v info, -vv debug); RUST_LOG takes precedence
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Generate a hash manifest for a directory
    Hash {
        /// Manifest file to write
        #[arg(short, long)]
        output: PathBuf,
        /// Previous manifest to compare against
        #[arg(short = 'l', long = "last-hash")]
        last_hash: Option<PathBuf>,
        /// Glob of relative paths to leave out (repeatable)
        #[arg(long)]
        exclude: Vec<String>,
        /// Descend into symlinked directories
        #[arg(long, default_value_t = false)]
        follow_links: bool,
        directory: PathBuf,
    },
    /// Make a diff directory and cleanup script from a manifest
    Make {
        /// Output directory (must be absent or empty)
        #[arg(short, long)]
        output: PathBuf,
        /// Manifest produced by `hash`
        #[arg(short = 'H', long = "hash")]
        hash_file: PathBuf,
        /// Script name, without extension
        #[arg(short, long = "script", default_value = "clean")]
        script_name: String,
        /// Script dialect
        #[arg(short = 't', long = "script-type", value_enum, default_value_t = ScriptType::native())]
        script_type: ScriptType,
        directory: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.cmd) {
        eprintln!("incdiff: {:#}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(cmd: Cmd) -> Result<()> {
    match cmd {
        Cmd::Hash { output, last_hash, exclude, follow_links, directory } => {
            hash(&output, last_hash.as_deref(), ScanOptions { follow_links, exclude }, &directory)
        }
        Cmd::Make { output, hash_file, script_name, script_type, directory } => {
            make(&output, &hash_file, &script_name, script_type.into(), &directory)
        }
    }
}

fn require_dir(p: &Path) -> Result<()> {
    if !p.is_dir() {
        return Err(Error::PathNotFound(p.to_path_buf()).into());
    }
    Ok(())
}

fn require_file(p: &Path) -> Result<()> {
    if !p.is_file() {
        return Err(Error::PathNotFound(p.to_path_buf()).into());
    }
    Ok(())
}

fn hash(output: &Path, last_hash: Option<&Path>, opts: ScanOptions, dir: &Path) -> Result<()> {
    require_dir(dir)?;
    if let Some(l) = last_hash {
        require_file(l)?;
    }

    let mut mf = Manifest::build_from_directory(dir, &opts)
        .with_context(|| format!("hash {}", dir.display()))?;
    if let Some(l) = last_hash {
        let prev = manifest::load_records(l).with_context(|| format!("read {}", l.display()))?;
        info!(records = prev.len(), "loaded previous manifest");
        mf.reconcile_with(prev);
    }
    mf.save(output).with_context(|| format!("write {}", output.display()))?;

    let s = mf.summary();
    println!(
        "hash: {} files ({} unchanged, {} modified, {} deleted)",
        s.total(),
        s.unchanged,
        s.modified,
        s.deleted
    );
    Ok(())
}

fn make(output: &Path, hash_file: &Path, script_name: &str, dialect: ScriptDialect, dir: &Path) -> Result<()> {
    require_dir(dir)?;
    require_file(hash_file)?;
    if !is_absent_or_empty_dir(output)? {
        return Err(Error::PathConflict(output.to_path_buf()).into());
    }

    let lines = manifest::load_records(hash_file)
        .with_context(|| format!("read {}", hash_file.display()))?;
    let mf = Manifest::from_records(lines);
    let report = materialize(&mf, dir, output)
        .with_context(|| format!("materialize into {}", output.display()))?;

    println!("make: copied {} files, {} deleted", report.copied.len(), report.deleted.len());
    if report.deleted.is_empty() {
        return Ok(());
    }

    let script_path = script_dir(dir)?.join(format!("{}.{}", script_name, dialect.extension()));
    fs::write(&script_path, dialect.render(&report.deleted))
        .with_context(|| format!("write {}", script_path.display()))?;
    println!("script: {}", script_path.display());
    Ok(())
}

/// Directory the cleanup script goes into: the parent of `dir`, or the
/// current directory when `dir` has none.
fn script_dir(dir: &Path) -> Result<PathBuf> {
    match dir.parent() {
        Some(p) if !p.as_os_str().is_empty() => Ok(p.to_path_buf()),
        _ => std::env::current_dir().context("current dir"),
    }
}

//! Migrate command - batch-convert meshes into .ntsm containers
//!
//! Files are converted independently on a bounded thread pool; one failure
//! never stops the others. Results are tallied in [`MigrationStats`].

use anyhow::{Context, Result, bail};
use clap::Args;
use rayon::prelude::*;
use std::collections::HashMap;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::convert::convert_file;
use crate::discover::{SourceFile, find_source_files};
use crate::manifest::{Manifest, load_manifest};

/// Files shown before the listing is elided
const LIST_HEAD: usize = 10;
/// Files shown after the ellipsis
const LIST_TAIL: usize = 5;

/// Arguments for the migrate command
#[derive(Args)]
pub struct MigrateArgs {
    /// Source directory (or single file) containing .obj/.glb meshes
    #[arg(long, default_value = "./uploads")]
    pub src: PathBuf,

    /// Destination directory for .ntsm files
    #[arg(long, default_value = "./uploads-ntsm")]
    pub dst: PathBuf,

    /// Number of concurrent conversions
    #[arg(short, long, default_value_t = 4)]
    pub concurrency: usize,

    /// Convert and encode everything but write nothing
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    pub yes: bool,

    /// ntsm.toml with per-asset flags, emitters and textures
    #[arg(short, long)]
    pub manifest: Option<PathBuf>,
}

/// Thread-safe tally of a migration run
#[derive(Debug, Default)]
pub struct MigrationStats {
    succeeded: AtomicUsize,
    failed: AtomicUsize,
    bytes_written: AtomicU64,
    failures: Mutex<Vec<(PathBuf, String)>>,
}

impl MigrationStats {
    pub fn record_success(&self, bytes: u64) {
        self.succeeded.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn record_failure(&self, path: &Path, error: &anyhow::Error) {
        self.failed.fetch_add(1, Ordering::Relaxed);
        let mut failures = self
            .failures
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failures.push((path.to_path_buf(), format!("{error:#}")));
    }

    pub fn succeeded(&self) -> usize {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::Relaxed)
    }

    /// Failures sorted by path
    pub fn into_failures(self) -> Vec<(PathBuf, String)> {
        let mut failures = self
            .failures
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        failures.sort();
        failures
    }
}

/// Execute the migrate command
pub fn execute(args: MigrateArgs) -> Result<()> {
    if args.concurrency == 0 {
        bail!("--concurrency must be at least 1");
    }

    let files = find_source_files(&args.src)?;
    if files.is_empty() {
        bail!("No .obj or .glb files found in {}", args.src.display());
    }

    let manifest = match &args.manifest {
        Some(path) => load_manifest(path)?,
        None => Manifest::default(),
    };
    let relatives: Vec<&Path> = files.iter().map(|f| f.relative.as_path()).collect();
    for source in manifest.unmatched(&relatives) {
        tracing::warn!("Manifest entry {} matches no source file", source.display());
    }

    let names: Vec<String> = files.iter().map(|f| f.path.display().to_string()).collect();
    println!("Found {} assets to convert:", files.len());
    for line in listing(&names) {
        println!("  {line}");
    }
    println!();
    println!("Source: {}", args.src.display());
    println!("Destination: {}", args.dst.display());
    println!("Concurrency: {} workers", args.concurrency);
    if args.dry_run {
        println!("Mode: DRY RUN (no files will be written)");
    }

    if !args.yes {
        print!("\nProceed with migration? [y/N] ");
        std::io::stdout().flush()?;
        if !confirm(&mut std::io::stdin().lock())? {
            println!("Migration aborted.");
            return Ok(());
        }
    }

    if !args.dry_run {
        std::fs::create_dir_all(&args.dst).with_context(|| {
            format!("Failed to create destination directory: {}", args.dst.display())
        })?;
    }

    let start = Instant::now();
    let stats = run(&files, &manifest, &args.dst, args.concurrency, args.dry_run)?;
    let elapsed = start.elapsed();

    let succeeded = stats.succeeded();
    let failed = stats.failed();
    let bytes = stats.bytes_written();

    println!();
    println!("Migration completed in {}", format_duration(elapsed));
    println!("✓ Successfully converted: {succeeded}");
    println!("✗ Failed: {failed}");
    if !args.dry_run {
        println!("Wrote {bytes} bytes");
    }

    if failed > 0 {
        println!();
        for (path, error) in stats.into_failures() {
            println!("  {}: {}", path.display(), error);
        }
        bail!("{failed} of {} files failed to convert", files.len());
    }

    Ok(())
}

/// Convert every file on a pool of `concurrency` workers.
///
/// Sources that map to the same output path (`a.obj` and `a.glb`) are all
/// recorded as failures and none of them is written.
pub fn run(
    files: &[SourceFile],
    manifest: &Manifest,
    dst: &Path,
    concurrency: usize,
    dry_run: bool,
) -> Result<MigrationStats> {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(concurrency)
        .thread_name(|i| format!("ntsm-worker-{i}"))
        .build()
        .context("Failed to start worker pool")?;

    let mut by_destination: HashMap<PathBuf, Vec<&Path>> = HashMap::new();
    for file in files {
        by_destination
            .entry(file.destination(dst))
            .or_default()
            .push(&file.relative);
    }

    let stats = MigrationStats::default();
    pool.install(|| {
        files.par_iter().for_each(|file| {
            let dst_path = file.destination(dst);
            if let Some(sources) = by_destination.get(&dst_path).filter(|s| s.len() > 1) {
                let others: Vec<String> = sources
                    .iter()
                    .filter(|s| **s != file.relative.as_path())
                    .map(|s| s.display().to_string())
                    .collect();
                let e = anyhow::anyhow!(
                    "Output {} is also produced by {}",
                    dst_path.display(),
                    others.join(", ")
                );
                tracing::warn!("Skipped: {}: {}", file.relative.display(), e);
                stats.record_failure(&file.path, &e);
                return;
            }
            tracing::debug!("Converting {} -> {}", file.relative.display(), dst_path.display());

            match migrate_file(file, manifest, &dst_path, dry_run) {
                Ok(bytes) => {
                    tracing::info!("Converted: {}", file.relative.display());
                    stats.record_success(bytes);
                }
                Err(e) => {
                    tracing::warn!("Failed: {}: {:#}", file.relative.display(), e);
                    stats.record_failure(&file.path, &e);
                }
            }
        });
    });

    Ok(stats)
}

/// Convert one file; returns the number of bytes written (0 on dry runs)
fn migrate_file(
    file: &SourceFile,
    manifest: &Manifest,
    dst_path: &Path,
    dry_run: bool,
) -> Result<u64> {
    let plan = manifest.plan_for(&file.relative)?;
    let bytes = convert_file(file, &plan)?;

    if dry_run {
        return Ok(0);
    }

    if let Some(parent) = dst_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    std::fs::write(dst_path, &bytes)
        .with_context(|| format!("Failed to write {}", dst_path.display()))?;
    Ok(bytes.len() as u64)
}

/// Lines to print for a file list: the first 10, "...", then the last 5
fn listing(names: &[String]) -> Vec<&str> {
    let tail_start = names.len().saturating_sub(LIST_TAIL);
    let mut lines = Vec::new();
    for (i, name) in names.iter().enumerate() {
        if i < LIST_HEAD || i >= tail_start {
            lines.push(name.as_str());
        } else if i == LIST_HEAD {
            lines.push("...");
        }
    }
    lines
}

/// Read a y/N answer; anything but "y"/"yes" declines
fn confirm(input: &mut impl BufRead) -> Result<bool> {
    let mut line = String::new();
    input.read_line(&mut line).context("Failed to read answer")?;
    let answer = line.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

fn format_duration(d: Duration) -> String {
    if d.as_secs() >= 1 {
        format!("{:.2}s", d.as_secs_f64())
    } else {
        format!("{}ms", d.as_millis())
    }
}

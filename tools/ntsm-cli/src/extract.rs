//! Extract command - write the GLB and texture blobs of an .ntsm file

use anyhow::{Context, Result, bail};
use clap::Args;
use ntsm_format::NtsmReader;
use std::collections::HashSet;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Arguments for the extract command
#[derive(Args)]
pub struct ExtractArgs {
    /// .ntsm file to extract
    pub file: PathBuf,

    /// Output directory
    #[arg(short, long, default_value = ".")]
    pub output: PathBuf,
}

/// Execute the extract command
pub fn execute(args: ExtractArgs) -> Result<()> {
    let file = File::open(&args.file)
        .with_context(|| format!("Failed to open {}", args.file.display()))?;
    let mut reader = NtsmReader::new(BufReader::new(file))
        .with_context(|| format!("Invalid NTSM file: {}", args.file.display()))?;

    std::fs::create_dir_all(&args.output)
        .with_context(|| format!("Failed to create {}", args.output.display()))?;

    let name = match sanitize(&reader.header().name) {
        Some(name) => name,
        None => args
            .file
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "model".to_string()),
    };

    let glb_name = format!("{name}.glb");
    let glb_path = args.output.join(&glb_name);
    write(&glb_path, &reader.read_glb()?)?;
    println!("  {}", glb_path.display());

    let mut used = HashSet::from([glb_name]);
    for (index, item) in reader.textures().enumerate() {
        let (entry, blob) = item?;
        let file_name = texture_file_name(&mut used, &entry.name, index);
        let path = args.output.join(&file_name);
        write(&path, &blob)?;
        println!("  {}", path.display());
    }

    tracing::info!("Extracted {} to {}", args.file.display(), args.output.display());
    Ok(())
}

fn write(path: &Path, data: &[u8]) -> Result<()> {
    if path.exists() && path.is_dir() {
        bail!("{} is a directory", path.display());
    }
    std::fs::write(path, data).with_context(|| format!("Failed to write {}", path.display()))
}

/// Output file name for texture `index`, distinct from every name in `used`
fn texture_file_name(used: &mut HashSet<String>, name: &str, index: usize) -> String {
    let base = sanitize(name).unwrap_or_else(|| format!("texture_{index}"));
    let mut candidate = base.clone();
    let mut attempt = 0;
    while !used.insert(candidate.clone()) {
        candidate = match attempt {
            0 => format!("{index}_{base}"),
            n => format!("{index}_{n}_{base}"),
        };
        attempt += 1;
    }
    candidate
}

/// Reduce an embedded name to a single safe path component
fn sanitize(name: &str) -> Option<String> {
    let cleaned: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned.to_string())
    }
}

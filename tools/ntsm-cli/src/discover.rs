//! Source file discovery for batch migration

use anyhow::{Context, Result};
use ntsm_format::NTSM_EXT;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Mesh formats the converter understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Obj,
    Glb,
}

impl SourceKind {
    /// Detect by extension, ignoring case
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "obj" => Some(Self::Obj),
            "glb" => Some(Self::Glb),
            _ => None,
        }
    }
}

/// One file to convert
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    /// Path relative to the source root (the file name when the root is a file)
    pub relative: PathBuf,
    pub kind: SourceKind,
}

impl SourceFile {
    /// Where the converted container lands under `dst`
    pub fn destination(&self, dst: &Path) -> PathBuf {
        dst.join(&self.relative).with_extension(NTSM_EXT)
    }

    /// Asset name derived from the file stem
    pub fn stem(&self) -> String {
        self.path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default()
    }
}

/// Collect every .obj/.glb under `src`, sorted by relative path.
///
/// A `src` that is itself a convertible file yields just that file.
pub fn find_source_files(src: &Path) -> Result<Vec<SourceFile>> {
    let meta = std::fs::metadata(src)
        .with_context(|| format!("Source path does not exist: {}", src.display()))?;

    if meta.is_file() {
        let Some(kind) = SourceKind::from_path(src) else {
            anyhow::bail!("Unsupported source file: {} (use .obj or .glb)", src.display());
        };
        let relative = src.file_name().map(PathBuf::from).unwrap_or_default();
        return Ok(vec![SourceFile {
            path: src.to_path_buf(),
            relative,
            kind,
        }]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.with_context(|| format!("Failed to scan {}", src.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if let Some(kind) = SourceKind::from_path(path) {
            let relative = path.strip_prefix(src).unwrap_or(path).to_path_buf();
            files.push(SourceFile {
                path: path.to_path_buf(),
                relative,
                kind,
            });
        }
    }

    files.sort_by(|a, b| a.relative.cmp(&b.relative));
    tracing::debug!("Found {} source files under {}", files.len(), src.display());
    Ok(files)
}

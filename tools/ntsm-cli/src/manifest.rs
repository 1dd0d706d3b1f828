//! ntsm.toml manifest parsing
//!
//! The manifest attaches container metadata that mesh files cannot carry:
//! flags, particle emitters and embedded textures.
//!
//! ```toml
//! [defaults]
//! flags = ["world_space"]
//!
//! [[asset]]
//! source = "weapons/sword.obj"
//! name = "sword"
//! flags = ["collision"]
//! textures = [{ name = "spark", path = "fx/spark.png" }]
//!
//! [[asset.emitters]]
//! position = [0.0, 1.2, 0.0]
//! texture_index = 0
//! ```

use anyhow::{Context, Result, bail};
use ntsm_format::{FLAG_HAS_PARTICLES, ParticleEmitter, flag_from_name};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// ntsm.toml manifest structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default, rename = "asset")]
    pub assets: Vec<AssetEntry>,

    /// Directory texture paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Settings applied to every converted file
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    #[serde(default)]
    pub flags: Vec<String>,
}

/// Per-asset overrides, keyed by source path relative to `--src`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssetEntry {
    pub source: PathBuf,
    /// Defaults to the source file stem
    pub name: Option<String>,
    #[serde(default)]
    pub flags: Vec<String>,
    #[serde(default)]
    pub textures: Vec<TextureEntry>,
    /// has_particles is set exactly when this list is non-empty
    #[serde(default)]
    pub emitters: Vec<ParticleEmitter>,
}

/// Texture embedded into an asset
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextureEntry {
    pub name: String,
    /// Relative to the manifest's directory
    pub path: PathBuf,
}

/// Everything needed to build one container besides the GLB
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssetPlan {
    pub name: Option<String>,
    pub flags: u8,
    pub emitters: Vec<ParticleEmitter>,
    /// `(texture name, absolute path)` in table order
    pub textures: Vec<(String, PathBuf)>,
}

/// Load and validate a manifest
pub fn load_manifest(path: &Path) -> Result<Manifest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
    let mut manifest: Manifest = toml::from_str(&content)
        .with_context(|| format!("Failed to parse manifest: {}", path.display()))?;
    manifest.base_dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
    manifest.validate()?;
    Ok(manifest)
}

impl Manifest {
    /// Check flag names, duplicate sources and emitter texture references
    pub fn validate(&self) -> Result<()> {
        parse_flags(&self.defaults.flags).context("Invalid [defaults] flags")?;

        let mut seen = HashSet::new();
        for asset in &self.assets {
            let source = asset.source.display();
            if !seen.insert(asset.source.as_path()) {
                bail!("Asset '{}' is listed more than once", source);
            }
            parse_flags(&asset.flags).with_context(|| format!("Invalid flags for '{}'", source))?;

            for (i, emitter) in asset.emitters.iter().enumerate() {
                let index = emitter.texture_index;
                if !emitter.uses_default_texture()
                    && (index < 0 || index as usize >= asset.textures.len())
                {
                    bail!(
                        "Emitter #{} of '{}' references texture {} but only {} are declared",
                        i,
                        source,
                        index,
                        asset.textures.len()
                    );
                }
            }
        }
        Ok(())
    }

    /// Resolve the plan for a source file at `relative` under the source root
    pub fn plan_for(&self, relative: &Path) -> Result<AssetPlan> {
        let mut flags = parse_flags(&self.defaults.flags)?;

        let Some(asset) = self.assets.iter().find(|a| a.source == relative) else {
            return Ok(AssetPlan {
                flags,
                ..AssetPlan::default()
            });
        };

        flags |= parse_flags(&asset.flags)?;
        if !asset.emitters.is_empty() {
            flags |= FLAG_HAS_PARTICLES;
        }

        Ok(AssetPlan {
            name: asset.name.clone(),
            flags,
            emitters: asset.emitters.clone(),
            textures: asset
                .textures
                .iter()
                .map(|t| (t.name.clone(), self.base_dir.join(&t.path)))
                .collect(),
        })
    }

    /// Manifest entries that matched none of the discovered files
    pub fn unmatched<'a>(&'a self, relatives: &[&Path]) -> Vec<&'a Path> {
        self.assets
            .iter()
            .map(|a| a.source.as_path())
            .filter(|source| !relatives.contains(source))
            .collect()
    }
}

/// Combine flag names into a bitfield. has_particles cannot be set by name.
pub fn parse_flags(names: &[String]) -> Result<u8> {
    names.iter().try_fold(0u8, |acc, name| match flag_from_name(name) {
        Some(bit) => Ok(acc | bit),
        None => bail!(
            "Unknown flag '{}' (expected world_space, animate_uv or collision)",
            name
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntsm_format::{FLAG_COLLISION, FLAG_WORLD_SPACE};

    const MANIFEST: &str = r#"
[defaults]
flags = ["world_space"]

[[asset]]
source = "weapons/sword.obj"
name = "blade"
flags = ["collision"]
textures = [{ name = "spark", path = "fx/spark.png" }]

[[asset.emitters]]
position = [0.0, 1.0, 0.0]
texture_index = 0

[[asset.emitters]]
gravity = -2.5
"#;

    fn parse(content: &str) -> Manifest {
        let mut manifest: Manifest = toml::from_str(content).unwrap();
        manifest.base_dir = PathBuf::from("/assets");
        manifest
    }

    #[test]
    fn test_plan_for_listed_asset() {
        let manifest = parse(MANIFEST);
        manifest.validate().unwrap();

        let plan = manifest.plan_for(Path::new("weapons/sword.obj")).unwrap();
        assert_eq!(plan.name.as_deref(), Some("blade"));
        assert_eq!(plan.flags, FLAG_WORLD_SPACE | FLAG_COLLISION | FLAG_HAS_PARTICLES);
        assert_eq!(plan.emitters.len(), 2);
        assert_eq!(plan.emitters[0].position, [0.0, 1.0, 0.0]);
        assert_eq!(plan.emitters[0].texture_index, 0);
        // Unset fields keep their defaults
        assert_eq!(plan.emitters[1].gravity, -2.5);
        assert_eq!(plan.emitters[1].texture_index, -1);
        assert_eq!(plan.emitters[1].spread_angle, ParticleEmitter::default().spread_angle);
        assert_eq!(
            plan.textures,
            vec![("spark".to_string(), PathBuf::from("/assets/fx/spark.png"))]
        );
    }

    #[test]
    fn test_plan_for_unlisted_asset() {
        let manifest = parse(MANIFEST);
        let plan = manifest.plan_for(Path::new("hat.glb")).unwrap();
        assert_eq!(plan.flags, FLAG_WORLD_SPACE);
        assert!(plan.name.is_none());
        assert!(plan.emitters.is_empty());
    }

    #[test]
    fn test_has_particles_not_nameable() {
        assert!(parse_flags(&["has_particles".to_string()]).is_err());
        assert!(parse_flags(&["glow".to_string()]).is_err());
        assert_eq!(parse_flags(&[]).unwrap(), 0);
    }

    #[test]
    fn test_bad_texture_reference() {
        let manifest = parse(
            r#"
[[asset]]
source = "a.obj"

[[asset.emitters]]
texture_index = 2
"#,
        );
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_duplicate_source() {
        let manifest = parse("[[asset]]\nsource = \"a.obj\"\n[[asset]]\nsource = \"a.obj\"\n");
        assert!(manifest.validate().is_err());
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(toml::from_str::<Manifest>("[[asset]]\nsource = \"a.obj\"\ncolour = 1\n").is_err());
    }

    #[test]
    fn test_unmatched_entries() {
        let manifest = parse(MANIFEST);
        assert!(manifest.unmatched(&[Path::new("weapons/sword.obj")]).is_empty());
        assert_eq!(manifest.unmatched(&[]), vec![Path::new("weapons/sword.obj")]);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ntsm.toml");
        std::fs::write(&path, MANIFEST).unwrap();

        let manifest = load_manifest(&path).unwrap();
        assert_eq!(manifest.base_dir, dir.path());
        assert_eq!(manifest.assets.len(), 1);
    }
}

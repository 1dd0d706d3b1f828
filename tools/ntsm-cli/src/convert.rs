//! Per-file conversion: source mesh + manifest plan -> encoded NTSM bytes

use anyhow::{Context, Result};
use ntsm_format::{Container, Texture};

use crate::discover::{SourceFile, SourceKind};
use crate::glb::mesh_to_glb;
use crate::manifest::AssetPlan;
use crate::obj::parse_obj;

/// Produce the GLB blob for a source file
///
/// GLB sources are checked structurally and passed through unchanged.
pub fn load_glb(file: &SourceFile, name: &str) -> Result<Vec<u8>> {
    let data = std::fs::read(&file.path)
        .with_context(|| format!("Failed to read {}", file.path.display()))?;

    match file.kind {
        SourceKind::Glb => {
            gltf::Glb::from_slice(&data)
                .with_context(|| format!("Invalid GLB: {}", file.path.display()))?;
            Ok(data)
        }
        SourceKind::Obj => {
            let text = String::from_utf8_lossy(&data);
            let mesh = parse_obj(&text)
                .with_context(|| format!("Failed to parse OBJ: {}", file.path.display()))?;
            tracing::debug!(
                "Converting OBJ {} ({} vertices, {} triangles)",
                file.path.display(),
                mesh.vertex_count(),
                mesh.triangle_count()
            );
            mesh_to_glb(name, &mesh)
                .with_context(|| format!("GLB export failed: {}", file.path.display()))
        }
    }
}

/// Build the container for one source file
pub fn build_container(file: &SourceFile, plan: &AssetPlan) -> Result<Container> {
    let name = plan.name.clone().unwrap_or_else(|| file.stem());
    let glb = load_glb(file, &name)?;

    let textures = plan
        .textures
        .iter()
        .map(|(tex_name, path)| {
            let data = std::fs::read(path)
                .with_context(|| format!("Failed to read texture: {}", path.display()))?;
            Ok(Texture::new(tex_name, data))
        })
        .collect::<Result<Vec<_>>>()?;

    Container::new(&name, plan.flags, glb, plan.emitters.clone(), textures)
        .with_context(|| format!("Failed to build container for {}", file.path.display()))
}

/// Convert one file to encoded NTSM bytes
pub fn convert_file(file: &SourceFile, plan: &AssetPlan) -> Result<Vec<u8>> {
    let container = build_container(file, plan)?;
    container
        .encode()
        .with_context(|| format!("Failed to encode {}", file.path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ntsm_format::{FLAG_HAS_PARTICLES, ParticleEmitter};
    use std::path::{Path, PathBuf};

    fn source(dir: &Path, name: &str, contents: &[u8]) -> SourceFile {
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        SourceFile {
            kind: SourceKind::from_path(&path).unwrap(),
            relative: PathBuf::from(name),
            path,
        }
    }

    #[test]
    fn test_obj_converts_to_decodable_container() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(dir.path(), "tri.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");

        let bytes = convert_file(&file, &AssetPlan::default()).unwrap();
        let container = Container::decode(&bytes).unwrap();
        assert_eq!(container.name(), "tri");
        assert!(!container.has_particles());
        assert!(gltf::Gltf::from_slice(&container.glb).is_ok());
    }

    #[test]
    fn test_glb_passthrough_is_byte_identical() {
        let dir = tempfile::tempdir().unwrap();
        let obj = source(dir.path(), "tri.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let glb = load_glb(&obj, "tri").unwrap();
        let file = source(dir.path(), "tri.glb", &glb);

        let container = build_container(&file, &AssetPlan::default()).unwrap();
        assert_eq!(container.glb, glb);
    }

    #[test]
    fn test_invalid_glb_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(dir.path(), "junk.glb", b"definitely not a glb file");
        assert!(convert_file(&file, &AssetPlan::default()).is_err());
    }

    #[test]
    fn test_plan_applied() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(dir.path(), "torch.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        std::fs::write(dir.path().join("flame.png"), [1u8, 2, 3]).unwrap();

        let plan = AssetPlan {
            name: Some("wall_torch".to_string()),
            flags: FLAG_HAS_PARTICLES,
            emitters: vec![ParticleEmitter {
                texture_index: 0,
                ..ParticleEmitter::default()
            }],
            textures: vec![("flame".to_string(), dir.path().join("flame.png"))],
        };
        let container = Container::decode(&convert_file(&file, &plan).unwrap()).unwrap();
        assert_eq!(container.name(), "wall_torch");
        assert_eq!(container.emitters.len(), 1);
        assert_eq!(container.find_texture("flame").unwrap().data, vec![1, 2, 3]);
    }

    #[test]
    fn test_missing_texture_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = source(dir.path(), "a.obj", b"v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3\n");
        let plan = AssetPlan {
            textures: vec![("t".to_string(), dir.path().join("missing.png"))],
            ..AssetPlan::default()
        };
        assert!(convert_file(&file, &plan).is_err());
    }
}

//! GLB 2.0 assembly for converted meshes
//!
//! Builds a single-buffer, single-mesh glTF document with `gltf-json` and
//! packs it into the binary container: 12-byte header, JSON chunk, BIN chunk,
//! each chunk padded to 4 bytes.

use anyhow::{Context, Result};
use gltf_json as json;
use gltf_json::validation::Checked::Valid;
use std::collections::BTreeMap;

use crate::obj::ObjMesh;

const CHUNK_JSON: u32 = 0x4E4F534A; // "JSON"
const CHUNK_BIN: u32 = 0x004E4942; // "BIN\0"

/// Binary buffer with its views and accessors
#[derive(Default)]
struct BufferBuilder {
    buffer: Vec<u8>,
    views: Vec<json::buffer::View>,
    accessors: Vec<json::Accessor>,
}

impl BufferBuilder {
    /// Append `bytes` as a new view and describe it with one accessor
    fn pack(
        &mut self,
        bytes: &[u8],
        count: usize,
        component: json::accessor::ComponentType,
        type_: json::accessor::Type,
        target: json::buffer::Target,
        bounds: Option<([f32; 3], [f32; 3])>,
    ) -> json::Index<json::Accessor> {
        let offset = self.buffer.len();
        self.buffer.extend_from_slice(bytes);

        self.views.push(json::buffer::View {
            buffer: json::Index::new(0),
            byte_length: bytes.len().into(),
            byte_offset: Some((offset as u64).into()),
            byte_stride: None,
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            target: Some(Valid(target)),
        });

        let (min, max) = match bounds {
            Some((min, max)) => (Some(to_json_array(&min)), Some(to_json_array(&max))),
            None => (None, None),
        };

        let accessor_idx = self.accessors.len() as u32;
        self.accessors.push(json::Accessor {
            buffer_view: Some(json::Index::new(self.views.len() as u32 - 1)),
            byte_offset: Some(0u64.into()),
            count: count.into(),
            component_type: Valid(json::accessor::GenericComponentType(component)),
            extensions: Default::default(),
            extras: Default::default(),
            type_: Valid(type_),
            min,
            max,
            name: None,
            normalized: false,
            sparse: None,
        });

        // Every view starts on a 4-byte boundary
        let aligned = self.buffer.len().next_multiple_of(4);
        self.buffer.resize(aligned, 0);
        json::Index::new(accessor_idx)
    }
}

fn to_json_array(values: &[f32]) -> json::Value {
    json::Value::Array(values.iter().copied().map(json::Value::from).collect())
}

/// Whether a mesh needs 32-bit indices
pub fn needs_u32_indices(vertex_count: usize) -> bool {
    vertex_count > u16::MAX as usize + 1
}

/// Build a GLB blob containing `mesh` as a single named node
pub fn mesh_to_glb(name: &str, mesh: &ObjMesh) -> Result<Vec<u8>> {
    use json::accessor::{ComponentType, Type};
    use json::buffer::Target;

    let mut buffer = BufferBuilder::default();
    let mut attributes = BTreeMap::new();

    let positions = buffer.pack(
        bytemuck::cast_slice(&mesh.positions),
        mesh.positions.len(),
        ComponentType::F32,
        Type::Vec3,
        Target::ArrayBuffer,
        mesh.bounds(),
    );
    attributes.insert(Valid(json::mesh::Semantic::Positions), positions);

    if let Some(normals) = &mesh.normals {
        let idx = buffer.pack(
            bytemuck::cast_slice(normals),
            normals.len(),
            ComponentType::F32,
            Type::Vec3,
            Target::ArrayBuffer,
            None,
        );
        attributes.insert(Valid(json::mesh::Semantic::Normals), idx);
    }

    if let Some(uvs) = &mesh.uvs {
        let idx = buffer.pack(
            bytemuck::cast_slice(uvs),
            uvs.len(),
            ComponentType::F32,
            Type::Vec2,
            Target::ArrayBuffer,
            None,
        );
        attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), idx);
    }

    let indices = if needs_u32_indices(mesh.vertex_count()) {
        buffer.pack(
            bytemuck::cast_slice(&mesh.indices),
            mesh.indices.len(),
            ComponentType::U32,
            Type::Scalar,
            Target::ElementArrayBuffer,
            None,
        )
    } else {
        let narrow: Vec<u16> = mesh.indices.iter().map(|&i| i as u16).collect();
        buffer.pack(
            bytemuck::cast_slice(&narrow),
            narrow.len(),
            ComponentType::U16,
            Type::Scalar,
            Target::ElementArrayBuffer,
            None,
        )
    };

    let primitive = json::mesh::Primitive {
        attributes,
        extensions: Default::default(),
        extras: Default::default(),
        indices: Some(indices),
        material: None,
        mode: Valid(json::mesh::Mode::Triangles),
        targets: None,
    };

    let root = json::Root {
        accessors: buffer.accessors,
        animations: Vec::new(),
        asset: json::Asset {
            copyright: None,
            extensions: Default::default(),
            extras: Default::default(),
            generator: Some(concat!("ntsm ", env!("CARGO_PKG_VERSION")).to_string()),
            min_version: None,
            version: "2.0".to_string(),
        },
        buffers: vec![json::Buffer {
            byte_length: buffer.buffer.len().into(),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        }],
        buffer_views: buffer.views,
        cameras: Vec::new(),
        extensions: Default::default(),
        extensions_required: Vec::new(),
        extensions_used: Vec::new(),
        extras: Default::default(),
        images: Vec::new(),
        materials: Vec::new(),
        meshes: vec![json::Mesh {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some(name.to_string()),
            primitives: vec![primitive],
            weights: None,
        }],
        nodes: vec![json::Node {
            camera: None,
            children: None,
            extensions: Default::default(),
            extras: Default::default(),
            matrix: None,
            mesh: Some(json::Index::new(0)),
            name: Some(name.to_string()),
            rotation: None,
            scale: None,
            skin: None,
            translation: None,
            weights: None,
        }],
        samplers: Vec::new(),
        scene: Some(json::Index::new(0)),
        scenes: vec![json::Scene {
            extensions: Default::default(),
            extras: Default::default(),
            name: Some("Scene".to_string()),
            nodes: vec![json::Index::new(0)],
        }],
        skins: Vec::new(),
        textures: Vec::new(),
    };

    assemble_glb(&root, &buffer.buffer)
}

/// Assemble GLB binary from JSON and buffer data
pub fn assemble_glb(root: &json::Root, buffer_data: &[u8]) -> Result<Vec<u8>> {
    let json_string =
        json::serialize::to_string(root).context("Failed to serialize glTF JSON")?;
    let json_bytes = json_string.as_bytes();

    let json_padding = (4 - (json_bytes.len() % 4)) % 4;
    let json_chunk_length = json_bytes.len() + json_padding;

    let buffer_padding = (4 - (buffer_data.len() % 4)) % 4;
    let buffer_chunk_length = buffer_data.len() + buffer_padding;

    let total_length = 12 + 8 + json_chunk_length + 8 + buffer_chunk_length;
    let total_length_u32 =
        u32::try_from(total_length).context("GLB exceeds the 4 GiB glTF binary limit")?;

    let mut glb = Vec::with_capacity(total_length);

    // GLB header
    glb.extend_from_slice(b"glTF");
    glb.extend_from_slice(&2u32.to_le_bytes());
    glb.extend_from_slice(&total_length_u32.to_le_bytes());

    // JSON chunk, space padded
    glb.extend_from_slice(&(json_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    glb.extend_from_slice(json_bytes);
    glb.resize(glb.len() + json_padding, 0x20);

    // Binary chunk, zero padded
    glb.extend_from_slice(&(buffer_chunk_length as u32).to_le_bytes());
    glb.extend_from_slice(&CHUNK_BIN.to_le_bytes());
    glb.extend_from_slice(buffer_data);
    glb.resize(glb.len() + buffer_padding, 0);

    Ok(glb)
}

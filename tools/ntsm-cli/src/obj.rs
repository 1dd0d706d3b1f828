//! Wavefront OBJ parsing
//!
//! Supports `v`, `vt`, `vn` and `f` statements. Faces are fan-triangulated and
//! every face corner becomes its own vertex. Indices may be 1-based or
//! negative (relative to the end of the list so far).

use anyhow::{Context, Result, bail};

/// Triangle mesh expanded from an OBJ file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObjMesh {
    pub positions: Vec<[f32; 3]>,
    /// Present only when every face corner references a texcoord
    pub uvs: Option<Vec<[f32; 2]>>,
    /// Present only when every face corner references a normal
    pub normals: Option<Vec<[f32; 3]>>,
    pub indices: Vec<u32>,
}

impl ObjMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Axis-aligned (min, max) corners of the positions, `None` when empty
    pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
        let (first, rest) = self.positions.split_first()?;
        Some(rest.iter().fold((*first, *first), |(lo, hi), p| {
            (
                std::array::from_fn(|axis| lo[axis].min(p[axis])),
                std::array::from_fn(|axis| hi[axis].max(p[axis])),
            )
        }))
    }
}

/// Parse OBJ text into a triangle mesh
pub fn parse_obj(text: &str) -> Result<ObjMesh> {
    let mut positions: Vec<[f32; 3]> = Vec::new();
    let mut tex_coords: Vec<[f32; 2]> = Vec::new();
    let mut normals_raw: Vec<[f32; 3]> = Vec::new();

    let mut final_positions: Vec<[f32; 3]> = Vec::new();
    let mut final_uvs: Vec<[f32; 2]> = Vec::new();
    let mut final_normals: Vec<[f32; 3]> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (line_no, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let parts: Vec<&str> = line.split_whitespace().collect();
        let line_no = line_no + 1;

        match parts[0] {
            "v" if parts.len() >= 4 => {
                positions.push(parse_floats(&parts[1..4], line_no)?);
            }
            "vt" if parts.len() >= 3 => {
                tex_coords.push(parse_floats(&parts[1..3], line_no)?);
            }
            "vn" if parts.len() >= 4 => {
                normals_raw.push(parse_floats(&parts[1..4], line_no)?);
            }
            "f" => {
                if parts.len() < 4 {
                    bail!("line {line_no}: face needs at least 3 vertices");
                }

                let face_verts = parts[1..]
                    .iter()
                    .map(|v| {
                        parse_obj_vertex(v, positions.len(), tex_coords.len(), normals_raw.len())
                            .with_context(|| format!("line {line_no}: bad face vertex '{v}'"))
                    })
                    .collect::<Result<Vec<_>>>()?;

                // Fan triangulation (convex polygons)
                for i in 1..face_verts.len() - 1 {
                    for &idx in &[0, i, i + 1] {
                        let (vi, vti, vni) = face_verts[idx];

                        indices.push(final_positions.len() as u32);
                        final_positions.push(positions[vi]);

                        if let Some(ti) = vti {
                            final_uvs.push(tex_coords[ti]);
                        }
                        if let Some(ni) = vni {
                            final_normals.push(normals_raw[ni]);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    if final_positions.is_empty() {
        bail!("No faces found in OBJ file");
    }

    let has_uvs = final_uvs.len() == final_positions.len();
    let has_normals = final_normals.len() == final_positions.len();

    Ok(ObjMesh {
        positions: final_positions,
        uvs: has_uvs.then_some(final_uvs),
        normals: has_normals.then_some(final_normals),
        indices,
    })
}

fn parse_floats<const N: usize>(parts: &[&str], line_no: usize) -> Result<[f32; N]> {
    let mut out = [0.0f32; N];
    for (slot, part) in out.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .with_context(|| format!("line {line_no}: invalid number '{part}'"))?;
    }
    Ok(out)
}

/// Parse `v`, `v/vt`, `v//vn` or `v/vt/vn` into zero-based indices
fn parse_obj_vertex(
    s: &str,
    position_count: usize,
    uv_count: usize,
    normal_count: usize,
) -> Result<(usize, Option<usize>, Option<usize>)> {
    let parts: Vec<&str> = s.split('/').collect();

    let vi = resolve_index(parts[0], position_count)?;

    let vti = match parts.get(1).filter(|s| !s.is_empty()) {
        Some(s) => Some(resolve_index(s, uv_count)?),
        None => None,
    };

    let vni = match parts.get(2).filter(|s| !s.is_empty()) {
        Some(s) => Some(resolve_index(s, normal_count)?),
        None => None,
    };

    Ok((vi, vti, vni))
}

/// OBJ indices are 1-based; negative values count back from the latest element
fn resolve_index(s: &str, count: usize) -> Result<usize> {
    let raw: i64 = s.parse().with_context(|| format!("invalid index '{s}'"))?;
    let resolved = match raw {
        0 => bail!("index 0 is not valid in OBJ"),
        r if r > 0 => r - 1,
        r => count as i64 + r,
    };
    if resolved < 0 || resolved >= count as i64 {
        bail!("index {raw} out of range ({count} defined)");
    }
    Ok(resolved as usize)
}

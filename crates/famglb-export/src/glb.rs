// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! GLB scene writer and reader
//!
//! Each configuration with geometry becomes one named node holding one mesh.
//! All meshes share a single double-sided grey material and a single binary
//! buffer. The family metadata travels on `asset.extras`.

use crate::error::{ExportError, Result};
use crate::metadata::{metadata_json, FamilyMetadata};
use famglb_model::{ConfigurationSnapshot, GeometryBuffer};
use gltf_json as json;
use json::validation::Checked::Valid;
use json::validation::USize64;
use json::Index;
use log::debug;
use std::borrow::Cow;
use std::collections::BTreeMap;

/// GLB header magic (`glTF`)
pub const GLB_MAGIC: u32 = 0x4654_6C67;
/// GLB container version
pub const GLB_VERSION: u32 = 2;
/// JSON chunk type (`JSON`)
pub const CHUNK_JSON: u32 = 0x4E4F_534A;
/// Binary chunk type (`BIN\0`)
pub const CHUNK_BIN: u32 = 0x004E_4942;

const HEADER_LEN: usize = 12;
const CHUNK_HEADER_LEN: usize = 8;
const GENERATOR: &str = concat!("famglb ", env!("CARGO_PKG_VERSION"));

/// Written scene and its counts
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlbOutput {
    pub bytes: Vec<u8>,
    /// Configurations that produced a node
    pub mesh_count: usize,
    pub vertex_count: usize,
    pub triangle_count: usize,
}

/// Binary buffer with 4-byte aligned views
#[derive(Debug, Default)]
pub struct BufferBuilder {
    data: Vec<u8>,
}

impl BufferBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes, returning `(offset, length)`
    pub fn append(&mut self, bytes: &[u8]) -> (usize, usize) {
        pad_to_four(&mut self.data, 0);
        let offset = self.data.len();
        self.data.extend_from_slice(bytes);
        (offset, bytes.len())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}

fn pad_to_four(data: &mut Vec<u8>, fill: u8) {
    while data.len() % 4 != 0 {
        data.push(fill);
    }
}

/// Build and serialize the scene
///
/// Configurations with no vertices are skipped. When none remain the scene is
/// empty and the file has no binary chunk.
pub fn write_glb(
    snapshots: &[ConfigurationSnapshot],
    metadata: &FamilyMetadata,
) -> Result<GlbOutput> {
    let mut root = json::Root::default();
    root.asset.generator = Some(GENERATOR.to_string());
    root.asset.extras = Some(serde_json::value::RawValue::from_string(metadata_json(
        metadata,
    )?)?);

    let mut bin = BufferBuilder::new();
    let mut nodes = Vec::new();
    let mut output = GlbOutput::default();

    let renderable: Vec<_> = snapshots.iter().filter(|s| !s.geometry.is_empty()).collect();
    if !renderable.is_empty() {
        let material = root.push(default_material());
        // Single buffer, pushed last once its length is known
        let buffer = Index::<json::Buffer>::new(0);

        for snapshot in renderable {
            let (node, vertices, triangles) =
                push_configuration(&mut root, &mut bin, buffer, material, snapshot)?;
            nodes.push(node);
            output.mesh_count += 1;
            output.vertex_count += vertices;
            output.triangle_count += triangles;
        }

        root.push(json::Buffer {
            byte_length: USize64::from(bin.len()),
            extensions: Default::default(),
            extras: Default::default(),
            name: None,
            uri: None,
        });
    }

    let scene = root.push(json::Scene {
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        nodes,
    });
    root.scene = Some(scene);

    let document = serde_json::to_vec(&root)?;
    output.bytes = assemble_glb(&document, &bin.into_bytes())?;

    debug!(
        "Wrote GLB: {} meshes, {} vertices, {} triangles, {} bytes",
        output.mesh_count,
        output.vertex_count,
        output.triangle_count,
        output.bytes.len()
    );

    Ok(output)
}

fn default_material() -> json::Material {
    json::Material {
        name: Some("Default".to_string()),
        double_sided: true,
        pbr_metallic_roughness: json::material::PbrMetallicRoughness {
            base_color_factor: json::material::PbrBaseColorFactor([0.8, 0.8, 0.8, 1.0]),
            metallic_factor: json::material::StrengthFactor(0.1),
            roughness_factor: json::material::StrengthFactor(0.5),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Push one configuration's buffer views, accessors, mesh and node
fn push_configuration(
    root: &mut json::Root,
    bin: &mut BufferBuilder,
    buffer: Index<json::Buffer>,
    material: Index<json::Material>,
    snapshot: &ConfigurationSnapshot,
) -> Result<(Index<json::Node>, usize, usize)> {
    let geometry = &snapshot.geometry;
    geometry
        .validate()
        .map_err(|e| ExportError::glb(format!("configuration {}: {}", snapshot.name, e)))?;

    let indices = scene_indices(geometry);
    let vertex_count = geometry.vertex_count();
    let (min, max) = geometry.bounds().ok_or_else(|| {
        ExportError::glb(format!("configuration {} has no vertices", snapshot.name))
    })?;

    let positions = push_accessor(
        root,
        bin,
        buffer,
        bytemuck::cast_slice(&geometry.vertices),
        vertex_count,
        json::accessor::Type::Vec3,
        json::accessor::ComponentType::F32,
        json::buffer::Target::ArrayBuffer,
        Some((min.to_vec(), max.to_vec())),
    );
    let normals = push_accessor(
        root,
        bin,
        buffer,
        bytemuck::cast_slice(&geometry.normals),
        vertex_count,
        json::accessor::Type::Vec3,
        json::accessor::ComponentType::F32,
        json::buffer::Target::ArrayBuffer,
        None,
    );
    let tex_coords = push_accessor(
        root,
        bin,
        buffer,
        bytemuck::cast_slice(&geometry.tex_coords),
        vertex_count,
        json::accessor::Type::Vec2,
        json::accessor::ComponentType::F32,
        json::buffer::Target::ArrayBuffer,
        None,
    );
    let index_accessor = push_accessor(
        root,
        bin,
        buffer,
        bytemuck::cast_slice(&indices[..]),
        indices.len(),
        json::accessor::Type::Scalar,
        json::accessor::ComponentType::U32,
        json::buffer::Target::ElementArrayBuffer,
        None,
    );

    let mut attributes = BTreeMap::new();
    attributes.insert(Valid(json::mesh::Semantic::Positions), positions);
    attributes.insert(Valid(json::mesh::Semantic::Normals), normals);
    attributes.insert(Valid(json::mesh::Semantic::TexCoords(0)), tex_coords);

    let mesh = root.push(json::Mesh {
        extensions: Default::default(),
        extras: Default::default(),
        name: Some(snapshot.name.clone()),
        primitives: vec![json::mesh::Primitive {
            attributes,
            extensions: Default::default(),
            extras: Default::default(),
            indices: Some(index_accessor),
            material: Some(material),
            mode: Valid(json::mesh::Mode::Triangles),
            targets: None,
        }],
        weights: None,
    });

    let node = root.push(json::Node {
        mesh: Some(mesh),
        name: Some(snapshot.name.clone()),
        ..Default::default()
    });

    Ok((node, vertex_count, indices.len() / 3))
}

/// Indices as written to the file
///
/// Per-triangle buffers get sequential indices so every index is in range.
fn scene_indices(geometry: &GeometryBuffer) -> Cow<'_, [u32]> {
    if geometry.is_shared_vertex() {
        Cow::Borrowed(&geometry.indices)
    } else {
        let count = (geometry.vertex_count() / 3 * 3) as u32;
        Cow::Owned((0..count).collect())
    }
}

#[allow(clippy::too_many_arguments)]
fn push_accessor(
    root: &mut json::Root,
    bin: &mut BufferBuilder,
    buffer: Index<json::Buffer>,
    bytes: &[u8],
    count: usize,
    type_: json::accessor::Type,
    component_type: json::accessor::ComponentType,
    target: json::buffer::Target,
    bounds: Option<(Vec<f32>, Vec<f32>)>,
) -> Index<json::Accessor> {
    let (offset, length) = bin.append(bytes);

    let view = root.push(json::buffer::View {
        buffer,
        byte_length: USize64::from(length),
        byte_offset: Some(USize64::from(offset)),
        byte_stride: None,
        extensions: Default::default(),
        extras: Default::default(),
        name: None,
        target: Some(Valid(target)),
    });

    let (min, max) = match bounds {
        Some((min, max)) => (
            Some(serde_json::Value::from(min)),
            Some(serde_json::Value::from(max)),
        ),
        None => (None, None),
    };

    root.push(json::Accessor {
        buffer_view: Some(view),
        byte_offset: Some(USize64(0)),
        count: USize64::from(count),
        component_type: Valid(json::accessor::GenericComponentType(component_type)),
        extensions: Default::default(),
        extras: Default::default(),
        type_: Valid(type_),
        min,
        max,
        name: None,
        normalized: false,
        sparse: None,
    })
}

/// Wrap a glTF JSON document and a binary payload in a GLB container
///
/// The JSON chunk is padded with spaces and the binary chunk with zeros. An
/// empty payload produces no binary chunk.
pub fn assemble_glb(document: &[u8], bin: &[u8]) -> Result<Vec<u8>> {
    let mut json_chunk = document.to_vec();
    pad_to_four(&mut json_chunk, b' ');
    let mut bin_chunk = bin.to_vec();
    pad_to_four(&mut bin_chunk, 0);

    let mut total = HEADER_LEN + CHUNK_HEADER_LEN + json_chunk.len();
    if !bin_chunk.is_empty() {
        total += CHUNK_HEADER_LEN + bin_chunk.len();
    }
    let total_u32 = u32::try_from(total)
        .map_err(|_| ExportError::glb(format!("file too large: {} bytes", total)))?;

    let mut out = Vec::with_capacity(total);
    out.extend_from_slice(&GLB_MAGIC.to_le_bytes());
    out.extend_from_slice(&GLB_VERSION.to_le_bytes());
    out.extend_from_slice(&total_u32.to_le_bytes());

    out.extend_from_slice(&(json_chunk.len() as u32).to_le_bytes());
    out.extend_from_slice(&CHUNK_JSON.to_le_bytes());
    out.extend_from_slice(&json_chunk);

    if !bin_chunk.is_empty() {
        out.extend_from_slice(&(bin_chunk.len() as u32).to_le_bytes());
        out.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        out.extend_from_slice(&bin_chunk);
    }

    Ok(out)
}

/// Chunks of a GLB container
#[derive(Clone, Debug, PartialEq)]
pub struct GlbChunks<'a> {
    pub json: &'a [u8],
    pub bin: Option<&'a [u8]>,
}

fn read_u32(bytes: &[u8], at: usize) -> Result<u32> {
    bytes
        .get(at..at + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| ExportError::glb(format!("truncated at byte {}", at)))
}

/// Split a GLB container into its JSON and binary chunks
pub fn split_glb(bytes: &[u8]) -> Result<GlbChunks<'_>> {
    if read_u32(bytes, 0)? != GLB_MAGIC {
        return Err(ExportError::glb("bad magic"));
    }
    let version = read_u32(bytes, 4)?;
    if version != GLB_VERSION {
        return Err(ExportError::glb(format!("unsupported version {}", version)));
    }
    let total = read_u32(bytes, 8)? as usize;
    if total != bytes.len() {
        return Err(ExportError::glb(format!(
            "declared length {} but file has {} bytes",
            total,
            bytes.len()
        )));
    }

    let mut json = None;
    let mut bin = None;
    let mut at = HEADER_LEN;
    while at < total {
        let length = read_u32(bytes, at)? as usize;
        let kind = read_u32(bytes, at + 4)?;
        let start = at + CHUNK_HEADER_LEN;
        let data = bytes
            .get(start..start + length)
            .ok_or_else(|| ExportError::glb(format!("chunk at byte {} overruns the file", at)))?;
        match kind {
            CHUNK_JSON if json.is_none() => json = Some(data),
            CHUNK_BIN if bin.is_none() => bin = Some(data),
            _ => {}
        }
        at = start + length;
    }

    Ok(GlbChunks {
        json: json.ok_or_else(|| ExportError::glb("missing JSON chunk"))?,
        bin,
    })
}

/// Parse the glTF document of a GLB container
pub fn read_glb(bytes: &[u8]) -> Result<json::Root> {
    let chunks = split_glb(bytes)?;
    Ok(serde_json::from_slice(chunks.json)?)
}

//! glTF 2.0 import (`.gltf` with external buffers or `.glb`).

use std::path::Path;
use gltf::buffer::Data;

use super::scene::{
    flip_v,
    ImportError,
    ImportOptions,
    ImportedMaterial,
    ImportedMesh,
    ImportedNode,
    ImportedScene,
    SceneImporter,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct GltfImporter;

impl SceneImporter for GltfImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<ImportedScene, ImportError> {
        log::info!("Loading glTF file: {}", path.display());

        let to_error = |source| ImportError::Gltf {
            path: path.to_path_buf(),
            source,
        };
        let gltf = gltf::Gltf::open(path).map_err(to_error)?;
        let gltf::Gltf { document, blob } = gltf;
        let buffers = gltf::import_buffers(&document, path.parent(), blob).map_err(to_error)?;

        let materials = document.materials().map(extract_material).collect();

        // every primitive becomes one imported mesh; remember which ones belong
        // to each glTF mesh so nodes can refer to them
        let mut meshes = Vec::new();
        let mut mesh_slots: Vec<Vec<usize>> = Vec::new();
        let mut skipped = 0;
        for mesh in document.meshes() {
            let mut slots = Vec::new();
            for primitive in mesh.primitives() {
                match extract_primitive(&mesh, &primitive, &buffers, options) {
                    Some(imported) => {
                        slots.push(meshes.len());
                        meshes.push(imported);
                    }
                    None => skipped += 1,
                }
            }
            mesh_slots.push(slots);
        }

        let root = document
            .default_scene()
            .or_else(|| document.scenes().next())
            .map(|scene| ImportedNode {
                name: scene.name().unwrap_or("scene").to_string(),
                meshes: Vec::new(),
                children: scene.nodes().map(|node| extract_node(&node, &mesh_slots)).collect(),
            });

        if skipped > 0 {
            log::warn!("Skipped {} primitive(s) of {}", skipped, path.display());
        }

        Ok(ImportedScene {
            meshes,
            materials,
            root,
            incomplete: false,
        })
    }
}

fn extract_node(node: &gltf::Node, mesh_slots: &[Vec<usize>]) -> ImportedNode {
    ImportedNode {
        name: node.name().map(str::to_string).unwrap_or_else(|| format!("node{}", node.index())),
        meshes: node
            .mesh()
            .map(|mesh| mesh_slots[mesh.index()].clone())
            .unwrap_or_default(),
        children: node.children().map(|child| extract_node(&child, mesh_slots)).collect(),
    }
}

fn extract_material(material: gltf::Material) -> ImportedMaterial {
    let mut imported = ImportedMaterial {
        name: material.name().unwrap_or_default().to_string(),
        ..Default::default()
    };

    if let Some(info) = material.pbr_metallic_roughness().base_color_texture() {
        match info.texture().source().source() {
            gltf::image::Source::Uri { uri, .. } => imported.diffuse.push(uri.to_string()),
            gltf::image::Source::View { .. } => {
                log::warn!("Embedded image in material '{}' is not supported", imported.name);
            }
        }
    }
    imported
}

fn extract_primitive(
    mesh: &gltf::Mesh,
    primitive: &gltf::Primitive,
    buffers: &[Data],
    options: ImportOptions
) -> Option<ImportedMesh> {
    let name = mesh.name().unwrap_or_default().to_string();
    if primitive.mode() != gltf::mesh::Mode::Triangles {
        log::warn!("Skipping non-triangle primitive in mesh '{}'", name);
        return None;
    }

    let reader = primitive.reader(|buffer| buffers.get(buffer.index()).map(|data| data.0.as_slice()));

    let Some(positions) = reader.read_positions() else {
        log::warn!("Skipping primitive without positions in mesh '{}'", name);
        return None;
    };
    let positions: Vec<[f32; 3]> = positions.collect();

    let normals: Vec<[f32; 3]> = reader
        .read_normals()
        .map(|normals| normals.collect())
        .unwrap_or_default();
    if normals.is_empty() {
        log::warn!("Mesh '{}' has no normals", name);
    }

    let tex_coords = reader
        .read_tex_coords(0)
        .map(|coords| coords.into_f32().map(|uv| flip_v(uv, options)).collect());

    let indices: Vec<u32> = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect(),
        None => (0..positions.len() as u32).collect(),
    };
    let faces = indices
        .chunks_exact(3)
        .map(|t| [t[0], t[1], t[2]])
        .collect();

    Some(ImportedMesh {
        name,
        positions,
        normals,
        tex_coords,
        faces,
        material: primitive.material().index(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::scratch_dir;

    // one triangle with positions + uvs; the buffer sits next to the .gltf
    fn write_triangle_gltf(dir: &Path) -> std::path::PathBuf {
        let mut bytes = Vec::new();
        for v in [0.0f32, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        for v in [0.0f32, 0.0, 1.0, 0.0, 0.0, 0.25] {
            bytes.extend_from_slice(&v.to_le_bytes());
        }
        std::fs::write(dir.join("tri.bin"), &bytes).unwrap();

        let json = r#"{
  "asset": { "version": "2.0" },
  "scene": 0,
  "scenes": [ { "nodes": [0] } ],
  "nodes": [ { "name": "parent", "children": [1], "mesh": 0 }, { "name": "child", "mesh": 0 } ],
  "meshes": [ { "name": "tri", "primitives": [ { "attributes": { "POSITION": 0, "TEXCOORD_0": 1 }, "material": 0 } ] } ],
  "materials": [ { "name": "wood", "pbrMetallicRoughness": { "baseColorTexture": { "index": 0 } } } ],
  "textures": [ { "source": 0 } ],
  "images": [ { "uri": "wood.png" } ],
  "buffers": [ { "byteLength": 60, "uri": "tri.bin" } ],
  "bufferViews": [
    { "buffer": 0, "byteOffset": 0, "byteLength": 36 },
    { "buffer": 0, "byteOffset": 36, "byteLength": 24 }
  ],
  "accessors": [
    { "bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0, 0, 0], "max": [1, 1, 0] },
    { "bufferView": 1, "componentType": 5126, "count": 3, "type": "VEC2" }
  ]
}"#;
        let path = dir.join("tri.gltf");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn nodes_share_primitives_and_keep_hierarchy() {
        let dir = scratch_dir("gltf-triangle");
        let path = write_triangle_gltf(&dir);

        let scene = GltfImporter.import(&path, ImportOptions::default()).unwrap();
        assert_eq!(scene.meshes.len(), 1);

        let mesh = &scene.meshes[0];
        assert_eq!(mesh.faces, vec![[0, 1, 2]]);
        assert!(mesh.normals.is_empty());
        assert_eq!(mesh.tex_coords.as_ref().unwrap()[2], [0.0, 0.75]);
        assert_eq!(scene.materials[mesh.material.unwrap()].diffuse, vec!["wood.png".to_string()]);

        let root = scene.root.unwrap();
        assert_eq!(root.children.len(), 1);
        let parent = &root.children[0];
        assert_eq!(parent.name, "parent");
        assert_eq!(parent.meshes, vec![0]);
        assert_eq!(parent.children[0].meshes, vec![0]);
    }

    #[test]
    fn line_primitives_are_dropped_without_failing_the_scene() {
        let dir = scratch_dir("gltf-lines");
        let path = write_triangle_gltf(&dir);
        let json = std::fs::read_to_string(&path).unwrap().replace(r#""material": 0 }"#, r#""material": 0, "mode": 1 }"#);
        std::fs::write(&path, json).unwrap();

        let scene = GltfImporter.import(&path, ImportOptions::default()).unwrap();
        assert!(scene.meshes.is_empty());
        assert!(!scene.incomplete);
        assert!(scene.root.unwrap().children[0].meshes.is_empty());
    }

    #[test]
    fn broken_file_is_an_error() {
        let dir = scratch_dir("gltf-broken");
        let path = dir.join("broken.gltf");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            GltfImporter.import(&path, ImportOptions::default()),
            Err(ImportError::Gltf { .. })
        ));
    }
}

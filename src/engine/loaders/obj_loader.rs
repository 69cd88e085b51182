//! Wavefront OBJ (+MTL) import through `tobj`.

use std::path::Path;

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
pub struct ObjImporter;

impl SceneImporter for ObjImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<ImportedScene, ImportError> {
        log::info!("Loading OBJ file: {}", path.display());

        let load_options = tobj::LoadOptions {
            single_index: true,
            triangulate: options.triangulate,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj(path, &load_options).map_err(|source| ImportError::Obj {
            path: path.to_path_buf(),
            source,
        })?;

        let materials = match materials {
            Ok(materials) => materials.into_iter().map(convert_material).collect(),
            Err(e) => {
                log::warn!("No usable material library for {}: {}", path.display(), e);
                Vec::new()
            }
        };

        let mut root = ImportedNode {
            name: path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default(),
            ..Default::default()
        };
        let mut meshes = Vec::with_capacity(models.len());

        for model in models {
            let mesh = convert_mesh(model, options);
            let material = mesh.material.filter(|&m| m < materials.len());
            root.children.push(ImportedNode {
                name: mesh.name.clone(),
                meshes: vec![meshes.len()],
                children: Vec::new(),
            });
            meshes.push(ImportedMesh { material, ..mesh });
        }

        Ok(ImportedScene {
            meshes,
            materials,
            root: Some(root),
            incomplete: false,
        })
    }
}

fn convert_material(material: tobj::Material) -> ImportedMaterial {
    ImportedMaterial {
        name: material.name,
        diffuse: material.diffuse_texture.into_iter().collect(),
        specular: material.specular_texture.into_iter().collect(),
    }
}

fn convert_mesh(model: tobj::Model, options: ImportOptions) -> ImportedMesh {
    let mesh = model.mesh;

    let positions: Vec<[f32; 3]> = mesh.positions
        .chunks_exact(3)
        .map(|p| [p[0], p[1], p[2]])
        .collect();

    let normals: Vec<[f32; 3]> = mesh.normals
        .chunks_exact(3)
        .map(|n| [n[0], n[1], n[2]])
        .collect();
    if normals.is_empty() {
        log::warn!("Mesh '{}' has no normals", model.name);
    }

    let tex_coords = (!mesh.texcoords.is_empty()).then(|| {
        mesh.texcoords
            .chunks_exact(2)
            .map(|t| flip_v([t[0], t[1]], options))
            .collect()
    });

    ImportedMesh {
        name: model.name,
        positions,
        normals,
        tex_coords,
        faces: triangles(&mesh.indices, &mesh.face_arities),
        material: mesh.material_id,
    }
}

/// Fan-triangulates polygons; an empty arity list means all triangles.
fn triangles(indices: &[u32], face_arities: &[u32]) -> Vec<[u32; 3]> {
    if face_arities.is_empty() {
        return indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]]).collect();
    }

    let mut faces = Vec::new();
    let mut start = 0usize;
    for &arity in face_arities {
        let arity = arity as usize;
        let polygon = &indices[start..start + arity];
        for i in 1..arity.saturating_sub(1) {
            faces.push([polygon[0], polygon[i], polygon[i + 1]]);
        }
        start += arity;
    }
    faces
}

//! Importer-neutral scene graph handed to `Model`.

use std::path::{ Path, PathBuf };
use thiserror::Error;

use crate::engine::components::material::TextureKind;

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse OBJ {path}: {source}")]
    Obj {
        path: PathBuf,
        #[source]
        source: tobj::LoadError,
    },
    #[error("cannot parse glTF {path}: {source}")]
    Gltf {
        path: PathBuf,
        #[source]
        source: gltf::Error,
    },
    #[error("unsupported model format: {0}")]
    UnsupportedFormat(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportOptions {
    /// Split polygons into triangles.
    pub triangulate: bool,
    /// Store texture coordinates as `(u, 1 - v)`.
    pub flip_uvs: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            triangulate: true,
            flip_uvs: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMesh {
    pub name: String,
    pub positions: Vec<[f32; 3]>,
    /// Empty when the source has no normals.
    pub normals: Vec<[f32; 3]>,
    /// First texture-coordinate channel, if any.
    pub tex_coords: Option<Vec<[f32; 2]>>,
    pub faces: Vec<[u32; 3]>,
    pub material: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedMaterial {
    pub name: String,
    pub diffuse: Vec<String>,
    pub specular: Vec<String>,
}

impl ImportedMaterial {
    /// Raw texture paths of one kind, in material order.
    pub fn textures(&self, kind: TextureKind) -> &[String] {
        match kind {
            TextureKind::Diffuse => &self.diffuse,
            TextureKind::Specular => &self.specular,
            TextureKind::Unknown => &[],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedNode {
    pub name: String,
    /// Indices into `ImportedScene::meshes`.
    pub meshes: Vec<usize>,
    pub children: Vec<ImportedNode>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportedScene {
    pub meshes: Vec<ImportedMesh>,
    pub materials: Vec<ImportedMaterial>,
    pub root: Option<ImportedNode>,
    /// Set when the importer could only produce part of the scene.
    pub incomplete: bool,
}

pub trait SceneImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<ImportedScene, ImportError>;
}

/// Picks an importer from the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileImporter;

impl SceneImporter for FileImporter {
    fn import(&self, path: &Path, options: ImportOptions) -> Result<ImportedScene, ImportError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match extension.as_deref() {
            Some("obj") => super::obj_loader::ObjImporter.import(path, options),
            Some("gltf" | "glb") => super::gltf_loader::GltfImporter.import(path, options),
            _ => Err(ImportError::UnsupportedFormat(path.to_path_buf())),
        }
    }
}

pub(crate) fn flip_v(tex_coord: [f32; 2], options: ImportOptions) -> [f32; 2] {
    if options.flip_uvs {
        [tex_coord[0], 1.0 - tex_coord[1]]
    } else {
        tex_coord
    }
}

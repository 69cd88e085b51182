use std::collections::HashSet;
use std::path::{ Path, PathBuf };
use thiserror::Error;

use crate::engine::components::material::{ texture_from_file, Texture, TextureKind };
use crate::engine::components::mesh::{ Element, Mesh, MeshError, Vertex };
use crate::engine::components::shader::ShaderProgram;
use crate::engine::loaders::{
    FileImporter,
    ImportOptions,
    ImportedMesh,
    ImportedNode,
    ImportedScene,
    SceneImporter,
};
use crate::engine::rendering::Gl;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("cannot load model {path}: {reason}")]
    Load {
        path: PathBuf,
        reason: String,
    },
    #[error("texture '{path}' has an unknown type")]
    UnknownTextureType {
        path: String,
    },
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// One drawable part of a model with the textures its material uses.
#[derive(Debug)]
pub struct ModelMesh {
    pub mesh: Mesh,
    pub textures: Vec<Texture>,
}

/// A textured multi-mesh model built from an imported scene.
///
/// Textures are shared by raw path string: a path already loaded for this model
/// is neither uploaded again nor attached to a later submesh.
pub struct Model {
    gl: Gl,
    meshes: Vec<ModelMesh>,
    directory: PathBuf,
    loaded_textures: HashSet<String>,
}

impl Model {
    fn empty(gl: &Gl, directory: PathBuf) -> Self {
        Self {
            gl: gl.clone(),
            meshes: Vec::new(),
            directory,
            loaded_textures: HashSet::new(),
        }
    }

    /// Loads through the extension-based importer. Failures are logged and
    /// leave the model without meshes.
    pub fn load(gl: &Gl, path: impl AsRef<Path>) -> Self {
        Self::load_with(gl, path, &FileImporter)
    }

    pub fn load_with(gl: &Gl, path: impl AsRef<Path>, importer: &dyn SceneImporter) -> Self {
        let path = path.as_ref();
        match Self::try_load(gl, path, importer) {
            Ok(model) => model,
            Err(e) => {
                log::error!("{}", e);
                Self::empty(gl, model_directory(path))
            }
        }
    }

    pub fn try_load(gl: &Gl, path: impl AsRef<Path>, importer: &dyn SceneImporter) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let load_error = |reason: String| ModelError::Load {
            path: path.to_path_buf(),
            reason,
        };

        let scene = importer.import(path, ImportOptions::default()).map_err(|e| load_error(e.to_string()))?;
        if scene.incomplete {
            return Err(load_error("scene is incomplete".to_string()));
        }
        let Some(root) = &scene.root else {
            return Err(load_error("scene has no root node".to_string()));
        };

        let mut model = Self::empty(gl, model_directory(path));
        model.process_node(root, &scene)?;

        log::info!(
            "Loaded model {}: {} meshes, {} textures",
            path.display(),
            model.meshes.len(),
            model.loaded_textures.len()
        );
        Ok(model)
    }

    // depth-first: own meshes first, then children
    fn process_node(&mut self, node: &ImportedNode, scene: &ImportedScene) -> Result<(), ModelError> {
        for &index in &node.meshes {
            match scene.meshes.get(index) {
                Some(imported) => {
                    let mesh = self.process_mesh(imported, scene)?;
                    self.meshes.push(mesh);
                }
                None => log::warn!("Node '{}' refers to missing mesh {}", node.name, index),
            }
        }

        for child in &node.children {
            self.process_node(child, scene)?;
        }
        Ok(())
    }

    fn process_mesh(&mut self, imported: &ImportedMesh, scene: &ImportedScene) -> Result<ModelMesh, ModelError> {
        let vertices = imported.positions
            .iter()
            .enumerate()
            .map(|(i, &position)| {
                let normal = imported.normals.get(i).copied().unwrap_or_default();
                let tex_coord = imported.tex_coords
                    .as_ref()
                    .and_then(|coords| coords.get(i).copied())
                    .unwrap_or_default();
                Vertex::new(position, normal, [0.0; 3], tex_coord)
            })
            .collect();
        let elements = imported.faces
            .iter()
            .map(|&[a, b, c]| Element::new(a, b, c))
            .collect();

        let mut textures = Vec::new();
        if let Some(material) = imported.material.and_then(|m| scene.materials.get(m)) {
            for kind in [TextureKind::Diffuse, TextureKind::Specular] {
                let loaded = self.load_material_textures(material.textures(kind), kind);
                textures.extend(loaded);
            }
        }

        let mut mesh = Mesh::new(vertices, elements);
        mesh.validate()?;
        mesh.upload(&self.gl)?;
        Ok(ModelMesh { mesh, textures })
    }

    fn load_material_textures(&mut self, paths: &[String], kind: TextureKind) -> Vec<Texture> {
        let mut textures = Vec::new();
        for raw in paths {
            if !self.loaded_textures.insert(raw.clone()) {
                continue;
            }

            let file = self.directory.join(raw);
            let id = match texture_from_file(&self.gl, &file) {
                Ok(id) => Some(id),
                Err(e) => {
                    log::error!("Texture failed to load at path {}: {}", file.display(), e);
                    None
                }
            };
            textures.push(Texture::new(id, kind, raw.as_str()));
        }
        textures
    }

    /// Binds each submesh's textures to consecutive units and draws it.
    ///
    /// Samplers are named `material.texture_<kind><n>` with `n` counted per kind.
    pub fn draw(&self, shader: &ShaderProgram) -> Result<(), ModelError> {
        for entry in &self.meshes {
            let mut diffuse = 0;
            let mut specular = 0;

            for (unit, texture) in entry.textures.iter().enumerate() {
                let counter = match texture.kind {
                    TextureKind::Diffuse => &mut diffuse,
                    TextureKind::Specular => &mut specular,
                    TextureKind::Unknown => {
                        return Err(ModelError::UnknownTextureType {
                            path: texture.path.clone(),
                        });
                    }
                };
                let name = format!("material.texture_{}{}", texture.kind, *counter);
                *counter += 1;

                self.gl.active_texture(unit as u32);
                shader.set_int(&name, unit as i32);
                self.gl.bind_texture(texture.id);
            }
            self.gl.active_texture(0);

            entry.mesh.bind();
            entry.mesh.draw()?;
            entry.mesh.unbind();
        }
        Ok(())
    }

    pub fn meshes(&self) -> &[ModelMesh] {
        &self.meshes
    }

    /// Base directory for relative texture paths.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn loaded_texture_count(&self) -> usize {
        self.loaded_textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }
}

impl Drop for Model {
    fn drop(&mut self) {
        for texture in self.meshes.iter().flat_map(|m| &m.textures) {
            if let Some(id) = texture.id {
                self.gl.delete_texture(id);
            }
        }
    }
}

fn model_directory(path: &Path) -> PathBuf {
    path.parent().map(Path::to_path_buf).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::test_support::scratch_dir;
    use crate::engine::loaders::{ ImportError, ImportedMaterial };
    use crate::engine::rendering::recording::RecordingDevice;
    use crate::engine::rendering::UniformValue;

    struct FakeImporter(ImportedScene);

    impl SceneImporter for FakeImporter {
        fn import(&self, _path: &Path, _options: ImportOptions) -> Result<ImportedScene, ImportError> {
            Ok(self.0.clone())
        }
    }

    fn triangle(x: f32, material: Option<usize>) -> ImportedMesh {
        ImportedMesh {
            name: format!("tri{}", x),
            positions: vec![[x, 0.0, 0.0], [x + 1.0, 0.0, 0.0], [x, 1.0, 0.0]],
            normals: Vec::new(),
            tex_coords: None,
            faces: vec![[0, 1, 2]],
            material,
        }
    }

    fn node(meshes: Vec<usize>, children: Vec<ImportedNode>) -> ImportedNode {
        ImportedNode { name: "n".into(), meshes, children }
    }

    fn write_png(dir: &Path, name: &str) {
        image::RgbImage::from_pixel(1, 1, image::Rgb([9, 9, 9])).save(dir.join(name)).unwrap();
    }

    #[test]
    fn nodes_are_walked_depth_first() {
        let device = RecordingDevice::new();
        let scene = ImportedScene {
            meshes: vec![triangle(0.0, None), triangle(10.0, None), triangle(20.0, None)],
            root: Some(node(vec![2], vec![node(vec![0], vec![]), node(vec![1], vec![])])),
            ..Default::default()
        };

        let model = Model::try_load(&device.gl(), "scene/x.obj", &FakeImporter(scene)).unwrap();
        let xs: Vec<f32> = model.meshes().iter().map(|m| m.mesh.vertices()[0].position[0]).collect();
        assert_eq!(xs, vec![20.0, 0.0, 10.0]);
        assert!(model.meshes().iter().all(|m| m.mesh.is_uploaded()));
        assert_eq!(model.directory(), Path::new("scene"));

        let vertex = model.meshes()[0].mesh.vertices()[1];
        assert_eq!(vertex.normal, [0.0; 3]);
        assert_eq!(vertex.tex_coord, [0.0; 2]);
        assert_eq!(vertex.color, [0.0; 3]);
    }

    #[test]
    fn shared_texture_is_uploaded_once() {
        let device = RecordingDevice::new();
        let dir = scratch_dir("model-dedup");
        write_png(&dir, "wood.png");

        let scene = ImportedScene {
            meshes: vec![triangle(0.0, Some(0)), triangle(1.0, Some(0))],
            materials: vec![ImportedMaterial {
                name: "wood".into(),
                diffuse: vec!["wood.png".into()],
                specular: vec!["missing.png".into()],
            }],
            root: Some(node(vec![0, 1], vec![])),
            ..Default::default()
        };

        let model = Model::try_load(&device.gl(), dir.join("m.obj"), &FakeImporter(scene)).unwrap();
        assert_eq!(device.texture_uploads.get(), 1);
        assert_eq!(model.loaded_texture_count(), 2);

        let first = &model.meshes()[0].textures;
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].kind, TextureKind::Diffuse);
        assert!(first[0].id.is_some());
        assert_eq!(first[1].path, "missing.png");
        assert_eq!(first[1].id, None);
        assert!(model.meshes()[1].textures.is_empty());
    }

    #[test]
    fn repeated_path_in_one_material_is_uploaded_once() {
        let device = RecordingDevice::new();
        let dir = scratch_dir("model-dedup-single");
        write_png(&dir, "a.png");

        let scene = ImportedScene {
            meshes: vec![triangle(0.0, Some(0))],
            materials: vec![ImportedMaterial {
                name: "a".into(),
                diffuse: vec!["a.png".into(), "a.png".into()],
                specular: vec!["a.png".into()],
            }],
            root: Some(node(vec![0], vec![])),
            ..Default::default()
        };

        let model = Model::try_load(&device.gl(), dir.join("m.obj"), &FakeImporter(scene)).unwrap();
        assert_eq!(device.texture_uploads.get(), 1);
        assert_eq!(model.loaded_texture_count(), 1);

        let textures = &model.meshes()[0].textures;
        assert_eq!(textures.len(), 1);
        assert_eq!(textures[0].kind, TextureKind::Diffuse);
        assert_eq!(textures[0].path, "a.png");
        assert_eq!(device.live_textures.borrow().len(), 1);
    }

    #[test]
    fn nonexistent_file_gives_empty_model() {
        let device = RecordingDevice::new();
        let dir = scratch_dir("model-missing");
        let model = Model::load(&device.gl(), dir.join("nothing.obj"));
        assert!(model.is_empty());
        assert_eq!(model.loaded_texture_count(), 0);
    }

    #[test]
    fn incomplete_or_rootless_scenes_fail() {
        let device = RecordingDevice::new();
        let incomplete = ImportedScene {
            root: Some(node(vec![], vec![])),
            incomplete: true,
            ..Default::default()
        };
        let result = Model::try_load(&device.gl(), "a.obj", &FakeImporter(incomplete));
        assert!(matches!(result, Err(ModelError::Load { .. })));

        let rootless = ImportedScene::default();
        let result = Model::try_load(&device.gl(), "a.obj", &FakeImporter(rootless.clone()));
        assert!(matches!(result, Err(ModelError::Load { .. })));
        assert!(Model::load_with(&device.gl(), "a.obj", &FakeImporter(rootless)).is_empty());
    }

    #[test]
    fn draw_names_samplers_per_kind() {
        let device = RecordingDevice::new();
        let gl = device.gl();
        let dir = scratch_dir("model-draw");
        for name in ["a.png", "b.png", "s.png"] {
            write_png(&dir, name);
        }
        std::fs::write(dir.join("m.vs"), "void main() {}").unwrap();
        std::fs::write(dir.join("m.fs"), "void main() {}").unwrap();

        let scene = ImportedScene {
            meshes: vec![triangle(0.0, Some(0))],
            materials: vec![ImportedMaterial {
                name: "m".into(),
                diffuse: vec!["a.png".into(), "b.png".into()],
                specular: vec!["s.png".into()],
            }],
            root: Some(node(vec![0], vec![])),
            ..Default::default()
        };
        let model = Model::try_load(&gl, dir.join("m.obj"), &FakeImporter(scene)).unwrap();

        let mut shader = ShaderProgram::new(gl.clone(), dir.join("m.vs"), dir.join("m.fs"));
        shader.compile().unwrap();
        shader.activate();
        model.draw(&shader).unwrap();

        assert_eq!(device.written("material.texture_diffuse0"), vec![UniformValue::Int(0)]);
        assert_eq!(device.written("material.texture_diffuse1"), vec![UniformValue::Int(1)]);
        assert_eq!(device.written("material.texture_specular0"), vec![UniformValue::Int(2)]);

        let units: Vec<u32> = device.texture_bindings.borrow().iter().map(|&(unit, _)| unit).collect();
        assert_eq!(units, vec![0, 1, 2]);
        assert_eq!(device.active_unit.get(), 0);
        assert_eq!(*device.draws.borrow(), vec![3]);
        assert_eq!(device.bound_vertex_array.get(), None);
    }

    #[test]
    fn unknown_texture_kind_fails_the_draw() {
        let device = RecordingDevice::new();
        let gl = device.gl();
        let mut model = Model::empty(&gl, PathBuf::new());
        model.meshes.push(ModelMesh {
            mesh: Mesh::new(Vec::new(), Vec::new()),
            textures: vec![Texture::new(None, TextureKind::Unknown, "odd.png")],
        });

        let shader = ShaderProgram::new(gl.clone(), "none.vs", "none.fs");
        assert!(matches!(model.draw(&shader), Err(ModelError::UnknownTextureType { .. })));
        assert!(device.draws.borrow().is_empty());
    }

    #[test]
    fn drop_releases_textures_and_buffers() {
        let device = RecordingDevice::new();
        let dir = scratch_dir("model-drop");
        write_png(&dir, "wood.png");
        let scene = ImportedScene {
            meshes: vec![triangle(0.0, Some(0))],
            materials: vec![ImportedMaterial {
                name: "wood".into(),
                diffuse: vec!["wood.png".into()],
                specular: Vec::new(),
            }],
            root: Some(node(vec![0], vec![])),
            ..Default::default()
        };

        let model = Model::try_load(&device.gl(), dir.join("m.obj"), &FakeImporter(scene)).unwrap();
        assert_eq!(device.live_textures.borrow().len(), 1);
        drop(model);
        assert!(device.live_textures.borrow().is_empty());
        assert!(device.live_buffers.borrow().is_empty());
        assert!(device.live_vertex_arrays.borrow().is_empty());
    }
}

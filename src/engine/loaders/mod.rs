pub mod gltf_loader;
pub mod obj_loader;
pub mod scene;
pub mod texture_loader;

pub use gltf_loader::GltfImporter;
pub use obj_loader::ObjImporter;
pub use scene::{
    FileImporter,
    ImportError,
    ImportOptions,
    ImportedMaterial,
    ImportedMesh,
    ImportedNode,
    ImportedScene,
    SceneImporter,
};
pub use texture_loader::{ load_texture_image, TextureError, TextureFormat, TextureImage };

pub mod camera;
pub mod material;
pub mod mesh;
pub mod model;
pub mod shader;

pub use camera::{ Camera, MovementKeys };
pub use material::{ Texture, TextureKind };
pub use mesh::{ cube_mesh, Element, Mesh, MeshError, Vertex };
pub use model::{ Model, ModelError, ModelMesh };
pub use shader::{ ShaderError, ShaderProgram };

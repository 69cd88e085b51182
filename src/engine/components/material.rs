use std::fmt;
use std::path::Path;

use crate::engine::loaders::texture_loader::{ load_texture_image, TextureError, TextureImage };
use crate::engine::rendering::Gl;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TextureKind {
    Diffuse,
    Specular,
    #[default]
    Unknown,
}

impl TextureKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TextureKind::Diffuse => "diffuse",
            TextureKind::Specular => "specular",
            TextureKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TextureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A texture attached to a submesh. `id` is `None` when the image failed to
/// load; drawing then binds no texture to that unit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Texture {
    pub id: Option<glow::Texture>,
    pub kind: TextureKind,
    /// Path as written in the material, relative to the model directory.
    pub path: String,
}

impl Texture {
    pub fn new(id: Option<glow::Texture>, kind: TextureKind, path: impl Into<String>) -> Self {
        Self { id, kind, path: path.into() }
    }
}

/// Uploads already-decoded pixels into a new texture object.
pub fn upload_texture_image(gl: &Gl, image: &TextureImage) -> Result<glow::Texture, TextureError> {
    let texture = gl.create_texture().map_err(TextureError::Gpu)?;
    gl.upload_texture(texture, image);
    Ok(texture)
}

/// Decodes an image file (flipped vertically) and uploads it.
pub fn texture_from_file(gl: &Gl, path: &Path) -> Result<glow::Texture, TextureError> {
    let image = load_texture_image(path)?;
    upload_texture_image(gl, &image)
}

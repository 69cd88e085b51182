//! Image decoding for GPU textures.

use std::path::{ Path, PathBuf };
use image::DynamicImage;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("cannot decode image {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("cannot create texture object: {0}")]
    Gpu(String),
}

/// Pixel layout of a decoded image, 8 bits per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureFormat {
    Red,
    Rgb,
    Rgba,
}

impl TextureFormat {
    pub fn gl_enum(self) -> u32 {
        match self {
            TextureFormat::Red => glow::RED,
            TextureFormat::Rgb => glow::RGB,
            TextureFormat::Rgba => glow::RGBA,
        }
    }
}

/// Decoded pixels, already flipped so row 0 is the bottom of the image.
#[derive(Debug, Clone)]
pub struct TextureImage {
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub pixels: Vec<u8>,
}

impl TextureImage {
    /// Flips vertically and picks the format from the channel count.
    pub fn from_dynamic(image: DynamicImage) -> Self {
        let image = image.flipv();
        let (width, height) = (image.width(), image.height());

        let (format, pixels) = match image {
            DynamicImage::ImageLuma8(buffer) => (TextureFormat::Red, buffer.into_raw()),
            DynamicImage::ImageRgb8(buffer) => (TextureFormat::Rgb, buffer.into_raw()),
            DynamicImage::ImageRgba8(buffer) => (TextureFormat::Rgba, buffer.into_raw()),
            other => (TextureFormat::Rgba, other.to_rgba8().into_raw()),
        };

        Self { width, height, format, pixels }
    }
}

pub fn load_texture_image(path: &Path) -> Result<TextureImage, TextureError> {
    let image = image::open(path).map_err(|source| TextureError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    let texture = TextureImage::from_dynamic(image);
    log::debug!(
        "Decoded {} ({}x{}, {:?})",
        path.display(),
        texture.width,
        texture.height,
        texture.format
    );
    Ok(texture)
}

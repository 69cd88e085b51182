//! The runnable exercises. Each demo owns its GPU objects and draws one frame
//! per `render` call.

pub mod fractal;
pub mod lighting;
pub mod models;
pub mod triangle;

use thiserror::Error;

use crate::engine::components::mesh::MeshError;
use crate::engine::components::model::ModelError;
use crate::engine::components::shader::ShaderError;
use crate::engine::config::{ AppConfig, DemoKind };
use crate::engine::loaders::TextureError;
use crate::engine::rendering::Gl;
use crate::engine::systems::InputSystem;

pub use fractal::{ FractalDemo, FractalView };
pub use lighting::LightingDemo;
pub use models::ModelsDemo;
pub use triangle::TriangleDemo;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error(transparent)]
    Shader(#[from] ShaderError),
    #[error(transparent)]
    Mesh(#[from] MeshError),
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Texture(#[from] TextureError),
}

/// Window size in physical pixels.
pub type WindowSize = (u32, u32);

pub trait Demo {
    fn name(&self) -> &'static str;

    /// Whether the window should hide and grab the cursor for mouse-look.
    fn captures_cursor(&self) -> bool {
        true
    }

    fn on_cursor_moved(&mut self, _x: f64, _y: f64, _size: WindowSize) {}

    fn on_scroll(&mut self, _delta: f32, _cursor: Option<(f64, f64)>, _size: WindowSize) {}

    fn on_focus(&mut self, _focused: bool) {}

    /// Per-frame input polling, before `render`.
    fn update(&mut self, _input: &InputSystem, _delta_time: f32) {}

    /// Draws one frame. `elapsed` is seconds since the demo started.
    fn render(&mut self, width: u32, height: u32, elapsed: f32) -> Result<(), DemoError>;
}

/// Builds the configured demo, compiling its shaders and uploading its assets.
pub fn create_demo(kind: DemoKind, gl: &Gl, config: &AppConfig) -> Result<Box<dyn Demo>, DemoError> {
    let demo: Box<dyn Demo> = match kind {
        DemoKind::Triangle => Box::new(TriangleDemo::new(gl, config)?),
        DemoKind::Lighting => Box::new(LightingDemo::new(gl, config)?),
        DemoKind::Fractal => Box::new(FractalDemo::new(gl, config)?),
        DemoKind::Models => Box::new(ModelsDemo::new(gl, config)?),
    };
    log::info!("Started demo '{}'", demo.name());
    Ok(demo)
}

fn aspect_ratio(width: u32, height: u32) -> f32 {
    width as f32 / height.max(1) as f32
}

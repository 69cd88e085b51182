use glam::{ Mat4, Vec2, Vec3 };
use winit::event::MouseButton;

use crate::engine::components::camera::Camera;
use crate::engine::components::mesh::{ Element, Mesh, Vertex };
use crate::engine::components::shader::ShaderProgram;
use crate::engine::config::AppConfig;
use crate::engine::rendering::Gl;
use crate::engine::systems::InputSystem;

use super::{ Demo, DemoError, WindowSize };

const ZOOM_SPEED: f32 = 0.25;
const MIN_SCALE: f32 = 5e-6;
const MAX_SCALE: f32 = 100.0;
const ITERATIONS: i32 = 500;
const QUAD_EXTENT: f32 = 10.0;

/// Pan/zoom state of the fractal viewer.
///
/// The camera looks down -Z, so screen axes match world X/Y. `scale` is the
/// half-extent of the orthographic view volume.
#[derive(Debug, Clone)]
pub struct FractalView {
    camera: Camera,
    scale: f32,
    drag_origin: Option<Vec2>,
}

impl Default for FractalView {
    fn default() -> Self {
        Self {
            camera: Camera::new(Vec3::new(0.0, 0.0, -1.0), -90.0, 0.0, 45.0, Vec3::Y),
            scale: 1.0,
            drag_origin: None,
        }
    }
}

impl FractalView {
    pub fn position(&self) -> Vec3 {
        self.camera.position()
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Pans while the button is held. `cursor` is in window pixels.
    pub fn drag(&mut self, cursor: (f64, f64), size: WindowSize) {
        let point = Vec2::new(
            (cursor.0 / size.0.max(1) as f64) as f32,
            (cursor.1 / -(size.1.max(1) as f64)) as f32
        );
        let origin = self.drag_origin.replace(point).unwrap_or(point);

        let offset = -(point - origin) * 2.0 * self.scale;
        *self.camera.position_mut() += offset.extend(0.0);
    }

    pub fn release(&mut self) {
        self.drag_origin = None;
    }

    /// Zooms by `scroll` notches and shifts toward the cursor so the point
    /// under it moves less.
    pub fn zoom(&mut self, scroll: f32, cursor: (f64, f64), size: WindowSize) {
        let old_scale = self.scale;
        self.scale = (self.scale - scroll * self.scale * ZOOM_SPEED).clamp(MIN_SCALE, MAX_SCALE);

        let x = (cursor.0 / size.0.max(1) as f64) as f32;
        let y = (cursor.1 / size.1.max(1) as f64) as f32;
        let toward = Vec2::new(2.0 * (x - 0.5), -2.0 * (y - 0.5));
        *self.camera.position_mut() += (toward * (old_scale - self.scale)).extend(0.0);
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.camera.view_matrix()
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::orthographic_rh_gl(-self.scale, self.scale, -self.scale, self.scale, -100.0, 100.0)
    }
}

/// Mandelbrot set drawn by the fragment shader over a large quad.
pub struct FractalDemo {
    gl: Gl,
    shader: ShaderProgram,
    quad: Mesh,
    view: FractalView,
    size: WindowSize,
}

impl FractalDemo {
    pub fn new(gl: &Gl, config: &AppConfig) -> Result<Self, DemoError> {
        let mut shader = ShaderProgram::new(
            gl.clone(),
            config.shader_path("fractal.vs"),
            config.shader_path("fractal.fs")
        );
        shader.compile()?;
        shader.activate();
        shader.set_int("k", ITERATIONS);
        shader.set_vec2("offset", Vec2::new(-0.75, 0.0));

        let (lo, hi) = (-QUAD_EXTENT, QUAD_EXTENT);
        let normal = [0.0, 0.0, 1.0];
        let mut quad = Mesh::new(
            vec![
                Vertex::new([lo, lo, 0.0], normal, [1.0, 0.0, 0.0], [0.0, 0.0]),
                Vertex::new([hi, lo, 0.0], normal, [0.0, 1.0, 0.0], [1.0, 0.0]),
                Vertex::new([hi, hi, 0.0], normal, [0.0, 0.0, 1.0], [1.0, 1.0]),
                Vertex::new([lo, hi, 0.0], normal, [0.0, 1.0, 0.0], [0.0, 1.0])
            ],
            vec![Element::new(2, 1, 0), Element::new(0, 2, 3)]
        );
        quad.upload(gl)?;

        Ok(Self {
            gl: gl.clone(),
            shader,
            quad,
            view: FractalView::default(),
            size: (config.window.width, config.window.height),
        })
    }

    pub fn view(&self) -> &FractalView {
        &self.view
    }
}

impl Demo for FractalDemo {
    fn name(&self) -> &'static str {
        "fractal"
    }

    fn captures_cursor(&self) -> bool {
        false
    }

    fn on_cursor_moved(&mut self, _x: f64, _y: f64, size: WindowSize) {
        self.size = size;
    }

    fn on_scroll(&mut self, delta: f32, cursor: Option<(f64, f64)>, size: WindowSize) {
        let center = (size.0 as f64 / 2.0, size.1 as f64 / 2.0);
        self.view.zoom(delta, cursor.unwrap_or(center), size);
        log::debug!("Fractal scale {}", self.view.scale());
    }

    fn update(&mut self, input: &InputSystem, _delta_time: f32) {
        match input.cursor() {
            Some(cursor) if input.is_button_held(MouseButton::Left) => self.view.drag(cursor, self.size),
            _ => self.view.release(),
        }
    }

    fn render(&mut self, width: u32, height: u32, _elapsed: f32) -> Result<(), DemoError> {
        self.size = (width, height);
        self.gl.viewport(width, height);
        self.gl.clear_color([0.0, 0.0, 0.0, 1.0]);
        self.gl.clear(glow::COLOR_BUFFER_BIT);

        self.shader.activate();
        self.shader.set_mat4("model", &Mat4::IDENTITY);
        self.shader.set_mat4("view", &self.view.view_matrix());
        self.shader.set_mat4("projection", &self.view.projection_matrix());

        self.quad.bind();
        self.quad.draw()?;
        self.quad.unbind();
        Ok(())
    }
}

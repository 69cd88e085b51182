use glam::{ Mat4, Vec3 };

use crate::engine::components::camera::Camera;
use crate::engine::components::model::Model;
use crate::engine::components::shader::ShaderProgram;
use crate::engine::config::AppConfig;
use crate::engine::rendering::Gl;
use crate::engine::systems::InputSystem;

use super::{ aspect_ratio, Demo, DemoError, WindowSize };

const CLEAR_COLOR: [f32; 4] = [0.1, 0.2, 0.3, 1.0];
const LIGHT_DIRECTION: Vec3 = Vec3::new(0.0, -1.0, -1.0);
const LIGHT_COLOR: Vec3 = Vec3::ONE;
const SHININESS: f32 = 32.0;
const OUTLINE_SCALE: f32 = 1.02;

/// Textured model under a directional light, outlined through the stencil
/// buffer.
pub struct ModelsDemo {
    gl: Gl,
    camera: Camera,
    shader: ShaderProgram,
    outline_shader: ShaderProgram,
    model: Model,
}

impl ModelsDemo {
    pub fn new(gl: &Gl, config: &AppConfig) -> Result<Self, DemoError> {
        let mut shader = ShaderProgram::new(
            gl.clone(),
            config.shader_path("model.vs"),
            config.shader_path("model.fs")
        );
        shader.compile()?;

        let mut outline_shader = ShaderProgram::new(
            gl.clone(),
            config.shader_path("outline.vs"),
            config.shader_path("outline.fs")
        );
        outline_shader.compile()?;

        let model = Model::load(gl, &config.model);
        if model.is_empty() {
            log::warn!("Model {} has nothing to draw", config.model.display());
        }

        Ok(Self {
            gl: gl.clone(),
            camera: Camera::new(Vec3::new(0.0, 0.0, 3.0), -90.0, 0.0, 45.0, Vec3::Y),
            shader,
            outline_shader,
            model,
        })
    }

    pub fn model(&self) -> &Model {
        &self.model
    }
}

impl Demo for ModelsDemo {
    fn name(&self) -> &'static str {
        "models"
    }

    fn on_cursor_moved(&mut self, x: f64, y: f64, _size: WindowSize) {
        self.camera.update_yaw_pitch(x as f32, y as f32);
    }

    fn on_scroll(&mut self, delta: f32, _cursor: Option<(f64, f64)>, _size: WindowSize) {
        self.camera.update_fov(delta);
    }

    fn on_focus(&mut self, focused: bool) {
        // the cursor jumps while the window is away
        if focused {
            self.camera.reset_cursor_baseline();
        }
    }

    fn update(&mut self, input: &InputSystem, delta_time: f32) {
        self.camera.update_position(input.movement_keys(), delta_time);
    }

    fn render(&mut self, width: u32, height: u32, _elapsed: f32) -> Result<(), DemoError> {
        let gl = &self.gl;
        gl.viewport(width, height);
        gl.clear_color(CLEAR_COLOR);
        gl.set_enabled(glow::DEPTH_TEST, true);
        gl.set_enabled(glow::STENCIL_TEST, true);

        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix(aspect_ratio(width, height), 0.1, 100.0);

        self.shader.activate();
        self.shader.set_mat4("view", &view);
        self.shader.set_mat4("projection", &projection);
        self.shader.set_vec3("light.direction", view.transform_vector3(LIGHT_DIRECTION));
        self.shader.set_vec3("light.ambient", LIGHT_COLOR * 0.2 * 0.75);
        self.shader.set_vec3("light.diffuse", LIGHT_COLOR * 0.75);
        self.shader.set_vec3("light.specular", LIGHT_COLOR);
        self.shader.set_mat4("model", &Mat4::IDENTITY);
        self.shader.set_float("material.shininess", SHININESS);

        // mark every covered pixel with 1
        gl.stencil_op(glow::KEEP, glow::KEEP, glow::REPLACE);
        gl.stencil_func(glow::ALWAYS, 1, 0xff);
        gl.stencil_mask(0xff);
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT | glow::STENCIL_BUFFER_BIT);

        self.model.draw(&self.shader)?;

        // slightly larger copy, only where the stencil is not 1
        gl.stencil_func(glow::NOTEQUAL, 1, 0xff);
        gl.stencil_mask(0x00);
        gl.set_enabled(glow::DEPTH_TEST, false);

        self.outline_shader.activate();
        self.outline_shader.set_mat4("view", &view);
        self.outline_shader.set_mat4("projection", &projection);
        self.outline_shader.set_mat4("model", &Mat4::from_scale(Vec3::splat(OUTLINE_SCALE)));
        self.model.draw(&self.outline_shader)?;

        gl.stencil_mask(0xff);
        gl.set_enabled(glow::DEPTH_TEST, true);
        Ok(())
    }
}

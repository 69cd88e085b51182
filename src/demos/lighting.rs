use glam::{ Mat4, Vec3 };

use crate::engine::components::camera::Camera;
use crate::engine::components::material::texture_from_file;
use crate::engine::components::mesh::{ cube_mesh, Mesh };
use crate::engine::components::shader::ShaderProgram;
use crate::engine::config::AppConfig;
use crate::engine::rendering::Gl;
use crate::engine::systems::InputSystem;

use super::{ aspect_ratio, Demo, DemoError, WindowSize };

const CLEAR_COLOR: [f32; 4] = [0.05, 0.05, 0.06, 1.0];
const CUBE_COLOR: [f32; 3] = [1.0, 0.5, 0.31];
const SHININESS: f32 = 64.0;

const CUBE_POSITIONS: [Vec3; 10] = [
    Vec3::new(0.0, 0.0, 0.0),
    Vec3::new(2.0, 5.0, -15.0),
    Vec3::new(-1.5, -2.2, -2.5),
    Vec3::new(-3.8, -2.0, -12.3),
    Vec3::new(2.4, -0.4, -3.5),
    Vec3::new(-1.7, 3.0, -7.5),
    Vec3::new(1.3, -2.0, -2.5),
    Vec3::new(1.5, 2.0, -2.5),
    Vec3::new(1.5, 0.2, -1.5),
    Vec3::new(-1.3, 1.0, -1.5),
];

/// Point light circling the scene, in world space.
pub fn light_position(time: f32) -> Vec3 {
    let orbit = time * 2f32.to_radians();
    Vec3::new(orbit.cos(), orbit.sin(), (time * 20f32.to_radians()).sin() * 0.5)
}

/// Slowly drifting light color, each channel in [0.25, 0.75].
pub fn light_color(time: f32) -> Vec3 {
    let t = time * 0.1;
    Vec3::new(
        ((t * 2.0).sin() * 0.25 + 0.5).abs(),
        ((t * 0.7).sin() * 0.25 + 0.5).abs(),
        ((t * 1.3).sin() * 0.25 + 0.5).abs()
    )
}

/// Ten spinning textured cubes lit by one moving point light (Phong).
pub struct LightingDemo {
    gl: Gl,
    camera: Camera,
    shader: ShaderProgram,
    light_shader: ShaderProgram,
    cube: Mesh,
    light: Mesh,
    diffuse_map: glow::Texture,
    specular_map: glow::Texture,
}

impl LightingDemo {
    pub fn new(gl: &Gl, config: &AppConfig) -> Result<Self, DemoError> {
        let mut shader = ShaderProgram::new(
            gl.clone(),
            config.shader_path("lighting.vs"),
            config.shader_path("lighting.fs")
        );
        shader.compile()?;
        shader.activate();
        shader.set_int("material.diffuse", 0);
        shader.set_int("material.specular", 1);
        shader.set_float("material.shininess", SHININESS);

        let mut light_shader = ShaderProgram::new(
            gl.clone(),
            config.shader_path("lighting.vs"),
            config.shader_path("light.fs")
        );
        light_shader.compile()?;

        let diffuse_map = texture_from_file(gl, &config.texture_path("container2.png"))?;
        let specular_map = match texture_from_file(gl, &config.texture_path("container2_specular.png")) {
            Ok(texture) => texture,
            Err(e) => {
                gl.delete_texture(diffuse_map);
                return Err(e.into());
            }
        };

        let mut cube = cube_mesh();
        cube.set_color(CUBE_COLOR);
        cube.upload(gl)?;

        let mut light = cube_mesh();
        light.set_color([1.0; 3]);
        light.upload(gl)?;

        Ok(Self {
            gl: gl.clone(),
            camera: Camera::new(Vec3::new(0.0, 0.0, 3.0), -90.0, 0.0, 45.0, Vec3::Y),
            shader,
            light_shader,
            cube,
            light,
            diffuse_map,
            specular_map,
        })
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }
}

impl Demo for LightingDemo {
    fn name(&self) -> &'static str {
        "lighting"
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

    fn render(&mut self, width: u32, height: u32, elapsed: f32) -> Result<(), DemoError> {
        let gl = &self.gl;
        gl.viewport(width, height);
        gl.set_enabled(glow::DEPTH_TEST, true);
        gl.clear_color(CLEAR_COLOR);
        gl.clear(glow::COLOR_BUFFER_BIT | glow::DEPTH_BUFFER_BIT);

        let view = self.camera.view_matrix();
        let projection = self.camera.projection_matrix(aspect_ratio(width, height), 0.1, 100.0);
        let light_position = light_position(elapsed);
        let light_color = light_color(elapsed);

        self.shader.activate();
        self.shader.set_mat4("view", &view);
        self.shader.set_mat4("projection", &projection);
        self.shader.set_vec3("viewPosition", self.camera.position());
        // lighting is computed in view space
        self.shader.set_vec3("light.position", view.transform_point3(light_position));
        self.shader.set_vec3("light.ambient", light_color * 0.2 * 0.75);
        self.shader.set_vec3("light.diffuse", light_color * 0.75);
        self.shader.set_vec3("light.specular", light_color);

        gl.active_texture(0);
        gl.bind_texture(Some(self.diffuse_map));
        gl.active_texture(1);
        gl.bind_texture(Some(self.specular_map));
        gl.active_texture(0);

        let axis = Vec3::new(0.5, 1.0, 0.0).normalize();
        self.cube.bind();
        for (i, position) in CUBE_POSITIONS.iter().enumerate() {
            let angle = elapsed * ((i as f32) * 20.0).to_radians();
            let model = Mat4::from_translation(*position) * Mat4::from_axis_angle(axis, angle);
            self.shader.set_mat4("model", &model);
            self.cube.draw()?;
        }
        self.cube.unbind();

        self.light_shader.activate();
        self.light_shader.set_mat4("view", &view);
        self.light_shader.set_mat4("projection", &projection);
        self.light_shader.set_vec3("lightColor", light_color);
        let model = Mat4::from_translation(light_position) * Mat4::from_scale(Vec3::splat(0.2));
        self.light_shader.set_mat4("model", &model);

        self.light.bind();
        self.light.draw()?;
        self.light.unbind();
        Ok(())
    }
}

impl Drop for LightingDemo {
    fn drop(&mut self) {
        self.gl.delete_texture(self.diffuse_map);
        self.gl.delete_texture(self.specular_map);
    }
}

use crate::engine::components::mesh::{ Element, Mesh, Vertex };
use crate::engine::components::shader::ShaderProgram;
use crate::engine::config::AppConfig;
use crate::engine::rendering::Gl;

use super::{ Demo, DemoError };

const CLEAR_COLOR: [f32; 4] = [0.2, 0.3, 0.3, 1.0];

/// One vertex-colored triangle in clip space.
pub struct TriangleDemo {
    gl: Gl,
    shader: ShaderProgram,
    mesh: Mesh,
}

impl TriangleDemo {
    pub fn new(gl: &Gl, config: &AppConfig) -> Result<Self, DemoError> {
        let mut shader = ShaderProgram::new(
            gl.clone(),
            config.shader_path("triangle.vs"),
            config.shader_path("triangle.fs")
        );
        shader.compile()?;

        let normal = [0.0, 0.0, 1.0];
        let mut mesh = Mesh::new(
            vec![
                Vertex::new([-0.5, -0.5, 0.0], normal, [1.0, 0.0, 0.0], [0.0, 0.0]),
                Vertex::new([0.5, -0.5, 0.0], normal, [0.0, 1.0, 0.0], [1.0, 0.0]),
                Vertex::new([0.0, 0.5, 0.0], normal, [0.0, 0.0, 1.0], [0.5, 1.0])
            ],
            vec![Element::new(0, 1, 2)]
        );
        mesh.upload(gl)?;

        Ok(Self { gl: gl.clone(), shader, mesh })
    }
}

impl Demo for TriangleDemo {
    fn name(&self) -> &'static str {
        "triangle"
    }

    fn captures_cursor(&self) -> bool {
        false
    }

    fn render(&mut self, width: u32, height: u32, _elapsed: f32) -> Result<(), DemoError> {
        self.gl.viewport(width, height);
        self.gl.clear_color(CLEAR_COLOR);
        self.gl.clear(glow::COLOR_BUFFER_BIT);

        self.shader.activate();
        self.mesh.bind();
        self.mesh.draw()?;
        self.mesh.unbind();
        Ok(())
    }
}

use std::path::{ Path, PathBuf };
use glam::{ Mat4, Vec2, Vec3 };
use thiserror::Error;

use crate::engine::rendering::{ Gl, ShaderStage, UniformValue };

#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("cannot read shader file {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{stage} shader compilation error: {log}")]
    Compile {
        stage: ShaderStage,
        log: String,
    },
    #[error("cannot link shader program: {log}")]
    Link {
        log: String,
    },
    #[error("cannot create shader object: {0}")]
    Gpu(String),
}

/// A linked vertex + fragment program built from two source files.
///
/// Owns its GPU program exclusively and deletes it on drop.
pub struct ShaderProgram {
    gl: Gl,
    vertex_path: PathBuf,
    fragment_path: PathBuf,
    program: Option<glow::Program>,
}

impl ShaderProgram {
    pub fn new(gl: Gl, vertex_path: impl Into<PathBuf>, fragment_path: impl Into<PathBuf>) -> Self {
        Self {
            gl,
            vertex_path: vertex_path.into(),
            fragment_path: fragment_path.into(),
            program: None,
        }
    }

    /// Reads, compiles and links both stages.
    ///
    /// On success any previously linked program is released and replaced. On
    /// failure the current program (if any) is left as it was.
    pub fn compile(&mut self) -> Result<(), ShaderError> {
        let vertex_source = read_source(&self.vertex_path)?;
        let fragment_source = read_source(&self.fragment_path)?;

        let vertex = self.compile_stage(ShaderStage::Vertex, &vertex_source)?;
        let fragment = match self.compile_stage(ShaderStage::Fragment, &fragment_source) {
            Ok(fragment) => fragment,
            Err(e) => {
                self.gl.delete_shader(vertex);
                return Err(e);
            }
        };

        let linked = self.link(vertex, fragment);
        self.gl.delete_shader(vertex);
        self.gl.delete_shader(fragment);
        let program = linked?;

        if let Some(old) = self.program.replace(program) {
            self.gl.delete_program(old);
        }
        log::debug!(
            "Linked shader program from {} + {}",
            self.vertex_path.display(),
            self.fragment_path.display()
        );
        Ok(())
    }

    fn compile_stage(&self, stage: ShaderStage, source: &str) -> Result<glow::Shader, ShaderError> {
        let shader = self.gl.create_shader(stage).map_err(ShaderError::Gpu)?;
        if !self.gl.compile_shader(shader, source) {
            let log = self.gl.shader_info_log(shader);
            self.gl.delete_shader(shader);
            return Err(ShaderError::Compile { stage, log });
        }
        Ok(shader)
    }

    fn link(&self, vertex: glow::Shader, fragment: glow::Shader) -> Result<glow::Program, ShaderError> {
        let program = self.gl.create_program().map_err(ShaderError::Gpu)?;
        if !self.gl.link_program(program, &[vertex, fragment]) {
            let log = self.gl.program_info_log(program);
            self.gl.delete_program(program);
            return Err(ShaderError::Link { log });
        }
        Ok(program)
    }

    /// Makes this program current. An uncompiled shader unbinds any program.
    pub fn activate(&self) {
        self.gl.use_program(self.program);
    }

    pub fn program(&self) -> Option<glow::Program> {
        self.program
    }

    pub fn vertex_path(&self) -> &Path {
        &self.vertex_path
    }

    pub fn fragment_path(&self) -> &Path {
        &self.fragment_path
    }

    pub fn uniform_location(&self, name: &str) -> Option<glow::UniformLocation> {
        self.program.and_then(|program| self.gl.uniform_location(program, name))
    }

    // Unknown names resolve to no location and the write is dropped, as GL does
    // for location -1.
    fn set(&self, name: &str, value: UniformValue) {
        if let Some(location) = self.uniform_location(name) {
            self.gl.set_uniform(&location, value);
        }
    }

    pub fn set_bool(&self, name: &str, value: bool) {
        self.set(name, UniformValue::Int(value as i32));
    }

    pub fn set_int(&self, name: &str, value: i32) {
        self.set(name, UniformValue::Int(value));
    }

    pub fn set_float(&self, name: &str, value: f32) {
        self.set(name, UniformValue::Float(value));
    }

    pub fn set_vec2(&self, name: &str, value: Vec2) {
        self.set(name, UniformValue::Vec2(value.to_array()));
    }

    pub fn set_vec3(&self, name: &str, value: Vec3) {
        self.set(name, UniformValue::Vec3(value.to_array()));
    }

    pub fn set_mat4(&self, name: &str, value: &Mat4) {
        self.set(name, UniformValue::Mat4(value.to_cols_array()));
    }
}

impl Drop for ShaderProgram {
    fn drop(&mut self) {
        if let Some(program) = self.program.take() {
            self.gl.delete_program(program);
        }
    }
}

fn read_source(path: &Path) -> Result<String, ShaderError> {
    std::fs::read_to_string(path).map_err(|source| ShaderError::Source {
        path: path.to_path_buf(),
        source,
    })
}

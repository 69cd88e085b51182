//! In-memory `GlDevice` used by unit tests.

use std::cell::{ Cell, RefCell };
use std::collections::{ HashMap, HashSet };
use std::num::NonZeroU32;
use std::rc::Rc;

use super::device::{ BufferTarget, Gl, GlDevice, ShaderStage, UniformValue, VertexAttribute };
use crate::engine::loaders::texture_loader::TextureImage;

#[derive(Default)]
pub struct RecordingDevice {
    next_id: Cell<u32>,
    /// Sources containing this marker fail to compile.
    pub compile_error_marker: RefCell<Option<String>>,
    pub fail_link: Cell<bool>,
    hidden_uniforms: RefCell<HashSet<String>>,
    uniform_names: RefCell<HashMap<u32, String>>,

    pub live_shaders: RefCell<HashSet<u32>>,
    pub live_programs: RefCell<HashSet<u32>>,
    pub live_vertex_arrays: RefCell<HashSet<u32>>,
    pub live_buffers: RefCell<HashSet<u32>>,
    pub live_textures: RefCell<HashSet<u32>>,

    pub bound_vertex_array: Cell<Option<u32>>,
    pub current_program: Cell<Option<u32>>,
    pub active_unit: Cell<u32>,
    pub uniform_writes: RefCell<Vec<(String, UniformValue)>>,
    pub texture_bindings: RefCell<Vec<(u32, Option<u32>)>>,
    pub texture_uploads: Cell<usize>,
    pub buffer_uploads: Cell<usize>,
    pub attributes: RefCell<Vec<VertexAttribute>>,
    pub draws: RefCell<Vec<i32>>,
}

impl RecordingDevice {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn gl(self: &Rc<Self>) -> Gl {
        self.clone()
    }

    pub fn hide_uniform(&self, name: &str) {
        self.hidden_uniforms.borrow_mut().insert(name.to_string());
    }

    pub fn written(&self, name: &str) -> Vec<UniformValue> {
        self.uniform_writes
            .borrow()
            .iter()
            .filter(|(n, _)| n == name)
            .map(|(_, v)| *v)
            .collect()
    }

    fn next(&self) -> NonZeroU32 {
        let id = self.next_id.get() + 1;
        self.next_id.set(id);
        NonZeroU32::new(id).unwrap()
    }
}

impl GlDevice for RecordingDevice {
    fn create_shader(&self, _stage: ShaderStage) -> Result<glow::Shader, String> {
        let id = self.next();
        self.live_shaders.borrow_mut().insert(id.get());
        Ok(glow::NativeShader(id))
    }

    fn compile_shader(&self, _shader: glow::Shader, source: &str) -> bool {
        match self.compile_error_marker.borrow().as_deref() {
            Some(marker) => !source.contains(marker),
            None => true,
        }
    }

    fn shader_info_log(&self, _shader: glow::Shader) -> String {
        "0:1(1): error: syntax error".to_string()
    }

    fn delete_shader(&self, shader: glow::Shader) {
        self.live_shaders.borrow_mut().remove(&shader.0.get());
    }

    fn create_program(&self) -> Result<glow::Program, String> {
        let id = self.next();
        self.live_programs.borrow_mut().insert(id.get());
        Ok(glow::NativeProgram(id))
    }

    fn link_program(&self, _program: glow::Program, _stages: &[glow::Shader]) -> bool {
        !self.fail_link.get()
    }

    fn program_info_log(&self, _program: glow::Program) -> String {
        "error: vertex output not consumed".to_string()
    }

    fn delete_program(&self, program: glow::Program) {
        self.live_programs.borrow_mut().remove(&program.0.get());
    }

    fn use_program(&self, program: Option<glow::Program>) {
        self.current_program.set(program.map(|p| p.0.get()));
    }

    fn uniform_location(&self, _program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        if self.hidden_uniforms.borrow().contains(name) {
            return None;
        }
        let id = self.next().get();
        self.uniform_names.borrow_mut().insert(id, name.to_string());
        Some(glow::NativeUniformLocation(id))
    }

    fn set_uniform(&self, location: &glow::UniformLocation, value: UniformValue) {
        let name = self.uniform_names.borrow().get(&location.0).cloned().unwrap_or_default();
        self.uniform_writes.borrow_mut().push((name, value));
    }

    fn create_vertex_array(&self) -> Result<glow::VertexArray, String> {
        let id = self.next();
        self.live_vertex_arrays.borrow_mut().insert(id.get());
        Ok(glow::NativeVertexArray(id))
    }

    fn delete_vertex_array(&self, vao: glow::VertexArray) {
        self.live_vertex_arrays.borrow_mut().remove(&vao.0.get());
    }

    fn bind_vertex_array(&self, vao: Option<glow::VertexArray>) {
        self.bound_vertex_array.set(vao.map(|v| v.0.get()));
    }

    fn create_buffer(&self) -> Result<glow::Buffer, String> {
        let id = self.next();
        self.live_buffers.borrow_mut().insert(id.get());
        Ok(glow::NativeBuffer(id))
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        self.live_buffers.borrow_mut().remove(&buffer.0.get());
    }

    fn bind_buffer(&self, _target: BufferTarget, _buffer: Option<glow::Buffer>) {}

    fn buffer_data(&self, _target: BufferTarget, _data: &[u8]) {
        self.buffer_uploads.set(self.buffer_uploads.get() + 1);
    }

    fn vertex_attribute(&self, attribute: &VertexAttribute) {
        self.attributes.borrow_mut().push(*attribute);
    }

    fn draw_elements(&self, index_count: i32) {
        self.draws.borrow_mut().push(index_count);
    }

    fn create_texture(&self) -> Result<glow::Texture, String> {
        let id = self.next();
        self.live_textures.borrow_mut().insert(id.get());
        Ok(glow::NativeTexture(id))
    }

    fn delete_texture(&self, texture: glow::Texture) {
        self.live_textures.borrow_mut().remove(&texture.0.get());
    }

    fn upload_texture(&self, _texture: glow::Texture, _image: &TextureImage) {
        self.texture_uploads.set(self.texture_uploads.get() + 1);
    }

    fn active_texture(&self, unit: u32) {
        self.active_unit.set(unit);
    }

    fn bind_texture(&self, texture: Option<glow::Texture>) {
        self.texture_bindings
            .borrow_mut()
            .push((self.active_unit.get(), texture.map(|t| t.0.get())));
    }

    fn viewport(&self, _width: u32, _height: u32) {}

    fn clear_color(&self, _color: [f32; 4]) {}

    fn clear(&self, _mask: u32) {}

    fn set_enabled(&self, _capability: u32, _enabled: bool) {}

    fn stencil_op(&self, _stencil_fail: u32, _depth_fail: u32, _pass: u32) {}

    fn stencil_func(&self, _func: u32, _reference: i32, _mask: u32) {}

    fn stencil_mask(&self, _mask: u32) {}

    fn version(&self) -> String {
        "recording".to_string()
    }
}

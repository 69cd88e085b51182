use std::fmt;
use std::rc::Rc;
use glow::HasContext;

use crate::engine::loaders::texture_loader::TextureImage;

/// Shared handle to the GL device used by every GPU-backed component.
///
/// Single-threaded by construction: the window thread owns the context.
pub type Gl = Rc<dyn GlDevice>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

impl ShaderStage {
    pub fn gl_enum(self) -> u32 {
        match self {
            ShaderStage::Vertex => glow::VERTEX_SHADER,
            ShaderStage::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for ShaderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStage::Vertex => f.write_str("vertex"),
            ShaderStage::Fragment => f.write_str("fragment"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferTarget {
    Vertices,
    Indices,
}

impl BufferTarget {
    pub fn gl_enum(self) -> u32 {
        match self {
            BufferTarget::Vertices => glow::ARRAY_BUFFER,
            BufferTarget::Indices => glow::ELEMENT_ARRAY_BUFFER,
        }
    }
}

/// Value written into a uniform slot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UniformValue {
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    /// Column-major 4x4 matrix.
    Mat4([f32; 16]),
}

/// One float attribute slot inside an interleaved vertex record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VertexAttribute {
    pub location: u32,
    pub components: i32,
    pub offset: i32,
    pub stride: i32,
}

/// The OpenGL calls the engine issues.
///
/// Implemented for `glow::Context`; handles are glow's native handle types so a
/// `None` handle plays the role of GL's object name 0.
pub trait GlDevice {
    fn create_shader(&self, stage: ShaderStage) -> Result<glow::Shader, String>;
    /// Uploads the source and compiles it, returning the compile status.
    fn compile_shader(&self, shader: glow::Shader, source: &str) -> bool;
    fn shader_info_log(&self, shader: glow::Shader) -> String;
    fn delete_shader(&self, shader: glow::Shader);

    fn create_program(&self) -> Result<glow::Program, String>;
    /// Attaches every stage and links, returning the link status.
    fn link_program(&self, program: glow::Program, stages: &[glow::Shader]) -> bool;
    fn program_info_log(&self, program: glow::Program) -> String;
    fn delete_program(&self, program: glow::Program);
    fn use_program(&self, program: Option<glow::Program>);
    fn uniform_location(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation>;
    fn set_uniform(&self, location: &glow::UniformLocation, value: UniformValue);

    fn create_vertex_array(&self) -> Result<glow::VertexArray, String>;
    fn delete_vertex_array(&self, vao: glow::VertexArray);
    fn bind_vertex_array(&self, vao: Option<glow::VertexArray>);
    fn create_buffer(&self) -> Result<glow::Buffer, String>;
    fn delete_buffer(&self, buffer: glow::Buffer);
    fn bind_buffer(&self, target: BufferTarget, buffer: Option<glow::Buffer>);
    /// Replaces the contents of the buffer bound to `target` (STATIC_DRAW).
    fn buffer_data(&self, target: BufferTarget, data: &[u8]);
    fn vertex_attribute(&self, attribute: &VertexAttribute);
    /// Indexed triangle draw with `u32` indices from the bound vertex array.
    fn draw_elements(&self, index_count: i32);

    fn create_texture(&self) -> Result<glow::Texture, String>;
    fn delete_texture(&self, texture: glow::Texture);
    /// Uploads pixels into a 2D texture, builds mipmaps, sets repeat wrap and
    /// trilinear filtering. Leaves no texture bound.
    fn upload_texture(&self, texture: glow::Texture, image: &TextureImage);
    /// Selects texture unit `TEXTURE0 + unit`.
    fn active_texture(&self, unit: u32);
    fn bind_texture(&self, texture: Option<glow::Texture>);

    fn viewport(&self, width: u32, height: u32);
    fn clear_color(&self, color: [f32; 4]);
    fn clear(&self, mask: u32);
    fn set_enabled(&self, capability: u32, enabled: bool);
    fn stencil_op(&self, stencil_fail: u32, depth_fail: u32, pass: u32);
    fn stencil_func(&self, func: u32, reference: i32, mask: u32);
    fn stencil_mask(&self, mask: u32);
    fn version(&self) -> String;
}

impl GlDevice for glow::Context {
    fn create_shader(&self, stage: ShaderStage) -> Result<glow::Shader, String> {
        unsafe { HasContext::create_shader(self, stage.gl_enum()) }
    }

    fn compile_shader(&self, shader: glow::Shader, source: &str) -> bool {
        unsafe {
            self.shader_source(shader, source);
            HasContext::compile_shader(self, shader);
            self.get_shader_compile_status(shader)
        }
    }

    fn shader_info_log(&self, shader: glow::Shader) -> String {
        unsafe { self.get_shader_info_log(shader) }
    }

    fn delete_shader(&self, shader: glow::Shader) {
        unsafe { HasContext::delete_shader(self, shader) }
    }

    fn create_program(&self) -> Result<glow::Program, String> {
        unsafe { HasContext::create_program(self) }
    }

    fn link_program(&self, program: glow::Program, stages: &[glow::Shader]) -> bool {
        unsafe {
            for stage in stages {
                self.attach_shader(program, *stage);
            }
            HasContext::link_program(self, program);
            for stage in stages {
                self.detach_shader(program, *stage);
            }
            self.get_program_link_status(program)
        }
    }

    fn program_info_log(&self, program: glow::Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn delete_program(&self, program: glow::Program) {
        unsafe { HasContext::delete_program(self, program) }
    }

    fn use_program(&self, program: Option<glow::Program>) {
        unsafe { HasContext::use_program(self, program) }
    }

    fn uniform_location(&self, program: glow::Program, name: &str) -> Option<glow::UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn set_uniform(&self, location: &glow::UniformLocation, value: UniformValue) {
        let location = Some(location);
        unsafe {
            match value {
                UniformValue::Int(v) => self.uniform_1_i32(location, v),
                UniformValue::Float(v) => self.uniform_1_f32(location, v),
                UniformValue::Vec2([x, y]) => self.uniform_2_f32(location, x, y),
                UniformValue::Vec3([x, y, z]) => self.uniform_3_f32(location, x, y, z),
                UniformValue::Mat4(m) => self.uniform_matrix_4_f32_slice(location, false, &m),
            }
        }
    }

    fn create_vertex_array(&self) -> Result<glow::VertexArray, String> {
        unsafe { HasContext::create_vertex_array(self) }
    }

    fn delete_vertex_array(&self, vao: glow::VertexArray) {
        unsafe { HasContext::delete_vertex_array(self, vao) }
    }

    fn bind_vertex_array(&self, vao: Option<glow::VertexArray>) {
        unsafe { HasContext::bind_vertex_array(self, vao) }
    }

    fn create_buffer(&self) -> Result<glow::Buffer, String> {
        unsafe { HasContext::create_buffer(self) }
    }

    fn delete_buffer(&self, buffer: glow::Buffer) {
        unsafe { HasContext::delete_buffer(self, buffer) }
    }

    fn bind_buffer(&self, target: BufferTarget, buffer: Option<glow::Buffer>) {
        unsafe { HasContext::bind_buffer(self, target.gl_enum(), buffer) }
    }

    fn buffer_data(&self, target: BufferTarget, data: &[u8]) {
        unsafe { self.buffer_data_u8_slice(target.gl_enum(), data, glow::STATIC_DRAW) }
    }

    fn vertex_attribute(&self, attribute: &VertexAttribute) {
        unsafe {
            self.vertex_attrib_pointer_f32(
                attribute.location,
                attribute.components,
                glow::FLOAT,
                false,
                attribute.stride,
                attribute.offset
            );
            self.enable_vertex_attrib_array(attribute.location);
        }
    }

    fn draw_elements(&self, index_count: i32) {
        unsafe { HasContext::draw_elements(self, glow::TRIANGLES, index_count, glow::UNSIGNED_INT, 0) }
    }

    fn create_texture(&self) -> Result<glow::Texture, String> {
        unsafe { HasContext::create_texture(self) }
    }

    fn delete_texture(&self, texture: glow::Texture) {
        unsafe { HasContext::delete_texture(self, texture) }
    }

    fn upload_texture(&self, texture: glow::Texture, image: &TextureImage) {
        let format = image.format.gl_enum();
        unsafe {
            HasContext::bind_texture(self, glow::TEXTURE_2D, Some(texture));
            // rows of RGB/red images are not 4-byte aligned in general
            self.pixel_store_i32(glow::UNPACK_ALIGNMENT, 1);
            self.tex_image_2d(
                glow::TEXTURE_2D,
                0,
                format as i32,
                image.width as i32,
                image.height as i32,
                0,
                format,
                glow::UNSIGNED_BYTE,
                glow::PixelUnpackData::Slice(Some(image.pixels.as_slice()))
            );
            self.generate_mipmap(glow::TEXTURE_2D);

            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_S, glow::REPEAT as i32);
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_WRAP_T, glow::REPEAT as i32);
            self.tex_parameter_i32(
                glow::TEXTURE_2D,
                glow::TEXTURE_MIN_FILTER,
                glow::LINEAR_MIPMAP_LINEAR as i32
            );
            self.tex_parameter_i32(glow::TEXTURE_2D, glow::TEXTURE_MAG_FILTER, glow::LINEAR as i32);

            HasContext::bind_texture(self, glow::TEXTURE_2D, None);
        }
    }

    fn active_texture(&self, unit: u32) {
        unsafe { HasContext::active_texture(self, glow::TEXTURE0 + unit) }
    }

    fn bind_texture(&self, texture: Option<glow::Texture>) {
        unsafe { HasContext::bind_texture(self, glow::TEXTURE_2D, texture) }
    }

    fn viewport(&self, width: u32, height: u32) {
        unsafe { HasContext::viewport(self, 0, 0, width as i32, height as i32) }
    }

    fn clear_color(&self, color: [f32; 4]) {
        let [r, g, b, a] = color;
        unsafe { HasContext::clear_color(self, r, g, b, a) }
    }

    fn clear(&self, mask: u32) {
        unsafe { HasContext::clear(self, mask) }
    }

    fn set_enabled(&self, capability: u32, enabled: bool) {
        unsafe {
            if enabled {
                self.enable(capability);
            } else {
                self.disable(capability);
            }
        }
    }

    fn stencil_op(&self, stencil_fail: u32, depth_fail: u32, pass: u32) {
        unsafe { HasContext::stencil_op(self, stencil_fail, depth_fail, pass) }
    }

    fn stencil_func(&self, func: u32, reference: i32, mask: u32) {
        unsafe { HasContext::stencil_func(self, func, reference, mask) }
    }

    fn stencil_mask(&self, mask: u32) {
        unsafe { HasContext::stencil_mask(self, mask) }
    }

    fn version(&self) -> String {
        unsafe { self.get_parameter_string(glow::VERSION) }
    }
}

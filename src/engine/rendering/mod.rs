pub mod device;
#[cfg(test)]
pub mod recording;

pub use device::{ BufferTarget, Gl, GlDevice, ShaderStage, UniformValue, VertexAttribute };

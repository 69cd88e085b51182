use std::mem::{ offset_of, size_of };
use bytemuck::{ Pod, Zeroable };
use thiserror::Error;

use crate::engine::rendering::{ BufferTarget, Gl, VertexAttribute };

#[derive(Debug, Error)]
pub enum MeshError {
    #[error("mesh has no GPU buffers; upload it first")]
    NotInitialized,
    #[error("element {element} references vertex {index} but the mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        element: usize,
        index: u32,
        vertex_count: usize,
    },
    #[error("cannot create GPU buffer: {0}")]
    Gpu(String),
}

/// Interleaved vertex record as laid out in the vertex buffer.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub tex_coord: [f32; 2],
}

impl Vertex {
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 3], tex_coord: [f32; 2]) -> Self {
        Self { position, normal, color, tex_coord }
    }
}

/// One triangle as three indices into the vertex list.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct Element {
    pub indices: [u32; 3],
}

impl Element {
    pub fn new(a: u32, b: u32, c: u32) -> Self {
        Self { indices: [a, b, c] }
    }
}

const STRIDE: i32 = size_of::<Vertex>() as i32;

const LAYOUT: [VertexAttribute; 4] = [
    VertexAttribute { location: 0, components: 3, offset: offset_of!(Vertex, position) as i32, stride: STRIDE },
    VertexAttribute { location: 1, components: 3, offset: offset_of!(Vertex, normal) as i32, stride: STRIDE },
    VertexAttribute { location: 2, components: 3, offset: offset_of!(Vertex, color) as i32, stride: STRIDE },
    VertexAttribute { location: 3, components: 2, offset: offset_of!(Vertex, tex_coord) as i32, stride: STRIDE },
];

/// GPU mirror of a mesh: either nothing or all three objects.
enum GpuState {
    Uninitialized,
    Uploaded {
        gl: Gl,
        vao: glow::VertexArray,
        vbo: glow::Buffer,
        ibo: glow::Buffer,
    },
}

pub struct Mesh {
    vertices: Vec<Vertex>,
    elements: Vec<Element>,
    gpu: GpuState,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, elements: Vec<Element>) -> Self {
        Self {
            vertices,
            elements,
            gpu: GpuState::Uninitialized,
        }
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn set_color(&mut self, color: [f32; 3]) {
        for vertex in &mut self.vertices {
            vertex.color = color;
        }
    }

    pub fn is_uploaded(&self) -> bool {
        matches!(self.gpu, GpuState::Uploaded { .. })
    }

    pub fn index_count(&self) -> usize {
        self.elements.len() * 3
    }

    /// Checks that every element index points at an existing vertex.
    pub fn validate(&self) -> Result<(), MeshError> {
        let vertex_count = self.vertices.len();
        for (element, triangle) in self.elements.iter().enumerate() {
            if let Some(&index) = triangle.indices.iter().find(|&&i| (i as usize) >= vertex_count) {
                return Err(MeshError::IndexOutOfRange { element, index, vertex_count });
            }
        }
        Ok(())
    }

    /// Creates the vertex array and both buffers and uploads the current data.
    ///
    /// Does nothing when the mesh is already on the GPU. If any object cannot be
    /// created the ones made so far are released and the mesh stays CPU-only.
    pub fn upload(&mut self, gl: &Gl) -> Result<(), MeshError> {
        if self.is_uploaded() {
            log::debug!("Mesh already uploaded, skipping");
            return Ok(());
        }

        let vao = gl.create_vertex_array().map_err(MeshError::Gpu)?;
        let vbo = match gl.create_buffer() {
            Ok(vbo) => vbo,
            Err(e) => {
                gl.delete_vertex_array(vao);
                return Err(MeshError::Gpu(e));
            }
        };
        let ibo = match gl.create_buffer() {
            Ok(ibo) => ibo,
            Err(e) => {
                gl.delete_buffer(vbo);
                gl.delete_vertex_array(vao);
                return Err(MeshError::Gpu(e));
            }
        };

        gl.bind_vertex_array(Some(vao));

        gl.bind_buffer(BufferTarget::Indices, Some(ibo));
        gl.buffer_data(BufferTarget::Indices, bytemuck::cast_slice(&self.elements));

        gl.bind_buffer(BufferTarget::Vertices, Some(vbo));
        gl.buffer_data(BufferTarget::Vertices, bytemuck::cast_slice(&self.vertices));

        for attribute in &LAYOUT {
            gl.vertex_attribute(attribute);
        }

        gl.bind_vertex_array(None);
        gl.bind_buffer(BufferTarget::Indices, None);
        gl.bind_buffer(BufferTarget::Vertices, None);

        log::debug!(
            "Uploaded mesh: {} vertices, {} triangles",
            self.vertices.len(),
            self.elements.len()
        );
        self.gpu = GpuState::Uploaded { gl: gl.clone(), vao, vbo, ibo };
        Ok(())
    }

    /// Pushes the current CPU data into the existing buffers.
    pub fn reupload(&mut self) -> Result<(), MeshError> {
        let GpuState::Uploaded { gl, vao, vbo, ibo } = &self.gpu else {
            return Err(MeshError::NotInitialized);
        };

        gl.bind_vertex_array(Some(*vao));

        gl.bind_buffer(BufferTarget::Indices, Some(*ibo));
        gl.buffer_data(BufferTarget::Indices, bytemuck::cast_slice(&self.elements));

        gl.bind_buffer(BufferTarget::Vertices, Some(*vbo));
        gl.buffer_data(BufferTarget::Vertices, bytemuck::cast_slice(&self.vertices));

        gl.bind_vertex_array(None);
        gl.bind_buffer(BufferTarget::Indices, None);
        gl.bind_buffer(BufferTarget::Vertices, None);
        Ok(())
    }

    pub fn bind(&self) {
        if let GpuState::Uploaded { gl, vao, .. } = &self.gpu {
            gl.bind_vertex_array(Some(*vao));
        }
    }

    pub fn unbind(&self) {
        if let GpuState::Uploaded { gl, .. } = &self.gpu {
            gl.bind_vertex_array(None);
        }
    }

    /// Issues the indexed draw for this mesh. Expects the mesh to be bound.
    pub fn draw(&self) -> Result<(), MeshError> {
        let GpuState::Uploaded { gl, .. } = &self.gpu else {
            return Err(MeshError::NotInitialized);
        };
        gl.draw_elements(self.index_count() as i32);
        Ok(())
    }
}

impl Clone for Mesh {
    /// Copies the CPU data. An uploaded source gets its own fresh GPU objects.
    fn clone(&self) -> Self {
        let mut mesh = Mesh::new(self.vertices.clone(), self.elements.clone());
        if let GpuState::Uploaded { gl, .. } = &self.gpu {
            if let Err(e) = mesh.upload(gl) {
                log::error!("Failed to upload cloned mesh: {}", e);
            }
        }
        mesh
    }
}

impl std::fmt::Debug for Mesh {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mesh")
            .field("vertices", &self.vertices.len())
            .field("elements", &self.elements.len())
            .field("uploaded", &self.is_uploaded())
            .finish()
    }
}

impl Drop for Mesh {
    fn drop(&mut self) {
        if let GpuState::Uploaded { gl, vao, vbo, ibo } = &self.gpu {
            gl.delete_buffer(*ibo);
            gl.delete_buffer(*vbo);
            gl.delete_vertex_array(*vao);
        }
    }
}

// position, normal, uv per corner; four corners per face
#[rustfmt::skip]
const CUBE_CORNERS: [[f32; 8]; 24] = [
    [-0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 0.0],
    [ 0.5, -0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  1.0, 1.0],
    [-0.5,  0.5, -0.5,  0.0,  0.0, -1.0,  0.0, 1.0],

    [-0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 0.0],
    [ 0.5, -0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 0.0],
    [ 0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  1.0, 1.0],
    [-0.5,  0.5,  0.5,  0.0,  0.0,  1.0,  0.0, 1.0],

    [-0.5,  0.5,  0.5, -1.0,  0.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5, -0.5, -1.0,  0.0,  0.0,  1.0, 1.0],
    [-0.5, -0.5, -0.5, -1.0,  0.0,  0.0,  0.0, 1.0],
    [-0.5, -0.5,  0.5, -1.0,  0.0,  0.0,  0.0, 0.0],

    [ 0.5,  0.5,  0.5,  1.0,  0.0,  0.0,  1.0, 0.0],
    [ 0.5,  0.5, -0.5,  1.0,  0.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5, -0.5,  1.0,  0.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5,  0.5,  1.0,  0.0,  0.0,  0.0, 0.0],

    [-0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  0.0, 1.0],
    [ 0.5, -0.5, -0.5,  0.0, -1.0,  0.0,  1.0, 1.0],
    [ 0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  1.0, 0.0],
    [-0.5, -0.5,  0.5,  0.0, -1.0,  0.0,  0.0, 0.0],

    [-0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  0.0, 1.0],
    [ 0.5,  0.5, -0.5,  0.0,  1.0,  0.0,  1.0, 1.0],
    [ 0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  1.0, 0.0],
    [-0.5,  0.5,  0.5,  0.0,  1.0,  0.0,  0.0, 0.0],
];

/// Unit cube centred on the origin: 24 vertices (own normal and uvs per face),
/// 12 triangles. Not uploaded.
pub fn cube_mesh() -> Mesh {
    let vertices = CUBE_CORNERS
        .iter()
        .map(|c| Vertex::new([c[0], c[1], c[2]], [c[3], c[4], c[5]], [0.0; 3], [c[6], c[7]]))
        .collect();

    let elements = (0..6u32)
        .flat_map(|face| {
            let base = face * 4;
            [Element::new(base, base + 1, base + 2), Element::new(base + 2, base + 3, base)]
        })
        .collect();

    Mesh::new(vertices, elements)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::rendering::recording::RecordingDevice;

    fn triangle() -> (Vec<Vertex>, Vec<Element>) {
        let vertices = vec![
            Vertex::new([-0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 0.0]),
            Vertex::new([0.5, -0.5, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0], [1.0, 0.0]),
            Vertex::new([0.0, 0.5, 0.0], [0.0, 0.0, 1.0], [0.0, 0.0, 1.0], [0.5, 1.0]),
        ];
        (vertices, vec![Element::new(0, 1, 2)])
    }

    #[test]
    fn vertex_layout_matches_attribute_offsets() {
        assert_eq!(size_of::<Vertex>(), 44);
        assert_eq!(size_of::<Element>(), 12);
        let offsets: Vec<i32> = LAYOUT.iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 12, 24, 36]);
    }

    #[test]
    fn construction_preserves_data() {
        let (vertices, elements) = triangle();
        let mesh = Mesh::new(vertices.clone(), elements.clone());
        assert_eq!(mesh.vertices(), vertices.as_slice());
        assert_eq!(mesh.elements(), elements.as_slice());
        assert!(!mesh.is_uploaded());
    }

    #[test]
    fn cube_has_24_vertices_and_12_triangles() {
        let cube = cube_mesh();
        assert_eq!(cube.vertices().len(), 24);
        assert_eq!(cube.elements().len(), 12);
        assert!(cube.elements().iter().all(|e| e.indices.iter().all(|&i| i < 24)));
        assert!(cube.validate().is_ok());
    }

    #[test]
    fn cube_normals_are_axis_aligned_per_face() {
        let cube = cube_mesh();
        for face in cube.vertices().chunks(4) {
            assert!(face.iter().all(|v| v.normal == face[0].normal));
            let length: f32 = face[0].normal.iter().map(|c| c * c).sum();
            assert_eq!(length, 1.0);
        }
    }

    #[test]
    fn validate_reports_out_of_range_index() {
        let (vertices, _) = triangle();
        let mesh = Mesh::new(vertices, vec![Element::new(0, 1, 2), Element::new(2, 3, 0)]);
        match mesh.validate() {
            Err(MeshError::IndexOutOfRange { element, index, vertex_count }) => {
                assert_eq!((element, index, vertex_count), (1, 3, 3));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn upload_bind_unbind_leaves_nothing_bound() {
        let device = RecordingDevice::new();
        let gl = device.gl();
        let mut mesh = cube_mesh();

        mesh.upload(&gl).unwrap();
        assert!(mesh.is_uploaded());
        assert_eq!(device.attributes.borrow().len(), 4);
        assert_eq!(device.bound_vertex_array.get(), None);

        mesh.bind();
        assert!(device.bound_vertex_array.get().is_some());
        mesh.draw().unwrap();
        mesh.unbind();
        assert_eq!(device.bound_vertex_array.get(), None);
        assert_eq!(*device.draws.borrow(), vec![36]);
    }

    #[test]
    fn reupload_requires_prior_upload() {
        let mut mesh = cube_mesh();
        assert!(matches!(mesh.reupload(), Err(MeshError::NotInitialized)));
        assert!(matches!(mesh.draw(), Err(MeshError::NotInitialized)));
    }

    #[test]
    fn reupload_reuses_existing_buffers() {
        let device = RecordingDevice::new();
        let mut mesh = cube_mesh();
        mesh.upload(&device.gl()).unwrap();
        let buffers = device.live_buffers.borrow().clone();

        mesh.set_color([1.0, 0.5, 0.31]);
        mesh.reupload().unwrap();
        assert_eq!(*device.live_buffers.borrow(), buffers);
        assert_eq!(device.buffer_uploads.get(), 4);
    }

    #[test]
    fn second_upload_is_a_no_op() {
        let device = RecordingDevice::new();
        let gl = device.gl();
        let mut mesh = cube_mesh();
        mesh.upload(&gl).unwrap();
        mesh.upload(&gl).unwrap();
        assert_eq!(device.live_vertex_arrays.borrow().len(), 1);
        assert_eq!(device.live_buffers.borrow().len(), 2);
    }

    #[test]
    fn clone_of_uploaded_mesh_gets_fresh_objects() {
        let device = RecordingDevice::new();
        let mut mesh = cube_mesh();
        mesh.upload(&device.gl()).unwrap();

        let copy = mesh.clone();
        assert!(copy.is_uploaded());
        assert_eq!(copy.vertices(), mesh.vertices());
        assert_eq!(device.live_vertex_arrays.borrow().len(), 2);
        assert_eq!(device.live_buffers.borrow().len(), 4);

        drop(mesh);
        assert_eq!(device.live_vertex_arrays.borrow().len(), 1);
        drop(copy);
        assert!(device.live_vertex_arrays.borrow().is_empty());
        assert!(device.live_buffers.borrow().is_empty());
    }

    #[test]
    fn clone_of_cpu_mesh_stays_cpu_only() {
        let (vertices, elements) = triangle();
        let mesh = Mesh::new(vertices, elements);
        assert!(!mesh.clone().is_uploaded());
    }
}

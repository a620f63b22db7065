use bytemuck::{Pod, Zeroable};

/// One skeletal bone as stored in a model file (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Bone {
    pub head: [f32; 3],
    pub rotation: [f32; 4],
    /// Index of the parent bone, `-1` for a root.
    pub parent: i32,
}

pub const BONE_RECORD_SIZE: usize = std::mem::size_of::<Bone>();

/// The vertex layout the built-in programs expect (32 bytes).
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub texcoord: [f32; 2],
    pub normal: [f32; 3],
}

pub const VERTEX_STRIDE: u8 = std::mem::size_of::<Vertex>() as u8;

/// Vertex data of one object plus its optional skeleton.
///
/// Vertices are opaque bytes; only the stride is known.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh {
    id: u8,
    vertices: Vec<u8>,
    vertex_count: u32,
    stride: u8,
    radius: f32,
    bones: Option<Box<[Bone]>>,
}

impl Mesh {
    pub fn new(id: u8, vertices: Vec<u8>, vertex_count: u32, stride: u8, radius: f32) -> Self {
        debug_assert_eq!(vertices.len(), vertex_count as usize * stride as usize);
        Self {
            id,
            vertices,
            vertex_count,
            stride,
            radius,
            bones: None,
        }
    }

    /// Build a mesh from typed vertices.
    pub fn from_vertices(id: u8, vertices: &[Vertex], radius: f32) -> Self {
        Self::new(
            id,
            bytemuck::cast_slice(vertices).to_vec(),
            vertices.len() as u32,
            VERTEX_STRIDE,
            radius,
        )
    }

    /// Attach a skeleton. An empty slice clears it.
    pub fn with_bones(mut self, bones: Vec<Bone>) -> Self {
        self.bones = (!bones.is_empty()).then(|| bones.into_boxed_slice());
        self
    }

    pub fn id(&self) -> u8 {
        self.id
    }

    pub fn vertices(&self) -> &[u8] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn stride(&self) -> u8 {
        self.stride
    }

    /// Bounding sphere radius around the model origin.
    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn bones(&self) -> Option<&[Bone]> {
        self.bones.as_deref()
    }
}

/// Axis-aligned triangle facing +Z, handy for demos and tests.
pub fn demo_triangle() -> [Vertex; 3] {
    let normal = [0.0, 0.0, 1.0];
    [
        Vertex {
            position: [-0.5, -0.5, 0.0],
            texcoord: [0.0, 0.0],
            normal,
        },
        Vertex {
            position: [0.5, -0.5, 0.0],
            texcoord: [1.0, 0.0],
            normal,
        },
        Vertex {
            position: [0.0, 0.5, 0.0],
            texcoord: [0.5, 1.0],
            normal,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_sizes() {
        assert_eq!(BONE_RECORD_SIZE, 32);
        assert_eq!(VERTEX_STRIDE, 32);
    }

    #[test]
    fn typed_vertices_become_raw_bytes() {
        let mesh = Mesh::from_vertices(1, &demo_triangle(), 0.75);
        assert_eq!(mesh.vertex_count(), 3);
        assert_eq!(mesh.vertices().len(), 96);
        assert_eq!(mesh.stride(), 32);
        assert!(mesh.bones().is_none());
    }

    #[test]
    fn empty_bone_list_is_no_skeleton() {
        let mesh = Mesh::from_vertices(0, &demo_triangle(), 1.0).with_bones(Vec::new());
        assert!(mesh.bones().is_none());

        let bone = Bone {
            head: [0.0; 3],
            rotation: [0.0, 0.0, 0.0, 1.0],
            parent: -1,
        };
        let mesh = mesh.with_bones(vec![bone; 2]);
        assert_eq!(mesh.bones().map(<[Bone]>::len), Some(2));
    }
}

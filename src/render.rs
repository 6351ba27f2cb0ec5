//! The data handed to the external renderer after a step.
use crate::{Scalar, Vec2};

/// A single particle, ready to be copied into a vertex buffer with `bytemuck::cast_slice`.
#[repr(C)]
#[derive(
    Copy,
    Clone,
    Debug,
    PartialEq,
    bytemuck::Pod,
    bytemuck::Zeroable,
    serde::Serialize,
    serde::Deserialize,
)]
pub struct Vertex {
    pub position: [f32; 2],
    pub color: [f32; 3],
}

impl Vertex {
    /// The color of each vertex is based on the magnitude of the velocity of the particle.
    pub fn new(position: Vec2, velocity: Vec2) -> Self {
        let vel = velocity.magnitude_squared() as f32;
        Vertex {
            position: [position.x as f32, position.y as f32],
            color: [vel.min(1.), 0.5 * vel.min(1.) + 0.5, 1.],
        }
    }

    pub fn world_position(&self) -> Vec2 {
        Vec2::new(self.position[0] as Scalar, self.position[1] as Scalar)
    }
}

/// The raw bytes of a slice of vertices, for uploading.
pub fn as_bytes(vertices: &[Vertex]) -> &[u8] {
    bytemuck::cast_slice(vertices)
}

use crate::{Scalar, Vec2};
use rayon::prelude::*;

/// One RGBA32F pixel. Two component quantities only use the first two channels.
pub type Texel = [f32; 4];

/// The side length of the smallest power of two square texture with room for `num_particles`.
pub fn texture_size(num_particles: usize) -> usize {
    let mut size = 1;
    while size * size < num_particles {
        size *= 2;
    }
    size
}

/// A square, flat buffer of texels, one per particle.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    size: usize,
    texels: Vec<Texel>,
}

impl Texture {
    pub fn zeros(size: usize) -> Self {
        Texture {
            size,
            texels: vec![[0.; 4]; size * size],
        }
    }

    pub fn from_vec2s(size: usize, values: &[Vec2]) -> Self {
        assert_eq!(values.len(), size * size, "texture needs one value per texel");
        Texture {
            size,
            texels: values.iter().map(|&v| texel(v)).collect(),
        }
    }

    /// Runs `shader` once for every texel, in parallel, and collects the results into a new
    /// texture. The shader only gets the texel's index, anything else it reads has to be
    /// captured.
    pub fn render<F>(size: usize, shader: F) -> Self
    where
        F: Fn(usize) -> Texel + Sync + Send,
    {
        Texture {
            size,
            texels: (0..size * size).into_par_iter().map(shader).collect(),
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn len(&self) -> usize {
        self.texels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.texels.is_empty()
    }

    pub fn texels(&self) -> &[Texel] {
        &self.texels
    }

    /// The first two channels of texel `i`
    pub fn vec2(&self, i: usize) -> Vec2 {
        let t = &self.texels[i];
        Vec2::new(t[0] as Scalar, t[1] as Scalar)
    }

    pub fn to_vec2s(&self) -> Vec<Vec2> {
        (0..self.len()).map(|i| self.vec2(i)).collect()
    }

    /// The texture as `size * size * 4` floats.
    pub fn as_floats(&self) -> &[f32] {
        bytemuck::cast_slice(&self.texels)
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.texels)
    }
}

pub fn texel(v: Vec2) -> Texel {
    [v.x as f32, v.y as f32, 0., 0.]
}

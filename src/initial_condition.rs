use crate::{Scalar, Vec2};
use itertools::iproduct;
use rand::{rngs::StdRng, Rng, SeedableRng};

/// Produces the starting positions of the particles in a domain `[0, bounds.x] x [0, bounds.y]`.
pub trait InitialCondition {
    fn positions(&self, bounds: Vec2) -> Vec<Vec2>;
}

/// A rectangular block of particles in the middle of the domain, with the same aspect ratio as
/// the domain.
pub struct Lattice {
    pub num_particles: usize,
    /// The distance between neighboring particles. It shrinks if the block wouldn't fit otherwise.
    pub spacing: Scalar,
    /// Particles are moved by up to half of this in each direction
    pub jitter: Scalar,
    pub seed: u64,
}

impl Default for Lattice {
    fn default() -> Self {
        Lattice {
            num_particles: 200,
            spacing: 0.5,
            jitter: 0.,
            seed: 0,
        }
    }
}

impl InitialCondition for Lattice {
    fn positions(&self, bounds: Vec2) -> Vec<Vec2> {
        if self.num_particles == 0 {
            return Vec::new();
        }

        let n = self.num_particles as Scalar;
        let cols = ((n * bounds.x / bounds.y).sqrt().ceil() as usize).clamp(1, self.num_particles);
        let rows = (self.num_particles + cols - 1) / cols;

        let spacing = self
            .spacing
            .min(bounds.x / cols as Scalar)
            .min(bounds.y / rows as Scalar);
        let extent = Vec2::new((cols - 1) as Scalar, (rows - 1) as Scalar) * spacing;
        let origin = (bounds - extent) / 2.;

        let mut rng = StdRng::seed_from_u64(self.seed);

        iproduct!(0..rows, 0..cols)
            .take(self.num_particles)
            .map(|(j, i)| {
                let pos = origin + Vec2::new(i as Scalar, j as Scalar) * spacing;
                if self.jitter > 0. {
                    let rand: Vec2 = rng.gen::<[Scalar; 2]>().into();
                    pos + (rand - Vec2::repeat(0.5)) * self.jitter
                } else {
                    pos
                }
            })
            .collect()
    }
}

/// Particles scattered uniformly over the whole domain.
pub struct RandomFill {
    pub num_particles: usize,
    pub seed: u64,
}

impl InitialCondition for RandomFill {
    fn positions(&self, bounds: Vec2) -> Vec<Vec2> {
        let mut rng = StdRng::seed_from_u64(self.seed);

        (0..self.num_particles)
            .map(|_| {
                let rand: Vec2 = rng.gen::<[Scalar; 2]>().into();
                rand.component_mul(&bounds)
            })
            .collect()
    }
}

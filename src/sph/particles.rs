use super::forces::Sample;
use crate::{Scalar, Vec2};

/// Contains all of the particle data: position, velocity, force, density and pressure.
///
/// Every particle has the same mass, which lives in `SphParameters`.
#[derive(Clone, Debug, Default)]
pub struct SphParticles {
    pub position: Vec<Vec2>,
    pub velocity: Vec<Vec2>,
    /// Accumulated over a step, and reset to zero by the integrator.
    pub force: Vec<Vec2>,
    pub density: Vec<Scalar>,
    pub pressure: Vec<Scalar>,
}

impl SphParticles {
    /// Adds a new particle at the given position. Force and pressure start at zero, the density
    /// starts at `self_density`, which is what it would be with no neighbors.
    pub(crate) fn add_particle(&mut self, position: Vec2, velocity: Vec2, self_density: Scalar) {
        self.position.push(position);
        self.velocity.push(velocity);
        self.force.push(Vec2::zeros());
        self.density.push(self_density);
        self.pressure.push(0.);
    }

    /// The state of particle `i` as the force laws need it.
    pub fn sample(&self, i: usize) -> Sample {
        Sample {
            position: self.position[i],
            velocity: self.velocity[i],
            density: self.density[i],
            pressure: self.pressure[i],
        }
    }

    pub fn len(&self) -> usize {
        self.position.len()
    }

    pub fn is_empty(&self) -> bool {
        self.position.is_empty()
    }
}

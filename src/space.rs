use crate::{Scalar, Vec2};

/// The mapping between view space (pixels) and simulation space.
///
/// The simulation space is chosen so that the requested number of particles, spread evenly over
/// the view, end up roughly one smoothing radius apart.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SimulationSpace {
    /// Simulation units per view unit
    pub scale: Scalar,
    /// The size of the domain in simulation space. The domain always starts at the origin.
    pub bounds: Vec2,
}

impl SimulationSpace {
    pub fn new(view_size: Vec2, particle_count: usize, h: Scalar) -> Self {
        let area_per_particle = view_size.x * view_size.y / particle_count.max(1) as Scalar;
        let spread = area_per_particle.sqrt().floor().max(1.);
        let scale = h / spread;

        SimulationSpace {
            scale,
            bounds: view_size * scale,
        }
    }

    /// A space where view and simulation coordinates are the same.
    pub fn identity(bounds: Vec2) -> Self {
        SimulationSpace { scale: 1., bounds }
    }

    pub fn to_simulation_space(&self, pos: Vec2) -> Vec2 {
        pos * self.scale
    }

    pub fn to_world_space(&self, pos: Vec2) -> Vec2 {
        pos / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scale() {
        let space = SimulationSpace::new(Vec2::new(1200., 1200.), 200, 1.);
        // sqrt(1200 * 1200 / 200) = 84.85
        assert!((space.scale - 1. / 84.).abs() < 1e-12);
        assert!((space.bounds.x - 1200. / 84.).abs() < 1e-9);

        let space = SimulationSpace::new(Vec2::new(2., 2.), 4, 1.);
        assert_eq!(space, SimulationSpace::identity(Vec2::new(2., 2.)));
    }

    #[test]
    fn conversions_are_inverse() {
        let space = SimulationSpace::new(Vec2::new(800., 600.), 500, 0.5);
        let pos = Vec2::new(123., 456.);
        let back = space.to_world_space(space.to_simulation_space(pos));
        assert!((back - pos).magnitude() < 1e-9);
    }

    #[test]
    fn tiny_views_dont_divide_by_zero() {
        let space = SimulationSpace::new(Vec2::new(1., 1.), 1000, 1.);
        assert_eq!(space.scale, 1.);
    }
}

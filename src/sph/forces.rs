//! The pairwise density and force laws, shared by every solver.
use super::kernels::Kernels;
use super::parameters::SphParameters;
use crate::{Scalar, Vec2};

/// Added to distances and densities before dividing by them.
pub const EPSILON: Scalar = 1e-9;

/// The state of a single particle, as seen by the force laws.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub position: Vec2,
    pub velocity: Vec2,
    pub density: Scalar,
    pub pressure: Scalar,
}

/// The kernels together with the material constants they are combined with.
///
/// This is derived from `SphParameters` in one go, so a step never mixes kernel coefficients for
/// one `h` with another.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ForceLaw {
    pub kernels: Kernels,
    pub mass: Scalar,
    pub rest_density: Scalar,
    pub gas_constant: Scalar,
    pub viscosity: Scalar,
}

impl ForceLaw {
    pub fn new(params: &SphParameters) -> Self {
        ForceLaw {
            kernels: Kernels::new(params.h),
            mass: params.mass,
            rest_density: params.rest_density,
            gas_constant: params.gas_constant,
            viscosity: params.viscosity,
        }
    }

    pub fn self_density(&self) -> Scalar {
        self.kernels.self_density(self.mass)
    }

    /// How much density two particles a squared distance `r2` apart add to each other.
    pub fn density_contribution(&self, r2: Scalar) -> Scalar {
        if r2 < self.kernels.hsq {
            self.mass * self.kernels.poly6(r2)
        } else {
            0.
        }
    }

    /// The equation of state. Pressure is never negative, rarefied fluid doesn't pull particles
    /// together.
    pub fn pressure(&self, density: Scalar) -> Scalar {
        Scalar::max(self.gas_constant * (density - self.rest_density), 0.)
    }

    /// The pressure and viscosity force that `j` exerts on `i`. Zero if they are too far apart.
    ///
    /// `j` feels exactly the negation of this, so a solver that visits each unordered pair once
    /// should add it to `i` and subtract it from `j`.
    pub fn pair_force(&self, i: &Sample, j: &Sample) -> Vec2 {
        let r_ij = j.position - i.position;
        let r2 = r_ij.magnitude_squared();

        if r2 >= self.kernels.hsq {
            return Vec2::zeros();
        }

        let r = r2.sqrt() + EPSILON;

        let force_pressure = r_ij
            * (self.mass * (i.pressure + j.pressure) / (2. * j.density + EPSILON)
                * self.kernels.spiky_grad(r));

        let force_viscosity = (j.velocity - i.velocity)
            * (self.viscosity * self.mass * self.kernels.visc_laplacian(r)
                / (j.density + EPSILON));

        force_pressure + force_viscosity
    }

    /// Repulsion from the walls of the domain `[0, bounds.x] x [0, bounds.y]`, for a particle
    /// within `h` of one of them. Each axis is handled on its own, so corners are pushed both
    /// ways.
    pub fn boundary_force(&self, sample: &Sample, bounds: Vec2) -> Vec2 {
        let h = self.kernels.h;
        let f = self.mass / (sample.density + EPSILON) * sample.pressure;

        // `spiky_grad` is negative, so this points away from the wall it is measured from
        let push = |dist: Scalar| {
            let r = Scalar::max(dist, EPSILON);
            f * self.kernels.spiky_grad(r) * r
        };

        let mut force = Vec2::zeros();
        for axis in 0..2 {
            let x = sample.position[axis];
            if x < h {
                force[axis] -= push(x);
            } else if x > bounds[axis] - h {
                force[axis] += push(bounds[axis] - x);
            }
        }
        force
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample(x: Scalar, y: Scalar, pressure: Scalar) -> Sample {
        Sample {
            position: Vec2::new(x, y),
            velocity: Vec2::zeros(),
            density: 2.,
            pressure,
        }
    }

    #[test]
    fn pressure_is_clamped() {
        let law = ForceLaw::new(&SphParameters::default());
        assert_eq!(law.pressure(0.), 0.);
        assert!(law.pressure(law.rest_density + 1.) > 0.);
    }

    #[test]
    fn close_particles_repel() {
        let law = ForceLaw::new(&SphParameters::default());
        let a = sample(5., 5., 10.);
        let b = sample(5.5, 5., 10.);

        let force = law.pair_force(&a, &b);
        assert!(force.x < 0.);
        assert_eq!(force.y, 0.);
    }

    #[test]
    fn distant_particles_dont_interact() {
        let law = ForceLaw::new(&SphParameters::default());
        let a = sample(1., 1., 10.);
        let b = sample(2., 1., 10.);

        assert_eq!(law.pair_force(&a, &b), Vec2::zeros());
        assert_eq!(law.density_contribution(1.), 0.);
    }

    #[test]
    fn coincident_particles_are_finite() {
        let law = ForceLaw::new(&SphParameters::default());
        let a = Sample {
            velocity: Vec2::new(1., 0.),
            ..sample(3., 3., 10.)
        };
        let b = sample(3., 3., 10.);

        let force = law.pair_force(&a, &b);
        assert!(force.iter().all(|f| f.is_finite()));
    }

    #[test]
    fn boundary_pushes_inward() {
        let law = ForceLaw::new(&SphParameters::default());
        let bounds = Vec2::new(10., 10.);

        // exactly on the left edge
        assert!(law.boundary_force(&sample(0., 5., 3.), bounds).x > 0.);
        // near the right edge
        assert!(law.boundary_force(&sample(9.8, 5., 3.), bounds).x < 0.);
        // bottom left corner gets both
        let corner = law.boundary_force(&sample(0.2, 0.3, 3.), bounds);
        assert!(corner.x > 0. && corner.y > 0.);
        // nothing in the middle, or without pressure
        assert_eq!(law.boundary_force(&sample(5., 5., 3.), bounds), Vec2::zeros());
        assert_eq!(law.boundary_force(&sample(0.5, 5., 0.), bounds), Vec2::zeros());
    }

    proptest! {
        #[test]
        fn pair_force_is_antisymmetric_in_position(dx in -0.9f64..0.9, dy in -0.9f64..0.9) {
            // with equal densities and pressures, swapping the particles flips the force
            let law = ForceLaw::new(&SphParameters::default());
            let a = sample(5., 5., 4.);
            let b = sample(5. + dx, 5. + dy, 4.);

            let ab = law.pair_force(&a, &b);
            let ba = law.pair_force(&b, &a);
            prop_assert!((ab + ba).magnitude() <= 1e-9 * (1. + ab.magnitude()));
        }
    }
}

use crate::Scalar;
use serde::{Deserialize, Serialize};

/// A struct containing all of the high-level parameters for the SPH simulation.
///
/// The defaults are tuned for a plausible looking fluid with `h = 1`, not for physical accuracy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphParameters {
    /// The radius of the smoothing kernel
    pub h: Scalar,
    /// The mass of every particle
    pub mass: Scalar,
    /// The density of the fluid without any forces
    pub rest_density: Scalar,
    /// The ideal gas constant used in the state equation pressure solver
    pub gas_constant: Scalar,
    /// The viscosity constant
    pub viscosity: Scalar,
    /// Velocity is multiplied by this when a particle hits the boundary. Zero stops the particle
    /// dead, a negative value bounces it back.
    pub boundary_damping: Scalar,
    /// How far inside the domain a particle is placed when it is clamped back in.
    pub boundary_epsilon: Scalar,
    /// How to find the particles within `h` of each other
    pub neighbor_strategy: NeighborStrategy,
    /// Which particles a pointer impulse affects
    pub external_force: ExternalForceMode,
    /// The number of simulation steps per rendered frame
    pub substeps: usize,
    /// If set, every sub-step is this many milliseconds (at 60 fps, scaled for other frame rates),
    /// otherwise the frame time is split evenly between the sub-steps.
    pub fixed_substep_ms: Option<Scalar>,
    /// Converts milliseconds to simulation time
    pub time_scale: Scalar,
    /// Distance between particles in the initial lattice, relative to `h`
    pub lattice_spacing: Scalar,
    /// Seed for initial conditions that use randomness
    pub seed: u64,
}

impl Default for SphParameters {
    fn default() -> Self {
        Self {
            h: 1.,
            mass: 1.,
            rest_density: 1.55,
            gas_constant: 200.,
            viscosity: 10.,
            boundary_damping: 0.,
            boundary_epsilon: 1e-6,
            neighbor_strategy: NeighborStrategy::default(),
            external_force: ExternalForceMode::default(),
            substeps: 1,
            fixed_substep_ms: None,
            time_scale: 0.0015,
            lattice_spacing: 0.5,
            seed: 0,
        }
    }
}

impl SphParameters {
    /// The defaults for the dense pass pipeline: all pairs, a wide pointer radius, and a fixed
    /// 10ms sub-step.
    pub fn dense_pipeline() -> Self {
        Self {
            neighbor_strategy: NeighborStrategy::Dense,
            external_force: ExternalForceMode::Radius {
                radius: 2.,
                strength: 10.,
            },
            fixed_substep_ms: Some(10.),
            ..Self::default()
        }
    }

    /// Checks that the parameters describe a simulation that can actually run.
    pub fn validate(&self) -> eyre::Result<()> {
        use eyre::ensure;

        ensure!(
            self.h.is_finite() && self.h > 0.,
            "Smoothing radius must be positive, got {}",
            self.h
        );
        ensure!(
            self.mass.is_finite() && self.mass > 0.,
            "Particle mass must be positive, got {}",
            self.mass
        );
        ensure!(
            self.rest_density >= 0.,
            "Rest density must not be negative, got {}",
            self.rest_density
        );
        ensure!(
            self.gas_constant >= 0. && self.viscosity >= 0.,
            "Gas constant and viscosity must not be negative"
        );
        ensure!(
            self.boundary_epsilon >= 0.,
            "Boundary epsilon must not be negative"
        );
        ensure!(self.substeps > 0, "Need at least one sub-step per frame");
        ensure!(
            self.lattice_spacing > 0.,
            "Lattice spacing must be positive, got {}",
            self.lattice_spacing
        );

        if let NeighborStrategy::Bucketed { cell_size } = self.neighbor_strategy {
            ensure!(
                cell_size.is_finite() && cell_size > 0.,
                "Grid cell size must be positive, got {}",
                cell_size
            );
        }

        if let ExternalForceMode::Radius { radius, .. } = self.external_force {
            ensure!(radius >= 0., "External force radius must not be negative");
        }

        Ok(())
    }
}

/// Which pairs of particles the force solver looks at.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum NeighborStrategy {
    /// Sort particles into a uniform grid, and only compare particles in neighboring cells.
    /// Cells are never smaller than `h`.
    Bucketed { cell_size: Scalar },
    /// Compare every particle to every other particle.
    Dense,
}

impl Default for NeighborStrategy {
    fn default() -> Self {
        NeighborStrategy::Bucketed { cell_size: 1. }
    }
}

/// How a pointer impulse is applied.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum ExternalForceMode {
    /// Every particle in the grid cell under the pointer gets the impulse as its velocity.
    Cell,
    /// Every particle within `radius` of the pointer gets `strength` times the impulse as its
    /// velocity.
    Radius { radius: Scalar, strength: Scalar },
}

impl Default for ExternalForceMode {
    fn default() -> Self {
        ExternalForceMode::Cell
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(SphParameters::default().validate().is_ok());
        assert!(SphParameters::dense_pipeline().validate().is_ok());
    }

    #[test]
    fn rejects_bad_parameters() {
        let bad = [
            SphParameters {
                h: 0.,
                ..Default::default()
            },
            SphParameters {
                mass: -1.,
                ..Default::default()
            },
            SphParameters {
                substeps: 0,
                ..Default::default()
            },
            SphParameters {
                neighbor_strategy: NeighborStrategy::Bucketed { cell_size: 0. },
                ..Default::default()
            },
        ];

        for params in &bad {
            assert!(params.validate().is_err(), "{:?} should be invalid", params);
        }
    }

    #[test]
    fn deserializes_partial_json() {
        let params: SphParameters =
            serde_json::from_str(r#"{ "h": 0.5, "neighbor_strategy": "Dense", "substeps": 3 }"#)
                .unwrap();

        assert_eq!(params.h, 0.5);
        assert_eq!(params.neighbor_strategy, NeighborStrategy::Dense);
        assert_eq!(params.substeps, 3);
        assert_eq!(params.gas_constant, SphParameters::default().gas_constant);
    }
}

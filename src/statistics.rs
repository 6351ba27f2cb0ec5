use crate::pipeline::PassPipeline;
use crate::sph::SphSimulation;
use crate::{Scalar, Simulation, Vec2};
use itertools::izip;

/// Aggregate quantities for keeping an eye on a running simulation. Every particle has the same
/// mass, so these only need positions, velocities and densities.
pub trait SimulationStatistics {
    fn total_time(&self) -> Scalar;
    fn total_mass(&self) -> Scalar;
    fn total_linear_momentum(&self) -> Vec2;
    /// The z component of the angular momentum about the origin
    fn total_angular_momentum(&self) -> Scalar;
    fn total_energy(&self) -> Scalar;
    fn total_volume(&self) -> Scalar;
}

fn linear_momentum(mass: Scalar, velocities: &[Vec2]) -> Vec2 {
    velocities.iter().map(|v| mass * v).sum()
}

fn angular_momentum(mass: Scalar, velocities: &[Vec2], positions: &[Vec2]) -> Scalar {
    izip!(velocities, positions)
        .map(|(v, x)| mass * (x.x * v.y - x.y * v.x))
        .sum()
}

fn kinetic_energy(mass: Scalar, velocities: &[Vec2]) -> Scalar {
    velocities.iter().map(|v| 0.5 * mass * v.dot(v)).sum()
}

fn volume(mass: Scalar, densities: impl Iterator<Item = Scalar>) -> Scalar {
    densities.map(|rho| mass / rho).sum()
}

impl SimulationStatistics for SphSimulation {
    fn total_time(&self) -> Scalar {
        self.time
    }

    fn total_mass(&self) -> Scalar {
        self.params.mass * self.particles.len() as Scalar
    }

    fn total_linear_momentum(&self) -> Vec2 {
        linear_momentum(self.params.mass, &self.particles.velocity)
    }

    fn total_angular_momentum(&self) -> Scalar {
        angular_momentum(
            self.params.mass,
            &self.particles.velocity,
            &self.particles.position,
        )
    }

    fn total_energy(&self) -> Scalar {
        kinetic_energy(self.params.mass, &self.particles.velocity)
    }

    /// Between steps the densities are reset, so this is only meaningful inside a step.
    fn total_volume(&self) -> Scalar {
        volume(self.params.mass, self.particles.density.iter().copied())
    }
}

impl SimulationStatistics for PassPipeline {
    fn total_time(&self) -> Scalar {
        self.time
    }

    fn total_mass(&self) -> Scalar {
        self.parameters().mass * self.num_particles() as Scalar
    }

    fn total_linear_momentum(&self) -> Vec2 {
        linear_momentum(self.parameters().mass, &self.velocities())
    }

    fn total_angular_momentum(&self) -> Scalar {
        angular_momentum(
            self.parameters().mass,
            &self.velocities(),
            &self.positions(),
        )
    }

    fn total_energy(&self) -> Scalar {
        kinetic_energy(self.parameters().mass, &self.velocities())
    }

    /// Uses the densities from the last pressure pass.
    fn total_volume(&self) -> Scalar {
        volume(
            self.parameters().mass,
            self.densities().into_iter().filter(|&rho| rho > 0.),
        )
    }
}

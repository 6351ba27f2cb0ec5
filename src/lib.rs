//! An interactive 2d Smoothed Particle Hydrodynamics fluid simulation.
//!
//! There are two solvers behind the same [`Simulation`] trait: [`SphSimulation`], which runs on
//! the CPU and finds neighbors with a uniform grid (or by brute force), and [`PassPipeline`],
//! which computes all pairs densely in a series of texture passes, the way it would be done on
//! the GPU.
pub mod driver;
pub mod initial_condition;
pub mod pipeline;
pub mod pointer;
pub mod render;
pub mod space;
pub mod sph;
pub mod statistics;

extern crate nalgebra as na;

pub use driver::{FrameClock, StepDriver};
pub use pipeline::PassPipeline;
pub use pointer::PointerTracker;
pub use render::Vertex;
pub use space::SimulationSpace;
pub use sph::{NeighborStrategy, SphParameters, SphSimulation};

pub type Scalar = f64;
pub type Vec2 = na::Vector2<Scalar>;

/// The operations the UI layer is allowed to perform on a running simulation.
pub trait Simulation: Sized {
    /// Creates a simulation with `particle_count` particles filling a view of `view_size`
    /// pixels. Some solvers round the particle count up.
    fn initialize(params: SphParameters, particle_count: usize, view_size: Vec2)
        -> eyre::Result<Self>;

    /// Advances the simulation by a single sub-step. `delta_time` is already in simulation
    /// units.
    fn step(&mut self, delta_time: Scalar);

    /// Queues a one-shot impulse at `position` (in simulation space). It is consumed by the
    /// next call to `step`.
    fn apply_external_force(&mut self, position: Vec2, force: Vec2);

    fn space(&self) -> SimulationSpace;

    fn parameters(&self) -> &SphParameters;

    /// Replaces the tunable parameters. The kernel constants (and anything else derived from
    /// them) are recomputed before the next step.
    fn set_parameters(&mut self, params: SphParameters) -> eyre::Result<()>;

    fn num_particles(&self) -> usize;

    /// A copy of the current particle positions, in simulation space.
    fn positions(&self) -> Vec<Vec2>;

    fn velocities(&self) -> Vec<Vec2>;

    /// Returns an array of `Vertex`es, in world space, to be passed to the renderer.
    fn vertices(&self) -> Vec<Vertex> {
        let space = self.space();
        self.positions()
            .iter()
            .zip(self.velocities().iter())
            .map(|(pos, vel)| Vertex::new(space.to_world_space(*pos), *vel))
            .collect()
    }
}

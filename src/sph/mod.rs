pub(crate) mod external;
pub(crate) mod forces;
pub(crate) mod grid;
pub(crate) mod integrate;
pub(crate) mod kernels;
pub(crate) mod parameters;
pub(crate) mod particles;

pub use external::{Impulse, ImpulseTarget};
pub use forces::{ForceLaw, Sample};
pub use grid::{CellLayout, Grid};
pub use kernels::Kernels;
pub use parameters::{ExternalForceMode, NeighborStrategy, SphParameters};
pub use particles::SphParticles;

use crate::initial_condition::{InitialCondition, Lattice};
use crate::{Scalar, Simulation, SimulationSpace, Vec2};
use integrate::{advance, update_bounds};

/// Where the solver is within a step. Outside of `step` it is always `Idle`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepPhase {
    Idle,
    DensityPass,
    ForcePass,
    ExternalForceOverride,
    Integrate,
}

/// The CPU SPH solver.
///
/// Forces are computed against the grid as it was at the end of the previous step; the grid is
/// rebuilt once per step, after integration.
pub struct SphSimulation {
    pub particles: SphParticles,
    /// Only kept with the `Bucketed` strategy
    pub grid: Option<Grid>,
    pub params: SphParameters,
    /// Total simulated time
    pub time: Scalar,
    law: ForceLaw,
    space: SimulationSpace,
    /// The cells `Cell` mode impulses target
    layout: CellLayout,
    impulse: Option<Impulse>,
    phase: StepPhase,
}

impl SphSimulation {
    /// Creates an empty simulation over `space.bounds`.
    pub fn new(params: SphParameters, space: SimulationSpace) -> eyre::Result<Self> {
        params.validate()?;

        Ok(SphSimulation {
            particles: SphParticles::default(),
            grid: bucketed_grid(&params, space.bounds),
            layout: CellLayout::new(space.bounds, cell_size(&params)),
            law: ForceLaw::new(&params),
            params,
            time: 0.,
            space,
            impulse: None,
            phase: StepPhase::Idle,
        })
    }

    /// Creates a simulation with particles at the given positions, all at rest.
    pub fn with_positions(
        params: SphParameters,
        space: SimulationSpace,
        positions: &[Vec2],
    ) -> eyre::Result<Self> {
        let mut s = Self::new(params, space)?;
        for &pos in positions {
            s.add_particle(pos, Vec2::zeros());
        }
        Ok(s)
    }

    pub fn add_particle(&mut self, position: Vec2, velocity: Vec2) {
        let index = self.particles.len();
        self.particles
            .add_particle(position, velocity, self.law.self_density());
        if let Some(grid) = &mut self.grid {
            grid.add_particle(position, index);
        }
    }

    pub fn law(&self) -> &ForceLaw {
        &self.law
    }

    pub fn layout(&self) -> CellLayout {
        self.layout
    }

    pub fn phase(&self) -> StepPhase {
        self.phase
    }

    /// The impulse that the next step will apply, if any.
    pub fn pending_impulse(&self) -> Option<&Impulse> {
        self.impulse.as_ref()
    }

    fn enter(&mut self, phase: StepPhase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "sph step phase");
        self.phase = phase;
    }

    /// Accumulates density over every interacting pair, then derives pressure.
    pub(crate) fn compute_density_pressure(&mut self) {
        self.enter(StepPhase::DensityPass);

        let law = self.law;
        let SphSimulation { particles, grid, .. } = self;

        for_each_pair(grid.as_ref(), particles.len(), |i, j| {
            let r2 = (particles.position[i] - particles.position[j]).magnitude_squared();
            let t = law.density_contribution(r2);
            particles.density[i] += t;
            particles.density[j] += t;
        });

        for (density, pressure) in particles.density.iter().zip(particles.pressure.iter_mut()) {
            debug_assert!(
                *density >= law.self_density() || density.is_nan(),
                "density {} below self density",
                density
            );
            *pressure = law.pressure(*density);
            debug_assert!(*pressure >= 0. || pressure.is_nan(), "negative pressure {}", pressure);
        }
    }

    /// Pairwise pressure and viscosity forces, then the boundary forces.
    pub(crate) fn compute_forces(&mut self) {
        self.enter(StepPhase::ForcePass);

        let law = self.law;
        let bounds = self.space.bounds;
        let SphSimulation { particles, grid, .. } = self;

        for_each_pair(grid.as_ref(), particles.len(), |i, j| {
            let force = law.pair_force(&particles.sample(i), &particles.sample(j));
            particles.force[i] += force;
            particles.force[j] -= force;
        });

        for i in 0..particles.len() {
            let boundary = law.boundary_force(&particles.sample(i), bounds);
            particles.force[i] += boundary;
        }
    }

    /// Applies and clears the queued impulse.
    pub(crate) fn apply_external_forces(&mut self) {
        self.enter(StepPhase::ExternalForceOverride);

        if let Some(impulse) = self.impulse.take() {
            let hit = external::apply_impulse(
                &impulse,
                self.params.external_force,
                &mut self.particles,
                self.layout,
            );
            tracing::debug!(?impulse, hit, "applied external force");
        }
    }

    /// Moves the particles, keeps them in the domain, resets per-step state and re-buckets them.
    pub(crate) fn integrate(&mut self, delta_time: Scalar) {
        self.enter(StepPhase::Integrate);

        let self_density = self.law.self_density();
        let bounds = self.space.bounds;
        let params = &self.params;
        let p = &mut self.particles;

        for i in 0..p.len() {
            advance(
                &mut p.position[i],
                &mut p.velocity[i],
                p.force[i],
                p.density[i],
                delta_time,
            );
            update_bounds(
                &mut p.position[i],
                &mut p.velocity[i],
                params.boundary_damping,
                params.boundary_epsilon,
                bounds,
            );

            debug_assert!(
                (0. ..=bounds.x).contains(&p.position[i].x)
                    && (0. ..=bounds.y).contains(&p.position[i].y),
                "particle {} escaped the domain: {:?}",
                i,
                p.position[i]
            );

            p.force[i] = Vec2::zeros();
            p.density[i] = self_density;
        }

        if let Some(grid) = &mut self.grid {
            grid.rebuild(&self.particles.position);
        }
    }
}

/// The grid is never finer than the smoothing radius, otherwise neighbors would be missed.
pub(crate) fn cell_size(params: &SphParameters) -> Scalar {
    match params.neighbor_strategy {
        NeighborStrategy::Bucketed { cell_size } => cell_size.max(params.h),
        NeighborStrategy::Dense => params.h,
    }
}

/// The bucketing grid, if the neighbor strategy uses one.
fn bucketed_grid(params: &SphParameters, bounds: Vec2) -> Option<Grid> {
    match params.neighbor_strategy {
        NeighborStrategy::Bucketed { .. } => Some(Grid::new(bounds, cell_size(params))),
        NeighborStrategy::Dense => None,
    }
}

/// Calls `f` once for every unordered pair of particles that could be within `h` of each other,
/// using `grid` if there is one and trying every pair otherwise.
///
/// The lower index always comes first. `ForceLaw::pair_force` isn't symmetric in its arguments,
/// so every strategy has to agree on the order.
fn for_each_pair(grid: Option<&Grid>, num_particles: usize, mut f: impl FnMut(usize, usize)) {
    match grid {
        Some(grid) => grid.for_each_pair(f),
        None => {
            for i in 0..num_particles {
                for j in i + 1..num_particles {
                    f(i, j);
                }
            }
        }
    }
}

impl Simulation for SphSimulation {
    fn initialize(
        params: SphParameters,
        particle_count: usize,
        view_size: Vec2,
    ) -> eyre::Result<Self> {
        params.validate()?;
        eyre::ensure!(
            view_size.x > 0. && view_size.y > 0.,
            "View size must be positive, got {:?}",
            view_size
        );

        let space = SimulationSpace::new(view_size, particle_count, params.h);
        let positions = Lattice {
            num_particles: particle_count,
            spacing: params.lattice_spacing * params.h,
            jitter: 0.,
            seed: params.seed,
        }
        .positions(space.bounds);

        tracing::debug!(
            particle_count,
            scale = space.scale,
            bounds = ?space.bounds,
            grid = ?cell_size(&params),
            "initializing sph simulation"
        );

        Self::with_positions(params, space, &positions)
    }

    fn step(&mut self, delta_time: Scalar) {
        let _span = tracing::trace_span!("sph_step", delta_time).entered();

        self.compute_density_pressure();
        self.compute_forces();
        self.apply_external_forces();
        self.integrate(delta_time);

        self.enter(StepPhase::Idle);
        self.time += delta_time;
    }

    fn apply_external_force(&mut self, position: Vec2, force: Vec2) {
        self.impulse = Some(Impulse { position, force });
    }

    fn space(&self) -> SimulationSpace {
        self.space
    }

    fn parameters(&self) -> &SphParameters {
        &self.params
    }

    fn set_parameters(&mut self, params: SphParameters) -> eyre::Result<()> {
        params.validate()?;

        let law = ForceLaw::new(&params);
        let mut grid = bucketed_grid(&params, self.space.bounds);
        if let Some(grid) = &mut grid {
            grid.rebuild(&self.particles.position);
        }

        // Densities are only valid as the reset value between steps, which depends on the law
        let self_density = law.self_density();
        self.particles
            .density
            .iter_mut()
            .for_each(|d| *d = self_density);

        self.law = law;
        self.grid = grid;
        self.layout = CellLayout::new(self.space.bounds, cell_size(&params));
        self.params = params;
        Ok(())
    }

    fn num_particles(&self) -> usize {
        self.particles.len()
    }

    fn positions(&self) -> Vec<Vec2> {
        self.particles.position.clone()
    }

    fn velocities(&self) -> Vec<Vec2> {
        self.particles.velocity.clone()
    }
}

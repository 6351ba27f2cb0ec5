//! The dense solver, written the way it runs on the GPU: every step is a chain of passes that
//! each render one texture from the textures before it.
//!
//! ```text
//!   positions[in] ──> pressure ──> density_pressure
//!   positions[in], velocities[in], density_pressure ──> force ──> force
//!   everything above + impulse ──> integrate ──> positions[out], velocities[out]
//! ```
//!
//! The position and velocity textures are double buffered. After a step `out` becomes `in`, so
//! a pass never reads the texture it is writing.
pub mod passes;
pub mod texture;

pub use texture::{texture_size, Texel, Texture};

use crate::initial_condition::{InitialCondition, RandomFill};
use crate::sph::external::{Impulse, ImpulseTarget};
use crate::sph::{cell_size, CellLayout, ForceLaw, SphParameters};
use crate::{Scalar, Simulation, SimulationSpace, Vec2};
use passes::Walls;

pub struct PassPipeline {
    pub params: SphParameters,
    /// Total simulated time
    pub time: Scalar,
    law: ForceLaw,
    space: SimulationSpace,
    /// Only used to find the cell under the pointer, particles aren't bucketed
    layout: CellLayout,
    positions: [Texture; 2],
    velocities: [Texture; 2],
    density_pressure: Texture,
    force: Texture,
    /// Which half of the double buffers holds the latest positions and velocities
    current: usize,
    impulse: Option<Impulse>,
}

impl PassPipeline {
    /// Creates a pipeline with particles at the given positions, all at rest. The number of
    /// positions must fill a square power of two texture.
    pub fn with_positions(
        params: SphParameters,
        space: SimulationSpace,
        positions: &[Vec2],
    ) -> eyre::Result<Self> {
        params.validate()?;

        let size = texture_size(positions.len());
        eyre::ensure!(
            size * size == positions.len(),
            "{} particles don't fill a {}x{} texture",
            positions.len(),
            size,
            size
        );

        let position = Texture::from_vec2s(size, positions);

        Ok(PassPipeline {
            time: 0.,
            law: ForceLaw::new(&params),
            layout: CellLayout::new(space.bounds, cell_size(&params)),
            positions: [position.clone(), position],
            velocities: [Texture::zeros(size), Texture::zeros(size)],
            density_pressure: Texture::zeros(size),
            force: Texture::zeros(size),
            current: 0,
            impulse: None,
            params,
            space,
        })
    }

    pub fn law(&self) -> &ForceLaw {
        &self.law
    }

    /// The side length of every texture
    pub fn texture_size(&self) -> usize {
        self.force.size()
    }

    /// The latest positions, `[x, y, 0, 0]` per particle.
    pub fn position_texture(&self) -> &Texture {
        &self.positions[self.current]
    }

    /// The latest velocities, `[vx, vy, 0, 0]` per particle.
    pub fn velocity_texture(&self) -> &Texture {
        &self.velocities[self.current]
    }

    /// `[density, pressure, 0, 0]` per particle, from the last step's pressure pass.
    pub fn density_pressure_texture(&self) -> &Texture {
        &self.density_pressure
    }

    pub fn force_texture(&self) -> &Texture {
        &self.force
    }

    pub fn densities(&self) -> Vec<Scalar> {
        self.density_pressure
            .texels()
            .iter()
            .map(|t| t[0] as Scalar)
            .collect()
    }

    pub fn pending_impulse(&self) -> Option<&Impulse> {
        self.impulse.as_ref()
    }

    fn walls(&self) -> Walls {
        Walls {
            bounds: self.space.bounds,
            damping: self.params.boundary_damping,
            epsilon: self.params.boundary_epsilon,
        }
    }
}

impl Simulation for PassPipeline {
    /// The particle count is rounded up to fill a square power of two texture, and the particles
    /// are scattered randomly over the domain.
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

        let size = texture_size(particle_count);
        let num_particles = size * size;

        let mut space = SimulationSpace::new(view_size, num_particles, params.h);
        // Positions are stored as f32, keep the walls representable so clamping is exact
        space.bounds = space.bounds.map(|b| b as f32 as Scalar);

        let positions = RandomFill {
            num_particles,
            seed: params.seed,
        }
        .positions(space.bounds);

        tracing::debug!(
            requested = particle_count,
            num_particles,
            texture_size = size,
            bounds = ?space.bounds,
            "initializing pass pipeline"
        );

        Self::with_positions(params, space, &positions)
    }

    fn step(&mut self, delta_time: Scalar) {
        let _span = tracing::trace_span!("pipeline_step", delta_time).entered();

        let input = self.current;
        let output = 1 - input;

        self.density_pressure = passes::pressure_pass(&self.law, &self.positions[input]);

        self.force = passes::force_pass(
            &self.law,
            self.space.bounds,
            &self.density_pressure,
            &self.positions[input],
            &self.velocities[input],
        );

        let impulse = self.impulse.take();
        let target =
            impulse.map(|i| ImpulseTarget::new(i, self.params.external_force, self.layout));
        if let Some(impulse) = &impulse {
            tracing::debug!(?impulse, "applying external force");
        }

        let (positions, velocities) = passes::integrate_pass(
            &self.positions[input],
            &self.velocities[input],
            &self.force,
            &self.density_pressure,
            target.as_ref(),
            self.walls(),
            delta_time,
        );
        self.positions[output] = positions;
        self.velocities[output] = velocities;

        self.current = output;
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

        self.law = ForceLaw::new(&params);
        self.layout = CellLayout::new(self.space.bounds, cell_size(&params));
        self.params = params;
        Ok(())
    }

    fn num_particles(&self) -> usize {
        self.force.len()
    }

    fn positions(&self) -> Vec<Vec2> {
        self.position_texture().to_vec2s()
    }

    fn velocities(&self) -> Vec<Vec2> {
        self.velocity_texture().to_vec2s()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sph::{ExternalForceMode, NeighborStrategy, SphSimulation};
    use proptest::prelude::*;

    fn pipeline(count: usize) -> PassPipeline {
        PassPipeline::initialize(SphParameters::dense_pipeline(), count, Vec2::new(400., 300.))
            .unwrap()
    }

    #[test]
    fn particle_count_is_rounded_up() {
        let p = pipeline(100);
        assert_eq!(p.texture_size(), 16);
        assert_eq!(p.num_particles(), 256);
        assert_eq!(p.position_texture().as_floats().len(), 256 * 4);
    }

    #[test]
    fn rejects_partial_textures() {
        let space = SimulationSpace::identity(Vec2::new(4., 4.));
        let positions = vec![Vec2::new(1., 1.); 3];
        assert!(PassPipeline::with_positions(SphParameters::default(), space, &positions).is_err());
    }

    #[test]
    fn rejects_empty_view() {
        let params = SphParameters::dense_pipeline();
        assert!(PassPipeline::initialize(params, 64, Vec2::new(400., 0.)).is_err());
    }

    #[test]
    fn small_smoothing_radius_is_cheap() {
        let mut p = pipeline(64);
        let params = SphParameters {
            h: 0.01,
            external_force: ExternalForceMode::Cell,
            ..SphParameters::dense_pipeline()
        };
        p.set_parameters(params).unwrap();
        assert!(p.layout.num_cells() > 500_000);

        let target = p.positions()[7];
        p.apply_external_force(target, Vec2::new(1., 0.));
        p.step(0.);
        assert_eq!(p.velocities()[7], Vec2::new(1., 0.));
    }

    #[test]
    fn zero_time_step_only_updates_density() {
        let mut p = pipeline(64);
        let positions = p.positions();

        p.step(0.);

        assert_eq!(p.positions(), positions);
        assert!(p.velocities().iter().all(|v| *v == Vec2::zeros()));
        assert!(p.densities().iter().all(|&d| d > 0.));
    }

    #[test]
    fn buffers_are_swapped() {
        let mut p = pipeline(64);
        let before = p.position_texture().clone();

        p.step(0.01);
        assert_eq!(p.current, 1);
        // the old output is still there, as the next input buffer
        assert_eq!(p.positions[0], before);
        assert_ne!(p.positions[1], before);

        p.step(0.01);
        assert_eq!(p.current, 0);
    }

    #[test]
    fn matches_cpu_densities() {
        let mut p = pipeline(64);
        let space = p.space();
        let positions = p.positions();

        let params = SphParameters {
            neighbor_strategy: NeighborStrategy::Dense,
            ..SphParameters::dense_pipeline()
        };
        let mut cpu = SphSimulation::with_positions(params, space, &positions).unwrap();
        cpu.compute_density_pressure();

        p.step(0.);
        for (gpu, cpu) in p.densities().iter().zip(&cpu.particles.density) {
            assert!((gpu - cpu).abs() < 1e-4 * cpu, "{} != {}", gpu, cpu);
        }
    }

    #[test]
    fn external_force_is_one_shot() {
        let mut p = pipeline(64);
        let target = p.positions()[10];

        p.apply_external_force(target, Vec2::new(0.5, 0.25));
        p.step(0.);
        assert!(p.pending_impulse().is_none());

        // radius 2, strength 10
        let hit = p
            .velocities()
            .iter()
            .filter(|&&v| v == Vec2::new(5., 2.5))
            .count();
        assert!(hit >= 1);

        // nothing queued, so a zero step leaves every velocity alone
        let velocities = p.velocities();
        p.step(0.);
        assert_eq!(p.velocities(), velocities);
    }

    #[test]
    fn cell_mode_uses_grid_layout() {
        let params = SphParameters {
            external_force: ExternalForceMode::Cell,
            ..SphParameters::dense_pipeline()
        };
        let space = SimulationSpace::identity(Vec2::new(4., 4.));
        let positions = [
            Vec2::new(0.5, 0.5),
            Vec2::new(0.6, 0.4),
            Vec2::new(3.5, 3.5),
            Vec2::new(2.5, 0.5),
        ];
        let mut p = PassPipeline::with_positions(params, space, &positions).unwrap();

        p.apply_external_force(Vec2::new(0.2, 0.2), Vec2::new(1., 1.));
        p.step(0.);

        let v = p.velocities();
        assert_eq!(v[0], Vec2::new(1., 1.));
        assert_eq!(v[1], Vec2::new(1., 1.));
        assert_eq!(v[2], Vec2::zeros());
        assert_eq!(v[3], Vec2::zeros());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn particles_stay_in_domain(
            fx in -50f64..50.,
            fy in -50f64..50.,
            dt in 0f64..0.2,
        ) {
            let mut p = pipeline(64);
            let bounds = p.space().bounds;
            let center = bounds / 2.;

            for _ in 0..3 {
                p.apply_external_force(center, Vec2::new(fx, fy));
                p.step(dt);

                for pos in p.positions() {
                    prop_assert!(pos.x >= 0. && pos.x <= bounds.x);
                    prop_assert!(pos.y >= 0. && pos.y <= bounds.y);
                }
                for &d in &p.densities() {
                    prop_assert!(d >= 0.99999 * p.law().self_density());
                }
            }
        }
    }
}

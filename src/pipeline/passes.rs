//! The three passes of a pipeline step. Each one reads the textures of the passes before it and
//! renders a new one; nothing is modified in place.
use super::texture::{texel, Texel, Texture};
use crate::sph::external::ImpulseTarget;
use crate::sph::forces::{ForceLaw, Sample};
use crate::sph::integrate::{advance, update_bounds};
use crate::{Scalar, Vec2};

/// Density and pressure of every particle, against every particle (itself included).
///
/// Output texels are `[density, pressure, 0, 0]`.
pub fn pressure_pass(law: &ForceLaw, positions: &Texture) -> Texture {
    Texture::render(positions.size(), |i| {
        let x_i = positions.vec2(i);
        let density: Scalar = (0..positions.len())
            .map(|j| law.density_contribution((positions.vec2(j) - x_i).magnitude_squared()))
            .sum();

        [density as f32, law.pressure(density) as f32, 0., 0.]
    })
}

fn sample(
    i: usize,
    density_pressure: &Texture,
    positions: &Texture,
    velocities: &Texture,
) -> Sample {
    let dp = density_pressure.texels()[i];
    Sample {
        position: positions.vec2(i),
        velocity: velocities.vec2(i),
        density: dp[0] as Scalar,
        pressure: dp[1] as Scalar,
    }
}

/// Pressure, viscosity and boundary force on every particle.
pub fn force_pass(
    law: &ForceLaw,
    bounds: Vec2,
    density_pressure: &Texture,
    positions: &Texture,
    velocities: &Texture,
) -> Texture {
    Texture::render(positions.size(), |i| {
        let s_i = sample(i, density_pressure, positions, velocities);

        let pair_forces: Vec2 = (0..positions.len())
            .filter(|&j| j != i)
            .map(|j| law.pair_force(&s_i, &sample(j, density_pressure, positions, velocities)))
            .sum();

        texel(pair_forces + law.boundary_force(&s_i, bounds))
    })
}

/// The boundary handling the integrate pass needs.
#[derive(Clone, Copy, Debug)]
pub struct Walls {
    pub bounds: Vec2,
    pub damping: Scalar,
    pub epsilon: Scalar,
}

/// Moves every particle, and renders the new positions and velocities. Particles hit by
/// `impulse` take its velocity and ignore their force.
pub fn integrate_pass(
    positions: &Texture,
    velocities: &Texture,
    forces: &Texture,
    density_pressure: &Texture,
    impulse: Option<&ImpulseTarget>,
    walls: Walls,
    delta_time: Scalar,
) -> (Texture, Texture) {
    let size = positions.size();

    let integrate = |i: usize| -> (Texel, Texel) {
        let mut position = positions.vec2(i);
        let mut velocity = velocities.vec2(i);
        let mut force = forces.vec2(i);
        let density = density_pressure.texels()[i][0] as Scalar;

        if let Some(v) = impulse.and_then(|target| target.velocity_for(position)) {
            velocity = v;
            force = Vec2::zeros();
        }

        advance(&mut position, &mut velocity, force, density, delta_time);
        update_bounds(
            &mut position,
            &mut velocity,
            walls.damping,
            walls.epsilon,
            walls.bounds,
        );

        (texel(position), texel(velocity))
    };

    // The two outputs are rendered together, like a framebuffer with two attachments
    let out = Texture::render(size, |i| {
        let (p, v) = integrate(i);
        [p[0], p[1], v[0], v[1]]
    });

    let split = |offset: usize| {
        Texture::render(size, |i| {
            let t = out.texels()[i];
            [t[offset], t[offset + 1], 0., 0.]
        })
    };
    (split(0), split(2))
}

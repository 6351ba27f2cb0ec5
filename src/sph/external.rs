use super::grid::{CellLayout, Coord};
use super::parameters::ExternalForceMode;
use super::particles::SphParticles;
use crate::{Scalar, Vec2};

/// A one-shot disturbance from the pointer, in simulation space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impulse {
    pub position: Vec2,
    pub force: Vec2,
}

/// Overrides the velocity of every particle the impulse reaches, and zeroes its force so the
/// integrator doesn't change it again this step. Returns how many particles were hit.
///
/// In `Cell` mode a particle is hit if it is in the same cell of `layout` as the impulse.
pub fn apply_impulse(
    impulse: &Impulse,
    mode: ExternalForceMode,
    particles: &mut SphParticles,
    layout: CellLayout,
) -> usize {
    let target = ImpulseTarget::new(*impulse, mode, layout);

    let mut count = 0;
    for i in 0..particles.len() {
        if let Some(velocity) = target.velocity_for(particles.position[i]) {
            particles.velocity[i] = velocity;
            particles.force[i] = Vec2::zeros();
            count += 1;
        }
    }

    if count == 0 {
        tracing::debug!(position = ?impulse.position, "impulse hit no particles");
    }
    count
}

/// An impulse resolved against a target mode, so each particle can be tested on its own.
#[derive(Clone, Copy, Debug)]
pub struct ImpulseTarget {
    impulse: Impulse,
    kind: TargetKind,
}

#[derive(Clone, Copy, Debug)]
enum TargetKind {
    Cell {
        coord: Option<Coord>,
        layout: CellLayout,
    },
    Radius {
        radius_sq: Scalar,
        strength: Scalar,
    },
}

impl ImpulseTarget {
    /// `layout` is only used in `Cell` mode.
    pub fn new(impulse: Impulse, mode: ExternalForceMode, layout: CellLayout) -> Self {
        let kind = match mode {
            ExternalForceMode::Cell => TargetKind::Cell {
                coord: layout.try_position_to_coord(impulse.position),
                layout,
            },
            ExternalForceMode::Radius { radius, strength } => TargetKind::Radius {
                radius_sq: radius * radius,
                strength,
            },
        };
        ImpulseTarget { impulse, kind }
    }

    /// The velocity a particle at `position` is given, or `None` if the impulse doesn't reach it.
    pub fn velocity_for(&self, position: Vec2) -> Option<Vec2> {
        match self.kind {
            TargetKind::Cell { coord, layout } => {
                let coord = coord?;
                if layout.try_position_to_coord(position) == Some(coord) {
                    Some(self.impulse.force)
                } else {
                    None
                }
            }
            TargetKind::Radius {
                radius_sq,
                strength,
            } => {
                if (position - self.impulse.position).magnitude_squared() < radius_sq {
                    Some(self.impulse.force * strength)
                } else {
                    None
                }
            }
        }
    }
}

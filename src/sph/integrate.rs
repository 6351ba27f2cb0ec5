use super::forces::EPSILON;
use crate::{Scalar, Vec2};

/// Advances one particle by `dt`.
///
/// The position update uses the average of the old and new velocity, not just the new one.
pub fn advance(position: &mut Vec2, velocity: &mut Vec2, force: Vec2, density: Scalar, dt: Scalar) {
    let dv = force * (dt / (density + EPSILON));
    *velocity += dv;
    *position += (*velocity + 0.5 * dv) * dt;
}

/// Clamps a particle back into `[0, bounds_max]`, placing it `epsilon` inside the wall it
/// crossed. The velocity along that axis is multiplied by `velocity_damping`.
pub fn update_bounds(
    position: &mut Vec2,
    velocity: &mut Vec2,
    velocity_damping: Scalar,
    epsilon: Scalar,
    bounds_max: Vec2,
) {
    (0..2).for_each(|i| {
        if position[i] < 0. {
            position[i] = Scalar::min(epsilon, bounds_max[i]);
            velocity[i] *= velocity_damping;
        } else if position[i] > bounds_max[i] {
            position[i] = Scalar::max(bounds_max[i] - epsilon, 0.);
            velocity[i] *= velocity_damping;
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn zero_time_step_does_nothing() {
        let mut position = Vec2::new(1., 2.);
        let mut velocity = Vec2::new(-3., 0.5);

        advance(&mut position, &mut velocity, Vec2::new(100., -40.), 1.5, 0.);

        assert_eq!(position, Vec2::new(1., 2.));
        assert_eq!(velocity, Vec2::new(-3., 0.5));
    }

    #[test]
    fn midpoint_position_update() {
        let mut position = Vec2::zeros();
        let mut velocity = Vec2::zeros();

        advance(&mut position, &mut velocity, Vec2::new(2., 0.), 1., 1.);

        // new velocity times dt, plus half of the velocity change times dt
        assert!((velocity.x - 2.).abs() < 1e-6);
        assert!((position.x - 3.).abs() < 1e-6);
    }

    #[test]
    fn clamps_with_damping() {
        let bounds = Vec2::new(4., 4.);

        let mut position = Vec2::new(-0.5, 4.5);
        let mut velocity = Vec2::new(-2., 3.);
        update_bounds(&mut position, &mut velocity, 0., 1e-6, bounds);
        assert_eq!(position, Vec2::new(1e-6, 4. - 1e-6));
        assert_eq!(velocity, Vec2::zeros());

        let mut position = Vec2::new(-0.5, 2.);
        let mut velocity = Vec2::new(-2., 3.);
        update_bounds(&mut position, &mut velocity, -0.5, 1e-6, bounds);
        assert_eq!(velocity, Vec2::new(1., 3.));
    }

    proptest! {
        #[test]
        fn stays_in_bounds(x in -100f64..100., y in -100f64..100., damping in -1f64..1.) {
            let bounds = Vec2::new(3., 7.);
            let mut position = Vec2::new(x, y);
            let mut velocity = Vec2::new(1., 1.);

            update_bounds(&mut position, &mut velocity, damping, 1e-6, bounds);

            prop_assert!(position.x >= 0. && position.x <= bounds.x);
            prop_assert!(position.y >= 0. && position.y <= bounds.y);
        }
    }
}

use crate::{Scalar, Vec2};

/// Smooths the raw pointer position and turns dragging into impulses.
///
/// All positions are in view space. The force of an impulse is how far the smoothed pointer
/// moved since the previous frame.
#[derive(Clone, Debug)]
pub struct PointerTracker {
    /// How far the smoothed position moves towards the pointer each frame
    pub lerp: Scalar,
    /// Motion below this (squared) doesn't produce an impulse
    pub min_motion_sq: Scalar,
    down: bool,
    position: Vec2,
    smooth: Vec2,
    previous: Vec2,
}

impl Default for PointerTracker {
    fn default() -> Self {
        PointerTracker {
            lerp: 1. / 5.,
            min_motion_sq: 0.01,
            down: false,
            position: Vec2::zeros(),
            smooth: Vec2::zeros(),
            previous: Vec2::zeros(),
        }
    }
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_down(&self) -> bool {
        self.down
    }

    /// The smoothed pointer position.
    pub fn position(&self) -> Vec2 {
        self.smooth
    }

    /// Starts a drag. The smoothed position jumps to the pointer, so pressing doesn't cause an
    /// impulse by itself.
    pub fn pointer_down(&mut self, position: Vec2) {
        self.down = true;
        self.position = position;
        self.smooth = position;
        self.previous = position;
    }

    /// Also used when the pointer leaves the view.
    pub fn pointer_up(&mut self) {
        self.down = false;
    }

    /// Moves while the pointer isn't down are ignored.
    pub fn pointer_move(&mut self, position: Vec2) {
        if self.down {
            self.position = position;
        }
    }

    /// Advances the smoothing by one frame. Returns the impulse for this frame as
    /// `(position, force)`, if the pointer is down and moved far enough.
    pub fn update(&mut self) -> Option<(Vec2, Vec2)> {
        self.smooth += (self.position - self.smooth) * self.lerp;
        let delta = self.smooth - self.previous;
        self.previous = self.smooth;

        if self.down && delta.magnitude_squared() > self.min_motion_sq {
            Some((self.smooth, delta))
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drag_produces_smoothed_impulses() {
        let mut pointer = PointerTracker::new();
        pointer.pointer_down(Vec2::new(100., 100.));
        assert_eq!(pointer.update(), None);

        pointer.pointer_move(Vec2::new(150., 100.));
        let (position, force) = pointer.update().unwrap();
        assert_eq!(position, Vec2::new(110., 100.));
        assert_eq!(force, Vec2::new(10., 0.));

        // 10, then 8, then 6.4 ... towards the pointer
        let (_, force) = pointer.update().unwrap();
        assert!((force.x - 8.).abs() < 1e-12);
    }

    #[test]
    fn small_motion_is_ignored() {
        let mut pointer = PointerTracker::new();
        pointer.pointer_down(Vec2::new(10., 10.));
        pointer.pointer_move(Vec2::new(10.4, 10.));
        // moves 0.08, squared that's below 0.01
        assert_eq!(pointer.update(), None);
    }

    #[test]
    fn released_pointer_is_quiet() {
        let mut pointer = PointerTracker::new();
        pointer.pointer_move(Vec2::new(50., 50.));
        assert_eq!(pointer.update(), None);
        assert_eq!(pointer.position(), Vec2::zeros());

        pointer.pointer_down(Vec2::new(0., 0.));
        pointer.pointer_move(Vec2::new(50., 50.));
        pointer.pointer_up();
        assert!(!pointer.is_down());
        assert_eq!(pointer.update(), None);
    }
}

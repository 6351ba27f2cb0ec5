//! Turns the caller's animation frames into simulation steps.
use crate::{Scalar, Simulation, Vec2};

/// The frame duration, in milliseconds, that everything is tuned for (60 fps).
pub const TARGET_FRAME_DURATION: Scalar = 16.;
/// Longer frames are cut short.
pub const MAX_FRAME_DURATION: Scalar = 32.;

/// The timing of a single frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameTime {
    /// Milliseconds since the previous frame, clamped to `[0, MAX_FRAME_DURATION]`
    pub delta: Scalar,
    /// `delta` in target frames, 1 at 60 fps
    pub delta_frames: Scalar,
}

/// Keeps track of the animation callback's timestamps.
#[derive(Clone, Debug, Default)]
pub struct FrameClock {
    time: Scalar,
    frames: Scalar,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a frame at `time` (milliseconds, from the same clock every call).
    pub fn tick(&mut self, time: Scalar) -> FrameTime {
        let delta = (time - self.time).clamp(0., MAX_FRAME_DURATION);
        let delta_frames = delta / TARGET_FRAME_DURATION;

        self.time = time;
        self.frames += delta_frames;

        FrameTime {
            delta,
            delta_frames,
        }
    }

    /// The timestamp of the last frame.
    pub fn time(&self) -> Scalar {
        self.time
    }

    /// Total elapsed time, counted in target frames.
    pub fn frames(&self) -> Scalar {
        self.frames
    }
}

/// Owns a simulation and advances it once per animation frame.
pub struct StepDriver<S> {
    simulation: S,
    clock: FrameClock,
}

impl<S: Simulation> StepDriver<S> {
    pub fn new(simulation: S) -> Self {
        StepDriver {
            simulation,
            clock: FrameClock::new(),
        }
    }

    pub fn simulation(&self) -> &S {
        &self.simulation
    }

    pub fn simulation_mut(&mut self) -> &mut S {
        &mut self.simulation
    }

    pub fn into_simulation(self) -> S {
        self.simulation
    }

    pub fn clock(&self) -> &FrameClock {
        &self.clock
    }

    /// The simulation time of one sub-step in a frame of the given length.
    pub fn substep_time(&self, frame: FrameTime) -> Scalar {
        let params = self.simulation.parameters();
        let ms = match params.fixed_substep_ms {
            Some(fixed) => fixed * frame.delta_frames,
            None => frame.delta / params.substeps as Scalar,
        };
        ms * params.time_scale
    }

    /// Runs all the sub-steps of a frame at `time` milliseconds.
    ///
    /// `impulse` is a pointer position in view space and the force to apply there. It only
    /// affects the first sub-step.
    pub fn frame(&mut self, time: Scalar, impulse: Option<(Vec2, Vec2)>) -> FrameTime {
        let frame = self.clock.tick(time);
        let delta_time = self.substep_time(frame);
        let substeps = self.simulation.parameters().substeps;

        let _span = tracing::trace_span!("frame", time, substeps, delta_time).entered();

        if let Some((position, force)) = impulse {
            let position = self.simulation.space().to_simulation_space(position);
            self.simulation.apply_external_force(position, force);
        }

        for _ in 0..substeps {
            self.simulation.step(delta_time);
        }

        frame
    }
}

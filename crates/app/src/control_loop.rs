//! Per-tick coupling of controller output to plant actuators
//!
//! Each tick follows a strict order: read the pendulum angle, update the
//! PID, write the command to both wheel motors as one atomic step, then
//! advance the physics by exactly one dt. Reordering would let the
//! controller act on post-step state and break the fixed-dt contract.

use control::PidController;
use mechanics::CartPoleRig;
use simcore::{PhysicsWorld, SimResult};

/// Loop lifecycle. STOPPED is terminal; there is no paused state and a
/// stopped loop never resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopped,
}

/// Per-tick diagnostics handed to the telemetry sink.
#[derive(Debug, Clone, Copy)]
pub struct TickReport {
    /// Error recorded by this tick's PID update
    pub error: f64,
    /// Control output written to both motors
    pub control: f64,
    /// Pendulum angle read at the top of the tick, radians
    pub angle: f64,
    /// Pendulum angular velocity at the top of the tick, rad/s
    pub angular_velocity: f64,
}

/// Couples one controller to one rig's actuators.
pub struct ControlLoop {
    rig: CartPoleRig,
    controller: PidController,
    state: LoopState,
    /// Rate both motors are known to hold, used to undo a half-applied write.
    last_commanded: f64,
}

impl ControlLoop {
    pub fn new(rig: CartPoleRig, controller: PidController) -> Self {
        Self {
            rig,
            controller,
            state: LoopState::Running,
            last_commanded: 0.0,
        }
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    /// Transition to STOPPED. Idempotent; the transition is one-way.
    pub fn stop(&mut self) {
        self.state = LoopState::Stopped;
    }

    pub fn controller(&self) -> &PidController {
        &self.controller
    }

    pub fn rig(&self) -> &CartPoleRig {
        &self.rig
    }

    /// Run one control tick against `world` and advance it by `dt`.
    ///
    /// Any failure is fatal to the loop: a missing measurement must not be
    /// papered over with a stale value, and a half-written actuator command
    /// must not persist.
    pub fn tick<W: PhysicsWorld>(&mut self, world: &mut W, dt: f64) -> SimResult<TickReport> {
        let angle = self.rig.pendulum_angle(world)?;
        let angular_velocity = self.rig.pendulum_angular_velocity(world)?;

        let control = self.controller.update(angle, dt)?;

        self.apply_drive_rate(world, control)?;

        world.step(dt);

        Ok(TickReport {
            error: self.controller.current_error(),
            control,
            angle,
            angular_velocity,
        })
    }

    /// Write `rate` to both wheel motors as a single atomic step. Both
    /// wheels are driven symmetrically; if the second write fails, the first
    /// motor is restored to its prior commanded rate before the error
    /// propagates, so no partial update is left in place.
    fn apply_drive_rate<W: PhysicsWorld>(&mut self, world: &mut W, rate: f64) -> SimResult<()> {
        let prior = self.last_commanded;
        world.set_motor_rate(self.rig.motors[0], rate)?;
        if let Err(err) = world.set_motor_rate(self.rig.motors[1], rate) {
            // Best-effort restore; the loop is halting either way.
            if world.set_motor_rate(self.rig.motors[0], prior).is_err() {
                log::error!("could not restore motor rate after failed dual write");
            }
            return Err(err);
        }
        self.last_commanded = rate;
        Ok(())
    }
}

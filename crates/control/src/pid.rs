//! PID (Proportional-Integral-Derivative) Controller
//!
//! Discrete-time PID with a fixed step, derivative on error, and an optional
//! integral clamp. The clamp is off by default: the unclamped accumulator
//! matches the behavior the rig was tuned against, and sustained large error
//! will wind it up without bound unless a limit is configured.

use serde::{Deserialize, Serialize};
use simcore::{SimError, SimResult};

/// Configuration for a PID controller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidConfig {
    /// Proportional gain
    pub kp: f64,
    /// Integral gain
    pub ki: f64,
    /// Derivative gain
    pub kd: f64,
    /// Target value the measurement is driven toward (radians for the rig)
    pub setpoint: f64,
    /// Maximum integral accumulator magnitude (None = never clamp)
    pub integral_limit: Option<f64>,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            kp: 0.0,
            ki: 0.0,
            kd: 0.0,
            setpoint: 0.0,
            integral_limit: None,
        }
    }
}

impl PidConfig {
    /// Create a configuration with the three gains
    pub fn new(kp: f64, ki: f64, kd: f64) -> Self {
        Self { kp, ki, kd, ..Default::default() }
    }

    /// Create a P-only configuration
    pub fn p(kp: f64) -> Self {
        Self { kp, ..Default::default() }
    }

    /// Set the setpoint
    pub fn with_setpoint(mut self, setpoint: f64) -> Self {
        self.setpoint = setpoint;
        self
    }

    /// Set a symmetric integral clamp (anti-windup)
    pub fn with_integral_limit(mut self, limit: f64) -> Self {
        self.integral_limit = Some(limit);
        self
    }
}

/// Stateful PID controller
///
/// One instance is bound to one observed body for the life of a run. Calling
/// [`update`](PidController::update) mutates the integral and derivative
/// state, so identical inputs do not produce identical outputs on repeat
/// calls; the controller is deterministic over input *sequences*, not
/// idempotent per call.
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    integral: f64,
    previous_error: f64,
    current_error: f64,
    control_vector: f64,
}

impl PidController {
    /// Create a new controller with zeroed state
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            previous_error: 0.0,
            current_error: 0.0,
            control_vector: 0.0,
        }
    }

    /// Set the target setpoint
    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.config.setpoint = setpoint;
    }

    /// Get the current setpoint
    pub fn setpoint(&self) -> f64 {
        self.config.setpoint
    }

    /// Update the controller with a new measurement and return the control
    /// output.
    ///
    /// `dt` is the fixed tick step and must be positive; the loop owns that
    /// invariant, but a violation is rejected here rather than dividing by
    /// zero in the derivative term.
    pub fn update(&mut self, measurement: f64, dt: f64) -> SimResult<f64> {
        if !(dt > 0.0) {
            return Err(SimError::InvalidArgument(format!(
                "PID update requires dt > 0, got {dt}"
            )));
        }

        let error = self.config.setpoint - measurement;

        self.integral += error * dt;
        if let Some(limit) = self.config.integral_limit {
            self.integral = self.integral.clamp(-limit, limit);
        }

        let derivative = (error - self.previous_error) / dt;

        let output = self.config.kp * error
            + self.config.ki * self.integral
            + self.config.kd * derivative;

        self.previous_error = error;
        self.current_error = error;
        self.control_vector = output;

        Ok(output)
    }

    /// Clear integral, derivative, and diagnostic state
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.previous_error = 0.0;
        self.current_error = 0.0;
        self.control_vector = 0.0;
    }

    /// Error recorded by the most recent update
    pub fn current_error(&self) -> f64 {
        self.current_error
    }

    /// Output computed by the most recent update
    pub fn control_vector(&self) -> f64 {
        self.control_vector
    }

    /// Current integral accumulator value
    pub fn integral(&self) -> f64 {
        self.integral
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &PidConfig {
        &self.config
    }
}

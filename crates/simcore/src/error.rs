use thiserror::Error;

/// Failure taxonomy for the control harness.
///
/// All three variants are unrecoverable at the tick level: the loop halts
/// rather than retrying, because a retry inside a tick would break the
/// fixed-dt assumption the derivative term depends on.
#[derive(Debug, Error)]
pub enum SimError {
    /// Malformed construction parameters (non-positive dt, negative geometry).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A measurement could not be read from the plant, e.g. the observed
    /// body no longer exists in the physics world.
    #[error("plant state unavailable: {0}")]
    StateUnavailable(String),

    /// A computed command could not be applied to the motors.
    #[error("actuator write failed: {0}")]
    ActuatorWriteFailure(String),
}

pub type SimResult<T> = Result<T, SimError>;

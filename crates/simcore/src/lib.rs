pub mod error;
pub mod traits;

pub use error::{SimError, SimResult};
pub use traits::{
    BodyHandle, ControlSignal, InputPoll, JointHandle, MotorHandle, PhysicsWorld, ShapeHandle,
    SimContext, TelemetrySink,
};

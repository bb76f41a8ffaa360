//! Simulation harness for the cart-pole rig
//!
//! Wires the plant, the PID controller, and the collaborators together:
//! the per-tick control loop, the real-time driver, a console telemetry
//! sink, a Ctrl-C quit poll, and a built-in planar physics stand-in so the
//! binary runs headless.

pub mod control_loop;
pub mod driver;
pub mod input;
pub mod planar;
pub mod telemetry;

pub use control_loop::{ControlLoop, LoopState, TickReport};
pub use driver::{DriverConfig, SimulationDriver};
pub use input::CtrlCPoll;
pub use planar::PlanarWorld;
pub use telemetry::ConsoleTelemetry;

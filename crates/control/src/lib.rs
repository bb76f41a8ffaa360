//! Closed-loop control for the cart-pole harness
//!
//! This crate provides the discrete-time PID controller that drives the
//! pendulum toward its setpoint once per simulation tick.

pub mod pid;

pub use pid::*;

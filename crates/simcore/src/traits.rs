use nalgebra::Vector2;

use crate::error::SimResult;

/// Per-tick timing context passed to collaborators.
#[derive(Debug, Clone, Copy)]
pub struct SimContext {
    pub dt: f64,
    pub t: f64,
}

// Opaque handles into a physics world. The core never dereferences these
// itself; it hands them back to the world that issued them.

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BodyHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ShapeHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct JointHandle(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MotorHandle(pub usize);

/// Capability contract for the external rigid-body solver.
///
/// The harness consumes the solver through this interface only: rig
/// construction, read access to body state, velocity-motor actuation, and a
/// fixed-step advance. Body state is mutated exclusively by `step`; the
/// controller side only reads angles and writes motor rates.
pub trait PhysicsWorld {
    // Construction

    fn add_body(&mut self, position: Vector2<f64>) -> BodyHandle;

    /// Offset the body's center of gravity, expressed in the body's local frame.
    fn set_center_of_gravity(&mut self, body: BodyHandle, local_offset: Vector2<f64>);

    fn add_box_shape(
        &mut self,
        body: BodyHandle,
        width: f64,
        height: f64,
        density: f64,
        friction: f64,
    ) -> ShapeHandle;

    fn add_circle_shape(
        &mut self,
        body: BodyHandle,
        radius: f64,
        density: f64,
        friction: f64,
    ) -> ShapeHandle;

    /// Shapes sharing a non-zero group never collide with each other.
    fn set_shape_group(&mut self, shape: ShapeHandle, group: u32);

    /// Pin two bodies together at a shared point. Anchors are expressed in
    /// each body's local frame. Translation between the bodies is locked;
    /// relative rotation stays free.
    fn add_pivot_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
        collide_bodies: bool,
    ) -> JointHandle;

    /// Cap the relative angle between two bodies to `[min, max]` radians.
    fn add_rotary_limit_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        min: f64,
        max: f64,
        collide_bodies: bool,
    ) -> JointHandle;

    /// Velocity-controlled motor driving the relative angular rate of `a`
    /// with respect to `b`.
    fn add_motor(&mut self, a: BodyHandle, b: BodyHandle, rate: f64) -> MotorHandle;

    // Observation

    fn body_position(&self, body: BodyHandle) -> Option<Vector2<f64>>;

    fn body_angle(&self, body: BodyHandle) -> Option<f64>;

    fn body_angular_velocity(&self, body: BodyHandle) -> Option<f64>;

    // Actuation

    fn set_motor_rate(&mut self, motor: MotorHandle, rate: f64) -> SimResult<()>;

    fn motor_rate(&self, motor: MotorHandle) -> Option<f64>;

    // Integration

    /// Advance the world by exactly one fixed step.
    fn step(&mut self, dt: f64);
}

/// One-way, lossy reporting channel for the rendering/telemetry collaborator.
/// Nothing here feeds back into the controller, and a failing sink must never
/// affect control correctness.
pub trait TelemetrySink {
    /// Request a draw of the current physical configuration.
    fn draw(&mut self, ctx: SimContext);

    /// Push one line of overlay text for this tick.
    fn overlay(&mut self, line: &str);

    /// Flush and close the sink. Called once, on the STOPPED transition.
    fn flush(&mut self);
}

/// Discrete external signals consumed by the driver, at most once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    Quit,
}

/// Synchronous, non-blocking poll of pending external events. Returns zero
/// or more signals which are consumed within the same tick.
pub trait InputPoll {
    fn poll(&mut self) -> Vec<ControlSignal>;
}

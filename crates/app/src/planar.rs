//! Built-in planar physics collaborator
//!
//! A deliberately small stand-in for the external rigid-body solver so the
//! harness runs headless. It implements the full `PhysicsWorld` construction
//! surface, but its dynamics are specialized to the cart-pole topology it
//! discovers from the joint graph: gravity destabilizes the pendulum, the
//! commanded wheel rate drives the cart with a first-order lag, and the
//! rotary limit joint clamps the swing at the stops.
//!
//! Coordinates follow the reference solver: screen units, +y pointing down.
//! This module is a collaborator implementation, not part of the control
//! contract.

use nalgebra::Vector2;
use simcore::{
    BodyHandle, JointHandle, MotorHandle, PhysicsWorld, ShapeHandle, SimError, SimResult,
};

/// Gravity magnitude in screen units/s^2, matching the reference space.
const DEFAULT_GRAVITY: f64 = 1000.0;

/// First-order lag of cart speed toward the wheel-rate command, seconds.
const CART_DRIVE_LAG: f64 = 0.05;

struct Body {
    position: Vector2<f64>,
    velocity: Vector2<f64>,
    angle: f64,
    angular_velocity: f64,
    cog: Vector2<f64>,
    alive: bool,
}

#[derive(Clone, Copy)]
enum ShapeKind {
    Box { height: f64 },
    Circle { radius: f64 },
}

struct Shape {
    body: BodyHandle,
    kind: ShapeKind,
    group: u32,
}

#[derive(Clone, Copy)]
enum JointKind {
    Pivot {
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
    },
    RotaryLimit {
        min: f64,
        max: f64,
    },
}

struct Joint {
    a: BodyHandle,
    b: BodyHandle,
    kind: JointKind,
}

struct Motor {
    a: BodyHandle,
    b: BodyHandle,
    rate: f64,
}

pub struct PlanarWorld {
    gravity: f64,
    bodies: Vec<Body>,
    shapes: Vec<Shape>,
    joints: Vec<Joint>,
    motors: Vec<Motor>,
    time: f64,
}

impl PlanarWorld {
    pub fn new() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            bodies: Vec::new(),
            shapes: Vec::new(),
            joints: Vec::new(),
            motors: Vec::new(),
            time: 0.0,
        }
    }

    pub fn with_gravity(mut self, gravity: f64) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    /// Remove a body from the world. Subsequent state reads return `None`
    /// and motor writes touching it fail.
    pub fn remove_body(&mut self, body: BodyHandle) {
        if let Some(b) = self.bodies.get_mut(body.0) {
            b.alive = false;
        }
    }

    /// Set the pendulum's absolute angle directly, e.g. to seed an initial
    /// lean. Resolved through the rotary limit joint's second body.
    pub fn set_pendulum_angle(&mut self, angle: f64) {
        if let Some((_, pendulum)) = self.limit_pair() {
            self.bodies[pendulum.0].angle = angle;
            self.settle_attached_positions();
        }
    }

    /// Collision exclusion group a shape was tagged with, 0 if none. The
    /// stand-in never resolves contacts, but the tag is kept observable so
    /// rig construction can be verified against it.
    pub fn shape_group(&self, shape: ShapeHandle) -> Option<u32> {
        self.shapes.get(shape.0).map(|s| s.group)
    }

    /// Local center-of-gravity offset recorded for a body.
    pub fn center_of_gravity(&self, body: BodyHandle) -> Option<Vector2<f64>> {
        self.bodies.get(body.0).filter(|b| b.alive).map(|b| b.cog)
    }

    /// The (cart, pendulum) pair constrained by the rotary limit joint.
    fn limit_pair(&self) -> Option<(BodyHandle, BodyHandle)> {
        self.joints.iter().find_map(|j| match j.kind {
            JointKind::RotaryLimit { .. } => Some((j.a, j.b)),
            _ => None,
        })
    }

    fn limit_range(&self) -> Option<(f64, f64)> {
        self.joints.iter().find_map(|j| match j.kind {
            JointKind::RotaryLimit { min, max } => Some((min, max)),
            _ => None,
        })
    }

    fn box_height_of(&self, body: BodyHandle) -> Option<f64> {
        self.shapes.iter().find_map(|s| match s.kind {
            ShapeKind::Box { height } if s.body == body => Some(height),
            _ => None,
        })
    }

    fn circle_radius_of(&self, body: BodyHandle) -> Option<f64> {
        self.shapes.iter().find_map(|s| match s.kind {
            ShapeKind::Circle { radius } if s.body == body => Some(radius),
            _ => None,
        })
    }

    /// Mean commanded rate across motors; both wheels are driven
    /// symmetrically so in practice the rates are identical.
    fn commanded_rate(&self) -> f64 {
        if self.motors.is_empty() {
            return 0.0;
        }
        self.motors.iter().map(|m| m.rate).sum::<f64>() / self.motors.len() as f64
    }

    /// Re-place pivot-jointed bodies so their anchors coincide with the
    /// anchors on the body they hang off.
    fn settle_attached_positions(&mut self) {
        for i in 0..self.joints.len() {
            if let JointKind::Pivot { anchor_a, anchor_b } = self.joints[i].kind {
                let a = self.joints[i].a;
                let b = self.joints[i].b;
                if !self.alive(a) || !self.alive(b) {
                    continue;
                }
                let pivot_world = self.bodies[a.0].position + anchor_a;
                let angle_b = self.bodies[b.0].angle;
                self.bodies[b.0].position = pivot_world - rotate(anchor_b, angle_b);
            }
        }
    }

    fn alive(&self, body: BodyHandle) -> bool {
        self.bodies.get(body.0).map(|b| b.alive).unwrap_or(false)
    }
}

impl Default for PlanarWorld {
    fn default() -> Self {
        Self::new()
    }
}

fn rotate(v: Vector2<f64>, angle: f64) -> Vector2<f64> {
    let (sin, cos) = angle.sin_cos();
    Vector2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

impl PhysicsWorld for PlanarWorld {
    fn add_body(&mut self, position: Vector2<f64>) -> BodyHandle {
        self.bodies.push(Body {
            position,
            velocity: Vector2::zeros(),
            angle: 0.0,
            angular_velocity: 0.0,
            cog: Vector2::zeros(),
            alive: true,
        });
        BodyHandle(self.bodies.len() - 1)
    }

    fn set_center_of_gravity(&mut self, body: BodyHandle, local_offset: Vector2<f64>) {
        if let Some(b) = self.bodies.get_mut(body.0) {
            b.cog = local_offset;
        }
    }

    fn add_box_shape(
        &mut self,
        body: BodyHandle,
        _width: f64,
        height: f64,
        _density: f64,
        _friction: f64,
    ) -> ShapeHandle {
        self.shapes.push(Shape {
            body,
            kind: ShapeKind::Box { height },
            group: 0,
        });
        ShapeHandle(self.shapes.len() - 1)
    }

    fn add_circle_shape(
        &mut self,
        body: BodyHandle,
        radius: f64,
        _density: f64,
        _friction: f64,
    ) -> ShapeHandle {
        self.shapes.push(Shape {
            body,
            kind: ShapeKind::Circle { radius },
            group: 0,
        });
        ShapeHandle(self.shapes.len() - 1)
    }

    fn set_shape_group(&mut self, shape: ShapeHandle, group: u32) {
        if let Some(s) = self.shapes.get_mut(shape.0) {
            s.group = group;
        }
    }

    fn add_pivot_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
        _collide_bodies: bool,
    ) -> JointHandle {
        self.joints.push(Joint {
            a,
            b,
            kind: JointKind::Pivot { anchor_a, anchor_b },
        });
        JointHandle(self.joints.len() - 1)
    }

    fn add_rotary_limit_joint(
        &mut self,
        a: BodyHandle,
        b: BodyHandle,
        min: f64,
        max: f64,
        _collide_bodies: bool,
    ) -> JointHandle {
        self.joints.push(Joint {
            a,
            b,
            kind: JointKind::RotaryLimit { min, max },
        });
        JointHandle(self.joints.len() - 1)
    }

    fn add_motor(&mut self, a: BodyHandle, b: BodyHandle, rate: f64) -> MotorHandle {
        self.motors.push(Motor { a, b, rate });
        MotorHandle(self.motors.len() - 1)
    }

    fn body_position(&self, body: BodyHandle) -> Option<Vector2<f64>> {
        self.bodies
            .get(body.0)
            .filter(|b| b.alive)
            .map(|b| b.position)
    }

    fn body_angle(&self, body: BodyHandle) -> Option<f64> {
        self.bodies.get(body.0).filter(|b| b.alive).map(|b| b.angle)
    }

    fn body_angular_velocity(&self, body: BodyHandle) -> Option<f64> {
        self.bodies
            .get(body.0)
            .filter(|b| b.alive)
            .map(|b| b.angular_velocity)
    }

    fn set_motor_rate(&mut self, motor: MotorHandle, rate: f64) -> SimResult<()> {
        let Some(m) = self.motors.get_mut(motor.0) else {
            return Err(SimError::ActuatorWriteFailure(format!(
                "no such motor {motor:?}"
            )));
        };
        let (a, b) = (m.a, m.b);
        if !self.alive(a) || !self.alive(b) {
            return Err(SimError::ActuatorWriteFailure(format!(
                "motor {motor:?} drives a removed body"
            )));
        }
        self.motors[motor.0].rate = rate;
        Ok(())
    }

    fn motor_rate(&self, motor: MotorHandle) -> Option<f64> {
        self.motors.get(motor.0).map(|m| m.rate)
    }

    fn step(&mut self, dt: f64) {
        self.time += dt;

        let Some((cart, pendulum)) = self.limit_pair() else {
            return;
        };
        if !self.alive(cart) || !self.alive(pendulum) {
            return;
        }
        let Some((min, max)) = self.limit_range() else {
            return;
        };
        let rod_length = self.box_height_of(pendulum).unwrap_or(1.0);
        let wheel_radius = self
            .motors
            .first()
            .and_then(|m| self.circle_radius_of(m.a))
            .unwrap_or(1.0);

        // Cart: wheel rate commands a target ground speed with a first-order
        // lag standing in for wheel/ground dynamics. The sign puts the cart
        // under the lean for the reference controller polarity.
        let rate = self.commanded_rate();
        let target_speed = -rate * wheel_radius;
        let cart_velocity = self.bodies[cart.0].velocity.x;
        let cart_accel = (target_speed - cart_velocity) / CART_DRIVE_LAG;
        self.bodies[cart.0].velocity.x += cart_accel * dt;
        let new_cart_velocity = self.bodies[cart.0].velocity.x;
        self.bodies[cart.0].position.x += new_cart_velocity * dt;

        // Pendulum: compound rod pivoted at one end. Gravity tips it over,
        // cart acceleration rights it.
        let cart_angle = self.bodies[cart.0].angle;
        let relative = self.bodies[pendulum.0].angle - cart_angle;
        let mut angular_velocity = self.bodies[pendulum.0].angular_velocity;
        let angular_accel = (3.0 / (2.0 * rod_length))
            * (self.gravity * relative.sin() - cart_accel * relative.cos());
        angular_velocity += angular_accel * dt;
        let mut next_relative = relative + angular_velocity * dt;

        // Rotary limit: hard stop, no bounce. Outward velocity dies at the
        // stop; inward velocity is kept so the rod can leave it.
        if next_relative <= min {
            next_relative = min;
            angular_velocity = angular_velocity.max(0.0);
        } else if next_relative >= max {
            next_relative = max;
            angular_velocity = angular_velocity.min(0.0);
        }
        self.bodies[pendulum.0].angle = cart_angle + next_relative;
        self.bodies[pendulum.0].angular_velocity = angular_velocity;

        // Wheels spin at their commanded relative rate.
        for i in 0..self.motors.len() {
            let wheel = self.motors[i].a;
            let rate = self.motors[i].rate;
            if self.alive(wheel) {
                self.bodies[wheel.0].angular_velocity = rate;
                self.bodies[wheel.0].angle += rate * dt;
            }
        }

        self.settle_attached_positions();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mechanics::{CartPoleRig, CartPoleRigConfig};

    const DT: f64 = 1.0 / 60.0;

    fn spawn_world() -> (PlanarWorld, CartPoleRig) {
        let mut world = PlanarWorld::new();
        let rig = CartPoleRig::spawn(&mut world, &CartPoleRigConfig::default()).unwrap();
        (world, rig)
    }

    #[test]
    fn test_gravity_tips_uncontrolled_pendulum() {
        let (mut world, rig) = spawn_world();
        world.set_pendulum_angle(0.05);
        for _ in 0..120 {
            world.step(DT);
        }
        let angle = world.body_angle(rig.pendulum).unwrap();
        assert!(angle > 0.05, "lean should grow, got {angle}");
    }

    #[test]
    fn test_limit_joint_clamps_swing() {
        let (mut world, rig) = spawn_world();
        let limit = 15.0_f64.to_radians();
        world.set_pendulum_angle(0.1);
        for _ in 0..600 {
            world.step(DT);
            let angle = world.body_angle(rig.pendulum).unwrap();
            let cart = world.body_angle(rig.cart).unwrap();
            assert!(
                (angle - cart).abs() <= limit + 1e-9,
                "swing exceeded limit: {angle}"
            );
        }
        // Uncontrolled, the rod ends up parked on the stop.
        let angle = world.body_angle(rig.pendulum).unwrap();
        assert!((angle - limit).abs() < 1e-9);
    }

    #[test]
    fn test_motor_rate_drives_cart() {
        let (mut world, rig) = spawn_world();
        let x0 = world.body_position(rig.cart).unwrap().x;
        for motor in rig.motors {
            world.set_motor_rate(motor, 2.0).unwrap();
        }
        for _ in 0..60 {
            world.step(DT);
        }
        let x1 = world.body_position(rig.cart).unwrap().x;
        assert!(x1 < x0, "positive wheel rate should move the cart in -x");
        // Wheels track the cart through the pivots.
        let wheel_x = world.body_position(rig.wheels[0]).unwrap().x;
        assert!((wheel_x - (x1 + 50.0)).abs() < 1e-9);
    }

    #[test]
    fn test_removed_body_reads_none_and_fails_writes() {
        let (mut world, rig) = spawn_world();
        world.remove_body(rig.wheels[0]);
        assert!(world.body_angle(rig.wheels[0]).is_none());
        assert!(matches!(
            world.set_motor_rate(rig.motors[0], 1.0),
            Err(SimError::ActuatorWriteFailure(_))
        ));
    }

    #[test]
    fn test_construction_surface_is_observable() {
        let (world, rig) = spawn_world();
        assert_eq!(world.shape_group(rig.shapes[0]), Some(mechanics::CART_GROUP));
        assert_eq!(world.shape_group(rig.shapes[3]), Some(0));
        assert_eq!(
            world.center_of_gravity(rig.pendulum),
            Some(Vector2::new(0.0, 100.0))
        );
    }

    #[test]
    fn test_step_advances_time() {
        let (mut world, _rig) = spawn_world();
        for _ in 0..60 {
            world.step(DT);
        }
        assert!((world.time() - 1.0).abs() < 1e-9);
    }
}

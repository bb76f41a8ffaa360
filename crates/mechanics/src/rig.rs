//! Cart-pole plant rig
//!
//! Describes the mechanical assembly the controller observes and acts upon:
//! a cart body carrying two motor-driven wheels and a pendulum rod pivoted
//! to the cart, with a rotary limit joint capping the swing. Construction
//! goes through the [`PhysicsWorld`] capability trait, so the rig is
//! independent of any concrete solver.

use nalgebra::Vector2;
use serde::{Deserialize, Serialize};
use simcore::{
    BodyHandle, JointHandle, MotorHandle, PhysicsWorld, ShapeHandle, SimError, SimResult,
};

/// Collision exclusion group shared by the cart and its wheels. The pendulum
/// stays outside the group so the limit joint, not contact filtering, is what
/// constrains it.
pub const CART_GROUP: u32 = 2;

/// Construction parameters for the cart-pole rig.
///
/// Defaults reproduce the reference rig: a 100x20 cart at (345, 520) with
/// radius-10 wheels, a 10x200 pendulum rod, and a 15 degree symmetric swing
/// limit. Lengths are in screen units with +y pointing down, matching the
/// solver convention the rig was tuned against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartPoleRigConfig {
    /// Cart center position
    pub origin: Vector2<f64>,
    /// Cart body width
    pub cart_width: f64,
    /// Cart body height
    pub cart_height: f64,
    /// Cart shape density
    pub cart_density: f64,
    /// Cart shape friction
    pub cart_friction: f64,
    /// Wheel radius
    pub wheel_radius: f64,
    /// Wheel shape density
    pub wheel_density: f64,
    /// Wheel shape friction
    pub wheel_friction: f64,
    /// Pendulum rod width
    pub pendulum_width: f64,
    /// Pendulum rod height
    pub pendulum_height: f64,
    /// Pendulum shape density
    pub pendulum_density: f64,
    /// Pendulum shape friction
    pub pendulum_friction: f64,
    /// How far the pivot sits inside the rod's lower end (and below the
    /// cart's bottom edge)
    pub pivot_inset: f64,
    /// Symmetric rotary limit around upright, radians
    pub joint_limit: f64,
}

impl Default for CartPoleRigConfig {
    fn default() -> Self {
        Self {
            origin: Vector2::new(345.0, 520.0),
            cart_width: 100.0,
            cart_height: 20.0,
            cart_density: 0.88,
            cart_friction: 0.0,
            wheel_radius: 10.0,
            wheel_density: 0.88,
            wheel_friction: 1.05,
            pendulum_width: 10.0,
            pendulum_height: 200.0,
            pendulum_density: 1.18,
            pendulum_friction: 0.0,
            pivot_inset: 5.0,
            joint_limit: 15.0_f64.to_radians(),
        }
    }
}

impl CartPoleRigConfig {
    /// Set the cart origin
    pub fn with_origin(mut self, origin: Vector2<f64>) -> Self {
        self.origin = origin;
        self
    }

    /// Set the symmetric swing limit in radians
    pub fn with_joint_limit(mut self, limit: f64) -> Self {
        self.joint_limit = limit;
        self
    }

    /// Reject malformed geometry and material parameters.
    pub fn validate(&self) -> SimResult<()> {
        let positive = [
            ("cart_width", self.cart_width),
            ("cart_height", self.cart_height),
            ("cart_density", self.cart_density),
            ("wheel_radius", self.wheel_radius),
            ("wheel_density", self.wheel_density),
            ("pendulum_width", self.pendulum_width),
            ("pendulum_height", self.pendulum_height),
            ("pendulum_density", self.pendulum_density),
            ("joint_limit", self.joint_limit),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(SimError::InvalidArgument(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        let non_negative = [
            ("cart_friction", self.cart_friction),
            ("wheel_friction", self.wheel_friction),
            ("pendulum_friction", self.pendulum_friction),
        ];
        for (name, value) in non_negative {
            if !(value >= 0.0) {
                return Err(SimError::InvalidArgument(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    /// Cart-local attachment points for the two wheels.
    pub fn wheel_anchors(&self) -> [Vector2<f64>; 2] {
        [
            Vector2::new(self.cart_width / 2.0, self.cart_height / 2.0),
            Vector2::new(-self.cart_width / 2.0, self.cart_height / 2.0),
        ]
    }

    /// Cart-local pendulum pivot point, just below the cart's bottom edge.
    pub fn pivot_anchor_on_cart(&self) -> Vector2<f64> {
        Vector2::new(0.0, -self.cart_height / 2.0 - self.pivot_inset)
    }

    /// Pendulum-local pivot point, just inside the rod's lower end.
    pub fn pivot_anchor_on_pendulum(&self) -> Vector2<f64> {
        Vector2::new(0.0, self.pendulum_height / 2.0 - self.pivot_inset)
    }
}

/// Handles to a spawned cart-pole assembly.
#[derive(Debug, Clone)]
pub struct CartPoleRig {
    pub cart: BodyHandle,
    pub wheels: [BodyHandle; 2],
    pub pendulum: BodyHandle,
    pub shapes: [ShapeHandle; 4],
    pub joints: [JointHandle; 4],
    pub motors: [MotorHandle; 2],
}

impl CartPoleRig {
    /// Assemble the rig inside `world`.
    ///
    /// Guarantees on success: every joint's anchors coincide in world space
    /// at spawn time, collision is disabled between directly jointed pairs,
    /// the cart and wheels share [`CART_GROUP`], the pendulum's center of
    /// gravity sits at the rod's far end, and both motors start at rate 0.
    pub fn spawn<W: PhysicsWorld>(world: &mut W, config: &CartPoleRigConfig) -> SimResult<Self> {
        config.validate()?;

        let wheel_anchors = config.wheel_anchors();
        let cart_pivot = config.pivot_anchor_on_cart();
        let pendulum_pivot = config.pivot_anchor_on_pendulum();

        let cart = world.add_body(config.origin);
        let cart_shape = world.add_box_shape(
            cart,
            config.cart_width,
            config.cart_height,
            config.cart_density,
            config.cart_friction,
        );

        let mut wheels = [cart; 2];
        let mut wheel_shapes = [cart_shape; 2];
        for (i, anchor) in wheel_anchors.iter().enumerate() {
            let wheel = world.add_body(config.origin + anchor);
            wheels[i] = wheel;
            wheel_shapes[i] = world.add_circle_shape(
                wheel,
                config.wheel_radius,
                config.wheel_density,
                config.wheel_friction,
            );
        }

        // Position the rod so its local pivot lands exactly on the cart's.
        let pendulum = world.add_body(config.origin + cart_pivot - pendulum_pivot);
        let pendulum_shape = world.add_box_shape(
            pendulum,
            config.pendulum_width,
            config.pendulum_height,
            config.pendulum_density,
            config.pendulum_friction,
        );
        // Mass concentrated toward the rod's far end, like the reference rig.
        world.set_center_of_gravity(pendulum, Vector2::new(0.0, config.pendulum_height / 2.0));

        // Cart and wheels must never collide among themselves; the pendulum
        // is kept out of the group so only the joints constrain it.
        world.set_shape_group(cart_shape, CART_GROUP);
        world.set_shape_group(wheel_shapes[0], CART_GROUP);
        world.set_shape_group(wheel_shapes[1], CART_GROUP);

        let joints = [
            world.add_pivot_joint(cart, wheels[0], wheel_anchors[0], Vector2::zeros(), false),
            world.add_pivot_joint(cart, wheels[1], wheel_anchors[1], Vector2::zeros(), false),
            world.add_pivot_joint(cart, pendulum, cart_pivot, pendulum_pivot, false),
            world.add_rotary_limit_joint(
                cart,
                pendulum,
                -config.joint_limit,
                config.joint_limit,
                false,
            ),
        ];

        let motors = [
            world.add_motor(wheels[0], cart, 0.0),
            world.add_motor(wheels[1], cart, 0.0),
        ];

        log::debug!(
            "spawned cart-pole rig at ({:.1}, {:.1}), swing limit {:.1} deg",
            config.origin.x,
            config.origin.y,
            config.joint_limit.to_degrees()
        );

        Ok(Self {
            cart,
            wheels,
            pendulum,
            shapes: [cart_shape, wheel_shapes[0], wheel_shapes[1], pendulum_shape],
            joints,
            motors,
        })
    }

    /// Read the pendulum's absolute angle. The body disappearing from the
    /// world is fatal for the control loop, so a missing read is an error,
    /// never a default.
    pub fn pendulum_angle<W: PhysicsWorld>(&self, world: &W) -> SimResult<f64> {
        world.body_angle(self.pendulum).ok_or_else(|| {
            SimError::StateUnavailable(format!("pendulum body {:?} has no angle", self.pendulum))
        })
    }

    /// Read the pendulum's angular velocity.
    pub fn pendulum_angular_velocity<W: PhysicsWorld>(&self, world: &W) -> SimResult<f64> {
        world.body_angular_velocity(self.pendulum).ok_or_else(|| {
            SimError::StateUnavailable(format!(
                "pendulum body {:?} has no angular velocity",
                self.pendulum
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    // Records construction calls so assembly guarantees can be checked
    // without a real solver.
    #[derive(Default)]
    struct RecordingWorld {
        bodies: Vec<Vector2<f64>>,
        shape_bodies: Vec<BodyHandle>,
        shape_groups: HashMap<usize, u32>,
        joints: Vec<RecordedJoint>,
        motors: Vec<(BodyHandle, BodyHandle, f64)>,
        cogs: HashMap<usize, Vector2<f64>>,
    }

    struct RecordedJoint {
        a: BodyHandle,
        b: BodyHandle,
        anchor_a: Vector2<f64>,
        anchor_b: Vector2<f64>,
        collide_bodies: bool,
        limit: Option<(f64, f64)>,
    }

    impl PhysicsWorld for RecordingWorld {
        fn add_body(&mut self, position: Vector2<f64>) -> BodyHandle {
            self.bodies.push(position);
            BodyHandle(self.bodies.len() - 1)
        }

        fn set_center_of_gravity(&mut self, body: BodyHandle, local_offset: Vector2<f64>) {
            self.cogs.insert(body.0, local_offset);
        }

        fn add_box_shape(
            &mut self,
            body: BodyHandle,
            _width: f64,
            _height: f64,
            _density: f64,
            _friction: f64,
        ) -> ShapeHandle {
            self.shape_bodies.push(body);
            ShapeHandle(self.shape_bodies.len() - 1)
        }

        fn add_circle_shape(
            &mut self,
            body: BodyHandle,
            _radius: f64,
            _density: f64,
            _friction: f64,
        ) -> ShapeHandle {
            self.shape_bodies.push(body);
            ShapeHandle(self.shape_bodies.len() - 1)
        }

        fn set_shape_group(&mut self, shape: ShapeHandle, group: u32) {
            self.shape_groups.insert(shape.0, group);
        }

        fn add_pivot_joint(
            &mut self,
            a: BodyHandle,
            b: BodyHandle,
            anchor_a: Vector2<f64>,
            anchor_b: Vector2<f64>,
            collide_bodies: bool,
        ) -> JointHandle {
            self.joints.push(RecordedJoint {
                a,
                b,
                anchor_a,
                anchor_b,
                collide_bodies,
                limit: None,
            });
            JointHandle(self.joints.len() - 1)
        }

        fn add_rotary_limit_joint(
            &mut self,
            a: BodyHandle,
            b: BodyHandle,
            min: f64,
            max: f64,
            collide_bodies: bool,
        ) -> JointHandle {
            self.joints.push(RecordedJoint {
                a,
                b,
                anchor_a: Vector2::zeros(),
                anchor_b: Vector2::zeros(),
                collide_bodies,
                limit: Some((min, max)),
            });
            JointHandle(self.joints.len() - 1)
        }

        fn add_motor(&mut self, a: BodyHandle, b: BodyHandle, rate: f64) -> MotorHandle {
            self.motors.push((a, b, rate));
            MotorHandle(self.motors.len() - 1)
        }

        fn body_position(&self, body: BodyHandle) -> Option<Vector2<f64>> {
            self.bodies.get(body.0).copied()
        }

        fn body_angle(&self, body: BodyHandle) -> Option<f64> {
            self.bodies.get(body.0).map(|_| 0.0)
        }

        fn body_angular_velocity(&self, body: BodyHandle) -> Option<f64> {
            self.bodies.get(body.0).map(|_| 0.0)
        }

        fn set_motor_rate(&mut self, motor: MotorHandle, rate: f64) -> SimResult<()> {
            match self.motors.get_mut(motor.0) {
                Some(m) => {
                    m.2 = rate;
                    Ok(())
                }
                None => Err(SimError::ActuatorWriteFailure(format!(
                    "no motor {:?}",
                    motor
                ))),
            }
        }

        fn motor_rate(&self, motor: MotorHandle) -> Option<f64> {
            self.motors.get(motor.0).map(|m| m.2)
        }

        fn step(&mut self, _dt: f64) {}
    }

    fn spawn_default() -> (RecordingWorld, CartPoleRig) {
        let mut world = RecordingWorld::default();
        let rig = CartPoleRig::spawn(&mut world, &CartPoleRigConfig::default()).unwrap();
        (world, rig)
    }

    #[test]
    fn test_assembly_counts() {
        let (world, rig) = spawn_default();
        assert_eq!(world.bodies.len(), 4);
        assert_eq!(world.shape_bodies.len(), 4);
        assert_eq!(world.joints.len(), 4);
        assert_eq!(world.motors.len(), 2);
        assert_eq!(rig.wheels.len(), 2);
    }

    #[test]
    fn test_joint_anchors_coincide_in_world_space() {
        let (world, _rig) = spawn_default();
        for joint in &world.joints {
            if joint.limit.is_some() {
                continue;
            }
            let world_a = world.bodies[joint.a.0] + joint.anchor_a;
            let world_b = world.bodies[joint.b.0] + joint.anchor_b;
            assert!(
                (world_a - world_b).norm() < 1e-9,
                "pivot anchors diverge: {world_a:?} vs {world_b:?}"
            );
        }
    }

    #[test]
    fn test_collision_disabled_between_jointed_pairs() {
        let (world, _rig) = spawn_default();
        assert!(world.joints.iter().all(|j| !j.collide_bodies));
    }

    #[test]
    fn test_cart_and_wheels_share_group_pendulum_excluded() {
        let (world, rig) = spawn_default();
        for shape in &rig.shapes[..3] {
            assert_eq!(world.shape_groups.get(&shape.0), Some(&CART_GROUP));
        }
        // Pendulum shape carries no group.
        assert!(!world.shape_groups.contains_key(&rig.shapes[3].0));
    }

    #[test]
    fn test_rotary_limit_is_symmetric() {
        let (world, _rig) = spawn_default();
        let limit = 15.0_f64.to_radians();
        let rotary = world
            .joints
            .iter()
            .find_map(|j| j.limit)
            .expect("rig has a rotary limit joint");
        assert!((rotary.0 + limit).abs() < 1e-12);
        assert!((rotary.1 - limit).abs() < 1e-12);
    }

    #[test]
    fn test_motors_drive_wheels_against_cart_at_zero() {
        let (world, rig) = spawn_default();
        for (i, &(a, b, rate)) in world.motors.iter().enumerate() {
            assert_eq!(a, rig.wheels[i]);
            assert_eq!(b, rig.cart);
            assert_eq!(rate, 0.0);
        }
    }

    #[test]
    fn test_pendulum_cog_at_far_end() {
        let (world, rig) = spawn_default();
        let cog = world.cogs.get(&rig.pendulum.0).expect("cog was set");
        assert_eq!(*cog, Vector2::new(0.0, 100.0));
    }

    #[test]
    fn test_validation_rejects_bad_geometry() {
        let mut world = RecordingWorld::default();

        let mut config = CartPoleRigConfig::default();
        config.wheel_radius = -10.0;
        assert!(matches!(
            CartPoleRig::spawn(&mut world, &config),
            Err(SimError::InvalidArgument(_))
        ));

        let mut config = CartPoleRigConfig::default();
        config.joint_limit = 0.0;
        assert!(matches!(
            CartPoleRig::spawn(&mut world, &config),
            Err(SimError::InvalidArgument(_))
        ));

        let mut config = CartPoleRigConfig::default();
        config.wheel_friction = -0.1;
        assert!(matches!(
            CartPoleRig::spawn(&mut world, &config),
            Err(SimError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_angle_read_fails_when_body_missing() {
        let (world, mut rig) = spawn_default();
        rig.pendulum = BodyHandle(99);
        assert!(matches!(
            rig.pendulum_angle(&world),
            Err(SimError::StateUnavailable(_))
        ));
    }
}

//! Plant description for the cart-pole harness
//!
//! The rig module describes the mechanical assembly (cart, driven wheels,
//! pendulum, joints, motors) as data the controller observes and acts upon.
//! The actual rigid-body dynamics live behind `simcore::PhysicsWorld`.

pub mod rig;

pub use rig::{CartPoleRig, CartPoleRigConfig, CART_GROUP};

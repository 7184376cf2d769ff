//! The physics seam.
//!
//! Drawables only read transforms through [`TransformSource`]; game logic
//! drives a [`PhysicsWorld`]. [`RapierWorld`] backs it with `rapier3d`.

pub mod rapier;

pub use rapier::RapierWorld;

use nalgebra::{UnitQuaternion, Vector3};
use std::collections::HashMap;
use thiserror::Error;

/// Opaque handle to a rigid body owned by a physics world.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BodyHandle(pub u32);

/// World-space placement of a rigid body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyTransform {
    pub translation: Vector3<f32>,
    pub rotation: UnitQuaternion<f32>,
}

impl BodyTransform {
    pub fn new(translation: Vector3<f32>, rotation: UnitQuaternion<f32>) -> Self {
        Self {
            translation,
            rotation,
        }
    }

    pub fn from_translation(translation: Vector3<f32>) -> Self {
        Self::new(translation, UnitQuaternion::identity())
    }
}

impl Default for BodyTransform {
    fn default() -> Self {
        Self::from_translation(Vector3::zeros())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    /// Moved by gravity, impulses and contacts.
    Dynamic,
    /// Never moves.
    Static,
    /// Only moved by `set_world_transform`.
    Kinematic,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape {
    Sphere(f32),
    /// Box with half-extents.
    Box(Vector3<f32>),
}

/// Creation parameters of one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub shape: Shape,
    pub kind: BodyKind,
    /// Ignored unless the body is dynamic.
    pub mass: f32,
    pub transform: BodyTransform,
    /// Sensors report contacts but are never pushed apart.
    pub sensor: bool,
}

impl BodyDesc {
    pub fn new(shape: Shape, kind: BodyKind, transform: BodyTransform) -> Self {
        Self {
            shape,
            kind,
            mass: 0.0,
            transform,
            sensor: false,
        }
    }

    pub fn with_mass(mut self, mass: f32) -> Self {
        self.mass = mass;
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum PhysicsError {
    #[error("unknown rigid body {0:?}")]
    UnknownBody(BodyHandle),
    #[error("dynamic body needs a positive mass, got {0}")]
    InvalidMass(f32),
}

/// Read-only access to body transforms, the only thing rendering needs.
pub trait TransformSource {
    fn world_transform(&self, body: BodyHandle) -> Option<BodyTransform>;
}

/// Fixed transforms, handy for tests and static scenes.
impl TransformSource for HashMap<BodyHandle, BodyTransform> {
    fn world_transform(&self, body: BodyHandle) -> Option<BodyTransform> {
        self.get(&body).copied()
    }
}

/// Two bodies touching after the last step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    pub a: BodyHandle,
    pub b: BodyHandle,
    /// Unit direction that separates `a` from `b`.
    pub normal: Vector3<f32>,
    /// Penetration depth, zero for resting contact and sensor overlaps.
    pub depth: f32,
}

impl Contact {
    /// True if this contact is between `x` and `y`, in either order.
    pub fn involves(&self, x: BodyHandle, y: BodyHandle) -> bool {
        (self.a == x && self.b == y) || (self.a == y && self.b == x)
    }
}

/// A simulation the game loop can step and steer.
pub trait PhysicsWorld: TransformSource {
    /// Advances the simulation by `dt` seconds.
    fn step(&mut self, dt: f32);

    /// Teleports a body.
    fn set_world_transform(
        &mut self,
        body: BodyHandle,
        transform: BodyTransform,
    ) -> Result<(), PhysicsError>;

    /// Current linear velocity, zero for bodies that never move.
    fn linear_velocity(&self, body: BodyHandle) -> Option<Vector3<f32>>;

    /// Applies an impulse at the center of mass. Non-dynamic bodies ignore it.
    fn apply_impulse(&mut self, body: BodyHandle, impulse: Vector3<f32>)
    -> Result<(), PhysicsError>;

    /// Contacts found during the last [`PhysicsWorld::step`], measured at
    /// the start of that step.
    fn contacts(&self) -> &[Contact];
}

use crate::physics::{
    BodyDesc, BodyHandle, BodyKind, BodyTransform, Contact, PhysicsError, PhysicsWorld, Shape,
    TransformSource,
};
use log::{debug, trace};
use nalgebra::{Quaternion, UnitQuaternion, Vector3};
use rapier3d::na;
use rapier3d::prelude::{
    BroadPhaseMultiSap, CCDSolver, ColliderBuilder, ColliderHandle, ColliderSet, ImpulseJointSet,
    IntegrationParameters, IslandManager, MultibodyJointSet, NarrowPhase, PhysicsPipeline, Real,
    RigidBodyBuilder, RigidBodyHandle, RigidBodySet, RigidBodyType,
};
use std::collections::HashMap;
use std::fmt;

/// Manifold points farther apart than this are not reported as touching.
const CONTACT_SLOP: f32 = 0.01;

/// Rigid-body world on top of `rapier3d`.
///
/// Every [`BodyDesc`] becomes one rigid body carrying one collider. Bodies
/// never fall asleep, so sensors keep reporting overlaps with resting bodies.
pub struct RapierWorld {
    gravity: na::Vector3<Real>,
    integration_parameters: IntegrationParameters,
    pipeline: PhysicsPipeline,
    islands: IslandManager,
    broad_phase: BroadPhaseMultiSap,
    narrow_phase: NarrowPhase,
    bodies: RigidBodySet,
    colliders: ColliderSet,
    impulse_joints: ImpulseJointSet,
    multibody_joints: MultibodyJointSet,
    ccd_solver: CCDSolver,
    handles: Vec<RigidBodyHandle>,
    owners: HashMap<ColliderHandle, BodyHandle>,
    contacts: Vec<Contact>,
}

impl fmt::Debug for RapierWorld {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RapierWorld")
            .field("gravity", &self.gravity())
            .field("bodies", &self.handles.len())
            .field("contacts", &self.contacts.len())
            .finish()
    }
}

impl Default for RapierWorld {
    fn default() -> Self {
        Self::new(Vector3::new(0.0, -9.8, 0.0))
    }
}

impl RapierWorld {
    pub fn new(gravity: Vector3<f32>) -> Self {
        Self {
            gravity: to_rapier_vec(&gravity),
            integration_parameters: IntegrationParameters::default(),
            pipeline: PhysicsPipeline::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseMultiSap::new(),
            narrow_phase: NarrowPhase::new(),
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            impulse_joints: ImpulseJointSet::new(),
            multibody_joints: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            handles: Vec::new(),
            owners: HashMap::new(),
            contacts: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vector3<f32> {
        from_rapier_vec(&self.gravity)
    }

    pub fn add_body(&mut self, desc: BodyDesc) -> Result<BodyHandle, PhysicsError> {
        if desc.kind == BodyKind::Dynamic && desc.mass <= 0.0 {
            return Err(PhysicsError::InvalidMass(desc.mass));
        }

        let body_type = match desc.kind {
            BodyKind::Dynamic => RigidBodyType::Dynamic,
            BodyKind::Static => RigidBodyType::Fixed,
            BodyKind::Kinematic => RigidBodyType::KinematicPositionBased,
        };
        let body = RigidBodyBuilder::new(body_type)
            .position(to_isometry(&desc.transform))
            .can_sleep(false)
            .build();

        let mut collider = match desc.shape {
            Shape::Sphere(radius) => ColliderBuilder::ball(radius),
            Shape::Box(half) => ColliderBuilder::cuboid(half.x, half.y, half.z),
        }
        .sensor(desc.sensor);
        if desc.kind == BodyKind::Dynamic {
            collider = collider.mass(desc.mass);
        }

        let body_handle = self.bodies.insert(body);
        let collider_handle =
            self.colliders
                .insert_with_parent(collider.build(), body_handle, &mut self.bodies);

        let handle = BodyHandle(self.handles.len() as u32);
        self.handles.push(body_handle);
        self.owners.insert(collider_handle, handle);
        debug!(
            "body {:?}: {:?} {:?} at {:?}",
            handle, desc.kind, desc.shape, desc.transform.translation
        );
        Ok(handle)
    }

    fn rigid_body_handle(&self, body: BodyHandle) -> Result<RigidBodyHandle, PhysicsError> {
        self.handles
            .get(body.0 as usize)
            .copied()
            .ok_or(PhysicsError::UnknownBody(body))
    }

    fn translation_of(&self, body: BodyHandle) -> Vector3<f32> {
        self.world_transform(body)
            .map(|t| t.translation)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Rebuilds `contacts` from the narrow phase: touching solid pairs, then
    /// sensor overlaps.
    fn collect_contacts(&mut self) {
        let mut found = Vec::new();

        for pair in self.narrow_phase.contact_pairs() {
            let (Some(&a), Some(&b)) = (
                self.owners.get(&pair.collider1),
                self.owners.get(&pair.collider2),
            ) else {
                continue;
            };
            let deepest = pair
                .manifolds
                .iter()
                .flat_map(|m| m.points.iter().map(move |p| (m.data.normal, p.dist)))
                .min_by(|x, y| x.1.total_cmp(&y.1));
            let Some((normal, dist)) = deepest else {
                continue;
            };
            if dist > CONTACT_SLOP {
                continue;
            }
            // Rapier's normal points from the first collider to the second.
            found.push(Contact {
                a,
                b,
                normal: -from_rapier_vec(&normal),
                depth: (-dist).max(0.0),
            });
        }

        for (first, second, intersecting) in self.narrow_phase.intersection_pairs() {
            if !intersecting {
                continue;
            }
            let (Some(&a), Some(&b)) = (self.owners.get(&first), self.owners.get(&second)) else {
                continue;
            };
            let normal = (self.translation_of(a) - self.translation_of(b))
                .try_normalize(1e-6)
                .unwrap_or_else(Vector3::y);
            found.push(Contact {
                a,
                b,
                normal,
                depth: 0.0,
            });
        }

        self.contacts = found;
    }
}

impl TransformSource for RapierWorld {
    fn world_transform(&self, body: BodyHandle) -> Option<BodyTransform> {
        let handle = self.handles.get(body.0 as usize)?;
        let rigid_body = self.bodies.get(*handle)?;
        Some(BodyTransform::new(
            from_rapier_vec(rigid_body.translation()),
            from_rapier_quat(rigid_body.rotation()),
        ))
    }
}

impl PhysicsWorld for RapierWorld {
    fn step(&mut self, dt: f32) {
        self.contacts.clear();
        if dt <= 0.0 {
            return;
        }
        self.integration_parameters.dt = dt;
        self.pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.islands,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.bodies,
            &mut self.colliders,
            &mut self.impulse_joints,
            &mut self.multibody_joints,
            &mut self.ccd_solver,
            None,
            &(),
            &(),
        );
        self.collect_contacts();
        trace!("stepped {:.4}s, {} contacts", dt, self.contacts.len());
    }

    fn set_world_transform(
        &mut self,
        body: BodyHandle,
        transform: BodyTransform,
    ) -> Result<(), PhysicsError> {
        let handle = self.rigid_body_handle(body)?;
        let rigid_body = self
            .bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(body))?;
        rigid_body.set_position(to_isometry(&transform), true);
        Ok(())
    }

    fn linear_velocity(&self, body: BodyHandle) -> Option<Vector3<f32>> {
        let handle = self.handles.get(body.0 as usize)?;
        self.bodies
            .get(*handle)
            .map(|rigid_body| from_rapier_vec(rigid_body.linvel()))
    }

    fn apply_impulse(
        &mut self,
        body: BodyHandle,
        impulse: Vector3<f32>,
    ) -> Result<(), PhysicsError> {
        let handle = self.rigid_body_handle(body)?;
        let rigid_body = self
            .bodies
            .get_mut(handle)
            .ok_or(PhysicsError::UnknownBody(body))?;
        if rigid_body.is_dynamic() {
            rigid_body.apply_impulse(to_rapier_vec(&impulse), true);
        }
        Ok(())
    }

    fn contacts(&self) -> &[Contact] {
        &self.contacts
    }
}

fn to_rapier_vec(v: &Vector3<f32>) -> na::Vector3<Real> {
    na::Vector3::new(v.x, v.y, v.z)
}

fn from_rapier_vec(v: &na::Vector3<Real>) -> Vector3<f32> {
    Vector3::new(v.x, v.y, v.z)
}

fn from_rapier_quat(q: &na::UnitQuaternion<Real>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.i, q.j, q.k))
}

fn to_isometry(transform: &BodyTransform) -> na::Isometry3<Real> {
    let q = transform.rotation;
    na::Isometry3::from_parts(
        na::Translation3::from(to_rapier_vec(&transform.translation)),
        na::UnitQuaternion::from_quaternion(na::Quaternion::new(q.w, q.i, q.j, q.k)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DT: f32 = 1.0 / 60.0;

    fn world_with_floor(ball_height: f32) -> (RapierWorld, BodyHandle, BodyHandle) {
        let mut world = RapierWorld::default();
        let ball = world
            .add_body(
                BodyDesc::new(
                    Shape::Sphere(1.0),
                    BodyKind::Dynamic,
                    BodyTransform::from_translation(Vector3::new(0.0, ball_height, 0.0)),
                )
                .with_mass(13.0),
            )
            .unwrap();
        let floor = world
            .add_body(BodyDesc::new(
                Shape::Box(Vector3::new(4.0, 0.5, 4.0)),
                BodyKind::Static,
                BodyTransform::from_translation(Vector3::new(0.0, -1.0, 0.0)),
            ))
            .unwrap();
        (world, ball, floor)
    }

    #[test]
    fn falling_sphere_comes_to_rest_on_the_floor() {
        let (mut world, ball, floor) = world_with_floor(3.0);
        for _ in 0..120 {
            world.step(DT);
        }
        let resting = world.world_transform(ball).unwrap().translation;
        assert_relative_eq!(resting.y, 0.5, epsilon = 0.05);
        assert!(world.contacts().iter().any(|c| c.involves(ball, floor)));
    }

    #[test]
    fn impulse_changes_velocity_by_impulse_over_mass() {
        let (mut world, ball, _) = world_with_floor(0.5);
        world.step(DT);
        let before = world.linear_velocity(ball).unwrap().y;
        world
            .apply_impulse(ball, Vector3::new(0.0, 100.0, 0.0))
            .unwrap();
        let after = world.linear_velocity(ball).unwrap().y;
        assert_relative_eq!(after - before, 100.0 / 13.0, epsilon = 1e-3);
    }

    #[test]
    fn sliding_sphere_starts_to_roll() {
        let (mut world, ball, _) = world_with_floor(0.5);
        world.step(DT);
        world
            .apply_impulse(ball, Vector3::new(26.0, 0.0, 0.0))
            .unwrap();
        for _ in 0..60 {
            world.step(DT);
        }
        let rotation = world.world_transform(ball).unwrap().rotation;
        assert!(rotation.angle() > 0.1, "rotation {:?}", rotation);
    }

    #[test]
    fn sensors_report_contact_without_pushing() {
        let mut world = RapierWorld::new(Vector3::zeros());
        let ball = world
            .add_body(
                BodyDesc::new(Shape::Sphere(1.0), BodyKind::Dynamic, BodyTransform::default())
                    .with_mass(1.0),
            )
            .unwrap();
        let gate = world
            .add_body(
                BodyDesc::new(
                    Shape::Box(Vector3::new(1.0, 1.0, 1.0)),
                    BodyKind::Kinematic,
                    BodyTransform::from_translation(Vector3::new(1.5, 0.0, 0.0)),
                )
                .as_sensor(),
            )
            .unwrap();
        world.step(DT);

        assert_eq!(world.contacts().len(), 1);
        assert!(world.contacts()[0].involves(gate, ball));
        let translation = world.world_transform(ball).unwrap().translation;
        assert_relative_eq!(translation, Vector3::zeros(), epsilon = 1e-6);
    }

    #[test]
    fn moved_sensor_stops_overlapping() {
        let mut world = RapierWorld::new(Vector3::zeros());
        let ball = world
            .add_body(
                BodyDesc::new(Shape::Sphere(1.0), BodyKind::Dynamic, BodyTransform::default())
                    .with_mass(1.0),
            )
            .unwrap();
        let gate = world
            .add_body(
                BodyDesc::new(
                    Shape::Box(Vector3::new(1.0, 1.0, 1.0)),
                    BodyKind::Kinematic,
                    BodyTransform::from_translation(Vector3::new(1.5, 0.0, 0.0)),
                )
                .as_sensor(),
            )
            .unwrap();
        world.step(DT);
        assert!(world.contacts().iter().any(|c| c.involves(ball, gate)));

        let away = BodyTransform::from_translation(Vector3::new(10.0, 0.0, 0.0));
        world.set_world_transform(gate, away).unwrap();
        assert_relative_eq!(world.world_transform(gate).unwrap().translation.x, 10.0);
        world.step(DT);
        assert!(world.contacts().is_empty());
    }

    #[test]
    fn unknown_bodies_and_massless_dynamics_are_rejected() {
        let mut world = RapierWorld::default();
        assert_eq!(
            world.apply_impulse(BodyHandle(7), Vector3::y()),
            Err(PhysicsError::UnknownBody(BodyHandle(7)))
        );
        assert_eq!(
            world.add_body(BodyDesc::new(
                Shape::Sphere(1.0),
                BodyKind::Dynamic,
                BodyTransform::default()
            )),
            Err(PhysicsError::InvalidMass(0.0))
        );
        assert_eq!(world.world_transform(BodyHandle(7)), None);
    }
}

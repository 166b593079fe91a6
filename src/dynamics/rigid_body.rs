//! Minimal rigid-body kinematic state, as seen by the motor constraints.
//!
//! The simulation core owning the bodies is an external collaborator: motors
//! only read the instantaneous kinematics of their two attachment frames, and
//! write force contributions at solver-assigned offsets. This module provides
//! the thin stand-in the motors are written against.

use crate::math::{Isometry, Real, Rotation, Vector};

/// The unique identifier of a body added to a [`BodySet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct BodyHandle(pub u32);

/// The kinematic state of one rigid body, in world coordinates.
///
/// Velocities and accelerations are taken about the body origin, which is
/// assumed to coincide with its center of mass. `solver_offset` locates the
/// body's 6 velocity slots (`[linvel; angvel]`) in the solver-owned global
/// vectors.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RigidBodyState {
    /// The world-space pose of the body.
    pub position: Isometry,
    /// The linear velocity of the body origin.
    pub linvel: Vector,
    /// The angular velocity of the body.
    pub angvel: Vector,
    /// The linear acceleration of the body origin.
    pub linacc: Vector,
    /// The angular acceleration of the body.
    pub angacc: Vector,
    /// The offset of this body's velocity block in the solver's global vectors.
    pub solver_offset: usize,
    /// Is this body part of the current solve? Fixed/sleeping bodies are not.
    pub enabled: bool,
    /// Accumulated applied force, used by the legacy force-based solve path.
    pub applied_force: Vector,
    /// Accumulated applied torque, used by the legacy force-based solve path.
    pub applied_torque: Vector,
}

impl Default for RigidBodyState {
    fn default() -> Self {
        Self {
            position: Isometry::identity(),
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            linacc: Vector::zeros(),
            angacc: Vector::zeros(),
            solver_offset: 0,
            enabled: true,
            applied_force: Vector::zeros(),
            applied_torque: Vector::zeros(),
        }
    }
}

impl RigidBodyState {
    /// A body at the given pose, at rest.
    pub fn at_position(position: Isometry) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// The full kinematics of a frame rigidly attached to this body.
    ///
    /// `local` is the frame's pose in the body's local space. The returned
    /// origin velocity and acceleration include the lever-arm and centripetal
    /// terms.
    pub fn moving_frame(&self, local: &Isometry) -> MovingFrame {
        let position = self.position * local;
        let r = position.translation.vector - self.position.translation.vector;
        let linvel = self.linvel + self.angvel.cross(&r);
        let linacc =
            self.linacc + self.angacc.cross(&r) + self.angvel.cross(&self.angvel.cross(&r));

        MovingFrame {
            position,
            linvel,
            angvel: self.angvel,
            linacc,
            angacc: self.angacc,
        }
    }

    /// Clears the legacy applied-force accumulators.
    pub fn reset_applied_forces(&mut self) {
        self.applied_force = Vector::zeros();
        self.applied_torque = Vector::zeros();
    }
}

/// A collection of rigid-body states addressed by [`BodyHandle`].
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct BodySet {
    bodies: Vec<RigidBodyState>,
}

impl BodySet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a body and returns its handle.
    pub fn insert(&mut self, body: RigidBodyState) -> BodyHandle {
        self.bodies.push(body);
        BodyHandle(self.bodies.len() as u32 - 1)
    }

    /// The number of bodies in the set.
    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    /// Is this set empty?
    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    /// Iterates over all the bodies.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut RigidBodyState> {
        self.bodies.iter_mut()
    }
}

impl std::ops::Index<BodyHandle> for BodySet {
    type Output = RigidBodyState;

    fn index(&self, handle: BodyHandle) -> &RigidBodyState {
        &self.bodies[handle.0 as usize]
    }
}

impl std::ops::IndexMut<BodyHandle> for BodySet {
    fn index_mut(&mut self, handle: BodyHandle) -> &mut RigidBodyState {
        &mut self.bodies[handle.0 as usize]
    }
}

/// The pose and first/second-order kinematics of a frame, in world coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct MovingFrame {
    /// The world-space pose of the frame.
    pub position: Isometry,
    /// The linear velocity of the frame origin.
    pub linvel: Vector,
    /// The angular velocity of the frame.
    pub angvel: Vector,
    /// The linear acceleration of the frame origin.
    pub linacc: Vector,
    /// The angular acceleration of the frame.
    pub angacc: Vector,
}

impl MovingFrame {
    /// A static frame at the given pose.
    pub fn fixed(position: Isometry) -> Self {
        Self {
            position,
            linvel: Vector::zeros(),
            angvel: Vector::zeros(),
            linacc: Vector::zeros(),
            angacc: Vector::zeros(),
        }
    }

    /// The kinematics of `self` relative to `reference`, expressed in the
    /// `reference` frame.
    pub fn relative_to(&self, reference: &MovingFrame) -> RelativeKinematics {
        let inv = reference.position.rotation.inverse();
        let d = self.position.translation.vector - reference.position.translation.vector;
        let dv = self.linvel - reference.linvel;
        let da = self.linacc - reference.linacc;
        let w2 = reference.angvel;
        let a2 = reference.angacc;
        let wrel = self.angvel - reference.angvel;

        RelativeKinematics {
            rotation: inv * self.position.rotation,
            translation: inv * d,
            linvel: inv * (dv - w2.cross(&d)),
            linacc: inv * (da - a2.cross(&d) - 2.0 * w2.cross(&dv) + w2.cross(&w2.cross(&d))),
            angvel: inv * wrel,
            angacc: inv * (self.angacc - reference.angacc - w2.cross(&wrel)),
        }
    }
}

/// Relative kinematics of one frame with respect to another, expressed in the
/// reference (second) frame.
///
/// `translation`, `linvel` and `linacc` are the relative position of the frame
/// origin and its exact first and second time-derivatives; `rotation`,
/// `angvel` and `angacc` describe the relative orientation.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct RelativeKinematics {
    /// The relative orientation.
    pub rotation: Rotation,
    /// The relative position of the frame origin.
    pub translation: Vector,
    /// The time-derivative of `translation`.
    pub linvel: Vector,
    /// The second time-derivative of `translation`.
    pub linacc: Vector,
    /// The relative angular velocity.
    pub angvel: Vector,
    /// The time-derivative of `angvel`.
    pub angacc: Vector,
}

//! A rotational motor that applies a torque about its axis.

use std::sync::Arc;

use crate::dynamics::motor::{MotorConstraint, RotationMotorBase};
use crate::dynamics::{BodySet, ConstantLaw, ConstraintRow, MotionLaw};
use crate::math::{DVector, Isometry, Real, Vector};

fn default_torque_law() -> Arc<dyn MotionLaw> {
    Arc::new(ConstantLaw(0.0))
}

/// A rotational motor that applies a torque `T(t)` between two frames on two
/// bodies, about the Z axis of the master frame.
///
/// Differently from the Angle and Speed motors, this does not enforce any
/// kinematic value on the spin axis: the axis is left free and the torque acts
/// through the bodies' load terms, like a DC motor with an imposed armature
/// torque. The spindle still locks the other relative degrees of freedom per
/// its preset.
///
/// The default torque law is constant zero.
#[derive(Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RotationMotorTorque {
    /// The shared rotational-motor state (frames, spindle mask, cached
    /// kinematics).
    pub base: RotationMotorBase,
    #[cfg_attr(feature = "serde-serialize", serde(skip, default = "default_torque_law"))]
    law: Arc<dyn MotionLaw>,
}

impl RotationMotorTorque {
    /// Creates the motor connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self {
            base: RotationMotorBase::new(body1, body2, local_frame1, local_frame2, false),
            law: default_torque_law(),
        }
    }

    /// Sets the torque law `T(t)`.
    pub fn set_torque_law(&mut self, law: Arc<dyn MotionLaw>) {
        self.law = law;
    }

    /// The torque law `T(t)`.
    pub fn torque_law(&self) -> &Arc<dyn MotionLaw> {
        &self.law
    }

    /// The world-space spin axis, at the bodies' current state.
    fn world_axis(&self, bodies: &BodySet) -> Vector {
        let core = &self.base.core;
        let f2 = bodies[core.body2].position * core.local_frame2;
        f2.rotation * Vector::z()
    }
}

impl MotorConstraint for RotationMotorTorque {
    fn update(&mut self, time: Real, bodies: &BodySet) {
        self.base.update(time, bodies, None);
    }

    fn constraint_rows(&self) -> &[ConstraintRow] {
        self.base.core.rows()
    }

    fn constraint_rows_mut(&mut self) -> &mut [ConstraintRow] {
        self.base.core.rows_mut()
    }

    fn is_enabled(&self) -> bool {
        self.base.core.enabled
    }

    fn axial_reaction(&self) -> Real {
        // The axis carries no constraint row: the reaction is the commanded
        // torque itself.
        self.law.value(self.base.core.time())
    }

    fn load_residual_forces(&self, _off: usize, r: &mut DVector, factor: Real, bodies: &BodySet) {
        if !self.base.core.enabled {
            return;
        }
        let torque = self.world_axis(bodies) * self.law.value(self.base.core.time());
        // A pure torque: the application point is irrelevant.
        let point = bodies[self.base.core.body1].position.translation.vector;
        self.base
            .core
            .load_wrench_residual(r, factor, bodies, &Vector::zeros(), &torque, &point);
    }

    fn load_body_forces(&self, bodies: &mut BodySet, factor: Real) {
        if !self.base.core.enabled {
            return;
        }
        let torque = self.world_axis(bodies) * self.law.value(self.base.core.time());
        let point = bodies[self.base.core.body1].position.translation.vector;
        self.base
            .core
            .load_wrench_body_buffers(bodies, factor, &Vector::zeros(), &torque, &point);
    }
}

/// Creates [`RotationMotorTorque`] motors using the builder pattern.
#[derive(Clone)]
pub struct RotationMotorTorqueBuilder(pub RotationMotorTorque);

impl RotationMotorTorqueBuilder {
    /// Creates a new builder connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self(RotationMotorTorque::new(body1, body2, local_frame1, local_frame2))
    }

    /// Sets the torque law.
    #[must_use]
    pub fn torque_law(mut self, law: Arc<dyn MotionLaw>) -> Self {
        self.0.set_torque_law(law);
        self
    }

    /// Sets the spindle preset.
    #[must_use]
    pub fn spindle_constraint(mut self, spindle: crate::dynamics::SpindleConstraint) -> Self {
        self.0.base.set_spindle_constraint(spindle);
        self
    }

    /// Builds the motor.
    #[must_use]
    pub fn build(self) -> RotationMotorTorque {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::motor::DofAxis;
    use crate::dynamics::RigidBodyState;

    #[test]
    fn leaves_the_spin_axis_free() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());
        let motor = RotationMotorTorque::new(b1, b2, Isometry::identity(), Isometry::identity());

        assert_eq!(motor.base.core.row_index(DofAxis::AngZ), None);
        assert_eq!(motor.constraint_rows().len(), 5);
        assert_eq!(motor.extra_state_size(), 0);
    }

    #[test]
    fn applies_equal_and_opposite_torques() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());
        bodies[b1].solver_offset = 0;
        bodies[b2].solver_offset = 6;

        let mut motor = RotationMotorTorque::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_torque_law(Arc::new(ConstantLaw(1.5)));
        motor.update(0.0, &bodies);

        let mut r = DVector::zeros(12);
        motor.load_residual_forces(0, &mut r, 1.0, &bodies);
        approx::assert_relative_eq!(r[5], 1.5);
        approx::assert_relative_eq!(r[11], -1.5);
        for k in 0..5 {
            approx::assert_relative_eq!(r[k], 0.0);
            approx::assert_relative_eq!(r[6 + k], 0.0);
        }

        approx::assert_relative_eq!(motor.axial_reaction(), 1.5);
    }

    #[test]
    fn legacy_path_writes_the_body_buffers() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());

        let mut motor = RotationMotorTorque::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_torque_law(Arc::new(ConstantLaw(2.0)));
        motor.update(0.0, &bodies);
        motor.load_body_forces(&mut bodies, 1.0);

        approx::assert_relative_eq!(bodies[b1].applied_torque.z, 2.0);
        approx::assert_relative_eq!(bodies[b2].applied_torque.z, -2.0);
    }
}

//! A rotational motor that imposes the relative angle about its axis.

use std::sync::Arc;

use crate::dynamics::motor::{DofAxis, MotorConstraint, RotationMotorBase};
use crate::dynamics::{BodySet, ConstraintRow, MotionLaw, RampLaw};
use crate::math::{DVector, Isometry, Real};

fn default_angle_law() -> Arc<dyn MotionLaw> {
    // A ramp at 1 radian per second.
    Arc::new(RampLaw::new(0.0, 1.0))
}

/// A rotational motor that enforces the angle `a(t)` between two frames on two
/// bodies, using a rheonomic constraint.
///
/// The angle of frame 1 spinning about the Z axis of frame 2 is imposed via
/// an exact function of time `f(t)` and an optional offset:
/// `a(t) = f(t) + offset`.
///
/// The target is imposed through a hidden frame pre-rotated about the spindle
/// axis by the current setpoint, so the spin row residual stays a small
/// quaternion error even while the setpoint winds through multiple turns.
///
/// No compliance is allowed: think of it as a stepper drive with infinitely
/// stiff control.
///
/// By default it is initialized with a linear ramp `df/dt = 1`; use
/// [`RotationMotorAngle::set_motion_law`] for other motion laws.
#[derive(Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RotationMotorAngle {
    /// The shared rotational-motor state (frames, spindle mask, cached
    /// kinematics).
    pub base: RotationMotorBase,
    #[cfg_attr(feature = "serde-serialize", serde(skip, default = "default_angle_law"))]
    law: Arc<dyn MotionLaw>,
    offset: Real,
}

impl RotationMotorAngle {
    /// Creates the motor connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self {
            base: RotationMotorBase::new(body1, body2, local_frame1, local_frame2, true),
            law: default_angle_law(),
            offset: 0.0,
        }
    }

    /// Sets the angle law `f(t)`, in radians.
    ///
    /// Must be C0 continuous, and better C1 continuous too, otherwise it
    /// requires peaks in accelerations.
    pub fn set_motion_law(&mut self, law: Arc<dyn MotionLaw>) {
        self.law = law;
    }

    /// The angle law `f(t)`.
    pub fn motion_law(&self) -> &Arc<dyn MotionLaw> {
        &self.law
    }

    /// Sets the offset added to the law: the imposed angle is
    /// `f(t) + offset`. Zero by default.
    pub fn set_motion_offset(&mut self, offset: Real) {
        self.offset = offset;
    }

    /// The offset added to the law.
    pub fn motion_offset(&self) -> Real {
        self.offset
    }
}

impl MotorConstraint for RotationMotorAngle {
    fn update(&mut self, time: Real, bodies: &BodySet) {
        // Rotating the hidden master frame by the setpoint makes the plain
        // spin lock row enforce the target angle.
        let spin = self.law.value(time) + self.offset;
        self.base.update(time, bodies, Some(spin));
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
        self.base
            .core
            .row_index(DofAxis::AngZ)
            .map(|i| self.base.core.rows()[i].lambda)
            .unwrap_or(0.0)
    }

    fn load_constraint_time_derivative(&self, off_l: usize, qc: &mut DVector, factor: Real) {
        // The spin row residual is a quaternion imaginary part, half the
        // angle error for small errors, hence the 0.5 scaling of the
        // setpoint rate.
        if let Some(i) = self.base.core.row_index(DofAxis::AngZ) {
            qc[off_l + i] += factor * -0.5 * self.law.deriv(self.base.core.time());
        }
    }
}

/// Creates [`RotationMotorAngle`] motors using the builder pattern.
#[derive(Clone)]
pub struct RotationMotorAngleBuilder(pub RotationMotorAngle);

impl RotationMotorAngleBuilder {
    /// Creates a new builder connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self(RotationMotorAngle::new(body1, body2, local_frame1, local_frame2))
    }

    /// Sets the angle law.
    #[must_use]
    pub fn motion_law(mut self, law: Arc<dyn MotionLaw>) -> Self {
        self.0.set_motion_law(law);
        self
    }

    /// Sets the offset added to the law.
    #[must_use]
    pub fn motion_offset(mut self, offset: Real) -> Self {
        self.0.set_motion_offset(offset);
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
    pub fn build(self) -> RotationMotorAngle {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::{ConstantLaw, RigidBodyState};
    use crate::math::Vector;

    #[test]
    fn residual_vanishes_when_the_body_tracks_the_law() {
        let angle = 0.7;
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::at_position(Isometry::rotation(
            Vector::z() * angle,
        )));
        let b2 = bodies.insert(RigidBodyState::default());

        let mut motor = RotationMotorAngle::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_motion_law(Arc::new(RampLaw::new(0.0, 2.0)));

        // At t = 0.35 the setpoint matches the body rotation.
        motor.update(0.35, &bodies);
        let i = motor.base.core.row_index(DofAxis::AngZ).unwrap();
        approx::assert_relative_eq!(motor.constraint_rows()[i].c, 0.0, epsilon = 1.0e-12);
        approx::assert_relative_eq!(motor.base.actual_rot(), angle, epsilon = 1.0e-12);

        // Off the setpoint, the residual is the half-angle error.
        motor.update(0.45, &bodies);
        let err = angle - 0.9;
        approx::assert_relative_eq!(
            motor.constraint_rows()[i].c,
            (0.5 * err).sin(),
            epsilon = 1.0e-12
        );
    }

    #[test]
    fn rheonomic_bias_is_half_the_setpoint_rate() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());

        let mut motor = RotationMotorAngle::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_motion_law(Arc::new(RampLaw::new(0.0, 3.0)));
        motor.update(0.0, &bodies);

        let mut qc = DVector::zeros(6);
        motor.load_constraint_time_derivative(0, &mut qc, 1.0);
        let i = motor.base.core.row_index(DofAxis::AngZ).unwrap();
        approx::assert_relative_eq!(qc[i], -1.5);
    }

    #[test]
    fn offset_shifts_the_setpoint() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());

        let mut motor = RotationMotorAngle::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_motion_law(Arc::new(ConstantLaw(0.0)));
        motor.set_motion_offset(0.2);

        motor.update(0.0, &bodies);
        let i = motor.base.core.row_index(DofAxis::AngZ).unwrap();
        approx::assert_relative_eq!(
            motor.constraint_rows()[i].c,
            (-0.1 as Real).sin(),
            epsilon = 1.0e-12
        );
    }
}

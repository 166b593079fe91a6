//! A linear motor that imposes the relative position along its axis.

use std::sync::Arc;

use crate::dynamics::motor::{DofAxis, LinearMotorBase, MotorConstraint};
use crate::dynamics::{BodySet, ConstraintRow, MotionLaw, RampLaw};
use crate::math::{DVector, Isometry, Real};

fn default_position_law() -> Arc<dyn MotionLaw> {
    // A ramp at 1 length unit per second.
    Arc::new(RampLaw::new(0.0, 1.0))
}

/// A linear motor that enforces the position `x(t)` between two frames on two
/// bodies, using a rheonomic constraint.
///
/// The position of frame 1 sliding along the X axis of frame 2 is imposed via
/// an exact function of time `f(t)` and an optional offset:
/// `x(t) = f(t) + offset`.
///
/// No compliance is allowed: if the actuator hits an undeformable obstacle
/// this is a pathological situation and the solver result can be
/// unstable/unpredictable. Think of it as a servo drive with infinitely stiff
/// control.
///
/// By default it is initialized with a linear ramp `df/dt = 1`; use
/// [`LinearMotorPosition::set_motion_law`] for other motion laws.
#[derive(Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LinearMotorPosition {
    /// The shared linear-motor state (frames, guide mask, cached kinematics).
    pub base: LinearMotorBase,
    #[cfg_attr(
        feature = "serde-serialize",
        serde(skip, default = "default_position_law")
    )]
    law: Arc<dyn MotionLaw>,
    offset: Real,
}

impl LinearMotorPosition {
    /// Creates the motor connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self {
            base: LinearMotorBase::new(body1, body2, local_frame1, local_frame2, true),
            law: default_position_law(),
            offset: 0.0,
        }
    }

    /// Sets the position law `f(t)`.
    ///
    /// Must be C0 continuous, and better C1 continuous too, otherwise it
    /// requires peaks in accelerations.
    pub fn set_motion_law(&mut self, law: Arc<dyn MotionLaw>) {
        self.law = law;
    }

    /// The position law `f(t)`.
    pub fn motion_law(&self) -> &Arc<dyn MotionLaw> {
        &self.law
    }

    /// Sets the offset added to the law: the imposed position is
    /// `f(t) + offset`. Zero by default.
    pub fn set_motion_offset(&mut self, offset: Real) {
        self.offset = offset;
    }

    /// The offset added to the law.
    pub fn motion_offset(&self) -> Real {
        self.offset
    }
}

impl MotorConstraint for LinearMotorPosition {
    fn update(&mut self, time: Real, bodies: &BodySet) {
        self.base.update(time, bodies);

        // The motorized row residual is the position error:
        //   C = x_actual - f(t) - offset
        let c = self.base.actual_pos() - self.law.value(time) - self.offset;
        if let Some(row) = self.base.core.row_mut(DofAxis::X) {
            row.c = c;
        }
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
            .row_index(DofAxis::X)
            .map(|i| self.base.core.rows()[i].lambda)
            .unwrap_or(0.0)
    }

    fn load_constraint_time_derivative(&self, off_l: usize, qc: &mut DVector, factor: Real) {
        if let Some(i) = self.base.core.row_index(DofAxis::X) {
            qc[off_l + i] += factor * -self.law.deriv(self.base.core.time());
        }
    }
}

/// Creates [`LinearMotorPosition`] motors using the builder pattern.
#[derive(Clone)]
pub struct LinearMotorPositionBuilder(pub LinearMotorPosition);

impl LinearMotorPositionBuilder {
    /// Creates a new builder connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self(LinearMotorPosition::new(
            body1,
            body2,
            local_frame1,
            local_frame2,
        ))
    }

    /// Sets the position law.
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

    /// Sets the guide preset.
    #[must_use]
    pub fn guide_constraint(mut self, guide: crate::dynamics::GuideConstraint) -> Self {
        self.0.base.set_guide_constraint(guide);
        self
    }

    /// Builds the motor.
    #[must_use]
    pub fn build(self) -> LinearMotorPosition {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::{BodySet, RigidBodyState};
    use crate::math::Isometry;

    #[test]
    fn residual_tracks_the_law() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::at_position(Isometry::translation(
            1.0, 0.0, 0.0,
        )));
        let b2 = bodies.insert(RigidBodyState::default());

        let mut motor =
            LinearMotorPosition::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_motion_law(Arc::new(RampLaw::new(0.0, 2.0)));

        // At t = 0.5 the setpoint is 1.0 and the body sits at 1.0: C = 0.
        motor.update(0.5, &bodies);
        let row_x = &motor.constraint_rows()[0];
        assert_eq!(row_x.axis, DofAxis::X);
        approx::assert_relative_eq!(row_x.c, 0.0);
        approx::assert_relative_eq!(motor.base.actual_pos(), 1.0);

        // At t = 1.0 the setpoint is 2.0: C = 1.0 - 2.0.
        motor.update(1.0, &bodies);
        approx::assert_relative_eq!(motor.constraint_rows()[0].c, -1.0);

        // The rheonomic bias is -f'(t).
        let mut qc = DVector::zeros(6);
        motor.load_constraint_time_derivative(0, &mut qc, 1.0);
        approx::assert_relative_eq!(qc[0], -2.0);
    }

    #[test]
    fn offset_shifts_the_setpoint() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());

        let mut motor =
            LinearMotorPosition::new(b1, b2, Isometry::identity(), Isometry::identity());
        motor.set_motion_law(Arc::new(crate::dynamics::ConstantLaw(0.0)));
        motor.set_motion_offset(0.25);

        motor.update(0.0, &bodies);
        approx::assert_relative_eq!(motor.constraint_rows()[0].c, -0.25);
    }

    #[test]
    fn reports_no_extra_coordinates() {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());
        let motor = LinearMotorPosition::new(b1, b2, Isometry::identity(), Isometry::identity());
        assert_eq!(motor.extra_state_size(), 0);
    }
}

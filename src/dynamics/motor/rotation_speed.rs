//! A rotational motor that imposes the angular speed about its axis.

use std::sync::Arc;

use crate::dynamics::motor::{DofAxis, MotorConstraint, RotationMotorBase};
use crate::dynamics::{BodySet, ConstantLaw, ConstraintRow, GenericVariable, MotionLaw};
use crate::dynamics::SystemDescriptor;
use crate::math::{DVector, Isometry, Real};

fn default_speed_law() -> Arc<dyn MotionLaw> {
    // Constant speed, 1 radian per second.
    Arc::new(ConstantLaw(1.0))
}

/// A rotational motor that enforces the angular speed `w(t)` between two
/// frames on two bodies, using a rheonomic constraint.
///
/// No compliance is allowed: think of it as a speed-controlled servo drive
/// with infinitely stiff control.
///
/// The motor owns one auxiliary generalized coordinate, integrated by the
/// global solver in lock-step with the body coordinates: its residual force is
/// the commanded speed and its mass is one, so its velocity state accumulates
/// the integral of the speed law, the target angle, unwrapped through any
/// number of turns. With [`RotationMotorSpeed::set_avoid_angle_drift`] enabled
/// (the default), the spin row tracks a hidden frame rotated by that integral,
/// closing the constraint at the position level too. When disabled, the motor
/// is a pure speed governor and the constraint never limits the angle.
///
/// By default it is initialized with constant speed `w = 1`; use
/// [`RotationMotorSpeed::set_speed_law`] for other speed laws.
#[derive(Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RotationMotorSpeed {
    /// The shared rotational-motor state (frames, spindle mask, cached
    /// kinematics).
    pub base: RotationMotorBase,
    #[cfg_attr(feature = "serde-serialize", serde(skip, default = "default_speed_law"))]
    law: Arc<dyn MotionLaw>,
    offset: Real,
    variable: GenericVariable,
    // Integral of the commanded speed: the unwrapped target angle.
    aux: Real,
    aux_acc: Real,
    avoid_angle_drift: bool,
}

impl RotationMotorSpeed {
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
            law: default_speed_law(),
            offset: 0.0,
            variable: GenericVariable::new(1.0),
            aux: 0.0,
            aux_acc: 0.0,
            avoid_angle_drift: true,
        }
    }

    /// Sets the speed law `w(t)`, in radians per second.
    ///
    /// Best if C0 continuous, otherwise it gives peaks in accelerations.
    pub fn set_speed_law(&mut self, law: Arc<dyn MotionLaw>) {
        self.law = law;
    }

    /// The speed law `w(t)`.
    pub fn speed_law(&self) -> &Arc<dyn MotionLaw> {
        &self.law
    }

    /// Sets the initial angle offset used by the drift closure. Zero by
    /// default.
    pub fn set_motion_offset(&mut self, offset: Real) {
        self.offset = offset;
    }

    /// The initial angle offset.
    pub fn motion_offset(&self) -> Real {
        self.offset
    }

    /// Sets whether the constraint must avoid angle drift.
    ///
    /// If true, the constraint is satisfied at the angle level too, by
    /// integrating the commanded speed in a separate auxiliary state. Default:
    /// true.
    pub fn set_avoid_angle_drift(&mut self, avoid: bool) {
        self.avoid_angle_drift = avoid;
    }

    /// Is the constraint in avoid-angle-drift mode?
    pub fn avoid_angle_drift(&self) -> bool {
        self.avoid_angle_drift
    }

    /// The auxiliary integrated state: the accumulated target angle, not
    /// wrapped to a single turn.
    pub fn aux_state(&self) -> Real {
        self.aux
    }
}

impl MotorConstraint for RotationMotorSpeed {
    fn update(&mut self, time: Real, bodies: &BodySet) {
        // With drift avoidance the hidden frame is rotated by the integrated
        // target, so the spin row re-closes the angle level; otherwise it is
        // rotated by the current angle itself and the residual stays zero,
        // leaving only the velocity-level Ct bias.
        let spin = if self.avoid_angle_drift {
            self.aux + self.offset
        } else {
            let rel = self.base.core.relative_kinematics(bodies);
            rel.rotation.scaled_axis().z
        };
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

    fn extra_state_size(&self) -> usize {
        1
    }

    fn axial_reaction(&self) -> Real {
        self.base
            .core
            .row_index(DofAxis::AngZ)
            .map(|i| self.base.core.rows()[i].lambda)
            .unwrap_or(0.0)
    }

    fn inject_variables(&mut self, descriptor: &mut SystemDescriptor) {
        self.variable.disabled = !self.base.core.enabled;
        descriptor.insert_variable(&mut self.variable);
    }

    fn gather_state(
        &self,
        off_x: usize,
        x: &mut DVector,
        off_v: usize,
        v: &mut DVector,
        t: &mut Real,
    ) {
        x[off_x] = 0.0;
        v[off_v] = self.aux;
        *t = self.base.core.time();
    }

    fn scatter_state(&mut self, _off_x: usize, _x: &DVector, off_v: usize, v: &DVector, _t: Real) {
        self.aux = v[off_v];
    }

    fn gather_acceleration(&self, off_a: usize, a: &mut DVector) {
        a[off_a] = self.aux_acc;
    }

    fn scatter_acceleration(&mut self, off_a: usize, a: &DVector) {
        self.aux_acc = a[off_a];
    }

    fn load_residual_forces(&self, off: usize, r: &mut DVector, factor: Real, _bodies: &BodySet) {
        // Unit mass + this force term make the auxiliary velocity state
        // integrate the commanded speed.
        r[off] += self.law.value(self.base.core.time()) * factor;
    }

    fn load_residual_mass_vel(&self, off: usize, r: &mut DVector, w: &DVector, factor: Real) {
        r[off] += factor * self.variable.mass() * w[off];
    }

    fn load_constraint_time_derivative(&self, off_l: usize, qc: &mut DVector, factor: Real) {
        // The spin row residual is a quaternion imaginary part, half the
        // angle error for small errors, hence the 0.5 scaling of the
        // commanded speed.
        if let Some(i) = self.base.core.row_index(DofAxis::AngZ) {
            qc[off_l + i] += factor * -0.5 * self.law.value(self.base.core.time());
        }
    }

    fn to_descriptor(&mut self, off_v: usize, v: &DVector, r: &DVector) {
        self.variable.qb = v[off_v];
        self.variable.fb = r[off_v];
    }

    fn from_descriptor(&self, off_v: usize, v: &mut DVector) {
        v[off_v] = self.variable.qb;
    }

    fn reset_variable_forces(&mut self) {
        self.variable.fb = 0.0;
    }

    fn load_variable_forces(&mut self, factor: Real) {
        self.variable.fb += self.law.value(self.base.core.time()) * factor;
    }

    fn load_variable_speeds(&mut self) {
        self.variable.qb = self.aux;
    }

    fn increment_variable_mass_vel(&mut self) {
        self.variable.increment_mass_times_vel();
    }

    fn set_speeds_from_variables(&mut self, _step: Real) {
        self.aux = self.variable.qb;
    }
}

/// Creates [`RotationMotorSpeed`] motors using the builder pattern.
#[derive(Clone)]
pub struct RotationMotorSpeedBuilder(pub RotationMotorSpeed);

impl RotationMotorSpeedBuilder {
    /// Creates a new builder connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self(RotationMotorSpeed::new(body1, body2, local_frame1, local_frame2))
    }

    /// Sets the speed law.
    #[must_use]
    pub fn speed_law(mut self, law: Arc<dyn MotionLaw>) -> Self {
        self.0.set_speed_law(law);
        self
    }

    /// Sets the initial angle offset.
    #[must_use]
    pub fn motion_offset(mut self, offset: Real) -> Self {
        self.0.set_motion_offset(offset);
        self
    }

    /// Sets the drift-avoidance mode.
    #[must_use]
    pub fn avoid_angle_drift(mut self, avoid: bool) -> Self {
        self.0.set_avoid_angle_drift(avoid);
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
    pub fn build(self) -> RotationMotorSpeed {
        self.0
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::dynamics::RigidBodyState;
    use crate::math::Vector;

    fn coincident_pair() -> (BodySet, RotationMotorSpeed) {
        let mut bodies = BodySet::new();
        let b1 = bodies.insert(RigidBodyState::default());
        let b2 = bodies.insert(RigidBodyState::default());
        let motor = RotationMotorSpeed::new(b1, b2, Isometry::identity(), Isometry::identity());
        (bodies, motor)
    }

    #[test]
    fn rheonomic_bias_is_half_the_commanded_speed() {
        let (bodies, mut motor) = coincident_pair();
        motor.set_speed_law(Arc::new(ConstantLaw(4.0)));
        motor.update(0.0, &bodies);

        let mut qc = DVector::zeros(6);
        motor.load_constraint_time_derivative(0, &mut qc, 1.0);
        let i = motor.base.core.row_index(DofAxis::AngZ).unwrap();
        approx::assert_relative_eq!(qc[i], -2.0);
    }

    #[test]
    fn drift_closure_tracks_the_integrated_target() {
        let mut bodies = BodySet::new();
        let angle = 0.5;
        let b1 = bodies.insert(RigidBodyState::at_position(Isometry::rotation(
            Vector::z() * angle,
        )));
        let b2 = bodies.insert(RigidBodyState::default());
        let mut motor = RotationMotorSpeed::new(b1, b2, Isometry::identity(), Isometry::identity());

        // Pretend the solver integrated the target up to 0.8 radians.
        motor.scatter_state(0, &DVector::zeros(1), 0, &DVector::from_element(1, 0.8), 0.0);
        motor.update(1.0, &bodies);

        let i = motor.base.core.row_index(DofAxis::AngZ).unwrap();
        approx::assert_relative_eq!(
            motor.constraint_rows()[i].c,
            (0.5 * (angle - 0.8)).sin(),
            epsilon = 1.0e-12
        );

        // Without drift avoidance the residual is identically zero.
        motor.set_avoid_angle_drift(false);
        motor.update(1.0, &bodies);
        approx::assert_relative_eq!(motor.constraint_rows()[i].c, 0.0, epsilon = 1.0e-12);
    }

    #[test]
    fn aux_state_round_trips_through_global_vectors() {
        let (bodies, mut motor) = coincident_pair();
        motor.update(0.5, &bodies);

        motor.scatter_state(0, &DVector::zeros(1), 0, &DVector::from_element(1, 7.0), 0.5);
        let mut x = DVector::zeros(1);
        let mut v = DVector::zeros(1);
        let mut t = 0.0;
        motor.gather_state(0, &mut x, 0, &mut v, &mut t);

        assert_eq!(x[0], 0.0);
        assert_eq!(v[0], 7.0);
        assert_eq!(t, 0.5);
    }

    #[test]
    fn residual_force_is_the_commanded_speed() {
        let (bodies, mut motor) = coincident_pair();
        motor.set_speed_law(Arc::new(ConstantLaw(3.0)));
        motor.update(0.0, &bodies);

        let mut r = DVector::zeros(1);
        motor.load_residual_forces(0, &mut r, 1.0, &bodies);
        approx::assert_relative_eq!(r[0], 3.0);

        motor.reset_variable_forces();
        motor.load_variable_forces(1.0);
        approx::assert_relative_eq!(motor.variable.fb, 3.0);
    }
}

//! A linear motor that imposes the relative speed along its axis.

use std::sync::Arc;

use crate::dynamics::motor::{DofAxis, LinearMotorBase, MotorConstraint};
use crate::dynamics::{BodySet, ConstantLaw, ConstraintRow, GenericVariable, MotionLaw};
use crate::dynamics::SystemDescriptor;
use crate::math::{DVector, Isometry, Real};

fn default_speed_law() -> Arc<dyn MotionLaw> {
    // Constant speed, 1 length unit per second.
    Arc::new(ConstantLaw(1.0))
}

/// A linear motor that enforces the speed `v(t)` between two frames on two
/// bodies, using a rheonomic constraint.
///
/// No compliance is allowed: if the actuator hits an undeformable obstacle
/// this is a pathological situation and the solver result can be
/// unstable/unpredictable. Think of it as a servo drive with infinitely stiff
/// control.
///
/// The motor owns one auxiliary generalized coordinate, integrated by the
/// global solver in lock-step with the body coordinates: its residual force is
/// the commanded speed and its mass is one, so its velocity state accumulates
/// the integral of the speed law, the target displacement. With
/// [`LinearMotorSpeed::set_avoid_position_drift`] enabled (the default), that
/// integral closes the constraint at the position level too, cancelling the
/// quadratic drift of velocity-only enforcement. When disabled, the motor is a
/// pure velocity governor and the constraint never limits the position.
///
/// By default it is initialized with constant speed `v = 1`; use
/// [`LinearMotorSpeed::set_speed_law`] for other speed laws.
#[derive(Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LinearMotorSpeed {
    /// The shared linear-motor state (frames, guide mask, cached kinematics).
    pub base: LinearMotorBase,
    #[cfg_attr(feature = "serde-serialize", serde(skip, default = "default_speed_law"))]
    law: Arc<dyn MotionLaw>,
    offset: Real,
    variable: GenericVariable,
    // Integral of the commanded speed: the target displacement.
    aux: Real,
    aux_acc: Real,
    avoid_position_drift: bool,
}

impl LinearMotorSpeed {
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
            law: default_speed_law(),
            offset: 0.0,
            variable: GenericVariable::new(1.0),
            aux: 0.0,
            aux_acc: 0.0,
            avoid_position_drift: true,
        }
    }

    /// Sets the speed law `v(t)`.
    ///
    /// Best if C0 continuous, otherwise it gives peaks in accelerations.
    pub fn set_speed_law(&mut self, law: Arc<dyn MotionLaw>) {
        self.law = law;
    }

    /// The speed law `v(t)`.
    pub fn speed_law(&self) -> &Arc<dyn MotionLaw> {
        &self.law
    }

    /// Sets the initial position offset used by the drift closure. Zero by
    /// default.
    pub fn set_motion_offset(&mut self, offset: Real) {
        self.offset = offset;
    }

    /// The initial position offset.
    pub fn motion_offset(&self) -> Real {
        self.offset
    }

    /// Sets whether the constraint must avoid position drift.
    ///
    /// If true, the constraint is satisfied at the position level too, by
    /// integrating the commanded speed in a separate auxiliary state. Default:
    /// true.
    pub fn set_avoid_position_drift(&mut self, avoid: bool) {
        self.avoid_position_drift = avoid;
    }

    /// Is the constraint in avoid-position-drift mode?
    pub fn avoid_position_drift(&self) -> bool {
        self.avoid_position_drift
    }

    /// The auxiliary integrated state: the accumulated target displacement.
    pub fn aux_state(&self) -> Real {
        self.aux
    }
}

impl MotorConstraint for LinearMotorSpeed {
    fn update(&mut self, time: Real, bodies: &BodySet) {
        self.base.update(time, bodies);

        // With drift avoidance the motorized row re-closes the position level
        // against the integrated target; otherwise the row only acts at the
        // velocity level through its Ct bias and the residual stays zero.
        let c = if self.avoid_position_drift {
            self.base.actual_pos() - self.aux - self.offset
        } else {
            0.0
        };
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

    fn extra_state_size(&self) -> usize {
        1
    }

    fn axial_reaction(&self) -> Real {
        self.base
            .core
            .row_index(DofAxis::X)
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
        // The position-level slot of the auxiliary coordinate is unused: the
        // integrated target lives in the velocity state.
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
        if let Some(i) = self.base.core.row_index(DofAxis::X) {
            qc[off_l + i] += factor * -self.law.value(self.base.core.time());
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

/// Creates [`LinearMotorSpeed`] motors using the builder pattern.
#[derive(Clone)]
pub struct LinearMotorSpeedBuilder(pub LinearMotorSpeed);

impl LinearMotorSpeedBuilder {
    /// Creates a new builder connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self(LinearMotorSpeed::new(body1, body2, local_frame1, local_frame2))
    }

    /// Sets the speed law.
    #[must_use]
    pub fn speed_law(mut self, law: Arc<dyn MotionLaw>) -> Self {
        self.0.set_speed_law(law);
        self
    }

    /// Sets the initial position offset.
    #[must_use]
    pub fn motion_offset(mut self, offset: Real) -> Self {
        self.0.set_motion_offset(offset);
        self
    }

    /// Sets the drift-avoidance mode.
    #[must_use]
    pub fn avoid_position_drift(mut self, avoid: bool) -> Self {
        self.0.set_avoid_position_drift(avoid);
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
    pub fn build(self) -> LinearMotorSpeed {
        self.0
    }
}

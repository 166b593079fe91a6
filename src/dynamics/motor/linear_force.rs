//! A linear motor that applies a force along its axis.

use std::sync::Arc;

use crate::dynamics::motor::{LinearMotorBase, MotorConstraint};
use crate::dynamics::{BodySet, ConstantLaw, ConstraintRow, MotionLaw};
use crate::math::{DVector, Isometry, Real, Vector};

fn default_force_law() -> Arc<dyn MotionLaw> {
    Arc::new(ConstantLaw(0.0))
}

/// A linear motor that applies a force `F(t)` between two frames on two
/// bodies, along the X axis of the master frame.
///
/// Differently from the Position and Speed motors, this does not enforce any
/// kinematic value on the motorized axis: the axis is left free and the force
/// acts through the bodies' load terms, like a pneumatic cylinder with an
/// imposed thrust. The guide still locks the other relative degrees of
/// freedom per its preset.
///
/// The default force law is constant zero.
#[derive(Clone)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LinearMotorForce {
    /// The shared linear-motor state (frames, guide mask, cached kinematics).
    pub base: LinearMotorBase,
    #[cfg_attr(feature = "serde-serialize", serde(skip, default = "default_force_law"))]
    law: Arc<dyn MotionLaw>,
}

impl LinearMotorForce {
    /// Creates the motor connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self {
            base: LinearMotorBase::new(body1, body2, local_frame1, local_frame2, false),
            law: default_force_law(),
        }
    }

    /// Sets the force law `F(t)`.
    pub fn set_force_law(&mut self, law: Arc<dyn MotionLaw>) {
        self.law = law;
    }

    /// The force law `F(t)`.
    pub fn force_law(&self) -> &Arc<dyn MotionLaw> {
        &self.law
    }

    /// The world-space force direction and application point, at the bodies'
    /// current state.
    fn world_axis_and_point(&self, bodies: &BodySet) -> (Vector, Vector) {
        let core = &self.base.core;
        let f1 = bodies[core.body1].position * core.local_frame1;
        let f2 = bodies[core.body2].position * core.local_frame2;
        let axis = f2.rotation * Vector::x();
        (axis, f1.translation.vector)
    }
}

impl MotorConstraint for LinearMotorForce {
    fn update(&mut self, time: Real, bodies: &BodySet) {
        self.base.update(time, bodies);
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
        // force itself.
        self.law.value(self.base.core.time())
    }

    fn load_residual_forces(&self, _off: usize, r: &mut DVector, factor: Real, bodies: &BodySet) {
        if !self.base.core.enabled {
            return;
        }
        let (axis, point) = self.world_axis_and_point(bodies);
        let force = axis * self.law.value(self.base.core.time());
        self.base
            .core
            .load_wrench_residual(r, factor, bodies, &force, &Vector::zeros(), &point);
    }

    fn load_body_forces(&self, bodies: &mut BodySet, factor: Real) {
        if !self.base.core.enabled {
            return;
        }
        let (axis, point) = self.world_axis_and_point(bodies);
        let force = axis * self.law.value(self.base.core.time());
        self.base
            .core
            .load_wrench_body_buffers(bodies, factor, &force, &Vector::zeros(), &point);
    }
}

/// Creates [`LinearMotorForce`] motors using the builder pattern.
#[derive(Clone)]
pub struct LinearMotorForceBuilder(pub LinearMotorForce);

impl LinearMotorForceBuilder {
    /// Creates a new builder connecting two bodies through the given local
    /// frames.
    pub fn new(
        body1: crate::dynamics::BodyHandle,
        body2: crate::dynamics::BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
    ) -> Self {
        Self(LinearMotorForce::new(body1, body2, local_frame1, local_frame2))
    }

    /// Sets the force law.
    #[must_use]
    pub fn force_law(mut self, law: Arc<dyn MotionLaw>) -> Self {
        self.0.set_force_law(law);
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
    pub fn build(self) -> LinearMotorForce {
        self.0
    }
}

//! Shared state of the rotational motors (actuated about the Z axis of the
//! master frame).

use crate::dynamics::motor::dof_mask::spindle_mask;
use crate::dynamics::motor::{DofMask, MotorCore, SpindleConstraint};
use crate::dynamics::{BodyHandle, BodySet};
use crate::math::{Isometry, Real};

/// State shared by the three rotational motors: the frame pair, the spindle
/// mask and the cached spin kinematics.
///
/// The actuator spins about the Z direction of the master (second) frame. The
/// cached readouts are recomputed by `update` and are stale until it has run
/// for the current time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RotationMotorBase {
    pub(crate) core: MotorCore,
    rot: Real,
    rot_dt: Real,
    rot_dtdt: Real,
}

impl RotationMotorBase {
    /// Creates the base state connecting two bodies through the given local
    /// frames.
    ///
    /// `motorized` selects whether the spin axis itself carries a constraint
    /// row (true for Angle/Speed motors, false for the Torque motor). The
    /// spindle defaults to [`SpindleConstraint::Revolute`].
    pub(crate) fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
        motorized: bool,
    ) -> Self {
        let mut locked_axes = SpindleConstraint::Revolute.mask();
        locked_axes.set(DofMask::ANG_Z, motorized);

        Self {
            core: MotorCore::new(body1, body2, local_frame1, local_frame2, locked_axes),
            rot: 0.0,
            rot_dt: 0.0,
            rot_dtdt: 0.0,
        }
    }

    /// Sets which movements of frame 1 with respect to frame 2 are
    /// constrained, from a named preset.
    ///
    /// By default, acts as a rigid revolute bearing. The Z rotation is the
    /// motorized one and is never affected by this option.
    pub fn set_spindle_constraint(&mut self, spindle: SpindleConstraint) {
        let motorized = self.core.locked_axes() & DofMask::ANG_Z;
        self.core.set_locked_axes(spindle.mask() | motorized);
    }

    /// Sets which movements of frame 1 with respect to frame 2 are
    /// constrained, from explicit per-DOF flags.
    ///
    /// Equivalent to [`RotationMotorBase::set_spindle_constraint`] with the
    /// preset expanding to the same flags. The Z rotation is the motorized one
    /// and is never affected by this option.
    pub fn set_spindle_flags(
        &mut self,
        mc_x: bool,
        mc_y: bool,
        mc_z: bool,
        mc_rx: bool,
        mc_ry: bool,
    ) {
        let motorized = self.core.locked_axes() & DofMask::ANG_Z;
        self.core
            .set_locked_axes(spindle_mask(mc_x, mc_y, mc_z, mc_rx, mc_ry) | motorized);
    }

    /// The current actuator rotation, in radians, in the single-turn range.
    ///
    /// Valid after the per-step update; includes the constraint error.
    pub fn actual_rot(&self) -> Real {
        self.rot
    }

    /// The current actuator angular speed, in radians per second.
    pub fn actual_rot_dt(&self) -> Real {
        self.rot_dt
    }

    /// The current actuator angular acceleration, in radians per second
    /// squared.
    pub fn actual_rot_dtdt(&self) -> Real {
        self.rot_dtdt
    }

    /// The degrees of freedom currently locked by this motor.
    pub fn locked_axes(&self) -> DofMask {
        self.core.locked_axes()
    }

    /// The constraint rows built by the last update.
    pub fn rows(&self) -> &[crate::dynamics::ConstraintRow] {
        self.core.rows()
    }

    /// Recomputes the cached spin kinematics and the constraint rows.
    ///
    /// `spin` optionally pre-rotates the master frame about its Z axis before
    /// building the angular rows, so the locked spin row tracks a rotating
    /// target instead of a fixed one.
    pub(crate) fn update(&mut self, time: Real, bodies: &BodySet, spin: Option<Real>) {
        let rel = self.core.relative_kinematics(bodies);
        self.rot = rel.rotation.scaled_axis().z;
        self.rot_dt = rel.angvel.z;
        self.rot_dtdt = rel.angacc.z;

        self.core.update_rows(time, bodies, spin);
    }
}

//! Shared state of the linear motors (actuated along the X axis of the master
//! frame).

use crate::dynamics::motor::dof_mask::guide_mask;
use crate::dynamics::motor::{DofMask, GuideConstraint, MotorCore};
use crate::dynamics::{BodyHandle, BodySet};
use crate::math::{Isometry, Real};

/// State shared by the three linear motors: the frame pair, the guide mask and
/// the cached axial kinematics.
///
/// The actuator is directed along the X direction of the master (second)
/// frame. The cached readouts are recomputed by `update` and are stale until
/// it has run for the current time.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct LinearMotorBase {
    pub(crate) core: MotorCore,
    pos: Real,
    pos_dt: Real,
    pos_dtdt: Real,
}

impl LinearMotorBase {
    /// Creates the base state connecting two bodies through the given local
    /// frames.
    ///
    /// `motorized` selects whether the X axis itself carries a constraint row
    /// (true for Position/Speed motors, false for the Force motor). The guide
    /// defaults to [`GuideConstraint::Prismatic`].
    pub(crate) fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
        motorized: bool,
    ) -> Self {
        let mut locked_axes = GuideConstraint::Prismatic.mask();
        locked_axes.set(DofMask::X, motorized);

        Self {
            core: MotorCore::new(body1, body2, local_frame1, local_frame2, locked_axes),
            pos: 0.0,
            pos_dt: 0.0,
            pos_dtdt: 0.0,
        }
    }

    /// Sets which movements of frame 1 with respect to frame 2 are
    /// constrained, from a named preset.
    ///
    /// By default, acts as a pure prismatic guide. The X direction is the
    /// motorized one and is never affected by this option.
    pub fn set_guide_constraint(&mut self, guide: GuideConstraint) {
        let motorized = self.core.locked_axes() & DofMask::X;
        self.core.set_locked_axes(guide.mask() | motorized);
    }

    /// Sets which movements of frame 1 with respect to frame 2 are
    /// constrained, from explicit per-DOF flags.
    ///
    /// Equivalent to [`LinearMotorBase::set_guide_constraint`] with the preset
    /// expanding to the same flags. The X direction is the motorized one and
    /// is never affected by this option.
    pub fn set_guide_flags(&mut self, mc_y: bool, mc_z: bool, mc_rx: bool, mc_ry: bool, mc_rz: bool) {
        let motorized = self.core.locked_axes() & DofMask::X;
        self.core
            .set_locked_axes(guide_mask(mc_y, mc_z, mc_rx, mc_ry, mc_rz) | motorized);
    }

    /// The current actuator displacement, in length units.
    ///
    /// Valid after the per-step update; includes the constraint error.
    pub fn actual_pos(&self) -> Real {
        self.pos
    }

    /// The current actuator speed, in length units per second.
    pub fn actual_vel(&self) -> Real {
        self.pos_dt
    }

    /// The current actuator acceleration, in length units per second squared.
    pub fn actual_acc(&self) -> Real {
        self.pos_dtdt
    }

    /// The degrees of freedom currently locked by this motor.
    pub fn locked_axes(&self) -> DofMask {
        self.core.locked_axes()
    }

    /// The constraint rows built by the last update.
    pub fn rows(&self) -> &[crate::dynamics::ConstraintRow] {
        self.core.rows()
    }

    /// Recomputes the cached axial kinematics and the generic guide rows.
    pub(crate) fn update(&mut self, time: Real, bodies: &BodySet) {
        let rel = self.core.relative_kinematics(bodies);
        self.pos = rel.translation.x;
        self.pos_dt = rel.linvel.x;
        self.pos_dtdt = rel.linacc.x;

        self.core.update_rows(time, bodies, None);
    }
}

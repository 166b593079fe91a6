//! Motor constraints between two frames on two bodies.

pub use self::dof_mask::{DofAxis, DofMask, GuideConstraint, SpindleConstraint};
pub use self::linear::LinearMotorBase;
pub use self::linear_force::{LinearMotorForce, LinearMotorForceBuilder};
pub use self::linear_position::{LinearMotorPosition, LinearMotorPositionBuilder};
pub use self::linear_speed::{LinearMotorSpeed, LinearMotorSpeedBuilder};
pub use self::rotation::RotationMotorBase;
pub use self::rotation_angle::{RotationMotorAngle, RotationMotorAngleBuilder};
pub use self::rotation_speed::{RotationMotorSpeed, RotationMotorSpeedBuilder};
pub use self::rotation_torque::{RotationMotorTorque, RotationMotorTorqueBuilder};

mod dof_mask;
mod linear;
mod linear_force;
mod linear_position;
mod linear_speed;
mod rotation;
mod rotation_angle;
mod rotation_speed;
mod rotation_torque;

use crate::dynamics::solver::{lock_angular_rows, lock_linear_row};
use crate::dynamics::{BodyHandle, BodySet, ConstraintRow, RelativeKinematics, SystemDescriptor};
use crate::math::{DVector, Isometry, Real, Rotation, Vector};

/// State shared by every motor: the two attachment frames, the lock mask and
/// the built constraint rows.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct MotorCore {
    /// The first connected body.
    pub body1: BodyHandle,
    /// The second connected body. Its attachment frame is the master frame
    /// carrying the motorized axis.
    pub body2: BodyHandle,
    /// The attachment frame on the first body, in that body's local space.
    pub local_frame1: Isometry,
    /// The attachment frame on the second body, in that body's local space.
    pub local_frame2: Isometry,
    /// A disabled motor contributes nothing to the solve.
    pub enabled: bool,
    locked_axes: DofMask,
    rows: Vec<ConstraintRow>,
    time: Real,
}

impl MotorCore {
    pub(crate) fn new(
        body1: BodyHandle,
        body2: BodyHandle,
        local_frame1: Isometry,
        local_frame2: Isometry,
        locked_axes: DofMask,
    ) -> Self {
        let mut result = Self {
            body1,
            body2,
            local_frame1,
            local_frame2,
            enabled: true,
            locked_axes,
            rows: Vec::new(),
            time: 0.0,
        };
        result.rebuild_rows();
        result
    }

    /// The degrees of freedom currently locked by this motor.
    pub fn locked_axes(&self) -> DofMask {
        self.locked_axes
    }

    /// The simulation time of the last update.
    pub fn time(&self) -> Real {
        self.time
    }

    /// The constraint rows built by the last update, in row order.
    pub fn rows(&self) -> &[ConstraintRow] {
        &self.rows
    }

    pub(crate) fn rows_mut(&mut self) -> &mut [ConstraintRow] {
        &mut self.rows
    }

    /// The index of the row locking `axis`, if that axis is locked.
    pub fn row_index(&self, axis: DofAxis) -> Option<usize> {
        self.rows.iter().position(|row| row.axis == axis)
    }

    pub(crate) fn row_mut(&mut self, axis: DofAxis) -> Option<&mut ConstraintRow> {
        self.rows.iter_mut().find(|row| row.axis == axis)
    }

    /// Changes the set of locked axes, rebuilding the rows. Idempotent.
    pub(crate) fn set_locked_axes(&mut self, locked_axes: DofMask) {
        if self.locked_axes != locked_axes {
            self.locked_axes = locked_axes;
            self.rebuild_rows();
        }
    }

    fn rebuild_rows(&mut self) {
        self.rows = self
            .locked_axes
            .locked_axes()
            .map(ConstraintRow::new)
            .collect();
    }

    /// The kinematics of frame 1 relative to frame 2, at the bodies' current
    /// state.
    pub fn relative_kinematics(&self, bodies: &BodySet) -> RelativeKinematics {
        let f1 = bodies[self.body1].moving_frame(&self.local_frame1);
        let f2 = bodies[self.body2].moving_frame(&self.local_frame2);
        f1.relative_to(&f2)
    }

    /// Recomputes the residuals and Jacobians of every row.
    ///
    /// `spin` optionally pre-rotates the reference frame about its Z axis
    /// before building the angular rows; rotational Angle/Speed motors use it
    /// to impose their target rotation through a rotating hidden frame.
    pub(crate) fn update_rows(&mut self, time: Real, bodies: &BodySet, spin: Option<Real>) {
        self.time = time;

        let body1 = &bodies[self.body1];
        let body2 = &bodies[self.body2];
        let f1 = body1.position * self.local_frame1;
        let f2 = body2.position * self.local_frame2;
        let anchor1 = f1.translation.vector;
        let anchor2 = f2.translation.vector;
        let ref_rot = f2.rotation;

        let ang_ref_rot = match spin {
            Some(angle) => ref_rot * Rotation::from_axis_angle(&crate::na::Vector3::z_axis(), angle),
            None => ref_rot,
        };
        let rel_rot = ang_ref_rot.inverse() * f1.rotation;
        let ang_rows = lock_angular_rows(&rel_rot, &ang_ref_rot);

        for row in &mut self.rows {
            match row.axis {
                DofAxis::X | DofAxis::Y | DofAxis::Z => {
                    *row = lock_linear_row(
                        row.axis,
                        row.axis as usize,
                        &anchor1,
                        &anchor2,
                        &ref_rot,
                        body1,
                        body2,
                    );
                }
                DofAxis::AngX => *row = ang_rows[0],
                DofAxis::AngY => *row = ang_rows[1],
                DofAxis::AngZ => *row = ang_rows[2],
            }
        }
    }

    /// Applies a wrench (world force applied at `point`, world torque) to the
    /// two bodies, accumulated into the global residual at the bodies' solver
    /// offsets. The wrench acts positively on body 1 and negatively on body 2.
    pub(crate) fn load_wrench_residual(
        &self,
        r: &mut DVector,
        factor: Real,
        bodies: &BodySet,
        force: &Vector,
        torque: &Vector,
        point: &Vector,
    ) {
        let body1 = &bodies[self.body1];
        let body2 = &bodies[self.body2];

        if body1.enabled {
            let arm = point - body1.position.translation.vector;
            let off = body1.solver_offset;
            for k in 0..3 {
                r[off + k] += force[k] * factor;
                r[off + 3 + k] += (arm.cross(force)[k] + torque[k]) * factor;
            }
        }
        if body2.enabled {
            let arm = point - body2.position.translation.vector;
            let off = body2.solver_offset;
            for k in 0..3 {
                r[off + k] -= force[k] * factor;
                r[off + 3 + k] -= (arm.cross(force)[k] + torque[k]) * factor;
            }
        }
    }

    /// Legacy path of [`MotorCore::load_wrench_residual`]: accumulates the
    /// wrench into the bodies' applied-force buffers.
    pub(crate) fn load_wrench_body_buffers(
        &self,
        bodies: &mut BodySet,
        factor: Real,
        force: &Vector,
        torque: &Vector,
        point: &Vector,
    ) {
        let arm1 = point - bodies[self.body1].position.translation.vector;
        let arm2 = point - bodies[self.body2].position.translation.vector;

        let body1 = &mut bodies[self.body1];
        body1.applied_force += force * factor;
        body1.applied_torque += (arm1.cross(force) + torque) * factor;

        let body2 = &mut bodies[self.body2];
        body2.applied_force -= force * factor;
        body2.applied_torque -= (arm2.cross(force) + torque) * factor;
    }
}

/// The capability interface of every motor constraint.
///
/// The global solver drives each motor through this interface once per step:
/// `update` first, then any number of contribution calls. Offsets are
/// caller-supplied; a motor reads/writes exactly the scalars it declared
/// (its rows, plus `extra_state_size()` auxiliary coordinates) and never
/// beyond. Calling contribution methods before `update` for the current time
/// yields stale numbers; this is not re-validated on the hot path.
pub trait MotorConstraint: Send + Sync {
    /// Recomputes the cached kinematic readouts and the constraint rows from
    /// the bodies' current state.
    fn update(&mut self, time: Real, bodies: &BodySet);

    /// The constraint rows contributed by this motor, in row order.
    fn constraint_rows(&self) -> &[ConstraintRow];

    /// Mutable access to the constraint rows.
    fn constraint_rows_mut(&mut self) -> &mut [ConstraintRow];

    /// Is this motor part of the current solve?
    fn is_enabled(&self) -> bool;

    /// The number of auxiliary generalized coordinates owned by this motor
    /// (1 for the Speed variants, 0 otherwise).
    fn extra_state_size(&self) -> usize {
        0
    }

    /// The reaction along the motorized axis.
    ///
    /// For constraint-based motors this is the solved multiplier of the
    /// motorized row; for Force/Torque motors it is the commanded load
    /// re-evaluated at the current time.
    fn axial_reaction(&self) -> Real;

    /// Registers this motor's auxiliary variable blocks with the descriptor.
    fn inject_variables(&mut self, _descriptor: &mut SystemDescriptor) {}

    /// Copies the auxiliary state into the global position/velocity vectors.
    fn gather_state(
        &self,
        _off_x: usize,
        _x: &mut DVector,
        _off_v: usize,
        _v: &mut DVector,
        _t: &mut Real,
    ) {
    }

    /// Reads the auxiliary state back from the global position/velocity
    /// vectors.
    fn scatter_state(&mut self, _off_x: usize, _x: &DVector, _off_v: usize, _v: &DVector, _t: Real) {
    }

    /// Copies the auxiliary acceleration into the global acceleration vector.
    fn gather_acceleration(&self, _off_a: usize, _a: &mut DVector) {}

    /// Reads the auxiliary acceleration back from the global acceleration
    /// vector.
    fn scatter_acceleration(&mut self, _off_a: usize, _a: &DVector) {}

    /// Accumulates `factor * F` into the global residual, where `F` is this
    /// motor's generalized force term.
    fn load_residual_forces(&self, _off: usize, _r: &mut DVector, _factor: Real, _bodies: &BodySet) {
    }

    /// Accumulates `factor * M * w` into the global residual for this motor's
    /// auxiliary variables.
    fn load_residual_mass_vel(&self, _off: usize, _r: &mut DVector, _w: &DVector, _factor: Real) {}

    /// Accumulates `factor * Ct` (the explicit time-derivative of the
    /// rheonomic residual) into the constraint right-hand side.
    fn load_constraint_time_derivative(&self, _off_l: usize, _qc: &mut DVector, _factor: Real) {}

    /// Copies the solver-facing slices of the global vectors into this
    /// motor's variable buffers (legacy descriptor round-trip, in).
    fn to_descriptor(&mut self, _off_v: usize, _v: &DVector, _r: &DVector) {}

    /// Copies this motor's variable buffers back into the global vectors
    /// (legacy descriptor round-trip, out).
    fn from_descriptor(&self, _off_v: usize, _v: &mut DVector) {}

    /// Stores the solved reaction multipliers of this motor's rows.
    fn scatter_reactions(&mut self, off_l: usize, lambdas: &DVector) {
        for (i, row) in self.constraint_rows_mut().iter_mut().enumerate() {
            row.lambda = lambdas[off_l + i];
        }
    }

    /// Legacy force-based path: clears the auxiliary variable force buffers.
    fn reset_variable_forces(&mut self) {}

    /// Legacy force-based path: accumulates the motor's force term into its
    /// variable force buffers.
    fn load_variable_forces(&mut self, _factor: Real) {}

    /// Legacy force-based path: copies the auxiliary speeds into the variable
    /// velocity buffers.
    fn load_variable_speeds(&mut self) {}

    /// Legacy force-based path: accumulates `M * qb` into the variable force
    /// buffers.
    fn increment_variable_mass_vel(&mut self) {}

    /// Legacy force-based path: reads the solved variable velocity buffers
    /// back into the auxiliary state.
    fn set_speeds_from_variables(&mut self, _step: Real) {}

    /// Legacy force-based path: accumulates the rheonomic bias into the rows'
    /// right-hand side.
    ///
    /// This is derived from [`MotorConstraint::load_constraint_time_derivative`]
    /// so the two solver interfaces cannot drift apart.
    fn load_row_bias(&mut self, factor: Real) {
        if !self.is_enabled() {
            return;
        }
        let n = self.constraint_rows().len();
        if n == 0 {
            return;
        }
        let mut qc = DVector::zeros(n);
        self.load_constraint_time_derivative(0, &mut qc, factor);
        for (i, row) in self.constraint_rows_mut().iter_mut().enumerate() {
            row.ct_bias += qc[i];
        }
    }

    /// Legacy force-based path: accumulates the motor's body wrench into the
    /// bodies' applied-force buffers (Force/Torque motors only).
    fn load_body_forces(&self, _bodies: &mut BodySet, _factor: Real) {}
}

/// The unique identifier of a motor added to a [`MotorSet`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[repr(transparent)]
pub struct MotorHandle(pub u32);

/// A collection of motors, dispatched dynamically at assembly time.
#[derive(Default)]
pub struct MotorSet {
    motors: Vec<Option<Box<dyn MotorConstraint>>>,
}

impl MotorSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a motor and returns its handle.
    pub fn insert(&mut self, motor: impl MotorConstraint + 'static) -> MotorHandle {
        self.motors.push(Some(Box::new(motor)));
        let handle = MotorHandle(self.motors.len() as u32 - 1);
        log::debug!("motor set: inserted motor {:?}", handle);
        handle
    }

    /// Removes a motor from the set.
    pub fn remove(&mut self, handle: MotorHandle) -> Option<Box<dyn MotorConstraint>> {
        self.motors.get_mut(handle.0 as usize)?.take()
    }

    /// Gets a motor by handle.
    pub fn get(&self, handle: MotorHandle) -> Option<&dyn MotorConstraint> {
        self.motors
            .get(handle.0 as usize)?
            .as_ref()
            .map(|m| &**m as &dyn MotorConstraint)
    }

    /// Gets a motor by handle, mutably.
    pub fn get_mut(&mut self, handle: MotorHandle) -> Option<&mut (dyn MotorConstraint + 'static)> {
        match self.motors.get_mut(handle.0 as usize)? {
            Some(m) => Some(&mut **m),
            None => None,
        }
    }

    /// Iterates over the motors of the set.
    pub fn iter(&self) -> impl Iterator<Item = &dyn MotorConstraint> {
        self.motors.iter().filter_map(|m| m.as_deref())
    }

    /// Iterates over the motors of the set, mutably.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut (dyn MotorConstraint + 'static)> {
        self.motors.iter_mut().filter_map(|m| match m {
            Some(m) => Some(&mut **m),
            None => None,
        })
    }

    /// Updates every motor of the set for the given time.
    ///
    /// Must run before any contribution is requested for this step. Distinct
    /// motors are independent; their contributions are additive.
    #[profiling::function]
    pub fn update_all(&mut self, time: Real, bodies: &BodySet) {
        for motor in self.iter_mut() {
            motor.update(time, bodies);
        }
    }

    /// Registers every motor's auxiliary variables with the descriptor.
    pub fn inject_all_variables(&mut self, descriptor: &mut SystemDescriptor) {
        for motor in self.iter_mut() {
            motor.inject_variables(descriptor);
        }
    }

    /// The total number of auxiliary generalized coordinates owned by the
    /// motors of this set.
    pub fn total_extra_state_size(&self) -> usize {
        self.iter().map(|m| m.extra_state_size()).sum()
    }
}

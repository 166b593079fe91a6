//! Constraint rows: residual, Jacobian blocks and bias of one locked degree of
//! freedom.

use crate::dynamics::motor::DofAxis;
use crate::dynamics::RigidBodyState;
use crate::math::{Matrix, Real, Rotation, Vector};

/// The Jacobian block of one constraint row with respect to one body.
///
/// Body velocities are ordered `[linvel; angvel]`, world coordinates.
#[derive(Copy, Clone, Debug, PartialEq, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SpatialJacobian {
    /// The linear part of the Jacobian block.
    pub lin: Vector,
    /// The angular part of the Jacobian block.
    pub ang: Vector,
}

impl SpatialJacobian {
    /// The dot product of this Jacobian block with a body velocity.
    pub fn dot(&self, linvel: &Vector, angvel: &Vector) -> Real {
        self.lin.dot(linvel) + self.ang.dot(angvel)
    }
}

/// One scalar constraint row produced by a motor.
///
/// The row expresses `c = 0` on the relative motion component identified by
/// `axis`, with `jac1`/`jac2` the velocity-level Jacobian blocks of the two
/// connected bodies. `ct_bias` accumulates the legacy right-hand-side
/// contribution (the rheonomic `Ct` term loaded through the force-based solve
/// path), and `lambda` receives the solved reaction multiplier.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ConstraintRow {
    /// The relative degree of freedom locked by this row.
    pub axis: DofAxis,
    /// The position-level residual of this row.
    pub c: Real,
    /// The Jacobian block with respect to the first body.
    pub jac1: SpatialJacobian,
    /// The Jacobian block with respect to the second body.
    pub jac2: SpatialJacobian,
    /// Accumulated right-hand-side bias (legacy force-based solve path).
    pub ct_bias: Real,
    /// The reaction multiplier solved for this row.
    pub lambda: Real,
}

impl ConstraintRow {
    /// An empty row locking the given axis.
    pub fn new(axis: DofAxis) -> Self {
        Self {
            axis,
            c: 0.0,
            jac1: SpatialJacobian::default(),
            jac2: SpatialJacobian::default(),
            ct_bias: 0.0,
            lambda: 0.0,
        }
    }
}

/// Builds the row locking one translational component of the relative motion.
///
/// `axis_idx` selects the component (0, 1, 2 for the X, Y, Z axis of the
/// reference frame), `anchor1`/`anchor2` are the world positions of the two
/// attachment-frame origins, and `ref_rot` is the world orientation of the
/// reference (second) frame. Lever arms are taken about each body origin.
pub(crate) fn lock_linear_row(
    axis: DofAxis,
    axis_idx: usize,
    anchor1: &Vector,
    anchor2: &Vector,
    ref_rot: &Rotation,
    body1: &RigidBodyState,
    body2: &RigidBodyState,
) -> ConstraintRow {
    let a = ref_rot * Vector::ith(axis_idx, 1.0);
    let d = anchor1 - anchor2;
    let r1 = anchor1 - body1.position.translation.vector;
    let r2 = anchor2 - body2.position.translation.vector;

    let mut row = ConstraintRow::new(axis);
    row.c = a.dot(&d);
    row.jac1 = SpatialJacobian {
        lin: a,
        ang: r1.cross(&a),
    };
    row.jac2 = SpatialJacobian {
        lin: -a,
        ang: -r2.cross(&a),
    };
    row
}

/// Builds the three rows locking the relative rotation, as quaternion
/// residuals.
///
/// `rel_rot` is the orientation of frame 1 relative to the (possibly
/// rotating) reference frame, and `ref_rot` the world orientation of that
/// reference frame. The residual of each row is one imaginary component of
/// `rel_rot`; for small errors this is half the corresponding rotation angle,
/// which is why every rotational rheonomic bias carries a 0.5 factor. The
/// angular Jacobian is the quaternion tangent map `0.5 * (e0*I + [e]x)^T`
/// composed with the change of basis to world angular velocities.
pub(crate) fn lock_angular_rows(rel_rot: &Rotation, ref_rot: &Rotation) -> [ConstraintRow; 3] {
    let e0 = rel_rot.w;
    let evec = rel_rot.imag();
    let tangent = Matrix::identity() * (0.5 * e0) + evec.cross_matrix() * 0.5;
    // Rows of this matrix are the angular Jacobians of the three residuals
    // with respect to the relative angular velocity expressed in world coords.
    let jw = tangent.transpose() * ref_rot.to_rotation_matrix().matrix().transpose();

    let axes = [DofAxis::AngX, DofAxis::AngY, DofAxis::AngZ];
    let mut rows = [
        ConstraintRow::new(axes[0]),
        ConstraintRow::new(axes[1]),
        ConstraintRow::new(axes[2]),
    ];

    for (i, row) in rows.iter_mut().enumerate() {
        let ang: Vector = jw.row(i).transpose();
        row.c = evec[i];
        row.jac1 = SpatialJacobian {
            lin: Vector::zeros(),
            ang,
        };
        row.jac2 = SpatialJacobian {
            lin: Vector::zeros(),
            ang: -ang,
        };
    }

    rows
}

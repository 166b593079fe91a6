//! # motorlink
//!
//! motorlink is the actuator layer of a multibody dynamics engine: a family of
//! "motor" constraints that impose a prescribed motion law or load law between
//! two frames attached to two rigid bodies, and turn it into the algebraic
//! objects a time-stepping DAE solver consumes each step (constraint rows,
//! residual contributions, auxiliary integrated states).
//!
//! Six motor types are provided, three linear (along the X axis of the master
//! frame) and three rotational (about the Z axis of the master frame):
//! - [`LinearMotorPosition`](dynamics::LinearMotorPosition) /
//!   [`RotationMotorAngle`](dynamics::RotationMotorAngle): exact rheonomic
//!   position/angle constraints.
//! - [`LinearMotorSpeed`](dynamics::LinearMotorSpeed) /
//!   [`RotationMotorSpeed`](dynamics::RotationMotorSpeed): rheonomic velocity
//!   constraints with an auxiliary integrated state for drift cancellation.
//! - [`LinearMotorForce`](dynamics::LinearMotorForce) /
//!   [`RotationMotorTorque`](dynamics::RotationMotorTorque): open-loop load
//!   injection, leaving the motorized degree of freedom free.

#![deny(bare_trait_objects)]
#![warn(missing_docs)]
#![allow(clippy::too_many_arguments)]

pub extern crate nalgebra as na;
#[cfg(feature = "serde-serialize")]
#[macro_use]
extern crate serde;

/// The string version of motorlink.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod dynamics;
pub mod utils;

/// Elementary mathematical entities (vectors, isometries, etc).
pub mod math {
    /// The scalar type used throughout the crate.
    ///
    /// Motor constraints feed a double-precision DAE solver, so this is fixed
    /// to `f64`.
    pub type Real = f64;

    /// A 3D vector.
    pub type Vector = crate::na::Vector3<Real>;

    /// A 3D point.
    pub type Point = crate::na::Point3<Real>;

    /// A 3D isometry (rotation followed by a translation).
    pub type Isometry = crate::na::Isometry3<Real>;

    /// A 3D rotation represented as a unit quaternion.
    pub type Rotation = crate::na::UnitQuaternion<Real>;

    /// A 3x3 matrix.
    pub type Matrix = crate::na::Matrix3<Real>;

    /// A dynamically-sized vector, used for the solver-owned global vectors.
    pub type DVector = crate::na::DVector<Real>;

    /// The number of possible rotations and translations of a rigid body.
    pub const SPATIAL_DIM: usize = 6;

    /// The number of rotational degrees of freedom of a rigid body.
    pub const ANG_DIM: usize = 3;
}

/// Prelude containing the common types defined by motorlink.
pub mod prelude {
    pub use crate::dynamics::*;
    pub use crate::math::*;
    pub use crate::na::{vector, DVector};
}

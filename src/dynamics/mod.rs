//! Structures related to dynamics: motion laws, bodies, motors, solver glue.

pub use self::motion_law::{ConstantLaw, MotionLaw, RampLaw, SineLaw};
pub use self::motor::{
    DofAxis, DofMask, GuideConstraint, LinearMotorBase, LinearMotorForce, LinearMotorForceBuilder,
    LinearMotorPosition, LinearMotorPositionBuilder, LinearMotorSpeed, LinearMotorSpeedBuilder,
    MotorConstraint, MotorCore, MotorHandle, MotorSet, RotationMotorAngle,
    RotationMotorAngleBuilder, RotationMotorBase, RotationMotorSpeed, RotationMotorSpeedBuilder,
    RotationMotorTorque, RotationMotorTorqueBuilder, SpindleConstraint,
};
pub use self::rigid_body::{BodyHandle, BodySet, MovingFrame, RelativeKinematics, RigidBodyState};
pub use self::solver::{ConstraintRow, GenericVariable, SpatialJacobian, SystemDescriptor};

mod motion_law;
mod motor;
mod rigid_body;
mod solver;

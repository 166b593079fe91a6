//! Algebraic objects exchanged with the global DAE solver.

pub use self::constraint_rows::{ConstraintRow, SpatialJacobian};
pub use self::generic_variable::GenericVariable;
pub use self::system_descriptor::SystemDescriptor;

pub(crate) use self::constraint_rows::{lock_angular_rows, lock_linear_row};

mod constraint_rows;
mod generic_variable;
mod system_descriptor;

//! Registration bookkeeping for solver variables and constraint rows.

use crate::dynamics::GenericVariable;

/// Assigns stable offsets to variable blocks and constraint rows, once per
/// assembly.
///
/// The global solver rebuilds its descriptor at every topology change and asks
/// each constraint to re-register; offsets handed out here are then used as-is
/// by every gather/scatter and load call for the rest of the assembly's
/// lifetime.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SystemDescriptor {
    n_variables: usize,
    n_constraints: usize,
}

impl SystemDescriptor {
    /// Creates an empty descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a scalar variable block and assigns it an offset.
    pub fn insert_variable(&mut self, variable: &mut GenericVariable) -> usize {
        let offset = self.n_variables;
        variable.set_offset(offset);
        self.n_variables += 1;
        log::trace!("descriptor: variable registered at offset {}", offset);
        offset
    }

    /// Reserves `count` consecutive constraint-row slots and returns the first
    /// offset.
    pub fn insert_constraint_rows(&mut self, count: usize) -> usize {
        let offset = self.n_constraints;
        self.n_constraints += count;
        offset
    }

    /// The total number of registered scalar variables.
    pub fn n_variables(&self) -> usize {
        self.n_variables
    }

    /// The total number of registered constraint rows.
    pub fn n_constraints(&self) -> usize {
        self.n_constraints
    }
}

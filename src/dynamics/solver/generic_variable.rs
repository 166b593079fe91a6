//! A one-scalar variable block owned by a constraint rather than a body.

use crate::math::Real;
use crate::utils;

/// A single generalized coordinate injected into the global solve.
///
/// Speed motors own one of these: a unit-mass scalar variable solved
/// simultaneously with the body dynamics. The `fb` (force) and `qb`
/// (velocity) buffers are the exchange area of the legacy force-based solver
/// interface; the state-space interface goes through them in
/// `to_descriptor`/`from_descriptor`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct GenericVariable {
    mass: Real,
    inv_mass: Real,
    /// The force buffer exchanged with the solver.
    pub fb: Real,
    /// The velocity buffer exchanged with the solver.
    pub qb: Real,
    /// A disabled variable is skipped by the solver.
    pub disabled: bool,
    offset: Option<usize>,
}

impl Default for GenericVariable {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl GenericVariable {
    /// Creates a variable with the given mass.
    pub fn new(mass: Real) -> Self {
        Self {
            mass,
            inv_mass: utils::inv(mass),
            fb: 0.0,
            qb: 0.0,
            disabled: false,
            offset: None,
        }
    }

    /// The mass of this variable.
    pub fn mass(&self) -> Real {
        self.mass
    }

    /// The inverse mass of this variable.
    pub fn inv_mass(&self) -> Real {
        self.inv_mass
    }

    /// The offset assigned to this variable by the descriptor, if it has been
    /// registered.
    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub(crate) fn set_offset(&mut self, offset: usize) {
        self.offset = Some(offset);
    }

    /// Accumulates `mass * qb` into the force buffer (the `M*v` increment of
    /// the legacy solve path).
    pub fn increment_mass_times_vel(&mut self) {
        self.fb += self.mass * self.qb;
    }
}

#[cfg(test)]
mod test {
    use super::GenericVariable;

    #[test]
    fn unit_mass_round_trip() {
        let mut var = GenericVariable::default();
        assert_eq!(var.mass(), 1.0);
        assert_eq!(var.inv_mass(), 1.0);

        var.qb = 2.5;
        var.increment_mass_times_vel();
        assert_eq!(var.fb, 2.5);
    }
}

//! Miscellaneous utilities.

use crate::math::Real;
use num_traits::Zero;

/// Computes the inverse of `x`, or zero if `x` is zero.
pub fn inv(x: Real) -> Real {
    if x.is_zero() {
        0.0
    } else {
        1.0 / x
    }
}

#[cfg(test)]
mod test {
    use super::inv;

    #[test]
    fn inv_of_zero_is_zero() {
        assert_eq!(inv(0.0), 0.0);
        assert_eq!(inv(2.0), 0.5);
    }
}

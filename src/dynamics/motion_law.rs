//! Scalar functions of simulation time driving the motor constraints.

use crate::math::Real;

// Step used by the finite-difference fallback derivatives.
const DIFF_STEP: Real = 1.0e-7;

/// A scalar function of simulation time.
///
/// Motion laws drive the motor constraints: a position/angle setpoint, a speed
/// setpoint, or a force/torque command, depending on the motor type. Sampling
/// must be side-effect free: a law may be evaluated any number of times per
/// step, by the motor and by external consumers (plotting, logging) holding a
/// clone of the same `Arc`.
///
/// Position-level laws should be C0 continuous, and better C1 continuous too,
/// otherwise they require peaks in accelerations.
pub trait MotionLaw: Send + Sync {
    /// The value of this law at time `t`.
    fn value(&self, t: Real) -> Real;

    /// The first time-derivative of this law at time `t`.
    ///
    /// The default implementation uses a central finite difference; implement
    /// this for laws with a cheap analytic derivative.
    fn deriv(&self, t: Real) -> Real {
        (self.value(t + DIFF_STEP) - self.value(t - DIFF_STEP)) / (2.0 * DIFF_STEP)
    }

    /// The second time-derivative of this law at time `t`.
    fn deriv2(&self, t: Real) -> Real {
        (self.value(t + DIFF_STEP) - 2.0 * self.value(t) + self.value(t - DIFF_STEP))
            / (DIFF_STEP * DIFF_STEP)
    }
}

/// A constant-valued motion law.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct ConstantLaw(pub Real);

impl MotionLaw for ConstantLaw {
    fn value(&self, _: Real) -> Real {
        self.0
    }

    fn deriv(&self, _: Real) -> Real {
        0.0
    }

    fn deriv2(&self, _: Real) -> Real {
        0.0
    }
}

/// A linear ramp `y0 + slope * t`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct RampLaw {
    /// The value of the ramp at `t = 0`.
    pub y0: Real,
    /// The rate of change of the ramp.
    pub slope: Real,
}

impl RampLaw {
    /// Creates a ramp law starting at `y0` with the given `slope`.
    pub fn new(y0: Real, slope: Real) -> Self {
        Self { y0, slope }
    }
}

impl MotionLaw for RampLaw {
    fn value(&self, t: Real) -> Real {
        self.y0 + self.slope * t
    }

    fn deriv(&self, _: Real) -> Real {
        self.slope
    }

    fn deriv2(&self, _: Real) -> Real {
        0.0
    }
}

/// A sinusoidal law `amplitude * sin(angular_freq * t + phase)`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct SineLaw {
    /// The amplitude of the sinusoid.
    pub amplitude: Real,
    /// The angular frequency, in rad/s.
    pub angular_freq: Real,
    /// The phase, in rad.
    pub phase: Real,
}

impl SineLaw {
    /// Creates a sinusoidal law with the given amplitude, angular frequency and phase.
    pub fn new(amplitude: Real, angular_freq: Real, phase: Real) -> Self {
        Self {
            amplitude,
            angular_freq,
            phase,
        }
    }
}

impl MotionLaw for SineLaw {
    fn value(&self, t: Real) -> Real {
        self.amplitude * (self.angular_freq * t + self.phase).sin()
    }

    fn deriv(&self, t: Real) -> Real {
        self.amplitude * self.angular_freq * (self.angular_freq * t + self.phase).cos()
    }

    fn deriv2(&self, t: Real) -> Real {
        -self.amplitude
            * self.angular_freq
            * self.angular_freq
            * (self.angular_freq * t + self.phase).sin()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    // Checks an analytic derivative against the trait's finite-difference
    // fallback.
    struct Opaque<L>(L);

    impl<L: MotionLaw> MotionLaw for Opaque<L> {
        fn value(&self, t: Real) -> Real {
            self.0.value(t)
        }
    }

    #[test]
    fn analytic_derivatives_match_finite_differences() {
        let laws: [(&dyn MotionLaw, &dyn MotionLaw); 3] = [
            (&ConstantLaw(3.0), &Opaque(ConstantLaw(3.0))),
            (&RampLaw::new(0.5, 2.0), &Opaque(RampLaw::new(0.5, 2.0))),
            (
                &SineLaw::new(1.5, 3.0, 0.2),
                &Opaque(SineLaw::new(1.5, 3.0, 0.2)),
            ),
        ];

        for (law, opaque) in laws {
            for i in 0..10 {
                let t = i as Real * 0.37;
                assert_relative_eq!(law.deriv(t), opaque.deriv(t), epsilon = 1.0e-5);
            }
        }
    }

    #[test]
    fn sine_second_derivative() {
        let law = SineLaw::new(2.0, 1.5, 0.0);
        for i in 0..10 {
            let t = i as Real * 0.21;
            assert_relative_eq!(
                law.deriv2(t),
                -1.5 * 1.5 * law.value(t),
                epsilon = 1.0e-10
            );
        }
    }
}

//! Selection of the relative degrees of freedom locked by a motor.

bitflags::bitflags! {
    /// A bit mask identifying relative degrees of freedom between the two
    /// attachment frames.
    #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
    pub struct DofMask: u8 {
        /// The translational degree of freedom along the local X axis.
        const X = 1 << 0;
        /// The translational degree of freedom along the local Y axis.
        const Y = 1 << 1;
        /// The translational degree of freedom along the local Z axis.
        const Z = 1 << 2;
        /// The angular degree of freedom about the local X axis.
        const ANG_X = 1 << 3;
        /// The angular degree of freedom about the local Y axis.
        const ANG_Y = 1 << 4;
        /// The angular degree of freedom about the local Z axis.
        const ANG_Z = 1 << 5;
    }
}

#[cfg(feature = "serde-serialize")]
impl serde::Serialize for DofMask {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serde::Serialize::serialize(&self.bits(), serializer)
    }
}

#[cfg(feature = "serde-serialize")]
impl<'de> serde::Deserialize<'de> for DofMask {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        <u8 as serde::Deserialize>::deserialize(deserializer).map(DofMask::from_bits_truncate)
    }
}

/// One relative degree of freedom between the two attachment frames.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum DofAxis {
    /// Translation along the local X axis.
    X = 0,
    /// Translation along the local Y axis.
    Y,
    /// Translation along the local Z axis.
    Z,
    /// Rotation about the local X axis.
    AngX,
    /// Rotation about the local Y axis.
    AngY,
    /// Rotation about the local Z axis.
    AngZ,
}

impl From<DofAxis> for DofMask {
    fn from(axis: DofAxis) -> Self {
        DofMask::from_bits(1 << axis as usize).unwrap()
    }
}

impl DofMask {
    /// The six axes in row order (translations first, then rotations).
    pub const ALL_AXES: [DofAxis; 6] = [
        DofAxis::X,
        DofAxis::Y,
        DofAxis::Z,
        DofAxis::AngX,
        DofAxis::AngY,
        DofAxis::AngZ,
    ];

    /// Iterates over the locked axes, in row order.
    pub fn locked_axes(self) -> impl Iterator<Item = DofAxis> {
        Self::ALL_AXES
            .into_iter()
            .filter(move |axis| self.contains(DofMask::from(*axis)))
    }
}

/// How a linear motor guides the five non-motorized relative degrees of
/// freedom.
///
/// The X direction is the motorized one, and is never affected by this
/// option.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum GuideConstraint {
    /// No guide: all non-motorized degrees of freedom are left free.
    Free,
    /// A pure prismatic guide: all five non-motorized degrees of freedom are
    /// locked (the default).
    Prismatic,
    /// Locks the transverse translations only, leaving rotations free.
    Spherical,
}

impl GuideConstraint {
    /// The lock mask of this preset. The motorized X bit is never included.
    pub fn mask(self) -> DofMask {
        match self {
            GuideConstraint::Free => DofMask::empty(),
            GuideConstraint::Prismatic => {
                DofMask::Y | DofMask::Z | DofMask::ANG_X | DofMask::ANG_Y | DofMask::ANG_Z
            }
            GuideConstraint::Spherical => DofMask::Y | DofMask::Z,
        }
    }
}

/// How a rotational motor constrains the five non-motorized relative degrees
/// of freedom.
///
/// The Z direction is the motorized one, and is never affected by this
/// option.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum SpindleConstraint {
    /// No bearing: all non-motorized degrees of freedom are left free.
    Free,
    /// A rigid bearing, like a revolute joint (the default).
    Revolute,
    /// A bearing that allows sliding along the spindle axis.
    Cylindrical,
    /// An Oldham-style coupling: only the transverse rotations are locked.
    Oldham,
}

impl SpindleConstraint {
    /// The lock mask of this preset. The motorized ANG_Z bit is never
    /// included.
    pub fn mask(self) -> DofMask {
        match self {
            SpindleConstraint::Free => DofMask::empty(),
            SpindleConstraint::Revolute => {
                DofMask::X | DofMask::Y | DofMask::Z | DofMask::ANG_X | DofMask::ANG_Y
            }
            SpindleConstraint::Cylindrical => {
                DofMask::X | DofMask::Y | DofMask::ANG_X | DofMask::ANG_Y
            }
            SpindleConstraint::Oldham => DofMask::ANG_X | DofMask::ANG_Y,
        }
    }
}

/// Builds the guide mask from explicit per-DOF flags (linear motors).
pub(crate) fn guide_mask(mc_y: bool, mc_z: bool, mc_rx: bool, mc_ry: bool, mc_rz: bool) -> DofMask {
    let mut mask = DofMask::empty();
    mask.set(DofMask::Y, mc_y);
    mask.set(DofMask::Z, mc_z);
    mask.set(DofMask::ANG_X, mc_rx);
    mask.set(DofMask::ANG_Y, mc_ry);
    mask.set(DofMask::ANG_Z, mc_rz);
    mask
}

/// Builds the spindle mask from explicit per-DOF flags (rotational motors).
pub(crate) fn spindle_mask(
    mc_x: bool,
    mc_y: bool,
    mc_z: bool,
    mc_rx: bool,
    mc_ry: bool,
) -> DofMask {
    let mut mask = DofMask::empty();
    mask.set(DofMask::X, mc_x);
    mask.set(DofMask::Y, mc_y);
    mask.set(DofMask::Z, mc_z);
    mask.set(DofMask::ANG_X, mc_rx);
    mask.set(DofMask::ANG_Y, mc_ry);
    mask
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn presets_match_explicit_flags() {
        assert_eq!(
            GuideConstraint::Free.mask(),
            guide_mask(false, false, false, false, false)
        );
        assert_eq!(
            GuideConstraint::Prismatic.mask(),
            guide_mask(true, true, true, true, true)
        );
        assert_eq!(
            GuideConstraint::Spherical.mask(),
            guide_mask(true, true, false, false, false)
        );

        assert_eq!(
            SpindleConstraint::Free.mask(),
            spindle_mask(false, false, false, false, false)
        );
        assert_eq!(
            SpindleConstraint::Revolute.mask(),
            spindle_mask(true, true, true, true, true)
        );
        assert_eq!(
            SpindleConstraint::Cylindrical.mask(),
            spindle_mask(true, true, false, true, true)
        );
        assert_eq!(
            SpindleConstraint::Oldham.mask(),
            spindle_mask(false, false, false, true, true)
        );
    }

    #[test]
    fn presets_never_touch_the_motorized_axis() {
        for preset in [
            GuideConstraint::Free,
            GuideConstraint::Prismatic,
            GuideConstraint::Spherical,
        ] {
            assert!(!preset.mask().contains(DofMask::X));
        }
        for preset in [
            SpindleConstraint::Free,
            SpindleConstraint::Revolute,
            SpindleConstraint::Cylindrical,
            SpindleConstraint::Oldham,
        ] {
            assert!(!preset.mask().contains(DofMask::ANG_Z));
        }
    }

    #[test]
    fn locked_axes_iterate_in_row_order() {
        let mask = DofMask::X | DofMask::Z | DofMask::ANG_Z;
        let axes: Vec<_> = mask.locked_axes().collect();
        assert_eq!(axes, vec![DofAxis::X, DofAxis::Z, DofAxis::AngZ]);
    }
}

#![allow(non_camel_case_types)]
#![allow(non_upper_case_globals)]
//! Scalar FFI types and encodings from `svdpi.h`

use crate::DpiError;

// typedef uint8_t svScalar;
pub type svScalar = u8;

// typedef svScalar svBit; /* scalar */
pub type svBit = svScalar;

// typedef svScalar svLogic; /* scalar */
pub type svLogic = svScalar;

// #define sv_0 0
pub const sv_0: svScalar = 0;

// #define sv_1 1
pub const sv_1: svScalar = 1;

// #define sv_z 2 /* representation of 4-st scalar z */
pub const sv_z: svScalar = 2;

// #define sv_x 3 /* representation of 4-st scalar x */
pub const sv_x: svScalar = 3;

/// A single 4-state value as carried by `svLogic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scalar {
    Zero,
    One,
    Z,
    X,
}

impl Scalar {
    pub fn from_raw(raw: svScalar) -> Result<Self, DpiError> {
        match raw {
            sv_0 => Ok(Scalar::Zero),
            sv_1 => Ok(Scalar::One),
            sv_z => Ok(Scalar::Z),
            sv_x => Ok(Scalar::X),
            other => Err(DpiError::InvalidScalar(other)),
        }
    }

    pub fn to_raw(self) -> svScalar {
        match self {
            Scalar::Zero => sv_0,
            Scalar::One => sv_1,
            Scalar::Z => sv_z,
            Scalar::X => sv_x,
        }
    }

    /// True for `0` and `1`, the values a 2-state `svBit` can hold.
    pub fn is_known(self) -> bool {
        matches!(self, Scalar::Zero | Scalar::One)
    }

    /// Collapse to a 2-state value, if this scalar is known.
    pub fn to_bool(self) -> Option<bool> {
        match self {
            Scalar::Zero => Some(false),
            Scalar::One => Some(true),
            Scalar::Z | Scalar::X => None,
        }
    }

    /// Validate a raw `svBit`; only `sv_0` and `sv_1` are legal.
    pub fn from_bit(raw: svBit) -> Result<Self, DpiError> {
        match raw {
            sv_0 => Ok(Scalar::Zero),
            sv_1 => Ok(Scalar::One),
            other => Err(DpiError::InvalidBit(other)),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        if value { Scalar::One } else { Scalar::Zero }
    }
}

impl TryFrom<svScalar> for Scalar {
    type Error = DpiError;

    fn try_from(raw: svScalar) -> Result<Self, Self::Error> {
        Scalar::from_raw(raw)
    }
}

impl From<Scalar> for svScalar {
    fn from(value: Scalar) -> Self {
        value.to_raw()
    }
}

impl std::fmt::Display for Scalar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let c = match self {
            Scalar::Zero => '0',
            Scalar::One => '1',
            Scalar::Z => 'z',
            Scalar::X => 'x',
        };
        write!(f, "{c}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodings_match_svdpi() {
        assert_eq!(Scalar::Zero.to_raw(), 0);
        assert_eq!(Scalar::One.to_raw(), 1);
        assert_eq!(Scalar::Z.to_raw(), 2);
        assert_eq!(Scalar::X.to_raw(), 3);
    }

    #[test]
    fn raw_values_above_x_are_rejected() {
        for raw in 4..=u8::MAX {
            assert!(matches!(
                Scalar::from_raw(raw),
                Err(DpiError::InvalidScalar(r)) if r == raw
            ));
        }
    }

    #[test]
    fn bit_rejects_four_state_values() {
        assert_eq!(Scalar::from_bit(sv_1).unwrap(), Scalar::One);
        assert!(matches!(Scalar::from_bit(sv_z), Err(DpiError::InvalidBit(2))));
        assert!(matches!(Scalar::from_bit(sv_x), Err(DpiError::InvalidBit(3))));
    }

    #[test]
    fn unknown_values_have_no_bool() {
        assert_eq!(Scalar::X.to_bool(), None);
        assert_eq!(Scalar::Z.to_bool(), None);
        assert!(!Scalar::X.is_known());
        assert_eq!(Scalar::from(true).to_bool(), Some(true));
    }

    #[test]
    fn displays_like_verilog_literals() {
        let s: String = [Scalar::Zero, Scalar::One, Scalar::Z, Scalar::X]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(s, "01zx");
    }
}

//! Descriptor table of the DPI primitive types.

use std::{fmt, mem::size_of, str::FromStr};

use crate::{DpiError, dpi};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signedness {
    Signed,
    Unsigned,
    NotApplicable,
}

impl fmt::Display for Signedness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Signedness::Signed => "signed",
            Signedness::Unsigned => "unsigned",
            Signedness::NotApplicable => "n/a",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DpiType {
    Byte,
    ShortInt,
    LongInt,
    Real,
    ShortReal,
    CHandle,
    String,
    Bit,
    Logic,
    Reg,
}

impl DpiType {
    /// All types, in the order they are declared in `dpi.h`.
    pub const ALL: [DpiType; 10] = [
        DpiType::Byte,
        DpiType::ShortInt,
        DpiType::LongInt,
        DpiType::Real,
        DpiType::ShortReal,
        DpiType::CHandle,
        DpiType::String,
        DpiType::Bit,
        DpiType::Logic,
        DpiType::Reg,
    ];

    /// SystemVerilog name, which is also the C typedef name.
    pub fn name(self) -> &'static str {
        match self {
            DpiType::Byte => "byte",
            DpiType::ShortInt => "shortint",
            DpiType::LongInt => "longint",
            DpiType::Real => "real",
            DpiType::ShortReal => "shortreal",
            DpiType::CHandle => "chandle",
            DpiType::String => "string",
            DpiType::Bit => "bit",
            DpiType::Logic => "logic",
            DpiType::Reg => "reg",
        }
    }

    /// C spelling emitted in the generated header.
    pub fn c_type(self) -> &'static str {
        match self {
            DpiType::Byte => "signed char",
            DpiType::ShortInt => "short",
            DpiType::LongInt => "long long",
            DpiType::Real => "double",
            DpiType::ShortReal => "float",
            DpiType::CHandle => "void *",
            DpiType::String => "unsigned char *",
            DpiType::Bit | DpiType::Logic | DpiType::Reg => "unsigned char",
        }
    }

    /// C spellings with the same width and signedness as [`Self::c_type`].
    fn c_equivalents(self) -> &'static [&'static str] {
        match self {
            DpiType::Byte => &["signed char", "int8_t"],
            DpiType::ShortInt => &[
                "short",
                "short int",
                "signed short",
                "signed short int",
                "int16_t",
            ],
            DpiType::LongInt => &[
                "long long",
                "long long int",
                "signed long long",
                "signed long long int",
                "int64_t",
            ],
            DpiType::Real => &["double"],
            DpiType::ShortReal => &["float"],
            DpiType::CHandle => &["void *", "const void *"],
            DpiType::String => &[
                "unsigned char *",
                "char *",
                "const char *",
                "const unsigned char *",
            ],
            DpiType::Bit => &["unsigned char", "uint8_t", "svBit", "svScalar"],
            DpiType::Logic | DpiType::Reg => &["unsigned char", "uint8_t", "svLogic", "svScalar"],
        }
    }

    /// Whether a C declaration of this type with `spelling` is ABI compatible.
    ///
    /// `spelling` is compared after whitespace normalisation, see
    /// [`normalize_c_type`].
    pub fn accepts_c_type(self, spelling: &str) -> bool {
        let spelling = normalize_c_type(spelling);
        self.c_equivalents().iter().any(|c| *c == spelling)
    }

    /// Whether `spelling` has the right width but a signedness that depends
    /// on the target, like plain `char` for `byte`.
    pub fn is_implementation_defined_c_type(self, spelling: &str) -> bool {
        self == DpiType::Byte && normalize_c_type(spelling) == "char"
    }

    /// Storage width in bits, pointer width for handles and strings.
    pub fn width_bits(self) -> usize {
        match self {
            DpiType::Byte | DpiType::Bit | DpiType::Logic | DpiType::Reg => 8,
            DpiType::ShortInt => 16,
            DpiType::ShortReal => 32,
            DpiType::LongInt | DpiType::Real => 64,
            DpiType::CHandle | DpiType::String => usize::BITS as usize,
        }
    }

    /// Bits of information carried, as opposed to bits of storage.
    pub fn logical_bits(self) -> usize {
        match self {
            DpiType::Bit | DpiType::Logic | DpiType::Reg => 1,
            other => other.width_bits(),
        }
    }

    pub fn signedness(self) -> Signedness {
        match self {
            DpiType::Byte | DpiType::ShortInt | DpiType::LongInt => Signedness::Signed,
            DpiType::Bit | DpiType::Logic | DpiType::Reg => Signedness::Unsigned,
            DpiType::Real | DpiType::ShortReal | DpiType::CHandle | DpiType::String => {
                Signedness::NotApplicable
            }
        }
    }

    /// Number of states of a scalar type, `None` for non-scalars.
    pub fn states(self) -> Option<u8> {
        match self {
            DpiType::Bit => Some(2),
            DpiType::Logic | DpiType::Reg => Some(4),
            _ => None,
        }
    }

    /// `size_of` the Rust alias on the compiling target.
    pub fn host_size(self) -> usize {
        match self {
            DpiType::Byte => size_of::<dpi::byte>(),
            DpiType::ShortInt => size_of::<dpi::shortint>(),
            DpiType::LongInt => size_of::<dpi::longint>(),
            DpiType::Real => size_of::<dpi::real>(),
            DpiType::ShortReal => size_of::<dpi::shortreal>(),
            DpiType::CHandle => size_of::<dpi::chandle>(),
            DpiType::String => size_of::<dpi::string>(),
            DpiType::Bit => size_of::<dpi::bit>(),
            DpiType::Logic => size_of::<dpi::logic>(),
            DpiType::Reg => size_of::<dpi::reg>(),
        }
    }
}

impl fmt::Display for DpiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DpiType {
    type Err = DpiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DpiType::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| DpiError::UnknownType(s.to_string()))
    }
}

/// Collapse runs of whitespace and attach `*` to the type: `void*` and
/// `void  *` both become `void *`.
pub fn normalize_c_type(spelling: &str) -> String {
    let spaced = spelling.replace('*', " * ");
    let mut out = String::with_capacity(spelling.len());
    for word in spaced.split_whitespace() {
        let needs_space = match out.chars().last() {
            None => false,
            Some('*') => word == "*",
            Some(_) => true,
        };
        if needs_space {
            out.push(' ');
        }
        out.push_str(word);
    }
    out
}

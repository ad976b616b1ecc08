//! SystemVerilog DPI primitive types for native code called from, or calling
//! into, a simulator.
//!
//! [`dpi`] holds the type aliases themselves, [`svdpi`] the scalar encodings
//! from `svdpi.h`, [`table`] a runtime description of every alias and
//! [`header`] renders and checks the matching C header.

use std::{io, str::Utf8Error};

use thiserror::Error;

pub mod dpi;
pub mod header;
pub mod svdpi;
pub mod table;

pub use header::{HeaderConfig, HeaderReport, TypedefStatus, check_header, render, write_header};
pub use svdpi::Scalar;
pub use table::{DpiType, Signedness};

#[derive(Error, Debug)]
pub enum DpiError {
    #[error("string is nullptr")]
    NullString,

    #[error("failed to decode UTF8 string - {0}")]
    InvalidUtf8(#[from] Utf8Error),

    #[error("chandle is nullptr")]
    NullHandle,

    #[error("invalid 4-state scalar {0}")]
    InvalidScalar(u8),

    #[error("invalid 2-state bit {0}")]
    InvalidBit(u8),

    #[error("invalid include guard {0:?}")]
    InvalidGuard(String),

    #[error("invalid include {0:?}")]
    InvalidInclude(String),

    #[error("unknown DPI type {0:?}")]
    UnknownType(String),

    #[error("failed to generate header - {0}")]
    Cbindgen(#[from] cbindgen::Error),

    #[error("failed to write header - {0}")]
    Io(#[from] io::Error),
}

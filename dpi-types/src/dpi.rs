#![allow(non_camel_case_types)]
//! SystemVerilog DPI primitive types.
//!
//! Each alias has the width and signedness the DPI calling convention
//! expects for the SystemVerilog type of the same name. A mismatch is not
//! caught by the simulator; it silently corrupts arguments, so every alias is
//! pinned down by a compile-time assertion below.

use std::{
    ffi::{CStr, c_char, c_double, c_float, c_longlong, c_schar, c_short, c_uchar, c_void},
    mem::size_of,
    str::Utf8Error,
};

use crate::DpiError;

/// `byte`: 8-bit signed integer.
pub type byte = c_schar;
/// `shortint`: 16-bit signed integer.
pub type shortint = c_short;
/// `longint`: 64-bit signed integer.
pub type longint = c_longlong;
/// `real`: IEEE-754 double precision.
pub type real = c_double;
/// `shortreal`: IEEE-754 single precision.
pub type shortreal = c_float;
/// `chandle`: opaque native pointer, never dereferenced by the simulator.
pub type chandle = *mut c_void;
/// `string`: pointer to a NUL-terminated byte sequence.
pub type string = *mut c_uchar;
/// `bit`: 2-state scalar stored in one byte.
pub type bit = c_uchar;
/// `logic`: 4-state scalar stored in one byte.
pub type logic = c_uchar;
/// `reg`: 4-state scalar storage, identical to `logic`.
pub type reg = c_uchar;

// ==== Layout Assertions ======================================================

const _: () = assert!(size_of::<byte>() == 1);
const _: () = assert!(size_of::<shortint>() == 2);
const _: () = assert!(size_of::<longint>() == 8);
const _: () = assert!(size_of::<real>() == 8);
const _: () = assert!(size_of::<shortreal>() == 4);
const _: () = assert!(size_of::<chandle>() == size_of::<usize>());
const _: () = assert!(size_of::<string>() == size_of::<usize>());
const _: () = assert!(size_of::<bit>() == 1);
const _: () = assert!(size_of::<logic>() == 1);
const _: () = assert!(size_of::<reg>() == 1);

const _: () = assert!(byte::MIN < 0);
const _: () = assert!(shortint::MIN < 0);
const _: () = assert!(longint::MIN < 0);
const _: () = assert!(bit::MIN == 0);
const _: () = assert!(logic::MIN == 0);
const _: () = assert!(reg::MIN == 0);

const _: () = assert!(real::MANTISSA_DIGITS == 53);
const _: () = assert!(shortreal::MANTISSA_DIGITS == 24);

// ==== Scalars ================================================================

pub fn bit_to_bool(val: bit) -> bool {
    val != 0
}

pub fn bool_to_bit(val: bool) -> bit {
    val as bit
}

// ==== Strings ================================================================

fn utf8err_to_dpi(e: Utf8Error) -> DpiError {
    DpiError::InvalidUtf8(e)
}

/// Borrow a DPI `string` argument as `&str`.
///
/// # Safety
/// `s` must be null or point to a NUL-terminated sequence that stays valid
/// and unmodified for `'a`.
pub unsafe fn str_from_dpi<'a>(s: string) -> Result<&'a str, DpiError> {
    if s.is_null() {
        return Err(DpiError::NullString);
    }
    unsafe { CStr::from_ptr(s as *const c_char).to_str().map_err(utf8err_to_dpi) }
}

/// Like [`str_from_dpi`], but null and empty strings are `None`.
///
/// # Safety
/// Same as [`str_from_dpi`].
pub unsafe fn optional_str_from_dpi<'a>(s: string) -> Result<Option<&'a str>, DpiError> {
    if s.is_null() {
        return Ok(None);
    }
    let str = unsafe { str_from_dpi(s)? };

    if str.is_empty() { Ok(None) } else { Ok(Some(str)) }
}

// ==== Handles ================================================================

/// Leak `obj` into a `chandle` the simulator can hold on to.
pub fn into_chandle<T>(obj: Box<T>) -> chandle {
    Box::into_raw(obj) as chandle
}

/// Run `f` on the object behind a handle without taking ownership of it.
///
/// # Safety
/// `handle` must be null or come from [`into_chandle::<T>`] and not have been
/// reclaimed yet. No other reference to the object may be live.
pub unsafe fn with_chandle<T, R>(
    handle: chandle,
    f: impl FnOnce(&mut T) -> R,
) -> Result<R, DpiError> {
    if handle.is_null() {
        return Err(DpiError::NullHandle);
    }
    let obj = unsafe { &mut *(handle as *mut T) };
    Ok(f(obj))
}

/// Reclaim ownership of the object behind a handle.
///
/// # Safety
/// `handle` must be null or come from [`into_chandle::<T>`], and must not be
/// used again afterwards.
pub unsafe fn from_chandle<T>(handle: chandle) -> Result<Box<T>, DpiError> {
    if handle.is_null() {
        return Err(DpiError::NullHandle);
    }
    Ok(unsafe { Box::from_raw(handle as *mut T) })
}

// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Element data type abstractions.
//!
//! This module defines the [`Element`] trait, which abstracts over the
//! numeric types a patch reader can extract. All reader types are generic
//! over `T: Element`, so the same geometry and I/O code serves every
//! supported element type; the type is fixed when the reader is
//! instantiated and is validated against the file header on every open.
//!
//! # Supported Element Types
//!
//! - `i32` (`i4` descriptor)
//! - `i64` (`i8` descriptor)
//! - `f32` (`f4` descriptor)
//! - `f64` (`f8` descriptor)
//!
//! The implementations below are the complete registry: adding a type means
//! adding one `impl` with the descriptor it maps to.
//!
//! # Type Safety
//!
//! A [`PatchReader`](crate::reader::PatchReader) bound to `T` refuses files
//! whose header descriptor differs from [`Element::DESCR`], including files
//! written with a non-native byte order. Attempting to read a mismatched
//! file results in [`Error::TypeMismatch`](crate::error::Error::TypeMismatch).

use num_traits::Zero;

/// A trait for numeric types that can be extracted from an array file.
///
/// Patch assembly moves raw bytes from disk into a typed output buffer, so
/// an `Element` must be a plain, copyable numeric whose all-zero byte
/// pattern is its zero value. Out-of-bounds regions of a patch are produced
/// by leaving the pre-zeroed buffer untouched.
pub trait Element: Copy + Default + Send + Sync + Zero + 'static {
    /// Array-file type descriptor for this element in native byte order,
    /// e.g. `<i4` for `i32` on a little-endian machine.
    const DESCR: &'static str;
}

/// Element implementation for 32-bit signed integer data.
impl Element for i32 {
    #[cfg(target_endian = "little")]
    const DESCR: &'static str = "<i4";
    #[cfg(target_endian = "big")]
    const DESCR: &'static str = ">i4";
}

/// Element implementation for 64-bit signed integer data.
impl Element for i64 {
    #[cfg(target_endian = "little")]
    const DESCR: &'static str = "<i8";
    #[cfg(target_endian = "big")]
    const DESCR: &'static str = ">i8";
}

/// Element implementation for 32-bit floating point data.
impl Element for f32 {
    #[cfg(target_endian = "little")]
    const DESCR: &'static str = "<f4";
    #[cfg(target_endian = "big")]
    const DESCR: &'static str = ">f4";
}

/// Element implementation for 64-bit floating point data.
impl Element for f64 {
    #[cfg(target_endian = "little")]
    const DESCR: &'static str = "<f8";
    #[cfg(target_endian = "big")]
    const DESCR: &'static str = ">f8";
}

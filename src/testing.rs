// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Test-only `.npy` serialization helpers.
//!
//! Writing the file format is not part of the crate's surface; the tests
//! still need on-disk fixtures, so this module produces byte-exact `.npy`
//! files the same way `numpy.save` does: version 1 or 2 preamble, dict
//! descriptor with sorted keys, space padding up to a 64-byte boundary,
//! then the raw little-endian element bytes.

#![allow(clippy::unwrap_used, reason = "test support file")]

use std::path::Path;
use std::slice;

use num_traits::NumCast;

use crate::element::Element;
use crate::header::MAGIC;

/// Serializes `data` with the given shape as a version 1 `.npy` file.
pub(crate) fn npy_bytes<T: Element>(shape: &[usize], data: &[T]) -> Vec<u8> {
    npy_bytes_version(shape, data, 1)
}

/// Serializes `data` as an `.npy` file with the given major format version.
pub(crate) fn npy_bytes_version<T: Element>(shape: &[usize], data: &[T], major: u8) -> Vec<u8> {
    assert!(matches!(major, 1 | 2));
    assert_eq!(data.len(), shape.iter().product::<usize>());

    let dims = shape
        .iter()
        .map(|dim| dim.to_string())
        .collect::<Vec<_>>()
        .join(", ");
    let shape_repr = if shape.len() == 1 {
        format!("({dims},)")
    } else {
        format!("({dims})")
    };
    let mut descriptor = format!(
        "{{'descr': '{}', 'fortran_order': False, 'shape': {}, }}",
        T::DESCR,
        shape_repr
    );

    let field_width = if major == 1 { 2 } else { 4 };
    let prefix = MAGIC.len() + 2 + field_width;
    let total = (prefix + descriptor.len() + 1).div_ceil(64) * 64;
    for _ in 0..(total - prefix - descriptor.len() - 1) {
        descriptor.push(' ');
    }
    descriptor.push('\n');

    let mut bytes = Vec::with_capacity(total + size_of_val(data));
    bytes.extend_from_slice(MAGIC);
    bytes.push(major);
    bytes.push(0);
    if major == 1 {
        bytes.extend_from_slice(&u16::try_from(descriptor.len()).unwrap().to_le_bytes());
    } else {
        bytes.extend_from_slice(&u32::try_from(descriptor.len()).unwrap().to_le_bytes());
    }
    bytes.extend_from_slice(descriptor.as_bytes());
    // SAFETY: `T` is a plain numeric type, so its buffer is valid to view as bytes.
    let raw = unsafe { slice::from_raw_parts(data.as_ptr().cast::<u8>(), size_of_val(data)) };
    bytes.extend_from_slice(raw);
    bytes
}

/// Writes `data` with the given shape to `path` as a version 1 `.npy` file.
pub(crate) fn write_npy<T: Element>(path: &Path, shape: &[usize], data: &[T]) {
    std::fs::write(path, npy_bytes(shape, data)).unwrap();
}

/// Produces `len` consecutive values starting at zero, like `numpy.arange`.
pub(crate) fn arange<T: Element + NumCast>(len: usize) -> Vec<T> {
    (0..len).map(|i| num_traits::cast(i).unwrap()).collect()
}

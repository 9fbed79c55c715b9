// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

#![allow(clippy::unwrap_used, reason = "test file")]

use super::*;
use crate::element::Element;
use crate::testing::{arange, npy_bytes, npy_bytes_version};

/// Builds a version 1 preamble around an arbitrary descriptor string.
fn raw_header(descriptor: &str) -> Vec<u8> {
    let mut text = String::from(descriptor);
    let total = (10 + text.len() + 1).div_ceil(64) * 64;
    for _ in 0..(total - 10 - descriptor.len() - 1) {
        text.push(' ');
    }
    text.push('\n');

    let mut bytes = Vec::new();
    bytes.extend_from_slice(MAGIC);
    bytes.extend_from_slice(&[1, 0]);
    bytes.extend_from_slice(&u16::try_from(text.len()).unwrap().to_le_bytes());
    bytes.extend_from_slice(text.as_bytes());
    bytes
}

#[test]
fn parse_v1() {
    let bytes = npy_bytes::<i32>(&[2, 3, 4], &arange::<i32>(24));
    let header = NpyHeader::from_reader(&bytes[..]).unwrap();

    assert_eq!(header.descr.to_string(), i32::DESCR);
    assert_eq!(header.descr.size, 4);
    assert_eq!(header.shape, vec![2, 3, 4]);
    assert_eq!(header.data_offset, 128);
}

#[test]
fn parse_v2() {
    let bytes = npy_bytes_version::<f64>(&[3, 5], &arange::<f64>(15), 2);
    let header = NpyHeader::from_reader(&bytes[..]).unwrap();

    assert_eq!(header.descr.to_string(), f64::DESCR);
    assert_eq!(header.shape, vec![3, 5]);
    assert_eq!(header.data_offset % 64, 0);
}

#[test]
fn data_offset_is_aligned() {
    // A long shape tuple pushes the descriptor over one 64-byte block.
    let bytes = npy_bytes::<i64>(&[7, 12, 33, 22], &arange::<i64>(7 * 12 * 33 * 22));
    let header = NpyHeader::from_reader(&bytes[..]).unwrap();

    assert_eq!(header.data_offset, 128);
}

#[test]
fn rejects_magic_mismatch() {
    let mut bytes = npy_bytes::<i32>(&[2, 2], &arange::<i32>(4));
    bytes[0] = b'X';

    let err = NpyHeader::from_reader(&bytes[..]).unwrap_err();
    assert!(matches!(err, ParseHeaderError::MagicMismatch));
}

#[test]
fn rejects_unsupported_version() {
    let mut bytes = npy_bytes::<i32>(&[2, 2], &arange::<i32>(4));
    bytes[6] = 3;

    let err = NpyHeader::from_reader(&bytes[..]).unwrap_err();
    assert!(matches!(
        err,
        ParseHeaderError::UnsupportedVersion { major: 3, minor: 0 }
    ));
}

#[test]
fn rejects_column_major() {
    let bytes = raw_header("{'descr': '<i4', 'fortran_order': True, 'shape': (2, 3), }");

    let err = NpyHeader::from_reader(&bytes[..]).unwrap_err();
    assert!(matches!(err, ParseHeaderError::ColumnMajor));
}

#[test]
fn rejects_rank_below_two() {
    let bytes = npy_bytes::<f32>(&[5], &arange::<f32>(5));

    let err = NpyHeader::from_reader(&bytes[..]).unwrap_err();
    assert!(matches!(err, ParseHeaderError::RankTooSmall(1)));
}

#[test]
fn rejects_unrecognized_key() {
    let bytes =
        raw_header("{'descr': '<i4', 'fortran_order': False, 'shape': (2, 3), 'extra': 1, }");

    let err = NpyHeader::from_reader(&bytes[..]).unwrap_err();
    assert!(matches!(err, ParseHeaderError::MalformedDescriptor(_)));
}

#[test]
fn rejects_missing_key() {
    let bytes = raw_header("{'descr': '<i4', 'shape': (2, 3), }");

    let err = NpyHeader::from_reader(&bytes[..]).unwrap_err();
    assert!(matches!(err, ParseHeaderError::MalformedDescriptor(_)));
}

#[test]
fn rejects_non_dict_descriptor() {
    let bytes = raw_header("('descr', '<i4')");

    let err = NpyHeader::from_reader(&bytes[..]).unwrap_err();
    assert!(matches!(err, ParseHeaderError::MalformedDescriptor(_)));
}

#[test]
fn rejects_truncated_preamble() {
    let bytes = npy_bytes::<i32>(&[2, 2], &arange::<i32>(4));

    let err = NpyHeader::from_reader(&bytes[..40]).unwrap_err();
    assert!(matches!(err, ParseHeaderError::Io(_)));
}

#[test]
fn dtype_parse_and_display() {
    let dtype = DType::parse("<f8").unwrap();
    assert_eq!(
        dtype,
        DType {
            byte_order: '<',
            kind: 'f',
            size: 8
        }
    );
    assert_eq!(dtype.to_string(), "<f8");

    assert!(DType::parse("f8").is_err());
    assert!(DType::parse("<f").is_err());
    assert!(DType::parse("<f0").is_err());
    assert!(DType::parse("").is_err());
}

// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! `.npy` preamble parsing.
//!
//! An `.npy` file starts with the magic string `\x93NUMPY`, a two-byte
//! format version, a little-endian length field (two bytes for version 1,
//! four bytes for version 2) and a textual descriptor: a Python dict
//! literal carrying the element type (`'descr'`), the storage order
//! (`'fortran_order'`) and the array shape (`'shape'`). The descriptor is
//! space-padded so that the raw array data begins at a multiple of 64
//! bytes.
//!
//! This module decodes that preamble into an [`NpyHeader`]. Only row-major
//! (C-order) files are accepted, and the array must have at least two axes:
//! the leading selection axis plus one or more spatial axes.

#[cfg(test)]
mod tests;

use std::fmt;
use std::io::Read;
use std::str;

use byteorder::{LittleEndian, ReadBytesExt};
use num_traits::ToPrimitive;
use py_literal::Value as PyValue;
use thiserror::Error;
use tracing::debug;

/// Magic string identifying an `.npy` file.
pub(crate) const MAGIC: &[u8; 6] = b"\x93NUMPY";

/// Errors produced while decoding the file preamble.
#[derive(Error, Debug)]
pub enum ParseHeaderError {
    /// The file does not start with the `\x93NUMPY` magic string.
    #[error("not an npy file: magic string mismatch")]
    MagicMismatch,

    /// The format version is not 1.0 or 2.0.
    #[error("unsupported npy format version {major}.{minor}")]
    UnsupportedVersion {
        /// Major version byte found in the file
        major: u8,
        /// Minor version byte found in the file
        minor: u8,
    },

    /// The descriptor is not the dict literal this crate understands.
    #[error("malformed header descriptor: {0}")]
    MalformedDescriptor(String),

    /// The descriptor is not parseable as a Python literal at all.
    #[error("malformed header descriptor: {0}")]
    DescriptorSyntax(#[from] py_literal::ParseError),

    /// The file stores its array in Fortran (column-major) order.
    #[error("only C-order (row-major) files are supported")]
    ColumnMajor,

    /// The array does not have a leading axis plus at least one spatial axis.
    #[error("array of rank {0} too small: need a leading axis plus at least one spatial axis")]
    RankTooSmall(usize),

    /// An I/O failure while reading the preamble bytes.
    #[error("I/O error reading header: {0}")]
    Io(#[from] std::io::Error),
}

/// Parsed element-type descriptor: byte-order mark, type kind and size.
///
/// Mirrors the NumPy dtype string, e.g. `<f4` for little-endian 32-bit
/// floats or `|i1` for single-byte integers (where byte order is
/// irrelevant).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DType {
    /// Byte-order mark: `<` (little), `>` (big) or `|` (not applicable).
    pub byte_order: char,
    /// Type-kind character, e.g. `i`, `u`, `f`.
    pub kind: char,
    /// Element size in bytes.
    pub size: usize,
}

impl DType {
    fn parse(descr: &str) -> Result<Self, ParseHeaderError> {
        let malformed = || ParseHeaderError::MalformedDescriptor(format!("bad dtype '{descr}'"));
        let mut chars = descr.chars();
        let byte_order = chars.next().ok_or_else(malformed)?;
        if !matches!(byte_order, '<' | '>' | '|') {
            return Err(malformed());
        }
        let kind = chars.next().ok_or_else(malformed)?;
        let size: usize = chars.as_str().parse().map_err(|_| malformed())?;
        if size == 0 {
            return Err(malformed());
        }
        Ok(DType {
            byte_order,
            kind,
            size,
        })
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.byte_order, self.kind, self.size)
    }
}

/// Decoded `.npy` preamble.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NpyHeader {
    /// Element type stored in the file.
    pub descr: DType,
    /// Full on-disk shape; axis 0 is the leading (selection) axis.
    pub shape: Vec<usize>,
    /// Absolute byte offset of the first array element.
    pub data_offset: u64,
}

impl NpyHeader {
    /// Decodes the preamble from the start of `reader`.
    ///
    /// # Errors
    ///
    /// Fails on a magic or version mismatch, a malformed or unrecognized
    /// descriptor, a column-major layout, a rank below 2, or any I/O error
    /// while reading the preamble bytes.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self, ParseHeaderError> {
        let mut prefix = [0u8; 8];
        reader.read_exact(&mut prefix)?;
        if &prefix[..6] != MAGIC {
            return Err(ParseHeaderError::MagicMismatch);
        }
        let (major, minor) = (prefix[6], prefix[7]);
        let (field_width, descriptor_len) = match (major, minor) {
            (1, 0) => (2u64, u64::from(reader.read_u16::<LittleEndian>()?)),
            (2, 0) => (4u64, u64::from(reader.read_u32::<LittleEndian>()?)),
            _ => return Err(ParseHeaderError::UnsupportedVersion { major, minor }),
        };

        let byte_count = usize::try_from(descriptor_len).map_err(|_| {
            ParseHeaderError::MalformedDescriptor("descriptor length overflows usize".into())
        })?;
        let mut descriptor = vec![0u8; byte_count];
        reader.read_exact(&mut descriptor)?;
        let descriptor = str::from_utf8(&descriptor).map_err(|_| {
            ParseHeaderError::MalformedDescriptor("descriptor is not valid UTF-8".into())
        })?;

        let (descr, fortran_order, shape) = parse_descriptor(descriptor)?;
        if fortran_order {
            return Err(ParseHeaderError::ColumnMajor);
        }
        if shape.len() < 2 {
            return Err(ParseHeaderError::RankTooSmall(shape.len()));
        }

        let data_offset = 8 + field_width + descriptor_len;
        debug!(
            "parsed npy header: dtype {}, shape {:?}, data at {}",
            descr, shape, data_offset
        );
        Ok(NpyHeader {
            descr,
            shape,
            data_offset,
        })
    }
}

fn parse_descriptor(text: &str) -> Result<(DType, bool, Vec<usize>), ParseHeaderError> {
    let malformed = |what: &str| ParseHeaderError::MalformedDescriptor(what.into());
    let value: PyValue = text.trim_end().parse()?;
    let PyValue::Dict(entries) = value else {
        return Err(malformed("descriptor is not a dict"));
    };

    let mut descr = None;
    let mut fortran_order = None;
    let mut shape = None;
    for (key, value) in entries {
        let PyValue::String(key) = key else {
            return Err(malformed("descriptor key is not a string"));
        };
        match key.as_str() {
            "descr" => {
                let PyValue::String(s) = value else {
                    return Err(malformed("'descr' is not a string"));
                };
                descr = Some(DType::parse(&s)?);
            }
            "fortran_order" => {
                let PyValue::Boolean(b) = value else {
                    return Err(malformed("'fortran_order' is not a bool"));
                };
                fortran_order = Some(b);
            }
            "shape" => {
                let PyValue::Tuple(dims) = value else {
                    return Err(malformed("'shape' is not a tuple"));
                };
                let dims = dims
                    .iter()
                    .map(|dim| match dim {
                        PyValue::Integer(dim) => dim.to_usize(),
                        _ => None,
                    })
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| malformed("'shape' entry is not a non-negative integer"))?;
                shape = Some(dims);
            }
            _ => {
                return Err(ParseHeaderError::MalformedDescriptor(format!(
                    "unrecognized descriptor key '{key}'"
                )));
            }
        }
    }

    match (descr, fortran_order, shape) {
        (Some(descr), Some(fortran_order), Some(shape)) => Ok((descr, fortran_order, shape)),
        _ => Err(malformed("missing descriptor key")),
    }
}

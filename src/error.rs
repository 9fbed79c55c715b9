// Copyright (c) 2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Error types for the `npy_patch` crate.
//!
//! Every error is fatal to the call that produced it: nothing is retried
//! internally and nothing is absorbed. A failed call leaves the reader's
//! cached geometry exactly as it was, so debug accessors never observe
//! partial state.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::header::ParseHeaderError;

/// The error type for patch extraction operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Returned when the backing file cannot be opened or read.
    #[error("failed to access {path}: {source}")]
    FileAccess {
        /// Path of the file the operation was addressing
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Returned when the file preamble is not a valid row-major array header.
    #[error(transparent)]
    HeaderInvalid(ParseHeaderError),

    /// Returned when the on-disk element type differs from the reader's
    /// element type.
    ///
    /// Each reader is instantiated for one concrete element type; a file
    /// holding any other element type (or a non-native byte order) is
    /// rejected rather than silently reinterpreted.
    #[error("file stores '{found}' elements, reader expects '{expected}'")]
    TypeMismatch {
        /// Descriptor bound by the reader's element type
        expected: String,
        /// Descriptor found in the file header
        found: String,
    },

    /// Returned when an input vector's length does not match the file's
    /// spatial rank.
    #[error("{what} has length {found}, expected {expected}")]
    ShapeMismatch {
        /// Name of the offending input vector
        what: &'static str,
        /// Required length for this file
        expected: usize,
        /// Length actually supplied
        found: usize,
    },

    /// Returned when a patch extent or step is zero on some axis.
    #[error("patch extents and strides must be positive, found 0 on axis {axis}")]
    ExtentInvalid {
        /// Spatial axis carrying the zero value
        axis: usize,
    },

    /// Returned when an explicit padding value reaches the patch extent on
    /// its axis.
    #[error("padding {pad} on axis {axis} must be smaller than the patch extent {extent}")]
    PaddingInvalid {
        /// Spatial axis carrying the offending value
        axis: usize,
        /// Requested padding
        pad: usize,
        /// Patch extent along that axis
        extent: usize,
    },

    /// Returned when the linear patch ordinal falls outside the patch grid.
    #[error("patch ordinal {pnum} out of range for a grid of {total} patches")]
    PnumOutOfRange {
        /// Effective ordinal, including any folded grid offset
        pnum: usize,
        /// Number of positions in the patch grid
        total: usize,
    },

    /// Returned when a leading-axis index is outside the file's leading axis.
    #[error("leading-axis index {index} out of range for axis of size {size}")]
    QidxOutOfRange {
        /// Offending index
        index: usize,
        /// Size of the file's leading axis
        size: usize,
    },
}

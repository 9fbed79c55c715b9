// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Random-access extraction of N-dimensional patches from `.npy` arrays.
//!
//! This crate reads rectangular sub-volumes ("patches") out of large on-disk
//! NumPy arrays without ever loading the whole array into memory. It is
//! aimed at data pipelines (for example training loops) that repeatedly need
//! small windows of a file that is far larger than RAM.
//!
//! A patch is addressed by three things:
//!
//! - a list of indices along the **leading axis** of the array (`qidx`),
//!   selected non-contiguously and in any order;
//! - a patch extent and step along every remaining **spatial axis**
//!   (`pshape` / `pstride`);
//! - a single linear ordinal (`pnum`) enumerating the positions of the
//!   patch grid laid over the (optionally padded) spatial extent.
//!
//! Patches that hang over the edge of the array are completed with zero
//! elements, either through automatically derived minimal padding or through
//! explicitly requested per-axis padding. The reader decomposes each patch
//! into the minimal set of contiguous file reads, so I/O stays proportional
//! to the bytes actually present on disk.
//!
//! # Example
//!
//! ```no_run
//! use npy_patch::{PatchReader, PatchRequest};
//!
//! // Read patch #2 of a 3x3 patch grid from volumes 0, 5 and 6.
//! let mut reader = PatchReader::<f32>::new();
//! let request = PatchRequest::new([3, 3], 2);
//! let patch = reader.read_patch("volumes.npy", &[0, 5, 6], &request)?;
//! assert_eq!(patch.len(), 3 * 3 * 3);
//! # Ok::<_, npy_patch::Error>(())
//! ```
//!
//! # Concurrency
//!
//! A [`PatchReader`] owns its file handle and geometry cache exclusively and
//! is meant to be driven from a single thread. Parallelism across patches is
//! achieved externally by giving each worker its own reader.

mod block;
pub mod element;
pub mod error;
pub mod geometry;
pub mod header;
pub mod reader;

#[cfg(test)]
pub(crate) mod testing;

pub use crate::element::Element;
pub use crate::error::Error;
pub use crate::geometry::{PatchGeometry, PatchRequest};
pub use crate::header::NpyHeader;
pub use crate::reader::{DATA_ALIGNMENT, PatchBuffer, PatchReader};

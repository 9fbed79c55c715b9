// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Random-access patch reader.
//!
//! This module provides the [`PatchReader`] type, the crate's main entry
//! point. A reader is generic over its element type and long-lived: it
//! opens the backing file lazily on first use, keeps the handle and the
//! parsed header around for subsequent calls on the same path, and
//! transparently reopens when a different path is presented.
//!
//! # Output Layout
//!
//! [`PatchReader::read_patch`] returns a single contiguous, 64-byte-aligned
//! buffer holding `qidx.len()` blocks of `pshape`-shaped patch data in
//! row-major order, with the leading axis varying slowest. Out-of-bounds
//! regions are zero elements. For a given input the output is bit-identical
//! across calls.
//!
//! # Geometry Readback
//!
//! [`PatchReader::plan`] runs the geometry planner without touching the
//! array data; the derived quantities of the most recent successful plan
//! (or read) stay available through the accessor methods. A failed call
//! never disturbs them.


use std::fs::File;
use std::iter;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::slice;

use aligned_vec::{AVec, ConstAlign};
use tracing::debug;

use crate::block;
use crate::element::Element;
use crate::error::Error;
use crate::geometry::{PatchGeometry, PatchRequest};
use crate::header::{NpyHeader, ParseHeaderError};

/// Alignment of returned patch buffers (64 bytes, matching the on-disk
/// data offset alignment of the `.npy` format).
pub const DATA_ALIGNMENT: usize = 1 << 6;

/// A contiguous, 64-byte-aligned buffer of patch elements.
pub type PatchBuffer<T> = AVec<T, ConstAlign<DATA_ALIGNMENT>>;

/// An open array file together with its decoded header.
struct Source {
    path: PathBuf,
    file: File,
    header: NpyHeader,
}

impl Source {
    fn open<T: Element>(path: &Path) -> Result<Self, Error> {
        let file_access = |source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        };
        let file = File::open(path).map_err(file_access)?;
        let header = NpyHeader::from_reader(&file).map_err(|err| match err {
            ParseHeaderError::Io(source) => file_access(source),
            parse => Error::HeaderInvalid(parse),
        })?;
        let found = header.descr.to_string();
        if found != T::DESCR {
            return Err(Error::TypeMismatch {
                expected: T::DESCR.to_string(),
                found,
            });
        }
        debug!(
            "opened {}: shape {:?}, dtype {}",
            path.display(),
            header.shape,
            found
        );
        Ok(Source {
            path: path.to_path_buf(),
            file,
            header,
        })
    }
}

/// Random-access reader of N-dimensional patches from one `.npy` file at a
/// time.
///
/// The element type is fixed per reader; files holding a different element
/// type are rejected when opened. Readers are cheap to construct but cache
/// the open file handle and parsed header, so keeping one alive across many
/// [`read_patch`](Self::read_patch) calls on the same file avoids repeated
/// header parsing.
///
/// A reader owns its state exclusively and must not be shared across
/// threads; instantiate one reader per worker instead.
pub struct PatchReader<T: Element> {
    source: Option<Source>,
    geometry: Option<PatchGeometry>,
    _element: PhantomData<T>,
}

impl<T: Element> Default for PatchReader<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> PatchReader<T> {
    /// Creates a reader with no file bound yet.
    #[must_use]
    #[inline]
    pub fn new() -> Self {
        PatchReader {
            source: None,
            geometry: None,
            _element: PhantomData,
        }
    }

    /// Extracts one patch for every leading-axis index in `qidx`.
    ///
    /// Returns a buffer of exactly `qidx.len() * request.pshape.iter().product()`
    /// elements: one `pshape`-shaped block per `qidx` entry, in the order
    /// given, each block independent of the others. Elements of the patch
    /// that fall outside the on-disk array are zero.
    ///
    /// # Errors
    ///
    /// [`Error::FileAccess`] if the file cannot be opened or read,
    /// [`Error::HeaderInvalid`] / [`Error::TypeMismatch`] if it is not a
    /// row-major array of the reader's element type,
    /// [`Error::QidxOutOfRange`] if an index exceeds the leading axis, and
    /// any geometry error of [`PatchGeometry::plan`]. A failed call leaves
    /// the cached geometry untouched.
    pub fn read_patch(
        &mut self,
        path: impl AsRef<Path>,
        qidx: &[usize],
        request: &PatchRequest,
    ) -> Result<PatchBuffer<T>, Error> {
        let (geometry, source) = self.prepare(path.as_ref(), qidx, request)?;

        let block_len = geometry.patch_len();
        let mut out: PatchBuffer<T> = AVec::from_iter(
            DATA_ALIGNMENT,
            iter::repeat_n(T::zero(), qidx.len() * block_len),
        );

        let block_bytes = block_len * size_of::<T>();
        // SAFETY: `T` is a plain numeric type, so viewing the output buffer
        // as bytes is sound; the length covers exactly the allocation.
        let bytes: &mut [u8] = unsafe {
            slice::from_raw_parts_mut(out.as_mut_ptr().cast::<u8>(), out.len() * size_of::<T>())
        };
        for (chunk, &lead) in bytes.chunks_exact_mut(block_bytes).zip(qidx) {
            block::read_block(
                &mut source.file,
                &source.path,
                &geometry,
                source.header.data_offset,
                lead,
                chunk,
            )?;
        }

        self.geometry = Some(geometry);
        Ok(out)
    }

    /// Runs the geometry planner only, caching the derived quantities for
    /// the accessor methods; no array data is read.
    ///
    /// # Errors
    ///
    /// Same as [`read_patch`](Self::read_patch), minus the data-read
    /// failures.
    pub fn plan(
        &mut self,
        path: impl AsRef<Path>,
        qidx: &[usize],
        request: &PatchRequest,
    ) -> Result<(), Error> {
        let (geometry, _) = self.prepare(path.as_ref(), qidx, request)?;
        self.geometry = Some(geometry);
        Ok(())
    }

    /// Applied padding of the last planned patch, interleaved `(lo, hi)`
    /// per spatial axis. Empty before the first successful plan.
    #[must_use]
    #[inline]
    pub fn padding(&self) -> &[usize] {
        self.geometry.as_ref().map_or(&[], |g| g.padding.as_slice())
    }

    /// Byte strides of the on-disk axes of the last planned patch, leading
    /// axis first.
    #[must_use]
    #[inline]
    pub fn data_strides(&self) -> &[u64] {
        self.geometry.as_ref().map_or(&[], |g| g.data_strides.as_slice())
    }

    /// Byte strides of the output patch's spatial axes.
    #[must_use]
    #[inline]
    pub fn patch_strides(&self) -> &[u64] {
        self.geometry.as_ref().map_or(&[], |g| g.patch_strides.as_slice())
    }

    /// Byte lengths of the clipped in-bounds spans per spatial axis.
    #[must_use]
    #[inline]
    pub fn shift_lengths(&self) -> &[u64] {
        self.geometry.as_ref().map_or(&[], |g| g.shift_lengths.as_slice())
    }

    /// Multi-index of the last planned patch within its patch grid.
    #[must_use]
    #[inline]
    pub fn patch_numbers(&self) -> &[usize] {
        self.geometry.as_ref().map_or(&[], |g| g.patch_numbers.as_slice())
    }

    /// Absolute file offset of the first in-bounds element of the last
    /// planned patch, for the first selected leading index. Zero before the
    /// first successful plan.
    #[must_use]
    #[inline]
    pub fn stream_start(&self) -> u64 {
        self.geometry.as_ref().map_or(0, |g| g.stream_start)
    }

    /// Full derived geometry of the last planned patch.
    #[must_use]
    #[inline]
    pub fn geometry(&self) -> Option<&PatchGeometry> {
        self.geometry.as_ref()
    }

    /// Validates the inputs and plans the requested patch, (re)opening the
    /// backing file if `path` differs from the cached one.
    fn prepare(
        &mut self,
        path: &Path,
        qidx: &[usize],
        request: &PatchRequest,
    ) -> Result<(PatchGeometry, &mut Source), Error> {
        if self.source.as_ref().is_none_or(|s| s.path != path) {
            self.source = Some(Source::open::<T>(path)?);
        }
        let source = self
            .source
            .as_mut()
            .expect("source is installed just above");

        let lead_extent = source.header.shape[0];
        for &index in qidx {
            if index >= lead_extent {
                return Err(Error::QidxOutOfRange {
                    index,
                    size: lead_extent,
                });
            }
        }
        let lead = qidx.first().copied().unwrap_or(0);
        let geometry = PatchGeometry::plan(&source.header, lead, request)?;
        Ok((geometry, source))
    }
}

// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Patch geometry planning.
//!
//! This module turns a [`PatchRequest`] and a file's [`NpyHeader`] into a
//! [`PatchGeometry`]: the padding actually applied on every spatial axis,
//! the extents of the patch grid, the multi-index of the requested patch,
//! and the byte strides and offsets the block reader needs to pull the
//! patch off disk.
//!
//! # Patch grid
//!
//! Conceptually the spatial extent of the array is padded by `(lo, hi)`
//! elements per axis, and patches of extent `pshape` are placed on the
//! padded extent every `pstride` elements. Position `g` along an axis
//! covers the half-open element window
//! `[g * pstride - lo, g * pstride - lo + pshape)` in unpadded
//! coordinates; elements outside `[0, extent)` read as zero. The grid
//! extent per axis is
//! `ceil((extent + lo + hi - pshape) / pstride) + 1`, so with a step that
//! does not evenly divide the padded extent the final patch may overshoot
//! and carry trailing zero rows.
//!
//! # Auto-padding
//!
//! When no explicit padding is requested, each axis gets the minimum total
//! pad `t >= max(0, pshape - extent)` such that `extent + t - pshape` is a
//! multiple of `pstride`, i.e. just enough for the grid to end exactly at
//! the padded extent. The total is split with the larger half on the low
//! side.


use tracing::trace;

use crate::error::Error;
use crate::header::NpyHeader;

/// Caller-supplied patch parameters.
///
/// Everything except the patch extent and the linear ordinal is optional:
/// the step defaults to the extent (a non-overlapping tiling) and the
/// padding defaults to the automatically derived minimum. An explicitly
/// supplied padding vector is applied verbatim, so an all-zero vector means
/// "no padding at all" rather than "derive it for me".
///
/// ```
/// use npy_patch::PatchRequest;
///
/// let request = PatchRequest::new([3, 3], 4)
///     .with_stride([2, 2])
///     .with_padding([2, 0, 2, 2]);
/// assert_eq!(request.pnum, 4);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    /// Patch extent along each spatial axis.
    pub pshape: Vec<usize>,
    /// Patch step along each spatial axis; `None` means `pshape`.
    pub pstride: Option<Vec<usize>>,
    /// Explicit interleaved `(lo, hi)` padding per spatial axis; `None`
    /// requests auto-padding.
    pub padding: Option<Vec<usize>>,
    /// Linear ordinal into the row-major patch grid.
    pub pnum: usize,
    /// Per-axis patch-grid origin offset, folded onto `pnum` row-major.
    pub pnum_offset: Option<Vec<usize>>,
}

impl PatchRequest {
    /// Creates a request for patch `pnum` of a `pshape`-shaped tiling with
    /// auto-padding.
    #[must_use]
    #[inline]
    pub fn new(pshape: impl Into<Vec<usize>>, pnum: usize) -> Self {
        PatchRequest {
            pshape: pshape.into(),
            pstride: None,
            padding: None,
            pnum,
            pnum_offset: None,
        }
    }

    /// Sets the patch step per spatial axis.
    #[must_use]
    #[inline]
    pub fn with_stride(mut self, pstride: impl Into<Vec<usize>>) -> Self {
        self.pstride = Some(pstride.into());
        self
    }

    /// Sets an explicit interleaved `(lo, hi)` padding per spatial axis.
    #[must_use]
    #[inline]
    pub fn with_padding(mut self, padding: impl Into<Vec<usize>>) -> Self {
        self.padding = Some(padding.into());
        self
    }

    /// Shifts the patch-grid origin by whole patches per spatial axis.
    #[must_use]
    #[inline]
    pub fn with_grid_offset(mut self, pnum_offset: impl Into<Vec<usize>>) -> Self {
        self.pnum_offset = Some(pnum_offset.into());
        self
    }
}

/// Derived geometry of one planned patch.
///
/// All byte quantities are measured against the on-disk layout described by
/// the file header; the spatial axes are indexed `0..N` with axis `N - 1`
/// innermost (fastest varying on disk and in the output).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchGeometry {
    /// Patch extent along each spatial axis, copied from the request.
    pub pshape: Vec<usize>,
    /// Applied padding, interleaved `(lo, hi)` per spatial axis.
    pub padding: Vec<usize>,
    /// Patch-grid extent along each spatial axis.
    pub patch_grid: Vec<usize>,
    /// Multi-index of the planned patch within the patch grid.
    pub patch_numbers: Vec<usize>,
    /// Byte stride of every on-disk axis, leading axis first.
    pub data_strides: Vec<u64>,
    /// Byte stride of every spatial axis of the output patch.
    pub patch_strides: Vec<u64>,
    /// Byte length of the clipped in-bounds span along each spatial axis.
    pub shift_lengths: Vec<u64>,
    /// Absolute file offset of the patch's first in-bounds element for the
    /// first selected leading index.
    pub stream_start: u64,
    /// Signed placement of the patch's first element along each spatial
    /// axis, in unpadded coordinates.
    pub starts: Vec<i64>,
    /// Clipped in-bounds element window along each spatial axis.
    pub windows: Vec<(usize, usize)>,
}

impl PatchGeometry {
    /// Plans the patch selected by `request` against the array described by
    /// `header`, anchored at leading-axis index `lead`.
    ///
    /// # Errors
    ///
    /// - [`Error::ShapeMismatch`] if any input vector's length does not
    ///   match the file's spatial rank;
    /// - [`Error::ExtentInvalid`] if a patch extent or step is zero;
    /// - [`Error::PaddingInvalid`] if an explicit padding value reaches the
    ///   patch extent on its axis;
    /// - [`Error::PnumOutOfRange`] if the effective ordinal (including any
    ///   folded grid offset) falls outside the patch grid.
    pub fn plan(header: &NpyHeader, lead: usize, request: &PatchRequest) -> Result<Self, Error> {
        let spatial = &header.shape[1..];
        let n = spatial.len();
        let elem = header.descr.size as u64;

        let pshape = &request.pshape;
        if pshape.len() != n {
            return Err(Error::ShapeMismatch {
                what: "pshape",
                expected: n,
                found: pshape.len(),
            });
        }
        let pstride = request.pstride.as_deref().unwrap_or(pshape);
        if pstride.len() != n {
            return Err(Error::ShapeMismatch {
                what: "pstride",
                expected: n,
                found: pstride.len(),
            });
        }
        for axis in 0..n {
            if pshape[axis] == 0 || pstride[axis] == 0 {
                return Err(Error::ExtentInvalid { axis });
            }
        }

        let padding = match &request.padding {
            None => {
                let mut padding = Vec::with_capacity(2 * n);
                for axis in 0..n {
                    let (lo, hi) = auto_pad(spatial[axis], pshape[axis], pstride[axis]);
                    padding.push(lo);
                    padding.push(hi);
                }
                padding
            }
            Some(values) => {
                if values.len() != 2 * n {
                    return Err(Error::ShapeMismatch {
                        what: "padding",
                        expected: 2 * n,
                        found: values.len(),
                    });
                }
                for axis in 0..n {
                    for pad in [values[2 * axis], values[2 * axis + 1]] {
                        if pad >= pshape[axis] {
                            return Err(Error::PaddingInvalid {
                                axis,
                                pad,
                                extent: pshape[axis],
                            });
                        }
                    }
                }
                values.clone()
            }
        };

        let patch_grid: Vec<usize> = (0..n)
            .map(|axis| {
                let padded = spatial[axis] + padding[2 * axis] + padding[2 * axis + 1];
                padded.saturating_sub(pshape[axis]).div_ceil(pstride[axis]) + 1
            })
            .collect();
        let total: usize = patch_grid.iter().product();

        let mut pnum = request.pnum;
        if let Some(offset) = &request.pnum_offset {
            if offset.len() != n {
                return Err(Error::ShapeMismatch {
                    what: "pnum_offset",
                    expected: n,
                    found: offset.len(),
                });
            }
            let mut block = 1;
            for axis in (0..n).rev() {
                pnum += offset[axis] * block;
                block *= patch_grid[axis];
            }
        }
        if pnum >= total {
            return Err(Error::PnumOutOfRange { pnum, total });
        }

        let mut patch_numbers = vec![0usize; n];
        let mut remainder = pnum;
        for axis in (0..n).rev() {
            patch_numbers[axis] = remainder % patch_grid[axis];
            remainder /= patch_grid[axis];
        }

        let mut data_strides = vec![0u64; n + 1];
        let mut stride = elem;
        for axis in (0..=n).rev() {
            data_strides[axis] = stride;
            stride *= header.shape[axis] as u64;
        }
        let mut patch_strides = vec![0u64; n];
        let mut stride = elem;
        for axis in (0..n).rev() {
            patch_strides[axis] = stride;
            stride *= pshape[axis] as u64;
        }

        let mut starts = Vec::with_capacity(n);
        let mut windows = Vec::with_capacity(n);
        let mut shift_lengths = Vec::with_capacity(n);
        let mut stream_start = header.data_offset + lead as u64 * data_strides[0];
        for axis in 0..n {
            let extent = spatial[axis] as i64;
            let start =
                patch_numbers[axis] as i64 * pstride[axis] as i64 - padding[2 * axis] as i64;
            let clip_lo = start.clamp(0, extent) as usize;
            let clip_hi = (start + pshape[axis] as i64).clamp(0, extent) as usize;
            starts.push(start);
            windows.push((clip_lo, clip_hi));
            shift_lengths.push((clip_hi - clip_lo) as u64 * data_strides[axis + 1]);
            stream_start += clip_lo as u64 * data_strides[axis + 1];
        }

        trace!(
            "planned patch {:?} of grid {:?}, stream start {}",
            patch_numbers, patch_grid, stream_start
        );
        Ok(PatchGeometry {
            pshape: pshape.clone(),
            padding,
            patch_grid,
            patch_numbers,
            data_strides,
            patch_strides,
            shift_lengths,
            stream_start,
            starts,
            windows,
        })
    }

    /// Number of elements in one leading-axis block of the output patch.
    #[must_use]
    #[inline]
    pub fn patch_len(&self) -> usize {
        self.pshape.iter().product()
    }

    /// Number of spatial axes.
    pub(crate) fn rank(&self) -> usize {
        self.pshape.len()
    }

    /// Element size in bytes.
    pub(crate) fn elem_size(&self) -> u64 {
        self.data_strides[self.rank()]
    }

    /// True when some axis has no in-bounds elements, making the whole
    /// patch zero without touching the file.
    pub(crate) fn has_empty_window(&self) -> bool {
        self.windows.iter().any(|&(lo, hi)| lo == hi)
    }
}

/// Minimal `(lo, hi)` padding aligning the patch grid to one axis.
fn auto_pad(extent: usize, pshape: usize, pstride: usize) -> (usize, usize) {
    let deficit = pshape.saturating_sub(extent);
    let overrun = (extent + deficit - pshape) % pstride;
    let total = deficit + if overrun == 0 { 0 } else { pstride - overrun };
    (total - total / 2, total / 2)
}

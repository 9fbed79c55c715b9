// Copyright (c) 2017-2025, The rav1e contributors. All rights reserved
//
// This source code is subject to the terms of the BSD 2 Clause License and
// the Alliance for Open Media Patent License 1.0. If the BSD 2 Clause License
// was not distributed with this source code in the LICENSE file, you can
// obtain it at www.aomedia.org/license/software. If the Alliance for Open
// Media Patent License 1.0 was not distributed with this source code in the
// PATENTS file, you can obtain it at www.aomedia.org/license/patent.

//! Assembly of patch bytes from positioned file reads.
//!
//! The block reader walks the spatial axes from outermost to innermost.
//! Rows that fall outside the on-disk extent are skipped (the output buffer
//! arrives pre-zeroed, so zero-fill is just cursor advance), and each
//! in-bounds row of the innermost axis becomes exactly one contiguous read.
//! Every read seeks to an absolute offset first, so no state is carried in
//! the file pointer between reads; consecutive innermost rows are adjacent
//! on disk, so the access pattern stays sequential anyway.

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::error::Error;
use crate::geometry::PatchGeometry;

/// Copies one leading-axis block of the planned patch into `out`.
///
/// `out` must hold exactly one patch block
/// (`geometry.patch_len() * elem_size` bytes) and must be zeroed; only the
/// in-bounds spans are written.
pub(crate) fn read_block(
    file: &mut File,
    path: &Path,
    geometry: &PatchGeometry,
    data_offset: u64,
    lead: usize,
    out: &mut [u8],
) -> Result<(), Error> {
    debug_assert_eq!(
        out.len() as u64,
        geometry.patch_len() as u64 * geometry.elem_size()
    );
    if geometry.has_empty_window() {
        return Ok(());
    }
    let base = data_offset + lead as u64 * geometry.data_strides[0];
    read_axis(file, path, geometry, 0, base, out)
}

fn read_axis(
    file: &mut File,
    path: &Path,
    geometry: &PatchGeometry,
    axis: usize,
    offset: u64,
    out: &mut [u8],
) -> Result<(), Error> {
    let start = geometry.starts[axis];
    let (clip_lo, clip_hi) = geometry.windows[axis];

    if axis == geometry.rank() - 1 {
        // One contiguous run along the innermost axis, clipped to the
        // on-disk extent; bytes on either side stay zero.
        let elem = geometry.elem_size() as usize;
        let lead_gap = (clip_lo as i64 - start) as usize * elem;
        let span = (clip_hi - clip_lo) * elem;
        let read_at = offset + clip_lo as u64 * geometry.elem_size();

        let io_err = |source| Error::FileAccess {
            path: path.to_path_buf(),
            source,
        };
        file.seek(SeekFrom::Start(read_at)).map_err(io_err)?;
        file.read_exact(&mut out[lead_gap..lead_gap + span])
            .map_err(io_err)?;
        return Ok(());
    }

    let row_len = geometry.patch_strides[axis] as usize;
    for (row, chunk) in out.chunks_exact_mut(row_len).enumerate() {
        let position = start + row as i64;
        if position < clip_lo as i64 || position >= clip_hi as i64 {
            continue;
        }
        let child = offset + position as u64 * geometry.data_strides[axis + 1];
        read_axis(file, path, geometry, axis + 1, child, chunk)?;
    }
    Ok(())
}

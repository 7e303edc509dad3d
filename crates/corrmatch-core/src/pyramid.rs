//! Gaussian pyramid construction over 8-bit rasters.
//!
//! Levels are produced by a separable 5-tap binomial filter with edge
//! clamping followed by 2x decimation at offset 0, so level `n + 1` has
//! `ceil(w/2) x ceil(h/2)` samples.

use rayon::prelude::*;

use crate::consts::BINOMIAL_KERNEL;
use crate::raster::GrayImage;

const KERNEL_RADIUS: usize = 2;

/// Apply the separable [1,4,6,4,1]/16 filter with edge clamping.
///
/// All arithmetic is integral: the horizontal pass accumulates into u16
/// (weights sum to 16, so at most 255 * 16), the vertical pass into u32,
/// and the final division by 256 rounds to nearest.
pub fn binomial_blur(src: &GrayImage, parallel: bool) -> GrayImage {
    let (w, h) = (src.width(), src.height());
    if w == 0 || h == 0 {
        return src.clone();
    }

    let horizontal: Vec<Vec<u16>> = if parallel {
        (0..h)
            .into_par_iter()
            .map(|y| blur_row(src.row(y)))
            .collect()
    } else {
        (0..h).map(|y| blur_row(src.row(y))).collect()
    };

    let vertical_row = |y: usize| -> Vec<u8> {
        let mut out = vec![0u8; w];
        for (x, slot) in out.iter_mut().enumerate() {
            let mut acc = 0u32;
            for (k, &weight) in BINOMIAL_KERNEL.iter().enumerate() {
                let sy = (y as isize + k as isize - KERNEL_RADIUS as isize)
                    .clamp(0, h as isize - 1) as usize;
                acc += weight * u32::from(horizontal[sy][x]);
            }
            *slot = ((acc + 128) >> 8) as u8;
        }
        out
    };

    let rows: Vec<Vec<u8>> = if parallel {
        (0..h).into_par_iter().map(vertical_row).collect()
    } else {
        (0..h).map(vertical_row).collect()
    };

    let mut result = GrayImage::zeros(w, h);
    for (y, row) in rows.into_iter().enumerate() {
        result.row_mut(y).copy_from_slice(&row);
    }
    result
}

fn blur_row(row: &[u8]) -> Vec<u16> {
    let w = row.len();
    let mut out = vec![0u16; w];
    for (x, slot) in out.iter_mut().enumerate() {
        let mut acc = 0u32;
        for (k, &weight) in BINOMIAL_KERNEL.iter().enumerate() {
            let sx =
                (x as isize + k as isize - KERNEL_RADIUS as isize).clamp(0, w as isize - 1) as usize;
            acc += weight * u32::from(row[sx]);
        }
        *slot = acc as u16;
    }
    out
}

/// Blur, then keep every other sample starting at offset 0.
/// Output dimensions are `ceil(w/2) x ceil(h/2)`.
pub fn downsample_2x(src: &GrayImage, parallel: bool) -> GrayImage {
    let blurred = binomial_blur(src, parallel);
    let new_w = src.width().div_ceil(2);
    let new_h = src.height().div_ceil(2);

    let mut result = GrayImage::zeros(new_w, new_h);
    for y in 0..new_h {
        let src_row = blurred.row(y * 2);
        let dst_row = result.row_mut(y);
        for (x, slot) in dst_row.iter_mut().enumerate() {
            *slot = src_row[x * 2];
        }
    }
    result
}

/// Build a pyramid, index 0 = finest.
///
/// Stops at `max_levels`, or when the next level would fall below
/// `min_dim` on either side.
pub(crate) fn build_pyramid(
    src: &GrayImage,
    max_levels: usize,
    min_dim: usize,
    parallel: bool,
) -> Vec<GrayImage> {
    let mut levels = Vec::with_capacity(max_levels);
    let mut current = src.clone();
    levels.push(current.clone());

    while levels.len() < max_levels {
        let next_w = current.width().div_ceil(2);
        let next_h = current.height().div_ceil(2);
        if next_w < min_dim || next_h < min_dim {
            break;
        }
        current = downsample_2x(&current, parallel);
        levels.push(current.clone());
    }

    levels
}

//! Integral tables for O(1) axis-aligned window sums.

use ndarray::Array2;
use rayon::prelude::*;

use crate::raster::GrayImage;

/// Integral images over raw pixels and squared pixels.
///
/// Both tables carry a leading row and column of zeros, so the sum over
/// any `[x, x+w) x [y, y+h)` window is four lookups. Accumulators are
/// u64 throughout; squared sums of full-range 8-bit rasters stay well
/// inside that.
pub struct IntegralLevel {
    sum: Array2<u64>,
    sum_sq: Array2<u64>,
}

impl IntegralLevel {
    pub fn build(img: &GrayImage, parallel: bool) -> Self {
        let (w, h) = (img.width(), img.height());

        // First pass: per-row horizontal prefix sums, independent per row.
        let prefix_row = |y: usize| -> (Vec<u64>, Vec<u64>) {
            let row = img.row(y);
            let mut sum = vec![0u64; w + 1];
            let mut sum_sq = vec![0u64; w + 1];
            for (x, &v) in row.iter().enumerate() {
                let v = u64::from(v);
                sum[x + 1] = sum[x] + v;
                sum_sq[x + 1] = sum_sq[x] + v * v;
            }
            (sum, sum_sq)
        };

        let rows: Vec<(Vec<u64>, Vec<u64>)> = if parallel {
            (0..h).into_par_iter().map(prefix_row).collect()
        } else {
            (0..h).map(prefix_row).collect()
        };

        // Second pass: accumulate down the columns, row by row.
        let mut sum = Array2::<u64>::zeros((h + 1, w + 1));
        let mut sum_sq = Array2::<u64>::zeros((h + 1, w + 1));
        for (y, (row_sum, row_sq)) in rows.into_iter().enumerate() {
            for x in 0..=w {
                sum[[y + 1, x]] = sum[[y, x]] + row_sum[x];
                sum_sq[[y + 1, x]] = sum_sq[[y, x]] + row_sq[x];
            }
        }

        Self { sum, sum_sq }
    }

    /// Sum and squared-sum over the window `[x, x+w) x [y, y+h)`.
    #[inline]
    pub fn window_sums(&self, x: usize, y: usize, w: usize, h: usize) -> (u64, u64) {
        let s = self.sum[[y + h, x + w]] + self.sum[[y, x]]
            - self.sum[[y, x + w]]
            - self.sum[[y + h, x]];
        let sq = self.sum_sq[[y + h, x + w]] + self.sum_sq[[y, x]]
            - self.sum_sq[[y, x + w]]
            - self.sum_sq[[y + h, x]];
        (s, sq)
    }
}

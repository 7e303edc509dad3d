//! ZNCC and SSD window evaluators.
//!
//! Both kernels score one candidate window and share a sign convention:
//! higher is better. ZNCC lands in [-1, 1]; SSD is negated, so exact
//! agreement scores 0 and everything else is negative.

use tracing::debug;

use crate::config::Metric;
use crate::integral::IntegralLevel;
use crate::raster::GrayImage;
use crate::template::RotatedTemplate;

/// Evaluate `metric` for the window with top-left `(x, y)`.
///
/// Degenerate windows (variance under the configured floors for ZNCC)
/// and non-finite intermediates come back as negative infinity, which
/// drops the candidate from every queue downstream.
pub fn score_window(
    metric: Metric,
    image: &GrayImage,
    integral: &IntegralLevel,
    x: usize,
    y: usize,
    rot: &RotatedTemplate,
    min_var_i: f64,
    min_var_t: f64,
) -> f64 {
    let score = match metric {
        Metric::Zncc => zncc(image, integral, x, y, rot, min_var_i, min_var_t),
        Metric::Ssd => ssd(image, x, y, rot),
    };
    if score.is_nan() {
        debug!(x, y, "non-finite score treated as -inf");
        return f64::NEG_INFINITY;
    }
    score
}

fn zncc(
    image: &GrayImage,
    integral: &IntegralLevel,
    x: usize,
    y: usize,
    rot: &RotatedTemplate,
    min_var_i: f64,
    min_var_t: f64,
) -> f64 {
    let (tw, th) = (rot.width(), rot.height());
    let stats = &rot.stats;
    if stats.count == 0 || stats.var < min_var_t {
        return f64::NEG_INFINITY;
    }
    let n = stats.count as f64;

    let (sum_i, sum_sq_i, dot) = if rot.is_full_mask() {
        // Window mean and variance come from the integral tables; the
        // inner loop reduces to a plain dot product.
        let (s, sq) = integral.window_sums(x, y, tw, th);
        let mut dot = 0u64;
        for ty in 0..th {
            let img_row = &image.row(y + ty)[x..x + tw];
            for (&t, &i) in rot.data.row(ty).iter().zip(img_row) {
                dot += u64::from(t) * u64::from(i);
            }
        }
        (s, sq, dot)
    } else {
        // Sparse mask: the window statistics must honor the mask, so
        // everything is accumulated in one pass. This is the dominant
        // rotation cost.
        let mut sum_i = 0u64;
        let mut sum_sq_i = 0u64;
        let mut dot = 0u64;
        for ty in 0..th {
            let img_row = &image.row(y + ty)[x..x + tw];
            for ((&t, &m), &i) in rot
                .data
                .row(ty)
                .iter()
                .zip(rot.mask.row(ty))
                .zip(img_row)
            {
                if m != 0 {
                    let i = u64::from(i);
                    sum_i += i;
                    sum_sq_i += i * i;
                    dot += u64::from(t) * i;
                }
            }
        }
        (sum_i, sum_sq_i, dot)
    };

    let mean_i = sum_i as f64 / n;
    let var_i = (sum_sq_i as f64 / n - mean_i * mean_i).max(0.0);
    if var_i < min_var_i {
        return f64::NEG_INFINITY;
    }

    let cross = dot as f64 - n * stats.mean * mean_i;
    cross / (stats.denom * (var_i * n).sqrt())
}

fn ssd(image: &GrayImage, x: usize, y: usize, rot: &RotatedTemplate) -> f64 {
    let (tw, th) = (rot.width(), rot.height());
    let mut acc = 0u64;

    if rot.is_full_mask() {
        for ty in 0..th {
            let img_row = &image.row(y + ty)[x..x + tw];
            for (&t, &i) in rot.data.row(ty).iter().zip(img_row) {
                let d = i64::from(t) - i64::from(i);
                acc += (d * d) as u64;
            }
        }
    } else {
        for ty in 0..th {
            let img_row = &image.row(y + ty)[x..x + tw];
            for ((&t, &m), &i) in rot
                .data
                .row(ty)
                .iter()
                .zip(rot.mask.row(ty))
                .zip(img_row)
            {
                if m != 0 {
                    let d = i64::from(t) - i64::from(i);
                    acc += (d * d) as u64;
                }
            }
        }
    }

    -(acc as f64)
}

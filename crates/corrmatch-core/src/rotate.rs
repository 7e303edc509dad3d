//! Bilinear rotation with a validity mask.

use ndarray::Array2;

use crate::raster::GrayImage;

/// A rotated copy of a raster plus the per-pixel validity mask.
///
/// `mask` is 1 where the back-projected source lay inside the original
/// raster, 0 where the output pixel holds the fill value instead.
#[derive(Clone, Debug)]
pub struct RotatedRaster {
    pub data: Array2<u8>,
    pub mask: Array2<u8>,
}

/// Rotate `src` by `angle_deg` about its center, on the same canvas.
///
/// Each output pixel back-projects into the source; pixels whose source
/// coordinate falls outside `[0, w-1] x [0, h-1]`, or whose bilinear
/// footprint would leave the raster, receive `fill` and a 0 mask bit.
/// Kept pixels are bilinear-interpolated and rounded to nearest, ties
/// away from zero.
pub fn rotate_bilinear_masked(src: &GrayImage, angle_deg: f64, fill: u8) -> RotatedRaster {
    let (w, h) = (src.width(), src.height());
    let mut data = Array2::<u8>::from_elem((h, w), fill);
    let mut mask = Array2::<u8>::zeros((h, w));
    if w < 2 || h < 2 {
        return RotatedRaster { data, mask };
    }

    let rad = angle_deg.to_radians();
    let (sin_a, cos_a) = rad.sin_cos();
    let cx = (w - 1) as f64 * 0.5;
    let cy = (h - 1) as f64 * 0.5;
    let max_x = (w - 1) as f64;
    let max_y = (h - 1) as f64;

    for y in 0..h {
        for x in 0..w {
            let dx = x as f64 - cx;
            let dy = y as f64 - cy;
            let src_x = cos_a * dx + sin_a * dy + cx;
            let src_y = -sin_a * dx + cos_a * dy + cy;

            if !src_x.is_finite() || !src_y.is_finite() {
                continue;
            }
            if src_x < 0.0 || src_y < 0.0 || src_x > max_x || src_y > max_y {
                continue;
            }

            let x0 = src_x.floor() as usize;
            let y0 = src_y.floor() as usize;
            let x1 = x0 + 1;
            let y1 = y0 + 1;
            if x1 >= w || y1 >= h {
                continue;
            }

            let fx = src_x - x0 as f64;
            let fy = src_y - y0 as f64;

            let v00 = f64::from(src.get(x0, y0));
            let v10 = f64::from(src.get(x1, y0));
            let v01 = f64::from(src.get(x0, y1));
            let v11 = f64::from(src.get(x1, y1));

            let value = v00 * (1.0 - fx) * (1.0 - fy)
                + v10 * fx * (1.0 - fy)
                + v01 * (1.0 - fx) * fy
                + v11 * fx * fy;

            data[[y, x]] = value.round().clamp(0.0, 255.0) as u8;
            mask[[y, x]] = 1;
        }
    }

    RotatedRaster { data, mask }
}

/// Verbatim copy of `src` with a full validity mask.
/// Used for the exact 0-degree entry, which never goes through resampling.
pub fn identity_raster(src: &GrayImage) -> RotatedRaster {
    let (w, h) = (src.width(), src.height());
    let mut data = Array2::<u8>::zeros((h, w));
    for y in 0..h {
        let row = src.row(y);
        for x in 0..w {
            data[[y, x]] = row[x];
        }
    }
    RotatedRaster {
        data,
        mask: Array2::<u8>::from_elem((h, w), 1),
    }
}

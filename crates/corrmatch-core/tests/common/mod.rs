#![allow(dead_code)]
//! Shared helpers for integration tests: deterministic patterns, a tiny
//! seeded PRNG, and template embedding on byte canvases.

use corrmatch_core::GrayImage;

/// Deterministic 64-bit LCG (Knuth constants). Good enough for test
/// fixtures; never used by the library itself.
pub struct Lcg(u64);

impl Lcg {
    pub fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9E37_79B9_7F4A_7C15).wrapping_add(1))
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    /// Uniform byte in `[lo, hi]` inclusive.
    pub fn byte_in(&mut self, lo: u8, hi: u8) -> u8 {
        let span = u32::from(hi) - u32::from(lo) + 1;
        lo + (self.next_u32() % span) as u8
    }

    fn unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX)
    }

    /// Zero-mean Gaussian sample via Box-Muller.
    pub fn normal(&mut self, sigma: f64) -> f64 {
        let u1 = self.unit().max(1e-12);
        let u2 = self.unit();
        sigma * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

pub fn image_from(width: usize, height: usize, data: Vec<u8>) -> GrayImage {
    GrayImage::from_raw(width, height, data).expect("valid raster")
}

pub fn flat_image(width: usize, height: usize, value: u8) -> GrayImage {
    image_from(width, height, vec![value; width * height])
}

/// Uniform random bytes in `[lo, hi]`.
pub fn random_image(width: usize, height: usize, lo: u8, hi: u8, seed: u64) -> GrayImage {
    let mut rng = Lcg::new(seed);
    let data = (0..width * height).map(|_| rng.byte_in(lo, hi)).collect();
    image_from(width, height, data)
}

/// Clamped Gaussian noise around `mean`.
pub fn noise_image(width: usize, height: usize, mean: f64, sigma: f64, seed: u64) -> GrayImage {
    let mut rng = Lcg::new(seed);
    let data = (0..width * height)
        .map(|_| (mean + rng.normal(sigma)).round().clamp(0.0, 255.0) as u8)
        .collect();
    image_from(width, height, data)
}

/// Copy `template` into `canvas` with its top-left at `(x0, y0)`.
pub fn embed(canvas: &mut [u8], canvas_w: usize, template: &GrayImage, x0: usize, y0: usize) {
    embed_gain_bias(canvas, canvas_w, template, x0, y0, 1.0, 0.0);
}

/// Embed with a per-pixel linear transform `v * gain + bias`, clamped.
pub fn embed_gain_bias(
    canvas: &mut [u8],
    canvas_w: usize,
    template: &GrayImage,
    x0: usize,
    y0: usize,
    gain: f64,
    bias: f64,
) {
    for y in 0..template.height() {
        let row = template.row(y);
        let dst = (y0 + y) * canvas_w + x0;
        for (x, &v) in row.iter().enumerate() {
            let value = f64::from(v) * gain + bias;
            canvas[dst + x] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Embed only the pixels whose mask bit is set.
pub fn embed_masked(
    canvas: &mut [u8],
    canvas_w: usize,
    data: &ndarray::Array2<u8>,
    mask: &ndarray::Array2<u8>,
    x0: usize,
    y0: usize,
) {
    let (h, w) = data.dim();
    for y in 0..h {
        for x in 0..w {
            if mask[[y, x]] != 0 {
                canvas[(y0 + y) * canvas_w + x0 + x] = data[[y, x]];
            }
        }
    }
}

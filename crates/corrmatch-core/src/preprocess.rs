//! Query image preprocessing: pyramid plus integral tables.

use crate::integral::IntegralLevel;
use crate::pyramid::build_pyramid;
use crate::raster::GrayImage;

/// A query image compiled for matching: its Gaussian pyramid and, per
/// level, integral sums over pixels and squared pixels.
///
/// Lifetime is one matching invocation unless the caller reuses it via
/// [`crate::matcher::Matcher::match_compiled`].
pub struct CompiledImage {
    levels: Vec<GrayImage>,
    integrals: Vec<IntegralLevel>,
}

impl CompiledImage {
    /// Build the pyramid to at most `max_levels` and the per-level
    /// integral tables.
    pub fn compile(image: &GrayImage, max_levels: usize, parallel: bool) -> Self {
        let levels = build_pyramid(image, max_levels, 1, parallel);
        let integrals = levels
            .iter()
            .map(|level| IntegralLevel::build(level, parallel))
            .collect();
        Self { levels, integrals }
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> &GrayImage {
        &self.levels[level]
    }

    pub fn integral(&self, level: usize) -> &IntegralLevel {
        &self.integrals[level]
    }
}

//! Template compilation: pyramid, angle ladder, and the rotation cache.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use ndarray::Array2;
use tracing::debug;

use crate::config::CompileConfig;
use crate::consts::{DEFAULT_MIN_VAR, MIN_TEMPLATE_LEVEL_DIM};
use crate::error::{MatchError, Result};
use crate::pyramid::build_pyramid;
use crate::raster::GrayImage;
use crate::rotate::{identity_raster, rotate_bilinear_masked, RotatedRaster};

/// Wrap an angle into `[-180, 180)` degrees.
pub(crate) fn wrap_deg(angle: f64) -> f64 {
    angle - 360.0 * ((angle + 180.0) / 360.0).floor()
}

/// Scalar statistics of a rotated template under its validity mask.
#[derive(Clone, Copy, Debug)]
pub struct TemplateStats {
    /// Number of valid (mask = 1) pixels.
    pub count: u64,
    pub sum: u64,
    pub sum_sq: u64,
    pub mean: f64,
    pub var: f64,
    /// `sqrt(max(var, floor) * count)` with the default variance floor.
    pub denom: f64,
}

impl TemplateStats {
    pub(crate) fn from_masked(data: &Array2<u8>, mask: &Array2<u8>) -> Self {
        let mut count = 0u64;
        let mut sum = 0u64;
        let mut sum_sq = 0u64;
        for (&v, &m) in data.iter().zip(mask.iter()) {
            if m != 0 {
                let v = u64::from(v);
                count += 1;
                sum += v;
                sum_sq += v * v;
            }
        }

        if count == 0 {
            return Self {
                count: 0,
                sum: 0,
                sum_sq: 0,
                mean: 0.0,
                var: 0.0,
                denom: 0.0,
            };
        }

        let n = count as f64;
        let mean = sum as f64 / n;
        let var = (sum_sq as f64 / n - mean * mean).max(0.0);
        let denom = (var.max(DEFAULT_MIN_VAR) * n).sqrt();
        Self {
            count,
            sum,
            sum_sq,
            mean,
            var,
            denom,
        }
    }
}

/// A rotated template copy at one (level, angle): pixels, validity mask,
/// and precomputed scalar statistics.
#[derive(Clone, Debug)]
pub struct RotatedTemplate {
    pub data: Array2<u8>,
    pub mask: Array2<u8>,
    pub stats: TemplateStats,
}

impl RotatedTemplate {
    fn from_raster(raster: RotatedRaster) -> Self {
        let stats = TemplateStats::from_masked(&raster.data, &raster.mask);
        Self {
            data: raster.data,
            mask: raster.mask,
            stats,
        }
    }

    pub fn width(&self) -> usize {
        self.data.ncols()
    }

    pub fn height(&self) -> usize {
        self.data.nrows()
    }

    /// True when every pixel is valid (the 0-degree identity case).
    pub fn is_full_mask(&self) -> bool {
        self.stats.count == (self.width() * self.height()) as u64
    }
}

/// The finite set of candidate angles and the per-level refinement step.
///
/// Coarse angles are multiples of `coarse_step_deg` anchored at 0,
/// starting at the smallest multiple >= -180 and stopping before 180.
/// The step halves per descent level, floored at `min_step_deg`, which
/// is also the quantization unit for the rotation cache.
#[derive(Clone, Debug)]
pub struct AngleLadder {
    coarse_step_deg: f64,
    min_step_deg: f64,
    coarse: Vec<f64>,
}

impl AngleLadder {
    pub(crate) fn full(coarse_step_deg: f64, min_step_deg: f64) -> Self {
        let mut coarse = Vec::new();
        let mut k = (-180.0 / coarse_step_deg).ceil() as i64;
        loop {
            let angle = k as f64 * coarse_step_deg;
            if angle >= 180.0 - 1e-9 {
                break;
            }
            coarse.push(angle);
            k += 1;
        }
        Self {
            coarse_step_deg,
            min_step_deg,
            coarse,
        }
    }

    /// The single-entry ladder used when rotation is disabled.
    pub(crate) fn identity() -> Self {
        Self {
            coarse_step_deg: 360.0,
            min_step_deg: 360.0,
            coarse: vec![0.0],
        }
    }

    pub fn is_identity(&self) -> bool {
        self.coarse.len() == 1 && self.coarse_step_deg >= 360.0
    }

    pub fn coarse_angles(&self) -> &[f64] {
        &self.coarse
    }

    pub fn min_step_deg(&self) -> f64 {
        self.min_step_deg
    }

    /// Angular step `n` levels below the top: halves per level, never
    /// below `min_step_deg`.
    pub fn step_below_top(&self, n: usize) -> f64 {
        (self.coarse_step_deg / 2f64.powi(n as i32)).max(self.min_step_deg)
    }

    /// Cache key of the nearest quantized angle, canonical in
    /// `[-180, 180)`.
    pub(crate) fn quantize(&self, angle_deg: f64) -> i64 {
        let a = wrap_deg(angle_deg);
        let key = (a / self.min_step_deg).round() as i64;
        if key as f64 * self.min_step_deg >= 180.0 - 1e-9 {
            ((key as f64 * self.min_step_deg - 360.0) / self.min_step_deg).round() as i64
        } else {
            key
        }
    }

    pub(crate) fn angle_for_key(&self, key: i64) -> f64 {
        wrap_deg(key as f64 * self.min_step_deg)
    }

    /// The angle window around `center`: `half_range` neighbors on each
    /// side at the given step, wrapped into `[-180, 180)`.
    pub(crate) fn neighbors(&self, center: f64, step: f64, half_range: usize) -> Vec<f64> {
        let half = half_range as i64;
        (-half..=half)
            .map(|j| wrap_deg(center + j as f64 * step))
            .collect()
    }
}

/// A template compiled for repeated matching: its pyramid, the angle
/// ladder, and a per-(level, quantized angle) cache of rotated copies.
#[derive(Debug)]
pub struct CompiledTemplate {
    levels: Vec<GrayImage>,
    ladder: AngleLadder,
    config: CompileConfig,
    rotation_capable: bool,
    cache: RwLock<HashMap<(usize, i64), Arc<RotatedTemplate>>>,
}

impl CompiledTemplate {
    /// Compile with rotation support: the full angle ladder, and (by
    /// default) eager materialization of every coarse angle at the top
    /// pyramid level, where the exhaustive scan dominates.
    pub fn compile(template: &GrayImage, config: &CompileConfig) -> Result<Self> {
        Self::build(template, config, true)
    }

    /// Compile for translation-only matching: the ladder collapses to
    /// `{0}` and rotation is skipped entirely.
    pub fn compile_no_rotation(template: &GrayImage, config: &CompileConfig) -> Result<Self> {
        Self::build(template, config, false)
    }

    fn build(template: &GrayImage, config: &CompileConfig, rotation: bool) -> Result<Self> {
        config.validate()?;

        let (w, h) = (template.width(), template.height());
        if w == 0 || h == 0 {
            return Err(MatchError::InvalidTemplate(format!(
                "zero-sized template ({w}x{h})"
            )));
        }
        let first = template.get(0, 0);
        let constant = (0..h).all(|y| template.row(y).iter().all(|&v| v == first));
        if constant {
            return Err(MatchError::InvalidTemplate(
                "constant-intensity template has zero variance".into(),
            ));
        }

        let levels = build_pyramid(template, config.max_levels, MIN_TEMPLATE_LEVEL_DIM, false);
        let ladder = if rotation {
            AngleLadder::full(config.coarse_step_deg, config.min_step_deg)
        } else {
            AngleLadder::identity()
        };

        let compiled = Self {
            levels,
            ladder,
            config: config.clone(),
            rotation_capable: rotation,
            cache: RwLock::new(HashMap::new()),
        };

        if rotation && config.precompute_coarsest {
            let top = compiled.levels.len() - 1;
            for &angle in compiled.ladder.coarse_angles() {
                compiled.rotated(top, angle);
            }
        }

        debug!(
            levels = compiled.levels.len(),
            angles = compiled.ladder.coarse_angles().len(),
            rotation,
            "compiled template"
        );
        Ok(compiled)
    }

    pub fn num_levels(&self) -> usize {
        self.levels.len()
    }

    pub fn level(&self, level: usize) -> &GrayImage {
        &self.levels[level]
    }

    pub fn ladder(&self) -> &AngleLadder {
        &self.ladder
    }

    pub fn config(&self) -> &CompileConfig {
        &self.config
    }

    /// True when this template was compiled with rotation support.
    pub fn rotation_capable(&self) -> bool {
        self.rotation_capable
    }

    /// The rotated copy for `(level, angle)`, materialized at the
    /// quantized angle.
    ///
    /// Reads go through the shared lock; on a miss the rotation is
    /// computed outside the write lock and the insert is double-checked,
    /// so concurrent workers agree on one entry.
    pub fn rotated(&self, level: usize, angle_deg: f64) -> Arc<RotatedTemplate> {
        let key = self.ladder.quantize(angle_deg);
        if let Ok(cache) = self.cache.read() {
            if let Some(hit) = cache.get(&(level, key)) {
                return Arc::clone(hit);
            }
        }

        let quantized = self.ladder.angle_for_key(key);
        let raster = if key == 0 {
            identity_raster(&self.levels[level])
        } else {
            rotate_bilinear_masked(&self.levels[level], quantized, self.config.fill_value)
        };
        let rotated = Arc::new(RotatedTemplate::from_raster(raster));

        let mut cache = match self.cache.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(
            cache
                .entry((level, key))
                .or_insert_with(|| Arc::clone(&rotated)),
        )
    }
}

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_ANGLE_HALF_RANGE_STEPS, DEFAULT_BEAM_WIDTH, DEFAULT_COARSE_STEP_DEG,
    DEFAULT_FILL_VALUE, DEFAULT_MAX_IMAGE_LEVELS, DEFAULT_MAX_LEVELS, DEFAULT_MIN_SCORE,
    DEFAULT_MIN_STEP_DEG, DEFAULT_MIN_VAR, DEFAULT_NMS_RADIUS, DEFAULT_PER_ANGLE_TOPK,
    DEFAULT_ROI_RADIUS,
};
use crate::error::{MatchError, Result};

/// Similarity metric evaluated at each candidate window.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    /// Zero-mean normalized cross-correlation in [-1, 1].
    /// Invariant to per-window gain and bias.
    #[default]
    Zncc,
    /// Negated sum of squared differences. Not illumination-invariant;
    /// exposed mainly for baselines.
    Ssd,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Zncc => write!(f, "zncc"),
            Metric::Ssd => write!(f, "ssd"),
        }
    }
}

impl FromStr for Metric {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "zncc" => Ok(Metric::Zncc),
            "ssd" => Ok(Metric::Ssd),
            other => Err(MatchError::InvalidConfig(format!(
                "unknown metric '{other}' (expected 'zncc' or 'ssd')"
            ))),
        }
    }
}

/// Whether the search explores the angle ladder or stays at 0 degrees.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RotationMode {
    #[default]
    Disabled,
    Enabled,
}

impl fmt::Display for RotationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotationMode::Disabled => write!(f, "disabled"),
            RotationMode::Enabled => write!(f, "enabled"),
        }
    }
}

impl FromStr for RotationMode {
    type Err = MatchError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "disabled" => Ok(RotationMode::Disabled),
            "enabled" => Ok(RotationMode::Enabled),
            other => Err(MatchError::InvalidConfig(format!(
                "unknown rotation mode '{other}' (expected 'enabled' or 'disabled')"
            ))),
        }
    }
}

/// Parameters for template compilation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CompileConfig {
    /// Cap on template pyramid height (levels, including finest).
    #[serde(default = "default_max_levels")]
    pub max_levels: usize,
    /// Angular spacing at the top of the ladder, in degrees.
    #[serde(default = "default_coarse_step_deg")]
    pub coarse_step_deg: f64,
    /// Finest angular spacing reached during descent, in degrees.
    #[serde(default = "default_min_step_deg")]
    pub min_step_deg: f64,
    /// Byte written outside the validity mask during rotation.
    #[serde(default = "default_fill_value")]
    pub fill_value: u8,
    /// Eagerly materialize every coarse angle at the top pyramid level.
    #[serde(default = "default_precompute_coarsest")]
    pub precompute_coarsest: bool,
}

fn default_max_levels() -> usize {
    DEFAULT_MAX_LEVELS
}

fn default_coarse_step_deg() -> f64 {
    DEFAULT_COARSE_STEP_DEG
}

fn default_min_step_deg() -> f64 {
    DEFAULT_MIN_STEP_DEG
}

fn default_fill_value() -> u8 {
    DEFAULT_FILL_VALUE
}

fn default_precompute_coarsest() -> bool {
    true
}

impl Default for CompileConfig {
    fn default() -> Self {
        Self {
            max_levels: default_max_levels(),
            coarse_step_deg: default_coarse_step_deg(),
            min_step_deg: default_min_step_deg(),
            fill_value: default_fill_value(),
            precompute_coarsest: default_precompute_coarsest(),
        }
    }
}

impl CompileConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_levels == 0 {
            return Err(MatchError::InvalidConfig(
                "max_levels must be at least 1".into(),
            ));
        }
        if !self.coarse_step_deg.is_finite() || self.coarse_step_deg <= 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "coarse_step_deg must be positive, got {}",
                self.coarse_step_deg
            )));
        }
        if !self.min_step_deg.is_finite() || self.min_step_deg <= 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "min_step_deg must be positive, got {}",
                self.min_step_deg
            )));
        }
        if self.min_step_deg > self.coarse_step_deg {
            return Err(MatchError::InvalidConfig(format!(
                "min_step_deg {} exceeds coarse_step_deg {}",
                self.min_step_deg, self.coarse_step_deg
            )));
        }
        Ok(())
    }
}

/// Parameters for one matching invocation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    #[serde(default)]
    pub metric: Metric,
    #[serde(default)]
    pub rotation: RotationMode,
    /// Run the search on the Rayon worker pool instead of the caller's thread.
    #[serde(default)]
    pub parallel: bool,
    /// Cap on image pyramid height.
    #[serde(default = "default_max_image_levels")]
    pub max_image_levels: usize,
    /// Global beam size during descent.
    #[serde(default = "default_beam_width")]
    pub beam_width: usize,
    /// Per-angle candidate queue bound.
    #[serde(default = "default_per_angle_topk")]
    pub per_angle_topk: usize,
    /// Pixel radius for non-maximum suppression.
    #[serde(default = "default_nms_radius")]
    pub nms_radius: usize,
    /// ROI half-size around a propagated candidate, in pixels.
    #[serde(default = "default_roi_radius")]
    pub roi_radius: usize,
    /// Ladder neighbors searched on each side per descent level.
    #[serde(default = "default_angle_half_range_steps")]
    pub angle_half_range_steps: usize,
    /// Variance floor for the image-side ZNCC denominator.
    #[serde(default = "default_min_var")]
    pub min_var_i: f64,
    /// Variance floor for the template-side ZNCC denominator.
    #[serde(default = "default_min_var")]
    pub min_var_t: f64,
    /// Candidates scoring strictly below this are dropped at every
    /// level. The default is a large negative sentinel, not negative
    /// infinity, so the struct survives JSON round trips.
    #[serde(default = "default_min_score")]
    pub min_score: f64,
}

fn default_max_image_levels() -> usize {
    DEFAULT_MAX_IMAGE_LEVELS
}

fn default_beam_width() -> usize {
    DEFAULT_BEAM_WIDTH
}

fn default_per_angle_topk() -> usize {
    DEFAULT_PER_ANGLE_TOPK
}

fn default_nms_radius() -> usize {
    DEFAULT_NMS_RADIUS
}

fn default_roi_radius() -> usize {
    DEFAULT_ROI_RADIUS
}

fn default_angle_half_range_steps() -> usize {
    DEFAULT_ANGLE_HALF_RANGE_STEPS
}

fn default_min_var() -> f64 {
    DEFAULT_MIN_VAR
}

fn default_min_score() -> f64 {
    DEFAULT_MIN_SCORE
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            metric: Metric::default(),
            rotation: RotationMode::default(),
            parallel: false,
            max_image_levels: default_max_image_levels(),
            beam_width: default_beam_width(),
            per_angle_topk: default_per_angle_topk(),
            nms_radius: default_nms_radius(),
            roi_radius: default_roi_radius(),
            angle_half_range_steps: default_angle_half_range_steps(),
            min_var_i: default_min_var(),
            min_var_t: default_min_var(),
            min_score: default_min_score(),
        }
    }
}

impl MatchConfig {
    pub fn validate(&self) -> Result<()> {
        if self.beam_width == 0 {
            return Err(MatchError::InvalidConfig(
                "beam_width must be at least 1".into(),
            ));
        }
        if self.per_angle_topk == 0 {
            return Err(MatchError::InvalidConfig(
                "per_angle_topk must be at least 1".into(),
            ));
        }
        if self.max_image_levels == 0 {
            return Err(MatchError::InvalidConfig(
                "max_image_levels must be at least 1".into(),
            ));
        }
        if !self.min_var_i.is_finite() || self.min_var_i < 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "min_var_i must be non-negative, got {}",
                self.min_var_i
            )));
        }
        if !self.min_var_t.is_finite() || self.min_var_t < 0.0 {
            return Err(MatchError::InvalidConfig(format!(
                "min_var_t must be non-negative, got {}",
                self.min_var_t
            )));
        }
        if self.min_score.is_nan() {
            return Err(MatchError::InvalidConfig("min_score must not be NaN".into()));
        }
        Ok(())
    }
}

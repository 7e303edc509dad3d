/// 5-tap binomial kernel [1, 4, 6, 4, 1]; the weights sum to 16.
pub const BINOMIAL_KERNEL: [u32; 5] = [1, 4, 6, 4, 1];

/// Template pyramid construction stops before a level smaller than this
/// on either side.
pub const MIN_TEMPLATE_LEVEL_DIM: usize = 4;

/// Default cap on template pyramid height (levels, including finest).
pub const DEFAULT_MAX_LEVELS: usize = 4;

/// Default angular spacing at the top of the ladder, in degrees.
pub const DEFAULT_COARSE_STEP_DEG: f64 = 30.0;

/// Default finest angular spacing reached during descent, in degrees.
pub const DEFAULT_MIN_STEP_DEG: f64 = 7.5;

/// Default byte written outside the validity mask during rotation.
pub const DEFAULT_FILL_VALUE: u8 = 0;

/// Default cap on image pyramid height.
pub const DEFAULT_MAX_IMAGE_LEVELS: usize = 4;

/// Default global beam size during descent.
pub const DEFAULT_BEAM_WIDTH: usize = 6;

/// Default per-angle candidate queue bound.
pub const DEFAULT_PER_ANGLE_TOPK: usize = 3;

/// Default pixel radius for non-maximum suppression.
pub const DEFAULT_NMS_RADIUS: usize = 4;

/// Default ROI half-size around a propagated candidate, in pixels.
pub const DEFAULT_ROI_RADIUS: usize = 6;

/// Default number of ladder neighbors searched on each side per descent.
pub const DEFAULT_ANGLE_HALF_RANGE_STEPS: usize = 1;

/// Default variance floor guarding ZNCC denominators.
pub const DEFAULT_MIN_VAR: f64 = 1e-8;

/// Default score cutoff: effectively "keep everything". Finite because
/// JSON cannot represent negative infinity, so configs must survive a
/// serde_json round trip.
pub const DEFAULT_MIN_SCORE: f64 = -1.0e38;

//! Grayscale template matching with coarse-to-fine pyramid search.
//!
//! A template is compiled once ([`CompiledTemplate`]) and matched
//! repeatedly against query images, optionally over a ladder of
//! rotation angles, under ZNCC or SSD scoring. Results are
//! deterministic: the same inputs and configuration produce
//! byte-identical matches, sequential or parallel.

pub mod config;
pub mod consts;
pub mod error;
pub mod integral;
pub mod matcher;
pub mod preprocess;
pub mod pyramid;
pub mod raster;
mod refine;
pub mod rotate;
pub mod score;
mod search;
pub mod template;

pub use config::{CompileConfig, MatchConfig, Metric, RotationMode};
pub use error::{MatchError, Result};
pub use matcher::{match_template, match_template_with, Match, Matcher};
pub use preprocess::CompiledImage;
pub use raster::GrayImage;
pub use template::CompiledTemplate;

//! The on-disk JSON config shared by `find` and `synth`.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use corrmatch_core::{CompileConfig, MatchConfig};

/// One matching invocation, as written next to each synthetic case.
#[derive(Serialize, Deserialize)]
pub struct CliConfig {
    pub image_path: String,
    pub template_path: String,
    #[serde(default = "default_topk")]
    pub topk: usize,
    #[serde(default)]
    pub compile: CompileConfig,
    #[serde(rename = "match", default)]
    pub match_config: MatchConfig,
}

fn default_topk() -> usize {
    1
}

impl CliConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("parsing config {}", path.display()))
    }
}

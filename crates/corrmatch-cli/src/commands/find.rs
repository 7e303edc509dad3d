use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use clap::Args;
use tracing::debug;

use corrmatch_core::{
    CompileConfig, CompiledTemplate, GrayImage, MatchConfig, Metric, RotationMode,
};

use super::config::CliConfig;

#[derive(Args)]
pub struct FindArgs {
    /// JSON config (as written by `synth`); image and template paths are
    /// resolved relative to it
    #[arg(long, conflicts_with_all = ["image", "template"])]
    config: Option<PathBuf>,

    /// Query image (8-bit grayscale PNG; other modes are converted)
    #[arg(long)]
    image: Option<PathBuf>,

    /// Template image
    #[arg(long)]
    template: Option<PathBuf>,

    /// Number of matches to report
    #[arg(long, default_value_t = 1)]
    topk: usize,

    /// Search the rotation ladder
    #[arg(long)]
    rotation: bool,

    /// Similarity metric (zncc or ssd)
    #[arg(long, default_value = "zncc")]
    metric: String,

    /// Run the search on the worker pool
    #[arg(long)]
    parallel: bool,
}

pub fn run(args: &FindArgs) -> Result<()> {
    let (image_path, template_path, topk, compile_config, match_config) =
        resolve_invocation(args)?;

    let image = load_gray(&image_path)?;
    let template = load_gray(&template_path)?;
    debug!(
        image = %image_path.display(),
        template = %template_path.display(),
        rotation = %match_config.rotation,
        metric = %match_config.metric,
        "running matcher"
    );

    let compiled = match match_config.rotation {
        RotationMode::Enabled => CompiledTemplate::compile(&template, &compile_config)?,
        RotationMode::Disabled => CompiledTemplate::compile_no_rotation(&template, &compile_config)?,
    };
    let matcher = compiled.matcher(match_config)?;
    let matches = matcher.match_topk(&image, topk)?;

    println!("{}", serde_json::to_string_pretty(&matches)?);
    Ok(())
}

fn resolve_invocation(
    args: &FindArgs,
) -> Result<(PathBuf, PathBuf, usize, CompileConfig, MatchConfig)> {
    if let Some(config_path) = &args.config {
        let config = CliConfig::load(config_path)?;
        let base = config_path.parent().unwrap_or_else(|| Path::new("."));
        return Ok((
            base.join(&config.image_path),
            base.join(&config.template_path),
            config.topk,
            config.compile,
            config.match_config,
        ));
    }

    let (Some(image), Some(template)) = (&args.image, &args.template) else {
        bail!("either --config or both --image and --template are required");
    };

    let match_config = MatchConfig {
        metric: Metric::from_str(&args.metric)?,
        rotation: if args.rotation {
            RotationMode::Enabled
        } else {
            RotationMode::Disabled
        },
        parallel: args.parallel,
        ..MatchConfig::default()
    };
    Ok((
        image.clone(),
        template.clone(),
        args.topk,
        CompileConfig::default(),
        match_config,
    ))
}

/// Load a PNG (or any format the image crate handles) as 8-bit grayscale.
fn load_gray(path: &Path) -> Result<GrayImage> {
    let img = image::open(path)
        .with_context(|| format!("loading image {}", path.display()))?
        .to_luma8();
    let (width, height) = img.dimensions();
    Ok(GrayImage::from_raw(
        width as usize,
        height as usize,
        img.into_raw(),
    )?)
}

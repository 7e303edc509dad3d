//! The matching entry points: a `Matcher` borrowing a compiled template,
//! plus the one-shot convenience function.

use serde::Serialize;
use tracing::debug;

use crate::config::{CompileConfig, MatchConfig, RotationMode};
use crate::error::{MatchError, Result};
use crate::preprocess::CompiledImage;
use crate::raster::GrayImage;
use crate::template::CompiledTemplate;
use crate::{refine, search};

/// One reported match, in finest-level coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Match {
    /// Window top-left, possibly fractional after refinement.
    pub x: f64,
    pub y: f64,
    /// Rotation of the matched instance, in `(-180, 180]` degrees.
    pub angle_deg: f64,
    pub score: f64,
}

/// Runs matching invocations against one compiled template.
///
/// The matcher borrows the template and never mutates it (the lazy
/// rotation cache is interior, shared state). Per-image work lives in a
/// [`CompiledImage`], built fresh per call unless the caller reuses one.
pub struct Matcher<'a> {
    template: &'a CompiledTemplate,
    config: MatchConfig,
}

impl CompiledTemplate {
    /// A matcher over this template with the given configuration.
    pub fn matcher(&self, config: MatchConfig) -> Result<Matcher<'_>> {
        Matcher::new(self, config)
    }
}

impl<'a> Matcher<'a> {
    pub fn new(template: &'a CompiledTemplate, config: MatchConfig) -> Result<Self> {
        config.validate()?;
        if config.rotation == RotationMode::Enabled && !template.rotation_capable() {
            return Err(MatchError::InvalidConfig(
                "rotation enabled but the template was compiled without rotation".into(),
            ));
        }
        Ok(Self { template, config })
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Preprocess a query image for this matcher. Useful when the same
    /// image is matched against several templates.
    pub fn compile_image(&self, image: &GrayImage) -> Result<CompiledImage> {
        self.validate_image(image)?;
        let levels = self.config.max_image_levels.min(self.template.num_levels());
        Ok(CompiledImage::compile(image, levels, self.config.parallel))
    }

    /// The single best match, or `None` when nothing clears `min_score`.
    pub fn match_image(&self, image: &GrayImage) -> Result<Option<Match>> {
        Ok(self.match_topk(image, 1)?.into_iter().next())
    }

    /// The best `k` matches after non-maximum suppression, best first.
    /// Fewer than `k` entries come back when fewer distinct candidates
    /// survive.
    pub fn match_topk(&self, image: &GrayImage, k: usize) -> Result<Vec<Match>> {
        let compiled = self.compile_image(image)?;
        self.match_compiled(&compiled, k)
    }

    /// Match against an already preprocessed image.
    pub fn match_compiled(&self, image: &CompiledImage, k: usize) -> Result<Vec<Match>> {
        if k == 0 {
            return Err(MatchError::InvalidConfig(
                "requested match count must be at least 1".into(),
            ));
        }
        let finest = image.level(0);
        let tpl = self.template.level(0);
        if finest.width() < tpl.width() || finest.height() < tpl.height() {
            return Err(MatchError::InvalidImage(format!(
                "image {}x{} smaller than template {}x{}",
                finest.width(),
                finest.height(),
                tpl.width(),
                tpl.height()
            )));
        }

        let beam = search::run(self.template, image, &self.config);
        if beam.is_empty() {
            debug!("no candidate survived the score cutoff");
            return Ok(Vec::new());
        }

        let top = image.num_levels().min(self.template.num_levels()) - 1;
        let finest_step = self.template.ladder().step_below_top(top);
        Ok(refine::assemble(
            self.template,
            image,
            &self.config,
            beam,
            k,
            finest_step,
        ))
    }

    fn validate_image(&self, image: &GrayImage) -> Result<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(MatchError::InvalidImage(format!(
                "zero-sized image ({}x{})",
                image.width(),
                image.height()
            )));
        }
        let tpl = self.template.level(0);
        if image.width() < tpl.width() || image.height() < tpl.height() {
            return Err(MatchError::InvalidImage(format!(
                "image {}x{} smaller than template {}x{}",
                image.width(),
                image.height(),
                tpl.width(),
                tpl.height()
            )));
        }
        Ok(())
    }
}

/// One-shot convenience: compile the template without rotation support
/// and return the single best match under default configuration.
pub fn match_template(image: &GrayImage, template: &GrayImage) -> Result<Option<Match>> {
    match_template_with(
        image,
        template,
        &CompileConfig::default(),
        &MatchConfig::default(),
    )
}

/// One-shot matching with explicit configuration. The template is
/// compiled with or without rotation support according to
/// `match_config.rotation`.
pub fn match_template_with(
    image: &GrayImage,
    template: &GrayImage,
    compile_config: &CompileConfig,
    match_config: &MatchConfig,
) -> Result<Option<Match>> {
    let compiled = match match_config.rotation {
        RotationMode::Enabled => CompiledTemplate::compile(template, compile_config)?,
        RotationMode::Disabled => CompiledTemplate::compile_no_rotation(template, compile_config)?,
    };
    let matcher = compiled.matcher(match_config.clone())?;
    matcher.match_image(image)
}

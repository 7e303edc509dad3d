//! Deterministic synthetic case generation with ground-truth metadata.
//!
//! Each case directory holds `image.png`, `template.png`, a `meta.json`
//! with the embedded instances, and a `cli_config.json` that `find`
//! accepts directly. The standard suite covers translation (including a
//! large-image variant), rotation (coarse, fine, wrap-boundary, and
//! single-level), noise, blur, illumination, occlusion, distractors,
//! edge placement, a negative case, and pyramid stress.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;
use tracing::info;

use corrmatch_core::rotate::rotate_bilinear_masked;
use corrmatch_core::{CompileConfig, GrayImage, MatchConfig, Metric, RotationMode};

use super::config::CliConfig;

#[derive(Args)]
pub struct SynthArgs {
    /// Output directory; one subdirectory per case
    #[arg(long, default_value = "synthetic_cases")]
    out_dir: PathBuf,

    /// Base seed mixed into every case
    #[arg(long, default_value_t = 1)]
    seed: u64,

    /// Generate only the named case
    #[arg(long)]
    case: Option<String>,
}

struct CaseSpec {
    case_id: &'static str,
    family: &'static str,
    image_size: (usize, usize),
    template_size: (usize, usize),
    pattern: Pattern,
    background: Background,
    rotation_deg: f64,
    present: bool,
    gain: f64,
    bias: f64,
    noise_sigma: f64,
    blur_sigma: f64,
    occlusion_frac: f64,
    /// Extra template copies with jittered gain/bias.
    distractors: usize,
    place: Placement,
    /// Defaults to one per embedded instance.
    topk: Option<usize>,
    max_levels: Option<usize>,
    max_image_levels: Option<usize>,
    per_angle_topk: Option<usize>,
    /// `(coarse_step_deg, min_step_deg)` ladder override.
    ladder_steps: Option<(f64, f64)>,
}

impl Default for CaseSpec {
    fn default() -> Self {
        Self {
            case_id: "",
            family: "",
            image_size: (256, 192),
            template_size: (64, 48),
            pattern: Pattern::Xor,
            background: Background::Flat(30),
            rotation_deg: 0.0,
            present: true,
            gain: 1.0,
            bias: 0.0,
            noise_sigma: 0.0,
            blur_sigma: 0.0,
            occlusion_frac: 0.0,
            distractors: 0,
            place: Placement::Random,
            topk: None,
            max_levels: None,
            max_image_levels: None,
            per_angle_topk: None,
            ladder_steps: None,
        }
    }
}

#[derive(Clone, Copy)]
enum Pattern {
    Xor,
    Checker,
    Bars,
    Rings,
    Asymmetric,
}

impl Pattern {
    fn name(self) -> &'static str {
        match self {
            Pattern::Xor => "xor",
            Pattern::Checker => "checker",
            Pattern::Bars => "bars",
            Pattern::Rings => "rings",
            Pattern::Asymmetric => "asymmetric",
        }
    }
}

#[derive(Clone, Copy)]
enum Background {
    Flat(u8),
    Gradient,
    Xor,
    Noise,
    Mixed,
}

impl Background {
    fn name(self) -> &'static str {
        match self {
            Background::Flat(_) => "flat",
            Background::Gradient => "gradient",
            Background::Xor => "xor",
            Background::Noise => "noise",
            Background::Mixed => "mixed",
        }
    }
}

#[derive(Clone, Copy)]
enum Placement {
    /// Anywhere with a small interior margin.
    Random,
    /// Flush against one image border.
    Edge,
}

fn case_specs() -> Vec<CaseSpec> {
    vec![
        CaseSpec {
            case_id: "clean_translation",
            family: "translation",
            max_levels: Some(3),
            max_image_levels: Some(3),
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "clean_translation_large",
            family: "translation",
            image_size: (1024, 768),
            template_size: (192, 160),
            background: Background::Gradient,
            max_levels: Some(5),
            max_image_levels: Some(5),
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "rotation_coarse_30deg",
            family: "rotation",
            image_size: (320, 240),
            template_size: (96, 72),
            rotation_deg: 30.0,
            max_levels: Some(3),
            max_image_levels: Some(3),
            ladder_steps: Some((30.0, 30.0)),
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "rotation_fine_22_5deg",
            family: "rotation",
            image_size: (320, 240),
            template_size: (80, 60),
            pattern: Pattern::Asymmetric,
            background: Background::Gradient,
            rotation_deg: 22.5,
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "rotation_wrap_172_5deg",
            family: "rotation",
            image_size: (300, 220),
            template_size: (72, 56),
            pattern: Pattern::Bars,
            rotation_deg: 172.5,
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "rotation_fine_single_level",
            family: "rotation",
            image_size: (320, 240),
            template_size: (80, 60),
            pattern: Pattern::Asymmetric,
            background: Background::Gradient,
            rotation_deg: 22.5,
            max_levels: Some(1),
            max_image_levels: Some(1),
            ladder_steps: Some((5.0, 1.0)),
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "noise_gaussian",
            family: "noise",
            image_size: (320, 240),
            template_size: (80, 64),
            background: Background::Gradient,
            noise_sigma: 12.0,
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "blur_sigma_1_5",
            family: "blur",
            image_size: (320, 240),
            template_size: (88, 68),
            pattern: Pattern::Checker,
            background: Background::Mixed,
            blur_sigma: 1.5,
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "illumination_shift",
            family: "illumination",
            image_size: (300, 220),
            template_size: (72, 52),
            background: Background::Gradient,
            gain: 1.25,
            bias: 14.0,
            max_image_levels: Some(3),
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "occluded_25pct",
            family: "occlusion",
            image_size: (320, 240),
            template_size: (90, 70),
            background: Background::Flat(128),
            occlusion_frac: 0.25,
            noise_sigma: 4.0,
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "distractors_topk",
            family: "distractors",
            image_size: (420, 320),
            template_size: (80, 60),
            pattern: Pattern::Rings,
            background: Background::Mixed,
            distractors: 3,
            topk: Some(4),
            per_angle_topk: Some(4),
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "near_border",
            family: "edge",
            image_size: (320, 240),
            template_size: (88, 68),
            pattern: Pattern::Bars,
            background: Background::Gradient,
            place: Placement::Edge,
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "negative_no_match",
            family: "negative",
            image_size: (320, 240),
            template_size: (80, 64),
            background: Background::Noise,
            present: false,
            noise_sigma: 6.0,
            ..CaseSpec::default()
        },
        CaseSpec {
            case_id: "pyramid_stress",
            family: "pyramid",
            image_size: (1200, 900),
            template_size: (160, 120),
            pattern: Pattern::Checker,
            background: Background::Xor,
            noise_sigma: 3.0,
            max_levels: Some(6),
            max_image_levels: Some(6),
            ..CaseSpec::default()
        },
        // Single-level twin of the stress case, isolating the scoring
        // kernels from pyramid descent.
        CaseSpec {
            case_id: "pyramid_stress_single_level",
            family: "pyramid",
            image_size: (1200, 900),
            template_size: (160, 120),
            pattern: Pattern::Checker,
            background: Background::Xor,
            noise_sigma: 3.0,
            max_levels: Some(1),
            max_image_levels: Some(1),
            ..CaseSpec::default()
        },
    ]
}

pub fn run(args: &SynthArgs) -> Result<()> {
    let specs = case_specs();
    let selected: Vec<&CaseSpec> = match &args.case {
        Some(name) => {
            let found: Vec<&CaseSpec> = specs.iter().filter(|s| s.case_id == *name).collect();
            if found.is_empty() {
                bail!("unknown case '{name}'");
            }
            found
        }
        None => specs.iter().collect(),
    };

    fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("creating {}", args.out_dir.display()))?;

    let mut case_ids = Vec::new();
    for (index, spec) in selected.into_iter().enumerate() {
        let dir = args.out_dir.join(spec.case_id);
        fs::create_dir_all(&dir)?;
        generate_case(spec, &dir, stable_seed(args.seed, spec.case_id, index))?;
        info!(case = spec.case_id, dir = %dir.display(), "generated case");
        case_ids.push(spec.case_id);
    }

    let manifest = json!({ "cases": case_ids });
    fs::write(
        args.out_dir.join("manifest.json"),
        serde_json::to_string_pretty(&manifest)?,
    )?;
    println!("generated {} case(s) in {}", case_ids.len(), args.out_dir.display());
    Ok(())
}

fn generate_case(spec: &CaseSpec, dir: &Path, seed: u64) -> Result<()> {
    let mut rng = Lcg::new(seed);
    let (img_w, img_h) = spec.image_size;
    let (tpl_w, tpl_h) = spec.template_size;

    let template = make_pattern(spec.pattern, tpl_w, tpl_h, &mut rng);
    let mut canvas = make_background(spec.background, img_w, img_h, &mut rng);

    let rotation_enabled = spec.rotation_deg.abs() > 1e-6;
    let mut instances = Vec::new();
    let mut avoid: Vec<(usize, usize, usize, usize)> = Vec::new();

    if spec.present {
        let (x0, y0) = choose_position(&mut rng, img_w, img_h, tpl_w, tpl_h, spec.place, &avoid);

        if rotation_enabled {
            let rotated = rotate_bilinear_masked(&template, spec.rotation_deg, 0);
            for y in 0..tpl_h {
                for x in 0..tpl_w {
                    if rotated.mask[[y, x]] != 0 {
                        let value = f64::from(rotated.data[[y, x]]) * spec.gain + spec.bias;
                        canvas[(y0 + y) * img_w + x0 + x] =
                            value.round().clamp(0.0, 255.0) as u8;
                    }
                }
            }
        } else {
            embed_plain(&mut canvas, img_w, &template, x0, y0, spec.gain, spec.bias);
        }
        avoid.push((x0, y0, tpl_w, tpl_h));

        let occlusion = if spec.occlusion_frac > 0.0 {
            Some(occlude(
                &mut canvas,
                img_w,
                spec.background,
                x0,
                y0,
                tpl_w,
                tpl_h,
                spec.occlusion_frac,
            ))
        } else {
            None
        };

        instances.push(json!({
            "kind": "target",
            "x": x0,
            "y": y0,
            "angle_deg": spec.rotation_deg,
            "gain": spec.gain,
            "bias": spec.bias,
            "occlusion": occlusion,
        }));
    }

    for _ in 0..spec.distractors {
        let (dx, dy) =
            choose_position(&mut rng, img_w, img_h, tpl_w, tpl_h, Placement::Random, &avoid);
        let gain = spec.gain * rng.uniform(0.9, 1.1);
        let bias = spec.bias + rng.uniform(-5.0, 5.0);
        embed_plain(&mut canvas, img_w, &template, dx, dy, gain, bias);
        avoid.push((dx, dy, tpl_w, tpl_h));
        instances.push(json!({
            "kind": "distractor",
            "x": dx,
            "y": dy,
            "angle_deg": 0.0,
            "gain": gain,
            "bias": bias,
        }));
    }

    if spec.blur_sigma > 0.0 {
        canvas = gaussian_blur_u8(&canvas, img_w, img_h, spec.blur_sigma);
    }
    if spec.noise_sigma > 0.0 {
        for v in &mut canvas {
            *v = (f64::from(*v) + rng.normal(spec.noise_sigma))
                .round()
                .clamp(0.0, 255.0) as u8;
        }
    }

    let mut compile = CompileConfig::default();
    if let Some(levels) = spec.max_levels {
        compile.max_levels = levels;
    }
    if let Some((coarse, min)) = spec.ladder_steps {
        compile.coarse_step_deg = coarse;
        compile.min_step_deg = min;
    }
    let mut match_config = MatchConfig {
        metric: Metric::Zncc,
        rotation: if rotation_enabled {
            RotationMode::Enabled
        } else {
            RotationMode::Disabled
        },
        ..MatchConfig::default()
    };
    if let Some(levels) = spec.max_image_levels {
        match_config.max_image_levels = levels;
    }
    if let Some(per_angle) = spec.per_angle_topk {
        match_config.per_angle_topk = per_angle;
    }

    let topk = spec
        .topk
        .unwrap_or(if spec.present { 1 + spec.distractors } else { 1 });
    let cli_config = CliConfig {
        image_path: "image.png".into(),
        template_path: "template.png".into(),
        topk,
        compile,
        match_config,
    };

    save_png(&dir.join("image.png"), img_w, img_h, &canvas)?;
    let tpl_bytes: Vec<u8> = (0..tpl_h).flat_map(|y| template.row(y).to_vec()).collect();
    save_png(&dir.join("template.png"), tpl_w, tpl_h, &tpl_bytes)?;
    fs::write(
        dir.join("cli_config.json"),
        serde_json::to_string_pretty(&cli_config)?,
    )?;

    let meta = json!({
        "case_id": spec.case_id,
        "family": spec.family,
        "seed": seed,
        "present": spec.present,
        "image": { "width": img_w, "height": img_h },
        "template": { "width": tpl_w, "height": tpl_h, "pattern": spec.pattern.name() },
        "background": { "style": spec.background.name() },
        "rotation_deg": spec.rotation_deg,
        "effects": {
            "gain": spec.gain,
            "bias": spec.bias,
            "noise_sigma": spec.noise_sigma,
            "blur_sigma": spec.blur_sigma,
            "occlusion_frac": spec.occlusion_frac,
            "distractors": spec.distractors,
        },
        "instances": instances,
    });
    fs::write(dir.join("meta.json"), serde_json::to_string_pretty(&meta)?)?;
    Ok(())
}

/// Copy the template into the canvas with a per-pixel `v * gain + bias`.
fn embed_plain(
    canvas: &mut [u8],
    img_w: usize,
    template: &GrayImage,
    x0: usize,
    y0: usize,
    gain: f64,
    bias: f64,
) {
    for y in 0..template.height() {
        let row = template.row(y);
        let dst = (y0 + y) * img_w + x0;
        for (x, &v) in row.iter().enumerate() {
            let value = f64::from(v) * gain + bias;
            canvas[dst + x] = value.round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Pick an instance position that avoids the already-placed rectangles.
/// Edge placement lands flush against a border, exercising ROI clipping.
fn choose_position(
    rng: &mut Lcg,
    img_w: usize,
    img_h: usize,
    tpl_w: usize,
    tpl_h: usize,
    place: Placement,
    avoid: &[(usize, usize, usize, usize)],
) -> (usize, usize) {
    let margin = 2;
    let max_x = img_w - tpl_w;
    let max_y = img_h - tpl_h;

    let mut pick = |rng: &mut Lcg| -> (usize, usize) {
        match place {
            Placement::Edge => match rng.next_u32() % 4 {
                0 => (rng.range_in(0, margin.min(max_x)), rng.range_in(0, max_y)),
                1 => (
                    rng.range_in(max_x.saturating_sub(margin), max_x),
                    rng.range_in(0, max_y),
                ),
                2 => (rng.range_in(0, max_x), rng.range_in(0, margin.min(max_y))),
                _ => (
                    rng.range_in(0, max_x),
                    rng.range_in(max_y.saturating_sub(margin), max_y),
                ),
            },
            Placement::Random => {
                let x = if max_x > 2 * margin {
                    rng.range_in(margin, max_x - margin)
                } else {
                    0
                };
                let y = if max_y > 2 * margin {
                    rng.range_in(margin, max_y - margin)
                } else {
                    0
                };
                (x, y)
            }
        }
    };

    for _ in 0..80 {
        let (x, y) = pick(rng);
        let rect = (x, y, tpl_w, tpl_h);
        if !avoid.iter().any(|other| rects_overlap(rect, *other)) {
            return (x, y);
        }
    }
    pick(rng)
}

fn rects_overlap(a: (usize, usize, usize, usize), b: (usize, usize, usize, usize)) -> bool {
    let (ax, ay, aw, ah) = a;
    let (bx, by, bw, bh) = b;
    ax < bx + bw && ax + aw > bx && ay < by + bh && ay + ah > by
}

/// Replace a block covering roughly `frac` of the instance with the
/// background value, returning its rectangle for the metadata.
#[allow(clippy::too_many_arguments)]
fn occlude(
    canvas: &mut [u8],
    img_w: usize,
    background: Background,
    x0: usize,
    y0: usize,
    tpl_w: usize,
    tpl_h: usize,
    frac: f64,
) -> serde_json::Value {
    let occ_w = ((tpl_w as f64) * frac.sqrt()).round() as usize;
    let occ_h = ((tpl_h as f64) * frac.sqrt()).round() as usize;
    let ox = x0 + tpl_w - occ_w;
    let oy = y0 + tpl_h - occ_h;
    let value = match background {
        Background::Flat(v) => v,
        _ => 128,
    };
    for y in oy..oy + occ_h {
        for x in ox..ox + occ_w {
            canvas[y * img_w + x] = value;
        }
    }
    json!({ "x": ox, "y": oy, "width": occ_w, "height": occ_h })
}

fn make_pattern(pattern: Pattern, w: usize, h: usize, rng: &mut Lcg) -> GrayImage {
    let data = match pattern {
        Pattern::Xor => (0..h)
            .flat_map(|y| (0..w).map(move |x| (((x * 13) ^ (y * 7) ^ (x * y)) & 0xFF) as u8))
            .collect(),
        Pattern::Checker => {
            let cell = (w.min(h) / 8).max(2);
            (0..h)
                .flat_map(|y| {
                    (0..w).map(move |x| if (x / cell + y / cell) % 2 == 0 { 32 } else { 224 })
                })
                .collect()
        }
        Pattern::Bars => {
            let cell = (w / 12).max(2);
            let row: Vec<u8> = (0..w)
                .map(|x| if (x / cell) % 2 == 0 { 40 } else { 210 })
                .collect();
            (0..h).flat_map(|_| row.clone()).collect()
        }
        Pattern::Rings => {
            let cx = (w - 1) as f64 * 0.5;
            let cy = (h - 1) as f64 * 0.5;
            (0..h)
                .flat_map(|y| {
                    (0..w).map(move |x| {
                        let r = (x as f64 - cx).hypot(y as f64 - cy);
                        (128.0 + 110.0 * (r * 0.35).sin()).round().clamp(0.0, 255.0) as u8
                    })
                })
                .collect()
        }
        Pattern::Asymmetric => {
            let mut data = vec![80u8; w * h];
            for y in 0..h / 4 {
                for x in 0..w {
                    data[y * w + x] = 200;
                }
            }
            for y in 0..h {
                for x in 0..w / 4 {
                    data[y * w + x] = 200;
                }
            }
            for v in &mut data {
                let jitter = i32::from(rng.byte_in(0, 30)) - 15;
                *v = (i32::from(*v) + jitter).clamp(0, 255) as u8;
            }
            data
        }
    };
    GrayImage::from_raw(w, h, data).expect("pattern buffer matches dimensions")
}

fn make_background(background: Background, w: usize, h: usize, rng: &mut Lcg) -> Vec<u8> {
    match background {
        Background::Flat(value) => vec![value; w * h],
        Background::Gradient => gradient_background(w, h, rng),
        Background::Xor => (0..h)
            .flat_map(|y| (0..w).map(move |x| ((x * 9 + y * 5 + x * y) & 0xFF) as u8))
            .collect(),
        Background::Noise => (0..w * h).map(|_| rng.byte_in(0, 255)).collect(),
        Background::Mixed => {
            let mut data = gradient_background(w, h, rng);
            for v in &mut data {
                let jitter = i32::from(rng.byte_in(0, 40)) - 20;
                *v = (i32::from(*v) + jitter).clamp(0, 255) as u8;
            }
            data
        }
    }
}

fn gradient_background(w: usize, h: usize, rng: &mut Lcg) -> Vec<u8> {
    let base = f64::from(rng.byte_in(40, 140));
    let ax = rng.uniform(-0.4, 0.4);
    let ay = rng.uniform(-0.4, 0.4);
    (0..h)
        .flat_map(|y| {
            (0..w).map(move |x| {
                (base + ax * x as f64 + ay * y as f64)
                    .round()
                    .clamp(0.0, 255.0) as u8
            })
        })
        .collect()
}

/// Separable Gaussian blur with edge clamping, rounded back to u8.
fn gaussian_blur_u8(data: &[u8], w: usize, h: usize, sigma: f64) -> Vec<u8> {
    let kernel = gaussian_kernel_1d(sigma);
    if kernel.len() == 1 {
        return data.to_vec();
    }
    let radius = kernel.len() / 2;

    let mut temp = vec![0.0f64; w * h];
    for y in 0..h {
        let row = y * w;
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let sx = (x as isize + k as isize - radius as isize).clamp(0, w as isize - 1);
                acc += f64::from(data[row + sx as usize]) * weight;
            }
            temp[row + x] = acc;
        }
    }

    let mut out = vec![0u8; w * h];
    for y in 0..h {
        for x in 0..w {
            let mut acc = 0.0;
            for (k, &weight) in kernel.iter().enumerate() {
                let sy = (y as isize + k as isize - radius as isize).clamp(0, h as isize - 1);
                acc += temp[sy as usize * w + x] * weight;
            }
            out[y * w + x] = acc.round().clamp(0.0, 255.0) as u8;
        }
    }
    out
}

fn gaussian_kernel_1d(sigma: f64) -> Vec<f64> {
    if sigma <= 0.0 {
        return vec![1.0];
    }
    let radius = (3.0 * sigma).ceil().max(1.0) as isize;
    let denom = 2.0 * sigma * sigma;
    let mut kernel: Vec<f64> = (-radius..=radius)
        .map(|x| (-((x * x) as f64) / denom).exp())
        .collect();
    let norm: f64 = kernel.iter().sum();
    for v in &mut kernel {
        *v /= norm;
    }
    kernel
}

/// FNV-style mix of the base seed, case id, and case index, so renaming
/// or reordering cases never silently reuses pixel data.
fn stable_seed(base: u64, case_id: &str, index: usize) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in case_id.bytes() {
        hash ^= u64::from(byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash ^= (index as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    hash ^ base
}

/// Deterministic 64-bit LCG for fixture data.
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed.wrapping_mul(0x9e37_79b9_7f4a_7c15).wrapping_add(1))
    }

    fn next_u32(&mut self) -> u32 {
        self.0 = self
            .0
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (self.0 >> 33) as u32
    }

    fn byte_in(&mut self, lo: u8, hi: u8) -> u8 {
        let span = u32::from(hi) - u32::from(lo) + 1;
        lo + (self.next_u32() % span) as u8
    }

    /// Uniform integer in `[lo, hi]` inclusive.
    fn range_in(&mut self, lo: usize, hi: usize) -> usize {
        lo + (self.next_u32() as usize) % (hi - lo + 1)
    }

    fn unit(&mut self) -> f64 {
        f64::from(self.next_u32()) / f64::from(u32::MAX)
    }

    fn uniform(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.unit()
    }

    /// Zero-mean Gaussian sample via Box-Muller.
    fn normal(&mut self, sigma: f64) -> f64 {
        let u1 = self.unit().max(1e-12);
        let u2 = self.unit();
        sigma * (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

fn save_png(path: &Path, width: usize, height: usize, data: &[u8]) -> Result<()> {
    let buffer: image::ImageBuffer<image::Luma<u8>, Vec<u8>> =
        image::ImageBuffer::from_raw(width as u32, height as u32, data.to_vec())
            .context("pixel buffer does not match image dimensions")?;
    buffer
        .save(path)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

mod common;

use corrmatch_core::rotate::rotate_bilinear_masked;
use corrmatch_core::{
    match_template_with, CompileConfig, CompiledTemplate, GrayImage, MatchConfig, RotationMode,
};

use common::{embed_masked, image_from, random_image, Lcg};

fn rotation_config() -> MatchConfig {
    MatchConfig {
        rotation: RotationMode::Enabled,
        ..MatchConfig::default()
    }
}

/// An L-shaped pattern with jitter; no rotational symmetry.
fn asymmetric_template(size: usize, seed: u64) -> GrayImage {
    let mut rng = Lcg::new(seed);
    let mut data = vec![80u8; size * size];
    for y in 0..size / 4 {
        for x in 0..size {
            data[y * size + x] = 200;
        }
    }
    for y in 0..size {
        for x in 0..size / 4 {
            data[y * size + x] = 200;
        }
    }
    for v in &mut data {
        let jitter = i32::from(rng.byte_in(0, 30)) - 15;
        *v = (i32::from(*v) + jitter).clamp(0, 255) as u8;
    }
    image_from(size, size, data)
}

#[test]
fn horizontal_bar_matches_vertical_template_at_ninety_degrees() {
    // Centered vertical bar template, horizontal bar embedded: the
    // match angle must land near +-90 (the bar has 180-degree symmetry).
    let mut tpl_data = vec![0u8; 32 * 32];
    for y in 8..24 {
        for x in 14..18 {
            tpl_data[y * 32 + x] = 200;
        }
    }
    let tpl = image_from(32, 32, tpl_data);

    let mut canvas = vec![0u8; 96 * 96];
    for y in 14..18 {
        for x in 8..24 {
            canvas[(32 + y) * 96 + 32 + x] = 200;
        }
    }
    let scene = image_from(96, 96, canvas);

    let result = match_template_with(&scene, &tpl, &CompileConfig::default(), &rotation_config())
        .unwrap()
        .expect("match");

    assert!((result.x - 32.0).abs() <= 4.0, "x = {}", result.x);
    assert!((result.y - 32.0).abs() <= 4.0, "y = {}", result.y);
    let angle_error = (result.angle_deg - 90.0)
        .abs()
        .min((result.angle_deg + 90.0).abs());
    assert!(angle_error <= 15.0, "angle = {}", result.angle_deg);
}

#[test]
fn ladder_angle_embedding_is_recovered() {
    let tpl = asymmetric_template(48, 31);
    let rotated = rotate_bilinear_masked(&tpl, 30.0, 0);

    let mut canvas = vec![0u8; 160 * 160];
    embed_masked(&mut canvas, 160, &rotated.data, &rotated.mask, 56, 64);
    let scene = image_from(160, 160, canvas);

    let result = match_template_with(&scene, &tpl, &CompileConfig::default(), &rotation_config())
        .unwrap()
        .expect("match");

    assert!((result.x - 56.0).abs() <= 4.0, "x = {}", result.x);
    assert!((result.y - 64.0).abs() <= 4.0, "y = {}", result.y);
    assert!(
        (result.angle_deg - 30.0).abs() <= 7.5 + 1e-6,
        "angle = {}",
        result.angle_deg
    );
}

#[test]
fn off_ladder_angle_is_recovered_within_the_finest_step() {
    let tpl = asymmetric_template(48, 32);
    let rotated = rotate_bilinear_masked(&tpl, 22.5, 0);

    let mut canvas = vec![0u8; 160 * 160];
    embed_masked(&mut canvas, 160, &rotated.data, &rotated.mask, 60, 48);
    let scene = image_from(160, 160, canvas);

    let result = match_template_with(&scene, &tpl, &CompileConfig::default(), &rotation_config())
        .unwrap()
        .expect("match");

    assert!((result.x - 60.0).abs() <= 4.0, "x = {}", result.x);
    assert!((result.y - 48.0).abs() <= 4.0, "y = {}", result.y);
    assert!(
        (result.angle_deg - 22.5).abs() <= 7.5 + 1e-6,
        "angle = {}",
        result.angle_deg
    );
}

#[test]
fn reported_angles_use_the_half_open_reporting_range() {
    let tpl = asymmetric_template(48, 33);
    let rotated = rotate_bilinear_masked(&tpl, 150.0, 0);

    let mut canvas = vec![0u8; 160 * 160];
    embed_masked(&mut canvas, 160, &rotated.data, &rotated.mask, 40, 40);
    let scene = image_from(160, 160, canvas);

    let result = match_template_with(&scene, &tpl, &CompileConfig::default(), &rotation_config())
        .unwrap()
        .expect("match");

    assert!(result.angle_deg > -180.0 && result.angle_deg <= 180.0);
    assert!(
        (result.angle_deg - 150.0).abs() <= 7.5 + 1e-6,
        "angle = {}",
        result.angle_deg
    );
}

#[test]
fn rotation_disabled_still_matches_with_rotation_capable_template() {
    let tpl = random_image(32, 32, 50, 200, 34);
    let mut canvas = vec![0u8; 128 * 128];
    common::embed(&mut canvas, 128, &tpl, 48, 24);
    let scene = image_from(128, 128, canvas);

    let compiled = CompiledTemplate::compile(&tpl, &CompileConfig::default()).unwrap();
    let matcher = compiled.matcher(MatchConfig::default()).unwrap();
    let result = matcher.match_image(&scene).unwrap().expect("match");

    assert!((result.x - 48.0).abs() <= 1.0);
    assert!((result.y - 24.0).abs() <= 1.0);
    assert_eq!(result.angle_deg, 0.0);
}

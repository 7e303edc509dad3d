mod common;

use corrmatch_core::rotate::rotate_bilinear_masked;
use corrmatch_core::{CompileConfig, CompiledTemplate, GrayImage, MatchConfig, RotationMode};

use common::{embed, embed_masked, image_from, noise_image, random_image};

fn run_both(
    compiled: &CompiledTemplate,
    scene: &GrayImage,
    base: &MatchConfig,
    k: usize,
) -> (Vec<corrmatch_core::Match>, Vec<corrmatch_core::Match>) {
    let sequential = compiled
        .matcher(MatchConfig {
            parallel: false,
            ..base.clone()
        })
        .unwrap()
        .match_topk(scene, k)
        .unwrap();
    let parallel = compiled
        .matcher(MatchConfig {
            parallel: true,
            ..base.clone()
        })
        .unwrap()
        .match_topk(scene, k)
        .unwrap();
    (sequential, parallel)
}

#[test]
fn parallel_and_sequential_agree_on_translation() {
    let tpl = random_image(48, 48, 50, 200, 201);
    let mut scene = noise_image(256, 256, 120.0, 25.0, 202);
    let mut canvas = scene.as_bytes().to_vec();
    embed(&mut canvas, 256, &tpl, 100, 100);
    scene = image_from(256, 256, canvas);

    let compiled = CompiledTemplate::compile_no_rotation(&tpl, &CompileConfig::default()).unwrap();
    let (sequential, parallel) = run_both(&compiled, &scene, &MatchConfig::default(), 3);

    assert!(!sequential.is_empty());
    assert_eq!(sequential, parallel);
    assert!((sequential[0].x - 100.0).abs() <= 1.0);
    assert!((sequential[0].y - 100.0).abs() <= 1.0);
}

#[test]
fn parallel_and_sequential_agree_with_rotation() {
    let tpl = random_image(32, 32, 40, 220, 203);
    let rotated = rotate_bilinear_masked(&tpl, 60.0, 0);

    let mut canvas = vec![0u8; 160 * 160];
    embed_masked(&mut canvas, 160, &rotated.data, &rotated.mask, 70, 50);
    let scene = image_from(160, 160, canvas);

    let compiled = CompiledTemplate::compile(&tpl, &CompileConfig::default()).unwrap();
    let base = MatchConfig {
        rotation: RotationMode::Enabled,
        ..MatchConfig::default()
    };
    let (sequential, parallel) = run_both(&compiled, &scene, &base, 2);

    assert!(!sequential.is_empty());
    assert_eq!(sequential, parallel);
}

#[test]
fn parallel_runs_are_repeatable() {
    let tpl = random_image(32, 32, 50, 200, 204);
    let scene = noise_image(192, 160, 110.0, 35.0, 205);

    let compiled = CompiledTemplate::compile_no_rotation(&tpl, &CompileConfig::default()).unwrap();
    let matcher = compiled
        .matcher(MatchConfig {
            parallel: true,
            ..MatchConfig::default()
        })
        .unwrap();

    let first = matcher.match_topk(&scene, 3).unwrap();
    let second = matcher.match_topk(&scene, 3).unwrap();
    assert_eq!(first, second);
}

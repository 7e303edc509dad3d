mod common;

use approx::assert_abs_diff_eq;

use corrmatch_core::integral::IntegralLevel;
use corrmatch_core::pyramid::{binomial_blur, downsample_2x};
use corrmatch_core::rotate::rotate_bilinear_masked;
use corrmatch_core::{CompileConfig, CompiledTemplate};

use common::{flat_image, image_from, random_image};

#[test]
fn blur_preserves_constant_image() {
    let img = flat_image(17, 9, 181);
    let blurred = binomial_blur(&img, false);
    for y in 0..img.height() {
        assert!(blurred.row(y).iter().all(|&v| v == 181));
    }
}

#[test]
fn downsample_dimensions_round_up() {
    let img = flat_image(5, 7, 10);
    let half = downsample_2x(&img, false);
    assert_eq!((half.width(), half.height()), (3, 4));

    let img = flat_image(128, 64, 10);
    let half = downsample_2x(&img, false);
    assert_eq!((half.width(), half.height()), (64, 32));
}

#[test]
fn template_pyramid_stops_at_min_dim() {
    // 32x32 halves to 16, 8, 4; the next level would be 2x2.
    let tpl = random_image(32, 32, 0, 255, 7);
    let config = CompileConfig {
        max_levels: 10,
        ..CompileConfig::default()
    };
    let compiled = CompiledTemplate::compile_no_rotation(&tpl, &config).unwrap();
    assert_eq!(compiled.num_levels(), 4);
    assert_eq!(compiled.level(3).width(), 4);

    // max_levels caps first.
    let config = CompileConfig {
        max_levels: 2,
        ..CompileConfig::default()
    };
    let compiled = CompiledTemplate::compile_no_rotation(&tpl, &config).unwrap();
    assert_eq!(compiled.num_levels(), 2);
}

#[test]
fn rotation_by_zero_keeps_interior_pixels() {
    let img = random_image(16, 12, 0, 255, 3);
    let rotated = rotate_bilinear_masked(&img, 0.0, 0);

    for y in 0..11 {
        for x in 0..15 {
            assert_eq!(rotated.mask[[y, x]], 1);
            assert_eq!(rotated.data[[y, x]], img.get(x, y));
        }
    }
    // The bilinear footprint of the last row/column leaves the raster.
    assert_eq!(rotated.mask[[11, 0]], 0);
    assert_eq!(rotated.mask[[0, 15]], 0);
}

#[test]
fn rotation_by_90_moves_a_bright_pixel() {
    // 9x9 canvas rotating about (4, 4).
    let mut data = vec![0u8; 81];
    data[4 * 9 + 6] = 200; // (x=6, y=4)
    let img = image_from(9, 9, data);

    let rotated = rotate_bilinear_masked(&img, 90.0, 0);
    assert_eq!(rotated.data[[6, 4]], 200);
    assert_eq!(rotated.mask[[6, 4]], 1);
    // The original location is now dark.
    assert_eq!(rotated.data[[4, 6]], 0);
}

#[test]
fn rotation_mask_marks_fill_pixels() {
    let img = random_image(16, 16, 1, 255, 11);
    let rotated = rotate_bilinear_masked(&img, 45.0, 0);

    let count: u64 = rotated.mask.iter().map(|&m| u64::from(m)).sum();
    assert!(count > 0);
    assert!(count < 16 * 16);
    // Corners back-project outside the source square.
    assert_eq!(rotated.mask[[0, 0]], 0);
    assert_eq!(rotated.data[[0, 0]], 0);
}

#[test]
fn integral_window_sums_match_brute_force() {
    let img = random_image(23, 17, 0, 255, 42);
    let integral = IntegralLevel::build(&img, false);

    for &(x, y, w, h) in &[(0, 0, 23, 17), (0, 0, 1, 1), (5, 3, 7, 9), (18, 10, 5, 7)] {
        let mut sum = 0u64;
        let mut sum_sq = 0u64;
        for yy in y..y + h {
            for xx in x..x + w {
                let v = u64::from(img.get(xx, yy));
                sum += v;
                sum_sq += v * v;
            }
        }
        assert_eq!(integral.window_sums(x, y, w, h), (sum, sum_sq));
    }
}

#[test]
fn integral_parallel_matches_sequential() {
    let img = random_image(64, 48, 0, 255, 5);
    let seq = IntegralLevel::build(&img, false);
    let par = IntegralLevel::build(&img, true);
    for &(x, y, w, h) in &[(0, 0, 64, 48), (13, 9, 21, 17)] {
        assert_eq!(seq.window_sums(x, y, w, h), par.window_sums(x, y, w, h));
    }
}

#[test]
fn identity_template_stats_match_brute_force() {
    let tpl = random_image(20, 14, 10, 240, 9);
    let compiled = CompiledTemplate::compile_no_rotation(&tpl, &CompileConfig::default()).unwrap();
    let rot = compiled.rotated(0, 0.0);

    assert_eq!(rot.stats.count, 20 * 14);
    assert!(rot.is_full_mask());

    let n = (20 * 14) as f64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for y in 0..14 {
        for &v in tpl.row(y) {
            sum += f64::from(v);
            sum_sq += f64::from(v) * f64::from(v);
        }
    }
    let mean = sum / n;
    let var = sum_sq / n - mean * mean;
    assert_abs_diff_eq!(rot.stats.mean, mean, epsilon = 1e-6);
    assert_abs_diff_eq!(rot.stats.var, var, epsilon = 1e-6);
}

#[test]
fn rotated_template_stats_match_brute_force() {
    let tpl = random_image(16, 16, 10, 240, 21);
    let compiled = CompiledTemplate::compile(&tpl, &CompileConfig::default()).unwrap();
    let rot = compiled.rotated(0, 30.0);

    let mut count = 0u64;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for (&v, &m) in rot.data.iter().zip(rot.mask.iter()) {
        if m != 0 {
            count += 1;
            sum += f64::from(v);
            sum_sq += f64::from(v) * f64::from(v);
        }
    }
    assert_eq!(rot.stats.count, count);
    let n = count as f64;
    let mean = sum / n;
    assert_abs_diff_eq!(rot.stats.mean, mean, epsilon = 1e-6);
    assert_abs_diff_eq!(rot.stats.var, sum_sq / n - mean * mean, epsilon = 1e-6);
}

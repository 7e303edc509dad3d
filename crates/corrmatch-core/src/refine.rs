//! Final result assembly: non-maximum suppression, top-K selection, and
//! local quadratic refinement of position and angle.

use crate::config::{MatchConfig, RotationMode};
use crate::matcher::Match;
use crate::preprocess::CompiledImage;
use crate::score::score_window;
use crate::search::Candidate;
use crate::template::{wrap_deg, CompiledTemplate};

/// Suppress, select `k`, refine, and convert to external matches.
pub(crate) fn assemble(
    template: &CompiledTemplate,
    image: &CompiledImage,
    config: &MatchConfig,
    beam: Vec<Candidate>,
    k: usize,
    finest_step: f64,
) -> Vec<Match> {
    let kept = suppress(beam, config.nms_radius, finest_step);
    kept.into_iter()
        .take(k)
        .map(|candidate| refine_candidate(template, image, config, &candidate, finest_step))
        .collect()
}

/// Walk the score-sorted list, dropping any candidate that sits within
/// `radius` pixels (Euclidean) and within the finest angular step of a
/// previously kept one.
fn suppress(mut beam: Vec<Candidate>, radius: usize, angle_step: f64) -> Vec<Candidate> {
    beam.sort_by(Candidate::rank);
    let r2 = (radius * radius) as i64;

    let mut kept: Vec<Candidate> = Vec::with_capacity(beam.len());
    for candidate in beam {
        let close = kept.iter().any(|prev| {
            let dx = candidate.x as i64 - prev.x as i64;
            let dy = candidate.y as i64 - prev.y as i64;
            let da = wrap_deg(candidate.angle_deg - prev.angle_deg).abs();
            dx * dx + dy * dy <= r2 && da <= angle_step + 1e-9
        });
        if !close {
            kept.push(candidate);
        }
    }
    kept
}

fn refine_candidate(
    template: &CompiledTemplate,
    image: &CompiledImage,
    config: &MatchConfig,
    candidate: &Candidate,
    finest_step: f64,
) -> Match {
    let img = image.level(0);
    let integral = image.integral(0);
    let rot = template.rotated(0, candidate.angle_deg);
    let end_x = img.width() - rot.width();
    let end_y = img.height() - rot.height();

    let eval = |x: usize, y: usize| -> f64 {
        score_window(
            config.metric,
            img,
            integral,
            x,
            y,
            &rot,
            config.min_var_i,
            config.min_var_t,
        )
    };

    // Separable 3-point parabola per spatial axis; candidates on the
    // window boundary keep their integer coordinate.
    let (x, y) = (candidate.x, candidate.y);
    let dx = if x > 0 && x < end_x {
        parabola_delta(eval(x - 1, y), candidate.score, eval(x + 1, y))
    } else {
        0.0
    };
    let dy = if y > 0 && y < end_y {
        parabola_delta(eval(x, y - 1), candidate.score, eval(x, y + 1))
    } else {
        0.0
    };

    let da = if config.rotation == RotationMode::Enabled && !template.ladder().is_identity() {
        // Rotated copies share the template canvas, so (x, y) stays a
        // valid window for every probed angle.
        let eval_angle = |angle: f64| -> f64 {
            let rot = template.rotated(0, angle);
            score_window(
                config.metric,
                img,
                integral,
                x,
                y,
                &rot,
                config.min_var_i,
                config.min_var_t,
            )
        };
        let prev = eval_angle(candidate.angle_deg - finest_step);
        let next = eval_angle(candidate.angle_deg + finest_step);
        parabola_delta(prev, candidate.score, next) * finest_step
    } else {
        0.0
    };

    Match {
        x: (x as f64 + dx).clamp(0.0, end_x as f64),
        y: (y as f64 + dy).clamp(0.0, end_y as f64),
        angle_deg: normalize_out(candidate.angle_deg + da),
        score: candidate.score,
    }
}

/// Fit a parabola through three equally spaced samples and return the
/// fractional offset of its extremum from the center, clamped to half a
/// sample so the refinement never leaves the neighborhood. Neighbors
/// sentineled to -inf leave the center untouched.
fn parabola_delta(prev: f64, curr: f64, next: f64) -> f64 {
    if !prev.is_finite() || !next.is_finite() {
        return 0.0;
    }
    let den = prev - 2.0 * curr + next;
    if den.abs() > 1e-12 {
        ((prev - next) / (2.0 * den)).clamp(-0.5, 0.5)
    } else {
        0.0
    }
}

/// Convert an angle to the reporting range `(-180, 180]`.
fn normalize_out(angle_deg: f64) -> f64 {
    let wrapped = wrap_deg(angle_deg);
    if wrapped == -180.0 {
        180.0
    } else {
        wrapped
    }
}

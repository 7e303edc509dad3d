//! Coarse-to-fine beam search over (x, y, angle) candidates.
//!
//! The top pyramid level is scanned exhaustively; the surviving beam is
//! propagated down one level at a time, each candidate re-evaluated in
//! a small ROI around its doubled position and over a halving angle
//! window. All reductions run under the total candidate order, so the
//! outcome is identical between sequential and parallel execution.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use rayon::prelude::*;
use tracing::debug;

use crate::config::{MatchConfig, RotationMode};
use crate::preprocess::CompiledImage;
use crate::score::score_window;
use crate::template::CompiledTemplate;

/// One node of the beam: a window position, a quantized angle, and its
/// score at some pyramid level.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Candidate {
    pub x: usize,
    pub y: usize,
    pub angle_key: i64,
    pub angle_deg: f64,
    pub score: f64,
}

impl Candidate {
    /// Total rank order: score descending, then `(y, x, angle_key)`
    /// ascending. Scores are compared with `total_cmp`, so the order is
    /// bit-reproducible.
    pub(crate) fn rank(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then(self.y.cmp(&other.y))
            .then(self.x.cmp(&other.x))
            .then(self.angle_key.cmp(&other.angle_key))
    }

    fn same_cell(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y && self.angle_key == other.angle_key
    }
}

/// A fixed-size sorted candidate buffer.
///
/// Insertion sort over a small vector; every insert applies the full
/// tie-break and drops duplicate cells, so merging buffers in any order
/// yields the same contents.
#[derive(Clone, Debug)]
pub(crate) struct TopK {
    cap: usize,
    items: Vec<Candidate>,
}

impl TopK {
    pub(crate) fn new(cap: usize) -> Self {
        Self {
            cap,
            items: Vec::with_capacity(cap + 1),
        }
    }

    pub(crate) fn push(&mut self, candidate: Candidate) {
        if self.items.iter().any(|it| it.same_cell(&candidate)) {
            return;
        }
        let pos = self
            .items
            .partition_point(|it| it.rank(&candidate) == Ordering::Less);
        if pos >= self.cap {
            return;
        }
        self.items.insert(pos, candidate);
        self.items.truncate(self.cap);
    }

    pub(crate) fn merge(&mut self, other: TopK) {
        for candidate in other.items {
            self.push(candidate);
        }
    }

    pub(crate) fn into_sorted_vec(self) -> Vec<Candidate> {
        self.items
    }
}

/// Run the full search and return the finest-level beam, best first.
/// An empty beam means no candidate survived `min_score`.
pub(crate) fn run(
    template: &CompiledTemplate,
    image: &CompiledImage,
    config: &MatchConfig,
) -> Vec<Candidate> {
    let top = image.num_levels().min(template.num_levels()) - 1;

    let mut beam = coarse_scan(template, image, config, top);
    debug!(level = top, beam = beam.len(), "coarse enumeration done");

    for level in (0..top).rev() {
        if beam.is_empty() {
            return beam;
        }
        beam = descend(template, image, config, level, top, &beam);
        debug!(level, beam = beam.len(), "descent level done");
    }
    beam
}

fn rotation_enabled(config: &MatchConfig) -> bool {
    config.rotation == RotationMode::Enabled
}

/// S0: evaluate every valid window position at the top level, for every
/// ladder angle, keeping a per-angle top-K and unioning into the beam.
fn coarse_scan(
    template: &CompiledTemplate,
    image: &CompiledImage,
    config: &MatchConfig,
    level: usize,
) -> Vec<Candidate> {
    let angles: Vec<f64> = if rotation_enabled(config) {
        template.ladder().coarse_angles().to_vec()
    } else {
        vec![0.0]
    };

    let img = image.level(level);
    let integral = image.integral(level);
    let mut union = TopK::new(config.beam_width);

    for &angle in &angles {
        let rot = template.rotated(level, angle);
        let key = template.ladder().quantize(angle);
        let angle_q = template.ladder().angle_for_key(key);
        let (tw, th) = (rot.width(), rot.height());
        if img.width() < tw || img.height() < th {
            continue;
        }
        let end_x = img.width() - tw;
        let end_y = img.height() - th;

        let scan_row = |y: usize| -> TopK {
            let mut queue = TopK::new(config.per_angle_topk);
            for x in 0..=end_x {
                let score = score_window(
                    config.metric,
                    img,
                    integral,
                    x,
                    y,
                    &rot,
                    config.min_var_i,
                    config.min_var_t,
                );
                if score.is_finite() && score >= config.min_score {
                    queue.push(Candidate {
                        x,
                        y,
                        angle_key: key,
                        angle_deg: angle_q,
                        score,
                    });
                }
            }
            queue
        };

        let rows: Vec<TopK> = if config.parallel {
            (0..=end_y).into_par_iter().map(scan_row).collect()
        } else {
            (0..=end_y).map(scan_row).collect()
        };

        let mut per_angle = TopK::new(config.per_angle_topk);
        for row in rows {
            per_angle.merge(row);
        }
        union.merge(per_angle);
    }

    union.into_sorted_vec()
}

/// S1: map each beam candidate to the finer level, evaluate its ROI
/// against the angle window, then rebuild the per-angle queues and the
/// global beam.
fn descend(
    template: &CompiledTemplate,
    image: &CompiledImage,
    config: &MatchConfig,
    level: usize,
    top: usize,
    beam: &[Candidate],
) -> Vec<Candidate> {
    let step = template.ladder().step_below_top(top - level);

    let evaluate =
        |candidate: &Candidate| -> BTreeMap<i64, TopK> { eval_candidate(template, image, config, level, step, candidate) };

    let maps: Vec<BTreeMap<i64, TopK>> = if config.parallel {
        beam.par_iter().map(evaluate).collect()
    } else {
        beam.iter().map(evaluate).collect()
    };

    let mut per_angle: BTreeMap<i64, TopK> = BTreeMap::new();
    for map in maps {
        for (key, queue) in map {
            per_angle
                .entry(key)
                .or_insert_with(|| TopK::new(config.per_angle_topk))
                .merge(queue);
        }
    }

    let mut union = TopK::new(config.beam_width);
    for queue in per_angle.into_values() {
        union.merge(queue);
    }
    union.into_sorted_vec()
}

fn eval_candidate(
    template: &CompiledTemplate,
    image: &CompiledImage,
    config: &MatchConfig,
    level: usize,
    step: f64,
    candidate: &Candidate,
) -> BTreeMap<i64, TopK> {
    let img = image.level(level);
    let integral = image.integral(level);
    let cx = candidate.x * 2;
    let cy = candidate.y * 2;

    let angles: Vec<f64> = if rotation_enabled(config) {
        template
            .ladder()
            .neighbors(candidate.angle_deg, step, config.angle_half_range_steps)
    } else {
        vec![0.0]
    };

    let mut out: BTreeMap<i64, TopK> = BTreeMap::new();
    for angle in angles {
        let key = template.ladder().quantize(angle);
        if out.contains_key(&key) {
            continue;
        }
        let angle_q = template.ladder().angle_for_key(key);
        let rot = template.rotated(level, angle_q);
        let (tw, th) = (rot.width(), rot.height());
        if img.width() < tw || img.height() < th {
            continue;
        }
        let end_x = img.width() - tw;
        let end_y = img.height() - th;

        let x0 = cx.saturating_sub(config.roi_radius);
        let y0 = cy.saturating_sub(config.roi_radius);
        if x0 > end_x || y0 > end_y {
            continue;
        }
        let x1 = (cx + config.roi_radius).min(end_x);
        let y1 = (cy + config.roi_radius).min(end_y);

        let mut queue = TopK::new(config.per_angle_topk);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let score = score_window(
                    config.metric,
                    img,
                    integral,
                    x,
                    y,
                    &rot,
                    config.min_var_i,
                    config.min_var_t,
                );
                if score.is_finite() && score >= config.min_score {
                    queue.push(Candidate {
                        x,
                        y,
                        angle_key: key,
                        angle_deg: angle_q,
                        score,
                    });
                }
            }
        }
        out.insert(key, queue);
    }
    out
}

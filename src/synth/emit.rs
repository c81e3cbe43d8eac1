use crate::data_types::{DrawableObject, ObjectId, PlotPolicy, Range, Shape};

use super::bivariate::emit_bivariate;
use super::collect::{GroupAccum, SamplePoint, SeriesAccum};

/// Turns one fully post-processed group into drawable objects.
///
/// `grp_range` is the group's own (post-remap) range, `overall` the final
/// widened pass range. Emission never extends the pass range: every vertex
/// produced here lies within `overall` or on a baseline already folded into
/// it.
pub(crate) fn emit_group(
    group: &GroupAccum,
    group_idx: usize,
    grp_range: &Range,
    overall: &Range,
    policy: &PlotPolicy,
) -> Vec<DrawableObject> {
    let mut out = Vec::new();

    for (si, series) in group.series.iter().enumerate() {
        if policy.layers > 1 {
            emit_horizon(series, si, group_idx, grp_range, policy, &mut out);
            continue;
        }

        emit_series_lines(series, si, group_idx, &mut out);

        if policy.fill_under && !policy.bivariate {
            emit_fill_under(series, si, group_idx, overall, policy, &mut out);
        }
        if policy.impulses {
            emit_impulses(series, si, group_idx, overall, &mut out);
        }
    }

    if policy.bivariate {
        emit_bivariate(group, group_idx, policy, &mut out);
    }

    if policy.group_split && grp_range.is_set() {
        // Band caption so the shared axis can show which group sits where.
        if let Some(p) = group.series.iter().find_map(|s| s.points.first()) {
            out.push(DrawableObject::new(
                ObjectId::new(group_idx, 0, p.row),
                Shape::Label {
                    x: group_idx as f64 + 0.5,
                    y: grp_range.y_max,
                    text: group.key.to_string(),
                },
                format!("group {}", group.key),
            ));
        }
    }

    out
}

/// Splits a series at missing samples. A run never spans a gap.
fn runs(points: &[SamplePoint]) -> impl Iterator<Item = &[SamplePoint]> {
    points
        .split(|p| !p.y.is_finite() || !p.x.is_finite())
        .filter(|run| !run.is_empty())
}

/// Runs of two or more points become polylines; a stranded single point
/// still gets a marker object.
fn emit_series_lines(
    series: &SeriesAccum,
    si: usize,
    group_idx: usize,
    out: &mut Vec<DrawableObject>,
) {
    for run in runs(&series.points) {
        let first = run[0];
        if run.len() < 2 {
            out.push(DrawableObject::new(
                ObjectId::new(group_idx, si, first.row),
                Shape::Point {
                    x: first.x,
                    y: first.y,
                },
                format!("{} ({}, {})", series.label, first.x, first.y),
            ));
            continue;
        }
        out.push(DrawableObject::new(
            ObjectId::new(group_idx, si, first.row),
            Shape::Polyline {
                points: run.iter().map(|p| (p.x, p.y)).collect(),
                rows: run.iter().map(|p| p.row).collect(),
            },
            format!("{} ({} pts)", series.label, run.len()),
        ));
    }
}

fn baseline_at(
    series: &SeriesAccum,
    si: usize,
    index: usize,
    overall: &Range,
    policy: &PlotPolicy,
) -> f64 {
    if let Some(b) = policy.fill_baseline {
        return b;
    }
    if si > 0 {
        if let Some(baseline) = &series.baseline {
            if let Some(&b) = baseline.get(index) {
                return b;
            }
        }
    }
    overall.y_min
}

/// One polygon per run: the run forward, then the baseline path backward.
fn emit_fill_under(
    series: &SeriesAccum,
    si: usize,
    group_idx: usize,
    overall: &Range,
    policy: &PlotPolicy,
    out: &mut Vec<DrawableObject>,
) {
    let mut offset = 0usize;
    for run in series.points.split(|p| !p.y.is_finite() || !p.x.is_finite()) {
        if run.len() >= 2 {
            let mut points: Vec<(f64, f64)> = run.iter().map(|p| (p.x, p.y)).collect();
            for (k, p) in run.iter().enumerate().rev() {
                points.push((p.x, baseline_at(series, si, offset + k, overall, policy)));
            }
            out.push(DrawableObject::new(
                ObjectId::new(group_idx, si, run[0].row),
                Shape::Polygon { points },
                format!("{} fill", series.label),
            ));
        }
        offset += run.len() + 1;
    }
}

/// Vertical segment per valid point, from the baseline to the value. The
/// baseline is 0 when the range brackets it, otherwise the nearest range
/// boundary.
fn emit_impulses(
    series: &SeriesAccum,
    si: usize,
    group_idx: usize,
    overall: &Range,
    out: &mut Vec<DrawableObject>,
) {
    let base = impulse_baseline(overall);
    for p in &series.points {
        if !p.y.is_finite() || !p.x.is_finite() {
            continue;
        }
        out.push(DrawableObject::new(
            ObjectId::new(group_idx, si, p.row),
            Shape::Impulse {
                x: p.x,
                y0: base,
                y1: p.y,
            },
            format!("{} impulse ({}, {})", series.label, p.x, p.y),
        ));
    }
}

pub(crate) fn impulse_baseline(overall: &Range) -> f64 {
    if !overall.is_set() {
        return 0.0;
    }
    if overall.y_min > 0.0 {
        overall.y_min
    } else if overall.y_max < 0.0 {
        overall.y_max
    } else {
        0.0
    }
}

/// Horizon layering: the series is folded into `layers` bands over the
/// group's y range. Band k draws `y - k·h` clamped to `[0, h]`, rebased to
/// the bottom strip, so all bands overlap in `[y_min, y_min + h]`. Band k
/// of series s carries series id `s * layers + k`.
fn emit_horizon(
    series: &SeriesAccum,
    si: usize,
    group_idx: usize,
    grp_range: &Range,
    policy: &PlotPolicy,
    out: &mut Vec<DrawableObject>,
) {
    let range = grp_range.widened();
    if !range.is_set() {
        return;
    }
    let h = range.height() / policy.layers as f64;

    for k in 0..policy.layers {
        let band_floor = range.y_min + k as f64 * h;
        let folded = SeriesAccum {
            label: format!("{} band {}", series.label, k),
            points: series
                .points
                .iter()
                .map(|p| SamplePoint {
                    x: p.x,
                    y: if p.y.is_finite() {
                        range.y_min + (p.y - band_floor).clamp(0.0, h)
                    } else {
                        f64::NAN
                    },
                    row: p.row,
                })
                .collect(),
            baseline: None,
        };
        emit_series_lines(&folded, si * policy.layers + k, group_idx, out);
    }
}

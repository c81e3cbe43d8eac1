use crate::data_types::{
    segment_intersection, DrawableObject, FillSide, ObjectId, PlotPolicy, Shape,
};

use super::collect::GroupAccum;

/// Bivariate synthesis: at every aligned index the series' y values are
/// sorted ascending and each adjacent pair is connected. Without fill this
/// yields one vertical connector per pair; with fill the region between the
/// first two configured series becomes band polygons, clipped to the
/// requested side at line crossings.
pub(crate) fn emit_bivariate(
    group: &GroupAccum,
    group_idx: usize,
    policy: &PlotPolicy,
    out: &mut Vec<DrawableObject>,
) {
    if group.series.len() < 2 {
        return;
    }
    if policy.fill_under {
        emit_bands(group, group_idx, policy, out);
    } else {
        emit_connectors(group, group_idx, out);
    }
}

fn emit_connectors(group: &GroupAccum, group_idx: usize, out: &mut Vec<DrawableObject>) {
    let len = group
        .series
        .iter()
        .map(|s| s.points.len())
        .min()
        .unwrap_or(0);
    let mut column: Vec<(usize, f64, f64, usize)> = Vec::with_capacity(group.series.len());

    for j in 0..len {
        column.clear();
        for (si, series) in group.series.iter().enumerate() {
            let p = series.points[j];
            if p.y.is_finite() && p.x.is_finite() {
                column.push((si, p.x, p.y, p.row));
            }
        }
        column.sort_by(|a, b| a.2.total_cmp(&b.2));
        for pair in column.windows(2) {
            let (si, x, y_lo, row) = pair[0];
            let (_, _, y_hi, _) = pair[1];
            out.push(DrawableObject::new(
                ObjectId::new(group_idx, si, row),
                Shape::Impulse {
                    x,
                    y0: y_lo,
                    y1: y_hi,
                },
                format!("connector x={x}"),
            ));
        }
    }
}

/// Band polygons between every y-sorted adjacent pair of series, one per
/// x-adjacent interval. When the two segments cross, the quad splits into
/// two triangles at the crossing point. The side filter is defined for the
/// pair formed by the first two configured series; every other pair keeps
/// both sides.
fn emit_bands(
    group: &GroupAccum,
    group_idx: usize,
    policy: &PlotPolicy,
    out: &mut Vec<DrawableObject>,
) {
    let len = group
        .series
        .iter()
        .map(|s| s.points.len())
        .min()
        .unwrap_or(0);

    for j in 0..len.saturating_sub(1) {
        let mut order: Vec<usize> = (0..group.series.len())
            .filter(|&si| {
                let p0 = group.series[si].points[j];
                let p1 = group.series[si].points[j + 1];
                p0.x.is_finite() && p0.y.is_finite() && p1.x.is_finite() && p1.y.is_finite()
            })
            .collect();
        order.sort_by(|&a, &b| {
            group.series[a].points[j]
                .y
                .total_cmp(&group.series[b].points[j].y)
        });

        for pair in order.windows(2) {
            let (lo, hi) = (pair[0], pair[1]);
            let a0 = group.series[lo].points[j];
            let a1 = group.series[lo].points[j + 1];
            let b0 = group.series[hi].points[j];
            let b1 = group.series[hi].points[j + 1];
            let pa0 = (a0.x, a0.y);
            let pa1 = (a1.x, a1.y);
            let pb0 = (b0.x, b0.y);
            let pb1 = (b1.x, b1.y);

            // Deltas in sort order; the side filter reads them in configured
            // series order (second series minus first).
            let s0 = b0.y - a0.y;
            let s1 = b1.y - a1.y;
            let leading = lo.min(hi) == 0 && lo.max(hi) == 1;
            let keeps = |delta: f64| {
                if !leading {
                    return true;
                }
                let signed = if lo == 0 { delta } else { -delta };
                side_kept(policy.fill_under_side, signed)
            };

            match segment_intersection(pa0, pa1, pb0, pb1) {
                Some((cross, t)) if t > 0.0 && t < 1.0 => {
                    // Left triangle keeps the sideness at the interval
                    // start, right triangle the sideness at the end.
                    if s0 != 0.0 && keeps(s0) {
                        push_band(out, group_idx, lo, a0.row, vec![pa0, cross, pb0]);
                    }
                    if s1 != 0.0 && keeps(s1) {
                        push_band(out, group_idx, lo, a0.row, vec![cross, pa1, pb1]);
                    }
                }
                _ => {
                    let delta = if s0 != 0.0 { s0 } else { s1 };
                    if delta == 0.0 || !keeps(delta) {
                        continue;
                    }
                    push_band(out, group_idx, lo, a0.row, vec![pa0, pa1, pb1, pb0]);
                }
            }
        }
    }
}

fn side_kept(side: FillSide, delta: f64) -> bool {
    match side {
        FillSide::Both => true,
        FillSide::Above => delta > 0.0,
        FillSide::Below => delta < 0.0,
    }
}

fn push_band(
    out: &mut Vec<DrawableObject>,
    group_idx: usize,
    series: usize,
    row: usize,
    points: Vec<(f64, f64)>,
) {
    out.push(DrawableObject::new(
        ObjectId::new(group_idx, series, row),
        Shape::Polygon { points },
        "band".to_string(),
    ));
}

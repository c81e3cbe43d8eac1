use crate::data_types::{PlotPolicy, Range};

use super::collect::GroupAccum;

/// Remaps one group's samples into its side-by-side band.
///
/// Band `ordinal` covers `[ordinal, ordinal + 1)` on the x axis, with
/// `group_split_margin` left empty at both ends. With a shared y axis the y
/// values stay in data units; otherwise each group's y is normalized into
/// `[0, 1]` by its own range. `raw` is the group's range before remapping
/// and keeps driving the per-band tick labels.
pub(crate) fn remap_group(
    group: &mut GroupAccum,
    ordinal: usize,
    raw: &Range,
    policy: &PlotPolicy,
) {
    let raw = raw.widened();
    if !raw.is_set() {
        return;
    }
    let margin = policy.group_split_margin;
    let usable = 1.0 - 2.0 * margin;
    let x0 = ordinal as f64 + margin;

    for series in &mut group.series {
        for p in &mut series.points {
            if p.x.is_finite() {
                p.x = x0 + (p.x - raw.x_min) / raw.width() * usable;
            }
            if !policy.group_split_share_y && p.y.is_finite() {
                p.y = (p.y - raw.y_min) / raw.height();
            }
        }
        if !policy.group_split_share_y {
            if let Some(baseline) = &mut series.baseline {
                for b in baseline.iter_mut() {
                    if b.is_finite() {
                        *b = (*b - raw.y_min) / raw.height();
                    }
                }
            }
        }
    }
}

/// Overall range under group split: the split axis spans one unit band per
/// group, the other axis is the union of the (possibly normalized) group
/// y-ranges.
pub(crate) fn split_overall_range(group_count: usize, remapped: &[Range]) -> Range {
    if group_count == 0 {
        return Range::empty();
    }
    let mut y = Range::empty();
    for r in remapped {
        y.union(r);
    }
    if !y.is_set() {
        return Range::empty();
    }
    Range::new(0.0, group_count as f64, y.y_min, y.y_max)
}

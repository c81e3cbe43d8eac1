use super::collect::GroupAccum;

/// Offsets each series by the running top of the series below it.
///
/// At every aligned index the floor carries the cumulative sum of the lower
/// series, with NaN contributing zero. A NaN sample stays NaN in its own
/// series (the run still breaks there) but does not poison the stack above.
/// Each series records its pre-offset floor as the fill baseline.
pub(crate) fn apply_stacked(group: &mut GroupAccum) {
    let len = group
        .series
        .iter()
        .map(|s| s.points.len())
        .min()
        .unwrap_or(0);
    let mut floor = vec![0.0f64; len];

    for series in &mut group.series {
        series.baseline = Some(floor.clone());
        for (j, p) in series.points.iter_mut().take(len).enumerate() {
            if p.y.is_finite() {
                p.y += floor[j];
                floor[j] = p.y;
            }
        }
    }
}

/// Running sum along the x dimension, per series.
///
/// NaN samples keep the gap (stay NaN) while the accumulator carries over
/// them, so differencing the output reconstructs the finite inputs.
pub(crate) fn apply_cumulative(group: &mut GroupAccum) {
    for series in &mut group.series {
        let mut acc = 0.0f64;
        for p in &mut series.points {
            if p.y.is_finite() {
                acc += p.y;
                p.y = acc;
            }
        }
    }
}

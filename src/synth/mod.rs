//! Geometry synthesis: pure transformation of a row snapshot plus a policy
//! into a data range and a list of drawable objects.
//!
//! The pipeline runs this twice per pass: a range-only pass first
//! ([`compute_range`]), then the full pass ([`synthesize`]) against the
//! published range. Both are safe to call from a background thread and
//! touch nothing but their arguments.

mod bivariate;
mod collect;
mod emit;
mod group_split;
mod stacking;

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use rayon::prelude::*;
use tracing::debug;

use crate::data_types::{
    DiagnosticsCollector, DrawableObject, PlotPolicy, Range, RowSource,
};

use collect::{collect_groups, GroupAccum};
use emit::emit_group;
use group_split::{remap_group, split_overall_range};
use stacking::{apply_cumulative, apply_stacked};

/// Why a synthesis pass produced no result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SynthError {
    /// The interrupt flag was raised; the caller keeps its previous state.
    Interrupted,
    /// Fail-fast policy hit an unresolvable value.
    BadValue { row: usize, column: Option<usize> },
}

impl fmt::Display for SynthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SynthError::Interrupted => write!(f, "synthesis pass interrupted"),
            SynthError::BadValue { row, column } => match column {
                Some(c) => write!(f, "unresolvable value at row {row}, column {c}"),
                None => write!(f, "unresolvable value at row {row}"),
            },
        }
    }
}

impl std::error::Error for SynthError {}

/// Output of a range-only pass.
#[derive(Clone, Debug, PartialEq)]
pub struct RangeSummary {
    pub range: Range,
    pub group_keys: Vec<i64>,
    /// Per-group ranges in original data units (drive per-band tick labels
    /// under group split).
    pub group_ranges: Vec<Range>,
}

/// Output of a full synthesis pass.
#[derive(Clone, Debug)]
pub struct Synthesis {
    pub range: Range,
    pub group_keys: Vec<i64>,
    pub group_ranges: Vec<Range>,
    pub objects: Vec<DrawableObject>,
}

impl Synthesis {
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

struct Prepared {
    groups: Vec<GroupAccum>,
    group_keys: Vec<i64>,
    /// Pre-remap ranges, original data units.
    raw_ranges: Vec<Range>,
    /// Post-remap ranges; identical to `raw_ranges` without group split.
    grp_ranges: Vec<Range>,
    range: Range,
}

fn group_data_range(group: &GroupAccum) -> Range {
    let mut r = Range::empty();
    for series in &group.series {
        for p in &series.points {
            r.extend(p.x, p.y);
        }
    }
    r
}

/// Shared front half of both passes: visit, transform, split, range.
fn prepare(
    source: &dyn RowSource,
    policy: &PlotPolicy,
    interrupt: &AtomicBool,
    diags: &mut DiagnosticsCollector,
) -> Result<Prepared, SynthError> {
    let mut groups = collect_groups(source, policy, interrupt, diags)?;
    groups.sort_by_key(|g| g.key);
    let group_keys: Vec<i64> = groups.iter().map(|g| g.key).collect();

    // Groups are independent past this point.
    let raw_ranges: Vec<Range> = groups
        .par_iter_mut()
        .map(|group| {
            if interrupt.load(Ordering::Relaxed) {
                return Err(SynthError::Interrupted);
            }
            if policy.stacked {
                apply_stacked(group);
            }
            if policy.cumulative {
                apply_cumulative(group);
            }
            Ok(group_data_range(group))
        })
        .collect::<Result<_, _>>()?;

    let grp_ranges: Vec<Range> = if policy.group_split {
        groups
            .par_iter_mut()
            .enumerate()
            .map(|(ordinal, group)| {
                if interrupt.load(Ordering::Relaxed) {
                    return Err(SynthError::Interrupted);
                }
                remap_group(group, ordinal, &raw_ranges[ordinal], policy);
                Ok(group_data_range(group))
            })
            .collect::<Result<_, _>>()?
    } else {
        raw_ranges.clone()
    };

    let mut range = if policy.group_split {
        split_overall_range(groups.len(), &grp_ranges)
    } else {
        let mut r = Range::empty();
        for gr in &grp_ranges {
            r.union(gr);
        }
        r
    };

    // An explicit fill baseline is drawn geometry; fold it into the range.
    if policy.fill_under && range.is_set() {
        if let Some(b) = policy.fill_baseline {
            range.extend(range.x_min, b);
        }
    }

    Ok(Prepared {
        groups,
        group_keys,
        raw_ranges,
        grp_ranges,
        range: range.widened(),
    })
}

/// Range-only pass. Zero valid samples yield an unset range, never a
/// zero-sized box at the origin.
pub fn compute_range(
    source: &dyn RowSource,
    policy: &PlotPolicy,
    interrupt: &AtomicBool,
    diags: &mut DiagnosticsCollector,
) -> Result<RangeSummary, SynthError> {
    let prepared = prepare(source, policy, interrupt, diags)?;
    Ok(RangeSummary {
        range: prepared.range,
        group_keys: prepared.group_keys,
        group_ranges: prepared.raw_ranges,
    })
}

/// Full pass: range plus drawable objects.
pub fn synthesize(
    source: &dyn RowSource,
    policy: &PlotPolicy,
    interrupt: &AtomicBool,
    diags: &mut DiagnosticsCollector,
) -> Result<Synthesis, SynthError> {
    let prepared = prepare(source, policy, interrupt, diags)?;

    let per_group: Vec<Vec<DrawableObject>> = prepared
        .groups
        .par_iter()
        .enumerate()
        .map(|(gi, group)| {
            if interrupt.load(Ordering::Relaxed) {
                return Err(SynthError::Interrupted);
            }
            Ok(emit_group(
                group,
                gi,
                &prepared.grp_ranges[gi],
                &prepared.range,
                policy,
            ))
        })
        .collect::<Result<_, _>>()?;

    let objects: Vec<DrawableObject> = per_group.into_iter().flatten().collect();
    debug!(
        groups = prepared.groups.len(),
        objects = objects.len(),
        diagnostics = diags.len(),
        "synthesis pass complete"
    );

    Ok(Synthesis {
        range: prepared.range,
        group_keys: prepared.group_keys,
        group_ranges: prepared.raw_ranges,
        objects,
    })
}

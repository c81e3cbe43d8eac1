use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::data_types::{
    DiagnosticsCollector, PlotPolicy, RowCtx, RowSource, VisitFlow,
};

use super::SynthError;

/// Interrupt flag poll interval, in visited rows.
pub(crate) const INTERRUPT_CHECK_ROWS: usize = 1024;

/// One resolved sample. `y` may be NaN (missing value, splits runs).
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct SamplePoint {
    pub x: f64,
    pub y: f64,
    pub row: usize,
}

#[derive(Clone, Debug, Default)]
pub(crate) struct SeriesAccum {
    pub label: String,
    pub points: Vec<SamplePoint>,
    /// Fill baseline per point, populated by the stacking pass.
    pub baseline: Option<Vec<f64>>,
}

#[derive(Clone, Debug)]
pub(crate) struct GroupAccum {
    pub key: i64,
    pub series: Vec<SeriesAccum>,
}

impl GroupAccum {
    fn with_series(key: i64, labels: &[String]) -> Self {
        Self {
            key,
            series: labels
                .iter()
                .map(|l| SeriesAccum {
                    label: l.clone(),
                    points: Vec::new(),
                    baseline: None,
                })
                .collect(),
        }
    }
}

fn series_labels(source: &dyn RowSource, policy: &PlotPolicy) -> Vec<String> {
    let headers = source.series_headers();
    policy
        .y_columns
        .iter()
        .enumerate()
        .map(|(i, col)| {
            headers
                .get(i)
                .cloned()
                .unwrap_or_else(|| format!("y{}", col))
        })
        .collect()
}

/// Visits the source once and buckets samples per group and series.
///
/// Groups come back ordered by key. In the default mode every accepted row
/// appends one sample to each configured series, so series within a group
/// stay index-aligned. In series-as-rows mode each accepted row opens a new
/// series whose x axis is the ordinal position of the bound y columns.
pub(crate) fn collect_groups(
    source: &dyn RowSource,
    policy: &PlotPolicy,
    interrupt: &AtomicBool,
    diags: &mut DiagnosticsCollector,
) -> Result<Vec<GroupAccum>, SynthError> {
    let labels = series_labels(source, policy);
    let mut groups: Vec<GroupAccum> = Vec::new();
    let mut by_key: BTreeMap<i64, usize> = BTreeMap::new();
    let mut visited = 0usize;
    let mut error: Option<SynthError> = None;

    source.visit(&mut |ctx: RowCtx<'_>| {
        visited += 1;
        if visited % INTERRUPT_CHECK_ROWS == 0 && interrupt.load(Ordering::Relaxed) {
            error = Some(SynthError::Interrupted);
            return VisitFlow::Terminate;
        }

        let key = match resolve_group_key(&ctx, policy, diags) {
            Ok(k) => k,
            Err(fatal) => {
                if let Some(e) = fatal {
                    error = Some(e);
                    return VisitFlow::Terminate;
                }
                return VisitFlow::Skip;
            }
        };
        let slot = *by_key.entry(key).or_insert_with(|| {
            groups.push(if policy.series_as_rows {
                GroupAccum {
                    key,
                    series: Vec::new(),
                }
            } else {
                GroupAccum::with_series(key, &labels)
            });
            groups.len() - 1
        });
        let group = &mut groups[slot];

        if policy.series_as_rows {
            let label = ctx
                .cols
                .string(policy.x_column.unwrap_or(0))
                .unwrap_or_else(|| format!("row {}", ctx.row));
            let mut series = SeriesAccum {
                label,
                points: Vec::with_capacity(policy.y_columns.len()),
                baseline: None,
            };
            for (ordinal, &col) in policy.y_columns.iter().enumerate() {
                let y = match ctx.cols.real(col) {
                    Some(v) => v,
                    None => {
                        diags.record(ctx.row, Some(col), "unresolvable y value");
                        if !policy.skip_bad_values {
                            error = Some(SynthError::BadValue {
                                row: ctx.row,
                                column: Some(col),
                            });
                            return VisitFlow::Terminate;
                        }
                        f64::NAN
                    }
                };
                series.points.push(SamplePoint {
                    x: ordinal as f64,
                    y,
                    row: ctx.row,
                });
            }
            group.series.push(series);
            return VisitFlow::Continue;
        }

        // x resolution failure drops the whole row.
        let x = match policy.x_column {
            Some(col) => match ctx.cols.real(col) {
                Some(v) if v.is_finite() => v,
                _ => {
                    diags.record(ctx.row, Some(col), "unresolvable x value");
                    if !policy.skip_bad_values {
                        error = Some(SynthError::BadValue {
                            row: ctx.row,
                            column: Some(col),
                        });
                        return VisitFlow::Terminate;
                    }
                    return VisitFlow::Skip;
                }
            },
            None => ctx.row as f64,
        };

        for (i, &col) in policy.y_columns.iter().enumerate() {
            let y = match ctx.cols.real(col) {
                Some(v) => v,
                None => {
                    diags.record(ctx.row, Some(col), "unresolvable y value");
                    if !policy.skip_bad_values {
                        error = Some(SynthError::BadValue {
                            row: ctx.row,
                            column: Some(col),
                        });
                        return VisitFlow::Terminate;
                    }
                    f64::NAN
                }
            };
            group.series[i].points.push(SamplePoint {
                x,
                y,
                row: ctx.row,
            });
        }
        VisitFlow::Continue
    });

    if let Some(e) = error {
        return Err(e);
    }
    if interrupt.load(Ordering::Relaxed) {
        return Err(SynthError::Interrupted);
    }
    Ok(groups)
}

/// `Err(None)` means skip the row, `Err(Some(_))` aborts the pass.
fn resolve_group_key(
    ctx: &RowCtx<'_>,
    policy: &PlotPolicy,
    diags: &mut DiagnosticsCollector,
) -> Result<i64, Option<SynthError>> {
    let Some(col) = policy.group_column else {
        return Ok(0);
    };
    match ctx.cols.real(col) {
        Some(v) if v.is_finite() => Ok(v.floor() as i64),
        _ => {
            diags.record(ctx.row, Some(col), "unresolvable group value");
            if policy.skip_bad_values {
                Err(None)
            } else {
                Err(Some(SynthError::BadValue {
                    row: ctx.row,
                    column: Some(col),
                }))
            }
        }
    }
}

use eyre::{bail, Result};
use serde::{Deserialize, Serialize};

/// Which side of the leading series pair a bivariate fill region keeps.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum FillSide {
    /// Keep only the region where the second series lies above the first.
    Above,
    /// Keep only the region where the second series lies below the first.
    Below,
    #[default]
    Both,
}

/// Full synthesis policy for one plot.
///
/// The pipeline snapshots this immutably before launching a pass; mutating
/// the caller's copy afterwards has no effect on a pass already in flight.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotPolicy {
    /// Column providing x values. `None` uses the visit row index.
    pub x_column: Option<usize>,
    /// One column per configured series.
    pub y_columns: Vec<usize>,
    /// Optional categorical column partitioning rows into groups.
    pub group_column: Option<usize>,

    /// Each series' y is offset by the running sum of the series below it.
    pub stacked: bool,
    /// Single-series running sum along the x dimension.
    pub cumulative: bool,
    /// Pair adjacent series (sorted by y at each x) into connectors/bands.
    pub bivariate: bool,

    pub fill_under: bool,
    pub fill_under_side: FillSide,
    /// Explicit fill baseline override; defaults to the stack floor
    /// (or the range minimum for the bottom series).
    pub fill_baseline: Option<f64>,

    /// Lay groups out side by side, each in its own `[g, g+1)` x band.
    pub group_split: bool,
    /// Under group split, keep y in shared data units instead of
    /// normalizing each group's y into its own band.
    pub group_split_share_y: bool,
    /// Fraction of each band left empty at both ends.
    pub group_split_margin: f64,

    /// Skip rows/values that fail to parse instead of failing the pass.
    pub skip_bad_values: bool,
    /// Transpose: every visited row becomes one series; x is the ordinal
    /// position of each bound y column.
    pub series_as_rows: bool,
    /// Emit one vertical segment per valid point from the baseline.
    pub impulses: bool,
    /// Horizon band count; 1 disables layering.
    pub layers: usize,
}

impl Default for PlotPolicy {
    fn default() -> Self {
        Self {
            x_column: Some(0),
            y_columns: vec![1],
            group_column: None,
            stacked: false,
            cumulative: false,
            bivariate: false,
            fill_under: false,
            fill_under_side: FillSide::Both,
            fill_baseline: None,
            group_split: false,
            group_split_share_y: true,
            group_split_margin: 0.05,
            skip_bad_values: true,
            series_as_rows: false,
            impulses: false,
            layers: 1,
        }
    }
}

impl PlotPolicy {
    /// Rejects configurations the synthesizer cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.y_columns.is_empty() {
            bail!("at least one y column must be configured");
        }
        if self.bivariate && self.y_columns.len() < 2 && !self.series_as_rows {
            bail!("bivariate mode requires at least two series");
        }
        if self.stacked && self.cumulative {
            bail!("stacked and cumulative are mutually exclusive");
        }
        if self.cumulative && self.y_columns.len() > 1 && !self.series_as_rows {
            bail!("cumulative mode applies to a single series");
        }
        if self.layers == 0 {
            bail!("layer count must be at least 1");
        }
        if !(0.0..0.5).contains(&self.group_split_margin) {
            bail!(
                "group split margin {} outside [0, 0.5)",
                self.group_split_margin
            );
        }
        Ok(())
    }
}

use std::collections::HashMap;

/// Callback verdict for one visited row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitFlow {
    Continue,
    /// Drop this row (and its children) but keep visiting.
    Skip,
    /// Abort the whole visit.
    Terminate,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisitResult {
    Completed,
    Terminated,
}

/// Typed per-column access for the row currently being visited.
pub trait ColumnAccessor {
    /// Numeric value of `column`, honoring any mapped override.
    fn real(&self, column: usize) -> Option<f64>;
    fn string(&self, column: usize) -> Option<String>;
}

/// Context handed to the visit callback for each row.
pub struct RowCtx<'a> {
    /// Flat visit index, counting hierarchical children.
    pub row: usize,
    /// Indices of the row's ancestors, outermost first. Empty at top level.
    pub hier_path: &'a [usize],
    pub cols: &'a dyn ColumnAccessor,
}

/// Lazy, possibly-hierarchical sequence of rows.
///
/// This is the boundary to the data layer: the synthesizer only ever reads
/// rows through this trait and a visit observes one immutable snapshot.
pub trait RowSource: Send + Sync {
    fn visit(&self, callback: &mut dyn FnMut(RowCtx<'_>) -> VisitFlow) -> VisitResult;

    /// Optional sizing hint; not required to be exact.
    fn row_count_hint(&self) -> Option<usize> {
        None
    }

    /// Series labels for series-as-rows mode. One entry per bound column.
    fn series_headers(&self) -> Vec<String> {
        Vec::new()
    }
}

#[derive(Clone, Debug, PartialEq, Default)]
pub enum Cell {
    Real(f64),
    Text(String),
    #[default]
    Empty,
}

impl From<f64> for Cell {
    fn from(v: f64) -> Self {
        Cell::Real(v)
    }
}

impl From<&str> for Cell {
    fn from(v: &str) -> Self {
        Cell::Text(v.to_string())
    }
}

#[derive(Clone, Debug, Default)]
struct VecRow {
    cells: Vec<Cell>,
    children: Vec<VecRow>,
}

/// In-memory [`RowSource`] over a rectangular cell grid, with optional
/// child rows per row and per-cell mapped numeric overrides.
#[derive(Clone, Debug, Default)]
pub struct VecRowSource {
    rows: Vec<VecRow>,
    mapped: HashMap<(usize, usize), f64>,
    headers: Vec<String>,
}

impl VecRowSource {
    pub fn new(rows: Vec<Vec<Cell>>) -> Self {
        Self {
            rows: rows
                .into_iter()
                .map(|cells| VecRow {
                    cells,
                    children: Vec::new(),
                })
                .collect(),
            mapped: HashMap::new(),
            headers: Vec::new(),
        }
    }

    /// Convenience constructor from plain numeric rows.
    pub fn from_reals(rows: Vec<Vec<f64>>) -> Self {
        Self::new(
            rows.into_iter()
                .map(|r| r.into_iter().map(Cell::Real).collect())
                .collect(),
        )
    }

    pub fn with_headers(mut self, headers: Vec<String>) -> Self {
        self.headers = headers;
        self
    }

    /// Overrides the numeric reading of one cell, keyed by flat row index.
    /// Used when the caller coerces a text column through an external
    /// mapping (e.g. category labels to ordinals).
    pub fn set_mapped(&mut self, row: usize, column: usize, value: f64) {
        self.mapped.insert((row, column), value);
    }

    /// Attaches child rows under top-level row `parent`. Returns false when
    /// `parent` is out of range.
    pub fn set_children(&mut self, parent: usize, children: Vec<Vec<Cell>>) -> bool {
        let Some(row) = self.rows.get_mut(parent) else {
            return false;
        };
        row.children = children
            .into_iter()
            .map(|cells| VecRow {
                cells,
                children: Vec::new(),
            })
            .collect();
        true
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn visit_rows(
        &self,
        rows: &[VecRow],
        path: &mut Vec<usize>,
        next_index: &mut usize,
        callback: &mut dyn FnMut(RowCtx<'_>) -> VisitFlow,
    ) -> VisitFlow {
        for (i, row) in rows.iter().enumerate() {
            let index = *next_index;
            *next_index += 1;
            let accessor = VecAccessor {
                row: index,
                cells: &row.cells,
                mapped: &self.mapped,
            };
            let flow = callback(RowCtx {
                row: index,
                hier_path: path.as_slice(),
                cols: &accessor,
            });
            match flow {
                VisitFlow::Terminate => return VisitFlow::Terminate,
                VisitFlow::Skip => continue,
                VisitFlow::Continue => {}
            }
            if !row.children.is_empty() {
                path.push(i);
                let flow = self.visit_rows(&row.children, path, next_index, callback);
                path.pop();
                if flow == VisitFlow::Terminate {
                    return VisitFlow::Terminate;
                }
            }
        }
        VisitFlow::Continue
    }
}

impl RowSource for VecRowSource {
    fn visit(&self, callback: &mut dyn FnMut(RowCtx<'_>) -> VisitFlow) -> VisitResult {
        let mut path = Vec::new();
        let mut next_index = 0;
        match self.visit_rows(&self.rows, &mut path, &mut next_index, callback) {
            VisitFlow::Terminate => VisitResult::Terminated,
            _ => VisitResult::Completed,
        }
    }

    fn row_count_hint(&self) -> Option<usize> {
        Some(self.rows.len())
    }

    fn series_headers(&self) -> Vec<String> {
        self.headers.clone()
    }
}

struct VecAccessor<'a> {
    row: usize,
    cells: &'a [Cell],
    mapped: &'a HashMap<(usize, usize), f64>,
}

impl ColumnAccessor for VecAccessor<'_> {
    fn real(&self, column: usize) -> Option<f64> {
        if let Some(v) = self.mapped.get(&(self.row, column)) {
            return Some(*v);
        }
        match self.cells.get(column)? {
            Cell::Real(v) => Some(*v),
            Cell::Text(s) => s.trim().parse().ok(),
            Cell::Empty => None,
        }
    }

    fn string(&self, column: usize) -> Option<String> {
        match self.cells.get(column)? {
            Cell::Real(v) => Some(v.to_string()),
            Cell::Text(s) => Some(s.clone()),
            Cell::Empty => None,
        }
    }
}

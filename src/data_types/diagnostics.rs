use tracing::warn;

/// One row-level data problem encountered during synthesis.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowDiagnostic {
    pub row: usize,
    /// `None` when the problem concerns the row as a whole (e.g. bad group).
    pub column: Option<usize>,
    pub message: String,
}

/// Accumulates row-level diagnostics for one synthesis pass.
///
/// Owned by the caller and passed into the synthesizer explicitly; there is
/// no global counter. Recording a diagnostic never aborts the pass.
#[derive(Debug, Default)]
pub struct DiagnosticsCollector {
    entries: Vec<RowDiagnostic>,
}

impl DiagnosticsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, row: usize, column: Option<usize>, message: impl Into<String>) {
        let message = message.into();
        warn!(row, ?column, %message, "row diagnostic");
        self.entries.push(RowDiagnostic {
            row,
            column,
            message,
        });
    }

    pub fn entries(&self) -> &[RowDiagnostic] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Moves all entries out, leaving the collector empty.
    pub fn take(&mut self) -> Vec<RowDiagnostic> {
        std::mem::take(&mut self.entries)
    }
}

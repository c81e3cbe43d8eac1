//! plotpipe: incremental chart-plotting computation.
//!
//! Turns a snapshot of tabular rows plus a plot policy into a data range
//! and cached drawable geometry, and coordinates the recomputation safely
//! against user interaction (pan/zoom/selection) via an asynchronous
//! pipeline with cancellation and coalescing.

pub mod data_types;
pub mod layer_cache;
pub mod object_store;
pub mod pipeline;
pub mod synth;

pub use data_types::{
    Cell, ColumnAccessor, DiagnosticsCollector, DrawableObject, FillSide, ObjectId, PlotPolicy,
    Range, RowCtx, RowDiagnostic, RowSource, Shape, VecRowSource, VisitFlow, VisitResult,
};
pub use layer_cache::{Dep, Layer, LayerCache};
pub use object_store::{Containment, ObjectStore};
pub use pipeline::{DrawOutcome, PipelineEvent, PipelineState, StageLock, UpdatePipeline};
pub use synth::{compute_range, synthesize, RangeSummary, SynthError, Synthesis};

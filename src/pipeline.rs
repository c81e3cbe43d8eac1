//! The update pipeline: sequences range calculation, object synthesis, and
//! layered drawing for one plot instance.
//!
//! Range and object stages run on the rayon global pool; draw happens on
//! the caller's thread. At most one stage is in flight per pipeline.
//! Superseding requests are coalesced (last configuration wins) and a pass
//! in flight can be cancelled cooperatively through an atomic interrupt
//! flag. Publication of completed results and every state transition happen
//! under a named fail-fast lock; the long computations themselves run on
//! private data without holding it.

use std::sync::atomic::{AtomicBool, AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::data_types::{ObjectId, PlotPolicy, Range, RowDiagnostic, RowSource};
use crate::layer_cache::{Dep, Layer, LayerCache};
use crate::object_store::{Containment, ObjectStore};
use crate::synth::{self, RangeSummary, SynthError};

/// Authoritative pipeline state. Exactly one per plot instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PipelineState {
    /// Nothing computed yet.
    Idle = 0,
    /// Range stage in flight.
    CalcRange,
    /// Object stage in flight.
    CalcObjs,
    /// Results published, draw pending.
    DrawObjs,
    /// Valid results published, no draw pending (e.g. after a cancelled
    /// pass retained the previous ones).
    Ready,
    /// Stage in flight and a superseding full request was coalesced.
    NeedsRange,
    /// Range stage in flight and an object-only request was coalesced.
    NeedsObjs,
    /// Drawn before, but a layer (e.g. selection overlay) was invalidated.
    NeedsDraw,
    /// All layers clean and composited.
    Drawn,
}

impl PipelineState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => Self::Idle,
            1 => Self::CalcRange,
            2 => Self::CalcObjs,
            3 => Self::DrawObjs,
            4 => Self::Ready,
            5 => Self::NeedsRange,
            6 => Self::NeedsObjs,
            7 => Self::NeedsDraw,
            8 => Self::Drawn,
            _ => unreachable!("invalid pipeline state {v}"),
        }
    }

    fn in_flight(self) -> bool {
        matches!(
            self,
            Self::CalcRange | Self::CalcObjs | Self::NeedsRange | Self::NeedsObjs
        )
    }
}

/// Per-stage completion notifications.
#[derive(Clone, Debug, PartialEq)]
pub enum PipelineEvent {
    RangeComputed,
    ObjectsComputed,
    /// The pass was interrupted; previous results remain authoritative.
    PassCancelled,
    PassFailed(SynthError),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// A background stage is in flight; paint a busy placeholder instead of
    /// stale or partially composited geometry.
    Busy,
    /// No data: the range is unset. Paint the empty-state indicator.
    Empty,
    Drawn,
}

/// Named non-reentrant mutex guarding state transitions and snapshot
/// publication. Re-acquiring it on the owning thread is a scheduler bug and
/// panics with the lock's name instead of deadlocking silently.
pub struct StageLock {
    name: &'static str,
    owner: AtomicU64,
    inner: Mutex<()>,
}

fn thread_token() -> u64 {
    static NEXT: AtomicU64 = AtomicU64::new(1);
    thread_local! {
        static TOKEN: u64 = NEXT.fetch_add(1, Ordering::Relaxed);
    }
    TOKEN.with(|t| *t)
}

impl StageLock {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            owner: AtomicU64::new(0),
            inner: Mutex::new(()),
        }
    }

    pub fn lock(&self) -> StageLockGuard<'_> {
        let me = thread_token();
        assert!(
            self.owner.load(Ordering::Acquire) != me,
            "re-entrant acquisition of stage lock '{}'",
            self.name
        );
        let guard = self.inner.lock();
        self.owner.store(me, Ordering::Release);
        StageLockGuard {
            lock: self,
            _guard: guard,
        }
    }
}

pub struct StageLockGuard<'a> {
    lock: &'a StageLock,
    _guard: parking_lot::MutexGuard<'a, ()>,
}

impl Drop for StageLockGuard<'_> {
    fn drop(&mut self) {
        self.lock.owner.store(0, Ordering::Release);
    }
}

/// Immutable snapshot of what a pass computes from. Captured once when the
/// range stage launches; the object stage of the same pass reuses it.
struct PassConfig {
    source: Arc<dyn RowSource>,
    policy: PlotPolicy,
}

type Observer = Arc<dyn Fn(PipelineEvent) + Send + Sync>;

struct Shared<S> {
    state: AtomicU8,
    interrupt: AtomicBool,
    /// Stamps each pass; a completing stage with a stale epoch publishes
    /// nothing.
    epoch: AtomicU64,
    lock: StageLock,
    config: RwLock<Option<Arc<PassConfig>>>,
    range: RwLock<RangeSummary>,
    objects: RwLock<ObjectStore>,
    diagnostics: RwLock<Vec<RowDiagnostic>>,
    layers: Mutex<LayerCache<S>>,
    observer: RwLock<Option<Observer>>,
}

impl<S> Shared<S> {
    fn state(&self) -> PipelineState {
        PipelineState::from_u8(self.state.load(Ordering::SeqCst))
    }

    fn set_state(&self, s: PipelineState) {
        self.state.store(s as u8, Ordering::SeqCst);
    }

    fn try_transition(&self, from: &[PipelineState], to: PipelineState) -> bool {
        for &f in from {
            if self
                .state
                .compare_exchange(f as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
            {
                return true;
            }
        }
        false
    }

    fn notify(&self, event: PipelineEvent) {
        let observer = self.observer.read().clone();
        if let Some(obs) = observer {
            obs(event);
        }
    }
}

/// One plot instance's pipeline. Independent instances share nothing and
/// may run concurrently.
pub struct UpdatePipeline<S> {
    shared: Arc<Shared<S>>,
}

impl<S: Send + 'static> Default for UpdatePipeline<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S: Send + 'static> UpdatePipeline<S> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: AtomicU8::new(PipelineState::Idle as u8),
                interrupt: AtomicBool::new(false),
                epoch: AtomicU64::new(0),
                lock: StageLock::new("pipeline"),
                config: RwLock::new(None),
                range: RwLock::new(RangeSummary {
                    range: Range::empty(),
                    group_keys: Vec::new(),
                    group_ranges: Vec::new(),
                }),
                objects: RwLock::new(ObjectStore::empty()),
                diagnostics: RwLock::new(Vec::new()),
                layers: Mutex::new(LayerCache::new()),
                observer: RwLock::new(None),
            }),
        }
    }

    /// Installs the data source and policy for subsequent passes. A pass
    /// already in flight keeps its own snapshot; the new configuration
    /// applies from the next launch (last write wins).
    pub fn configure(
        &self,
        source: Arc<dyn RowSource>,
        policy: PlotPolicy,
    ) -> eyre::Result<()> {
        policy.validate()?;
        *self.shared.config.write() = Some(Arc::new(PassConfig { source, policy }));
        Ok(())
    }

    pub fn set_observer(&self, observer: impl Fn(PipelineEvent) + Send + Sync + 'static) {
        *self.shared.observer.write() = Some(Arc::new(observer));
    }

    pub fn state(&self) -> PipelineState {
        self.shared.state()
    }

    /// Requests a full pass (range, then objects). Coalesced if a stage is
    /// already in flight.
    pub fn request_range_and_objects(&self) {
        let guard = self.shared.lock.lock();
        let state = self.shared.state();
        if state.in_flight() {
            debug!(?state, "full pass request coalesced");
            self.shared.set_state(PipelineState::NeedsRange);
            return;
        }
        self.launch_range(&guard);
    }

    /// Requests object re-synthesis against the already published range.
    /// Falls back to a full pass when no range exists yet.
    pub fn request_objects_only(&self) {
        let guard = self.shared.lock.lock();
        let state = self.shared.state();
        match state {
            PipelineState::NeedsRange => {}
            PipelineState::CalcRange | PipelineState::CalcObjs | PipelineState::NeedsObjs => {
                debug!(?state, "object request coalesced");
                self.shared.set_state(PipelineState::NeedsObjs);
            }
            _ => {
                if self.shared.range.read().range.is_set() {
                    self.launch_objs(&guard);
                } else {
                    self.launch_range(&guard);
                }
            }
        }
    }

    /// Raises the cooperative interrupt flag. The stage in flight returns
    /// without publishing; previously published results stay authoritative.
    pub fn cancel(&self) {
        self.shared.interrupt.store(true, Ordering::SeqCst);
    }

    fn launch_range(&self, _guard: &StageLockGuard<'_>) {
        let Some(config) = self.shared.config.read().clone() else {
            warn!("pass requested before configure()");
            return;
        };
        self.shared.interrupt.store(false, Ordering::SeqCst);
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.set_state(PipelineState::CalcRange);
        let shared = Arc::clone(&self.shared);
        rayon::spawn(move || run_range_stage(shared, config, epoch));
    }

    fn launch_objs(&self, _guard: &StageLockGuard<'_>) {
        let Some(config) = self.shared.config.read().clone() else {
            warn!("pass requested before configure()");
            return;
        };
        self.shared.interrupt.store(false, Ordering::SeqCst);
        let epoch = self.shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        self.shared.set_state(PipelineState::CalcObjs);
        let shared = Arc::clone(&self.shared);
        rayon::spawn(move || run_objs_stage(shared, config, epoch));
    }

    /// Synchronous draw on the caller's thread.
    ///
    /// While a background stage is in flight this paints nothing and
    /// returns [`DrawOutcome::Busy`]; the caller shows its placeholder.
    /// Otherwise dirty layers are repainted through `paint` and all clean
    /// surfaces are handed to `composite` in z order.
    pub fn draw(
        &self,
        mut paint: impl FnMut(Layer, &Range, &ObjectStore) -> S,
        composite: impl FnOnce(&[(Layer, &S)]),
    ) -> DrawOutcome {
        if self.shared.state().in_flight() {
            return DrawOutcome::Busy;
        }
        let summary = self.shared.range.read();
        if !summary.range.is_set() {
            return DrawOutcome::Empty;
        }
        let objects = self.shared.objects.read();
        let mut layers = self.shared.layers.lock();
        layers.repaint_with(|layer| paint(layer, &summary.range, &objects));
        let ordered: Vec<(Layer, &S)> = layers.composite().collect();
        composite(&ordered);
        drop(ordered);
        drop(layers);
        drop(objects);
        drop(summary);

        let _guard = self.shared.lock.lock();
        self.shared.try_transition(
            &[
                PipelineState::DrawObjs,
                PipelineState::NeedsDraw,
                PipelineState::Ready,
            ],
            PipelineState::Drawn,
        );
        DrawOutcome::Drawn
    }

    /// Published data range of the last completed pass.
    pub fn range(&self) -> Range {
        self.shared.range.read().range
    }

    /// Per-group ranges in data units (per-band tick labels under group
    /// split).
    pub fn group_ranges(&self) -> Vec<Range> {
        self.shared.range.read().group_ranges.clone()
    }

    pub fn group_keys(&self) -> Vec<i64> {
        self.shared.range.read().group_keys.clone()
    }

    /// Row diagnostics accumulated by the last completed pass.
    pub fn diagnostics(&self) -> Vec<RowDiagnostic> {
        self.shared.diagnostics.read().clone()
    }

    /// Read access to the published object store.
    pub fn with_objects<R>(&self, f: impl FnOnce(&ObjectStore) -> R) -> R {
        f(&self.shared.objects.read())
    }

    pub fn objects_at(&self, x: f64, y: f64, tol: f64) -> Vec<ObjectId> {
        self.shared.objects.read().objects_at(x, y, tol)
    }

    pub fn objects_in(&self, rect: &Range, mode: Containment) -> Vec<ObjectId> {
        self.shared.objects.read().objects_in(rect, mode)
    }

    /// Flips selection on one object and invalidates the overlay layer.
    pub fn set_selected(&self, id: ObjectId, selected: bool) -> bool {
        let found = self.shared.objects.write().set_selected(id, selected);
        if found {
            self.shared.layers.lock().invalidate(Dep::Selection);
            self.shared
                .try_transition(&[PipelineState::Drawn], PipelineState::NeedsDraw);
        }
        found
    }

    pub fn set_hovered(&self, id: ObjectId, hovered: bool) -> bool {
        let found = self.shared.objects.write().set_hovered(id, hovered);
        if found {
            self.shared.layers.lock().invalidate(Dep::Selection);
            self.shared
                .try_transition(&[PipelineState::Drawn], PipelineState::NeedsDraw);
        }
        found
    }
}

/// State the pipeline settles into when a pass ends without publishing.
fn settled_state<S>(shared: &Shared<S>) -> PipelineState {
    if shared.range.read().range.is_set() {
        PipelineState::Ready
    } else {
        PipelineState::Idle
    }
}

fn run_range_stage<S: Send + 'static>(shared: Arc<Shared<S>>, config: Arc<PassConfig>, epoch: u64) {
    let mut diags = crate::data_types::DiagnosticsCollector::new();
    let result = synth::compute_range(
        config.source.as_ref(),
        &config.policy,
        &shared.interrupt,
        &mut diags,
    );

    let event;
    {
        let guard = shared.lock.lock();
        if shared.epoch.load(Ordering::SeqCst) != epoch {
            debug!(epoch, "range stage superseded, discarding");
            return;
        }
        if shared.state() == PipelineState::NeedsRange {
            relaunch_range(&shared, &guard);
            return;
        }
        match result {
            Ok(summary) => {
                *shared.range.write() = summary;
                *shared.diagnostics.write() = diags.take();
                shared.layers.lock().invalidate(Dep::Range);
                shared.set_state(PipelineState::CalcObjs);
                let next = Arc::clone(&shared);
                rayon::spawn(move || run_objs_stage(next, config, epoch));
                event = PipelineEvent::RangeComputed;
            }
            Err(SynthError::Interrupted) => {
                shared.set_state(settled_state(&shared));
                event = PipelineEvent::PassCancelled;
            }
            Err(e) => {
                warn!(error = %e, "range stage failed");
                shared.set_state(settled_state(&shared));
                event = PipelineEvent::PassFailed(e);
            }
        }
    }
    shared.notify(event);
}

fn run_objs_stage<S: Send + 'static>(shared: Arc<Shared<S>>, config: Arc<PassConfig>, epoch: u64) {
    let mut diags = crate::data_types::DiagnosticsCollector::new();
    let result = synth::synthesize(
        config.source.as_ref(),
        &config.policy,
        &shared.interrupt,
        &mut diags,
    );

    let event;
    {
        let guard = shared.lock.lock();
        if shared.epoch.load(Ordering::SeqCst) != epoch {
            debug!(epoch, "object stage superseded, discarding");
            return;
        }
        match shared.state() {
            PipelineState::NeedsRange => {
                relaunch_range(&shared, &guard);
                return;
            }
            state => {
                let rerun_objs = state == PipelineState::NeedsObjs;
                match result {
                    Ok(synthesis) => {
                        let store = ObjectStore::new(synthesis.objects, &synthesis.range);
                        info!(
                            objects = store.len(),
                            groups = synthesis.group_keys.len(),
                            "object pass published"
                        );
                        let summary = RangeSummary {
                            range: synthesis.range,
                            group_keys: synthesis.group_keys,
                            group_ranges: synthesis.group_ranges,
                        };
                        // An objects-only pass against fresh data can move
                        // the range too; range-derived layers must follow.
                        let range_changed = {
                            let mut published = shared.range.write();
                            let changed = *published != summary;
                            *published = summary;
                            changed
                        };
                        *shared.objects.write() = store;
                        *shared.diagnostics.write() = diags.take();
                        {
                            let mut layers = shared.layers.lock();
                            if range_changed {
                                layers.invalidate(Dep::Range);
                            }
                            layers.invalidate(Dep::Objects);
                            layers.invalidate(Dep::Selection);
                        }
                        if rerun_objs {
                            relaunch_objs(&shared, &guard);
                            return;
                        }
                        shared.set_state(PipelineState::DrawObjs);
                        event = PipelineEvent::ObjectsComputed;
                    }
                    Err(SynthError::Interrupted) => {
                        if rerun_objs {
                            relaunch_objs(&shared, &guard);
                            return;
                        }
                        shared.set_state(settled_state(&shared));
                        event = PipelineEvent::PassCancelled;
                    }
                    Err(e) => {
                        warn!(error = %e, "object stage failed");
                        shared.set_state(settled_state(&shared));
                        event = PipelineEvent::PassFailed(e);
                    }
                }
            }
        }
    }
    shared.notify(event);
}

fn relaunch_range<S: Send + 'static>(shared: &Arc<Shared<S>>, _guard: &StageLockGuard<'_>) {
    let Some(config) = shared.config.read().clone() else {
        shared.set_state(settled_state(shared));
        return;
    };
    shared.interrupt.store(false, Ordering::SeqCst);
    let epoch = shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
    shared.set_state(PipelineState::CalcRange);
    let next = Arc::clone(shared);
    rayon::spawn(move || run_range_stage(next, config, epoch));
}

fn relaunch_objs<S: Send + 'static>(shared: &Arc<Shared<S>>, _guard: &StageLockGuard<'_>) {
    let Some(config) = shared.config.read().clone() else {
        shared.set_state(settled_state(shared));
        return;
    };
    shared.interrupt.store(false, Ordering::SeqCst);
    let epoch = shared.epoch.fetch_add(1, Ordering::SeqCst) + 1;
    shared.set_state(PipelineState::CalcObjs);
    let next = Arc::clone(shared);
    rayon::spawn(move || run_objs_stage(next, config, epoch));
}

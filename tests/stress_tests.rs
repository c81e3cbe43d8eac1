use std::sync::atomic::AtomicBool;
use std::sync::{mpsc::channel, Arc, Mutex};
use std::time::Duration;

use rand::Rng;

use plotpipe::{
    synthesize, DiagnosticsCollector, PipelineEvent, PlotPolicy, Shape, UpdatePipeline,
    VecRowSource,
};

#[test]
fn test_large_random_series_range_and_vertices() {
    let mut rng = rand::rng();
    let n = 50_000;
    let mut rows = Vec::with_capacity(n);
    let mut finite = 0usize;
    for i in 0..n {
        let y = if rng.random_bool(0.02) {
            f64::NAN
        } else {
            finite += 1;
            rng.random_range(-1_000.0..1_000.0)
        };
        rows.push(vec![i as f64, y]);
    }

    let interrupt = AtomicBool::new(false);
    let mut diags = DiagnosticsCollector::new();
    let source = VecRowSource::from_reals(rows.clone());
    let s = synthesize(&source, &PlotPolicy::default(), &interrupt, &mut diags).unwrap();

    for row in &rows {
        if row[1].is_finite() {
            assert!(s.range.contains(row[0], row[1]));
        }
    }

    // Every finite sample appears exactly once, as a line vertex or a
    // stranded marker.
    let mut vertices = 0usize;
    for obj in &s.objects {
        match &obj.shape {
            Shape::Polyline { points, .. } => vertices += points.len(),
            Shape::Point { .. } => vertices += 1,
            _ => {}
        }
    }
    assert_eq!(vertices, finite);
}

#[test]
fn test_many_groups_stacked_random() {
    let mut rng = rand::rng();
    let mut rows = Vec::new();
    for g in 0..20 {
        for x in 0..200 {
            rows.push(vec![
                x as f64,
                rng.random_range(0.0..10.0),
                rng.random_range(0.0..10.0),
                g as f64,
            ]);
        }
    }
    let policy = PlotPolicy {
        y_columns: vec![1, 2],
        group_column: Some(3),
        stacked: true,
        ..PlotPolicy::default()
    };
    let interrupt = AtomicBool::new(false);
    let mut diags = DiagnosticsCollector::new();
    let source = VecRowSource::from_reals(rows);
    let s = synthesize(&source, &policy, &interrupt, &mut diags).unwrap();

    assert_eq!(s.group_keys.len(), 20);
    assert_eq!(s.group_ranges.len(), 20);
    // Stacked values here are sums of non-negative samples, so every
    // per-group range stays under the overall maximum.
    for gr in &s.group_ranges {
        assert!(gr.y_max <= s.range.y_max + 1e-9);
    }
}

#[test]
fn test_rapid_fire_requests_settle() {
    let pipeline: UpdatePipeline<()> = UpdatePipeline::new();
    let (tx, rx) = channel();
    let tx = Mutex::new(tx);
    pipeline.set_observer(move |event| {
        let _ = tx.lock().unwrap().send(event);
    });

    let mut rng = rand::rng();
    let rows: Vec<Vec<f64>> = (0..5_000)
        .map(|i| vec![i as f64, rng.random_range(-1.0..1.0)])
        .collect();
    pipeline
        .configure(Arc::new(VecRowSource::from_reals(rows)), PlotPolicy::default())
        .unwrap();

    // Hammer the pipeline; coalescing must collapse this into a bounded
    // number of passes that still end with a published result.
    for _ in 0..50 {
        pipeline.request_range_and_objects();
        if rng.random_bool(0.3) {
            pipeline.cancel();
        }
    }
    pipeline.request_range_and_objects();

    let deadline = Duration::from_secs(20);
    loop {
        match rx.recv_timeout(deadline).expect("pipeline settles") {
            PipelineEvent::ObjectsComputed => break,
            _ => continue,
        }
    }
    assert!(pipeline.range().is_set());
    assert!(pipeline.with_objects(|s| !s.is_empty()));
}

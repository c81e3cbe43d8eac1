use plotpipe::{Containment, DrawableObject, ObjectId, ObjectStore, Range, Shape};

fn point(group: usize, series: usize, row: usize, x: f64, y: f64) -> DrawableObject {
    DrawableObject::new(
        ObjectId::new(group, series, row),
        Shape::Point { x, y },
        format!("p{row}"),
    )
}

fn line(row: usize, pts: Vec<(f64, f64)>) -> DrawableObject {
    let rows = (row..row + pts.len()).collect();
    DrawableObject::new(
        ObjectId::new(0, 0, row),
        Shape::Polyline { points: pts, rows },
        "line".to_string(),
    )
}

fn store(objects: Vec<DrawableObject>) -> ObjectStore {
    let mut range = Range::empty();
    for o in &objects {
        range.union(&o.bbox);
    }
    ObjectStore::new(objects, &range)
}

#[test]
fn test_empty_store() {
    let s = ObjectStore::empty();
    assert!(s.is_empty());
    assert!(s.objects_at(0.0, 0.0, 1.0).is_empty());
    assert!(s
        .objects_in(&Range::new(0.0, 1.0, 0.0, 1.0), Containment::Partial)
        .is_empty());
}

#[test]
fn test_point_hit_within_tolerance() {
    let s = store(vec![point(0, 0, 0, 5.0, 5.0), point(0, 0, 1, 50.0, 50.0)]);
    let hits = s.objects_at(5.2, 5.1, 0.5);
    assert_eq!(hits, vec![ObjectId::new(0, 0, 0)]);
    assert!(s.objects_at(5.2, 5.1, 0.01).is_empty());
}

#[test]
fn test_topmost_first_ordering() {
    // Two coincident points: the most recently added wins the top spot.
    let s = store(vec![point(0, 0, 0, 5.0, 5.0), point(0, 1, 0, 5.0, 5.0)]);
    let hits = s.objects_at(5.0, 5.0, 0.5);
    assert_eq!(
        hits,
        vec![ObjectId::new(0, 1, 0), ObjectId::new(0, 0, 0)]
    );
}

#[test]
fn test_polyline_hit_on_segment_interior() {
    let s = store(vec![line(0, vec![(0.0, 0.0), (10.0, 0.0), (10.0, 10.0)])]);
    // Near the middle of the first segment, far from any vertex.
    assert_eq!(s.objects_at(5.0, 0.2, 0.5).len(), 1);
    // Off the line.
    assert!(s.objects_at(5.0, 3.0, 0.5).is_empty());
}

#[test]
fn test_polygon_hit_inside() {
    let poly = DrawableObject::new(
        ObjectId::new(0, 0, 0),
        Shape::Polygon {
            points: vec![(0.0, 0.0), (4.0, 0.0), (4.0, 4.0), (0.0, 4.0)],
        },
        "fill".to_string(),
    );
    let s = store(vec![poly]);
    assert_eq!(s.objects_at(2.0, 2.0, 0.0).len(), 1);
    assert!(s.objects_at(5.0, 5.0, 0.1).is_empty());
}

#[test]
fn test_rect_query_full_vs_partial() {
    let s = store(vec![
        line(0, vec![(0.0, 0.0), (2.0, 2.0)]),
        line(10, vec![(1.0, 1.0), (8.0, 8.0)]),
    ]);
    let rect = Range::new(-0.5, 3.0, -0.5, 3.0);

    let full = s.objects_in(&rect, Containment::Full);
    assert_eq!(full, vec![ObjectId::new(0, 0, 0)]);

    let partial = s.objects_in(&rect, Containment::Partial);
    assert_eq!(partial.len(), 2);
}

#[test]
fn test_selection_round_trip() {
    let mut s = store(vec![point(0, 0, 0, 1.0, 1.0), point(0, 0, 1, 2.0, 2.0)]);
    let id = ObjectId::new(0, 0, 1);
    assert!(s.set_selected(id, true));
    assert_eq!(s.selected(), vec![id]);
    assert!(s.get(id).unwrap().selected);

    s.clear_selection();
    assert!(s.selected().is_empty());

    // Unknown ids are reported, not silently ignored.
    assert!(!s.set_selected(ObjectId::new(9, 9, 9), true));
}

#[test]
fn test_objects_at_reports_shared_id_once() {
    // A series' line and its fill share one id; another object sits
    // between them in store order, so the duplicates are not adjacent.
    let id = ObjectId::new(0, 0, 0);
    let line = DrawableObject::new(
        id,
        Shape::Polyline {
            points: vec![(0.0, 0.0), (2.0, 0.0)],
            rows: vec![0, 1],
        },
        "line".to_string(),
    );
    let marker = point(0, 1, 0, 1.0, 0.0);
    let fill = DrawableObject::new(
        id,
        Shape::Polygon {
            points: vec![(0.0, 0.0), (2.0, 0.0), (2.0, -1.0), (0.0, -1.0)],
        },
        "fill".to_string(),
    );
    let s = store(vec![line, marker, fill]);

    let hits = s.objects_at(1.0, 0.0, 0.1);
    assert_eq!(hits, vec![id, ObjectId::new(0, 1, 0)]);
}

#[test]
fn test_impulse_hit() {
    let imp = DrawableObject::new(
        ObjectId::new(0, 0, 0),
        Shape::Impulse {
            x: 3.0,
            y0: 0.0,
            y1: 5.0,
        },
        "impulse".to_string(),
    );
    let s = store(vec![imp, point(0, 0, 1, 30.0, 30.0)]);
    assert_eq!(s.objects_at(3.1, 2.5, 0.2).len(), 1);
    assert!(s.objects_at(3.1, 6.0, 0.2).is_empty());
}

#[test]
fn test_many_objects_grid_coverage() {
    // A grid of points; every one must be findable through the index.
    let mut objects = Vec::new();
    for i in 0..40 {
        for j in 0..40 {
            objects.push(point(0, 0, i * 40 + j, i as f64, j as f64));
        }
    }
    let s = store(objects);
    for i in 0..40 {
        for j in 0..40 {
            let hits = s.objects_at(i as f64, j as f64, 0.1);
            assert_eq!(hits.len(), 1, "missed point ({i}, {j})");
        }
    }
}

use plotpipe::Range;

#[test]
fn test_empty_range_is_unset() {
    let r = Range::empty();
    assert!(!r.is_set());
    assert!(!r.contains(0.0, 0.0));
}

#[test]
fn test_extend_ignores_non_finite() {
    let mut r = Range::empty();
    r.extend(f64::NAN, 1.0);
    r.extend(1.0, f64::NAN);
    r.extend(f64::INFINITY, 2.0);
    assert!(!r.is_set(), "only non-finite input, range must stay unset");

    r.extend(1.0, 2.0);
    r.extend(4.0, 8.0);
    assert!(r.is_set());
    assert_eq!((r.x_min, r.x_max, r.y_min, r.y_max), (1.0, 4.0, 2.0, 8.0));
}

#[test]
fn test_union_with_unset_operand() {
    let mut a = Range::new(0.0, 1.0, 0.0, 1.0);
    a.union(&Range::empty());
    assert_eq!(a, Range::new(0.0, 1.0, 0.0, 1.0));

    let mut b = Range::empty();
    b.union(&a);
    assert_eq!(b, a);
}

#[test]
fn test_widened_degenerate_axes() {
    let r = Range::new(5.0, 5.0, -2.0, 3.0).widened();
    assert!(r.width() > 0.0, "zero-width range must be widened");
    assert_eq!(r.height(), 5.0, "non-degenerate axis untouched");
    assert!(r.contains(5.0, 0.0));

    // Degenerate at the origin still gets a non-zero span.
    let z = Range::new(0.0, 0.0, 0.0, 0.0).widened();
    assert!(z.width() > 0.0 && z.height() > 0.0);
}

#[test]
fn test_widened_noop_on_proper_range() {
    let r = Range::new(1.0, 4.0, 2.0, 8.0);
    assert_eq!(r.widened(), r);
}

#[test]
fn test_encloses_and_intersects() {
    let outer = Range::new(0.0, 10.0, 0.0, 10.0);
    let inner = Range::new(2.0, 3.0, 2.0, 3.0);
    let crossing = Range::new(8.0, 12.0, 8.0, 12.0);
    assert!(outer.encloses(&inner));
    assert!(!outer.encloses(&crossing));
    assert!(outer.intersects(&crossing));
    assert!(!inner.intersects(&crossing));
}

#[test]
fn test_new_normalizes_order() {
    let r = Range::new(4.0, 1.0, 8.0, 2.0);
    assert_eq!((r.x_min, r.x_max, r.y_min, r.y_max), (1.0, 4.0, 2.0, 8.0));
}

#[test]
fn test_serde_round_trip() {
    let r = Range::new(1.0, 4.0, 2.0, 8.0);
    let json = serde_json::to_string(&r).unwrap();
    let back: Range = serde_json::from_str(&json).unwrap();
    assert_eq!(back, r);
}

use plotpipe::{Dep, Layer, LayerCache};

#[test]
fn test_all_layers_start_dirty() {
    let cache: LayerCache<String> = LayerCache::new();
    for layer in Layer::Z_ORDER {
        assert!(cache.is_dirty(layer));
    }
    assert_eq!(cache.composite().count(), 0, "nothing painted yet");
}

#[test]
fn test_repaint_clears_dirty_and_composites_in_z_order() {
    let mut cache: LayerCache<String> = LayerCache::new();
    cache.repaint_with(|layer| format!("{layer:?}"));
    assert!(!cache.any_dirty());

    let order: Vec<Layer> = cache.composite().map(|(l, _)| l).collect();
    assert_eq!(
        order,
        vec![
            Layer::Background,
            Layer::Objects,
            Layer::Foreground,
            Layer::Overlay
        ]
    );
}

#[test]
fn test_invalidate_marks_only_dependents() {
    let mut cache: LayerCache<String> = LayerCache::new();
    cache.repaint_with(|_| String::new());

    cache.invalidate(Dep::Objects);
    assert!(!cache.is_dirty(Layer::Background));
    assert!(cache.is_dirty(Layer::Objects));
    assert!(cache.is_dirty(Layer::Foreground));
    assert!(!cache.is_dirty(Layer::Overlay));

    cache.repaint_with(|_| String::new());
    cache.invalidate(Dep::Selection);
    assert!(cache.is_dirty(Layer::Overlay));
    assert!(!cache.is_dirty(Layer::Objects));
}

#[test]
fn test_repaint_touches_only_dirty_layers() {
    let mut cache: LayerCache<u32> = LayerCache::new();
    let mut paints = 0;
    cache.repaint_with(|_| {
        paints += 1;
        paints
    });
    assert_eq!(paints, 4);

    cache.invalidate(Dep::Selection);
    let mut repaints = 0;
    cache.repaint_with(|_| {
        repaints += 1;
        repaints
    });
    assert_eq!(repaints, 1, "only the overlay depends on selection");
}

#[test]
fn test_dirty_layers_are_not_composited() {
    let mut cache: LayerCache<&'static str> = LayerCache::new();
    cache.repaint_with(|_| "painted");
    cache.invalidate(Dep::Range);
    // A stale surface is never handed out while its layer is dirty.
    let clean: Vec<Layer> = cache.composite().map(|(l, _)| l).collect();
    assert_eq!(clean, vec![Layer::Overlay]);
}

#[test]
fn test_custom_dependency_set() {
    let mut cache: LayerCache<()> = LayerCache::new();
    cache.repaint_with(|_| ());
    cache.set_deps(Layer::Background, vec![Dep::Selection]);
    assert!(cache.is_dirty(Layer::Background), "set_deps dirties the layer");
    cache.repaint_with(|_| ());

    cache.invalidate(Dep::Selection);
    assert!(cache.is_dirty(Layer::Background));
    assert!(cache.is_dirty(Layer::Overlay));
}

#[test]
fn test_clear_drops_surfaces() {
    let mut cache: LayerCache<u8> = LayerCache::new();
    cache.repaint_with(|_| 1);
    cache.clear();
    assert!(cache.any_dirty());
    assert_eq!(cache.composite().count(), 0);
}

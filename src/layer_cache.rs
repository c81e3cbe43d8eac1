//! Named render buffers with dirty flags and declared dependencies.
//!
//! The cache is generic over the surface type so the crate stays
//! renderer-agnostic: a GPU texture, a vector display list, or a plain
//! string in tests all work. Invariant: a clean buffer's surface is
//! consistent with the range/objects/selection state at its last repaint.

/// Fixed set of layers, listed in composition (z) order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Layer {
    Background,
    Objects,
    Foreground,
    Overlay,
}

impl Layer {
    pub const Z_ORDER: [Layer; 4] = [
        Layer::Background,
        Layer::Objects,
        Layer::Foreground,
        Layer::Overlay,
    ];
}

/// What a layer's contents are derived from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dep {
    Range,
    Objects,
    Selection,
}

#[derive(Debug)]
struct LayerBuffer<S> {
    surface: Option<S>,
    dirty: bool,
    deps: Vec<Dep>,
}

#[derive(Debug)]
pub struct LayerCache<S> {
    layers: Vec<(Layer, LayerBuffer<S>)>,
}

impl<S> Default for LayerCache<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> LayerCache<S> {
    pub fn new() -> Self {
        let deps_for = |layer: Layer| -> Vec<Dep> {
            match layer {
                Layer::Background => vec![Dep::Range],
                Layer::Objects => vec![Dep::Range, Dep::Objects],
                Layer::Foreground => vec![Dep::Range, Dep::Objects],
                Layer::Overlay => vec![Dep::Selection],
            }
        };
        Self {
            layers: Layer::Z_ORDER
                .iter()
                .map(|&layer| {
                    (
                        layer,
                        LayerBuffer {
                            surface: None,
                            dirty: true,
                            deps: deps_for(layer),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Replaces a layer's dependency set (the layer becomes dirty).
    pub fn set_deps(&mut self, layer: Layer, deps: Vec<Dep>) {
        if let Some(buf) = self.buffer_mut(layer) {
            buf.deps = deps;
            buf.dirty = true;
        }
    }

    /// Invalidate-on-write: marks every layer depending on `dep` dirty.
    pub fn invalidate(&mut self, dep: Dep) {
        for (_, buf) in &mut self.layers {
            if buf.deps.contains(&dep) {
                buf.dirty = true;
            }
        }
    }

    pub fn mark_dirty(&mut self, layer: Layer) {
        if let Some(buf) = self.buffer_mut(layer) {
            buf.dirty = true;
        }
    }

    pub fn mark_all_dirty(&mut self) {
        for (_, buf) in &mut self.layers {
            buf.dirty = true;
        }
    }

    pub fn is_dirty(&self, layer: Layer) -> bool {
        self.layers
            .iter()
            .find(|(l, _)| *l == layer)
            .map(|(_, b)| b.dirty)
            .unwrap_or(false)
    }

    pub fn any_dirty(&self) -> bool {
        self.layers.iter().any(|(_, b)| b.dirty)
    }

    /// Repaints dirty layers only, in z order.
    pub fn repaint_with(&mut self, mut painter: impl FnMut(Layer) -> S) {
        for (layer, buf) in &mut self.layers {
            if buf.dirty {
                buf.surface = Some(painter(*layer));
                buf.dirty = false;
            }
        }
    }

    /// Clean surfaces in z order. Layers never painted are skipped.
    pub fn composite(&self) -> impl Iterator<Item = (Layer, &S)> {
        self.layers
            .iter()
            .filter(|(_, b)| !b.dirty)
            .filter_map(|(l, b)| b.surface.as_ref().map(|s| (*l, s)))
    }

    /// Drops all cached surfaces; everything repaints next draw.
    pub fn clear(&mut self) {
        for (_, buf) in &mut self.layers {
            buf.surface = None;
            buf.dirty = true;
        }
    }

    fn buffer_mut(&mut self, layer: Layer) -> Option<&mut LayerBuffer<S>> {
        self.layers
            .iter_mut()
            .find(|(l, _)| *l == layer)
            .map(|(_, b)| b)
    }
}

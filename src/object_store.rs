//! Holds the drawable objects of the current pass and answers hover and
//! rubber-band queries against a uniform-grid spatial index.
//!
//! The store is replaced wholesale whenever a synthesis pass publishes, and
//! the index is rebuilt from scratch at that point; it is never patched
//! incrementally. Selection and hover flags are the only mutable state.

use crate::data_types::{shape_hit, DrawableObject, ObjectId, Range};

/// Rubber-band containment mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Containment {
    /// Object bounding box entirely inside the rectangle.
    Full,
    /// Any overlap counts.
    Partial,
}

#[derive(Debug, Default)]
struct GridIndex {
    bounds: Range,
    cols: usize,
    rows: usize,
    cells: Vec<Vec<u32>>,
}

impl GridIndex {
    fn build(objects: &[DrawableObject], range: &Range) -> Self {
        let mut bounds = *range;
        if !bounds.is_set() {
            for obj in objects {
                bounds.union(&obj.bbox);
            }
        }
        if !bounds.is_set() || objects.is_empty() {
            return Self::default();
        }
        bounds = bounds.widened();

        // Roughly one object per cell, capped so sparse stores stay cheap.
        let side = ((objects.len() as f64).sqrt().ceil() as usize).clamp(1, 64);
        let mut index = Self {
            bounds,
            cols: side,
            rows: side,
            cells: vec![Vec::new(); side * side],
        };
        for (i, obj) in objects.iter().enumerate() {
            if !obj.bbox.is_set() {
                continue;
            }
            let (c0, r0) = index.cell_of(obj.bbox.x_min, obj.bbox.y_min);
            let (c1, r1) = index.cell_of(obj.bbox.x_max, obj.bbox.y_max);
            for r in r0..=r1 {
                for c in c0..=c1 {
                    index.cells[r * index.cols + c].push(i as u32);
                }
            }
        }
        index
    }

    fn cell_of(&self, x: f64, y: f64) -> (usize, usize) {
        let cx = ((x - self.bounds.x_min) / self.bounds.width() * self.cols as f64)
            .floor()
            .clamp(0.0, (self.cols - 1) as f64) as usize;
        let cy = ((y - self.bounds.y_min) / self.bounds.height() * self.rows as f64)
            .floor()
            .clamp(0.0, (self.rows - 1) as f64) as usize;
        (cx, cy)
    }

    /// Candidate object indices overlapping `query`, deduplicated,
    /// ascending.
    fn candidates(&self, query: &Range) -> Vec<u32> {
        if self.cells.is_empty() || !query.is_set() {
            return Vec::new();
        }
        let (c0, r0) = self.cell_of(query.x_min, query.y_min);
        let (c1, r1) = self.cell_of(query.x_max, query.y_max);
        let mut out = Vec::new();
        for r in r0..=r1 {
            for c in c0..=c1 {
                out.extend_from_slice(&self.cells[r * self.cols + c]);
            }
        }
        out.sort_unstable();
        out.dedup();
        out
    }
}

#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: Vec<DrawableObject>,
    index: GridIndex,
}

impl ObjectStore {
    pub fn new(objects: Vec<DrawableObject>, range: &Range) -> Self {
        let index = GridIndex::build(&objects, range);
        Self { objects, index }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn objects(&self) -> &[DrawableObject] {
        &self.objects
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn get(&self, id: ObjectId) -> Option<&DrawableObject> {
        self.objects.iter().find(|o| o.id == id)
    }

    /// Objects within `tol` (data units) of the point, topmost first.
    /// "Topmost" is most recently emitted, i.e. highest store index. An id
    /// shared by several shapes (a line and its fill) is reported once, at
    /// its topmost position.
    pub fn objects_at(&self, x: f64, y: f64, tol: f64) -> Vec<ObjectId> {
        let query = Range::new(x - tol, x + tol, y - tol, y + tol);
        let mut hits: Vec<ObjectId> = Vec::new();
        for i in self.index.candidates(&query).into_iter().rev() {
            let obj = &self.objects[i as usize];
            if shape_hit(&obj.shape, x, y, tol) && !hits.contains(&obj.id) {
                hits.push(obj.id);
            }
        }
        hits
    }

    /// Objects whose bounding box matches the rectangle under the given
    /// containment mode, in store order.
    pub fn objects_in(&self, rect: &Range, mode: Containment) -> Vec<ObjectId> {
        self.index
            .candidates(rect)
            .into_iter()
            .map(|i| &self.objects[i as usize])
            .filter(|o| match mode {
                Containment::Full => rect.encloses(&o.bbox),
                Containment::Partial => rect.intersects(&o.bbox),
            })
            .map(|o| o.id)
            .collect()
    }

    /// Returns false when the id does not exist in this pass.
    pub fn set_selected(&mut self, id: ObjectId, selected: bool) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(obj) => {
                obj.selected = selected;
                true
            }
            None => false,
        }
    }

    pub fn set_hovered(&mut self, id: ObjectId, hovered: bool) -> bool {
        match self.objects.iter_mut().find(|o| o.id == id) {
            Some(obj) => {
                obj.hovered = hovered;
                true
            }
            None => false,
        }
    }

    pub fn clear_selection(&mut self) {
        for obj in &mut self.objects {
            obj.selected = false;
        }
    }

    pub fn selected(&self) -> Vec<ObjectId> {
        self.objects
            .iter()
            .filter(|o| o.selected)
            .map(|o| o.id)
            .collect()
    }
}

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding rectangle in data coordinates.
///
/// A `Range` starts unset and becomes set on the first finite point fed to
/// [`Range::extend`]. Once set, `x_min <= x_max` and `y_min <= y_max` hold.
/// The pipeline replaces the published range wholesale on each pass; readers
/// never observe a half-updated rectangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
    set: bool,
}

impl Range {
    pub const fn empty() -> Self {
        Self {
            x_min: 0.0,
            x_max: 0.0,
            y_min: 0.0,
            y_max: 0.0,
            set: false,
        }
    }

    pub fn new(x_min: f64, x_max: f64, y_min: f64, y_max: f64) -> Self {
        Self {
            x_min: x_min.min(x_max),
            x_max: x_min.max(x_max),
            y_min: y_min.min(y_max),
            y_max: y_min.max(y_max),
            set: true,
        }
    }

    pub fn is_set(&self) -> bool {
        self.set
    }

    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Grows the range to include (x, y). Non-finite coordinates are treated
    /// as missing and ignored.
    pub fn extend(&mut self, x: f64, y: f64) {
        if !x.is_finite() || !y.is_finite() {
            return;
        }
        if !self.set {
            *self = Self::new(x, x, y, y);
            return;
        }
        self.x_min = self.x_min.min(x);
        self.x_max = self.x_max.max(x);
        self.y_min = self.y_min.min(y);
        self.y_max = self.y_max.max(y);
    }

    /// Union with another range; an unset operand contributes nothing.
    pub fn union(&mut self, other: &Range) {
        if !other.set {
            return;
        }
        if !self.set {
            *self = *other;
            return;
        }
        self.x_min = self.x_min.min(other.x_min);
        self.x_max = self.x_max.max(other.x_max);
        self.y_min = self.y_min.min(other.y_min);
        self.y_max = self.y_max.max(other.y_max);
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        self.set && x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }

    pub fn intersects(&self, other: &Range) -> bool {
        self.set
            && other.set
            && self.x_min <= other.x_max
            && self.x_max >= other.x_min
            && self.y_min <= other.y_max
            && self.y_max >= other.y_min
    }

    /// True when `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Range) -> bool {
        self.set
            && other.set
            && other.x_min >= self.x_min
            && other.x_max <= self.x_max
            && other.y_min >= self.y_min
            && other.y_max <= self.y_max
    }

    /// Widens degenerate axes to a small non-zero span so downstream axis
    /// scaling never divides by zero. Non-degenerate axes are untouched.
    pub fn widened(mut self) -> Self {
        if !self.set {
            return self;
        }
        if self.width() == 0.0 {
            let pad = span_epsilon(self.x_min);
            self.x_min -= pad;
            self.x_max += pad;
        }
        if self.height() == 0.0 {
            let pad = span_epsilon(self.y_min);
            self.y_min -= pad;
            self.y_max += pad;
        }
        self
    }
}

fn span_epsilon(v: f64) -> f64 {
    if v == 0.0 {
        0.5
    } else {
        v.abs() * 1e-6
    }
}

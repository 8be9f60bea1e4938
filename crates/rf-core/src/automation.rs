//! Automation curve model
//!
//! Points, lanes and curve evaluation. A lane is the sole owner of its
//! points and keeps them ordered by time; every mutation goes through the
//! lane's primitives so the ordering invariant can never be bypassed.

use serde::{Deserialize, Deserializer, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

// ═══════════════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════════════

/// Tolerance used when matching points by time
pub const TIME_EPSILON: f64 = 0.001;

/// Whether two times address the same position on a lane
#[inline]
pub fn times_match(a: f64, b: f64) -> bool {
    (a - b).abs() < TIME_EPSILON
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTITY
// ═══════════════════════════════════════════════════════════════════════════════

/// Stable automation point identifier
///
/// Survives remove/re-add cycles: restoring a snapshot re-inserts the point
/// under the id it was captured with. Deserializing an id moves the
/// allocator past it, so points created after loading a saved lane never
/// reuse a loaded id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PointId(pub u64);

static NEXT_POINT_ID: AtomicU64 = AtomicU64::new(1);

impl PointId {
    /// Allocate a process-unique id
    pub fn next() -> Self {
        Self(NEXT_POINT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl<'de> Deserialize<'de> for PointId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = u64::deserialize(deserializer)?;
        NEXT_POINT_ID.fetch_max(raw.saturating_add(1), Ordering::Relaxed);
        Ok(Self(raw))
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CURVE SHAPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Interpolation rule from a point to the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[derive(Default)]
pub enum CurveType {
    #[default]
    Linear,
    Step,
    Exponential,
    Logarithmic,
    SCurve,
    Bezier,
}

impl CurveType {
    pub fn label(&self) -> &'static str {
        match self {
            CurveType::Linear => "Linear",
            CurveType::Step => "Step",
            CurveType::Exponential => "Exponential",
            CurveType::Logarithmic => "Logarithmic",
            CurveType::SCurve => "S-Curve",
            CurveType::Bezier => "Bezier",
        }
    }
}

/// Bezier control offsets in normalized segment space
///
/// The outgoing handle sits at `(1/3, 1/3) + (out_x, out_y)` and the incoming
/// handle at `(2/3, 2/3) + (in_x, in_y)`, so all-zero offsets trace a
/// straight line.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BezierHandles {
    pub out_x: f64,
    pub out_y: f64,
    pub in_x: f64,
    pub in_y: f64,
}

impl BezierHandles {
    pub fn new(out_x: f64, out_y: f64, in_x: f64, in_y: f64) -> Self {
        Self {
            out_x,
            out_y,
            in_x,
            in_y,
        }
    }
}

/// Inclusive time window
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    /// Create a range; the bounds are swapped if given in reverse
    pub fn new(start: f64, end: f64) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    #[inline]
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }

    #[inline]
    pub fn length(&self) -> f64 {
        self.end - self.start
    }

    /// Same window, compared with the time epsilon
    pub fn matches(&self, other: &TimeRange) -> bool {
        times_match(self.start, other.start) && times_match(self.end, other.end)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// POINT
// ═══════════════════════════════════════════════════════════════════════════════

/// Single automation point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AutomationPoint {
    pub id: PointId,
    /// Position in seconds or beats, depending on the lane's time base
    pub time: f64,
    pub value: f64,
    /// Curve to the next point
    pub curve: CurveType,
    /// Bend applied to linear segments (-1.0 to 1.0)
    pub tension: f64,
    pub bezier: BezierHandles,
    /// Locked points are skipped by bulk transforms
    pub locked: bool,
    pub label: Option<String>,
}

impl AutomationPoint {
    /// Create a linear point with a fresh id
    pub fn new(time: f64, value: f64) -> Self {
        Self {
            id: PointId::next(),
            time,
            value,
            curve: CurveType::Linear,
            tension: 0.0,
            bezier: BezierHandles::default(),
            locked: false,
            label: None,
        }
    }

    pub fn with_curve(time: f64, value: f64, curve: CurveType) -> Self {
        Self {
            curve,
            ..Self::new(time, value)
        }
    }

    pub fn tension(mut self, tension: f64) -> Self {
        self.tension = tension.clamp(-1.0, 1.0);
        self
    }

    pub fn bezier(mut self, handles: BezierHandles) -> Self {
        self.bezier = handles;
        self
    }

    pub fn locked(mut self, locked: bool) -> Self {
        self.locked = locked;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Copy of this point under a new id
    pub fn duplicate(&self) -> Self {
        Self {
            id: PointId::next(),
            ..self.clone()
        }
    }

    /// Shape fields equal, ignoring identity and position
    pub fn same_shape(&self, other: &AutomationPoint) -> bool {
        self.curve == other.curve
            && self.tension == other.tension
            && self.bezier == other.bezier
            && self.locked == other.locked
            && self.label == other.label
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// LANE
// ═══════════════════════════════════════════════════════════════════════════════

/// Automation lane for a single parameter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationLane {
    pub name: String,
    points: Vec<AutomationPoint>,
    min_value: f64,
    max_value: f64,
    pub enabled: bool,
}

impl AutomationLane {
    /// Create an empty lane with value bounds
    pub fn new(min_value: f64, max_value: f64) -> Self {
        let (min_value, max_value) = if min_value <= max_value {
            (min_value, max_value)
        } else {
            (max_value, min_value)
        };
        Self {
            name: String::new(),
            points: Vec::new(),
            min_value,
            max_value,
            enabled: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[inline]
    pub fn min_value(&self) -> f64 {
        self.min_value
    }

    #[inline]
    pub fn max_value(&self) -> f64 {
        self.max_value
    }

    /// Clamp a value to the lane bounds
    #[inline]
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_value, self.max_value)
    }

    /// Points in time order
    pub fn points(&self) -> &[AutomationPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Add a point, keeping time order
    ///
    /// The value is clamped to the lane bounds. Points at an equal time are
    /// placed after the existing ones. If a point with the same id is already
    /// present it is replaced.
    pub fn add_point(&mut self, mut point: AutomationPoint) -> PointId {
        if let Some(idx) = self.index_of(point.id) {
            log::warn!("Replacing automation point {:?} already on lane", point.id);
            self.points.remove(idx);
        }

        point.value = self.clamp(point.value);
        let id = point.id;
        let idx = self.points.partition_point(|p| p.time <= point.time);
        self.points.insert(idx, point);
        id
    }

    /// Remove a point by id
    pub fn remove_point(&mut self, id: PointId) -> Option<AutomationPoint> {
        self.index_of(id).map(|idx| self.points.remove(idx))
    }

    /// Remove the first point whose time matches within the epsilon
    pub fn remove_point_at(&mut self, time: f64) -> Option<AutomationPoint> {
        self.points
            .iter()
            .position(|p| times_match(p.time, time))
            .map(|idx| self.points.remove(idx))
    }

    /// Remove every point, returning them in time order
    pub fn clear(&mut self) -> Vec<AutomationPoint> {
        std::mem::take(&mut self.points)
    }

    /// Replace the whole curve
    pub fn replace_points(&mut self, points: impl IntoIterator<Item = AutomationPoint>) {
        self.points.clear();
        for point in points {
            self.add_point(point);
        }
    }

    pub fn point(&self, id: PointId) -> Option<&AutomationPoint> {
        self.points.iter().find(|p| p.id == id)
    }

    pub fn contains(&self, id: PointId) -> bool {
        self.index_of(id).is_some()
    }

    /// First point at `time` (epsilon match)
    pub fn find_at(&self, time: f64) -> Option<&AutomationPoint> {
        self.points.iter().find(|p| times_match(p.time, time))
    }

    /// Set a point's value in place (clamped). Returns false if the point is gone.
    pub fn set_value(&mut self, id: PointId, value: f64) -> bool {
        let value = self.clamp(value);
        match self.points.iter_mut().find(|p| p.id == id) {
            Some(point) => {
                point.value = value;
                true
            }
            None => false,
        }
    }

    /// Move a point in time, re-inserting it so order is preserved
    pub fn set_time(&mut self, id: PointId, time: f64) -> bool {
        match self.remove_point(id) {
            Some(mut point) => {
                point.time = time;
                self.add_point(point);
                true
            }
            None => false,
        }
    }

    /// Points inside an inclusive window
    pub fn points_in_range(&self, range: TimeRange) -> impl Iterator<Item = &AutomationPoint> {
        self.points.iter().filter(move |p| range.contains(p.time))
    }

    /// Evaluate the curve at a time
    ///
    /// Holds the first value before the first point and the last value after
    /// the last point. Returns `None` for an empty lane or a NaN time.
    pub fn value_at(&self, time: f64) -> Option<f64> {
        if time.is_nan() {
            return None;
        }
        let first = self.points.first()?;
        if time <= first.time {
            return Some(first.value);
        }

        let idx = self.points.partition_point(|p| p.time <= time);
        if idx >= self.points.len() {
            return self.points.last().map(|p| p.value);
        }

        let p1 = &self.points[idx - 1];
        let p2 = &self.points[idx];
        let span = p2.time - p1.time;
        let t = if span > 0.0 {
            (time - p1.time) / span
        } else {
            1.0
        };

        Some(self.clamp(interpolate(p1, p2.value, t)))
    }

    fn index_of(&self, id: PointId) -> Option<usize> {
        self.points.iter().position(|p| p.id == id)
    }
}

impl Default for AutomationLane {
    fn default() -> Self {
        Self::new(0.0, 1.0)
    }
}

/// Interpolate from `from` towards `to` at normalized position `t`
fn interpolate(from: &AutomationPoint, to: f64, t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    let v1 = from.value;

    let shaped = match from.curve {
        CurveType::Linear => apply_tension(t, from.tension),
        CurveType::Step => {
            if t < 1.0 {
                0.0
            } else {
                1.0
            }
        }
        CurveType::Exponential => t * t,
        CurveType::Logarithmic => t.sqrt(),
        CurveType::SCurve => t * t * (3.0 - 2.0 * t),
        CurveType::Bezier => bezier_ease(t, &from.bezier),
    };

    v1 + (to - v1) * shaped
}

fn apply_tension(t: f64, tension: f64) -> f64 {
    if tension.abs() < 1e-9 {
        return t;
    }
    let exponent = 1.0 + tension.abs() * 3.0;
    if tension > 0.0 {
        t.powf(exponent)
    } else {
        1.0 - (1.0 - t).powf(exponent)
    }
}

/// Cubic bezier easing from (0,0) to (1,1), solved for x by bisection
fn bezier_ease(t: f64, handles: &BezierHandles) -> f64 {
    let x1 = (1.0 / 3.0 + handles.out_x).clamp(0.0, 1.0);
    let y1 = 1.0 / 3.0 + handles.out_y;
    let x2 = (2.0 / 3.0 + handles.in_x).clamp(0.0, 1.0);
    let y2 = 2.0 / 3.0 + handles.in_y;

    let cubic = |s: f64, c1: f64, c2: f64| {
        let ms = 1.0 - s;
        3.0 * ms * ms * s * c1 + 3.0 * ms * s * s * c2 + s * s * s
    };

    let (mut lo, mut hi) = (0.0, 1.0);
    for _ in 0..32 {
        let mid = 0.5 * (lo + hi);
        if cubic(mid, x1, x2) < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }

    cubic(0.5 * (lo + hi), y1, y2)
}

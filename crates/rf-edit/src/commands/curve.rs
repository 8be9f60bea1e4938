//! Automation curve commands

use std::sync::Arc;

use rf_core::{
    AutomationLane, AutomationPoint, CurveType, PointId, RfError, RfResult, TIME_EPSILON,
    TimeRange, ensure_finite, times_match,
};

use super::Shared;
use crate::clipboard::{ClipboardPoint, EditContext, SharedClipboard};
use crate::simplify::simplify_points;
use crate::undo::{Command, MergePolicy};

pub type SharedLane = Shared<AutomationLane>;

fn point_not_found(id: PointId) -> RfError {
    RfError::PointNotFound(format!("id {}", id.0))
}

fn plural(count: usize, one: &str, many: &str) -> String {
    if count == 1 {
        one.to_string()
    } else {
        format!("{count} {many}")
    }
}

/// Points a bulk transform applies to
#[derive(Debug, Clone, PartialEq)]
pub enum PointSelection {
    /// Every point on the lane
    All,
    /// Points inside an inclusive time window
    Range(TimeRange),
    /// Explicit points
    Ids(Vec<PointId>),
}

impl PointSelection {
    fn includes(&self, point: &AutomationPoint) -> bool {
        match self {
            PointSelection::All => true,
            PointSelection::Range(range) => range.contains(point.time),
            PointSelection::Ids(ids) => ids.contains(&point.id),
        }
    }

    fn same_window(&self, other: &PointSelection) -> bool {
        match (self, other) {
            (PointSelection::All, PointSelection::All) => true,
            (PointSelection::Range(a), PointSelection::Range(b)) => a.matches(b),
            (PointSelection::Ids(a), PointSelection::Ids(b)) => a == b,
            _ => false,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// ADD / DELETE
// ═══════════════════════════════════════════════════════════════════════════════

/// Add an automation point
#[derive(Debug)]
pub struct AddPoint {
    lane: SharedLane,
    point: AutomationPoint,
}

impl AddPoint {
    pub fn new(lane: SharedLane, point: AutomationPoint) -> RfResult<Self> {
        ensure_finite("time", point.time)?;
        ensure_finite("value", point.value)?;
        if point.time < 0.0 {
            return Err(RfError::InvalidParam(format!(
                "point time must not be negative, got {}",
                point.time
            )));
        }
        if lane.read().contains(point.id) {
            return Err(RfError::InvalidParam(format!(
                "point {} is already on the lane",
                point.id.0
            )));
        }
        Ok(Self { lane, point })
    }

    /// Id the point lives under once executed
    pub fn point_id(&self) -> PointId {
        self.point.id
    }
}

impl Command for AddPoint {
    fn execute(&mut self) {
        self.lane.write().add_point(self.point.clone());
    }

    fn undo(&mut self) {
        if self.lane.write().remove_point(self.point.id).is_none() {
            log::warn!("Add point undo: point {:?} no longer on lane", self.point.id);
        }
    }

    fn description(&self) -> String {
        "Add Automation Point".to_string()
    }
}

/// Delete one or more automation points
#[derive(Debug)]
pub struct DeletePoints {
    lane: SharedLane,
    /// Full snapshots in lane order
    removed: Vec<AutomationPoint>,
}

impl DeletePoints {
    pub fn new(lane: SharedLane, ids: &[PointId]) -> RfResult<Self> {
        if ids.is_empty() {
            return Err(RfError::EmptySelection("automation points"));
        }

        let removed = {
            let l = lane.read();
            if let Some(missing) = ids.iter().find(|id| !l.contains(**id)) {
                return Err(point_not_found(*missing));
            }
            l.points()
                .iter()
                .filter(|p| ids.contains(&p.id))
                .cloned()
                .collect()
        };

        Ok(Self { lane, removed })
    }

    /// Delete the point at `time` (epsilon match)
    pub fn at_time(lane: SharedLane, time: f64) -> RfResult<Self> {
        let id = lane
            .read()
            .find_at(time)
            .map(|p| p.id)
            .ok_or_else(|| RfError::PointNotFound(format!("time {time}")))?;
        Self::new(lane, &[id])
    }
}

impl Command for DeletePoints {
    fn execute(&mut self) {
        let mut lane = self.lane.write();
        for point in self.removed.iter().rev() {
            if lane.remove_point(point.id).is_none() {
                log::warn!("Delete points: point {:?} already gone", point.id);
            }
        }
    }

    fn undo(&mut self) {
        let mut lane = self.lane.write();
        for point in &self.removed {
            lane.add_point(point.clone());
        }
    }

    fn description(&self) -> String {
        format!(
            "Delete {}",
            plural(self.removed.len(), "Automation Point", "Automation Points")
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// MOVE / RETYPE
// ═══════════════════════════════════════════════════════════════════════════════

/// Where a point sits and how it bends
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointPosition {
    pub time: f64,
    pub value: f64,
    pub curve: CurveType,
}

/// Move a point to a new time/value
///
/// Applied as remove + re-add so the lane re-establishes time order.
#[derive(Debug)]
pub struct MovePoint {
    lane: SharedLane,
    id: PointId,
    from: PointPosition,
    to: PointPosition,
}

impl MovePoint {
    pub fn new(lane: SharedLane, id: PointId, time: f64, value: f64) -> RfResult<Self> {
        ensure_finite("time", time)?;
        ensure_finite("value", value)?;

        let (from, to) = {
            let l = lane.read();
            let point = l.point(id).ok_or_else(|| point_not_found(id))?;
            let from = PointPosition {
                time: point.time,
                value: point.value,
                curve: point.curve,
            };
            let to = PointPosition {
                time: time.max(0.0),
                value: l.clamp(value),
                curve: point.curve,
            };
            (from, to)
        };

        Ok(Self { lane, id, from, to })
    }

    /// Move the point currently at `old_time` (epsilon match)
    pub fn at_time(lane: SharedLane, old_time: f64, time: f64, value: f64) -> RfResult<Self> {
        let id = lane
            .read()
            .find_at(old_time)
            .map(|p| p.id)
            .ok_or_else(|| RfError::PointNotFound(format!("time {old_time}")))?;
        Self::new(lane, id, time, value)
    }

    pub fn point_id(&self) -> PointId {
        self.id
    }

    /// Position before the move
    pub fn origin(&self) -> PointPosition {
        self.from
    }

    /// Position after the move
    pub fn target(&self) -> PointPosition {
        self.to
    }

    fn apply(&self, target: PointPosition) {
        let mut lane = self.lane.write();
        match lane.remove_point(self.id) {
            Some(mut point) => {
                point.time = target.time;
                point.value = target.value;
                point.curve = target.curve;
                lane.add_point(point);
            }
            None => log::warn!("Move point: point {:?} no longer on lane", self.id),
        }
    }
}

impl Command for MovePoint {
    fn execute(&mut self) {
        self.apply(self.to);
    }

    fn undo(&mut self) {
        self.apply(self.from);
    }

    fn description(&self) -> String {
        "Move Automation Point".to_string()
    }

    fn can_merge_with(&self, other: &Self, _policy: &MergePolicy) -> bool {
        Arc::ptr_eq(&self.lane, &other.lane)
            && self.id == other.id
            && times_match(self.to.time, other.from.time)
    }

    fn merge(&mut self, other: Self) {
        self.to = other.to;
    }
}

/// Change the interpolation of one point
#[derive(Debug)]
pub struct SetCurveType {
    lane: SharedLane,
    id: PointId,
    old_curve: CurveType,
    new_curve: CurveType,
}

impl SetCurveType {
    pub fn new(lane: SharedLane, id: PointId, curve: CurveType) -> RfResult<Self> {
        let old_curve = lane
            .read()
            .point(id)
            .map(|p| p.curve)
            .ok_or_else(|| point_not_found(id))?;
        Ok(Self {
            lane,
            id,
            old_curve,
            new_curve: curve,
        })
    }

    fn apply(&self, curve: CurveType) {
        let mut lane = self.lane.write();
        match lane.remove_point(self.id) {
            Some(mut point) => {
                point.curve = curve;
                lane.add_point(point);
            }
            None => log::warn!("Set curve type: point {:?} no longer on lane", self.id),
        }
    }
}

impl Command for SetCurveType {
    fn execute(&mut self) {
        self.apply(self.new_curve);
    }

    fn undo(&mut self) {
        self.apply(self.old_curve);
    }

    fn description(&self) -> String {
        format!("Set Curve to {}", self.new_curve.label())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// CLEAR
// ═══════════════════════════════════════════════════════════════════════════════

/// Remove every point from a lane
#[derive(Debug)]
pub struct ClearPoints {
    lane: SharedLane,
    cleared: Vec<AutomationPoint>,
}

impl ClearPoints {
    pub fn new(lane: SharedLane) -> Self {
        let cleared = lane.read().points().to_vec();
        Self { lane, cleared }
    }
}

impl Command for ClearPoints {
    fn execute(&mut self) {
        // Re-snapshot: the lane may have changed between construction and redo
        self.cleared = self.lane.write().clear();
    }

    fn undo(&mut self) {
        let mut lane = self.lane.write();
        for point in &self.cleared {
            lane.add_point(point.clone());
        }
    }

    fn description(&self) -> String {
        "Clear Automation".to_string()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// COPY / PASTE
// ═══════════════════════════════════════════════════════════════════════════════

/// Copy points into the clipboard
///
/// Reading is not undoable: `undo` does nothing.
#[derive(Debug)]
pub struct CopyPoints {
    lane: SharedLane,
    clipboard: SharedClipboard,
    selection: PointSelection,
    copied: usize,
}

impl CopyPoints {
    pub fn new(ctx: &EditContext, lane: SharedLane, selection: PointSelection) -> Self {
        Self {
            lane,
            clipboard: Arc::clone(&ctx.clipboard),
            selection,
            copied: 0,
        }
    }

    /// Points copied by the last execution
    pub fn copied(&self) -> usize {
        self.copied
    }
}

impl Command for CopyPoints {
    fn execute(&mut self) {
        let selected: Vec<AutomationPoint> = self
            .lane
            .read()
            .points()
            .iter()
            .filter(|p| self.selection.includes(p))
            .cloned()
            .collect();

        self.copied = selected.len();
        if selected.is_empty() {
            log::debug!("Copy points: nothing selected, clipboard left as is");
            return;
        }
        self.clipboard.write().store(&selected);
    }

    fn undo(&mut self) {}

    fn description(&self) -> String {
        "Copy Automation Points".to_string()
    }
}

/// Paste clipboard contents at a time
#[derive(Debug)]
pub struct PastePoints {
    lane: SharedLane,
    paste_time: f64,
    span: f64,
    replace_existing: bool,
    pasted: Vec<AutomationPoint>,
    replaced: Vec<AutomationPoint>,
}

impl PastePoints {
    /// Snapshot the clipboard and prepare the pasted points
    ///
    /// With `replace_existing`, points already inside the target window
    /// (widened by `TIME_EPSILON` on both ends) are removed first and restored
    /// on undo.
    pub fn new(
        ctx: &EditContext,
        lane: SharedLane,
        paste_time: f64,
        replace_existing: bool,
    ) -> RfResult<Self> {
        ensure_finite("paste time", paste_time)?;
        if paste_time < 0.0 {
            return Err(RfError::InvalidParam(format!(
                "paste time must not be negative, got {paste_time}"
            )));
        }

        let clipboard = ctx.clipboard.read();
        if clipboard.is_empty() {
            return Err(RfError::EmptyClipboard);
        }
        let pasted = clipboard
            .points()
            .iter()
            .map(|p: &ClipboardPoint| p.to_point(paste_time))
            .collect();
        let span = clipboard.span();
        drop(clipboard);

        Ok(Self {
            lane,
            paste_time,
            span,
            replace_existing,
            pasted,
            replaced: Vec::new(),
        })
    }

    pub fn pasted_ids(&self) -> Vec<PointId> {
        self.pasted.iter().map(|p| p.id).collect()
    }

    /// Target window covered by the paste
    pub fn target_range(&self) -> TimeRange {
        TimeRange::new(self.paste_time, self.paste_time + self.span)
    }

    /// Window cleared before pasting; points within `TIME_EPSILON` of either
    /// edge sit at the same position as a pasted one
    fn replace_range(&self) -> TimeRange {
        let target = self.target_range();
        TimeRange::new(target.start - TIME_EPSILON, target.end + TIME_EPSILON)
    }
}

impl Command for PastePoints {
    fn execute(&mut self) {
        let mut lane = self.lane.write();

        self.replaced.clear();
        if self.replace_existing {
            let range = self.replace_range();
            self.replaced = lane.points_in_range(range).cloned().collect();
            for point in self.replaced.iter().rev() {
                lane.remove_point(point.id);
            }
        }

        for point in &self.pasted {
            lane.add_point(point.clone());
        }
    }

    fn undo(&mut self) {
        let mut lane = self.lane.write();
        for point in self.pasted.iter().rev() {
            if lane.remove_point(point.id).is_none() {
                log::warn!("Paste undo: pasted point {:?} already gone", point.id);
            }
        }
        for point in &self.replaced {
            lane.add_point(point.clone());
        }
    }

    fn description(&self) -> String {
        format!(
            "Paste {}",
            plural(self.pasted.len(), "Automation Point", "Automation Points")
        )
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCALE / SHIFT
// ═══════════════════════════════════════════════════════════════════════════════

/// Unlocked selected points as `(id, field)` pairs
fn capture(
    lane: &AutomationLane,
    selection: &PointSelection,
    field: impl Fn(&AutomationPoint) -> f64,
) -> Vec<(PointId, f64)> {
    lane.points()
        .iter()
        .filter(|p| !p.locked && selection.includes(p))
        .map(|p| (p.id, field(p)))
        .collect()
}

/// Compress or expand values around a pivot
///
/// Undo writes back the captured values rather than inverting the formula,
/// since clamping at the lane bounds is not reversible.
#[derive(Debug)]
pub struct ScalePoints {
    lane: SharedLane,
    factor: f64,
    pivot: f64,
    before: Vec<(PointId, f64)>,
    after: Vec<(PointId, f64)>,
}

impl ScalePoints {
    pub fn new(
        lane: SharedLane,
        factor: f64,
        pivot: f64,
        selection: PointSelection,
    ) -> RfResult<Self> {
        ensure_finite("scale factor", factor)?;
        ensure_finite("pivot", pivot)?;

        let (before, after) = {
            let l = lane.read();
            let before = capture(&l, &selection, |p| p.value);
            let after = before
                .iter()
                .map(|&(id, v)| (id, l.clamp(pivot + (v - pivot) * factor)))
                .collect();
            (before, after)
        };

        if before.is_empty() {
            return Err(RfError::EmptySelection("unlocked automation points"));
        }

        Ok(Self {
            lane,
            factor,
            pivot,
            before,
            after,
        })
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn pivot(&self) -> f64 {
        self.pivot
    }

    fn apply(&self, values: &[(PointId, f64)]) {
        let mut lane = self.lane.write();
        for &(id, value) in values {
            if !lane.set_value(id, value) {
                log::warn!("Scale points: point {:?} no longer on lane", id);
            }
        }
    }
}

impl Command for ScalePoints {
    fn execute(&mut self) {
        self.apply(&self.after);
    }

    fn undo(&mut self) {
        self.apply(&self.before);
    }

    fn description(&self) -> String {
        "Scale Automation".to_string()
    }
}

/// Translate points in time, clamped at zero
#[derive(Debug)]
pub struct ShiftPoints {
    lane: SharedLane,
    offset: f64,
    selection: PointSelection,
    before: Vec<(PointId, f64)>,
    after: Vec<(PointId, f64)>,
}

impl ShiftPoints {
    pub fn new(lane: SharedLane, offset: f64, selection: PointSelection) -> RfResult<Self> {
        ensure_finite("offset", offset)?;

        let before = capture(&lane.read(), &selection, |p| p.time);
        if before.is_empty() {
            return Err(RfError::EmptySelection("unlocked automation points"));
        }
        let after = before
            .iter()
            .map(|&(id, t)| (id, (t + offset).max(0.0)))
            .collect();

        Ok(Self {
            lane,
            offset,
            selection,
            before,
            after,
        })
    }

    /// Total offset, including merged shifts
    pub fn offset(&self) -> f64 {
        self.offset
    }

    fn apply(&self, times: &[(PointId, f64)]) {
        let mut lane = self.lane.write();
        for &(id, time) in times {
            if !lane.set_time(id, time) {
                log::warn!("Shift points: point {:?} no longer on lane", id);
            }
        }
    }
}

impl Command for ShiftPoints {
    fn execute(&mut self) {
        self.apply(&self.after);
    }

    fn undo(&mut self) {
        self.apply(&self.before);
    }

    fn description(&self) -> String {
        "Shift Automation".to_string()
    }

    fn can_merge_with(&self, other: &Self, _policy: &MergePolicy) -> bool {
        Arc::ptr_eq(&self.lane, &other.lane) && self.selection.same_window(&other.selection)
    }

    fn merge(&mut self, other: Self) {
        // Earliest known pre-state per point, latest post-state per point
        for (id, time) in other.before {
            if !self.before.iter().any(|(b, _)| *b == id) {
                self.before.push((id, time));
            }
        }
        let mut after = other.after;
        for (id, time) in self.after.drain(..) {
            if !after.iter().any(|(a, _)| *a == id) {
                after.push((id, time));
            }
        }
        self.after = after;
        self.offset += other.offset;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SIMPLIFY
// ═══════════════════════════════════════════════════════════════════════════════

/// Thin a lane with Ramer–Douglas–Peucker
///
/// The reduction runs once, on first execution, and is reused on redo.
#[derive(Debug)]
pub struct SimplifyCurve {
    lane: SharedLane,
    threshold: f64,
    original: Vec<AutomationPoint>,
    reduced: Option<Vec<AutomationPoint>>,
}

impl SimplifyCurve {
    pub fn new(lane: SharedLane, threshold: f64) -> RfResult<Self> {
        ensure_finite("threshold", threshold)?;
        let original = lane.read().points().to_vec();
        Ok(Self {
            lane,
            threshold: threshold.max(crate::simplify::MIN_THRESHOLD),
            original,
            reduced: None,
        })
    }

    /// Thin with a tolerance floored by the context's configured minimum
    pub fn in_context(ctx: &EditContext, lane: SharedLane, threshold: f64) -> RfResult<Self> {
        ensure_finite("threshold", threshold)?;
        Self::new(lane, ctx.config.simplify.effective_threshold(threshold))
    }

    /// Thin with the context's default tolerance
    pub fn with_defaults(ctx: &EditContext, lane: SharedLane) -> RfResult<Self> {
        Self::in_context(ctx, lane, ctx.config.simplify.default_threshold)
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Points removed, once the reduction has run
    pub fn removed_count(&self) -> Option<usize> {
        self.reduced
            .as_ref()
            .map(|reduced| self.original.len() - reduced.len())
    }
}

impl Command for SimplifyCurve {
    fn execute(&mut self) {
        let original = &self.original;
        let threshold = self.threshold;
        let reduced = self.reduced.get_or_insert_with(|| {
            let reduced = simplify_points(original, threshold);
            log::trace!(
                "Simplified lane from {} to {} points (threshold {})",
                original.len(),
                reduced.len(),
                threshold
            );
            reduced
        });
        self.lane.write().replace_points(reduced.iter().cloned());
    }

    fn undo(&mut self) {
        self.lane
            .write()
            .replace_points(self.original.iter().cloned());
    }

    fn description(&self) -> String {
        "Simplify Automation".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorConfig;
    use crate::commands::shared;
    use crate::simplify::MIN_THRESHOLD;
    use approx::assert_abs_diff_eq;
    use rf_core::BezierHandles;

    fn lane(points: &[(f64, f64)]) -> SharedLane {
        let mut lane = AutomationLane::new(-1.0, 1.0);
        for &(t, v) in points {
            lane.add_point(AutomationPoint::new(t, v));
        }
        shared(lane)
    }

    fn ids(lane: &SharedLane) -> Vec<PointId> {
        lane.read().points().iter().map(|p| p.id).collect()
    }

    fn snapshot(lane: &SharedLane) -> Vec<AutomationPoint> {
        lane.read().points().to_vec()
    }

    fn policy() -> MergePolicy {
        MergePolicy::default()
    }

    #[test]
    fn test_add_point_undo() {
        let lane = lane(&[(0.0, 0.0)]);
        let mut cmd = AddPoint::new(lane.clone(), AutomationPoint::new(1.0, 0.5)).unwrap();
        cmd.execute();
        assert!(lane.read().contains(cmd.point_id()));
        cmd.undo();
        assert_eq!(lane.read().len(), 1);
    }

    #[test]
    fn test_add_point_rejects_bad_input() {
        let lane = lane(&[]);
        assert!(AddPoint::new(lane.clone(), AutomationPoint::new(f64::NAN, 0.0)).is_err());
        assert!(AddPoint::new(lane, AutomationPoint::new(-1.0, 0.0)).is_err());
    }

    #[test]
    fn test_add_point_rejects_id_on_lane() {
        let lane = lane(&[(0.0, 0.1), (1.0, 0.9)]);
        let existing = lane.read().points()[1].clone();
        let before = snapshot(&lane);

        let duplicate = AutomationPoint { time: 3.0, ..existing };
        assert!(matches!(
            AddPoint::new(lane.clone(), duplicate),
            Err(RfError::InvalidParam(_))
        ));
        assert_eq!(snapshot(&lane), before);
    }

    #[test]
    fn test_delete_batch_restores_everything() {
        let lane = lane(&[(0.0, 0.1), (1.0, 0.2), (2.0, 0.3)]);
        lane.write().add_point(
            AutomationPoint::with_curve(3.0, 0.4, CurveType::Bezier)
                .bezier(BezierHandles::new(0.1, 0.0, 0.0, -0.1))
                .label("hit"),
        );
        let before = snapshot(&lane);
        let all = ids(&lane);

        let mut cmd = DeletePoints::new(lane.clone(), &[all[3], all[0], all[2]]).unwrap();
        assert_eq!(cmd.description(), "Delete 3 Automation Points");
        cmd.execute();
        assert_eq!(ids(&lane), vec![all[1]]);
        cmd.undo();
        assert_eq!(snapshot(&lane), before);
    }

    #[test]
    fn test_delete_validation() {
        let lane = lane(&[(0.0, 0.1)]);
        assert!(matches!(
            DeletePoints::new(lane.clone(), &[]),
            Err(RfError::EmptySelection(_))
        ));
        assert!(matches!(
            DeletePoints::new(lane.clone(), &[PointId(u64::MAX)]),
            Err(RfError::PointNotFound(_))
        ));
        assert!(DeletePoints::at_time(lane, 0.0005).is_ok());
    }

    #[test]
    fn test_move_point_reorders_and_restores() {
        let lane = lane(&[(0.0, 0.1), (1.0, 0.2), (2.0, 0.3)]);
        let before = snapshot(&lane);
        let first = ids(&lane)[0];

        let mut cmd = MovePoint::new(lane.clone(), first, 5.0, 0.9).unwrap();
        cmd.execute();
        let last = lane.read().points().last().cloned().unwrap();
        assert_eq!(last.id, first);
        assert_eq!((last.time, last.value), (5.0, 0.9));

        cmd.undo();
        assert_eq!(snapshot(&lane), before);
    }

    #[test]
    fn test_move_clamps_target() {
        let lane = lane(&[(1.0, 0.0)]);
        let cmd = MovePoint::at_time(lane, 1.0, -2.0, 4.0).unwrap();
        assert_eq!(cmd.target().time, 0.0);
        assert_eq!(cmd.target().value, 1.0);
    }

    #[test]
    fn test_move_merge_spans_gesture() {
        let lane = lane(&[(0.0, 0.3)]);
        let id = ids(&lane)[0];

        let mut first = MovePoint::new(lane.clone(), id, 0.2, 0.5).unwrap();
        first.execute();
        let mut second = MovePoint::new(lane.clone(), id, 0.2, 0.9).unwrap();
        second.execute();

        assert!(first.can_merge_with(&second, &policy()));
        first.merge(second);
        first.undo();

        let p = lane.read().point(id).cloned().unwrap();
        assert_abs_diff_eq!(p.time, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(p.value, 0.3, epsilon = 1e-9);
    }

    #[test]
    fn test_move_merge_requires_same_point() {
        let lane = lane(&[(0.0, 0.3), (1.0, 0.3)]);
        let all = ids(&lane);
        let a = MovePoint::new(lane.clone(), all[0], 0.5, 0.5).unwrap();
        let b = MovePoint::new(lane.clone(), all[1], 0.5, 0.5).unwrap();
        assert!(!a.can_merge_with(&b, &policy()));

        let other_lane = self::lane(&[(0.0, 0.3)]);
        let c = MovePoint::new(other_lane.clone(), ids(&other_lane)[0], 0.5, 0.5).unwrap();
        assert!(!a.can_merge_with(&c, &policy()));
    }

    #[test]
    fn test_stale_move_is_noop() {
        let lane = lane(&[(0.0, 0.3), (1.0, 0.5)]);
        let id = ids(&lane)[0];
        let mut cmd = MovePoint::new(lane.clone(), id, 2.0, 0.0).unwrap();
        lane.write().remove_point(id);
        let before = snapshot(&lane);
        cmd.execute();
        cmd.undo();
        assert_eq!(snapshot(&lane), before);
    }

    #[test]
    fn test_set_curve_type() {
        let lane = lane(&[(0.0, 0.0), (1.0, 1.0)]);
        let id = ids(&lane)[0];
        let mut cmd = SetCurveType::new(lane.clone(), id, CurveType::Step).unwrap();
        cmd.execute();
        assert_eq!(lane.read().point(id).unwrap().curve, CurveType::Step);
        assert_eq!(cmd.description(), "Set Curve to Step");
        cmd.undo();
        assert_eq!(lane.read().point(id).unwrap().curve, CurveType::Linear);
    }

    #[test]
    fn test_clear_and_restore() {
        let lane = lane(&[(0.0, 0.1), (1.0, 0.2), (2.0, 0.3)]);
        let before = snapshot(&lane);
        let mut cmd = ClearPoints::new(lane.clone());
        cmd.execute();
        assert!(lane.read().is_empty());
        cmd.undo();
        assert_eq!(snapshot(&lane), before);
    }

    #[test]
    fn test_copy_range_and_paste_replacing() {
        let ctx = EditContext::default();
        let lane = lane(&[(0.0, 0.0), (1.0, 0.5), (1.5, 0.6), (4.0, -0.5), (4.2, -0.4)]);
        let before = snapshot(&lane);

        let mut copy = CopyPoints::new(
            &ctx,
            lane.clone(),
            PointSelection::Range(TimeRange::new(1.0, 1.5)),
        );
        copy.execute();
        assert_eq!(copy.copied(), 2);
        copy.undo();
        assert_eq!(ctx.clipboard.read().len(), 2);

        let mut paste = PastePoints::new(&ctx, lane.clone(), 4.0, true).unwrap();
        paste.execute();
        let times: Vec<f64> = lane.read().points().iter().map(|p| p.time).collect();
        assert_eq!(times, vec![0.0, 1.0, 1.5, 4.0, 4.5]);

        paste.undo();
        assert_eq!(snapshot(&lane), before);
    }

    #[test]
    fn test_paste_replaces_points_within_epsilon() {
        let ctx = EditContext::default();
        let lane = lane(&[(0.0, 0.1), (2.0, 0.3), (2.0005, 0.7), (2.01, 0.9)]);
        let before = snapshot(&lane);

        let mut copy = CopyPoints::new(&ctx, lane.clone(), PointSelection::Ids(vec![before[0].id]));
        copy.execute();
        assert_eq!(ctx.clipboard.read().span(), 0.0);

        let mut paste = PastePoints::new(&ctx, lane.clone(), 2.0, true).unwrap();
        paste.execute();
        let points: Vec<(f64, f64)> =
            lane.read().points().iter().map(|p| (p.time, p.value)).collect();
        assert_eq!(points, vec![(0.0, 0.1), (2.0, 0.1), (2.01, 0.9)]);

        paste.undo();
        assert_eq!(snapshot(&lane), before);
    }

    #[test]
    fn test_paste_empty_clipboard_fails() {
        let ctx = EditContext::default();
        let lane = lane(&[]);
        assert!(matches!(
            PastePoints::new(&ctx, lane, 0.0, false),
            Err(RfError::EmptyClipboard)
        ));
    }

    #[test]
    fn test_scale_skips_locked_points() {
        let lane = lane(&[(0.0, 0.2)]);
        let locked = lane
            .write()
            .add_point(AutomationPoint::new(1.0, 0.4).locked(true));

        let mut cmd = ScalePoints::new(lane.clone(), 2.0, 0.0, PointSelection::All).unwrap();
        cmd.execute();
        assert_eq!(lane.read().point(locked).unwrap().value, 0.4);
        assert_abs_diff_eq!(lane.read().points()[0].value, 0.4, epsilon = 1e-12);
    }

    #[test]
    fn test_scale_empty_selection_fails() {
        let lane = lane(&[(0.0, 0.2)]);
        let range = PointSelection::Range(TimeRange::new(5.0, 6.0));
        assert!(ScalePoints::new(lane, 2.0, 0.0, range).is_err());
    }

    #[test]
    fn test_shift_merge_sums_offsets() {
        let lane = lane(&[(1.0, 0.0), (2.0, 0.0)]);
        let before = snapshot(&lane);

        let mut first = ShiftPoints::new(lane.clone(), 0.5, PointSelection::All).unwrap();
        first.execute();
        let mut second = ShiftPoints::new(lane.clone(), 0.25, PointSelection::All).unwrap();
        second.execute();

        assert!(first.can_merge_with(&second, &policy()));
        first.merge(second);
        assert_abs_diff_eq!(first.offset(), 0.75, epsilon = 1e-12);

        first.undo();
        assert_eq!(snapshot(&lane), before);
        first.execute();
        let times: Vec<f64> = lane.read().points().iter().map(|p| p.time).collect();
        assert_eq!(times, vec![1.75, 2.75]);
    }

    #[test]
    fn test_shift_merge_requires_same_window() {
        let lane = lane(&[(1.0, 0.0), (2.0, 0.0)]);
        let a = ShiftPoints::new(
            lane.clone(),
            0.5,
            PointSelection::Range(TimeRange::new(0.0, 1.5)),
        )
        .unwrap();
        let b = ShiftPoints::new(lane.clone(), 0.5, PointSelection::All).unwrap();
        assert!(!a.can_merge_with(&b, &policy()));
    }

    #[test]
    fn test_simplify_caches_reduction() {
        let lane = lane(&[(0.0, 0.0), (1.0, 0.00001), (2.0, 0.0), (3.0, 1.0)]);
        let before = snapshot(&lane);

        let mut cmd = SimplifyCurve::new(lane.clone(), 0.01).unwrap();
        assert_eq!(cmd.removed_count(), None);
        cmd.execute();
        assert_eq!(cmd.removed_count(), Some(1));
        let reduced = snapshot(&lane);

        cmd.undo();
        assert_eq!(snapshot(&lane), before);

        cmd.execute();
        assert_eq!(snapshot(&lane), reduced);
    }

    #[test]
    fn test_simplify_with_context_defaults() {
        let ctx = EditContext::default();
        let lane = lane(&[(0.0, 0.0)]);
        let cmd = SimplifyCurve::with_defaults(&ctx, lane).unwrap();
        assert_eq!(cmd.threshold(), ctx.config.simplify.default_threshold);
    }

    #[test]
    fn test_simplify_in_context_applies_configured_floor() {
        let mut config = EditorConfig::default();
        config.simplify.min_threshold = 0.05;
        let ctx = EditContext::new(config);
        let lane = lane(&[(0.0, 0.0), (1.0, 0.51), (2.0, 1.0)]);

        let mut cmd = SimplifyCurve::in_context(&ctx, lane.clone(), 0.0).unwrap();
        assert_eq!(cmd.threshold(), 0.05);
        assert_eq!(
            SimplifyCurve::in_context(&ctx, lane.clone(), 0.2).unwrap().threshold(),
            0.2
        );
        assert!(SimplifyCurve::in_context(&ctx, lane.clone(), f64::NAN).is_err());

        // Direct construction only floors at the numeric minimum
        let mut direct = SimplifyCurve::new(lane.clone(), 0.0).unwrap();
        assert_eq!(direct.threshold(), MIN_THRESHOLD);
        direct.execute();
        assert_eq!(direct.removed_count(), Some(0));
        direct.undo();

        cmd.execute();
        assert_eq!(cmd.removed_count(), Some(1));
        assert_eq!(lane.read().len(), 2);
    }
}

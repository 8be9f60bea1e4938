//! Automation clipboard and the shared edit context
//!
//! The clipboard is an ordinary owned object. Editors that should share a
//! copy buffer hold clones of the same [`EditContext`]; tests simply build
//! their own.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use rf_core::{AutomationPoint, BezierHandles, CurveType};

use crate::config::EditorConfig;
use crate::undo::UndoManager;

/// A copied point with its time relative to the first copied point
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClipboardPoint {
    pub offset: f64,
    pub value: f64,
    pub curve: CurveType,
    pub tension: f64,
    pub bezier: BezierHandles,
    pub locked: bool,
    pub label: Option<String>,
}

impl ClipboardPoint {
    pub fn from_point(point: &AutomationPoint, origin: f64) -> Self {
        Self {
            offset: point.time - origin,
            value: point.value,
            curve: point.curve,
            tension: point.tension,
            bezier: point.bezier,
            locked: point.locked,
            label: point.label.clone(),
        }
    }

    /// Materialize at `origin + offset` under a fresh id
    pub fn to_point(&self, origin: f64) -> AutomationPoint {
        AutomationPoint {
            curve: self.curve,
            tension: self.tension,
            bezier: self.bezier,
            locked: self.locked,
            label: self.label.clone(),
            ..AutomationPoint::new(origin + self.offset, self.value)
        }
    }
}

/// Single last-writer-wins copy buffer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Clipboard {
    points: Vec<ClipboardPoint>,
}

impl Clipboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn points(&self) -> &[ClipboardPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Length from the first to the last copied point
    pub fn span(&self) -> f64 {
        self.points.iter().map(|p| p.offset).fold(0.0, f64::max)
    }

    /// Replace the contents with `points`, normalized to the earliest one
    pub fn store(&mut self, points: &[AutomationPoint]) {
        let origin = points.iter().map(|p| p.time).fold(f64::INFINITY, f64::min);
        self.points = points
            .iter()
            .map(|p| ClipboardPoint::from_point(p, origin))
            .collect();
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }
}

pub type SharedClipboard = Arc<RwLock<Clipboard>>;

/// Per-editor services commands are built against
#[derive(Debug, Clone, Default)]
pub struct EditContext {
    pub clipboard: SharedClipboard,
    pub config: EditorConfig,
}

impl EditContext {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            clipboard: SharedClipboard::default(),
            config,
        }
    }

    /// Context sharing this one's clipboard
    pub fn with_config(&self, config: EditorConfig) -> Self {
        Self {
            clipboard: Arc::clone(&self.clipboard),
            config,
        }
    }

    /// History configured from this context
    pub fn undo_manager(&self) -> UndoManager {
        UndoManager::from_config(&self.config.history)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_normalizes_to_first_point() {
        let mut clipboard = Clipboard::new();
        clipboard.store(&[
            AutomationPoint::new(2.0, 0.1),
            AutomationPoint::new(2.5, 0.2),
            AutomationPoint::new(3.0, 0.3),
        ]);
        let offsets: Vec<f64> = clipboard.points().iter().map(|p| p.offset).collect();
        assert_eq!(offsets, vec![0.0, 0.5, 1.0]);
        assert_eq!(clipboard.span(), 1.0);
    }

    #[test]
    fn test_roundtrip_keeps_shape_but_not_id() {
        let original = AutomationPoint::with_curve(4.0, 0.7, CurveType::SCurve)
            .tension(-0.3)
            .bezier(BezierHandles::new(0.1, 0.2, -0.1, -0.2))
            .locked(true)
            .label("drop");
        let copied = ClipboardPoint::from_point(&original, 4.0);
        let pasted = copied.to_point(10.0);

        assert_eq!(pasted.time, 10.0);
        assert_eq!(pasted.value, 0.7);
        assert!(pasted.same_shape(&original));
        assert_ne!(pasted.id, original.id);
    }

    #[test]
    fn test_contexts_share_clipboard() {
        let a = EditContext::default();
        let b = a.with_config(EditorConfig::default());
        a.clipboard.write().store(&[AutomationPoint::new(0.0, 0.0)]);
        assert_eq!(b.clipboard.read().len(), 1);
    }
}

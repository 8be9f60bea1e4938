//! Concrete Command Implementations for editing surfaces
//!
//! Provides undoable commands for:
//! - Automation curves (add, delete, move, retype, clear, copy/paste, scale, shift, thin)
//! - Piano roll notes (add, delete, move, resize, velocity)
//! - Mixer strips (channel, bus and master properties)
//! - Arrangement sections (add, delete, move, properties)
//!
//! Every command captures its pre-state when built and targets aggregates
//! through shared handles. A target that disappears before `execute`/`undo`
//! is skipped with a warning.

use parking_lot::RwLock;
use std::sync::Arc;

mod curve;
mod mixer;
mod note;
mod section;

pub use curve::*;
pub use mixer::*;
pub use note::*;
pub use section::*;

/// Handle to an aggregate shared between the editor and its commands
pub type Shared<T> = Arc<RwLock<T>>;

/// Wrap an aggregate in a [`Shared`] handle
pub fn shared<T>(value: T) -> Shared<T> {
    Arc::new(RwLock::new(value))
}

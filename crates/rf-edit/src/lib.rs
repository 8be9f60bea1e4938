//! rf-edit: Undoable editing for ReelForge
//!
//! Mergeable undo/redo history, the command family for every editing
//! surface (automation lanes, piano roll, mixer, arranger), curve thinning
//! and the automation clipboard.

mod clipboard;
mod command;
pub mod commands;
mod config;
pub mod simplify;
mod undo;

pub use clipboard::*;
pub use command::*;
pub use config::*;
pub use simplify::simplify_points;
pub use undo::*;

//! rf-core: Shared editing types for ReelForge
//!
//! The aggregates every editing surface mutates: automation lanes, piano roll
//! notes, mixer strips and arrangement sections, plus the common error type.

mod arrangement;
mod automation;
mod error;
mod mixer;
mod note;

pub use arrangement::*;
pub use automation::*;
pub use error::*;
pub use mixer::*;
pub use note::*;

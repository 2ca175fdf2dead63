//! Output module for navigation maps
//!
//! This module handles:
//! - Rendering navigation trees as directory-style text
//! - Committing rendered maps to disk under a lock marker
//! - Recording permanently failed tasks in the dead-letter log

mod atomic;
mod dead_letter;
mod render;

pub use atomic::{AtomicWriter, WriteError};
pub use dead_letter::{DeadLetterEntry, DeadLetterError, DeadLetterLog};
pub use render::{render_tree, EMPTY_TREE_MESSAGE};

//! Directory watching for Kio
//!
//! This module provides live directory watches that report file
//! additions, changes and removals to the UI surface:
//! - `DirectoryWatch`: one recursive OS watch with a liveness flag
//! - `WatchRegistry`: the set of active watches, one per directory

mod registry;
mod watcher;

pub use registry::WatchRegistry;
pub use watcher::DirectoryWatch;

//! File operations module for Kio
//!
//! This module provides the filesystem gateway used by the UI surface
//! (read, atomic write, directory listing, existence checks), the native
//! open/save/folder dialogs, and hand-off of folders and links to the
//! desktop shell.

pub mod dialogs;
mod gateway;
pub mod launcher;

pub use dialogs::{DialogProvider, DialogSelection, NativeDialogs};
pub use gateway::{DirectoryEntry, FileGateway};
pub use launcher::{Launcher, SystemLauncher};

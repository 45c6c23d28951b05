//! Configuration module for Kio
//!
//! This module handles user preferences: the settings record and its
//! merge-patch, JSON persistence to the platform config directory, and the
//! shared store that serializes updates.

mod persistence;
mod settings;
mod store;

pub use persistence::*;
pub use settings::*;
pub use store::SettingsStore;

//! Repository port for session persistence.
//!
//! This module defines the trait boundary between the training core and the
//! storage mechanism used for exported sessions.

use std::path::Path;

use crate::{Result, session::SavedSession};

/// Port for persisting and loading exported training sessions.
///
/// Implementations decide the wire format (JSON file, MessagePack bytes,
/// in-memory map for tests); all of them must round-trip every `f64` in the
/// Q-table bit-exactly.
pub trait SessionRepository {
    /// Save a session snapshot to storage.
    fn save(&self, session: &SavedSession, path: &Path) -> Result<()>;

    /// Load a session snapshot from storage.
    fn load(&self, path: &Path) -> Result<SavedSession>;
}

//! JSON file repository for session export and import.

use std::{
    fs::File,
    io::{BufReader, BufWriter},
    path::Path,
};

use crate::{Result, error::Error, ports::SessionRepository, session::SavedSession};

/// Stores sessions as pretty-printed JSON files.
///
/// JSON is the interchange format the presentation layer consumes directly;
/// serde_json serializes `f64` with enough digits that every value
/// round-trips bit-exactly.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRepository;

impl JsonRepository {
    pub fn new() -> Self {
        Self
    }
}

impl SessionRepository for JsonRepository {
    fn save(&self, session: &SavedSession, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(|source| Error::Io {
            operation: format!("create session file {}", path.display()),
            source,
        })?;
        let writer = BufWriter::new(file);
        serde_json::to_writer_pretty(writer, session)?;
        Ok(())
    }

    fn load(&self, path: &Path) -> Result<SavedSession> {
        let file = File::open(path).map_err(|source| Error::Io {
            operation: format!("open session file {}", path.display()),
            source,
        })?;
        let reader = BufReader::new(file);
        let session = serde_json::from_reader(reader)?;
        Ok(session)
    }
}

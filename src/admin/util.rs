use std::path::Path;

use crate::storage::{StoreOptions, StoreReader};

use crate::admin::error::{AdminError, Result};

/// Opens a store for inspection, reporting a missing file distinctly from a bad one.
///
/// # Errors
///
/// Returns [`AdminError::MissingStore`] if nothing exists at `path`, or the open error.
pub fn open_store(path: &Path, opts: &StoreOptions) -> Result<StoreReader> {
    if !path.exists() {
        return Err(AdminError::missing_store(path));
    }
    Ok(StoreReader::open(path, opts)?)
}

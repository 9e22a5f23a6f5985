//! File system helpers
//!
//! Writes go through a tempfile-plus-rename so a BUILD file is either the
//! old content or the new content, never a partial write.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::SpringbokResult;

/// Write `content` to `path` atomically
pub fn write_atomic(path: &Path, content: &str) -> SpringbokResult<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    let mut tmp = match dir {
        Some(dir) => NamedTempFile::new_in(dir)?,
        None => NamedTempFile::new()?,
    };
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

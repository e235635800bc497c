use std::fs;
use std::io::{Read, Write};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::OmicsError;

pub fn decode_gzip_text(bytes: &[u8]) -> Result<String, OmicsError> {
    let mut decoder = GzDecoder::new(bytes);
    let mut text = String::new();
    decoder
        .read_to_string(&mut text)
        .map_err(|err| OmicsError::Parse(format!("gzip payload: {err}")))?;
    Ok(text)
}

/// Writes `content` next to `path` and renames it into place.
pub fn write_file_atomic(path: &Path, content: &[u8]) -> Result<(), OmicsError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent)
        .map_err(|err| OmicsError::Filesystem(format!("create {}: {err}", parent.display())))?;
    let mut temp = tempfile::Builder::new()
        .prefix("kira-omics-out")
        .tempfile_in(parent)
        .map_err(|err| OmicsError::Filesystem(err.to_string()))?;
    temp.write_all(content)
        .map_err(|err| OmicsError::Filesystem(err.to_string()))?;
    temp.persist(path)
        .map_err(|err| OmicsError::Filesystem(format!("write {}: {err}", path.display())))?;
    Ok(())
}

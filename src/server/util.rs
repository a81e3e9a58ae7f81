use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::settings;

const TEMP_PREFIX: &str = "ocr-upload-";

/// Writes `bytes` to a fresh, randomly named file in `dir`.
///
/// The returned handle owns the file: dropping it removes the file.
pub(crate) fn write_temp_file(
    bytes: &[u8],
    filename: Option<&str>,
    dir: &Path,
) -> Result<NamedTempFile> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create tmp dir: {}", dir.display()))?;
    let suffix = format!(".{}", temp_extension(bytes, filename));
    let mut file = tempfile::Builder::new()
        .prefix(TEMP_PREFIX)
        .suffix(&suffix)
        .tempfile_in(dir)
        .with_context(|| format!("failed to create temp file in {}", dir.display()))?;
    file.write_all(bytes)
        .with_context(|| "failed to write uploaded file")?;
    file.flush().with_context(|| "failed to flush uploaded file")?;
    Ok(file)
}

pub(crate) fn resolve_tmp_dir(settings: &settings::Settings) -> PathBuf {
    if let Some(dir) = settings.server_tmp_dir.as_deref() {
        return PathBuf::from(dir);
    }
    std::env::temp_dir().join("ocr-text-server")
}

fn temp_extension(bytes: &[u8], filename: Option<&str>) -> String {
    if let Some(kind) = infer::get(bytes) {
        if kind.mime_type().starts_with("image/") {
            return kind.extension().to_string();
        }
    }
    filename
        .and_then(|name| Path::new(name).extension())
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty() && ext.len() <= 8)
        .filter(|ext| ext.chars().all(|ch| ch.is_ascii_alphanumeric()))
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_else(|| "bin".to_string())
}

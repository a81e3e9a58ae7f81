//! Language names accepted by the service.
//!
//! Callers may use the short names common to PaddleOCR-style APIs (`japan`,
//! `en`, `ch`, ...) or Tesseract codes directly. Lists may be joined with `+`,
//! `,` or spaces.

use anyhow::{anyhow, Result};

const ALIASES: &[(&str, &str)] = &[
    ("japan", "jpn"),
    ("japanese", "jpn"),
    ("ja", "jpn"),
    ("english", "eng"),
    ("en", "eng"),
    ("ch", "chi_sim"),
    ("chinese", "chi_sim"),
    ("zh", "chi_sim"),
    ("chinese_cht", "chi_tra"),
    ("korean", "kor"),
    ("ko", "kor"),
    ("french", "fra"),
    ("fr", "fra"),
    ("german", "deu"),
    ("de", "deu"),
    ("es", "spa"),
    ("it", "ita"),
    ("pt", "por"),
    ("ru", "rus"),
    ("ar", "ara"),
];

/// Maps a single language name to its Tesseract code. Unknown names are
/// returned unchanged.
pub fn tesseract_code(name: &str) -> String {
    let lowered = name.trim().to_ascii_lowercase();
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == lowered)
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| name.trim().to_string())
}

/// Resolves a language list into deduplicated Tesseract codes, keeping order.
pub fn resolve(requested: &str) -> Result<Vec<String>> {
    let mut codes: Vec<String> = Vec::new();
    for raw in requested.split(['+', ',', ' ']) {
        if raw.trim().is_empty() {
            continue;
        }
        let code = tesseract_code(raw);
        if !codes.contains(&code) {
            codes.push(code);
        }
    }
    if codes.is_empty() {
        return Err(anyhow!("ocr language is empty"));
    }
    Ok(codes)
}

mod engine;
pub mod languages;

use anyhow::Result;
use std::path::Path;

pub use engine::{list_tesseract_languages, Tesseract};

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct BBoxPx {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

/// One recognized line, as reported by the engine.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TextRegion {
    pub bbox: BBoxPx,
    pub text: String,
    pub confidence: f32,
}

/// Detection and recognition over an image on disk.
///
/// Implementations return regions in the engine's own reading order; callers
/// must not reorder them.
pub trait TextRecognizer: Send + Sync {
    fn recognize(&self, image_path: &Path, lang: &str) -> Result<Vec<TextRegion>>;
}

/// Runs `recognizer` over `image_path` and joins the recognized lines with `\n`.
pub fn extract_text(
    recognizer: &dyn TextRecognizer,
    image_path: &Path,
    lang: &str,
) -> Result<String> {
    let regions = recognizer.recognize(image_path, lang)?;
    let texts = regions
        .iter()
        .map(|region| region.text.as_str())
        .collect::<Vec<_>>();
    Ok(texts.join("\n"))
}

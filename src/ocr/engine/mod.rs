mod geom;
mod parse;
mod tesseract;
mod text;

use anyhow::Result;
use std::path::Path;

use crate::ocr::{languages, TextRecognizer, TextRegion};

pub use tesseract::list_tesseract_languages;

/// Page segmentation mode with orientation and script detection.
const PSM_AUTO_OSD: u32 = 1;
/// Fully automatic page segmentation, no orientation detection.
const PSM_AUTO: u32 = 3;

/// Recognizer backed by the `tesseract` command-line program.
///
/// Every call spawns a fresh process, so nothing is shared between requests.
#[derive(Debug, Clone)]
pub struct Tesseract {
    pub binary: String,
    pub angle_classification: bool,
    pub dpi: u32,
}

impl Default for Tesseract {
    fn default() -> Self {
        Self {
            binary: "tesseract".to_string(),
            angle_classification: true,
            dpi: 300,
        }
    }
}

impl Tesseract {
    fn psm(&self) -> u32 {
        if self.angle_classification {
            PSM_AUTO_OSD
        } else {
            PSM_AUTO
        }
    }
}

impl TextRecognizer for Tesseract {
    fn recognize(&self, image_path: &Path, lang: &str) -> Result<Vec<TextRegion>> {
        let requested = languages::resolve(lang)?;
        let chosen = tesseract::select_available(&self.binary, requested)?;
        tracing::debug!(
            path = %image_path.display(),
            languages = %chosen,
            psm = self.psm(),
            "running tesseract"
        );
        let tsv = tesseract::run_tesseract_tsv(&self.binary, image_path, &chosen, self.psm(), self.dpi)?;
        parse::parse_tsv_lines(&tsv)
    }
}

pub mod logging;
pub mod ocr;
pub mod server;
pub mod settings;
mod test_util;

pub use ocr::{extract_text, BBoxPx, Tesseract, TextRecognizer, TextRegion};
pub use settings::Settings;

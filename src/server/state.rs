use std::sync::Arc;

use crate::ocr::TextRecognizer;
use crate::settings;

#[derive(Clone)]
pub(crate) struct ServerState {
    pub(crate) settings: settings::Settings,
    pub(crate) recognizer: Arc<dyn TextRecognizer>,
    pub(crate) demo_html: Arc<String>,
}

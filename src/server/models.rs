use serde::Serialize;

#[derive(Debug, Serialize)]
pub(crate) struct ExtractResponse {
    pub(crate) extracted_text: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ErrorResponse {
    pub(crate) error: String,
}

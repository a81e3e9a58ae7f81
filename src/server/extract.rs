use anyhow::{Context, Result};
use axum::body::Bytes;
use axum::extract::Multipart;
use axum::http::StatusCode;

use crate::ocr;

use super::state::ServerState;
use super::util::{resolve_tmp_dir, write_temp_file};

const FILE_FIELD: &str = "file";
const LANG_FIELD: &str = "lang";

#[derive(Debug)]
pub(crate) struct ServerError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl ServerError {
    pub(crate) fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub(crate) fn unprocessable(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: message.into(),
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }
}

impl From<anyhow::Error> for ServerError {
    fn from(err: anyhow::Error) -> Self {
        ServerError::internal(format!("{:#}", err))
    }
}

#[derive(Debug)]
pub(crate) struct Upload {
    pub(crate) bytes: Bytes,
    pub(crate) filename: Option<String>,
    pub(crate) lang: Option<String>,
}

pub(crate) async fn read_upload(multipart: &mut Multipart) -> Result<Upload, ServerError> {
    let mut file = None;
    let mut lang = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ServerError {
            status: err.status(),
            message: format!("failed to parse multipart data: {}", err.body_text()),
        })?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            FILE_FIELD => {
                let filename = field.file_name().map(str::to_string);
                let bytes = field.bytes().await.map_err(|err| ServerError {
                    status: err.status(),
                    message: format!("failed to read uploaded file: {}", err.body_text()),
                })?;
                file = Some((bytes, filename));
            }
            LANG_FIELD => {
                let value = field.text().await.map_err(|err| ServerError {
                    status: err.status(),
                    message: format!("failed to read lang field: {}", err.body_text()),
                })?;
                if !value.trim().is_empty() {
                    lang = Some(value.trim().to_string());
                }
            }
            _ => {}
        }
    }

    let Some((bytes, filename)) = file else {
        return Err(ServerError::unprocessable(format!(
            "missing required field: {}",
            FILE_FIELD
        )));
    };
    Ok(Upload {
        bytes,
        filename,
        lang,
    })
}

/// Stores the upload in a temp file, runs OCR over it, and removes the file.
///
/// Blocking. The temp file is removed on every return path, including errors
/// from the recognizer.
pub(crate) fn extract_upload(state: &ServerState, upload: &Upload) -> Result<String> {
    let dir = resolve_tmp_dir(&state.settings);
    let lang = upload
        .lang
        .as_deref()
        .unwrap_or(state.settings.ocr_lang.as_str());
    let temp = write_temp_file(&upload.bytes, upload.filename.as_deref(), &dir)?;
    tracing::debug!(path = %temp.path().display(), lang, "stored upload");

    let text = ocr::extract_text(state.recognizer.as_ref(), temp.path(), lang)?;

    temp.close().with_context(|| "failed to remove temp file")?;
    Ok(text)
}

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_SETTINGS_TOML: &str = include_str!("../settings.toml");

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_addr: String,
    pub server_tmp_dir: Option<String>,
    pub max_upload_bytes: usize,
    pub ocr_lang: String,
    pub ocr_binary: String,
    pub ocr_angle_classification: bool,
    pub ocr_dpi: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_addr: "localhost:8000".to_string(),
            server_tmp_dir: None,
            max_upload_bytes: 20 * 1024 * 1024,
            ocr_lang: "japan".to_string(),
            ocr_binary: "tesseract".to_string(),
            ocr_angle_classification: true,
            ocr_dpi: 300,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct SettingsFile {
    server: Option<ServerSettings>,
    ocr: Option<OcrSettings>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerSettings {
    addr: Option<String>,
    tmp_dir: Option<String>,
    max_upload_bytes: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
struct OcrSettings {
    lang: Option<String>,
    binary: Option<String>,
    angle_classification: Option<bool>,
    dpi: Option<u32>,
}

pub fn load_settings(extra_path: Option<&Path>) -> Result<Settings> {
    let mut settings = Settings::default();
    ensure_home_settings_file()?;

    let mut ordered_paths = Vec::new();
    ordered_paths.push(PathBuf::from("settings.toml"));
    ordered_paths.push(PathBuf::from("settings.local.toml"));

    if let Some(home) = home_dir() {
        ordered_paths.push(home.join("settings.toml"));
        ordered_paths.push(home.join("settings.local.toml"));
    }

    if let Some(extra) = extra_path {
        if !extra.exists() {
            return Err(anyhow!("settings file not found: {}", extra.display()));
        }
        ordered_paths.push(extra.to_path_buf());
    }

    for path in ordered_paths {
        if path.exists() {
            let content = fs::read_to_string(&path)
                .with_context(|| format!("failed to read settings: {}", path.display()))?;
            let parsed: SettingsFile = toml::from_str(&content)
                .with_context(|| format!("failed to parse settings: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded settings");
            settings.merge(parsed);
        }
    }

    Ok(settings)
}

impl Settings {
    fn merge(&mut self, incoming: SettingsFile) {
        if let Some(server) = incoming.server {
            if let Some(addr) = server.addr {
                if !addr.trim().is_empty() {
                    self.server_addr = addr;
                }
            }
            if let Some(dir) = server.tmp_dir {
                if !dir.trim().is_empty() {
                    self.server_tmp_dir = Some(dir);
                }
            }
            if let Some(limit) = server.max_upload_bytes {
                if limit > 0 {
                    self.max_upload_bytes = limit;
                }
            }
        }
        if let Some(ocr) = incoming.ocr {
            if let Some(lang) = ocr.lang {
                if !lang.trim().is_empty() {
                    self.ocr_lang = lang;
                }
            }
            if let Some(binary) = ocr.binary {
                if !binary.trim().is_empty() {
                    self.ocr_binary = binary;
                }
            }
            if let Some(enabled) = ocr.angle_classification {
                self.ocr_angle_classification = enabled;
            }
            if let Some(dpi) = ocr.dpi {
                if dpi > 0 {
                    self.ocr_dpi = dpi;
                }
            }
        }
    }

    pub fn tesseract(&self) -> crate::ocr::Tesseract {
        crate::ocr::Tesseract {
            binary: self.ocr_binary.clone(),
            angle_classification: self.ocr_angle_classification,
            dpi: self.ocr_dpi,
        }
    }
}

fn ensure_home_settings_file() -> Result<()> {
    let Some(home) = home_dir() else {
        return Ok(());
    };
    fs::create_dir_all(&home)
        .with_context(|| format!("failed to create settings directory: {}", home.display()))?;
    let path = home.join("settings.toml");
    if !path.exists() {
        fs::write(&path, DEFAULT_SETTINGS_TOML)
            .with_context(|| format!("failed to write settings: {}", path.display()))?;
    }
    Ok(())
}

fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME").ok().and_then(|home| {
        let home = home.trim();
        if home.is_empty() {
            None
        } else {
            Some(Path::new(home).join(".ocr-text-server"))
        }
    })
}

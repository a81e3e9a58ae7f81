use std::path::Path;

use anyhow::Result;
use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "ocr-text-server",
    version,
    about = "Serve OCR text extraction for uploaded images over HTTP"
)]
struct Cli {
    /// Listen address (default from settings: localhost:8000)
    #[arg(short = 'a', long = "addr")]
    addr: Option<String>,

    /// OCR language (e.g. japan, en, jpn+eng)
    #[arg(short = 'l', long = "lang")]
    lang: Option<String>,

    /// Read extra settings from a local TOML file
    #[arg(short = 'r', long = "read-settings")]
    read_settings: Option<String>,

    /// Show OCR languages installed for the configured engine and exit
    #[arg(long = "show-languages")]
    show_languages: bool,

    /// Enable verbose logging
    #[arg(long = "verbose")]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    ocr_text_server::logging::init(cli.verbose)?;

    let mut settings =
        ocr_text_server::settings::load_settings(cli.read_settings.as_deref().map(Path::new))?;
    if let Some(lang) = cli.lang {
        settings.ocr_lang = lang;
    }
    if cli.show_languages {
        for lang in ocr_text_server::ocr::list_tesseract_languages(&settings.ocr_binary)? {
            println!("{}", lang);
        }
        return Ok(());
    }
    let addr = cli.addr.unwrap_or_else(|| settings.server_addr.clone());
    ocr_text_server::server::run_server(settings, addr).await
}

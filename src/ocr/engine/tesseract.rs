use anyhow::{anyhow, Context, Result};
use std::process::Command;

pub fn list_tesseract_languages(binary: &str) -> Result<Vec<String>> {
    let output = Command::new(binary)
        .arg("--list-langs")
        .output()
        .with_context(|| format!("failed to run {} --list-langs", binary))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("{} --list-langs failed: {}", binary, stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_language_list(&stdout))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
    let mut langs = Vec::new();
    for (idx, line) in stdout.lines().enumerate() {
        // header: "List of available languages in ..."
        if idx == 0 {
            continue;
        }
        let value = line.trim();
        if !value.is_empty() {
            langs.push(value.to_string());
        }
    }
    langs
}

/// Drops requested languages that the installed engine does not provide and
/// returns the rest joined for `-l`. When the installed list cannot be read,
/// everything requested is passed through.
pub(super) fn select_available(binary: &str, requested: Vec<String>) -> Result<String> {
    let available = match list_tesseract_languages(binary) {
        Ok(list) => list,
        Err(err) => {
            tracing::debug!(error = %err, "skipping ocr language check");
            return Ok(requested.join("+"));
        }
    };
    choose_languages(requested, &available)
}

fn choose_languages(requested: Vec<String>, available: &[String]) -> Result<String> {
    let (chosen, missing): (Vec<String>, Vec<String>) = requested
        .into_iter()
        .partition(|lang| available.iter().any(|value| value == lang));

    if chosen.is_empty() {
        return Err(anyhow!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        ));
    }
    if !missing.is_empty() {
        tracing::warn!(
            missing = %missing.join(", "),
            available = %available.join(", "),
            "ocr language(s) not available"
        );
    }
    Ok(chosen.join("+"))
}

pub(super) fn run_tesseract_tsv(
    binary: &str,
    path: &std::path::Path,
    languages: &str,
    psm: u32,
    dpi: u32,
) -> Result<String> {
    let output = Command::new(binary)
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(languages)
        .arg("--psm")
        .arg(psm.to_string())
        .arg("--dpi")
        .arg(dpi.to_string())
        .arg("tsv")
        .output()
        .with_context(|| format!("failed to run {} (is it installed?)", binary))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract failed: {}", stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

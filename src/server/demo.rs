use anyhow::{Context, Result};
use tera::{Context as TeraContext, Tera};

const DEMO_TEMPLATE: &str = include_str!("templates/demo.html.tera");

pub(crate) fn render_demo_html(extract_path: &str) -> Result<String> {
    let mut context = TeraContext::new();
    context.insert("title", "OCR Demo");
    context.insert("file_label", "OCRを行いたい画像ファイルを選択してください");
    context.insert("extract_path_json", &serde_json::to_string(extract_path)?);
    Tera::one_off(DEMO_TEMPLATE, &context, false).with_context(|| "failed to render demo template")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_page_posts_to_extract_path() {
        let html = render_demo_html("/extract-text/").unwrap();
        assert!(html.contains("<form id=\"ocr-form\""));
        assert!(html.contains("name=\"file\""));
        assert!(html.contains("const EXTRACT_PATH = \"/extract-text/\";"));
        assert!(html.contains("id=\"ocr-result\""));
        assert!(!html.contains("{{"));
    }
}

use anyhow::Result;
use std::collections::BTreeMap;

use crate::ocr::{BBoxPx, TextRegion};

use super::geom::union_bbox;
use super::text::needs_space;

const WORD_LEVEL: i32 = 5;

#[derive(Clone)]
struct WordToken {
    text: String,
    bbox: BBoxPx,
    conf: f32,
    len: usize,
}

/// Groups word rows of Tesseract TSV output into lines.
///
/// Lines come out in `(page, block, paragraph, line)` order, which is the
/// engine's reading order.
pub(super) fn parse_tsv_lines(tsv: &str) -> Result<Vec<TextRegion>> {
    let mut word_map: BTreeMap<(i32, i32, i32, i32), Vec<WordToken>> = BTreeMap::new();

    for (idx, row) in tsv.lines().enumerate() {
        if idx == 0 {
            continue;
        }
        let cols = row.split('\t').collect::<Vec<_>>();
        if cols.len() < 12 {
            continue;
        }
        let level: i32 = cols[0].parse().unwrap_or(0);
        if level != WORD_LEVEL {
            continue;
        }
        let page_num: i32 = cols[1].parse().unwrap_or(0);
        let block_num: i32 = cols[2].parse().unwrap_or(0);
        let par_num: i32 = cols[3].parse().unwrap_or(0);
        let line_num: i32 = cols[4].parse().unwrap_or(0);
        let left: u32 = cols[6].parse().unwrap_or(0);
        let top: u32 = cols[7].parse().unwrap_or(0);
        let width: u32 = cols[8].parse().unwrap_or(0);
        let height: u32 = cols[9].parse().unwrap_or(0);
        let conf: f32 = cols[10].parse().unwrap_or(-1.0);
        let text = cols[11].trim();
        if text.is_empty() || conf < 0.0 {
            continue;
        }

        let key = (page_num, block_num, par_num, line_num);
        word_map.entry(key).or_default().push(WordToken {
            text: text.to_string(),
            bbox: BBoxPx {
                x: left,
                y: top,
                w: width,
                h: height,
            },
            conf,
            len: text.chars().count().max(1),
        });
    }

    let mut lines = Vec::new();
    for (_, mut words) in word_map {
        words.sort_by_key(|word| word.bbox.x);
        if let Some(line) = build_line(&words) {
            lines.push(line);
        }
    }
    Ok(lines)
}

fn build_line(words: &[WordToken]) -> Option<TextRegion> {
    let mut text = String::new();
    let mut last_token = "";
    for word in words {
        if !text.is_empty() && needs_space(last_token, &word.text) {
            text.push(' ');
        }
        text.push_str(&word.text);
        last_token = &word.text;
    }
    let final_text = text.trim();
    if final_text.is_empty() {
        return None;
    }

    let mut bbox_opt: Option<BBoxPx> = None;
    let mut conf_sum = 0.0;
    let mut len_sum = 0.0;
    for word in words {
        bbox_opt = Some(match bbox_opt.take() {
            Some(bbox) => union_bbox(&bbox, &word.bbox),
            None => word.bbox.clone(),
        });
        let weight = word.len as f32;
        conf_sum += word.conf * weight;
        len_sum += weight;
    }
    let avg_conf = if len_sum > 0.0 {
        conf_sum / len_sum
    } else {
        0.0
    };

    Some(TextRegion {
        bbox: bbox_opt?,
        text: final_text.to_string(),
        confidence: (avg_conf / 100.0).clamp(0.0, 1.0),
    })
}

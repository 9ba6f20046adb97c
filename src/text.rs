//! Text wrapping for multi-line fields

use crate::font::FontMetrics;
use tracing::trace;

/// Break text into lines no wider than `max_width` points.
///
/// Explicit newlines always start a new line (`\r\n` counts as one break);
/// an empty segment between two breaks yields an empty line. Words wider than
/// the whole line are split between characters.
pub fn wrap_text(
    text: &str,
    max_width: f32,
    font_size: f32,
    metrics: &dyn FontMetrics,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    let space_width = metrics.char_width(' ', font_size);

    for segment in text.split('\n') {
        let segment = segment.strip_suffix('\r').unwrap_or(segment);
        let words: Vec<&str> = segment.split_whitespace().collect();

        if words.is_empty() {
            lines.push(String::new());
            continue;
        }

        let mut current = String::new();
        let mut current_width: f32 = 0.0;

        for word in words {
            let word_width = metrics.text_width(word, font_size);

            if word_width > max_width {
                if !current.is_empty() {
                    lines.push(std::mem::take(&mut current));
                }
                let (pieces, tail) = split_long_word(word, max_width, font_size, metrics);
                lines.extend(pieces);
                current_width = metrics.text_width(&tail, font_size);
                current = tail;
                continue;
            }

            if !current.is_empty() && current_width + space_width + word_width > max_width {
                lines.push(std::mem::take(&mut current));
                current_width = 0.0;
            }

            if !current.is_empty() {
                current.push(' ');
                current_width += space_width;
            }
            current.push_str(word);
            current_width += word_width;
        }

        if !current.is_empty() {
            lines.push(current);
        }
    }

    trace!("Wrapped text into {} lines", lines.len());
    lines
}

/// Split a word into full-width pieces and the remainder that starts the next line
fn split_long_word(
    word: &str,
    max_width: f32,
    font_size: f32,
    metrics: &dyn FontMetrics,
) -> (Vec<String>, String) {
    let mut pieces = Vec::new();
    let mut remaining = word;

    loop {
        let mut split_at = 0;
        let mut accumulated = 0.0;
        for (i, ch) in remaining.char_indices() {
            let cw = metrics.char_width(ch, font_size);
            if accumulated + cw > max_width && split_at > 0 {
                break;
            }
            accumulated += cw;
            split_at = i + ch.len_utf8();
        }

        let (chunk, rest) = remaining.split_at(split_at);
        if rest.is_empty() {
            return (pieces, chunk.to_string());
        }
        pieces.push(chunk.to_string());
        remaining = rest;
    }
}

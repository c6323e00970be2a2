//! Text Formatter: reflows a raw scraped job description into readable blocks.
//!
//! Scraped descriptions arrive as one long run of text, with bullets and sentences glued
//! together. The formatter puts every sentence-like block and bullet on its own line, with
//! exactly one blank line between blocks. It never fails; empty in, empty out.

use lazy_static::lazy_static;
use regex::Regex;

/// Glyphs treated as list bullets.
pub const BULLET_GLYPHS: [char; 5] = ['•', '▪', '◦', '●', '‣'];

lazy_static! {
    static ref LINE_ENDINGS: Regex =
        Regex::new(r"\r\n|\r|\u{85}|\u{2028}|\u{2029}").expect("valid line-ending regex");
    static ref HORIZONTAL_SPACE: Regex =
        Regex::new(r"[^\S\n]+").expect("valid horizontal-space regex");
    static ref BEFORE_BULLET: Regex =
        Regex::new(r"[^\S\n]*([•▪◦●‣])").expect("valid bullet regex");
    static ref SENTENCE_BREAK: Regex =
        Regex::new(r"([.;:])\s+(\p{Lu}|\d)").expect("valid sentence-break regex");
    static ref EXCESS_NEWLINES: Regex = Regex::new(r"\n{3,}").expect("valid newline regex");
}

/// Formats a raw description for display and scoring.
pub fn format_job_text(raw: &str) -> String {
    if raw.trim().is_empty() {
        return String::new();
    }

    let text = LINE_ENDINGS.replace_all(raw, "\n");
    let text = HORIZONTAL_SPACE.replace_all(&text, " ");
    let text = BEFORE_BULLET.replace_all(&text, "\n$1");
    let text = SENTENCE_BREAK.replace_all(&text, "$1\n$2");

    let blocks: Vec<String> = text.lines().filter_map(format_line).collect();
    let joined = blocks.join("\n\n");

    EXCESS_NEWLINES
        .replace_all(&joined, "\n\n")
        .trim()
        .to_string()
}

/// One output block, or `None` for a line with nothing to show.
fn format_line(line: &str) -> Option<String> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }

    let bullet_body = line
        .strip_prefix(&BULLET_GLYPHS[..])
        .or_else(|| line.strip_prefix("- "))
        .or_else(|| line.strip_prefix("* "));

    match bullet_body {
        Some(body) => {
            let body = body.trim();
            (!body.is_empty()).then(|| format!("- {body}"))
        }
        None => Some(line.to_string()),
    }
}

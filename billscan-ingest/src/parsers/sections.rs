//! Section tracking over bill text.
//!
//! Carrier bills group charges under headings ("Monthly Charges",
//! "Taxes & Fees", "Equipment", ...). A short line with no amount on it that
//! mentions one of the keywords below switches the active section; every
//! other non-empty line is tagged with whatever section is active.

use regex::Regex;
use std::sync::LazyLock;

use crate::types::{SectionLine, TextBlock};

/// Section applied before the first heading is seen.
pub const DEFAULT_SECTION: &str = "general";

const SECTION_KEYWORDS: &[&str] = &[
    "monthly",
    "charges",
    "service",
    "equipment",
    "taxes",
    "fees",
    "surcharges",
    "credits",
    "adjustments",
    "plan",
    "usage",
    "account",
    "summary",
    "total",
    "payment",
    "balance",
    "due",
];

static SECTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    let alternation = SECTION_KEYWORDS.join("|");
    Regex::new(&format!(r"(?i)\b({alternation})\b")).expect("valid section regex")
});

/// Anything that looks like a money figure disqualifies a line as a heading.
static AMOUNT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d[\d,]*\.\d{2}\b").expect("valid amount regex"));

const MAX_HEADING_LEN: usize = 60;

/// Iterate `(byte_offset, line)` pairs, with line terminators removed.
pub fn lines_with_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        (start, raw.trim_end_matches(['\n', '\r']))
    })
}

/// If `line` is a section heading, return the section it opens.
pub fn section_heading(line: &str) -> Option<&'static str> {
    let l = line.trim().trim_matches(|c: char| c == '#' || c == '*' || c == '|').trim();
    if l.is_empty() || l.len() > MAX_HEADING_LEN || AMOUNT_RE.is_match(l) {
        return None;
    }

    let caps = SECTION_RE.captures(l)?;
    let word = caps.get(1)?.as_str().to_lowercase();
    SECTION_KEYWORDS.iter().copied().find(|k| *k == word)
}

/// Split text into non-empty lines, each tagged with the section active
/// when it was read. Heading lines carry their own new section.
pub fn tag_sections(text: &str) -> Vec<SectionLine<'_>> {
    let mut section = DEFAULT_SECTION;
    let mut out = Vec::new();

    for (offset, line) in lines_with_offsets(text) {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(s) = section_heading(line) {
            section = s;
        }
        out.push(SectionLine {
            section,
            text: line,
            offset,
        });
    }

    out
}

/// Split text into blank-line-delimited blocks.
pub fn text_blocks(text: &str) -> Vec<TextBlock<'_>> {
    let mut blocks = Vec::new();
    let mut start: Option<usize> = None;
    let mut end = 0;

    for (offset, line) in lines_with_offsets(text) {
        if line.trim().is_empty() {
            if let Some(s) = start.take() {
                blocks.push(TextBlock { text: &text[s..end], start: s });
            }
            continue;
        }
        if start.is_none() {
            start = Some(offset);
        }
        end = offset + line.len();
    }
    if let Some(s) = start {
        blocks.push(TextBlock { text: &text[s..end], start: s });
    }

    blocks
}

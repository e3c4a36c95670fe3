//! Charge candidate extraction: the raw-text pass, the markdown pass and
//! the table pass.
//!
//! Each text line or table row yields at most one candidate.

use billscan_core::{ChargeCandidate, SourcePass, parse_amount};
use billscan_ingest::{Table, section_heading, split_cells, tag_sections};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::sync::LazyLock;
use tracing::debug;

use crate::classify::clean_description;
use crate::patterns::{PRICE_PATTERNS, is_summary_description};

/// Which text view a line-oriented pass is reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExtractMode {
    /// `Document::plain_text`
    RawText,
    /// `Document::table_text` read line by line, to catch the non-tabular
    /// content of the markdown rendering
    MarkdownText,
}

impl ExtractMode {
    pub fn source_pass(&self) -> SourcePass {
        match self {
            ExtractMode::RawText => SourcePass::RawText,
            ExtractMode::MarkdownText => SourcePass::MarkdownText,
        }
    }
}

static AMOUNT_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)amount|price|cost|total|\$|^charges?$").expect("valid amount header regex")
});

static DESCRIPTION_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)description|item|service|plan|name|detail|feature|charge")
        .expect("valid description header regex")
});

static MONEY_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?-?\$?\s?-?\d[\d,]*\.\d{2}\)?$").expect("valid money cell regex")
});

/// Pipe rows are flattened to `a | b | c` so the price patterns see one line.
fn normalize_line(line: &str) -> Cow<'_, str> {
    if !line.contains('|') {
        return Cow::Borrowed(line);
    }
    let cells: Vec<String> = split_cells(line).into_iter().filter(|c| !c.is_empty()).collect();
    Cow::Owned(cells.join(" | "))
}

/// Try each price pattern in order. A pattern whose description carries no
/// letters, or whose amount does not parse, counts as not matching.
pub fn match_line(line: &str) -> Option<(String, f64)> {
    for pattern in PRICE_PATTERNS.iter() {
        let Some((desc, amount)) = pattern.captures(line) else {
            continue;
        };
        let desc = clean_description(desc);
        if !desc.chars().any(|c| c.is_alphabetic()) {
            continue;
        }
        let Some(amount) = parse_amount(amount) else {
            continue;
        };
        return Some((desc, amount));
    }
    None
}

/// Run one line-oriented pass over `text`.
pub fn extract_candidates(text: &str, mode: ExtractMode) -> Vec<ChargeCandidate> {
    let pass = mode.source_pass();
    let mut out = Vec::new();

    for line in tag_sections(text) {
        if section_heading(line.text).is_some() {
            continue;
        }
        let normalized = normalize_line(line.text);
        let Some((description, amount)) = match_line(&normalized) else {
            continue;
        };
        if is_summary_description(&description) {
            continue;
        }

        out.push(
            ChargeCandidate::new(description, amount, line.section, pass)
                .with_source(normalized.into_owned(), Some(line.offset)),
        );
    }

    debug!(pass = ?pass, candidates = out.len(), "text pass done");
    out
}

fn is_money_cell(cell: &str) -> bool {
    MONEY_CELL_RE.is_match(cell.trim())
}

/// Indexes of the description and amount columns, when the headers name both.
fn column_pair(headers: &[String]) -> Option<(usize, usize)> {
    let amount = headers.iter().position(|h| AMOUNT_HEADER_RE.is_match(h))?;
    let description = headers
        .iter()
        .enumerate()
        .position(|(i, h)| i != amount && DESCRIPTION_HEADER_RE.is_match(h))?;
    Some((description, amount))
}

fn from_columns(row: &[String], description: usize, amount: usize) -> Option<(String, f64)> {
    let amount_cell = row.get(amount)?;
    if !is_money_cell(amount_cell) {
        return None;
    }
    let desc = clean_description(row.get(description)?);
    if desc.is_empty() {
        return None;
    }
    Some((desc, parse_amount(amount_cell)?))
}

/// First money cell is the amount; the first other cell with letters in it
/// (else the first other non-empty cell) is the description.
fn scan_cells(row: &[String]) -> Option<(String, f64)> {
    let amount = row.iter().find(|c| is_money_cell(c)).and_then(|c| parse_amount(c))?;
    let others: Vec<&String> = row.iter().filter(|c| !c.is_empty() && !is_money_cell(c)).collect();
    let desc = others
        .iter()
        .find(|c| c.chars().any(|ch| ch.is_alphabetic()))
        .or_else(|| others.first())?;
    Some((clean_description(desc), amount))
}

/// Run the table pass. Total rows are kept and flagged so reconciliation
/// can compare them against the item rows.
pub fn extract_table_candidates(tables: &[Table]) -> Vec<ChargeCandidate> {
    let mut out = Vec::new();

    for table in tables {
        let columns = column_pair(&table.headers);
        for row in &table.rows {
            let pair = columns
                .and_then(|(d, a)| from_columns(row, d, a))
                .or_else(|| scan_cells(row));
            let Some((description, amount)) = pair else {
                continue;
            };
            if description.is_empty() {
                continue;
            }

            let has_total = description.to_lowercase().contains("total");
            out.push(
                ChargeCandidate::new(
                    description,
                    amount,
                    table.table_type.as_str(),
                    SourcePass::Table,
                )
                    .with_table(table.table_type, has_total)
                    .with_source(row.join(" | "), None),
            );
        }
    }

    debug!(tables = tables.len(), candidates = out.len(), "table pass done");
    out
}

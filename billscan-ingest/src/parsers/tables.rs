//! Pipe-delimited table parser for the markdown rendering of a bill.
//!
//! Expected layout:
//!   | Description          | Amount  |
//!   |----------------------|---------|
//!   | Plan Fee             | $40.00  |
//!   | Subtotal             | $40.00  |
//!
//! Consecutive pipe lines form one table; the first is the header row.

use billscan_core::TableType;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

use super::sections::lines_with_offsets;
use crate::types::Table;

/// Header classifiers, tried in order.
static TABLE_TYPE_RULES: LazyLock<Vec<(TableType, Regex)>> = LazyLock::new(|| {
    [
        (TableType::LineCharges, r"(?i)\b(line|device|phone|equipment|mobile number)\b"),
        (TableType::PlanCharges, r"(?i)\b(plan|service|description|item|charges?)\b"),
        (TableType::TaxesFees, r"(?i)\b(tax(es)?|fees?|surcharges?|government)\b"),
        (TableType::Usage, r"(?i)\b(usage|minutes|data|messages|talk|text)\b"),
        (TableType::Summary, r"(?i)\b(summary|total|balance|due)\b"),
    ]
    .into_iter()
    .map(|(t, p)| (t, Regex::new(p).expect("valid table type regex")))
    .collect()
});

static MONEY_HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)price|amount|cost|charge|total|\$").expect("valid money header regex")
});

static DOLLAR_CELL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"-?\$\s?-?\d[\d,]*\.\d{2}").expect("valid dollar regex")
});

static SEPARATOR_CELL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:?-{2,}:?$").expect("valid separator regex"));

fn is_pipe_row(line: &str) -> bool {
    let l = line.trim();
    l.contains('|')
}

/// Split `| a | b |` into `["a", "b"]`.
pub fn split_cells(line: &str) -> Vec<String> {
    let l = line.trim();
    let l = l.strip_prefix('|').unwrap_or(l);
    let l = l.strip_suffix('|').unwrap_or(l);
    l.split('|').map(|c| c.trim().to_string()).collect()
}

fn is_separator_row(cells: &[String]) -> bool {
    cells.iter().any(|c| !c.is_empty())
        && cells
            .iter()
            .all(|c| c.is_empty() || SEPARATOR_CELL_RE.is_match(c))
}

/// Decide a table's category from its header names. First rule wins.
pub fn classify_table(headers: &[String]) -> TableType {
    let joined = headers.join(" ");
    TABLE_TYPE_RULES
        .iter()
        .find(|(_, re)| re.is_match(&joined))
        .map(|(t, _)| *t)
        .unwrap_or(TableType::Other)
}

/// Whether a cell holds a dollar figure.
pub fn is_dollar_cell(cell: &str) -> bool {
    DOLLAR_CELL_RE.is_match(cell)
}

fn holds_money(headers: &[String], rows: &[Vec<String>]) -> bool {
    headers.iter().any(|h| MONEY_HEADER_RE.is_match(h))
        || rows.iter().flatten().any(|c| is_dollar_cell(c))
}

fn finish_block(block: Vec<Vec<String>>, out: &mut Vec<Table>) {
    let mut it = block.into_iter();
    let Some(headers) = it.next() else {
        return;
    };
    let rows: Vec<Vec<String>> = it.filter(|r| r.iter().any(|c| !c.is_empty())).collect();

    if !holds_money(&headers, &rows) {
        debug!(headers = ?headers, "dropping table without amounts");
        return;
    }

    let table_type = classify_table(&headers);
    out.push(Table {
        headers,
        rows,
        table_type,
    });
}

/// Parse every money-bearing pipe table out of `table_text`.
pub fn parse_tables(table_text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut block: Vec<Vec<String>> = Vec::new();

    for (_, line) in lines_with_offsets(table_text) {
        if !is_pipe_row(line) {
            if !block.is_empty() {
                finish_block(std::mem::take(&mut block), &mut tables);
            }
            continue;
        }

        let cells = split_cells(line);
        if is_separator_row(&cells) {
            continue;
        }
        block.push(cells);
    }
    if !block.is_empty() {
        finish_block(block, &mut tables);
    }

    debug!(count = tables.len(), "parsed tables");
    tables
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parses_basic_table() {
        let text = r#"
## Plan charges

| Description | Amount |
|-------------|--------|
| Plan Fee    | $40.00 |
| Subtotal    | $40.00 |

Thanks for being a customer.
"#;

        let tables = parse_tables(text);
        assert_eq!(tables.len(), 1);
        let t = &tables[0];
        assert_eq!(t.headers, headers(&["Description", "Amount"]));
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0], headers(&["Plan Fee", "$40.00"]));
        assert_eq!(t.table_type, TableType::PlanCharges);
    }

    #[test]
    fn test_two_blocks_split_on_text() {
        let text = "| Line | Charge |\n| --- | --- |\n| 251-747-0017 | $85.00 |\nsome text\n| Tax | Amount |\n| 911 Fee | $1.50 |\n";
        let tables = parse_tables(text);
        assert_eq!(tables.len(), 2);
        assert_eq!(tables[0].table_type, TableType::LineCharges);
        assert_eq!(tables[1].table_type, TableType::TaxesFees);
    }

    #[test]
    fn test_drops_tables_without_money() {
        let text = "| Name | Phone |\n|---|---|\n| Jane | 251-747-0017 |\n";
        assert!(parse_tables(text).is_empty());
    }

    #[test]
    fn test_money_cell_keeps_unlabelled_table() {
        let text = "| Item | Notes |\n| Roaming | $12.00 |\n";
        let tables = parse_tables(text);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].table_type, TableType::PlanCharges);
    }

    #[test]
    fn test_classify_falls_back_to_other() {
        assert_eq!(classify_table(&headers(&["Date", "Amount"])), TableType::Other);
        assert_eq!(classify_table(&headers(&["Data Used", "Cost"])), TableType::Usage);
        assert_eq!(classify_table(&headers(&["Balance Due", "$"])), TableType::Summary);
    }

    #[test]
    fn test_split_cells() {
        assert_eq!(split_cells("| a | b |"), headers(&["a", "b"]));
        assert_eq!(split_cells("a | b"), headers(&["a", "b"]));
        assert!(is_separator_row(&split_cells("|:---|---:|")));
    }
}

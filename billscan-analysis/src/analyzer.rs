//! One full analysis run over a `Document`.

use billscan_core::{BillAnalysisResult, ChargeCandidate, SourcePass, Subtotals};
use billscan_ingest::{Document, parse_tables};
use tracing::{debug, info};

use crate::classify::classify_all;
use crate::config::AnalysisConfig;
use crate::dedup::{dedup, drop_summary_rows, partition};
use crate::extractor::{ExtractMode, extract_candidates, extract_table_candidates};
use crate::header::{account_number, billing_period, total_amount_due};
use crate::phone_lines::{associate_phone_lines, is_declared_total_line};
use crate::reconcile::reconcile;

/// Candidates of the three passes, kept apart so they can be merged in
/// their fixed order.
#[derive(Debug, Clone, Default)]
pub struct PassOutput {
    pub raw_text: Vec<ChargeCandidate>,
    pub markdown_text: Vec<ChargeCandidate>,
    pub table: Vec<ChargeCandidate>,
}

impl PassOutput {
    /// Raw-text first, then markdown, then table. Dedup keeps the first
    /// description it sees, so this order decides which amount survives.
    pub fn merged(self) -> impl Iterator<Item = ChargeCandidate> {
        self.raw_text
            .into_iter()
            .chain(self.markdown_text)
            .chain(self.table)
    }
}

fn raw_pass(doc: &Document, config: &AnalysisConfig) -> Vec<ChargeCandidate> {
    classify_all(extract_candidates(&doc.plain_text, ExtractMode::RawText), config)
}

fn markdown_pass(doc: &Document, config: &AnalysisConfig) -> Vec<ChargeCandidate> {
    classify_all(extract_candidates(&doc.table_text, ExtractMode::MarkdownText), config)
}

fn table_pass(doc: &Document, config: &AnalysisConfig) -> Vec<ChargeCandidate> {
    classify_all(extract_table_candidates(&parse_tables(&doc.table_text)), config)
}

/// Run the extraction passes, optionally on the rayon pool. Either way the
/// outputs are joined before anything downstream sees them.
pub fn run_passes(doc: &Document, config: &AnalysisConfig) -> PassOutput {
    if config.parallel_passes {
        let ((raw_text, markdown_text), table) = rayon::join(
            || rayon::join(|| raw_pass(doc, config), || markdown_pass(doc, config)),
            || table_pass(doc, config),
        );
        PassOutput {
            raw_text,
            markdown_text,
            table,
        }
    } else {
        PassOutput {
            raw_text: raw_pass(doc, config),
            markdown_text: markdown_pass(doc, config),
            table: table_pass(doc, config),
        }
    }
}

/// Analyze a bill with the default heuristics.
pub fn analyze_bill(doc: &Document) -> BillAnalysisResult {
    analyze_bill_with(doc, &AnalysisConfig::default())
}

pub fn analyze_bill_with(doc: &Document, config: &AnalysisConfig) -> BillAnalysisResult {
    let passes = run_passes(doc, config);
    debug!(
        raw = passes.raw_text.len(),
        markdown = passes.markdown_text.len(),
        table = passes.table.len(),
        "extraction passes done"
    );

    let table_validations = reconcile(&passes.table, config.subtotal_tolerance);

    let charges = passes
        .merged()
        .filter(|c| c.source_pass == SourcePass::Table || !is_declared_total_line(&c.source_text));
    let charges = drop_summary_rows(dedup(charges));
    let (line_items, other_charges) = partition(charges);
    let association = associate_phone_lines(&doc.plain_text, line_items, &other_charges, config);
    let line_items = association.line_items;
    let subtotals = Subtotals::from_partition(&line_items, &other_charges);

    let texts = [doc.plain_text.as_str(), doc.table_text.as_str()];
    let result = BillAnalysisResult {
        account_number: account_number(&texts),
        billing_period: billing_period(&texts),
        total_amount_due: total_amount_due(&texts),
        line_items,
        other_charges,
        phone_lines: association.phone_lines,
        subtotals,
        table_validations,
    };

    info!(
        account = %result.account_number,
        charges = result.charge_count(),
        phone_lines = result.phone_lines.len(),
        validations = result.table_validations.len(),
        mismatched = result.mismatched_tables().count(),
        "bill analyzed"
    );
    result
}

//! billscan-analysis: charge extraction, classification, deduplication,
//! phone line association and subtotal reconciliation for carrier bills.

pub mod analyzer;
pub mod classify;
pub mod config;
pub mod dedup;
pub mod extractor;
pub mod header;
pub mod patterns;
pub mod phone_lines;
pub mod reconcile;

pub use analyzer::{PassOutput, analyze_bill, analyze_bill_with, run_passes};
pub use classify::classify_all;
pub use config::AnalysisConfig;
pub use extractor::{ExtractMode, extract_candidates, extract_table_candidates};
pub use phone_lines::{Association, associate_phone_lines};
pub use reconcile::reconcile;

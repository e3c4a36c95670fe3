//! Document acquisition: turning files produced by an upstream PDF-to-text
//! step into a `Document`.

use billscan_core::BillError;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::Document;

/// Source of bill text. Implementations own every file-format concern.
pub trait TextExtractor {
    fn extract(&self, source: &Path) -> Result<Document, BillError>;
}

/// Reads an already-extracted plain-text file, plus a markdown table
/// rendering when one is available.
///
/// Without an explicit table path, a sibling `<stem>.md` next to the
/// source is used if it exists (and is not the source itself).
#[derive(Debug, Clone, Default)]
pub struct FileTextExtractor {
    pub table_path: Option<PathBuf>,
}

impl FileTextExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table_path(table_path: impl Into<PathBuf>) -> Self {
        Self {
            table_path: Some(table_path.into()),
        }
    }

    fn table_source(&self, source: &Path) -> Option<PathBuf> {
        if let Some(p) = &self.table_path {
            return Some(p.clone());
        }
        let sibling = source.with_extension("md");
        if sibling != source && sibling.exists() {
            Some(sibling)
        } else {
            None
        }
    }
}

fn read_text(path: &Path) -> Result<String, BillError> {
    fs::read_to_string(path)
        .map_err(|e| BillError::extraction_failed(path.display().to_string(), e.to_string()))
}

impl TextExtractor for FileTextExtractor {
    fn extract(&self, source: &Path) -> Result<Document, BillError> {
        let plain_text = read_text(source)?;
        let table_text = match self.table_source(source) {
            Some(p) => read_text(&p)?,
            None => String::new(),
        };

        debug!(
            source = %source.display(),
            plain_bytes = plain_text.len(),
            table_bytes = table_text.len(),
            "read bill text"
        );
        document_from_text(source.display().to_string(), plain_text, table_text)
    }
}

/// Build a `Document`, rejecting input with no text in either view.
pub fn document_from_text(
    source_name: impl Into<String>,
    plain_text: impl Into<String>,
    table_text: impl Into<String>,
) -> Result<Document, BillError> {
    let doc = Document::new(plain_text, table_text);
    if doc.is_empty() {
        return Err(BillError::extraction_failed(source_name, "no text extracted"));
    }
    Ok(doc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("fixtures")
            .join(name)
    }

    #[test]
    fn test_reads_fixture_with_sibling_tables() {
        let doc = FileTextExtractor::new()
            .extract(&fixture("sample_bill.txt"))
            .expect("should read sample bill");
        assert!(doc.plain_text.contains("Account number"));
        assert!(doc.table_text.contains('|'));
    }

    #[test]
    fn test_missing_file_is_extraction_failure() {
        let err = FileTextExtractor::new()
            .extract(&fixture("no_such_bill.txt"))
            .unwrap_err();
        assert!(matches!(err, BillError::DocumentExtractionFailed { .. }));
    }

    #[test]
    fn test_empty_text_is_extraction_failure() {
        let err = document_from_text("blank.txt", "  \n", "").unwrap_err();
        assert!(err.to_string().contains("no text extracted"));
        assert!(document_from_text("t.txt", "Plan $1.00", "").is_ok());
    }
}

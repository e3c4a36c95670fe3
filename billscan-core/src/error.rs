//! The one failure the bill pipeline can surface: no usable document text.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BillError {
    /// The upstream text extraction produced nothing to analyze.
    #[error("document extraction failed for {source_name}: {reason}")]
    DocumentExtractionFailed { source_name: String, reason: String },
}

impl BillError {
    pub fn extraction_failed(source_name: impl Into<String>, reason: impl Into<String>) -> Self {
        BillError::DocumentExtractionFailed {
            source_name: source_name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extraction_failed_message() {
        let err = BillError::extraction_failed("bill.txt", "no text");
        assert_eq!(
            err.to_string(),
            "document extraction failed for bill.txt: no text"
        );
    }
}

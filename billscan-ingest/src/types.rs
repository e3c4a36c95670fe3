use billscan_core::TableType;
use serde::{Deserialize, Serialize};

/// Two textual renderings of the same bill, as produced by the upstream
/// text extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub plain_text: String,
    /// Markdown-like rendering; may hold pipe-delimited tables
    pub table_text: String,
}

impl Document {
    pub fn new(plain_text: impl Into<String>, table_text: impl Into<String>) -> Self {
        Self {
            plain_text: plain_text.into(),
            table_text: table_text.into(),
        }
    }

    /// A document with no table rendering.
    pub fn from_plain_text(plain_text: impl Into<String>) -> Self {
        Self::new(plain_text, String::new())
    }

    pub fn is_empty(&self) -> bool {
        self.plain_text.trim().is_empty() && self.table_text.trim().is_empty()
    }
}

/// A non-empty line of text and the section it sits under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionLine<'a> {
    pub section: &'static str,
    pub text: &'a str,
    /// Byte offset of the line start within the scanned text
    pub offset: usize,
}

/// A run of lines delimited by blank lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextBlock<'a> {
    pub text: &'a str,
    pub start: usize,
}

impl TextBlock<'_> {
    pub fn end(&self) -> usize {
        self.start + self.text.len()
    }
}

/// One pipe-delimited table from the markdown rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    pub table_type: TableType,
}

//! billscan-ingest: bill document acquisition, section tagging and table parsing.

pub mod extract;
pub mod parsers;
pub mod types;

pub use extract::{FileTextExtractor, TextExtractor, document_from_text};
pub use parsers::sections::{
    DEFAULT_SECTION, lines_with_offsets, section_heading, tag_sections, text_blocks,
};
pub use parsers::tables::{classify_table, is_dollar_cell, parse_tables, split_cells};
pub use types::{Document, SectionLine, Table, TextBlock};

//! PDF page loader for layout reconstruction.
//!
//! Turns PDF bytes into one [`PageLayout`] per page: glyph-level
//! [`TextAtom`]s and axis-aligned [`LineSegment`]s in top-left page
//! coordinates.  No layout interpretation happens here.

use thiserror::Error;

pub mod parser;
pub mod types;

pub use types::*;

#[derive(Debug, Error)]
pub enum PdfError {
    #[error("PDF parsing error: {0}")]
    Parse(String),
    #[error("Document is encrypted")]
    Encrypted,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Parse PDF bytes and extract every page's atoms and rule segments.
///
/// The lopdf document is dropped before returning; the pages own copies of
/// everything the pipeline needs.
pub fn load_pages(bytes: &[u8]) -> Result<Vec<PageLayout>, PdfError> {
    let backend = parser::backend::LopdfBackend::load_bytes(bytes)?;
    log::debug!("loaded PDF with {} pages", backend.page_count());
    parser::page::extract_all_pages(&backend)
}

/// Read a PDF file from disk and extract its pages.
pub fn load_file(path: impl AsRef<std::path::Path>) -> Result<Vec<PageLayout>, PdfError> {
    let bytes = std::fs::read(path)?;
    load_pages(&bytes)
}

//! Page-wise text extraction for PDF documents.
//!
//! Each page becomes its own record so that provenance survives down to
//! the chunk level. Extraction never panics: a file that cannot be parsed
//! returns an [`ExtractError`] and the loader skips it.

/// A single page of extracted text.
#[derive(Debug, Clone, PartialEq)]
pub struct PageText {
    /// 1-based page number; `None` when only whole-document text was available.
    pub page_number: Option<u32>,
    pub text: String,
}

/// Pages extracted from one PDF.
#[derive(Debug, Default)]
pub struct PdfPages {
    pub pages: Vec<PageText>,
    /// Page numbers whose text could not be extracted.
    pub unreadable: Vec<u32>,
}

#[derive(Debug)]
pub enum ExtractError {
    Pdf(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Pdf(e) => write!(f, "PDF extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract text from a PDF, one entry per page.
///
/// Pages are read with `lopdf` in page order. Pages that fail are listed
/// in [`PdfPages::unreadable`]. If the document parses but no page yields
/// text, the whole document is handed to `pdf-extract` as a single record.
pub fn extract_pdf_pages(bytes: &[u8]) -> Result<PdfPages, ExtractError> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string()))?;

    let extracted = collect_pages(
        doc.get_pages()
            .keys()
            .map(|&page_number| (page_number, doc.extract_text(&[page_number]))),
    );
    if extracted.pages.iter().any(|p| !p.text.trim().is_empty()) {
        return Ok(extracted);
    }

    let text = pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(PdfPages {
        pages: vec![PageText {
            page_number: None,
            text,
        }],
        unreadable: Vec::new(),
    })
}

fn collect_pages<E: std::fmt::Display>(
    results: impl Iterator<Item = (u32, Result<String, E>)>,
) -> PdfPages {
    let mut out = PdfPages::default();
    for (page_number, result) in results {
        match result {
            Ok(text) => out.pages.push(PageText {
                page_number: Some(page_number),
                text,
            }),
            Err(e) => {
                tracing::debug!(page_number, error = %e, "page text extraction failed");
                out.unreadable.push(page_number);
            }
        }
    }
    out
}

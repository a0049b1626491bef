use super::{types::PageText, Engine};
use anyhow::{anyhow, Result};
use lopdf::Document;
use tracing::debug;

#[derive(Debug, Clone, Default)]
pub struct LopdfEngine;

impl LopdfEngine {
    pub fn new() -> Self {
        Self
    }
}

impl Engine for LopdfEngine {
    fn name(&self) -> &'static str {
        "lopdf"
    }

    fn extract_pages(&self, pdf: &[u8]) -> Result<Vec<PageText>> {
        if pdf.is_empty() {
            return Err(anyhow!("empty file"));
        }

        let doc = Document::load_mem(pdf).map_err(|e| anyhow!("invalid pdf: {e}"))?;

        // BTreeMap keyed by page number, so iteration is document order.
        let pages = doc.get_pages();
        debug!("lopdf page_count={}", pages.len());

        let mut out = Vec::with_capacity(pages.len());
        for (i, page_number) in pages.keys().enumerate() {
            let raw = doc
                .extract_text(&[*page_number])
                .map_err(|e| anyhow!("extracting text from page {page_number}: {e}"))?;
            out.push(PageText {
                number: i as u32 + 1,
                // lopdf ends every text object with a newline.
                text: raw.trim_end_matches(['\n', '\r']).to_string(),
            });
        }
        Ok(out)
    }
}

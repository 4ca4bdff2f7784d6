use std::future::Future;
use std::pin::Pin;

use crate::error::{DocentError, Result};

pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 50 * 1024 * 1024;

const PDF_MAGIC: &[u8] = b"%PDF-";

pub trait TextExtractor: Send + Sync {
    /// Turn raw document bytes into plain text.
    ///
    /// Text that is empty after trimming is reported as
    /// [`DocentError::Extraction`].
    fn extract(&self, bytes: Vec<u8>) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>>;
}

fn check_size(bytes: &[u8], limit: usize) -> Result<()> {
    if bytes.len() > limit {
        return Err(DocentError::DocumentTooLarge {
            size: bytes.len(),
            limit,
        });
    }
    Ok(())
}

fn non_blank(text: String) -> Result<String> {
    if text.trim().is_empty() {
        return Err(DocentError::Extraction(
            "document contains no extractable text".into(),
        ));
    }
    Ok(text)
}

#[derive(Debug, Clone)]
pub struct PdfExtractor {
    pub max_bytes: usize,
}

impl Default for PdfExtractor {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl TextExtractor for PdfExtractor {
    fn extract(&self, bytes: Vec<u8>) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            check_size(&bytes, self.max_bytes)?;
            if !bytes.starts_with(PDF_MAGIC) {
                return Err(DocentError::UnsupportedFormat(
                    "missing %PDF- header".into(),
                ));
            }

            let size = bytes.len();
            let text = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem(&bytes)
                    .map_err(|e| DocentError::Extraction(e.to_string()))
            })
            .await
            .map_err(|e| DocentError::Extraction(format!("pdf extraction task failed: {e}")))??;

            tracing::debug!(bytes = size, chars = text.chars().count(), "extracted pdf text");
            non_blank(text)
        })
    }
}

/// UTF-8 text passthrough for `.txt` and `.md` sources.
#[derive(Debug, Clone)]
pub struct PlainTextExtractor {
    pub max_bytes: usize,
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
        }
    }
}

impl TextExtractor for PlainTextExtractor {
    fn extract(&self, bytes: Vec<u8>) -> Pin<Box<dyn Future<Output = Result<String>> + Send + '_>> {
        Box::pin(async move {
            check_size(&bytes, self.max_bytes)?;
            let text = String::from_utf8(bytes)
                .map_err(|e| DocentError::UnsupportedFormat(format!("not valid UTF-8: {e}")))?;
            non_blank(text)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn pdf_rejects_missing_magic() {
        let err = PdfExtractor::default()
            .extract(b"hello world".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocentError::UnsupportedFormat(_)));
    }

    #[tokio::test]
    async fn pdf_rejects_oversized_input() {
        let extractor = PdfExtractor { max_bytes: 8 };
        let err = extractor
            .extract(b"%PDF-1.4 too long".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DocentError::DocumentTooLarge { size: 17, limit: 8 }
        ));
    }

    #[tokio::test]
    async fn pdf_corrupt_body_is_extraction_error() {
        let err = PdfExtractor::default()
            .extract(b"%PDF-1.4\nnot really a pdf".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocentError::Extraction(_)));
    }

    #[tokio::test]
    async fn plain_text_passthrough() {
        let text = PlainTextExtractor::default()
            .extract("Newton's laws".as_bytes().to_vec())
            .await
            .unwrap();
        assert_eq!(text, "Newton's laws");
    }

    #[tokio::test]
    async fn plain_text_blank_is_extraction_error() {
        let err = PlainTextExtractor::default()
            .extract(b" \n\t ".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, DocentError::Extraction(_)));
    }

    #[tokio::test]
    async fn plain_text_invalid_utf8() {
        let err = PlainTextExtractor::default()
            .extract(vec![0xff, 0xfe, 0x00])
            .await
            .unwrap_err();
        assert!(matches!(err, DocentError::UnsupportedFormat(_)));
    }
}

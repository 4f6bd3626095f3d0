use std::panic::{self, AssertUnwindSafe};

use super::ParseError;

/// Extract the text layer of a PDF held in memory.
///
/// `pdf-extract` panics on some malformed inputs; the panic is caught here and
/// reported like any other parse failure.
pub fn extract_pdf(bytes: &[u8]) -> Result<String, ParseError> {
    match panic::catch_unwind(AssertUnwindSafe(|| pdf_extract::extract_text_from_mem(bytes))) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(ParseError::Pdf(e.to_string())),
        Err(_) => Err(ParseError::Pdf("parser panicked on malformed input".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_is_rejected() {
        assert!(matches!(extract_pdf(b"definitely not a pdf"), Err(ParseError::Pdf(_))));
        assert!(extract_pdf(&[]).is_err());
    }
}

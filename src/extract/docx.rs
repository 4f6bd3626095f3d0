//! DOCX text: paragraphs of `word/document.xml`, one per line.

use std::io::{Cursor, Read};

use quick_xml::Reader;
use quick_xml::escape::unescape;
use quick_xml::events::Event;

use super::ParseError;

const DOCUMENT_PART: &str = "word/document.xml";

/// Extract paragraph text from a DOCX held in memory.
///
/// Runs (`w:t`) inside a paragraph (`w:p`) are concatenated; `w:tab` becomes
/// `\t` and `w:br` / `w:cr` become `\n`. Paragraphs are joined with `\n`.
pub fn extract_docx(bytes: &[u8]) -> Result<String, ParseError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ParseError::Docx(format!("not a DOCX archive: {e}")))?;
    let mut part = archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ParseError::Docx(format!("missing {DOCUMENT_PART}: {e}")))?;
    let mut xml = String::new();
    part.read_to_string(&mut xml)
        .map_err(|e| ParseError::Docx(format!("cannot read {DOCUMENT_PART}: {e}")))?;

    paragraphs(&xml).map(|p| p.join("\n"))
}

fn paragraphs(xml: &str) -> Result<Vec<String>, ParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);

    let mut out = Vec::new();
    let mut current: Option<String> = None;
    let mut in_text = false;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| ParseError::Docx(format!("malformed XML at {}: {e}", reader.buffer_position())))?;
        match event {
            Event::Start(e) => match e.name().as_ref() {
                b"w:p" => current = Some(String::new()),
                b"w:t" => in_text = true,
                _ => {}
            },
            Event::Empty(e) => {
                if let Some(p) = current.as_mut() {
                    match e.name().as_ref() {
                        b"w:tab" => p.push('\t'),
                        b"w:br" | b"w:cr" => p.push('\n'),
                        _ => {}
                    }
                }
                if e.name().as_ref() == b"w:p" {
                    out.push(String::new());
                }
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:p" => out.extend(current.take()),
                b"w:t" => in_text = false,
                _ => {}
            },
            Event::Text(t) if in_text => {
                if let Some(p) = current.as_mut() {
                    p.push_str(&decode(&t)?);
                }
            }
            Event::GeneralRef(r) if in_text => {
                if let Some(p) = current.as_mut() {
                    let raw = format!("&{};", String::from_utf8_lossy(&r));
                    p.push_str(&decode(raw.as_bytes())?);
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out)
}

fn decode(raw: &[u8]) -> Result<String, ParseError> {
    let s = std::str::from_utf8(raw).map_err(|e| ParseError::Docx(format!("invalid UTF-8: {e}")))?;
    unescape(s)
        .map(|c| c.into_owned())
        .map_err(|e| ParseError::Docx(format!("bad entity: {e}")))
}

//! PDF text recovery rungs
//!
//! Three native rungs, cheapest first. Each returns the raw recovered
//! text or a reason string for the ladder's failure report.

use lopdf::content::Content;
use lopdf::{Document, Object};

/// Rung 1: pdf-extract's full text layer extraction
pub fn extract_native(bytes: &[u8]) -> Result<String, String> {
    pdf_extract::extract_text_from_mem(bytes).map_err(|e| format!("pdf-extract failed: {}", e))
}

/// Rung 2: lopdf's per-page text extraction
pub fn extract_pages(bytes: &[u8]) -> Result<String, String> {
    let doc = Document::load_mem(bytes).map_err(|e| format!("lopdf parse failed: {}", e))?;
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    if pages.is_empty() {
        return Err("no pages".to_string());
    }
    doc.extract_text(&pages)
        .map_err(|e| format!("lopdf extract failed: {}", e))
}

/// Rung 3: walk the content streams and collect the operands of the
/// text-showing operators. No font decoding — bytes are taken as-is —
/// so this only salvages PDFs whose strings are stored unencoded.
pub fn extract_literals(bytes: &[u8]) -> Result<String, String> {
    let doc = Document::load_mem(bytes).map_err(|e| format!("lopdf parse failed: {}", e))?;
    let mut out = String::new();

    for (_, page_id) in doc.get_pages() {
        let data = match doc.get_page_content(page_id) {
            Ok(data) => data,
            Err(_) => continue,
        };
        let content = match Content::decode(&data) {
            Ok(content) => content,
            Err(_) => continue,
        };
        for op in &content.operations {
            match op.operator.as_str() {
                "Tj" | "'" | "\"" => {
                    for operand in &op.operands {
                        push_string_operand(operand, &mut out);
                    }
                    out.push(' ');
                }
                "TJ" => {
                    if let Some(Object::Array(items)) = op.operands.first() {
                        for item in items {
                            push_string_operand(item, &mut out);
                        }
                    }
                    out.push(' ');
                }
                "ET" => out.push('\n'),
                _ => {}
            }
        }
        out.push('\n');
    }

    if out.trim().is_empty() {
        Err("no string literals found".to_string())
    } else {
        Ok(out)
    }
}

fn push_string_operand(object: &Object, out: &mut String) {
    if let Object::String(bytes, _) = object {
        out.push_str(&String::from_utf8_lossy(bytes));
    }
}

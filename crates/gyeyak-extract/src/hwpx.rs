//! HWPX text recovery
//!
//! HWPX is an OPC zip container; body text lives in
//! `Contents/section*.xml`. We read the sections in order and strip the
//! XML down to text, one line per `<hp:p>` paragraph.

use quick_xml::escape::unescape;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::{Cursor, Read};
use zip::ZipArchive;

pub fn extract(bytes: &[u8]) -> Result<String, String> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| format!("not a zip container: {}", e))?;

    let mut section_names: Vec<String> = archive
        .file_names()
        .filter(|name| name.starts_with("Contents/section") && name.ends_with(".xml"))
        .map(|name| name.to_string())
        .collect();
    section_names.sort();

    if section_names.is_empty() {
        return Err("no Contents/section*.xml entries".to_string());
    }

    let mut out = String::new();
    for name in &section_names {
        let mut xml = String::new();
        archive
            .by_name(name)
            .map_err(|e| format!("cannot open {}: {}", name, e))?
            .read_to_string(&mut xml)
            .map_err(|e| format!("cannot read {}: {}", name, e))?;
        strip_section_xml(&xml, &mut out);
    }

    if out.trim().is_empty() {
        Err("section xml contained no text".to_string())
    } else {
        Ok(out)
    }
}

fn strip_section_xml(xml: &str, out: &mut String) {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Text(e)) => {
                if let Ok(decoded) = e.decode() {
                    let text = match unescape(&decoded) {
                        Ok(s) => s.into_owned(),
                        Err(_) => decoded.into_owned(),
                    };
                    let text = text.trim();
                    if !text.is_empty() {
                        if !out.is_empty() && !out.ends_with(['\n', ' ']) {
                            out.push(' ');
                        }
                        out.push_str(text);
                    }
                }
            }
            // Paragraph boundary
            Ok(Event::End(e)) if e.local_name().as_ref() == b"p" => {
                if !out.ends_with('\n') {
                    out.push('\n');
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
    }
}

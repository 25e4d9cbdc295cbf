//! HTML text recovery

use scraper::Html;

/// Tags whose text content is never document text
const SKIPPED_PARENTS: &[&str] = &["script", "style", "noscript"];

pub fn extract(html: &str) -> Result<String, String> {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let in_skipped = node
            .parent()
            .and_then(|p| p.value().as_element().map(|e| e.name().to_ascii_lowercase()))
            .map(|name| SKIPPED_PARENTS.contains(&name.as_str()))
            .unwrap_or(false);
        if in_skipped {
            continue;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(trimmed);
    }

    if out.trim().is_empty() {
        Err("no text nodes".to_string())
    } else {
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_tags_and_keeps_text() {
        let html = "<html><body><h1>근로계약서</h1><p>제1조 (목적)</p></body></html>";
        let text = extract(html).unwrap();
        assert!(text.contains("근로계약서"));
        assert!(text.contains("제1조 (목적)"));
    }

    #[test]
    fn skips_script_and_style() {
        let html = r#"<html><head><style>body { color: red }</style></head>
            <body><script>var hidden = 1;</script><p>보이는 본문</p></body></html>"#;
        let text = extract(html).unwrap();
        assert!(text.contains("보이는 본문"));
        assert!(!text.contains("hidden"));
        assert!(!text.contains("color"));
    }

    #[test]
    fn empty_body_is_an_error() {
        assert!(extract("<html><body></body></html>").is_err());
    }
}

//! Text cleaning shared by every extraction method

/// Characters kept besides letters, digits, and whitespace
const KEPT_PUNCTUATION: &[char] = &['.', ',', '(', ')', '%', '-', ':', '/'];

/// Normalize extracted text: drop characters outside the allowed set
/// (letters, digits, Korean syllables, `. , ( ) % - : /`) and collapse
/// whitespace runs — a run containing a newline becomes one newline,
/// any other run becomes one space.
///
/// Cleaning never empties non-empty input; if the allowed set would
/// remove everything, the input comes back unchanged.
pub fn clean_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_ws: Option<char> = None;

    for c in text.chars() {
        if c.is_whitespace() {
            pending_ws = Some(match pending_ws {
                Some('\n') => '\n',
                _ if c == '\n' || c == '\r' => '\n',
                _ => ' ',
            });
            continue;
        }
        if !(c.is_alphanumeric() || KEPT_PUNCTUATION.contains(&c)) {
            continue;
        }
        if let Some(ws) = pending_ws.take() {
            if !out.is_empty() {
                out.push(ws);
            }
        }
        out.push(c);
    }

    if out.trim().is_empty() && !text.trim().is_empty() {
        return text.to_string();
    }
    out
}

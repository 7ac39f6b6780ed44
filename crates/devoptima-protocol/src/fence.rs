const FENCE: &str = "```";

/// Remove triple-backtick wrappers (optionally language-tagged) around a block.
///
/// Nested or repeated wrappers are peeled until none remain, so the result
/// never starts or ends with a fence and stripping twice changes nothing.
/// The returned text is trimmed.
pub fn strip_fences(text: &str) -> String {
    let mut current = text.trim();
    while let Some(inner) = strip_outer_fence(current) {
        current = inner;
    }
    current.to_string()
}

/// Peel one layer of fencing. `None` when `text` has no fence at either end.
fn strip_outer_fence(text: &str) -> Option<&str> {
    let opened = text.starts_with(FENCE);

    let mut body = text;
    if opened {
        let rest = &body[FENCE.len()..];
        body = match rest.find('\n') {
            Some(pos) if is_language_tag(&rest[..pos]) => &rest[pos + 1..],
            None if is_language_tag(rest) => "",
            _ => rest,
        };
    }

    match body.trim_end().strip_suffix(FENCE) {
        Some(inner) => Some(inner.trim()),
        None if opened => Some(body.trim()),
        None => None,
    }
}

fn is_language_tag(s: &str) -> bool {
    let s = s.trim();
    s.len() <= 20
        && s
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '#' | '.' | '_'))
}

/// Inner text of the first fenced block anywhere in `text`.
///
/// An unterminated block runs to the end of the text.
pub fn extract_fenced_block(text: &str) -> Option<String> {
    let mut lines = text.lines();
    lines.find(|line| line.trim_start().starts_with(FENCE))?;

    let body: Vec<&str> = lines
        .take_while(|line| !line.trim_start().starts_with(FENCE))
        .collect();
    Some(strip_fences(&body.join("\n")))
}

/// Code carried by a marker section.
///
/// A section that opens with a fence yields that block alone, so prose after
/// the closing fence is dropped. Anything else is de-fenced whole.
pub(crate) fn code_section(text: &str) -> String {
    let opener = text.trim_start().lines().next().unwrap_or_default();
    if opener.strip_prefix(FENCE).is_some_and(is_language_tag) {
        if let Some(block) = extract_fenced_block(text).filter(|b| !b.is_empty()) {
            return block;
        }
    }
    strip_fences(text)
}

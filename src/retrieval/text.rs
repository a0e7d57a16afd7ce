//! Plain-text clean-up shared by every retrieval step

/// Appended to content cut at the character cap
pub const TRUNCATION_MARKER: &str = "\n\n[... content truncated ...]";

/// Collapse whitespace while keeping paragraph structure
///
/// Line endings become `\n`, runs of other whitespace become one space,
/// lines are trimmed, consecutive blank lines shrink to a single blank line
/// and the result carries no leading or trailing whitespace.
#[must_use]
pub fn normalize_whitespace(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    let mut out = String::with_capacity(unified.len());
    let mut blank_pending = false;

    for line in unified.split('\n') {
        let mut words = line.split_whitespace();
        let Some(first) = words.next() else {
            blank_pending = !out.is_empty();
            continue;
        };

        if !out.is_empty() {
            out.push('\n');
            if blank_pending {
                out.push('\n');
            }
        }
        blank_pending = false;

        out.push_str(first);
        for word in words {
            out.push(' ');
            out.push_str(word);
        }
    }

    out
}

/// Collapse every whitespace run, line breaks included, to one space
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cut `text` to at most `max_chars` characters and append [`TRUNCATION_MARKER`]
///
/// Counts Unicode scalar values, so the cut never splits a character. Text
/// within the cap is returned unchanged.
#[must_use]
pub fn truncate_with_marker(text: String, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => {
            let mut cut = text;
            cut.truncate(byte_index);
            cut.push_str(TRUNCATION_MARKER);
            cut
        }
        None => text,
    }
}

/// Normalize then cap; every successful retrieval step ends here
#[must_use]
pub fn finalize(text: &str, max_chars: usize) -> String {
    truncate_with_marker(normalize_whitespace(text), max_chars)
}

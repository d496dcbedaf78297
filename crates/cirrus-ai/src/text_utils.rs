//! Shared text utility functions.
//!
//! All lengths here are measured in characters, never bytes, so multi-byte
//! text is never split inside a code point.

use once_cell::sync::Lazy;
use regex::Regex;

/// Below this bound `compress` leaves text alone.
pub const MIN_COMPRESS_CHARS: usize = 32;

static TRUNCATION_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\n\n\.\.\.\[truncated \d+ chars\]\.\.\.\n\n").expect("static regex is valid")
});

/// Number of characters in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `n`-th character of `s` (or `s.len()` past the end).
fn char_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}

/// Characters of `s` that are not part of a truncation marker.
fn payload_len(s: &str) -> usize {
    let marker_chars: usize = TRUNCATION_MARKER
        .find_iter(s)
        .map(|m| char_len(m.as_str()))
        .sum();
    char_len(s) - marker_chars
}

/// Head/tail compression.
///
/// Keeps roughly the first 70% and the last 30% of `max_chars` and replaces
/// the middle with a `...[truncated N chars]...` marker. Text that already
/// carries markers is measured without them, so compressing twice with the
/// same bound returns the first result unchanged.
pub fn compress(text: &str, max_chars: usize) -> String {
    if max_chars < MIN_COMPRESS_CHARS {
        return text.to_string();
    }
    let total = char_len(text);
    if total <= max_chars || payload_len(text) <= max_chars {
        return text.to_string();
    }

    let mut head_len = max_chars * 7 / 10;
    if head_len >= total {
        head_len = max_chars / 2;
    }
    let tail_len = max_chars - head_len;
    let omitted = total - max_chars;

    let head_end = char_offset(text, head_len);
    let tail_start = char_offset(text, total - tail_len);

    format!(
        "{}\n\n...[truncated {} chars]...\n\n{}",
        &text[..head_end],
        omitted,
        &text[tail_start..]
    )
}

/// Hard cap that keeps the leading `max_chars` characters and appends `suffix`.
pub fn truncate_with_suffix(text: &str, max_chars: usize, suffix: &str) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }
    let end = char_offset(text, max_chars);
    format!("{}{}", &text[..end], suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_text_unchanged() {
        assert_eq!(compress("hello world", 100), "hello world");
    }

    #[test]
    fn test_tiny_bound_unchanged() {
        let text = "x".repeat(500);
        assert_eq!(compress(&text, 31), text);
    }

    #[test]
    fn test_compress_keeps_head_and_tail() {
        let text: String = (0..1000).map(|i| char::from(b'a' + (i % 26) as u8)).collect();
        let out = compress(&text, 100);

        assert!(out.starts_with(&text[..70]));
        assert!(out.ends_with(&text[970..]));
        assert!(out.contains("...[truncated 900 chars]..."));
    }

    #[test]
    fn test_compressed_length_close_to_bound() {
        let text = "y".repeat(20_000);
        let out = compress(&text, 5000);
        let overhead = char_len(&out) - 5000;
        assert!(overhead < 40, "overhead was {overhead}");
    }

    #[test]
    fn test_compress_is_idempotent() {
        let text = "z".repeat(12_345);
        let once = compress(&text, 360);
        let twice = compress(&once, 360);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_multibyte_text_splits_on_chars() {
        let text = "你好世界".repeat(100);
        let out = compress(&text, 40);
        assert!(out.starts_with("你好世界你好世界"));
        assert!(out.contains("[truncated 360 chars]"));
    }

    #[test]
    fn test_truncate_with_suffix() {
        assert_eq!(truncate_with_suffix("abcdef", 3, "..."), "abc...");
        assert_eq!(truncate_with_suffix("abc", 3, "..."), "abc");
    }
}

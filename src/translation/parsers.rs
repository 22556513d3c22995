//! Byte-level recognisers used by the scanner.

fn starts_with_at(bytes: &[u8], idx: usize, pattern: &[u8]) -> bool {
    bytes.get(idx..).is_some_and(|rest| rest.starts_with(pattern))
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    starts_with_at(bytes, idx, b"--")
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    starts_with_at(bytes, idx, b"/*")
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    starts_with_at(bytes, idx, b"*/")
}

/// A `$tag$` opener at `start`, returning the (possibly empty) tag and the index of its closing `$`.
/// `$1` and friends are positional markers, not dollar quotes.
pub(super) fn try_start_dollar_quote(bytes: &[u8], start: usize) -> Option<(String, usize)> {
    let body = bytes.get(start + 1..)?;
    if body.first().is_some_and(u8::is_ascii_digit) {
        return None;
    }
    let len = body
        .iter()
        .position(|b| !(b.is_ascii_alphanumeric() || *b == b'_'))?;
    if body[len] != b'$' {
        return None;
    }
    let tag = std::str::from_utf8(&body[..len]).ok()?;
    Some((tag.to_owned(), start + 1 + len))
}

/// The closing `$tag$` of a dollar-quoted body starting at `idx`.
pub(super) fn matches_tag(bytes: &[u8], idx: usize, tag: &str) -> bool {
    bytes.get(idx) == Some(&b'$')
        && starts_with_at(bytes, idx + 1, tag.as_bytes())
        && bytes.get(idx + 1 + tag.len()) == Some(&b'$')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dollar_quote_tags() {
        assert_eq!(try_start_dollar_quote(b"$$ body $$", 0), Some((String::new(), 1)));
        assert_eq!(try_start_dollar_quote(b"$fn$ x $fn$", 0), Some(("fn".into(), 3)));
        assert_eq!(try_start_dollar_quote(b"$1", 0), None);
        assert_eq!(try_start_dollar_quote(b"$a b$", 0), None);
        assert!(matches_tag(b"x $fn$", 2, "fn"));
        assert!(!matches_tag(b"x $fx$", 2, "fn"));
    }
}

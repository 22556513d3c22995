/// Lexical region the translator is currently inside.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    LineComment,
    BlockComment(u32),
    DollarQuoted(String),
}

/// Outcome of feeding one byte to [`Scanner::step`].
#[derive(Debug, PartialEq, Eq)]
pub(super) enum Step {
    /// The byte at the returned index is plain SQL text outside any literal or comment.
    Code,
    /// The bytes up to and including the returned index belong to a literal or comment.
    Skipped(usize),
}

/// Shared left-to-right walker over SQL text that knows where literals and comments are.
pub(super) struct Scanner<'a> {
    pub(super) bytes: &'a [u8],
    pub(super) state: State,
}

impl<'a> Scanner<'a> {
    pub(super) fn new(sql: &'a str) -> Self {
        Self {
            bytes: sql.as_bytes(),
            state: State::Normal,
        }
    }

    /// Classify the byte at `idx`, advancing the lexical state.
    ///
    /// Returns [`Step::Code`] when the byte is in normal text and the caller may interpret it;
    /// otherwise the last index consumed by the literal/comment machinery.
    pub(super) fn step(&mut self, idx: usize) -> Step {
        use super::parsers::{
            is_block_comment_end, is_block_comment_start, is_line_comment_start, matches_tag,
            try_start_dollar_quote,
        };

        let bytes = self.bytes;
        let b = bytes[idx];
        match self.state {
            State::Normal => match b {
                b'\'' => self.state = State::SingleQuoted,
                b'"' => self.state = State::DoubleQuoted,
                _ if is_line_comment_start(bytes, idx) => self.state = State::LineComment,
                _ if is_block_comment_start(bytes, idx) => {
                    self.state = State::BlockComment(1);
                    return Step::Skipped(idx + 1);
                }
                b'$' => {
                    if let Some((tag, advance)) = try_start_dollar_quote(bytes, idx) {
                        self.state = State::DollarQuoted(tag);
                        return Step::Skipped(advance);
                    }
                    return Step::Code;
                }
                _ => return Step::Code,
            },
            State::SingleQuoted => {
                if b == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        return Step::Skipped(idx + 1); // escaped quote
                    }
                    self.state = State::Normal;
                }
            }
            State::DoubleQuoted => {
                if b == b'"' {
                    if bytes.get(idx + 1) == Some(&b'"') {
                        return Step::Skipped(idx + 1);
                    }
                    self.state = State::Normal;
                }
            }
            State::LineComment => {
                if b == b'\n' {
                    self.state = State::Normal;
                }
            }
            State::BlockComment(depth) => {
                if is_block_comment_start(bytes, idx) {
                    self.state = State::BlockComment(depth + 1);
                    return Step::Skipped(idx + 1);
                } else if is_block_comment_end(bytes, idx) {
                    self.state = if depth == 1 {
                        State::Normal
                    } else {
                        State::BlockComment(depth - 1)
                    };
                    return Step::Skipped(idx + 1);
                }
            }
            State::DollarQuoted(ref tag) => {
                if b == b'$' && matches_tag(bytes, idx, tag) {
                    let end = idx + tag.len() + 1;
                    self.state = State::Normal;
                    return Step::Skipped(end);
                }
            }
        }
        Step::Skipped(idx)
    }
}

pub(super) fn scan_digits(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    scan_while(bytes, start, u8::is_ascii_digit)
}

pub(super) fn scan_identifier(bytes: &[u8], start: usize) -> Option<(usize, &str)> {
    scan_while(bytes, start, |b| b.is_ascii_alphanumeric() || *b == b'_')
}

fn scan_while(bytes: &[u8], start: usize, pred: impl Fn(&u8) -> bool) -> Option<(usize, &str)> {
    let mut idx = start;
    while idx < bytes.len() && pred(&bytes[idx]) {
        idx += 1;
    }
    if idx == start {
        None
    } else {
        std::str::from_utf8(&bytes[start..idx])
            .ok()
            .map(|token| (idx, token))
    }
}

//! Named-parameter translation.
//!
//! `:name` placeholders are rewritten into positional `?` markers and each name is mapped to
//! the 1-based ordinals it occupies. Quoted strings, quoted identifiers, comments, dollar-quoted
//! bodies and `::type` casts are passed through untouched.

use std::borrow::Cow;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, LazyLock, Mutex};

use regex::Regex;

mod parsers;
mod scanner;

use parsers::{is_block_comment_start, is_line_comment_start};
use scanner::{Scanner, State, Step, scan_digits, scan_identifier};

use crate::binding::NamedParams;
use crate::error::NamedSqlError;
use crate::types::SqlValue;

/// Target placeholder style for positional markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// PostgreSQL-style placeholders like `$1`.
    Postgres,
    /// Bare `?` markers, understood natively by `SQLite`.
    Question,
}

/// Name → ordered list of 1-based ordinal positions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamedParamMap {
    positions: HashMap<String, Vec<usize>>,
}

impl NamedParamMap {
    /// Ordinals occupied by `name`, in the order they appear in the SQL text.
    #[must_use]
    pub fn positions(&self, name: &str) -> Option<&[usize]> {
        self.positions.get(name).map(Vec::as_slice)
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }

    /// Distinct parameter names (unordered).
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.positions.keys().map(String::as_str)
    }

    /// Number of distinct names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    fn push(&mut self, name: &str, position: usize) {
        self.positions
            .entry(name.to_owned())
            .or_default()
            .push(position);
    }
}

/// SQL with its named placeholders rewritten to `?`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSql {
    sql: String,
    params: NamedParamMap,
    names_in_order: Vec<String>,
}

impl ParsedSql {
    /// The rewritten SQL with positional `?` markers.
    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &NamedParamMap {
        &self.params
    }

    /// Total number of positional markers produced.
    #[must_use]
    pub fn parameter_count(&self) -> usize {
        self.names_in_order.len()
    }

    /// Name bound at the given 1-based position.
    #[must_use]
    pub fn name_at(&self, position: usize) -> Option<&str> {
        position
            .checked_sub(1)
            .and_then(|idx| self.names_in_order.get(idx))
            .map(String::as_str)
    }

    /// Resolve caller values into positional order.
    ///
    /// Names present in `values` but absent from the SQL are ignored.
    ///
    /// # Errors
    /// Returns [`NamedSqlError::MissingParameter`] for the first placeholder name without a value.
    pub fn bind_values(&self, values: &NamedParams) -> Result<Vec<SqlValue>, NamedSqlError> {
        self.names_in_order
            .iter()
            .map(|name| {
                values
                    .get(name)
                    .cloned()
                    .ok_or_else(|| NamedSqlError::MissingParameter(name.clone()))
            })
            .collect()
    }
}

/// Rewrite `:name` placeholders into `?` markers.
///
/// A placeholder is a single colon followed by one or more ASCII letters, digits or underscores.
/// A run of two or more colons (`::`, `:::`) is never a placeholder start, and a colon followed
/// by anything else is ordinary SQL text.
///
/// ```rust
/// use named_sql::translation::translate_named;
///
/// let parsed = translate_named("select * from t where a = :id or b = :id and c = :name::text");
/// assert_eq!(parsed.sql(), "select * from t where a = ? or b = ? and c = ?::text");
/// assert_eq!(parsed.params().positions("id"), Some(&[1, 2][..]));
/// assert_eq!(parsed.params().positions("name"), Some(&[3][..]));
/// ```
#[must_use]
pub fn translate_named(sql: &str) -> ParsedSql {
    let mut scanner = Scanner::new(sql);
    let bytes = scanner.bytes;
    let mut out = String::with_capacity(sql.len());
    let mut params = NamedParamMap::default();
    let mut names_in_order = Vec::new();
    // start of the pending slice of `sql` not yet copied to `out`
    let mut copied_to = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        match scanner.step(idx) {
            Step::Skipped(last) => idx = last + 1,
            Step::Code if bytes[idx] == b':' => {
                let run = bytes[idx..].iter().take_while(|b| **b == b':').count();
                if run > 1 {
                    idx += run;
                } else if let Some((end, name)) = scan_identifier(bytes, idx + 1) {
                    out.push_str(&sql[copied_to..idx]);
                    out.push('?');
                    names_in_order.push(name.to_owned());
                    params.push(name, names_in_order.len());
                    copied_to = end;
                    idx = end;
                } else {
                    idx += 1;
                }
            }
            Step::Code => idx += 1,
        }
    }
    out.push_str(&sql[copied_to..]);

    tracing::trace!(
        placeholders = names_in_order.len(),
        distinct = params.len(),
        "translated named parameters"
    );

    ParsedSql {
        sql: out,
        params,
        names_in_order,
    }
}

/// Render positional `?` markers in the target backend's style.
///
/// For Postgres, bare `?` becomes `$1`, `$2`, ... in order of appearance and an explicit `?N`
/// becomes `$N`. Markers inside literals and comments are left alone. Returns a borrowed `Cow`
/// when nothing changes.
#[must_use]
pub fn render_positional(sql: &str, target: PlaceholderStyle) -> Cow<'_, str> {
    if target == PlaceholderStyle::Question {
        return Cow::Borrowed(sql);
    }

    let mut scanner = Scanner::new(sql);
    let bytes = scanner.bytes;
    let mut out: Option<String> = None;
    let mut copied_to = 0;
    let mut next_ordinal = 0_usize;
    let mut idx = 0;

    while idx < bytes.len() {
        match scanner.step(idx) {
            Step::Skipped(last) => idx = last + 1,
            Step::Code if bytes[idx] == b'?' => {
                let buf = out.get_or_insert_with(|| String::with_capacity(sql.len() + 8));
                buf.push_str(&sql[copied_to..idx]);
                buf.push('$');
                if let Some((digits_end, digits)) = scan_digits(bytes, idx + 1) {
                    buf.push_str(digits);
                    idx = digits_end;
                } else {
                    next_ordinal += 1;
                    buf.push_str(&next_ordinal.to_string());
                    idx += 1;
                }
                copied_to = idx;
            }
            Step::Code => idx += 1,
        }
    }

    match out {
        Some(mut buf) => {
            buf.push_str(&sql[copied_to..]);
            Cow::Owned(buf)
        }
        None => Cow::Borrowed(sql),
    }
}

static RETURNING_KEYWORD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\breturning\b").expect("RETURNING keyword pattern is a valid regex")
});

/// True when the SQL carries a `RETURNING` clause outside literals and comments.
#[must_use]
pub fn has_returning_clause(sql: &str) -> bool {
    let mut scanner = Scanner::new(sql);
    let bytes = scanner.bytes;
    // literals and comments are blanked so the keyword search only sees code
    let mut scrubbed = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        match scanner.step(idx) {
            Step::Skipped(last) => {
                let end = last.min(bytes.len() - 1);
                scrubbed.extend(std::iter::repeat_n(b' ', end + 1 - idx));
                idx = end + 1;
            }
            Step::Code => {
                scrubbed.push(bytes[idx]);
                idx += 1;
            }
        }
    }
    RETURNING_KEYWORD.is_match(&String::from_utf8_lossy(&scrubbed))
}

/// `sql` without its trailing whitespace, semicolons and comments, so a clause can be appended.
///
/// ```rust
/// use named_sql::translation::trim_statement_end;
///
/// assert_eq!(trim_statement_end("insert into t values ($1); -- audit"), "insert into t values ($1)");
/// assert_eq!(trim_statement_end("select ';' /* done */\n"), "select ';'");
/// ```
#[must_use]
pub fn trim_statement_end(sql: &str) -> &str {
    let mut scanner = Scanner::new(sql);
    let bytes = scanner.bytes;
    let mut end = 0;
    let mut in_comment = false;
    let mut idx = 0;
    while idx < bytes.len() {
        let region_start = scanner.state == State::Normal;
        match scanner.step(idx) {
            Step::Skipped(last) => {
                if region_start {
                    in_comment =
                        is_line_comment_start(bytes, idx) || is_block_comment_start(bytes, idx);
                }
                let last = last.min(bytes.len() - 1);
                if !in_comment {
                    end = last + 1;
                }
                idx = last + 1;
            }
            Step::Code => {
                if !bytes[idx].is_ascii_whitespace() && bytes[idx] != b';' {
                    end = idx + 1;
                }
                idx += 1;
            }
        }
    }
    &sql[..end]
}

/// Default number of distinct SQL texts a [`TranslationCache`] keeps.
pub const DEFAULT_TRANSLATION_CACHE_SIZE: usize = 256;

#[derive(Debug, Default)]
struct CacheState {
    entries: HashMap<String, Arc<ParsedSql>>,
    /// Least recently used first.
    order: VecDeque<String>,
}

/// Per-`Database` memo of translated SQL, keyed by the original text.
///
/// Holds at most `capacity` translations and evicts the least recently used one when full.
/// A capacity of zero disables caching.
#[derive(Debug, Clone)]
pub struct TranslationCache {
    capacity: usize,
    state: Arc<Mutex<CacheState>>,
}

impl Default for TranslationCache {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_TRANSLATION_CACHE_SIZE)
    }
}

impl TranslationCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Translate `sql`, reusing a previous translation of the same text when available.
    #[must_use]
    pub fn translate(&self, sql: &str) -> Arc<ParsedSql> {
        if self.capacity == 0 {
            return Arc::new(translate_named(sql));
        }
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(parsed) = state.entries.get(sql).cloned() {
            if let Some(pos) = state.order.iter().position(|key| key == sql) {
                if let Some(key) = state.order.remove(pos) {
                    state.order.push_back(key);
                }
            }
            return parsed;
        }

        while state.entries.len() >= self.capacity {
            let Some(oldest) = state.order.pop_front() else {
                break;
            };
            state.entries.remove(&oldest);
            tracing::trace!(sql = %oldest, "evicted cached translation");
        }
        let parsed = Arc::new(translate_named(sql));
        state.entries.insert(sql.to_owned(), Arc::clone(&parsed));
        state.order.push_back(sql.to_owned());
        parsed
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().map_or(0, |state| state.entries.len())
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

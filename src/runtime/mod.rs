//! The base machinery every generated parser runs on: the packrat memo table and
//! the [Parser] object with mark/reset, terminal matching, lookahead, forced
//! matches and the left-recursion seed-growth protocol.

mod interp;

#[cfg(test)]
mod __tests__;

pub use interp::CompiledParser;

use crate::{
    CacheKey, Log, Mark, ParsedResult, SyntaxError, SyntaxErrorKind, Token, TokenKind,
    TokenStream, Value,
};
use std::collections::{HashMap, HashSet};

/// An object structure to store parsed results for the Packrat parsing technique.
///
/// Entries are keyed by rule, start position and a small discriminator for
/// overloaded helpers; the stored value is the end position together with the
/// (possibly failed) result. Keys are never persisted across parses.
pub struct Cache {
    entries: HashMap<(CacheKey, Mark, u32), (Mark, Option<Value>)>,
}

impl Cache {
    pub fn root() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn find(&self, key: CacheKey, mark: Mark, extra: u32) -> Option<&(Mark, Option<Value>)> {
        self.entries.get(&(key, mark, extra))
    }

    pub fn insert(
        &mut self,
        key: CacheKey,
        mark: Mark,
        extra: u32,
        end: Mark,
        value: Option<Value>,
    ) -> Option<(Mark, Option<Value>)> {
        self.entries.insert((key, mark, extra), (end, value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// The runtime object generated parsers extend. Owns the token stream and the
/// memo table for exactly one parse.
pub struct Parser<'s> {
    stream: TokenStream<'s>,
    cache: Cache,
    keywords: HashSet<String>,
    soft_keywords: HashSet<String>,
    in_recursive_rule: usize,
    debug: Log<&'static str>,
    filename: Option<String>,
}

impl<'s> Parser<'s> {
    pub fn new(stream: TokenStream<'s>) -> Self {
        Self::with_keywords(stream, HashSet::new(), HashSet::new())
    }

    pub fn with_keywords(
        stream: TokenStream<'s>,
        keywords: HashSet<String>,
        soft_keywords: HashSet<String>,
    ) -> Self {
        let filename = stream
            .path()
            .map(|path| path.to_string_lossy().into_owned());
        Self {
            stream,
            cache: Cache::root(),
            keywords,
            soft_keywords,
            in_recursive_rule: 0,
            debug: Log::None,
            filename,
        }
    }

    /// Set a log label to trace rule entry and results.
    pub fn set_log(&mut self, debug: Log<&'static str>) {
        self.debug = debug;
    }

    pub fn log(&self) -> &Log<&'static str> {
        &self.debug
    }

    pub fn stream(&mut self) -> &mut TokenStream<'s> {
        &mut self.stream
    }

    pub fn cache(&self) -> &Cache {
        &self.cache
    }

    pub fn mark(&self) -> Mark {
        self.stream.mark()
    }

    pub fn reset(&mut self, mark: Mark) {
        self.stream.reset(mark)
    }

    pub fn peek(&mut self) -> Result<Token, SyntaxError> {
        Ok(self.stream.peek()?.clone())
    }

    /// Atomic terminal match. Dispatches `s` as a hard keyword, a token kind
    /// name, an exact operator spelling, a soft keyword, and finally a plain
    /// name, in that order. The index moves only on a match.
    pub fn expect(&mut self, s: &str) -> ParsedResult<Token> {
        let token = self.stream.peek()?;
        let matched = if self.keywords.contains(s) {
            token.kind == TokenKind::Name && token.text == s
        } else if let Some(kind) = TokenKind::from_name(s) {
            token.kind == kind
        } else if crate::lexer::is_exact_operator(s) {
            token.kind == TokenKind::Op && token.text == s
        } else {
            // Soft keywords and unquoted terminals both match a NAME without
            // reserving the identifier.
            token.kind == TokenKind::Name && token.text == s
        };
        if matched {
            Ok(Some(self.stream.advance()?))
        } else {
            Ok(None)
        }
    }

    pub fn expect_kind(&mut self, kind: TokenKind) -> ParsedResult<Token> {
        if self.stream.peek()?.kind == kind {
            Ok(Some(self.stream.advance()?))
        } else {
            Ok(None)
        }
    }

    /// Run `f` without consuming input; true when it matched.
    pub fn positive_lookahead<T, F>(&mut self, f: F) -> Result<bool, SyntaxError>
    where
        F: FnOnce(&mut Self) -> ParsedResult<T>,
    {
        let mark = self.mark();
        let result = f(self)?;
        self.reset(mark);
        Ok(result.is_some())
    }

    /// Run `f` without consuming input; true when it did not match.
    pub fn negative_lookahead<T, F>(&mut self, f: F) -> Result<bool, SyntaxError>
    where
        F: FnOnce(&mut Self) -> ParsedResult<T>,
    {
        let mark = self.mark();
        let result = f(self)?;
        self.reset(mark);
        Ok(result.is_none())
    }

    /// Run `f`; a miss here is a diagnostic, not a backtrack.
    pub fn forced<T, F>(&mut self, f: F, expected: &str) -> Result<T, SyntaxError>
    where
        F: FnOnce(&mut Self) -> ParsedResult<T>,
    {
        match f(self)? {
            Some(value) => Ok(value),
            None => Err(self.forced_failure(expected)),
        }
    }

    /// The diagnostic raised when a forced match misses. An expected `INDENT`
    /// gets the indentation-specific message shape.
    pub fn forced_failure(&mut self, expected: &str) -> SyntaxError {
        let current = self.stream.peek().map(|token| token.clone());
        if expected == "INDENT" {
            if let Some(header) = self.stream.last_non_whitespace() {
                return SyntaxError::at_token(
                    SyntaxErrorKind::Indentation,
                    format!(
                        "expected an indented block after '{}' statement on line {}",
                        header.text, header.start.line
                    ),
                    header,
                )
                .with_filename(self.filename.as_deref());
            }
        }
        match current {
            Ok(token) => SyntaxError::at_token(
                SyntaxErrorKind::Forced,
                format!("expected {}", expected),
                &token,
            ),
            Err(err) => err,
        }
        .with_filename(self.filename.as_deref())
    }

    /// Plant a failed seed for a left-recursive leader at `mark`. Used by
    /// emitted parsers; the closure-based [memoize_left_rec](Self::memoize_left_rec)
    /// does this internally.
    pub fn seed_plant(&mut self, key: CacheKey, mark: Mark) {
        self.cache.insert(key, mark, 0, mark, None);
    }

    /// Replace the seed with a grown result. Unconditional: seed updates are the
    /// one legitimate memo write inside a growth loop.
    pub fn seed_update(&mut self, key: CacheKey, mark: Mark, end: Mark, value: Option<Value>) {
        self.cache.insert(key, mark, 0, end, value);
    }

    pub fn begin_recursion(&mut self) {
        self.in_recursive_rule += 1;
    }

    pub fn end_recursion(&mut self) {
        self.in_recursive_rule -= 1;
    }

    /// Look up a memo entry; on a hit the stream is moved to the stored end.
    pub fn cache_hit(&mut self, key: CacheKey, extra: u32) -> Option<Option<Value>> {
        let mark = self.mark();
        if let Some((end, value)) = self.cache.find(key, mark, extra).cloned() {
            self.reset(end);
            Some(value)
        } else {
            None
        }
    }

    /// Record a memo entry unless a seed-growth loop is running; entries written
    /// mid-growth would be snapshots of a seed that is still moving.
    pub fn cache_store(
        &mut self,
        key: CacheKey,
        extra: u32,
        start: Mark,
        end: Mark,
        value: Option<Value>,
    ) {
        if self.in_recursive_rule == 0 {
            self.cache.insert(key, start, extra, end, value);
        }
    }

    /// Memo-table wrapper: on a hit, restore the saved end and return the saved
    /// value; on a miss, run `f` and record the outcome.
    pub fn memoize<F>(&mut self, key: CacheKey, extra: u32, f: F) -> ParsedResult<Value>
    where
        F: FnOnce(&mut Self) -> ParsedResult<Value>,
    {
        let mark = self.mark();
        if let Some((end, value)) = self.cache.find(key, mark, extra).cloned() {
            self.reset(end);
            return Ok(value);
        }
        let result = f(self)?;
        let end = self.mark();
        if self.in_recursive_rule == 0 {
            self.cache.insert(key, mark, extra, end, result.clone());
        }
        Ok(result)
    }

    /// Seed-growth protocol for left-recursive leader rules: plant a failed seed
    /// at the current position, then rerun the body until it stops extending the
    /// match. Recursive calls inside the body land on the seed.
    pub fn memoize_left_rec<F>(&mut self, key: CacheKey, mut f: F) -> ParsedResult<Value>
    where
        F: FnMut(&mut Self) -> ParsedResult<Value>,
    {
        let mark = self.mark();
        if let Some((end, value)) = self.cache.find(key, mark, 0).cloned() {
            self.reset(end);
            return Ok(value);
        }
        self.cache.insert(key, mark, 0, mark, None);
        let mut last_value: Option<Value> = None;
        let mut last_mark = mark;
        loop {
            self.reset(mark);
            self.in_recursive_rule += 1;
            let result = f(self);
            self.in_recursive_rule -= 1;
            let result = result?;
            let end = self.mark();
            if result.is_none() {
                break;
            }
            if end <= last_mark {
                break;
            }
            last_value = result.clone();
            last_mark = end;
            self.cache.insert(key, mark, 0, end, result);
        }
        self.reset(last_mark);
        Ok(last_value)
    }

    /// The generic top-level diagnostic, anchored at the furthest token reached.
    pub fn make_syntax_error(&mut self, message: &str) -> SyntaxError {
        let furthest = self.stream.furthest();
        self.stream.reset(furthest);
        let err = match self.stream.last_non_whitespace() {
            Some(token) => {
                SyntaxError::at_token(SyntaxErrorKind::Generic, message.to_string(), token)
            }
            None => match self.stream.get(furthest) {
                Some(token) => {
                    SyntaxError::at_token(SyntaxErrorKind::Generic, message.to_string(), token)
                }
                None => SyntaxError::new(SyntaxErrorKind::Generic, message.to_string()),
            },
        };
        err.with_filename(self.filename.as_deref())
    }
}

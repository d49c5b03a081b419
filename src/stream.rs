use crate::lexer::Lexer;
use crate::{Mark, SyntaxError, SyntaxErrorKind, Token, TokenKind, TokenStream};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Relevance filter applied before a token enters the buffer. Non-logical line
/// breaks, comments and whitespace error tokens never reach the parser, and a
/// pair of consecutive logical newlines collapses into one.
fn is_relevant(token: &Token, seen: &[Token]) -> bool {
    match token.kind {
        TokenKind::Nl | TokenKind::Comment => false,
        TokenKind::ErrorToken => !token.text.trim().is_empty(),
        TokenKind::Newline => !matches!(seen.last(), Some(last) if last.kind == TokenKind::Newline),
        _ => true,
    }
}

impl<'s> TokenStream<'s> {
    pub fn new(source: Box<dyn Iterator<Item = Result<Token, SyntaxError>> + 's>) -> Self {
        Self {
            source,
            tokens: Vec::new(),
            index: 0,
            furthest: 0,
            lines: HashMap::new(),
            path: None,
        }
    }

    /// Tokenize an in-memory string.
    pub fn from_text(text: &'s str) -> Self {
        Self::new(Box::new(Lexer::new(text)))
    }

    /// Tokenize an in-memory string read from `path`; source lines for diagnostics
    /// are fetched from disk on demand instead of being retained.
    pub fn from_file_text(text: &'s str, path: &Path) -> Self {
        let mut stream = Self::new(Box::new(Lexer::new(text)));
        stream.path = Some(PathBuf::from(path));
        stream
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Return the token at the current index, pulling from the producer as needed.
    pub fn peek(&mut self) -> Result<&Token, SyntaxError> {
        while self.index == self.tokens.len() {
            match self.source.next() {
                Some(Ok(token)) => {
                    if !is_relevant(&token, &self.tokens) {
                        continue;
                    }
                    if self.path.is_none() && !self.lines.contains_key(&token.start.line) {
                        self.lines.insert(token.start.line, token.line.clone());
                    }
                    self.tokens.push(token);
                }
                Some(Err(err)) => return Err(err),
                None => {
                    return Err(SyntaxError::new(
                        SyntaxErrorKind::Tokenize,
                        "token producer exhausted without an ENDMARKER".to_string(),
                    ))
                }
            }
        }
        Ok(&self.tokens[self.index])
    }

    /// Return the current token and move past it.
    pub fn advance(&mut self) -> Result<Token, SyntaxError> {
        let token = self.peek()?.clone();
        self.index += 1;
        if self.index > self.furthest {
            self.furthest = self.index;
        }
        Ok(token)
    }

    pub fn mark(&self) -> Mark {
        Mark(self.index)
    }

    pub fn reset(&mut self, mark: Mark) {
        debug_assert!(
            mark.0 <= self.tokens.len(),
            "Trying to reset to index '{}' beyond buffer length '{}'",
            mark.0,
            self.tokens.len()
        );
        self.index = mark.0;
    }

    /// The highest index ever advanced past; the anchor for top-level diagnostics.
    pub fn furthest(&self) -> Mark {
        Mark(self.furthest)
    }

    pub fn get(&self, mark: Mark) -> Option<&Token> {
        self.tokens.get(mark.0)
    }

    pub fn buffered_len(&self) -> usize {
        self.tokens.len()
    }

    /// The most recent token strictly before the current index whose kind is not
    /// whitespace-like. Used to anchor error messages on something visible.
    pub fn last_non_whitespace(&self) -> Option<&Token> {
        self.tokens[..self.index]
            .iter()
            .rev()
            .find(|token| !token.kind.is_whitespace())
    }

    /// The n-th source line (1-based), reading from disk when the stream was
    /// constructed from a file.
    pub fn source_line(&self, n: usize) -> Option<String> {
        if let Some(line) = self.lines.get(&n) {
            return Some(line.clone());
        }
        let path = self.path.as_ref()?;
        let file = File::open(path).ok()?;
        BufReader::new(file)
            .lines()
            .nth(n.checked_sub(1)?)?
            .ok()
    }
}

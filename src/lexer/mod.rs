//! A module consisting of the lexical analyzer feeding grammar text and parser input
//! into a [TokenStream](crate::TokenStream).
//!
//! The notation served here is line oriented and indentation sensitive: every logical
//! line ends in a `NEWLINE` token, nesting is reported through `INDENT`/`DEDENT` pairs,
//! and the end of input is a single `ENDMARKER`. Blank lines, comment-only lines and
//! line breaks inside brackets yield the non-logical `NL` kind, which the token stream
//! filters out before parsing.
//!
//! Names, numbers and string literals are matched with compiled regular expressions;
//! operator spellings are matched longest-first through a byte trie.
//!
//! # Example
//! ```
//! use peg_pt::lexer::Lexer;
//! use peg_pt::TokenKind;
//!
//! let kinds: Vec<_> = Lexer::new("x = 1\n")
//!     .map(|t| t.unwrap().kind)
//!     .collect();
//! assert_eq!(
//!     kinds,
//!     vec![
//!         TokenKind::Name,
//!         TokenKind::Op,
//!         TokenKind::Number,
//!         TokenKind::Newline,
//!         TokenKind::Endmarker,
//!     ]
//! );
//! ```

mod op_trie;

#[cfg(test)]
mod __tests__;

use crate::{Position, SyntaxError, SyntaxErrorKind, Token, TokenKind};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashSet, VecDeque};

/// Operator spellings recognized as single `OP` tokens, and accepted by
/// `expect` as exact matches.
pub const EXACT_OPERATORS: &[&str] = &[
    "(", ")", "[", "]", "{", "}", ",", ":", ";", ".", "@", "=", "+", "-", "*", "/", "%", "&",
    "|", "^", "~", "<", ">", "?", "!", "$", "<=", ">=", "==", "!=", "->", ":=", "+=", "-=",
    "*=", "/=", "%=", "@=", "&=", "|=", "^=", "**", "//", "<<", ">>", "**=", "//=", "<<=",
    ">>=", "...",
];

static OP_TRIE: Lazy<OpTrie> = Lazy::new(|| {
    let mut ops = OpTrie::new();
    for spelling in EXACT_OPERATORS {
        ops.insert(spelling.as_bytes());
    }
    ops
});

static OP_SET: Lazy<HashSet<&'static str>> =
    Lazy::new(|| EXACT_OPERATORS.iter().copied().collect());

/// Whether `s` is an operator spelling from the exact token table.
pub fn is_exact_operator(s: &str) -> bool {
    OP_SET.contains(s)
}

pub(crate) struct OpTrie {
    terminal: bool,
    children: Vec<(u8, OpTrie)>,
}

/// The tokenizer. Iterates over [Token]s, reporting tokenization failures as
/// [SyntaxError]s of kind [Tokenize](SyntaxErrorKind::Tokenize).
pub struct Lexer<'s> {
    lines: Vec<&'s str>,
    row: usize,
    col: usize,
    parens: usize,
    indents: Vec<usize>,
    pending: VecDeque<Token>,
    at_line_start: bool,
    tokens_on_line: bool,
    done: bool,
    name_re: Regex,
    number_re: Regex,
    string_re: Regex,
}

impl<'s> Lexer<'s> {
    pub fn new(source: &'s str) -> Self {
        Self {
            lines: source.split_inclusive('\n').collect(),
            row: 0,
            col: 0,
            parens: 0,
            indents: vec![0],
            pending: VecDeque::new(),
            at_line_start: true,
            tokens_on_line: false,
            done: false,
            name_re: Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap(),
            number_re: Regex::new(r"^([0-9]+)(\.[0-9]+)?([eE][+-]?[0-9]+)?").unwrap(),
            string_re: Regex::new(r#"^('([^'\\\n]|\\.)*'|"([^"\\\n]|\\.)*")"#).unwrap(),
        }
    }

    fn current_line(&self) -> &'s str {
        self.lines.get(self.row).copied().unwrap_or("")
    }

    fn make_token(&self, kind: TokenKind, text: &str, start_col: usize, end_col: usize) -> Token {
        Token::new(
            kind,
            text,
            Position::new(self.row + 1, start_col),
            Position::new(self.row + 1, end_col),
            self.current_line(),
        )
    }

    /// Emit the closing NEWLINE, outstanding DEDENTs and the ENDMARKER.
    fn finish(&mut self) -> Token {
        let line = self.row + 1;
        if self.tokens_on_line {
            self.tokens_on_line = false;
            self.pending.push_back(Token::new(
                TokenKind::Newline,
                "",
                Position::new(line, 0),
                Position::new(line, 0),
                "",
            ));
        }
        while self.indents.len() > 1 {
            self.indents.pop();
            self.pending.push_back(Token::new(
                TokenKind::Dedent,
                "",
                Position::new(line, 0),
                Position::new(line, 0),
                "",
            ));
        }
        self.pending.push_back(Token::new(
            TokenKind::Endmarker,
            "",
            Position::new(line, 0),
            Position::new(line, 0),
            "",
        ));
        self.done = true;
        self.pending.pop_front().unwrap()
    }

    /// Handle the indentation prefix of a fresh logical line. Returns a queued
    /// INDENT/DEDENT token when the nesting level changed.
    fn handle_indent(&mut self) -> Result<Option<Token>, SyntaxError> {
        let line = self.current_line();
        let mut width = 0;
        let mut i = 0;
        for byte in line.bytes() {
            match byte {
                b' ' => width += 1,
                b'\t' => width = width / 8 * 8 + 8,
                b'\r' => {}
                _ => break,
            }
            i += 1;
        }
        self.col = i;
        self.at_line_start = false;

        let rest = &line[i..];
        if rest.is_empty() || rest.starts_with('\n') || rest.starts_with('\r') || rest.starts_with('#') {
            // Blank or comment-only line: indentation is not significant.
            return Ok(None);
        }

        let top = *self.indents.last().unwrap();
        if width > top {
            self.indents.push(width);
            return Ok(Some(self.make_token(TokenKind::Indent, &line[..i], 0, i)));
        }
        while width < *self.indents.last().unwrap() {
            self.indents.pop();
            let dedent = self.make_token(TokenKind::Dedent, "", i, i);
            self.pending.push_back(dedent);
        }
        if width != *self.indents.last().unwrap() {
            return Err(SyntaxError::at_position(
                SyntaxErrorKind::Indentation,
                "unindent does not match any outer indentation level".to_string(),
                Position::new(self.row + 1, i),
            ));
        }
        Ok(self.pending.pop_front())
    }

    fn next_token(&mut self) -> Result<Token, SyntaxError> {
        loop {
            if let Some(token) = self.pending.pop_front() {
                return Ok(token);
            }
            if self.row >= self.lines.len() {
                return Ok(self.finish());
            }
            if self.at_line_start && self.parens == 0 {
                if let Some(token) = self.handle_indent()? {
                    return Ok(token);
                }
            }

            let line = self.current_line();
            if self.col >= line.len() {
                // Last line without a trailing line break.
                self.row += 1;
                self.col = 0;
                self.at_line_start = true;
                continue;
            }
            let rest = &line[self.col..];
            let start_col = self.col;

            if rest.starts_with(' ') || rest.starts_with('\t') || rest.starts_with('\r') {
                self.col += 1;
                continue;
            }
            if rest.starts_with('\n') {
                let kind = if self.parens > 0 || !self.tokens_on_line {
                    TokenKind::Nl
                } else {
                    TokenKind::Newline
                };
                let token = self.make_token(kind, "\n", start_col, start_col + 1);
                self.tokens_on_line = false;
                self.row += 1;
                self.col = 0;
                self.at_line_start = true;
                return Ok(token);
            }
            if let Some(comment) = rest.strip_prefix('#').map(|_| rest.trim_end_matches('\n')) {
                self.col += comment.len();
                return Ok(self.make_token(
                    TokenKind::Comment,
                    comment,
                    start_col,
                    start_col + comment.len(),
                ));
            }
            if rest.starts_with('\\') && rest[1..].trim_end().is_empty() {
                // Explicit line join: the logical line continues below.
                self.row += 1;
                self.col = 0;
                self.at_line_start = false;
                continue;
            }

            if let Some(m) = self.name_re.find(rest) {
                self.col += m.end();
                self.tokens_on_line = true;
                return Ok(self.make_token(
                    TokenKind::Name,
                    m.as_str(),
                    start_col,
                    start_col + m.end(),
                ));
            }
            if let Some(m) = self.number_re.find(rest) {
                if !m.as_str().is_empty() {
                    self.col += m.end();
                    self.tokens_on_line = true;
                    return Ok(self.make_token(
                        TokenKind::Number,
                        m.as_str(),
                        start_col,
                        start_col + m.end(),
                    ));
                }
            }
            if let Some(m) = self.string_re.find(rest) {
                self.col += m.end();
                self.tokens_on_line = true;
                return Ok(self.make_token(
                    TokenKind::String,
                    m.as_str(),
                    start_col,
                    start_col + m.end(),
                ));
            }
            if let Some(length) = OP_TRIE.find(rest.as_bytes()) {
                let spelling = &rest[..length];
                match spelling {
                    "(" | "[" | "{" => self.parens += 1,
                    ")" | "]" | "}" => self.parens = self.parens.saturating_sub(1),
                    _ => {}
                }
                self.col += length;
                self.tokens_on_line = true;
                return Ok(self.make_token(TokenKind::Op, spelling, start_col, start_col + length));
            }

            // Unknown character; surfaced to the parser which will fail on it.
            let width = rest.chars().next().map(char::len_utf8).unwrap_or(1);
            let text = &rest[..width];
            self.col += width;
            self.tokens_on_line = true;
            return Ok(self.make_token(
                TokenKind::ErrorToken,
                text,
                start_col,
                start_col + width,
            ));
        }
    }
}

impl<'s> Iterator for Lexer<'s> {
    type Item = Result<Token, SyntaxError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done && self.pending.is_empty() {
            return None;
        }
        match self.next_token() {
            Ok(token) => Some(Ok(token)),
            Err(err) => {
                self.done = true;
                self.pending.clear();
                Some(Err(err))
            }
        }
    }
}

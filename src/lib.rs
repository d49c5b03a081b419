//! Parser generator tool (peg_pt) is a library to turn a Parsing Expression Grammar (PEG)
//! into an executable packrat recursive descent parser.
//!
//! # Overview
//! Grammar formalisms like LALR or LL(1) reject many language constructs that a hand-written
//! recursive descent parser handles without trouble, which is why parsers for languages like
//! Python or Javascript are often custom written and expensive to maintain.
//! PEG keeps the shape of a hand-written parser: ordered choice, unlimited lookahead and
//! syntactic predicates, made tractable by packrat memoization.
//! This library reads a grammar written in a line-oriented, indentation-sensitive notation,
//! analyzes it (nullability, left recursion via strongly connected components, leader
//! selection), desugars repetition and separator-list operators into synthetic helper rules,
//! and compiles the result into a parser that runs over a stream of tokens.
//!
//! # Design
//!
//! The pipeline is split into self-contained stages.
//! A [metagrammar](crate::metagrammar) parser turns grammar text into the typed rule
//! tree of the [grammar] module. The [generator](crate::generator) validates and
//! analyzes the tree, rewrites repetition operators into `_loop0_N`/`_loop1_N`/`_gather_N`
//! helper rules, and projects the result two ways: a compiled rule table interpreted by the
//! [runtime](crate::runtime), and Rust source text for standalone use.
//! The runtime offers the primitives every generated parser needs: mark/reset over a caching
//! [TokenStream], terminal matching with keyword and operator dispatch, positive and negative
//! lookahead, forced matches, memoization and the seed-growth protocol that makes
//! left-recursive rules terminate.
//!
//! # Example
//!
//! ```
//! use peg_pt::generator::{GeneratorConfig, ParserGenerator};
//! use peg_pt::metagrammar::parse_grammar;
//! use peg_pt::Value;
//!
//! let grammar = parse_grammar(
//!     "start: expr NEWLINE $\n\
//!      expr: expr '+' term | term\n\
//!      term: NUMBER\n",
//!     None,
//! )
//! .unwrap();
//!
//! let generator = ParserGenerator::new(grammar, GeneratorConfig::default()).unwrap();
//! let parser = generator.compile().unwrap();
//!
//! let tree = parser.parse_string("1+2+3\n").unwrap();
//! // Left recursion associates to the left.
//! match &tree {
//!     Value::Tuple(items) => assert_eq!(format!("{}", items[0]), "((1 + 2) + 3)"),
//!     other => panic!("unexpected parse result {:?}", other),
//! }
//! ```
//!
//! # License
//! [peg_pt](crate) is provided under the MIT license.

mod error;
pub mod examples;
pub mod generator;
pub mod grammar;
pub mod lexer;
pub mod metagrammar;
pub mod runtime;
mod stream;
mod token;
pub mod util;
mod value;

use std::collections::HashMap;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Classification of a token produced by the [lexer](crate::lexer) or by any other
/// token producer feeding a [TokenStream].
///
/// The parser machinery only ever dispatches on the kind and the token text; the set
/// below is the fixed vocabulary the generator knows how to reference from a grammar.
pub enum TokenKind {
    Name,
    Number,
    String,
    Op,
    /// Logical end of line.
    Newline,
    /// Non-logical end of line (blank line, or a line break inside brackets).
    Nl,
    Indent,
    Dedent,
    Comment,
    TypeComment,
    ErrorToken,
    Endmarker,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Element of the tokenized input.
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub start: Position,
    pub end: Position,
    /// The full source line the token starts on, used for diagnostics.
    pub line: String,
}

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// The line and column information at a point of the input.
///
/// Lines are counted from 1, columns from 0.
pub struct Position {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
/// An opaque index into the token buffer of a [TokenStream], obtained from
/// [mark](TokenStream::mark) and accepted by [reset](TokenStream::reset).
pub struct Mark(pub usize);

#[derive(Debug, Hash, PartialEq, Eq, Clone, Copy, PartialOrd, Ord)]
/// A dense per-rule key used to save and retrieve parsed results for the Packrat
/// parsing technique. Assigned by the generator at compile time.
pub struct CacheKey(pub usize);

#[derive(Clone, PartialEq)]
/// A parse result produced by a compiled parser.
///
/// Token values come straight from the stream; every alternative with more than one
/// captured item yields a [Tuple](Value::Tuple), repetition helpers yield a
/// [Seq](Value::Seq), and a missed optional yields [Null](Value::Null).
pub enum Value {
    Token(Token),
    Tuple(Vec<Value>),
    Seq(Vec<Value>),
    Null,
}

#[derive(Debug)]
/// An error raised while validating, analyzing or desugaring a grammar.
pub struct GrammarError {
    pub message: String,
    pub rule: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Discriminates the unwinding parse-time failures of [SyntaxError].
pub enum SyntaxErrorKind {
    /// Top-level failure at the furthest reached token.
    Generic,
    /// A rule expected an indented block and did not find one.
    Indentation,
    /// A `&&` site did not match.
    Forced,
    /// The token producer itself failed.
    Tokenize,
}

#[derive(Debug, Clone)]
/// An error returned when the parser failed to consume the input.
///
/// Carries the structured location fields for library consumers; [Display](std::fmt::Display)
/// renders the `<path>:<line>:<col>: <message>` form used by the command line driver.
pub struct SyntaxError {
    pub kind: SyntaxErrorKind,
    pub message: String,
    pub lineno: usize,
    pub offset: usize,
    pub end_lineno: usize,
    pub end_offset: usize,
    /// The source line the error points into, when known.
    pub text: Option<String>,
    pub filename: Option<String>,
}

/// A result returned by every parse procedure.
///
/// `Ok(None)` is the ordinary, backtrackable failure: the caller resets the stream and
/// tries something else. `Err` is reserved for the unwinding failures (forced match,
/// indentation, tokenization) which abort the whole parse.
pub type ParsedResult<T> = Result<Option<T>, SyntaxError>;

/// A wrapper implementation of the tokenized input data.
///
/// Tokens are pulled lazily from the producer, filtered for relevance and retained in an
/// append-only buffer, so that a [Mark] stays valid for the lifetime of the stream.
pub struct TokenStream<'s> {
    source: Box<dyn Iterator<Item = Result<Token, SyntaxError>> + 's>,
    tokens: Vec<Token>,
    index: usize,
    furthest: usize,
    lines: HashMap<usize, String>,
    path: Option<PathBuf>,
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
/// A enum structure to assign multiple level debugging to the parser machinery.
pub enum Log<T> {
    None,
    Default(T),
    Success(T),
    Result(T),
    Verbose(T),
}

use crate::{Position, Token, TokenKind};
use std::fmt::{Display, Formatter};

impl TokenKind {
    /// Resolve a grammar-level token reference like `"NAME"` or `"NEWLINE"`.
    ///
    /// Only kinds a grammar may legitimately reference are listed; the bookkeeping
    /// kinds (`NL`, `COMMENT`, `ERRORTOKEN`) never reach a parser.
    pub fn from_name(name: &str) -> Option<TokenKind> {
        match name {
            "NAME" => Some(TokenKind::Name),
            "NUMBER" => Some(TokenKind::Number),
            "STRING" => Some(TokenKind::String),
            "OP" => Some(TokenKind::Op),
            "NEWLINE" => Some(TokenKind::Newline),
            "INDENT" => Some(TokenKind::Indent),
            "DEDENT" => Some(TokenKind::Dedent),
            "TYPE_COMMENT" => Some(TokenKind::TypeComment),
            "ENDMARKER" => Some(TokenKind::Endmarker),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Name => "NAME",
            TokenKind::Number => "NUMBER",
            TokenKind::String => "STRING",
            TokenKind::Op => "OP",
            TokenKind::Newline => "NEWLINE",
            TokenKind::Nl => "NL",
            TokenKind::Indent => "INDENT",
            TokenKind::Dedent => "DEDENT",
            TokenKind::Comment => "COMMENT",
            TokenKind::TypeComment => "TYPE_COMMENT",
            TokenKind::ErrorToken => "ERRORTOKEN",
            TokenKind::Endmarker => "ENDMARKER",
        }
    }

    /// Whitespace-like kinds are skipped when locating a token for diagnostics.
    pub fn is_whitespace(&self) -> bool {
        matches!(
            self,
            TokenKind::Newline | TokenKind::Indent | TokenKind::Dedent | TokenKind::Endmarker
        )
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Token {
    pub fn new(kind: TokenKind, text: &str, start: Position, end: Position, line: &str) -> Self {
        Self {
            kind,
            text: text.to_string(),
            start,
            end,
            line: line.to_string(),
        }
    }

    /// Short one-line rendering used by verbose stream reports.
    pub fn describe(&self) -> String {
        format!(
            "{}.{}: {}:{:?}",
            self.start.line, self.start.column, self.kind, self.text
        )
    }
}

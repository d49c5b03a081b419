use crate::{GrammarError, Position, SyntaxError, SyntaxErrorKind, Token};
use std::fmt::{Display, Formatter};

impl GrammarError {
    pub fn new(message: String) -> Self {
        Self { message, rule: None }
    }

    pub fn in_rule(message: String, rule: &str) -> Self {
        Self {
            message,
            rule: Some(rule.to_string()),
        }
    }
}

impl Display for GrammarError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.rule {
            Some(rule) => write!(f, "GrammarError: {} (in rule '{}')", self.message, rule),
            None => write!(f, "GrammarError: {}", self.message),
        }
    }
}

impl std::error::Error for GrammarError {}

impl SyntaxError {
    pub fn new(kind: SyntaxErrorKind, message: String) -> Self {
        Self {
            kind,
            message,
            lineno: 1,
            offset: 1,
            end_lineno: 1,
            end_offset: 1,
            text: None,
            filename: None,
        }
    }

    /// Build an error pointing at a token, carrying its source line.
    pub fn at_token(kind: SyntaxErrorKind, message: String, token: &Token) -> Self {
        Self {
            kind,
            message,
            lineno: token.start.line,
            offset: token.start.column + 1,
            end_lineno: token.end.line,
            end_offset: token.end.column + 1,
            text: if token.line.is_empty() {
                None
            } else {
                Some(token.line.clone())
            },
            filename: None,
        }
    }

    pub fn at_position(kind: SyntaxErrorKind, message: String, position: Position) -> Self {
        Self {
            kind,
            message,
            lineno: position.line,
            offset: position.column + 1,
            end_lineno: position.line,
            end_offset: position.column + 1,
            text: None,
            filename: None,
        }
    }

    pub fn with_filename(mut self, filename: Option<&str>) -> Self {
        if let Some(name) = filename {
            self.filename = Some(name.to_string());
        }
        self
    }

    pub fn is_indentation(&self) -> bool {
        self.kind == SyntaxErrorKind::Indentation
    }

    pub fn is_forced(&self) -> bool {
        self.kind == SyntaxErrorKind::Forced
    }
}

impl Display for SyntaxError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let path = self.filename.as_deref().unwrap_or("<string>");
        write!(
            f,
            "{}:{}:{}: {}",
            path, self.lineno, self.offset, self.message
        )
    }
}

impl std::error::Error for SyntaxError {}

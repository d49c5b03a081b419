use super::Parser;
use crate::generator::{Atom, CompiledAlt, CompiledGrammar, CompiledRule, MemoKind, RuleKind, Step};
use crate::{CacheKey, ParsedResult, SyntaxError, SyntaxErrorKind, TokenStream, Value};
use std::path::Path;

/// A ready-to-run parser driving the compiled rule table.
///
/// The interpreter realizes the skip-actions semantics: every alternative yields
/// its captured items (the sole item, or a tuple), repetition helpers yield
/// sequences. Action strings are carried through to source emission only.
pub struct CompiledParser {
    grammar: CompiledGrammar,
}

impl CompiledParser {
    pub fn new(grammar: CompiledGrammar) -> Self {
        Self { grammar }
    }

    pub fn grammar(&self) -> &CompiledGrammar {
        &self.grammar
    }

    /// Parse an in-memory string from the `start` rule.
    pub fn parse_string(&self, source: &str) -> Result<Value, SyntaxError> {
        self.parse_stream(TokenStream::from_text(source))
    }

    /// Parse the contents of a file; diagnostics carry the path.
    pub fn parse_file(&self, path: &Path) -> Result<Value, SyntaxError> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            SyntaxError::new(
                SyntaxErrorKind::Tokenize,
                format!("cannot read {}: {}", path.display(), err),
            )
        })?;
        self.parse_stream(TokenStream::from_file_text(&text, path))
    }

    pub fn parse_stream(&self, stream: TokenStream) -> Result<Value, SyntaxError> {
        let mut parser = Parser::with_keywords(
            stream,
            self.grammar.keywords.clone(),
            self.grammar.soft_keywords.clone(),
        );
        match self.start(&mut parser)? {
            Some(value) => Ok(value),
            None => Err(parser.make_syntax_error("invalid syntax")),
        }
    }

    /// Invoke the rule named `start` on an existing parser.
    pub fn start(&self, parser: &mut Parser) -> ParsedResult<Value> {
        match self.grammar.start {
            Some(key) => self.run(parser, key),
            None => Err(SyntaxError::new(
                SyntaxErrorKind::Generic,
                "grammar defines no 'start' rule".to_string(),
            )),
        }
    }

    /// Run one rule at the current position, honoring its memo discipline.
    pub fn run(&self, parser: &mut Parser, key: CacheKey) -> ParsedResult<Value> {
        let rule = self.grammar.rule(key);
        match rule.memo {
            MemoKind::LeftRec => parser.memoize_left_rec(key, |p| self.run_body(p, rule)),
            MemoKind::Memo => parser.memoize(key, 0, |p| self.run_body(p, rule)),
            MemoKind::None => self.run_body(parser, rule),
        }
    }

    fn run_body(&self, parser: &mut Parser, rule: &CompiledRule) -> ParsedResult<Value> {
        match rule.kind {
            RuleKind::Normal => self.run_alts(parser, rule),
            RuleKind::Loop0 | RuleKind::SepLoop => {
                let items = self.run_loop(parser, rule)?;
                Ok(Some(Value::Seq(items)))
            }
            RuleKind::Loop1 => {
                let items = self.run_loop(parser, rule)?;
                if items.is_empty() {
                    Ok(None)
                } else {
                    Ok(Some(Value::Seq(items)))
                }
            }
            RuleKind::Gather => {
                let Some(alt) = rule.alts.first() else {
                    return Ok(None);
                };
                let mark = parser.mark();
                let mut cut = false;
                match self.run_alt(parser, alt, &mut cut)? {
                    Some(mut captured) => {
                        // captured is [element, sequence-of-elements]
                        let rest = captured.pop().unwrap_or(Value::Null);
                        let first = captured.pop().unwrap_or(Value::Null);
                        let mut items = vec![first];
                        if let Value::Seq(tail) = rest {
                            items.extend(tail);
                        }
                        Ok(Some(Value::Seq(items)))
                    }
                    None => {
                        parser.reset(mark);
                        Ok(None)
                    }
                }
            }
        }
    }

    fn run_loop(&self, parser: &mut Parser, rule: &CompiledRule) -> Result<Vec<Value>, SyntaxError> {
        let mut items = Vec::new();
        let Some(alt) = rule.alts.first() else {
            return Ok(items);
        };
        loop {
            let mark = parser.mark();
            let mut cut = false;
            match self.run_alt(parser, alt, &mut cut)? {
                Some(captured) => {
                    if parser.mark() == mark {
                        // Zero-width match; repeating it would never terminate.
                        parser.reset(mark);
                        break;
                    }
                    let value = match rule.kind {
                        RuleKind::SepLoop => captured.into_iter().last().unwrap_or(Value::Null),
                        _ => Value::from_items(captured),
                    };
                    items.push(value);
                }
                None => {
                    parser.reset(mark);
                    break;
                }
            }
        }
        Ok(items)
    }

    /// Ordered choice over the alternatives of one rule, with local cut
    /// commitment: once an alternative passed its `~`, a failure aborts the
    /// whole right-hand side instead of trying later alternatives.
    fn run_alts(&self, parser: &mut Parser, rule: &CompiledRule) -> ParsedResult<Value> {
        let mark = parser.mark();
        for alt in &rule.alts {
            let mut cut = false;
            match self.run_alt(parser, alt, &mut cut)? {
                Some(captured) => return Ok(Some(Value::from_items(captured))),
                None => {
                    parser.reset(mark);
                    if cut {
                        return Ok(None);
                    }
                }
            }
        }
        Ok(None)
    }

    fn run_alt(
        &self,
        parser: &mut Parser,
        alt: &CompiledAlt,
        cut: &mut bool,
    ) -> ParsedResult<Vec<Value>> {
        let mut captured = Vec::new();
        for step in &alt.steps {
            match step {
                Step::Cut => *cut = true,
                Step::Atom { atom, optional, .. } => match self.run_atom(parser, atom)? {
                    Some(value) => captured.push(value),
                    None => {
                        if *optional {
                            captured.push(Value::Null);
                        } else {
                            return Ok(None);
                        }
                    }
                },
                Step::PositiveLookahead(atom) => {
                    let mark = parser.mark();
                    let result = self.run_atom(parser, atom)?;
                    parser.reset(mark);
                    if result.is_none() {
                        return Ok(None);
                    }
                }
                Step::NegativeLookahead(atom) => {
                    let mark = parser.mark();
                    let result = self.run_atom(parser, atom)?;
                    parser.reset(mark);
                    if result.is_some() {
                        return Ok(None);
                    }
                }
                Step::Forced { atom, expected } => match self.run_atom(parser, atom)? {
                    Some(value) => captured.push(value),
                    None => return Err(parser.forced_failure(expected)),
                },
            }
        }
        Ok(Some(captured))
    }

    fn run_atom(&self, parser: &mut Parser, atom: &Atom) -> ParsedResult<Value> {
        match atom {
            Atom::Rule(key) => self.run(parser, *key),
            Atom::Token(kind) => Ok(parser.expect_kind(*kind)?.map(Value::Token)),
            Atom::Expect(text) => Ok(parser.expect(text)?.map(Value::Token)),
            Atom::Empty => Ok(Some(Value::Null)),
        }
    }
}

//! The bootstrap parser for the grammar notation itself.
//!
//! A hand-maintained recursive descent parser in exactly the shape the generator
//! emits: one method per rule, mark/reset between alternatives, local cuts after
//! committing tokens like `=` or an opening bracket. It produces the
//! [grammar](crate::grammar) IR consumed by the [generator](crate::generator).
//!
//! The accepted notation:
//!
//! ```text
//! @meta_name meta_value
//! rule_name[annotation] (memo):
//!     | alternative { action }
//!     | alternative
//! ```
//!
//! where an alternative is a sequence of items with optional `name=` bindings;
//! an item is an atom optionally followed by `?`, `*` or `+`, a `sep.atom+`
//! gather, or a lookahead (`&`, `!`), forced (`&&`) or cut (`~`) prefix; and an
//! atom is a parenthesized group, a bracketed optional, a name or a quoted
//! string. Comments run from `#` to the end of the line.

use crate::grammar::{Alt, Grammar, Item, NamedItem, Rhs, Rule};
use crate::runtime::Parser;
use crate::{ParsedResult, SyntaxError, Token, TokenKind, TokenStream};
use std::path::Path;

/// Parse grammar text into its IR. `path` is only used to label diagnostics.
pub fn parse_grammar(source: &str, path: Option<&Path>) -> Result<Grammar, SyntaxError> {
    let stream = match path {
        Some(path) => TokenStream::from_file_text(source, path),
        None => TokenStream::from_text(source),
    };
    let mut parser = MetaParser {
        p: Parser::new(stream),
    };
    match parser.start()? {
        Some(grammar) => Ok(grammar),
        None => Err(parser.p.make_syntax_error("invalid grammar syntax")),
    }
}

pub struct MetaParser<'s> {
    pub p: Parser<'s>,
}

type MetaTuple = (String, Option<String>);

impl<'s> MetaParser<'s> {
    fn name(&mut self) -> ParsedResult<Token> {
        self.p.expect_kind(TokenKind::Name)
    }

    fn number(&mut self) -> ParsedResult<Token> {
        self.p.expect_kind(TokenKind::Number)
    }

    fn string(&mut self) -> ParsedResult<Token> {
        self.p.expect_kind(TokenKind::String)
    }

    /// start: grammar $
    pub fn start(&mut self) -> ParsedResult<Grammar> {
        let mark = self.p.mark();
        if let Some(grammar) = self.grammar()? {
            if self.p.expect("ENDMARKER")?.is_some() {
                return Ok(Some(grammar));
            }
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// grammar: metas rules | rules
    fn grammar(&mut self) -> ParsedResult<Grammar> {
        let mark = self.p.mark();
        if let Some(metas) = self.metas()? {
            if let Some(rules) = self.rules()? {
                return Ok(Some(Grammar::new(rules, metas)));
            }
        }
        self.p.reset(mark);
        if let Some(rules) = self.rules()? {
            return Ok(Some(Grammar::new(rules, Vec::new())));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// metas: meta metas | meta
    fn metas(&mut self) -> ParsedResult<Vec<MetaTuple>> {
        let mark = self.p.mark();
        if let Some(meta) = self.meta()? {
            if let Some(mut rest) = self.metas()? {
                rest.insert(0, meta);
                return Ok(Some(rest));
            }
        }
        self.p.reset(mark);
        if let Some(meta) = self.meta()? {
            return Ok(Some(vec![meta]));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// meta: "@" NAME NEWLINE | "@" NAME NAME NEWLINE | "@" NAME STRING NEWLINE
    fn meta(&mut self) -> ParsedResult<MetaTuple> {
        let mark = self.p.mark();
        if self.p.expect("@")?.is_some() {
            if let Some(name) = self.name()? {
                if self.p.expect("NEWLINE")?.is_some() {
                    return Ok(Some((name.text, None)));
                }
            }
        }
        self.p.reset(mark);
        if self.p.expect("@")?.is_some() {
            if let Some(a) = self.name()? {
                if let Some(b) = self.name()? {
                    if self.p.expect("NEWLINE")?.is_some() {
                        return Ok(Some((a.text, Some(b.text))));
                    }
                }
            }
        }
        self.p.reset(mark);
        if self.p.expect("@")?.is_some() {
            if let Some(name) = self.name()? {
                if let Some(string) = self.string()? {
                    if self.p.expect("NEWLINE")?.is_some() {
                        return Ok(Some((name.text, Some(unquote(&string.text)))));
                    }
                }
            }
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// rules: rule rules | rule
    fn rules(&mut self) -> ParsedResult<Vec<Rule>> {
        let mark = self.p.mark();
        if let Some(rule) = self.rule()? {
            if let Some(mut rest) = self.rules()? {
                rest.insert(0, rule);
                return Ok(Some(rest));
            }
        }
        self.p.reset(mark);
        if let Some(rule) = self.rule()? {
            return Ok(Some(vec![rule]));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// rule: rulename memoflag? ":" alts NEWLINE INDENT more_alts DEDENT
    ///     | rulename memoflag? ":" NEWLINE INDENT more_alts DEDENT
    ///     | rulename memoflag? ":" alts NEWLINE
    fn rule(&mut self) -> ParsedResult<Rule> {
        let mark = self.p.mark();
        if let Some((name, annotation)) = self.rulename()? {
            let memo = self.memoflag()?.is_some();
            if self.p.expect(":")?.is_some() {
                if let Some(alts) = self.alts()? {
                    if self.p.expect("NEWLINE")?.is_some()
                        && self.p.expect("INDENT")?.is_some()
                    {
                        if let Some(more) = self.more_alts()? {
                            if self.p.expect("DEDENT")?.is_some() {
                                let mut all = alts.alts;
                                all.extend(more.alts);
                                return Ok(Some(Rule::new(
                                    &name,
                                    annotation,
                                    Rhs::new(all),
                                    memo,
                                )));
                            }
                        }
                    }
                }
            }
        }
        self.p.reset(mark);
        if let Some((name, annotation)) = self.rulename()? {
            let memo = self.memoflag()?.is_some();
            if self.p.expect(":")?.is_some()
                && self.p.expect("NEWLINE")?.is_some()
                && self.p.expect("INDENT")?.is_some()
            {
                if let Some(more) = self.more_alts()? {
                    if self.p.expect("DEDENT")?.is_some() {
                        return Ok(Some(Rule::new(&name, annotation, more, memo)));
                    }
                }
            }
        }
        self.p.reset(mark);
        if let Some((name, annotation)) = self.rulename()? {
            let memo = self.memoflag()?.is_some();
            if self.p.expect(":")?.is_some() {
                if let Some(alts) = self.alts()? {
                    if self.p.expect("NEWLINE")?.is_some() {
                        return Ok(Some(Rule::new(&name, annotation, alts, memo)));
                    }
                }
            }
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// rulename: NAME annotation | NAME
    fn rulename(&mut self) -> ParsedResult<(String, Option<String>)> {
        let mark = self.p.mark();
        if let Some(name) = self.name()? {
            if let Some(annotation) = self.annotation()? {
                return Ok(Some((name.text, Some(annotation))));
            }
        }
        self.p.reset(mark);
        if let Some(name) = self.name()? {
            return Ok(Some((name.text, None)));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// memoflag: '(' "memo" ')'
    fn memoflag(&mut self) -> ParsedResult<()> {
        let mark = self.p.mark();
        if self.p.expect("(")?.is_some()
            && self.p.expect("memo")?.is_some()
            && self.p.expect(")")?.is_some()
        {
            return Ok(Some(()));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// alts: alt "|" alts | alt
    fn alts(&mut self) -> ParsedResult<Rhs> {
        let mark = self.p.mark();
        if let Some(alt) = self.alt()? {
            if self.p.expect("|")?.is_some() {
                if let Some(rest) = self.alts()? {
                    let mut all = vec![alt];
                    all.extend(rest.alts);
                    return Ok(Some(Rhs::new(all)));
                }
            }
        }
        self.p.reset(mark);
        if let Some(alt) = self.alt()? {
            return Ok(Some(Rhs::new(vec![alt])));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// more_alts: "|" alts NEWLINE more_alts | "|" alts NEWLINE
    fn more_alts(&mut self) -> ParsedResult<Rhs> {
        let mark = self.p.mark();
        if self.p.expect("|")?.is_some() {
            if let Some(alts) = self.alts()? {
                if self.p.expect("NEWLINE")?.is_some() {
                    if let Some(more) = self.more_alts()? {
                        let mut all = alts.alts;
                        all.extend(more.alts);
                        return Ok(Some(Rhs::new(all)));
                    }
                }
            }
        }
        self.p.reset(mark);
        if self.p.expect("|")?.is_some() {
            if let Some(alts) = self.alts()? {
                if self.p.expect("NEWLINE")?.is_some() {
                    return Ok(Some(alts));
                }
            }
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// alt: items '$' action | items '$' | items action | items
    fn alt(&mut self) -> ParsedResult<Alt> {
        let mark = self.p.mark();
        if let Some(items) = self.items()? {
            if self.p.expect("$")?.is_some() {
                if let Some(action) = self.action()? {
                    let mut items = items;
                    items.push(NamedItem::new(None, Item::Name("ENDMARKER".to_string())));
                    return Ok(Some(Alt::new(items, Some(action))));
                }
            }
        }
        self.p.reset(mark);
        if let Some(items) = self.items()? {
            if self.p.expect("$")?.is_some() {
                let mut items = items;
                items.push(NamedItem::new(None, Item::Name("ENDMARKER".to_string())));
                return Ok(Some(Alt::new(items, None)));
            }
        }
        self.p.reset(mark);
        if let Some(items) = self.items()? {
            if let Some(action) = self.action()? {
                return Ok(Some(Alt::new(items, Some(action))));
            }
        }
        self.p.reset(mark);
        if let Some(items) = self.items()? {
            return Ok(Some(Alt::new(items, None)));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// items: named_item items | named_item
    fn items(&mut self) -> ParsedResult<Vec<NamedItem>> {
        let mark = self.p.mark();
        if let Some(item) = self.named_item()? {
            if let Some(mut rest) = self.items()? {
                rest.insert(0, item);
                return Ok(Some(rest));
            }
        }
        self.p.reset(mark);
        if let Some(item) = self.named_item()? {
            return Ok(Some(vec![item]));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// named_item: NAME annotation '=' ~ item | NAME '=' ~ item | item
    ///           | forced_atom | lookahead
    fn named_item(&mut self) -> ParsedResult<NamedItem> {
        let mark = self.p.mark();
        let mut cut = false;
        if let Some(name) = self.name()? {
            if let Some(annotation) = self.annotation()? {
                if self.p.expect("=")?.is_some() {
                    cut = true;
                    if let Some(item) = self.item()? {
                        return Ok(Some(NamedItem::annotated(
                            Some(name.text),
                            item,
                            Some(annotation),
                        )));
                    }
                }
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        let mut cut = false;
        if let Some(name) = self.name()? {
            if self.p.expect("=")?.is_some() {
                cut = true;
                if let Some(item) = self.item()? {
                    return Ok(Some(NamedItem::new(Some(name.text), item)));
                }
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        if let Some(item) = self.item()? {
            return Ok(Some(NamedItem::new(None, item)));
        }
        self.p.reset(mark);
        if let Some(item) = self.forced_atom()? {
            return Ok(Some(NamedItem::new(None, item)));
        }
        self.p.reset(mark);
        if let Some(item) = self.lookahead()? {
            return Ok(Some(NamedItem::new(None, item)));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// forced_atom: '&' '&' ~ atom
    fn forced_atom(&mut self) -> ParsedResult<Item> {
        let mark = self.p.mark();
        let mut cut = false;
        if self.p.expect("&")?.is_some() && self.p.expect("&")?.is_some() {
            cut = true;
            if let Some(atom) = self.atom()? {
                return Ok(Some(Item::Forced(Box::new(atom))));
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        Ok(None)
    }

    /// lookahead: '&' ~ atom | '!' ~ atom | '~'
    fn lookahead(&mut self) -> ParsedResult<Item> {
        let mark = self.p.mark();
        let mut cut = false;
        if self.p.expect("&")?.is_some() {
            cut = true;
            if let Some(atom) = self.atom()? {
                return Ok(Some(Item::PositiveLookahead(Box::new(atom))));
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        let mut cut = false;
        if self.p.expect("!")?.is_some() {
            cut = true;
            if let Some(atom) = self.atom()? {
                return Ok(Some(Item::NegativeLookahead(Box::new(atom))));
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        if self.p.expect("~")?.is_some() {
            return Ok(Some(Item::Cut));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// item: '[' ~ alts ']' | atom '?' | atom '*' | atom '+' | atom '.' atom '+' | atom
    fn item(&mut self) -> ParsedResult<Item> {
        let mark = self.p.mark();
        let mut cut = false;
        if self.p.expect("[")?.is_some() {
            cut = true;
            if let Some(alts) = self.alts()? {
                if self.p.expect("]")?.is_some() {
                    return Ok(Some(Item::Opt(Box::new(Item::Group(alts)))));
                }
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        if let Some(atom) = self.atom()? {
            if self.p.expect("?")?.is_some() {
                return Ok(Some(Item::Opt(Box::new(atom))));
            }
        }
        self.p.reset(mark);
        if let Some(atom) = self.atom()? {
            if self.p.expect("*")?.is_some() {
                return Ok(Some(Item::Repeat0(Box::new(atom))));
            }
        }
        self.p.reset(mark);
        if let Some(atom) = self.atom()? {
            if self.p.expect("+")?.is_some() {
                return Ok(Some(Item::Repeat1(Box::new(atom))));
            }
        }
        self.p.reset(mark);
        if let Some(separator) = self.atom()? {
            if self.p.expect(".")?.is_some() {
                if let Some(element) = self.atom()? {
                    if self.p.expect("+")?.is_some() {
                        return Ok(Some(Item::Gather {
                            separator: Box::new(separator),
                            element: Box::new(element),
                        }));
                    }
                }
            }
        }
        self.p.reset(mark);
        if let Some(atom) = self.atom()? {
            return Ok(Some(atom));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// atom: '(' ~ alts ')' | NAME | STRING
    fn atom(&mut self) -> ParsedResult<Item> {
        let mark = self.p.mark();
        let mut cut = false;
        if self.p.expect("(")?.is_some() {
            cut = true;
            if let Some(alts) = self.alts()? {
                if self.p.expect(")")?.is_some() {
                    return Ok(Some(Item::Group(alts)));
                }
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        if let Some(name) = self.name()? {
            return Ok(Some(Item::Name(name.text)));
        }
        self.p.reset(mark);
        if let Some(string) = self.string()? {
            return Ok(Some(Item::Literal(string.text)));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// action: "{" ~ target_atoms "}"
    fn action(&mut self) -> ParsedResult<String> {
        let mark = self.p.mark();
        let mut cut = false;
        if self.p.expect("{")?.is_some() {
            cut = true;
            if let Some(atoms) = self.target_atoms()? {
                if self.p.expect("}")?.is_some() {
                    return Ok(Some(atoms));
                }
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        Ok(None)
    }

    /// annotation: "[" ~ target_atoms "]"
    fn annotation(&mut self) -> ParsedResult<String> {
        let mark = self.p.mark();
        let mut cut = false;
        if self.p.expect("[")?.is_some() {
            cut = true;
            if let Some(atoms) = self.target_atoms()? {
                if self.p.expect("]")?.is_some() {
                    return Ok(Some(atoms));
                }
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        Ok(None)
    }

    /// target_atoms: target_atom target_atoms | target_atom
    fn target_atoms(&mut self) -> ParsedResult<String> {
        let mark = self.p.mark();
        if let Some(atom) = self.target_atom()? {
            if let Some(rest) = self.target_atoms()? {
                return Ok(Some(format!("{} {}", atom, rest)));
            }
        }
        self.p.reset(mark);
        if let Some(atom) = self.target_atom()? {
            return Ok(Some(atom));
        }
        self.p.reset(mark);
        Ok(None)
    }

    /// target_atom: "{" ~ target_atoms? "}" | "[" ~ target_atoms? "]"
    ///            | NAME "*" | NAME | NUMBER | STRING | "?" | ":" | !"}" !"]" OP
    fn target_atom(&mut self) -> ParsedResult<String> {
        let mark = self.p.mark();
        let mut cut = false;
        if self.p.expect("{")?.is_some() {
            cut = true;
            let atoms = self.target_atoms()?;
            if self.p.expect("}")?.is_some() {
                return Ok(Some(format!("{{{}}}", atoms.unwrap_or_default())));
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        let mut cut = false;
        if self.p.expect("[")?.is_some() {
            cut = true;
            let atoms = self.target_atoms()?;
            if self.p.expect("]")?.is_some() {
                return Ok(Some(format!("[{}]", atoms.unwrap_or_default())));
            }
        }
        self.p.reset(mark);
        if cut {
            return Ok(None);
        }
        if let Some(name) = self.name()? {
            if self.p.expect("*")?.is_some() {
                return Ok(Some(format!("{}*", name.text)));
            }
        }
        self.p.reset(mark);
        if let Some(name) = self.name()? {
            return Ok(Some(name.text));
        }
        self.p.reset(mark);
        if let Some(number) = self.number()? {
            return Ok(Some(number.text));
        }
        self.p.reset(mark);
        if let Some(string) = self.string()? {
            return Ok(Some(string.text));
        }
        self.p.reset(mark);
        if self.p.expect("?")?.is_some() {
            return Ok(Some("?".to_string()));
        }
        self.p.reset(mark);
        if self.p.expect(":")?.is_some() {
            return Ok(Some(":".to_string()));
        }
        self.p.reset(mark);
        if self.p.negative_lookahead(|p| p.expect("}"))?
            && self.p.negative_lookahead(|p| p.expect("]"))?
        {
            if let Some(op) = self.p.expect_kind(TokenKind::Op)? {
                return Ok(Some(op.text));
            }
        }
        self.p.reset(mark);
        Ok(None)
    }
}

/// Undo the quoting of a STRING token used as a meta value. An unrecognized
/// escape sequence keeps its backslash in the result.
fn unquote(text: &str) -> String {
    let inner = Item::literal_content(text);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some('"') => out.push('"'),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

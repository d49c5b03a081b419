use super::compile::{
    default_binding, Atom, CompiledAlt, CompiledGrammar, CompiledRule, MemoKind, RuleKind, Step,
};
use super::GeneratorConfig;
use crate::grammar::Grammar;
use std::fmt::Write;

const RUST_KEYWORDS: &[&str] = &[
    "as", "async", "await", "box", "break", "const", "continue", "crate", "dyn", "else", "enum",
    "extern", "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move",
    "mut", "pub", "ref", "return", "self", "static", "struct", "super", "trait", "true", "type",
    "unsafe", "use", "where", "while",
];

fn ident(name: &str) -> String {
    if RUST_KEYWORDS.contains(&name) {
        format!("r#{}", name)
    } else {
        name.to_string()
    }
}

struct Emitter {
    out: String,
    level: usize,
}

impl Emitter {
    fn new() -> Self {
        Self {
            out: String::new(),
            level: 0,
        }
    }

    fn print(&mut self, line: &str) -> std::fmt::Result {
        if line.is_empty() {
            writeln!(self.out)
        } else {
            writeln!(self.out, "{}{}", "    ".repeat(self.level), line)
        }
    }

    fn print_block(&mut self, text: &str) -> std::fmt::Result {
        for line in text.lines() {
            self.print(line)?;
        }
        Ok(())
    }

    fn indent(&mut self) {
        self.level += 1;
    }

    fn dedent(&mut self) {
        self.level -= 1;
    }
}

/// De-duplicated local variable names within one alternative.
struct Locals {
    names: Vec<String>,
}

impl Locals {
    fn new() -> Self {
        Self { names: Vec::new() }
    }

    fn dedupe(&mut self, base: &str) -> String {
        let base = ident(base);
        if !self.names.iter().any(|name| *name == base) {
            self.names.push(base.clone());
            return base;
        }
        let mut counter = 0;
        loop {
            counter += 1;
            let candidate = format!("{}_{}", base, counter);
            if !self.names.iter().any(|name| *name == candidate) {
                self.names.push(candidate.clone());
                return candidate;
            }
        }
    }
}

pub(super) fn emit(
    grammar: &Grammar,
    compiled: &CompiledGrammar,
    config: &GeneratorConfig,
) -> Result<String, std::fmt::Error> {
    let class = grammar.meta("class").unwrap_or("GeneratedParser");
    let mut e = Emitter::new();

    e.print("// @generated by peg-pt")?;
    if let Some(header) = grammar.meta("header") {
        e.print_block(header)?;
    }
    if let Some(subheader) = grammar.meta("subheader") {
        e.print_block(subheader)?;
    }
    e.print("")?;
    e.print("use peg_pt::runtime::Parser;")?;
    e.print("use peg_pt::{CacheKey, ParsedResult, SyntaxError, TokenKind, TokenStream, Value};")?;
    e.print("")?;
    e.print(&format!("pub struct {}<'s> {{", class))?;
    e.indent();
    e.print("pub p: Parser<'s>,")?;
    e.dedent();
    e.print("}")?;
    e.print("")?;
    e.print(&format!("impl<'s> {}<'s> {{", class))?;
    e.indent();

    let mut keywords: Vec<&String> = compiled.keywords.iter().collect();
    keywords.sort();
    let mut soft_keywords: Vec<&String> = compiled.soft_keywords.iter().collect();
    soft_keywords.sort();
    e.print(&format!(
        "pub const KEYWORDS: &'static [&'static str] = &[{}];",
        keywords
            .iter()
            .map(|s| format!("{:?}", s))
            .collect::<Vec<_>>()
            .join(", ")
    ))?;
    e.print(&format!(
        "pub const SOFT_KEYWORDS: &'static [&'static str] = &[{}];",
        soft_keywords
            .iter()
            .map(|s| format!("{:?}", s))
            .collect::<Vec<_>>()
            .join(", ")
    ))?;
    e.print("")?;
    e.print("pub fn new(stream: TokenStream<'s>) -> Self {")?;
    e.indent();
    e.print("let keywords = Self::KEYWORDS.iter().map(|s| s.to_string()).collect();")?;
    e.print("let soft_keywords = Self::SOFT_KEYWORDS.iter().map(|s| s.to_string()).collect();")?;
    e.print("Self { p: Parser::with_keywords(stream, keywords, soft_keywords) }")?;
    e.dedent();
    e.print("}")?;

    if compiled.start.is_some() {
        e.print("")?;
        e.print("pub fn parse_string(source: &str) -> Result<Value, SyntaxError> {")?;
        e.indent();
        e.print("let mut parser = Self::new(TokenStream::from_text(source));")?;
        e.print("match parser.start()? {")?;
        e.indent();
        e.print("Some(value) => Ok(value),")?;
        e.print("None => Err(parser.p.make_syntax_error(\"invalid syntax\")),")?;
        e.dedent();
        e.print("}")?;
        e.dedent();
        e.print("}")?;
        e.print("")?;
        e.print("pub fn parse_file(path: &std::path::Path) -> Result<Value, SyntaxError> {")?;
        e.indent();
        e.print("let text = std::fs::read_to_string(path).map_err(|err| {")?;
        e.indent();
        e.print("SyntaxError::new(peg_pt::SyntaxErrorKind::Tokenize, format!(\"cannot read {}: {}\", path.display(), err))")?;
        e.dedent();
        e.print("})?;")?;
        e.print("let mut parser = Self::new(TokenStream::from_file_text(&text, path));")?;
        e.print("match parser.start()? {")?;
        e.indent();
        e.print("Some(value) => Ok(value),")?;
        e.print("None => Err(parser.p.make_syntax_error(\"invalid syntax\")),")?;
        e.dedent();
        e.print("}")?;
        e.dedent();
        e.print("}")?;
    }

    for rule in &compiled.rules {
        e.print("")?;
        emit_rule(&mut e, compiled, rule, config)?;
    }

    e.dedent();
    e.print("}")?;
    if let Some(trailer) = grammar.meta("trailer") {
        e.print("")?;
        e.print_block(trailer)?;
    }
    Ok(e.out)
}

fn emit_rule(
    e: &mut Emitter,
    compiled: &CompiledGrammar,
    rule: &CompiledRule,
    config: &GeneratorConfig,
) -> Result<(), std::fmt::Error> {
    let method = ident(&rule.name);
    let raw = format!("{}_raw", rule.name);
    let visibility = if rule.name.starts_with('_') { "fn" } else { "pub fn" };
    let key = format!("CacheKey({})", rule.key.0);

    e.print(&format!("/// {}", rule.doc))?;
    match rule.memo {
        MemoKind::Memo => {
            e.print(&format!(
                "{} {}(&mut self) -> ParsedResult<Value> {{",
                visibility, method
            ))?;
            e.indent();
            e.print(&format!("if let Some(value) = self.p.cache_hit({}, 0) {{", key))?;
            e.indent();
            e.print("return Ok(value);")?;
            e.dedent();
            e.print("}")?;
            e.print("let mark = self.p.mark();")?;
            e.print(&format!("let result = self.{}()?;", raw))?;
            e.print(&format!(
                "self.p.cache_store({}, 0, mark, self.p.mark(), result.clone());",
                key
            ))?;
            e.print("Ok(result)")?;
            e.dedent();
            e.print("}")?;
        }
        MemoKind::LeftRec => {
            e.print(&format!(
                "{} {}(&mut self) -> ParsedResult<Value> {{",
                visibility, method
            ))?;
            e.indent();
            e.print(&format!("if let Some(value) = self.p.cache_hit({}, 0) {{", key))?;
            e.indent();
            e.print("return Ok(value);")?;
            e.dedent();
            e.print("}")?;
            e.print("let mark = self.p.mark();")?;
            e.print(&format!("self.p.seed_plant({}, mark);", key))?;
            e.print("let mut last_value: Option<Value> = None;")?;
            e.print("let mut last_mark = mark;")?;
            e.print("loop {")?;
            e.indent();
            e.print("self.p.reset(mark);")?;
            e.print("self.p.begin_recursion();")?;
            e.print(&format!("let result = self.{}();", raw))?;
            e.print("self.p.end_recursion();")?;
            e.print("let result = result?;")?;
            e.print("let end = self.p.mark();")?;
            e.print("if result.is_none() || end <= last_mark {")?;
            e.indent();
            e.print("break;")?;
            e.dedent();
            e.print("}")?;
            e.print("last_value = result.clone();")?;
            e.print("last_mark = end;")?;
            e.print(&format!("self.p.seed_update({}, mark, end, result);", key))?;
            e.dedent();
            e.print("}")?;
            e.print("self.p.reset(last_mark);")?;
            e.print("Ok(last_value)")?;
            e.dedent();
            e.print("}")?;
        }
        MemoKind::None => {
            e.print(&format!(
                "{} {}(&mut self) -> ParsedResult<Value> {{",
                visibility, method
            ))?;
            e.indent();
            e.print(&format!("self.{}()", raw))?;
            e.dedent();
            e.print("}")?;
        }
    }

    e.print("")?;
    match rule.kind {
        RuleKind::Normal => emit_normal_body(e, compiled, rule, config, &raw),
        RuleKind::Loop0 | RuleKind::Loop1 | RuleKind::SepLoop => {
            emit_loop_body(e, compiled, rule, config, &raw)
        }
        RuleKind::Gather => emit_gather_body(e, compiled, rule, &raw),
    }
}

fn emit_normal_body(
    e: &mut Emitter,
    compiled: &CompiledGrammar,
    rule: &CompiledRule,
    config: &GeneratorConfig,
    raw: &str,
) -> Result<(), std::fmt::Error> {
    e.print(&format!("fn {}(&mut self) -> ParsedResult<Value> {{", raw))?;
    e.indent();
    e.print("let mark = self.p.mark();")?;
    for (index, alt) in rule.alts.iter().enumerate() {
        let label = format!("'alt{}", index);
        let has_cut = alt.steps.iter().any(|step| matches!(step, Step::Cut));
        if has_cut {
            e.print("let mut cut = false;")?;
        }
        e.print(&format!("{}: {{", label))?;
        e.indent();
        let mut locals = Locals::new();
        let fail = format!("break {}", label);
        let captured = emit_steps(e, compiled, &alt.steps, &mut locals, &fail)?;
        let value = alt_value(rule, alt, config, &captured);
        e.print(&format!("return Ok(Some({}));", value))?;
        e.dedent();
        e.print("}")?;
        e.print("self.p.reset(mark);")?;
        if has_cut {
            e.print("if cut {")?;
            e.indent();
            e.print("return Ok(None);")?;
            e.dedent();
            e.print("}")?;
        }
    }
    e.print("Ok(None)")?;
    e.dedent();
    e.print("}")?;
    Ok(())
}

fn emit_loop_body(
    e: &mut Emitter,
    compiled: &CompiledGrammar,
    rule: &CompiledRule,
    config: &GeneratorConfig,
    raw: &str,
) -> Result<(), std::fmt::Error> {
    e.print(&format!("fn {}(&mut self) -> ParsedResult<Value> {{", raw))?;
    e.indent();
    e.print("let mut children: Vec<Value> = Vec::new();")?;
    e.print("loop {")?;
    e.indent();
    e.print("let mark = self.p.mark();")?;
    e.print("let item: Option<Value> = 'one: {")?;
    e.indent();
    let mut locals = Locals::new();
    let alt = &rule.alts[0];
    let captured = emit_steps(e, compiled, &alt.steps, &mut locals, "break 'one None")?;
    let value = match rule.kind {
        RuleKind::SepLoop if !config.skip_actions => alt
            .action
            .clone()
            .unwrap_or_else(|| captured.last().cloned().unwrap_or_else(|| "Value::Null".to_string())),
        RuleKind::SepLoop => captured
            .last()
            .cloned()
            .unwrap_or_else(|| "Value::Null".to_string()),
        _ => default_value(&captured),
    };
    e.print(&format!("Some({})", value))?;
    e.dedent();
    e.print("};")?;
    e.print("match item {")?;
    e.indent();
    e.print("Some(value) => {")?;
    e.indent();
    e.print("if self.p.mark() == mark {")?;
    e.indent();
    e.print("self.p.reset(mark);")?;
    e.print("break;")?;
    e.dedent();
    e.print("}")?;
    e.print("children.push(value);")?;
    e.dedent();
    e.print("}")?;
    e.print("None => {")?;
    e.indent();
    e.print("self.p.reset(mark);")?;
    e.print("break;")?;
    e.dedent();
    e.print("}")?;
    e.dedent();
    e.print("}")?;
    e.dedent();
    e.print("}")?;
    if rule.kind == RuleKind::Loop1 {
        e.print("if children.is_empty() {")?;
        e.indent();
        e.print("return Ok(None);")?;
        e.dedent();
        e.print("}")?;
    }
    e.print("Ok(Some(Value::Seq(children)))")?;
    e.dedent();
    e.print("}")?;
    Ok(())
}

fn emit_gather_body(
    e: &mut Emitter,
    compiled: &CompiledGrammar,
    rule: &CompiledRule,
    raw: &str,
) -> Result<(), std::fmt::Error> {
    e.print(&format!("fn {}(&mut self) -> ParsedResult<Value> {{", raw))?;
    e.indent();
    e.print("let mark = self.p.mark();")?;
    e.print("'alt0: {")?;
    e.indent();
    let mut locals = Locals::new();
    let captured = emit_steps(e, compiled, &rule.alts[0].steps, &mut locals, "break 'alt0")?;
    let first = captured.first().cloned().unwrap_or_else(|| "Value::Null".to_string());
    let seq = captured.last().cloned().unwrap_or_else(|| "Value::Null".to_string());
    e.print(&format!("let mut children = vec![{}];", first))?;
    e.print(&format!("if let Value::Seq(rest) = {} {{", seq))?;
    e.indent();
    e.print("children.extend(rest);")?;
    e.dedent();
    e.print("}")?;
    e.print("return Ok(Some(Value::Seq(children)));")?;
    e.dedent();
    e.print("}")?;
    e.print("self.p.reset(mark);")?;
    e.print("Ok(None)")?;
    e.dedent();
    e.print("}")?;
    Ok(())
}

/// Emit the item attempts of one alternative; returns the captured local names.
fn emit_steps(
    e: &mut Emitter,
    compiled: &CompiledGrammar,
    steps: &[Step],
    locals: &mut Locals,
    fail: &str,
) -> Result<Vec<String>, std::fmt::Error> {
    let mut captured = Vec::new();
    for step in steps {
        match step {
            Step::Cut => e.print("cut = true;")?,
            Step::Atom {
                atom,
                name,
                optional,
            } => {
                let base = name.clone().unwrap_or_else(|| default_binding(atom, compiled));
                let var = locals.dedupe(&base);
                let expr = atom_expr(compiled, atom);
                if *optional {
                    e.print(&format!("let {} = ({}).unwrap_or(Value::Null);", var, expr))?;
                } else {
                    e.print(&format!(
                        "let {} = match {} {{ Some(value) => value, None => {} }};",
                        var, expr, fail
                    ))?;
                }
                captured.push(var);
            }
            Step::PositiveLookahead(atom) => {
                let mark_var = locals.dedupe("_la_mark");
                let found_var = locals.dedupe("_found");
                e.print(&format!("let {} = self.p.mark();", mark_var))?;
                e.print(&format!(
                    "let {} = ({}).is_some();",
                    found_var,
                    atom_expr(compiled, atom)
                ))?;
                e.print(&format!("self.p.reset({});", mark_var))?;
                e.print(&format!("if !{} {{ {}; }}", found_var, fail))?;
            }
            Step::NegativeLookahead(atom) => {
                let mark_var = locals.dedupe("_la_mark");
                let found_var = locals.dedupe("_found");
                e.print(&format!("let {} = self.p.mark();", mark_var))?;
                e.print(&format!(
                    "let {} = ({}).is_some();",
                    found_var,
                    atom_expr(compiled, atom)
                ))?;
                e.print(&format!("self.p.reset({});", mark_var))?;
                e.print(&format!("if {} {{ {}; }}", found_var, fail))?;
            }
            Step::Forced { atom, expected } => {
                let var = locals.dedupe(&default_binding(atom, compiled));
                e.print(&format!(
                    "let {} = match {} {{ Some(value) => value, None => return Err(self.p.forced_failure({:?})) }};",
                    var,
                    atom_expr(compiled, atom),
                    expected
                ))?;
                captured.push(var);
            }
        }
    }
    Ok(captured)
}

fn atom_expr(compiled: &CompiledGrammar, atom: &Atom) -> String {
    match atom {
        Atom::Rule(key) => format!("self.{}()?", ident(&compiled.rule(*key).name)),
        Atom::Token(kind) => format!(
            "self.p.expect_kind(TokenKind::{:?})?.map(Value::Token)",
            kind
        ),
        Atom::Expect(text) => format!("self.p.expect({:?})?.map(Value::Token)", text),
        Atom::Empty => "Some(Value::Null)".to_string(),
    }
}

fn default_value(captured: &[String]) -> String {
    match captured.len() {
        0 => "Value::Null".to_string(),
        1 => captured[0].clone(),
        _ => format!("Value::from_items(vec![{}])", captured.join(", ")),
    }
}

fn alt_value(
    rule: &CompiledRule,
    alt: &CompiledAlt,
    config: &GeneratorConfig,
    captured: &[String],
) -> String {
    if !config.skip_actions {
        if let Some(action) = &alt.action {
            return action.clone();
        }
        if rule.invalid {
            return config.unreachable_marker.clone();
        }
    }
    default_value(captured)
}

//! The parser generator back end: validates and analyzes a grammar, desugars
//! repetition operators into synthetic helper rules, and projects the result
//! into an executable rule table (see [compile](CompiledGrammar)) or into Rust
//! source text.

mod compile;
mod desugar;
mod emit;

#[cfg(test)]
mod __tests__;

pub use compile::{Atom, CompiledAlt, CompiledGrammar, CompiledRule, MemoKind, RuleKind, Step};

use crate::grammar::{check_grammar, compute_left_recursives, compute_nullables, Grammar, Item, Rhs};
use crate::runtime::CompiledParser;
use crate::GrammarError;
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Ignore `{ action }` clauses and emit default-value bodies.
    pub skip_actions: bool,
    /// Compile the `invalid_*` error-recovery rules instead of dropping them.
    pub call_invalid_rules: bool,
    /// Expression emitted as the default body of an `invalid_*` alternative, so
    /// host code raises instead of returning.
    pub unreachable_marker: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            skip_actions: false,
            call_invalid_rules: false,
            unreachable_marker: "unreachable!()".to_string(),
        }
    }
}

/// Drives the whole back end. Construction runs validation, the nullability
/// fixed point, left-recursion classification and desugaring; afterwards the
/// grammar held here is the desugared one.
pub struct ParserGenerator {
    grammar: Grammar,
    config: GeneratorConfig,
    keywords: BTreeSet<String>,
    soft_keywords: BTreeSet<String>,
}

impl ParserGenerator {
    pub fn new(mut grammar: Grammar, config: GeneratorConfig) -> Result<Self, GrammarError> {
        check_grammar(&grammar)?;
        compute_nullables(&mut grammar);
        compute_left_recursives(&mut grammar)?;
        desugar::desugar(&mut grammar);
        let (keywords, soft_keywords) = collect_keywords(&grammar);
        Ok(Self {
            grammar,
            config,
            keywords,
            soft_keywords,
        })
    }

    pub fn grammar(&self) -> &Grammar {
        &self.grammar
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Hard keywords harvested from single-quoted identifier literals.
    pub fn keywords(&self) -> &BTreeSet<String> {
        &self.keywords
    }

    /// Soft keywords harvested from double-quoted identifier literals.
    pub fn soft_keywords(&self) -> &BTreeSet<String> {
        &self.soft_keywords
    }

    /// Project the grammar into the rule table the runtime interprets.
    pub fn compiled_grammar(&self) -> Result<CompiledGrammar, GrammarError> {
        compile::compile(
            &self.grammar,
            &self.config,
            &self.keywords,
            &self.soft_keywords,
        )
    }

    /// Build a ready-to-run parser over the compiled table.
    pub fn compile(&self) -> Result<CompiledParser, GrammarError> {
        self.compiled_grammar().map(CompiledParser::new)
    }

    /// Render the grammar as Rust source implementing the same parser.
    pub fn emit_rust(&self) -> Result<String, GrammarError> {
        let compiled = self.compiled_grammar()?;
        emit::emit(&self.grammar, &compiled, &self.config)
            .map_err(|err| GrammarError::new(format!("emission failed: {}", err)))
    }
}

/// Scan literals for keyword spellings. Quote style decides reservation:
/// `'if'` is a hard keyword, `"match"` stays contextual.
fn collect_keywords(grammar: &Grammar) -> (BTreeSet<String>, BTreeSet<String>) {
    let mut keywords = BTreeSet::new();
    let mut soft_keywords = BTreeSet::new();
    for rule in grammar.iter() {
        collect_from_rhs(&rule.rhs, &mut keywords, &mut soft_keywords);
    }
    (keywords, soft_keywords)
}

fn collect_from_rhs(rhs: &Rhs, keywords: &mut BTreeSet<String>, soft: &mut BTreeSet<String>) {
    for alt in &rhs.alts {
        for named in &alt.items {
            collect_from_item(&named.item, keywords, soft);
        }
    }
}

fn collect_from_item(item: &Item, keywords: &mut BTreeSet<String>, soft: &mut BTreeSet<String>) {
    match item {
        Item::Literal(literal) => {
            if Item::is_keyword_literal(literal) {
                let content = Item::literal_content(literal).to_string();
                if literal.starts_with('\'') {
                    keywords.insert(content);
                } else {
                    soft.insert(content);
                }
            }
        }
        Item::Name(_) | Item::Cut => {}
        Item::Group(rhs) => collect_from_rhs(rhs, keywords, soft),
        Item::Opt(inner)
        | Item::Repeat0(inner)
        | Item::Repeat1(inner)
        | Item::PositiveLookahead(inner)
        | Item::NegativeLookahead(inner)
        | Item::Forced(inner) => collect_from_item(inner, keywords, soft),
        Item::Gather { separator, element } => {
            collect_from_item(separator, keywords, soft);
            collect_from_item(element, keywords, soft);
        }
    }
}

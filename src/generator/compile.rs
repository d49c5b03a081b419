use super::GeneratorConfig;
use crate::grammar::{Grammar, Item, Rule, SynthKind};
use crate::{CacheKey, GrammarError, TokenKind};
use std::collections::{BTreeSet, HashMap, HashSet};

/// The compiled projection of a desugared grammar: one table entry per rule,
/// isomorphic to the IR, interpreted by the runtime.
pub struct CompiledGrammar {
    pub rules: Vec<CompiledRule>,
    pub start: Option<CacheKey>,
    pub keywords: HashSet<String>,
    pub soft_keywords: HashSet<String>,
}

pub struct CompiledRule {
    pub name: String,
    pub key: CacheKey,
    pub kind: RuleKind,
    pub memo: MemoKind,
    pub invalid: bool,
    /// `name: rhs` rendering of the source rule, for emitted doc comments.
    pub doc: String,
    pub alts: Vec<CompiledAlt>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// What a rule's body computes. Synthetic repetition helpers collect values in
/// loops rather than running their alternatives once.
pub enum RuleKind {
    Normal,
    /// Zero or more matches of the single alternative; always succeeds.
    Loop0,
    /// One or more matches.
    Loop1,
    /// `separator element` yielding the element; the repeated tail of a gather.
    SepLoop,
    /// `element (separator element)*` assembled into one sequence.
    Gather,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemoKind {
    None,
    Memo,
    /// Leader of a left-recursive SCC: wrapped in the seed-growth protocol.
    LeftRec,
}

pub struct CompiledAlt {
    pub steps: Vec<Step>,
    pub action: Option<String>,
}

pub enum Step {
    Atom {
        atom: Atom,
        /// Local binding emitted for the matched value.
        name: Option<String>,
        /// An optional item captures `Null` instead of failing the alternative.
        optional: bool,
    },
    PositiveLookahead(Atom),
    NegativeLookahead(Atom),
    Forced {
        atom: Atom,
        /// Surface rendering used in the "expected ..." diagnostic.
        expected: String,
    },
    Cut,
}

pub enum Atom {
    Rule(CacheKey),
    Token(TokenKind),
    /// Literal content dispatched through `expect` at parse time.
    Expect(String),
    /// The empty string literal: succeeds without consuming.
    Empty,
}

impl CompiledGrammar {
    pub fn rule(&self, key: CacheKey) -> &CompiledRule {
        &self.rules[key.0]
    }

    pub fn rule_by_name(&self, name: &str) -> Option<&CompiledRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }
}

pub(super) fn compile(
    grammar: &Grammar,
    config: &GeneratorConfig,
    keywords: &BTreeSet<String>,
    soft_keywords: &BTreeSet<String>,
) -> Result<CompiledGrammar, GrammarError> {
    let included: Vec<&Rule> = grammar
        .iter()
        .filter(|rule| config.call_invalid_rules || !rule.is_invalid())
        .collect();

    let mut ids: HashMap<&str, CacheKey> = HashMap::new();
    for (index, rule) in included.iter().enumerate() {
        ids.insert(rule.name.as_str(), CacheKey(index));
    }

    let mut rules = Vec::with_capacity(included.len());
    for rule in &included {
        rules.push(compile_rule(rule, grammar, config, &ids)?);
    }

    Ok(CompiledGrammar {
        rules,
        start: ids.get("start").copied(),
        keywords: keywords.iter().cloned().collect(),
        soft_keywords: soft_keywords.iter().cloned().collect(),
    })
}

fn compile_rule(
    rule: &Rule,
    grammar: &Grammar,
    config: &GeneratorConfig,
    ids: &HashMap<&str, CacheKey>,
) -> Result<CompiledRule, GrammarError> {
    let kind = match rule.synth {
        Some(SynthKind::Loop0) => RuleKind::Loop0,
        Some(SynthKind::Loop1) => RuleKind::Loop1,
        Some(SynthKind::SepLoop) => RuleKind::SepLoop,
        Some(SynthKind::Gather) => RuleKind::Gather,
        Some(SynthKind::Tmp) | None => RuleKind::Normal,
    };
    let memo = if rule.leader {
        MemoKind::LeftRec
    } else {
        MemoKind::Memo
    };

    let rhs = rule.flatten();
    let mut alts = Vec::new();
    for alt in &rhs.alts {
        if !config.call_invalid_rules && alt_references_invalid(grammar, alt) {
            continue;
        }
        let mut steps = Vec::new();
        for named in &alt.items {
            steps.push(compile_step(rule, named, ids)?);
        }
        alts.push(CompiledAlt {
            steps,
            action: alt.action.clone(),
        });
    }

    Ok(CompiledRule {
        name: rule.name.clone(),
        key: ids[rule.name.as_str()],
        kind,
        memo,
        invalid: rule.is_invalid(),
        doc: format!("{}: {}", rule.name, rhs),
        alts,
    })
}

fn alt_references_invalid(grammar: &Grammar, alt: &crate::grammar::Alt) -> bool {
    fn item_refs_invalid(grammar: &Grammar, item: &Item) -> bool {
        match item {
            Item::Name(name) => {
                name.starts_with("invalid_")
                    || grammar.get(name).map_or(false, |rule| rule.is_invalid())
            }
            Item::Literal(_) | Item::Cut => false,
            Item::Group(rhs) => rhs.alts.iter().any(|alt| {
                alt.items
                    .iter()
                    .any(|ni| item_refs_invalid(grammar, &ni.item))
            }),
            Item::Opt(inner)
            | Item::Repeat0(inner)
            | Item::Repeat1(inner)
            | Item::PositiveLookahead(inner)
            | Item::NegativeLookahead(inner)
            | Item::Forced(inner) => item_refs_invalid(grammar, inner),
            Item::Gather { separator, element } => {
                item_refs_invalid(grammar, separator) || item_refs_invalid(grammar, element)
            }
        }
    }
    alt.items
        .iter()
        .any(|named| item_refs_invalid(grammar, &named.item))
}

fn compile_step(
    rule: &Rule,
    named: &crate::grammar::NamedItem,
    ids: &HashMap<&str, CacheKey>,
) -> Result<Step, GrammarError> {
    let name = named.name.clone();
    match &named.item {
        Item::Cut => Ok(Step::Cut),
        Item::Opt(inner) => Ok(Step::Atom {
            atom: compile_atom(rule, inner, ids)?,
            name,
            optional: true,
        }),
        Item::PositiveLookahead(inner) => {
            Ok(Step::PositiveLookahead(compile_atom(rule, inner, ids)?))
        }
        Item::NegativeLookahead(inner) => {
            Ok(Step::NegativeLookahead(compile_atom(rule, inner, ids)?))
        }
        Item::Forced(inner) => Ok(Step::Forced {
            atom: compile_atom(rule, inner, ids)?,
            expected: format!("{}", inner),
        }),
        item => Ok(Step::Atom {
            atom: compile_atom(rule, item, ids)?,
            name,
            optional: false,
        }),
    }
}

fn compile_atom(
    rule: &Rule,
    item: &Item,
    ids: &HashMap<&str, CacheKey>,
) -> Result<Atom, GrammarError> {
    match item {
        Item::Name(name) => {
            if let Some(&key) = ids.get(name.as_str()) {
                return Ok(Atom::Rule(key));
            }
            if let Some(kind) = TokenKind::from_name(name) {
                return Ok(Atom::Token(kind));
            }
            Err(GrammarError::in_rule(
                format!("Dangling reference to rule '{}'", name),
                &rule.name,
            ))
        }
        Item::Literal(literal) => {
            let content = Item::literal_content(literal);
            if content.is_empty() {
                Ok(Atom::Empty)
            } else {
                Ok(Atom::Expect(content.to_string()))
            }
        }
        other => Err(GrammarError::in_rule(
            format!("operator '{}' survived desugaring", other),
            &rule.name,
        )),
    }
}

/// Used by emission to name unnamed captures.
pub(super) fn default_binding(atom: &Atom, grammar: &CompiledGrammar) -> String {
    match atom {
        Atom::Rule(key) => grammar.rule(*key).name.clone(),
        Atom::Token(kind) => kind.name().to_lowercase(),
        Atom::Expect(_) => "_literal".to_string(),
        Atom::Empty => "_empty".to_string(),
    }
}

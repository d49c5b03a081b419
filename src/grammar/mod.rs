//! The typed intermediate representation of a grammar, plus the static analyses
//! run over it before generation.
//!
//! Rules reference each other by name rather than by pointer, so the rule map is
//! the sole owner of the tree; analyses that need a graph build an auxiliary
//! name-to-names adjacency. The [Display](std::fmt::Display) implementations
//! render the same surface notation the metagrammar accepts, so a parsed grammar
//! can be printed back for inspection.

mod left_recursion;
mod nullable;
mod validate;
mod visualize;

#[cfg(test)]
mod __tests__;

pub use left_recursion::{compute_left_recursives, FirstGraph};
pub use nullable::{compute_nullables, item_nullable};
pub use validate::check_grammar;
pub use visualize::{grammar_tree, rule_tree, TreeNode};

use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// A grammar: rules in insertion order plus meta-directives.
pub struct Grammar {
    rules: Vec<Rule>,
    index: HashMap<String, usize>,
    metas: Vec<(String, Option<String>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Origin of a synthetic rule created by desugaring. User rules carry no kind.
pub enum SynthKind {
    /// `_tmp_N`, a parenthesized group lifted out of an alternative.
    Tmp,
    /// `_loop0_N`, zero-or-more repetition.
    Loop0,
    /// `_loop1_N`, one-or-more repetition.
    Loop1,
    /// `_loop0_N` matching `separator element` and yielding the element.
    SepLoop,
    /// `_gather_N`, a non-empty separated list.
    Gather,
}

/// A named rule of the grammar.
pub struct Rule {
    pub name: String,
    /// Opaque type annotation, passed through to emission.
    pub annotation: Option<String>,
    pub rhs: Rhs,
    /// Explicit `(memo)` marker from the grammar source.
    pub memo: bool,
    pub nullable: bool,
    pub left_recursive: bool,
    /// Canonical representative of a left-recursive strongly connected component.
    pub leader: bool,
    pub synth: Option<SynthKind>,
}

/// Ordered alternatives; the first match wins.
#[derive(Clone)]
pub struct Rhs {
    pub alts: Vec<Alt>,
}

#[derive(Clone)]
pub struct Alt {
    pub items: Vec<NamedItem>,
    /// Opaque host-language expression over the bound names.
    pub action: Option<String>,
}

#[derive(Clone)]
/// A binding of an optional local name to an item.
pub struct NamedItem {
    pub name: Option<String>,
    pub item: Item,
    pub annotation: Option<String>,
}

#[derive(Clone)]
/// An element of an alternative.
pub enum Item {
    /// Reference to a rule or a token kind. `ENDMARKER` renders as `$`.
    Name(String),
    /// A quoted terminal, quotes included: a keyword, soft keyword or operator spelling.
    Literal(String),
    /// Parenthesized subgrammar.
    Group(Rhs),
    /// Optional; matches empty.
    Opt(Box<Item>),
    Repeat0(Box<Item>),
    Repeat1(Box<Item>),
    /// Non-empty separated list `sep.elem+`.
    Gather {
        separator: Box<Item>,
        element: Box<Item>,
    },
    PositiveLookahead(Box<Item>),
    NegativeLookahead(Box<Item>),
    /// `&&x`: failure here is a diagnostic, not a backtrack.
    Forced(Box<Item>),
    /// `~`: commit to the current alternative.
    Cut,
}

impl Grammar {
    pub fn new(rules: Vec<Rule>, metas: Vec<(String, Option<String>)>) -> Self {
        let mut grammar = Self {
            rules: Vec::new(),
            index: HashMap::new(),
            metas,
        };
        for rule in rules {
            grammar.add_rule(rule);
        }
        grammar
    }

    /// Append a rule, replacing any earlier rule of the same name in place.
    pub fn add_rule(&mut self, rule: Rule) {
        match self.index.get(&rule.name) {
            Some(&at) => self.rules[at] = rule,
            None => {
                self.index.insert(rule.name.clone(), self.rules.len());
                self.rules.push(rule);
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).map(|&at| &self.rules[at])
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Rule> {
        match self.index.get(name) {
            Some(&at) => self.rules.get_mut(at),
            None => None,
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Rule> {
        self.rules.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn rule_names(&self) -> Vec<String> {
        self.rules.iter().map(|rule| rule.name.clone()).collect()
    }

    pub fn metas(&self) -> &[(String, Option<String>)] {
        &self.metas
    }

    pub fn has_meta(&self, name: &str) -> bool {
        self.metas.iter().any(|(key, _)| key == name)
    }

    pub fn meta(&self, name: &str) -> Option<&str> {
        self.metas
            .iter()
            .find(|(key, _)| key == name)
            .and_then(|(_, value)| value.as_deref())
    }
}

impl Rule {
    pub fn new(name: &str, annotation: Option<String>, rhs: Rhs, memo: bool) -> Self {
        Self {
            name: name.to_string(),
            annotation,
            rhs,
            memo,
            nullable: false,
            left_recursive: false,
            leader: false,
            synth: None,
        }
    }

    pub fn synthetic(name: String, rhs: Rhs, kind: SynthKind) -> Self {
        Self {
            name,
            annotation: None,
            rhs,
            memo: false,
            nullable: false,
            left_recursive: false,
            leader: false,
            synth: Some(kind),
        }
    }

    pub fn is_synthetic(&self) -> bool {
        self.synth.is_some()
    }

    /// Error-recovery rules are gated behind a generator switch.
    pub fn is_invalid(&self) -> bool {
        self.name.starts_with("invalid_")
    }

    /// If the whole body is one parenthesized group, use the group's alternatives.
    pub fn flatten(&self) -> &Rhs {
        if self.synth.is_none() && self.rhs.alts.len() == 1 && self.rhs.alts[0].items.len() == 1 {
            if let Item::Group(rhs) = &self.rhs.alts[0].items[0].item {
                return rhs;
            }
        }
        &self.rhs
    }
}

impl Rhs {
    pub fn new(alts: Vec<Alt>) -> Self {
        Self { alts }
    }

    /// A group can replace its reference site only when nothing about it needs a
    /// rule of its own: one alternative, one item, no action.
    pub fn can_be_inlined(&self) -> bool {
        self.alts.len() == 1 && self.alts[0].items.len() == 1 && self.alts[0].action.is_none()
    }
}

impl Alt {
    pub fn new(items: Vec<NamedItem>, action: Option<String>) -> Self {
        Self { items, action }
    }

    /// Position of the `~` item, if the alternative contains one.
    pub fn icut(&self) -> Option<usize> {
        self.items
            .iter()
            .position(|item| matches!(item.item, Item::Cut))
    }
}

impl NamedItem {
    pub fn new(name: Option<String>, item: Item) -> Self {
        Self {
            name,
            item,
            annotation: None,
        }
    }

    pub fn annotated(name: Option<String>, item: Item, annotation: Option<String>) -> Self {
        Self {
            name,
            item,
            annotation,
        }
    }
}

impl Item {
    /// The text of a string literal with its quotes removed.
    pub fn literal_content(literal: &str) -> &str {
        if literal.len() >= 2 {
            &literal[1..literal.len() - 1]
        } else {
            literal
        }
    }

    /// Single-quoted identifiers are hard keywords, double-quoted ones are soft.
    pub fn is_keyword_literal(literal: &str) -> bool {
        let content = Self::literal_content(literal);
        !content.is_empty()
            && content
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
            && content.chars().next().is_some_and(|c| !c.is_ascii_digit())
    }
}

impl Display for Grammar {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, rule) in self.rules.iter().enumerate() {
            if index != 0 {
                writeln!(f)?;
            }
            write!(f, "{}", rule)?;
        }
        Ok(())
    }
}

impl Display for Rule {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let flat = format!("{}: {}", self.name, self.rhs);
        if flat.len() < 88 {
            return write!(f, "{}", flat);
        }
        writeln!(f, "{}:", self.name)?;
        for (index, alt) in self.rhs.alts.iter().enumerate() {
            if index != 0 {
                writeln!(f)?;
            }
            write!(f, "    | {}", alt)?;
        }
        Ok(())
    }
}

impl Display for Rhs {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, alt) in self.alts.iter().enumerate() {
            if index != 0 {
                write!(f, " | ")?;
            }
            write!(f, "{}", alt)?;
        }
        Ok(())
    }
}

impl Display for Alt {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (index, item) in self.items.iter().enumerate() {
            if index != 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", item)?;
        }
        Ok(())
    }
}

impl Display for NamedItem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.item)
    }
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Item::Name(name) => {
                if name == "ENDMARKER" {
                    write!(f, "$")
                } else {
                    write!(f, "{}", name)
                }
            }
            Item::Literal(literal) => write!(f, "{}", literal),
            Item::Group(rhs) => write!(f, "({})", rhs),
            Item::Opt(inner) => match &**inner {
                // A bracketed optional keeps its surface form.
                Item::Group(rhs) => write!(f, "[{}]", rhs),
                _ => {
                    let s = format!("{}", inner);
                    if s.contains(' ') {
                        write!(f, "[{}]", s)
                    } else {
                        write!(f, "{}?", s)
                    }
                }
            },
            Item::Repeat0(inner) => {
                let s = format!("{}", inner);
                if matches!(&**inner, Item::Group(_)) || !s.contains(' ') {
                    write!(f, "{}*", s)
                } else {
                    write!(f, "({})*", s)
                }
            }
            Item::Repeat1(inner) => {
                let s = format!("{}", inner);
                if matches!(&**inner, Item::Group(_)) || !s.contains(' ') {
                    write!(f, "{}+", s)
                } else {
                    write!(f, "({})+", s)
                }
            }
            Item::Gather { separator, element } => write!(f, "{}.{}+", separator, element),
            Item::PositiveLookahead(inner) => write!(f, "&{}", inner),
            Item::NegativeLookahead(inner) => write!(f, "!{}", inner),
            Item::Forced(inner) => write!(f, "&&{}", inner),
            Item::Cut => write!(f, "~"),
        }
    }
}

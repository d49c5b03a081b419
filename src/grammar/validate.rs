use super::{Grammar, Item, Rhs, Rule};
use crate::{GrammarError, TokenKind};

/// Structural validation run before any analysis: naming restrictions, the
/// `start`/`@trailer` requirement, and dangling references.
pub fn check_grammar(grammar: &Grammar) -> Result<(), GrammarError> {
    for rule in grammar.iter() {
        if !rule.is_synthetic() && rule.name.starts_with('_') {
            return Err(GrammarError::new(format!(
                "Rule names cannot start with underscore: '{}'",
                rule.name
            )));
        }
    }
    if !grammar.has_meta("trailer") && !grammar.contains("start") {
        return Err(GrammarError::new(
            "Grammar without a trailer must have a 'start' rule".to_string(),
        ));
    }
    for rule in grammar.iter() {
        check_rhs(grammar, rule, &rule.rhs)?;
    }
    Ok(())
}

fn check_rhs(grammar: &Grammar, rule: &Rule, rhs: &Rhs) -> Result<(), GrammarError> {
    for alt in &rhs.alts {
        for named in &alt.items {
            if let Some(name) = &named.name {
                if name.starts_with('_') {
                    return Err(GrammarError::in_rule(
                        format!("Variable names cannot start with underscore: '{}'", name),
                        &rule.name,
                    ));
                }
            }
            check_item(grammar, rule, &named.item)?;
        }
    }
    Ok(())
}

fn check_item(grammar: &Grammar, rule: &Rule, item: &Item) -> Result<(), GrammarError> {
    match item {
        Item::Name(name) => {
            if !grammar.contains(name) && TokenKind::from_name(name).is_none() {
                return Err(GrammarError::in_rule(
                    format!("Dangling reference to rule '{}'", name),
                    &rule.name,
                ));
            }
            Ok(())
        }
        Item::Literal(_) | Item::Cut => Ok(()),
        Item::Group(rhs) => check_rhs(grammar, rule, rhs),
        Item::Opt(inner)
        | Item::Repeat0(inner)
        | Item::Repeat1(inner)
        | Item::PositiveLookahead(inner)
        | Item::NegativeLookahead(inner)
        | Item::Forced(inner) => check_item(grammar, rule, inner),
        Item::Gather { separator, element } => {
            check_item(grammar, rule, separator)?;
            check_item(grammar, rule, element)
        }
    }
}

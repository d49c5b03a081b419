use super::{Grammar, Item};
use std::collections::HashSet;

/// Compute which rules in a grammar are nullable and store the result on the
/// rules. A monotone least fixed point: each pass can only add rules, so it
/// converges in at most `|rules|` passes.
pub fn compute_nullables(grammar: &mut Grammar) {
    let mut nullables: HashSet<String> = HashSet::new();
    loop {
        let mut changed = false;
        for rule in grammar.iter() {
            if nullables.contains(&rule.name) {
                continue;
            }
            let lookup = |name: &str| nullables.contains(name);
            let nullable = rule
                .rhs
                .alts
                .iter()
                .any(|alt| alt.items.iter().all(|ni| item_nullable_with(&lookup, &ni.item)));
            if nullable {
                nullables.insert(rule.name.clone());
                changed = true;
            }
        }
        if !changed {
            break;
        }
    }
    for rule in grammar.iter_mut() {
        rule.nullable = nullables.contains(&rule.name);
    }
}

/// Nullability of a single item, reading rule flags from the grammar.
/// Valid once [compute_nullables] has run.
pub fn item_nullable(grammar: &Grammar, item: &Item) -> bool {
    let lookup = |name: &str| grammar.get(name).map_or(false, |rule| rule.nullable);
    item_nullable_with(&lookup, item)
}

fn item_nullable_with(lookup: &dyn Fn(&str) -> bool, item: &Item) -> bool {
    match item {
        // Token or unknown references never match empty.
        Item::Name(name) => lookup(name),
        // Only the empty string literal is considered empty.
        Item::Literal(literal) => Item::literal_content(literal).is_empty(),
        Item::Group(rhs) => rhs
            .alts
            .iter()
            .any(|alt| alt.items.iter().all(|ni| item_nullable_with(lookup, &ni.item))),
        Item::Opt(_) | Item::Repeat0(_) => true,
        // Cut, forced matches and lookaheads consume no input, but counting them
        // as nullable would change the initial-name graph; the left-recursion
        // analysis wants them opaque.
        Item::Repeat1(_)
        | Item::Gather { .. }
        | Item::Cut
        | Item::Forced(_)
        | Item::PositiveLookahead(_)
        | Item::NegativeLookahead(_) => false,
    }
}

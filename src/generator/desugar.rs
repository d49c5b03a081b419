use crate::grammar::{Alt, Grammar, Item, NamedItem, Rhs, Rule, SynthKind};

/// Replace `X*`, `X+` and `sep.X+` occurrences with references to fresh
/// synthetic rules, and lift parenthesized groups that cannot be inlined into
/// `_tmp_N` rules. Synthetic rules are appended in creation order; their bodies
/// are rewritten in turn until no operator is left.
///
/// After this pass every item in every alternative is atom-level: a name, a
/// literal, an optional or lookahead or forced wrapper around one of those, or
/// a cut.
pub(super) fn desugar(grammar: &mut Grammar) {
    let mut counter = 0usize;
    let mut fresh: Vec<Rule> = Vec::new();

    let names = grammar.rule_names();
    for name in names {
        let mut rhs = match grammar.get_mut(&name) {
            Some(rule) => std::mem::replace(&mut rule.rhs, Rhs::new(Vec::new())),
            None => continue,
        };
        rewrite_rhs(&mut rhs, &mut counter, &mut fresh);
        if let Some(rule) = grammar.get_mut(&name) {
            rule.rhs = rhs;
        }
    }

    while !fresh.is_empty() {
        let mut batch = std::mem::take(&mut fresh);
        for rule in &mut batch {
            rewrite_rhs(&mut rule.rhs, &mut counter, &mut fresh);
        }
        for rule in batch {
            grammar.add_rule(rule);
        }
    }
}

fn rewrite_rhs(rhs: &mut Rhs, counter: &mut usize, fresh: &mut Vec<Rule>) {
    for alt in &mut rhs.alts {
        for named in &mut alt.items {
            rewrite_item(&mut named.item, counter, fresh);
        }
    }
}

fn rewrite_item(item: &mut Item, counter: &mut usize, fresh: &mut Vec<Rule>) {
    match item {
        Item::Name(_) | Item::Literal(_) | Item::Cut => {}
        Item::Group(rhs) => {
            rewrite_rhs(rhs, counter, fresh);
            if rhs.can_be_inlined() {
                let inner = rhs.alts[0].items[0].item.clone();
                *item = inner;
            } else {
                *counter += 1;
                let name = format!("_tmp_{}", counter);
                fresh.push(Rule::synthetic(name.clone(), rhs.clone(), SynthKind::Tmp));
                *item = Item::Name(name);
            }
        }
        Item::Opt(inner)
        | Item::PositiveLookahead(inner)
        | Item::NegativeLookahead(inner)
        | Item::Forced(inner) => rewrite_item(inner, counter, fresh),
        Item::Repeat0(inner) => {
            rewrite_item(inner, counter, fresh);
            *counter += 1;
            let name = format!("_loop0_{}", counter);
            fresh.push(Rule::synthetic(
                name.clone(),
                Rhs::new(vec![Alt::new(
                    vec![NamedItem::new(None, (**inner).clone())],
                    None,
                )]),
                SynthKind::Loop0,
            ));
            *item = Item::Name(name);
        }
        Item::Repeat1(inner) => {
            rewrite_item(inner, counter, fresh);
            *counter += 1;
            let name = format!("_loop1_{}", counter);
            fresh.push(Rule::synthetic(
                name.clone(),
                Rhs::new(vec![Alt::new(
                    vec![NamedItem::new(None, (**inner).clone())],
                    None,
                )]),
                SynthKind::Loop1,
            ));
            *item = Item::Name(name);
        }
        Item::Gather { separator, element } => {
            rewrite_item(separator, counter, fresh);
            rewrite_item(element, counter, fresh);
            *counter += 1;
            let gather_name = format!("_gather_{}", counter);
            *counter += 1;
            let sep_loop_name = format!("_loop0_{}", counter);
            fresh.push(Rule::synthetic(
                sep_loop_name.clone(),
                Rhs::new(vec![Alt::new(
                    vec![
                        NamedItem::new(None, (**separator).clone()),
                        NamedItem::new(Some("elem".to_string()), (**element).clone()),
                    ],
                    Some("elem".to_string()),
                )]),
                SynthKind::SepLoop,
            ));
            fresh.push(Rule::synthetic(
                gather_name.clone(),
                Rhs::new(vec![Alt::new(
                    vec![
                        NamedItem::new(Some("elem".to_string()), (**element).clone()),
                        NamedItem::new(Some("seq".to_string()), Item::Name(sep_loop_name)),
                    ],
                    None,
                )]),
                SynthKind::Gather,
            ));
            *item = Item::Name(gather_name);
        }
    }
}

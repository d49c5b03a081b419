use super::{item_nullable, Grammar, Item, Rhs};
use crate::GrammarError;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// The graph of left-invocations: an edge from A to B means A may invoke B at
/// its initial position. Deterministically ordered so leader selection and
/// error reports are stable.
pub type FirstGraph = BTreeMap<String, BTreeSet<String>>;

/// Detect left-recursive rules and select the leader of each strongly connected
/// component. Requires nullability flags to have been computed.
///
/// Returns the first graph and the component list, mainly for inspection and
/// tests; the flags on the rules are what generation consumes.
pub fn compute_left_recursives(
    grammar: &mut Grammar,
) -> Result<(FirstGraph, Vec<BTreeSet<String>>), GrammarError> {
    let graph = make_first_graph(grammar);
    let sccs = strongly_connected_components(&graph);
    for scc in &sccs {
        if scc.len() > 1 {
            for name in scc {
                if let Some(rule) = grammar.get_mut(name) {
                    rule.left_recursive = true;
                }
            }
            // Find a leader such that all cycles go through it.
            let mut leaders: BTreeSet<&String> = scc.iter().collect();
            for start in scc {
                for cycle in find_cycles_in_scc(&graph, scc, start) {
                    leaders.retain(|leader| cycle.contains(*leader));
                    if leaders.is_empty() {
                        return Err(GrammarError::new(format!(
                            "SCC {:?} has no leadership candidate (no element is included in all cycles)",
                            scc
                        )));
                    }
                }
            }
            let leader = (*leaders.iter().next().unwrap()).clone();
            if let Some(rule) = grammar.get_mut(&leader) {
                rule.leader = true;
            }
        } else {
            let name = scc.iter().next().unwrap();
            if graph.get(name).map_or(false, |edges| edges.contains(name)) {
                if let Some(rule) = grammar.get_mut(name) {
                    rule.left_recursive = true;
                    rule.leader = true;
                }
            }
        }
    }
    Ok((graph, sccs))
}

pub(crate) fn make_first_graph(grammar: &Grammar) -> FirstGraph {
    let mut graph = FirstGraph::new();
    let mut vertices: BTreeSet<String> = BTreeSet::new();
    for rule in grammar.iter() {
        let names = rhs_initial_names(grammar, &rule.rhs);
        vertices.extend(names.iter().cloned());
        graph.insert(rule.name.clone(), names);
    }
    for vertex in vertices {
        graph.entry(vertex).or_default();
    }
    graph
}

/// Names that might be consumed first in some alternative: every alternative
/// contributes the names of its nullable prefix plus the first item that is not
/// nullable.
fn rhs_initial_names(grammar: &Grammar, rhs: &Rhs) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    for alt in &rhs.alts {
        for named in &alt.items {
            item_initial_names(grammar, &named.item, &mut names);
            if !item_nullable(grammar, &named.item) {
                break;
            }
        }
    }
    names
}

fn item_initial_names(grammar: &Grammar, item: &Item, out: &mut BTreeSet<String>) {
    match item {
        Item::Name(name) => {
            out.insert(name.clone());
        }
        Item::Literal(_) | Item::Cut => {}
        Item::Group(rhs) => out.extend(rhs_initial_names(grammar, rhs)),
        Item::Opt(inner) | Item::Repeat0(inner) | Item::Repeat1(inner) => {
            item_initial_names(grammar, inner, out)
        }
        Item::Gather { element, .. } => item_initial_names(grammar, element, out),
        Item::PositiveLookahead(inner)
        | Item::NegativeLookahead(inner)
        | Item::Forced(inner) => item_initial_names(grammar, inner, out),
    }
}

/// Iterative Tarjan over the first graph. Components come out in reverse
/// topological order, which is all the caller needs.
pub(crate) fn strongly_connected_components(graph: &FirstGraph) -> Vec<BTreeSet<String>> {
    let mut counter = 0usize;
    let mut indices: HashMap<&str, usize> = HashMap::new();
    let mut lowlinks: HashMap<&str, usize> = HashMap::new();
    let mut on_stack: HashSet<&str> = HashSet::new();
    let mut stack: Vec<&str> = Vec::new();
    let mut components = Vec::new();

    for root in graph.keys() {
        if indices.contains_key(root.as_str()) {
            continue;
        }
        let mut frames = vec![(root.as_str(), graph[root].iter())];
        indices.insert(root, counter);
        lowlinks.insert(root, counter);
        counter += 1;
        stack.push(root);
        on_stack.insert(root);

        while !frames.is_empty() {
            let (node, next) = {
                let frame = frames.last_mut().unwrap();
                (frame.0, frame.1.next())
            };
            match next {
                Some(target) => {
                    let target = target.as_str();
                    if !indices.contains_key(target) {
                        indices.insert(target, counter);
                        lowlinks.insert(target, counter);
                        counter += 1;
                        stack.push(target);
                        on_stack.insert(target);
                        frames.push((target, graph[target].iter()));
                    } else if on_stack.contains(target) {
                        let low = lowlinks[node].min(indices[target]);
                        lowlinks.insert(node, low);
                    }
                }
                None => {
                    frames.pop();
                    if let Some(parent) = frames.last() {
                        let low = lowlinks[parent.0].min(lowlinks[node]);
                        lowlinks.insert(parent.0, low);
                    }
                    if lowlinks[node] == indices[node] {
                        let mut component = BTreeSet::new();
                        loop {
                            let member = stack.pop().unwrap();
                            on_stack.remove(member);
                            component.insert(member.to_string());
                            if member == node {
                                break;
                            }
                        }
                        components.push(component);
                    }
                }
            }
        }
    }
    components
}

/// Enumerate the elementary cycles through `start` that stay inside `scc`.
pub(crate) fn find_cycles_in_scc(
    graph: &FirstGraph,
    scc: &BTreeSet<String>,
    start: &str,
) -> Vec<Vec<String>> {
    fn walk(
        graph: &FirstGraph,
        scc: &BTreeSet<String>,
        start: &str,
        node: &str,
        path: &mut Vec<String>,
        cycles: &mut Vec<Vec<String>>,
    ) {
        path.push(node.to_string());
        if let Some(edges) = graph.get(node) {
            for target in edges {
                if !scc.contains(target) {
                    continue;
                }
                if target == start {
                    cycles.push(path.clone());
                } else if !path.iter().any(|seen| seen == target) {
                    walk(graph, scc, start, target, path, cycles);
                }
            }
        }
        path.pop();
    }

    let mut cycles = Vec::new();
    let mut path = Vec::new();
    walk(graph, scc, start, start, &mut path, &mut cycles);
    cycles
}

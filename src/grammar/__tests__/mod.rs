use crate::grammar::{
    compute_left_recursives, compute_nullables, check_grammar, grammar_tree, Grammar,
};
use crate::metagrammar::parse_grammar;

fn parsed(source: &str) -> Grammar {
    match parse_grammar(source, None) {
        Ok(grammar) => grammar,
        Err(err) => panic!("grammar did not parse: {}", err),
    }
}

#[test]
fn parse_grammar_display_test() {
    let grammar = parsed(
        "start: sum NEWLINE\n\
         sum: t1=term '+' t2=term { action } | term\n\
         term: NUMBER\n",
    );
    assert_eq!(format!("{}", grammar.get("start").unwrap()), "start: sum NEWLINE");
    assert_eq!(
        format!("{}", grammar.get("sum").unwrap()),
        "sum: term '+' term | term"
    );
    assert_eq!(format!("{}", grammar.get("term").unwrap()), "term: NUMBER");
    assert_eq!(
        format!("{}", grammar),
        "start: sum NEWLINE\nsum: term '+' term | term\nterm: NUMBER"
    );
}

#[test]
fn parse_grammar_with_types_test() {
    let grammar = parsed(
        "start[int]: sum NEWLINE\n\
         sum[T]: term '+' term | term\n\
         term: NUMBER\n",
    );
    assert_eq!(grammar.get("start").unwrap().annotation.as_deref(), Some("int"));
    assert_eq!(grammar.get("sum").unwrap().annotation.as_deref(), Some("T"));
    assert_eq!(grammar.get("term").unwrap().annotation, None);
}

#[test]
fn parse_actions_test() {
    let grammar = parsed("start: a=NAME { make_name ( a ) }\n");
    let rule = grammar.get("start").unwrap();
    assert_eq!(rule.rhs.alts[0].action.as_deref(), Some("make_name ( a )"));
    assert_eq!(rule.rhs.alts[0].items[0].name.as_deref(), Some("a"));
}

#[test]
fn long_rule_folds_test() {
    let grammar = parsed(
        "start: zero | one | one zero | one one | one zero zero | one zero one | one one zero | one one one\n\
         zero: '0'\n\
         one: '1'\n",
    );
    let expected = "start:\n    | zero\n    | one\n    | one zero\n    | one one\n    | one zero zero\n    | one zero one\n    | one one zero\n    | one one one";
    assert_eq!(format!("{}", grammar.get("start").unwrap()), expected);
}

#[test]
fn indented_alts_test() {
    let grammar = parsed("start:\n    | NAME\n    | NUMBER\n");
    assert_eq!(grammar.get("start").unwrap().rhs.alts.len(), 2);
}

#[test]
fn gather_display_test() {
    let grammar = parsed("start: ','.thing+ NEWLINE\nthing: NUMBER\n");
    assert_eq!(
        format!("{}", grammar.get("start").unwrap()),
        "start: ','.thing+ NEWLINE"
    );
}

#[test]
fn endmarker_renders_as_dollar_test() {
    let grammar = parsed("start: NAME $\n");
    assert_eq!(format!("{}", grammar.get("start").unwrap()), "start: NAME $");
}

#[test]
fn lookahead_and_cut_display_test() {
    let grammar = parsed("start: &NAME !NUMBER ~ NAME &&':'\n");
    assert_eq!(
        format!("{}", grammar.get("start").unwrap()),
        "start: &NAME !NUMBER ~ NAME &&':'"
    );
}

#[test]
fn opt_and_repeat_display_test() {
    let grammar = parsed("start: NAME? NUMBER* STRING+ ('a' 'b')* NEWLINE\n");
    assert_eq!(
        format!("{}", grammar.get("start").unwrap()),
        "start: NAME? NUMBER* STRING+ ('a' 'b')* NEWLINE"
    );
}

#[test]
fn metas_test() {
    let grammar = parsed(
        "@class Calc\n\
         @header \"// top\"\n\
         @trailer \"// bottom\"\n\
         start: NAME NEWLINE\n",
    );
    assert_eq!(grammar.meta("class"), Some("Calc"));
    assert_eq!(grammar.meta("header"), Some("// top"));
    assert!(grammar.has_meta("trailer"));
    assert!(!grammar.has_meta("subheader"));
}

#[test]
fn meta_string_escapes_test() {
    let grammar = parsed(
        "@header \"line\\none\"\n\
         @subheader \"C:\\\\dir\"\n\
         @trailer \"\\d+ \\w\"\n\
         start: NAME NEWLINE\n",
    );
    assert_eq!(grammar.meta("header"), Some("line\none"));
    assert_eq!(grammar.meta("subheader"), Some("C:\\dir"));
    // Unrecognized escapes keep their backslash.
    assert_eq!(grammar.meta("trailer"), Some("\\d+ \\w"));
}

#[test]
fn icut_position_test() {
    let grammar = parsed("start: '(' ~ NAME ')' | NAME\n");
    let rule = grammar.get("start").unwrap();
    assert_eq!(rule.rhs.alts[0].icut(), Some(1));
    assert_eq!(rule.rhs.alts[1].icut(), None);
}

#[test]
fn nullable_fixed_point_test() {
    let mut grammar = parsed(
        "start: a NEWLINE\n\
         a: b c\n\
         b: 'b'?\n\
         c: 'c'?\n\
         d: 'd'\n",
    );
    compute_nullables(&mut grammar);
    assert!(grammar.get("a").unwrap().nullable);
    assert!(grammar.get("b").unwrap().nullable);
    assert!(grammar.get("c").unwrap().nullable);
    assert!(!grammar.get("d").unwrap().nullable);
    assert!(!grammar.get("start").unwrap().nullable);
}

#[test]
fn empty_string_literal_is_nullable_test() {
    let mut grammar = parsed("start: e NEWLINE\ne: ''\n");
    compute_nullables(&mut grammar);
    assert!(grammar.get("e").unwrap().nullable);
}

#[test]
fn repeat_nullability_test() {
    let mut grammar = parsed(
        "start: many NEWLINE\n\
         many: thing*\n\
         some: thing+\n\
         thing: 'x'\n",
    );
    compute_nullables(&mut grammar);
    assert!(grammar.get("many").unwrap().nullable);
    assert!(!grammar.get("some").unwrap().nullable);
}

#[test]
fn lookaheads_not_nullable_test() {
    // Zero-width operators count as opaque for this analysis.
    let mut grammar = parsed(
        "start: a NEWLINE\n\
         a: &NAME\n\
         b: !NUMBER\n\
         c: ~\n",
    );
    compute_nullables(&mut grammar);
    assert!(!grammar.get("a").unwrap().nullable);
    assert!(!grammar.get("b").unwrap().nullable);
    assert!(!grammar.get("c").unwrap().nullable);
}

#[test]
fn direct_left_recursion_test() {
    let mut grammar = parsed(
        "start: expr NEWLINE\n\
         expr: expr '+' term | term\n\
         term: NUMBER\n",
    );
    compute_nullables(&mut grammar);
    let (graph, _) = compute_left_recursives(&mut grammar).unwrap();
    assert!(graph["expr"].contains("expr"));
    assert!(!grammar.get("start").unwrap().left_recursive);
    let expr = grammar.get("expr").unwrap();
    assert!(expr.left_recursive);
    assert!(expr.leader);
    assert!(!grammar.get("term").unwrap().left_recursive);
}

#[test]
fn hidden_left_recursion_through_nullable_test() {
    let mut grammar = parsed(
        "start: a NEWLINE\n\
         a: maybe a 'x' | 'y'\n\
         maybe: 'm'?\n",
    );
    compute_nullables(&mut grammar);
    let (graph, _) = compute_left_recursives(&mut grammar).unwrap();
    // The nullable prefix lets 'a' start with itself.
    assert!(graph["a"].contains("a"));
    assert!(grammar.get("a").unwrap().left_recursive);
}

#[test]
fn mutual_left_recursion_leader_test() {
    let mut grammar = parsed(
        "start: foo 'E'\n\
         foo: bar 'A' | 'B'\n\
         bar: foo 'C' | 'D'\n",
    );
    compute_nullables(&mut grammar);
    compute_left_recursives(&mut grammar).unwrap();
    assert!(!grammar.get("start").unwrap().left_recursive);
    assert!(grammar.get("foo").unwrap().left_recursive);
    assert!(grammar.get("bar").unwrap().left_recursive);
    // Exactly one leader per component, smallest name among the candidates.
    assert!(grammar.get("bar").unwrap().leader);
    assert!(!grammar.get("foo").unwrap().leader);
}

#[test]
fn leaderless_scc_is_rejected_test() {
    // Two disjoint elementary cycles knotted into one component: no rule lies
    // on every cycle, so no seed could stabilize the whole component.
    let mut grammar = parsed(
        "start: a NEWLINE\n\
         a: b 'x'\n\
         b: a 'y' | c 'z'\n\
         c: d 'w'\n\
         d: c 'v' | a 'u'\n",
    );
    compute_nullables(&mut grammar);
    let err = compute_left_recursives(&mut grammar).unwrap_err();
    assert!(
        err.message.contains("no leadership candidate"),
        "{}",
        err.message
    );
}

#[test]
fn dangling_reference_test() {
    let grammar = parsed("start: missing NEWLINE\n");
    let err = check_grammar(&grammar).unwrap_err();
    assert!(
        err.message.contains("Dangling reference to rule 'missing'"),
        "{}",
        err.message
    );
}

#[test]
fn underscore_rule_name_rejected_test() {
    let grammar = parsed("_start: NAME\nstart: _start NEWLINE\n");
    let err = check_grammar(&grammar).unwrap_err();
    assert!(
        err.message.contains("Rule names cannot start with underscore"),
        "{}",
        err.message
    );
}

#[test]
fn underscore_variable_name_rejected_test() {
    let grammar = parsed("start: _x=NAME NEWLINE\n");
    let err = check_grammar(&grammar).unwrap_err();
    assert!(
        err.message
            .contains("Variable names cannot start with underscore"),
        "{}",
        err.message
    );
}

#[test]
fn missing_start_rule_rejected_test() {
    let grammar = parsed("something: NAME NEWLINE\n");
    let err = check_grammar(&grammar).unwrap_err();
    assert!(
        err.message
            .contains("Grammar without a trailer must have a 'start' rule"),
        "{}",
        err.message
    );
}

#[test]
fn trailer_substitutes_for_start_test() {
    let grammar = parsed("@trailer \"fn main() {}\"\nsomething: NAME NEWLINE\n");
    check_grammar(&grammar).unwrap();
}

#[test]
fn token_references_are_not_dangling_test() {
    let grammar = parsed("start: NAME NUMBER STRING OP NEWLINE INDENT DEDENT TYPE_COMMENT $\n");
    check_grammar(&grammar).unwrap();
}

#[test]
fn visualizer_shape_test() {
    let grammar = parsed("start: NAME '+' NUMBER? NEWLINE\n");
    let tree = grammar_tree(&grammar);
    assert_eq!(tree.label, "Grammar");
    assert_eq!(tree.children.len(), 1);
    let rule = &tree.children[0];
    assert_eq!(rule.label, "Rule:start");
    let alt = &rule.children[0];
    assert_eq!(alt.label, "Alt");
    assert_eq!(alt.children[0].label, "Name:NAME");
    assert_eq!(alt.children[1].label, "Literal:'+'");
    assert_eq!(alt.children[2].label, "Opt");
}

#[test]
fn rule_order_is_preserved_test() {
    let grammar = parsed("start: b c NEWLINE\nb: 'b'\nc: 'c'\n");
    assert_eq!(grammar.rule_names(), vec!["start", "b", "c"]);
}

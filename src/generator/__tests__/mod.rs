use crate::generator::{GeneratorConfig, ParserGenerator};
use crate::metagrammar::parse_grammar;
use crate::runtime::CompiledParser;
use crate::{SyntaxErrorKind, Value};

fn generator(source: &str) -> ParserGenerator {
    let grammar = match parse_grammar(source, None) {
        Ok(grammar) => grammar,
        Err(err) => panic!("grammar did not parse: {}", err),
    };
    match ParserGenerator::new(grammar, GeneratorConfig::default()) {
        Ok(generator) => generator,
        Err(err) => panic!("{}", err),
    }
}

fn make_parser(source: &str) -> CompiledParser {
    generator(source).compile().unwrap()
}

fn parse(parser: &CompiledParser, input: &str) -> Value {
    match parser.parse_string(input) {
        Ok(value) => value,
        Err(err) => panic!("parse of {:?} failed: {}", input, err),
    }
}

#[test]
fn repeat_desugars_to_loop_rules_test() {
    let generator = generator("start: thing* other+ NEWLINE\nthing: NUMBER\nother: NAME\n");
    let names = generator.grammar().rule_names();
    assert_eq!(names, vec!["start", "thing", "other", "_loop0_1", "_loop1_2"]);
    assert!(generator.grammar().get("_loop0_1").unwrap().is_synthetic());
}

#[test]
fn gather_desugars_to_paired_rules_test() {
    let generator = generator("start: ','.NUMBER+ NEWLINE\n");
    let names = generator.grammar().rule_names();
    assert_eq!(names, vec!["start", "_loop0_2", "_gather_1"]);
    // The repeated tail yields the element, not the separator.
    let sep_loop = generator.grammar().get("_loop0_2").unwrap();
    assert_eq!(sep_loop.rhs.alts[0].action.as_deref(), Some("elem"));
}

#[test]
fn trivial_group_is_inlined_test() {
    let generator = generator("start: (NAME) NEWLINE\n");
    let names = generator.grammar().rule_names();
    assert_eq!(names, vec!["start"]);
}

#[test]
fn wide_group_gets_tmp_rule_test() {
    let generator = generator("start: ('a' 'b') NEWLINE\n");
    let names = generator.grammar().rule_names();
    assert_eq!(names, vec!["start", "_tmp_1"]);
}

#[test]
fn keyword_harvest_test() {
    let generator = generator("start: 'if' \"match\" '+' NAME NEWLINE\n");
    assert!(generator.keywords().contains("if"));
    assert!(!generator.keywords().contains("+"));
    assert!(generator.soft_keywords().contains("match"));
}

#[test]
fn left_recursive_expression_test() {
    let parser = make_parser(
        "start: expr NEWLINE\n\
         expr: expr '+' term | term\n\
         term: NUMBER\n",
    );
    let tree = parse(&parser, "1+2+3\n");
    assert_eq!(format!("{}", tree.items()[0]), "((1 + 2) + 3)");
}

#[test]
fn gather_collects_elements_test() {
    let parser = make_parser("start: ','.NUMBER+ NEWLINE\n");
    let tree = parse(&parser, "1, 2, 3\n");
    assert_eq!(format!("{}", tree.items()[0]), "[1, 2, 3]");

    let single = parse(&parser, "7\n");
    assert_eq!(format!("{}", single.items()[0]), "[7]");

    assert!(parser.parse_string("1, 2,\n").is_err());
}

#[test]
fn cut_commits_to_alternative_test() {
    let parser = make_parser(
        "start: '(' ~ expr ')' | '(' name ')'\n\
         expr: NUMBER\n\
         name: NAME\n",
    );
    parse(&parser, "(1)");
    let err = parser.parse_string("(a)").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Generic);
}

#[test]
fn without_cut_second_alternative_rescues_test() {
    let parser = make_parser(
        "start: '(' expr ')' | '(' name ')'\n\
         expr: NUMBER\n\
         name: NAME\n",
    );
    parse(&parser, "(a)");
    parse(&parser, "(1)");
}

#[test]
fn cut_is_local_to_its_rhs_test() {
    // A cut firing inside `inner` must not suppress the sibling alternative
    // of `outer`.
    let parser = make_parser(
        "start: outer NEWLINE\n\
         outer: inner 'x' | '(' NAME ')'\n\
         inner: '(' ~ NUMBER ')'\n",
    );
    parse(&parser, "(a)\n");
}

#[test]
fn forced_match_raises_test() {
    let parser = make_parser("start: NAME &&':'\n");
    let err = parser.parse_string("x").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Forced);
    assert!(err.message.contains("expected ':'"), "{}", err.message);

    let tree = parse(&parser, "x:");
    assert_eq!(tree.items()[1].token_text(), ":");
}

#[test]
fn soft_keyword_stays_contextual_test() {
    let parser = make_parser(
        "start: stmt NEWLINE\n\
         stmt: \"match\" NAME | NAME '=' NUMBER\n",
    );
    let as_statement = parse(&parser, "match x\n");
    let stmt = &as_statement.items()[0];
    assert_eq!(stmt.items()[0].token_text(), "match");
    assert_eq!(stmt.items()[1].token_text(), "x");

    let as_assignment = parse(&parser, "match = 1\n");
    let stmt = &as_assignment.items()[0];
    assert_eq!(stmt.items()[1].token_text(), "=");
    assert_eq!(stmt.items()[2].token_text(), "1");
}

#[test]
fn mutually_left_recursive_test() {
    let parser = make_parser(
        "start: foo 'E'\n\
         foo: bar 'A' | 'B'\n\
         bar: foo 'C' | 'D'\n",
    );
    let tree = parse(&parser, "D A C A E");
    assert_eq!(format!("{}", tree.items()[0]), "(((D A) C) A)");

    let tree = parse(&parser, "B C A E");
    assert_eq!(format!("{}", tree.items()[0]), "((B C) A)");

    // foo derives "D A" directly, so this still parses.
    parse(&parser, "D A E");

    assert!(parser.parse_string("D C E").is_err());
    assert!(parser.parse_string("C A E").is_err());
}

#[test]
fn nasty_mutually_left_recursive_test() {
    // The top-level call recurses into maybe, which recognizes 'x - +', after
    // which no further '+' follows; the retreat to NAME leaves '- + =' behind.
    let parser = make_parser(
        "start: target '='\n\
         target: maybe '+' | NAME\n\
         maybe: maybe '-' | target\n",
    );
    assert!(parser.parse_string("x - + =").is_err());
    parse(&parser, "x =");
}

#[test]
fn ordered_choice_is_committed_test() {
    // The first alternative wins even when the second could consume more.
    let short_first = make_parser("start: x NEWLINE\nx: 'a' | 'a' 'b'\n");
    assert!(short_first.parse_string("a b\n").is_err());

    let long_first = make_parser("start: x NEWLINE\nx: 'a' 'b' | 'a'\n");
    parse(&long_first, "a b\n");
    parse(&long_first, "a\n");
}

#[test]
fn optional_item_test() {
    let parser = make_parser("start: NAME ['+' NAME] NEWLINE\n");
    let with_tail = parse(&parser, "a + b\n");
    assert_eq!(format!("{}", with_tail.items()[1]), "(+ b)");

    let without_tail = parse(&parser, "a\n");
    assert!(with_tail.items()[0].token_text() == "a");
    assert!(without_tail.items()[1].is_null());
}

#[test]
fn optional_literal_suffix_test() {
    let parser = make_parser("start: NUMBER '+'? NEWLINE\n");
    let with_plus = parse(&parser, "1+\n");
    assert_eq!(with_plus.items()[1].token_text(), "+");
    let without_plus = parse(&parser, "1\n");
    assert!(without_plus.items()[1].is_null());
}

#[test]
fn lookahead_test() {
    let positive = make_parser("start: &NAME NAME NEWLINE\n");
    let tree = parse(&positive, "x\n");
    // The lookahead consumes nothing and captures nothing.
    assert_eq!(tree.items().len(), 2);
    assert!(positive.parse_string("1\n").is_err());

    let negative = make_parser("start: !'x' NAME NEWLINE\n");
    parse(&negative, "y\n");
    assert!(negative.parse_string("x\n").is_err());
}

#[test]
fn repeat1_requires_one_test() {
    let parser = make_parser("start: NAME+ NEWLINE\n");
    let tree = parse(&parser, "a b c\n");
    assert_eq!(format!("{}", tree.items()[0]), "[a, b, c]");
    assert!(parser.parse_string("\n").is_err());
}

#[test]
fn repeat0_matches_empty_test() {
    let parser = make_parser("start: NAME* $\n");
    let tree = parse(&parser, "");
    assert_eq!(format!("{}", tree.items()[0]), "[]");
}

#[test]
fn invalid_rules_are_gated_test() {
    let source = "start: NAME '=' NUMBER NEWLINE | invalid_assign\n\
                  invalid_assign: NAME '=' NAME NEWLINE\n";

    let strict = make_parser(source);
    assert!(strict.grammar().rule_by_name("invalid_assign").is_none());
    assert!(strict.parse_string("x = y\n").is_err());
    parse(&strict, "x = 1\n");

    let grammar = parse_grammar(source, None).unwrap();
    let config = GeneratorConfig {
        call_invalid_rules: true,
        ..GeneratorConfig::default()
    };
    let permissive = ParserGenerator::new(grammar, config)
        .unwrap()
        .compile()
        .unwrap();
    assert!(permissive.grammar().rule_by_name("invalid_assign").is_some());
    parse(&permissive, "x = y\n");
}

#[test]
fn memo_flag_accepted_test() {
    let generator = generator("start (memo): NAME NEWLINE\n");
    assert!(generator.grammar().get("start").unwrap().memo);
}

#[test]
fn top_level_error_reports_furthest_token_test() {
    let parser = make_parser("start: NAME '=' NUMBER NEWLINE\n");
    let err = parser.parse_string("x = y\n").unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Generic);
    assert_eq!(err.lineno, 1);
    // The last visible token before the furthest reached position is '='.
    assert_eq!(err.offset, 3);
}

#[test]
fn parse_file_carries_filename_test() {
    let dir = std::env::temp_dir();
    let path = dir.join("peg_pt_parse_file_test.txt");
    std::fs::write(&path, "x = y\n").unwrap();

    let parser = make_parser("start: NAME '=' NUMBER NEWLINE\n");
    let err = parser.parse_file(&path).unwrap_err();
    assert_eq!(err.filename.as_deref(), path.to_str());
    std::fs::remove_file(&path).ok();
}

#[test]
fn emitted_source_shape_test() {
    let generator = generator(
        "start: expr NEWLINE\n\
         expr: expr '+' term | term\n\
         term: maybe_name NUMBER? NEWLINE* | NUMBER\n\
         maybe_name: 'if' \"match\" | NAME\n",
    );
    let emitted = generator.emit_rust().unwrap();

    assert!(emitted.contains("// @generated by peg-pt"));
    assert!(emitted.contains("pub struct GeneratedParser<'s>"));
    assert!(emitted.contains("pub const KEYWORDS: &'static [&'static str] = &[\"if\"];"));
    assert!(emitted.contains("pub const SOFT_KEYWORDS: &'static [&'static str] = &[\"match\"];"));
    // Ordinary rules go through the memo table.
    assert!(emitted.contains("if let Some(value) = self.p.cache_hit(CacheKey(0), 0)"));
    // The left-recursive leader grows a seed instead.
    assert!(emitted.contains("seed_plant"));
    assert!(emitted.contains("seed_update"));
    // One procedure per rule, synthetic loops included.
    assert!(emitted.contains("pub fn start(&mut self)"));
    assert!(emitted.contains("pub fn expr(&mut self)"));
    assert!(emitted.contains("fn _loop0_1(&mut self)"));
    assert!(emitted.contains("/// expr: expr '+' term | term"));
    assert!(emitted.contains("pub fn parse_string(source: &str)"));
}

#[test]
fn emitted_actions_are_spliced_test() {
    let source = "start: a=NAME { make ( a ) }\n";

    let with_actions = generator(source).emit_rust().unwrap();
    assert!(with_actions.contains("return Ok(Some(make ( a )));"));

    let grammar = parse_grammar(source, None).unwrap();
    let config = GeneratorConfig {
        skip_actions: true,
        ..GeneratorConfig::default()
    };
    let without_actions = ParserGenerator::new(grammar, config)
        .unwrap()
        .emit_rust()
        .unwrap();
    assert!(!without_actions.contains("make ( a )"));
    assert!(without_actions.contains("return Ok(Some(a));"));
}

#[test]
fn emitted_forced_and_cut_test() {
    let generator = generator("start: '(' ~ NAME &&')'\n");
    let emitted = generator.emit_rust().unwrap();
    assert!(emitted.contains("let mut cut = false;"));
    assert!(emitted.contains("cut = true;"));
    assert!(emitted.contains("forced_failure(\"')'\")"));
}

#[test]
fn emitted_class_and_trailer_metas_test() {
    let generator = generator(
        "@class CalcParser\n\
         @trailer \"// the end\"\n\
         start: NUMBER NEWLINE\n",
    );
    let emitted = generator.emit_rust().unwrap();
    assert!(emitted.contains("pub struct CalcParser<'s>"));
    assert!(emitted.trim_end().ends_with("// the end"));
}

#[test]
fn emitted_unreachable_marker_test() {
    let grammar = parse_grammar(
        "start: NAME NEWLINE | invalid_thing\n\
         invalid_thing: NUMBER NEWLINE\n",
        None,
    )
    .unwrap();
    let config = GeneratorConfig {
        call_invalid_rules: true,
        ..GeneratorConfig::default()
    };
    let emitted = ParserGenerator::new(grammar, config)
        .unwrap()
        .emit_rust()
        .unwrap();
    assert!(emitted.contains("unreachable!()"));
}

#[test]
fn memoization_idempotence_across_positions_test() {
    // The same rule invoked twice at one position must leave one cache entry
    // and the same stream state; exercised here through heavy backtracking.
    let parser = make_parser(
        "start: NAME '+' NAME NEWLINE | NAME '+' NUMBER NEWLINE | NAME NEWLINE\n",
    );
    parse(&parser, "a + 1\n");
    parse(&parser, "a\n");
}

//! A four-operation calculator over integers, with parentheses.
//!
//! The expression rules are left recursive, so `1-2-3` parses as `(1-2)-3`.

use crate::generator::{GeneratorConfig, ParserGenerator};
use crate::metagrammar::parse_grammar;
use crate::runtime::CompiledParser;

pub const CALC_GRAMMAR: &str = "\
start: expr NEWLINE $
expr:
    | expr '+' term
    | expr '-' term
    | term
term:
    | term '*' factor
    | term '/' factor
    | factor
factor: '(' expr ')' | NUMBER
";

pub fn calc_parser() -> CompiledParser {
    let grammar = parse_grammar(CALC_GRAMMAR, None).unwrap();
    let generator = ParserGenerator::new(grammar, GeneratorConfig::default()).unwrap();
    generator.compile().unwrap()
}

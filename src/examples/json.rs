//! A JSON subset: objects, arrays, strings, non-negative numbers and the three
//! keyword constants. Close enough to exercise gathers, keywords and nesting.

use crate::generator::{GeneratorConfig, ParserGenerator};
use crate::metagrammar::parse_grammar;
use crate::runtime::CompiledParser;

pub const JSON_GRAMMAR: &str = "\
start: value NEWLINE $
value:
    | object
    | array
    | STRING
    | NUMBER
    | 'true'
    | 'false'
    | 'null'
object: '{' ','.member+ '}' | '{' '}'
member: STRING ':' value
array: '[' ','.value+ ']' | '[' ']'
";

pub fn json_parser() -> CompiledParser {
    let grammar = parse_grammar(JSON_GRAMMAR, None).unwrap();
    let generator = ParserGenerator::new(grammar, GeneratorConfig::default()).unwrap();
    generator.compile().unwrap()
}

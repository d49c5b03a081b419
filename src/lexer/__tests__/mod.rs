use crate::lexer::Lexer;
use crate::TokenKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    Lexer::new(source).map(|t| t.unwrap().kind).collect()
}

fn texts(source: &str) -> Vec<(TokenKind, String)> {
    Lexer::new(source)
        .map(|t| {
            let t = t.unwrap();
            (t.kind, t.text)
        })
        .collect()
}

#[test]
fn simple_line_test() {
    assert_eq!(
        texts("start: sum NEWLINE\n"),
        vec![
            (TokenKind::Name, "start".to_string()),
            (TokenKind::Op, ":".to_string()),
            (TokenKind::Name, "sum".to_string()),
            (TokenKind::Name, "NEWLINE".to_string()),
            (TokenKind::Newline, "\n".to_string()),
            (TokenKind::Endmarker, "".to_string()),
        ]
    );
}

#[test]
fn operator_longest_match_test() {
    let tokens = texts("a<=b==c->d\n");
    let ops: Vec<&str> = tokens
        .iter()
        .filter(|(k, _)| *k == TokenKind::Op)
        .map(|(_, s)| s.as_str())
        .collect();
    assert_eq!(ops, vec!["<=", "==", "->"]);
}

#[test]
fn indent_dedent_test() {
    assert_eq!(
        kinds("rule:\n    | alt\n"),
        vec![
            TokenKind::Name,
            TokenKind::Op,
            TokenKind::Newline,
            TokenKind::Indent,
            TokenKind::Op,
            TokenKind::Name,
            TokenKind::Newline,
            TokenKind::Dedent,
            TokenKind::Endmarker,
        ]
    );
}

#[test]
fn nested_dedents_test() {
    let stream = kinds("a:\n    b:\n        c\n");
    let dedents = stream
        .iter()
        .filter(|k| **k == TokenKind::Dedent)
        .count();
    let indents = stream
        .iter()
        .filter(|k| **k == TokenKind::Indent)
        .count();
    assert_eq!(indents, 2);
    assert_eq!(dedents, 2);
    assert_eq!(stream.last(), Some(&TokenKind::Endmarker));
}

#[test]
fn blank_and_comment_lines_are_non_logical_test() {
    assert_eq!(
        kinds("a\n\n# note\nb\n"),
        vec![
            TokenKind::Name,
            TokenKind::Newline,
            TokenKind::Nl,
            TokenKind::Comment,
            TokenKind::Nl,
            TokenKind::Name,
            TokenKind::Newline,
            TokenKind::Endmarker,
        ]
    );
}

#[test]
fn newline_inside_brackets_is_non_logical_test() {
    assert_eq!(
        kinds("(a\n b)\n"),
        vec![
            TokenKind::Op,
            TokenKind::Name,
            TokenKind::Nl,
            TokenKind::Name,
            TokenKind::Op,
            TokenKind::Newline,
            TokenKind::Endmarker,
        ]
    );
}

#[test]
fn string_literal_test() {
    assert_eq!(
        texts(r#"'+' "match""#),
        vec![
            (TokenKind::String, "'+'".to_string()),
            (TokenKind::String, "\"match\"".to_string()),
            (TokenKind::Newline, "".to_string()),
            (TokenKind::Endmarker, "".to_string()),
        ]
    );
}

#[test]
fn missing_final_newline_is_supplied_test() {
    assert_eq!(
        kinds("x"),
        vec![TokenKind::Name, TokenKind::Newline, TokenKind::Endmarker]
    );
}

#[test]
fn inconsistent_dedent_test() {
    let result: Result<Vec<_>, _> = Lexer::new("a:\n        b\n    c\n").collect();
    let err = result.unwrap_err();
    assert!(err.is_indentation(), "expected indentation failure: {}", err);
}

#[test]
fn error_token_test() {
    let tokens = texts("a ` b\n");
    assert!(tokens.contains(&(TokenKind::ErrorToken, "`".to_string())));
}

#[test]
fn positions_test() {
    let tokens: Vec<_> = Lexer::new("ab cd\n").map(|t| t.unwrap()).collect();
    assert_eq!(tokens[0].start.line, 1);
    assert_eq!(tokens[0].start.column, 0);
    assert_eq!(tokens[0].end.column, 2);
    assert_eq!(tokens[1].start.column, 3);
    assert_eq!(tokens[1].line, "ab cd\n");
}

use crate::runtime::Parser;
use crate::{
    CacheKey, Mark, ParsedResult, Position, SyntaxErrorKind, Token, TokenKind, TokenStream, Value,
};
use std::cell::Cell;
use std::collections::HashSet;

fn tok(kind: TokenKind, text: &str) -> Token {
    Token::new(kind, text, Position::new(1, 0), Position::new(1, 1), "")
}

fn stream_of(tokens: Vec<Token>) -> TokenStream<'static> {
    TokenStream::new(Box::new(tokens.into_iter().map(Ok)))
}

#[test]
fn mark_reset_round_trip_test() {
    let mut stream = TokenStream::from_text("a b c\n");
    stream.advance().unwrap();
    stream.advance().unwrap();
    assert_eq!(stream.mark(), Mark(2));

    let expected = stream.peek().unwrap().clone();
    stream.advance().unwrap();

    stream.reset(Mark(2));
    assert_eq!(stream.mark(), Mark(2));
    assert_eq!(stream.peek().unwrap(), &expected);

    stream.reset(Mark(0));
    assert_eq!(stream.mark(), Mark(0));
    assert_eq!(stream.peek().unwrap().text, "a");
}

#[test]
fn relevance_filter_test() {
    let mut stream = stream_of(vec![
        tok(TokenKind::Name, "a"),
        tok(TokenKind::Comment, "# hi"),
        tok(TokenKind::Nl, "\n"),
        tok(TokenKind::Newline, "\n"),
        tok(TokenKind::Newline, "\n"),
        tok(TokenKind::ErrorToken, " "),
        tok(TokenKind::ErrorToken, "$"),
        tok(TokenKind::Endmarker, ""),
    ]);
    let mut kinds = Vec::new();
    loop {
        let token = stream.advance().unwrap();
        let kind = token.kind;
        kinds.push(kind);
        if kind == TokenKind::Endmarker {
            break;
        }
    }
    // Comments, non-logical newlines, whitespace error tokens and the second of
    // two consecutive logical newlines are all dropped at intake.
    assert_eq!(
        kinds,
        vec![
            TokenKind::Name,
            TokenKind::Newline,
            TokenKind::ErrorToken,
            TokenKind::Endmarker,
        ]
    );
}

#[test]
fn furthest_tracks_maximum_advance_test() {
    let mut stream = TokenStream::from_text("a b c\n");
    stream.advance().unwrap();
    stream.advance().unwrap();
    stream.reset(Mark(0));
    stream.advance().unwrap();
    assert_eq!(stream.furthest(), Mark(2));
}

#[test]
fn last_non_whitespace_test() {
    let mut stream = TokenStream::from_text("a\n");
    stream.advance().unwrap();
    stream.advance().unwrap();
    let token = stream.last_non_whitespace().unwrap();
    assert_eq!(token.text, "a");
}

#[test]
fn source_line_test() {
    let mut stream = TokenStream::from_text("first\nsecond\n");
    while stream.advance().unwrap().kind != TokenKind::Endmarker {}
    assert_eq!(stream.source_line(1).unwrap(), "first\n");
    assert_eq!(stream.source_line(2).unwrap(), "second\n");
}

fn parser_for(source: &str) -> Parser<'_> {
    let mut keywords = HashSet::new();
    keywords.insert("if".to_string());
    let mut soft_keywords = HashSet::new();
    soft_keywords.insert("match".to_string());
    Parser::with_keywords(TokenStream::from_text(source), keywords, soft_keywords)
}

#[test]
fn expect_hard_keyword_test() {
    let mut parser = parser_for("if x\n");
    assert!(parser.expect("if").unwrap().is_some());
    // 'if' is reserved as a NAME spelling, not as a kind.
    assert!(parser.expect("if").unwrap().is_none());
    assert!(parser.expect("NAME").unwrap().is_some());
}

#[test]
fn expect_kind_name_test() {
    let mut parser = parser_for("hello 42 'str'\n");
    assert!(parser.expect("NAME").unwrap().is_some());
    assert!(parser.expect("NUMBER").unwrap().is_some());
    assert!(parser.expect("STRING").unwrap().is_some());
    assert!(parser.expect("NEWLINE").unwrap().is_some());
    assert!(parser.expect("ENDMARKER").unwrap().is_some());
}

#[test]
fn expect_operator_spelling_test() {
    let mut parser = parser_for("+ <=\n");
    assert!(parser.expect("+").unwrap().is_some());
    assert!(parser.expect("<=").unwrap().is_some());
}

#[test]
fn expect_soft_keyword_test() {
    let mut parser = parser_for("match other\n");
    assert!(parser.expect("match").unwrap().is_some());
    // A soft keyword spelling only matches its own text.
    assert!(parser.expect("match").unwrap().is_none());
    assert!(parser.expect("other").unwrap().is_some());
}

#[test]
fn expect_failure_leaves_index_test() {
    let mut parser = parser_for("a b\n");
    let mark = parser.mark();
    assert!(parser.expect("+").unwrap().is_none());
    assert_eq!(parser.mark(), mark);
}

#[test]
fn lookahead_restores_position_test() {
    let mut parser = parser_for("a b\n");
    let mark = parser.mark();
    let found = parser
        .positive_lookahead(|p| p.expect("a"))
        .unwrap();
    assert!(found);
    assert_eq!(parser.mark(), mark);

    let absent = parser
        .negative_lookahead(|p| p.expect("z"))
        .unwrap();
    assert!(absent);
    assert_eq!(parser.mark(), mark);
}

#[test]
fn forced_failure_test() {
    let mut parser = parser_for("x\n");
    parser.expect("NAME").unwrap();
    let err = parser
        .forced(|p| p.expect(":"), "':'")
        .unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Forced);
    assert!(err.message.contains("expected ':'"), "{}", err.message);
}

#[test]
fn forced_indent_failure_shape_test() {
    let mut parser = parser_for("header\nx\n");
    parser.expect("NAME").unwrap();
    parser.expect("NEWLINE").unwrap();
    let err = parser
        .forced(|p| p.expect("INDENT"), "INDENT")
        .unwrap_err();
    assert_eq!(err.kind, SyntaxErrorKind::Indentation);
    assert!(
        err.message
            .contains("expected an indented block after 'header' statement on line 1"),
        "{}",
        err.message
    );
}

#[test]
fn memoize_idempotence_test() {
    let mut parser = parser_for("a a a\n");
    let calls = Cell::new(0usize);
    let body = |p: &mut Parser| -> ParsedResult<Value> {
        calls.set(calls.get() + 1);
        Ok(p.expect("NAME")?.map(Value::Token))
    };

    let first = parser.memoize(CacheKey(7), 0, body).unwrap();
    let end = parser.mark();
    parser.reset(Mark(0));
    let second = parser.memoize(CacheKey(7), 0, body).unwrap();

    assert_eq!(calls.get(), 1);
    assert_eq!(parser.mark(), end);
    assert_eq!(
        first.as_ref().map(|v| v.token_text().to_string()),
        second.as_ref().map(|v| v.token_text().to_string())
    );
}

#[test]
fn memoize_skips_writes_during_recursion_test() {
    let mut parser = parser_for("a a\n");
    let calls = Cell::new(0usize);
    let body = |p: &mut Parser| -> ParsedResult<Value> {
        calls.set(calls.get() + 1);
        Ok(p.expect("NAME")?.map(Value::Token))
    };

    parser.begin_recursion();
    parser.memoize(CacheKey(3), 0, body).unwrap();
    parser.reset(Mark(0));
    parser.memoize(CacheKey(3), 0, body).unwrap();
    parser.end_recursion();

    assert_eq!(calls.get(), 2);
}

/// expr: expr '+' NUMBER | NUMBER, written directly against the primitives.
fn expr(p: &mut Parser) -> ParsedResult<Value> {
    p.memoize_left_rec(CacheKey(0), |p| {
        let mark = p.mark();
        if let Some(left) = expr(p)? {
            if p.expect("+")?.is_some() {
                if let Some(number) = p.expect_kind(TokenKind::Number)? {
                    return Ok(Some(Value::Tuple(vec![left, Value::Token(number)])));
                }
            }
        }
        p.reset(mark);
        Ok(p.expect_kind(TokenKind::Number)?.map(Value::Token))
    })
}

#[test]
fn seed_growth_left_associates_test() {
    let mut parser = parser_for("1+2+3\n");
    let value = expr(&mut parser).unwrap().unwrap();
    assert_eq!(format!("{}", value), "((1 2) 3)");
    assert!(parser.expect("NEWLINE").unwrap().is_some());
}

#[test]
fn seed_growth_single_seed_test() {
    let mut parser = parser_for("7\n");
    let value = expr(&mut parser).unwrap().unwrap();
    assert_eq!(value.token_text(), "7");
}

#[test]
fn seed_growth_failure_test() {
    let mut parser = parser_for("+\n");
    assert!(expr(&mut parser).unwrap().is_none());
    assert_eq!(parser.mark(), Mark(0));
}

#[test]
fn make_syntax_error_reports_furthest_test() {
    let mut parser = parser_for("a b\n");
    parser.expect("NAME").unwrap();
    parser.expect("NAME").unwrap();
    parser.reset(Mark(0));
    let err = parser.make_syntax_error("invalid syntax");
    assert_eq!(err.kind, SyntaxErrorKind::Generic);
    // Anchored at the last visible token before the furthest reached point.
    assert_eq!(err.lineno, 1);
    assert_eq!(err.offset, 3);
}

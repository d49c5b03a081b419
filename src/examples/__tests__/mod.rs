use crate::examples::calc::calc_parser;
use crate::examples::json::json_parser;
use crate::Value;

/// Evaluate the calculator's default parse tree.
fn eval(value: &Value) -> f64 {
    match value {
        Value::Token(token) => token.text.parse().unwrap(),
        Value::Tuple(items) if items.len() == 3 => {
            if items[0].token_text() == "(" {
                return eval(&items[1]);
            }
            let left = eval(&items[0]);
            let right = eval(&items[2]);
            match items[1].token_text() {
                "+" => left + right,
                "-" => left - right,
                "*" => left * right,
                "/" => left / right,
                other => panic!("unexpected operator {:?}", other),
            }
        }
        other => panic!("unexpected node {:?}", other),
    }
}

fn calc(input: &str) -> f64 {
    let parser = calc_parser();
    let tree = match parser.parse_string(input) {
        Ok(tree) => tree,
        Err(err) => panic!("{}", err),
    };
    // start is (expr NEWLINE ENDMARKER)
    eval(&tree.items()[0])
}

#[test]
fn calc_single_number_test() {
    assert_eq!(calc("42\n"), 42.0);
}

#[test]
fn calc_left_associativity_test() {
    // (1-2)-3, not 1-(2-3)
    assert_eq!(calc("1-2-3\n"), -4.0);
    assert_eq!(calc("8/4/2\n"), 1.0);
}

#[test]
fn calc_precedence_test() {
    assert_eq!(calc("1+2*3\n"), 7.0);
    assert_eq!(calc("(1+2)*3\n"), 9.0);
}

#[test]
fn calc_rejects_garbage_test() {
    let parser = calc_parser();
    assert!(parser.parse_string("1+\n").is_err());
    assert!(parser.parse_string("+1\n").is_err());
}

#[test]
fn json_agrees_with_serde_on_acceptance_test() {
    let parser = json_parser();
    let good = [
        r#"{}"#,
        r#"[]"#,
        r#""hello""#,
        r#"{"a": 1, "b": [true, false, null]}"#,
        r#"[1, 2, [3, {"x": "y"}]]"#,
        r#"{"nested": {"deep": {"deeper": []}}}"#,
    ];
    for doc in good {
        let ours = parser.parse_string(&format!("{}\n", doc));
        let oracle: Result<serde_json::Value, _> = serde_json::from_str(doc);
        assert!(oracle.is_ok(), "oracle rejected {}", doc);
        if let Err(err) = &ours {
            panic!("rejected {}: {}", doc, err);
        }
    }
}

#[test]
fn json_agrees_with_serde_on_rejection_test() {
    let parser = json_parser();
    let bad = [
        r#"{"a": 1,}"#,
        r#"{"a" 1}"#,
        r#"[1, 2"#,
        r#"{1: 2}"#,
        r#"[,]"#,
    ];
    for doc in bad {
        let ours = parser.parse_string(&format!("{}\n", doc));
        let oracle: Result<serde_json::Value, _> = serde_json::from_str(doc);
        assert!(oracle.is_err(), "oracle accepted {}", doc);
        assert!(ours.is_err(), "accepted {}", doc);
    }
}

#[test]
fn json_multiline_document_test() {
    let parser = json_parser();
    let doc = "{\n    \"a\": [1, 2, 3],\n    \"b\": {\"c\": null}\n}\n";
    let tree = parser.parse_string(doc).unwrap();
    tree.print().unwrap();
}

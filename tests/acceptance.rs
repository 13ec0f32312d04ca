mod common;

use grammar_stepper::{AutomatonKind, Grammar, Lr1Acceptor, EOF_TERMINAL};

fn python() -> Lr1Acceptor {
    Lr1Acceptor::new(&common::python_like(), AutomatonKind::Lalr1).unwrap()
}

fn calc() -> Lr1Acceptor {
    Lr1Acceptor::new(&common::calc(), AutomatonKind::Lalr1).unwrap()
}

#[test]
fn arithmetic_sum_parses_and_classifies() {
    let mut acceptor = calc();
    let out = acceptor.compute_acceptance("113 + 235 + 1111");
    assert_eq!(out.partial_lexeme, "1111");
    let next = out.next.expect("sum ends on a token boundary");
    assert!(next.contains("PLUS"));
    assert!(next.contains(EOF_TERMINAL));
    assert_eq!(acceptor.match_exact("235"), Some("NUMBER"));
}

#[test]
fn unterminated_string_is_a_partial_lexeme() {
    let mut acceptor = python();
    let out = acceptor.compute_acceptance("a=\"shu");
    assert_eq!(out.partial_lexeme, "\"shu");
    assert_eq!(out.next, None);
}

#[test]
fn unterminated_string_deep_in_a_program() {
    let mut acceptor = python();
    let text = "def f():\n\ta = 3 + 5\n\tb = \"shu";
    let out = acceptor.compute_acceptance(text);
    assert_eq!(out.partial_lexeme, "\"shu");
    assert_eq!(out.next, None);
}

#[test]
fn freshly_opened_block_expects_a_tab() {
    let mut acceptor = python();
    let out = acceptor.compute_acceptance("def f():\n");
    let next = out.next.expect("line is complete");
    assert!(next.contains("_TAB"));
    assert!(next.contains("_NL"));
    assert!(!next.contains("_INDENT"));
    assert!(!next.contains("_DEDENT"));
}

#[test]
fn statement_lines_inside_a_block_expect_a_tab() {
    let mut acceptor = python();
    let out = acceptor.compute_acceptance("def f():\n\tif a:\n\t\treturn b\n");
    let next = out.next.expect("line is complete");
    assert!(next.contains("_TAB"));
    assert!(next.contains("_NL"));
}

#[test]
fn fully_indented_line_expects_no_further_tab() {
    let mut acceptor = python();
    let text = "def f():\n\tif a:\n\t\tif b:\n\t\t\tif c:\n\t\t\t\ta = 1\n\t\t\t\t";
    let out = acceptor.compute_acceptance(text);
    let next = out.next.expect("trailing tabs fold into the newline lexeme");
    assert!(!next.contains("_TAB"));
    assert!(next.contains("_NL"));
    assert!(!next.contains("_INDENT"));
    assert!(!next.contains("_DEDENT"));
}

#[test]
fn exact_classification_follows_the_catalog() {
    let acceptor = python();
    assert_eq!(acceptor.match_exact("\t"), Some("_TAB"));
    assert_eq!(acceptor.match_exact("\n"), Some("_NL"));
    assert_eq!(acceptor.match_exact("def"), Some("DEF"));
    assert_eq!(acceptor.match_exact("if"), Some("IF"));
    assert_eq!(acceptor.match_exact("return"), Some("RETURN"));
    assert_eq!(acceptor.match_exact("1234"), Some("DEC_NUMBER"));
    assert_eq!(acceptor.match_exact("12.34"), Some("FLOAT_NUMBER"));
    assert_eq!(acceptor.match_exact("pqr"), Some("NAME"));
    assert_eq!(acceptor.match_exact("\"ssss\""), Some("STRING"));
    assert_eq!(acceptor.match_exact("\"\"\"x"), None);
    assert_eq!(acceptor.match_exact("!"), None);
}

#[test]
fn prefix_classification_skips_opaque_terminals() {
    let acceptor = python();
    assert_eq!(acceptor.prefix_match("", "12"), Some("DEC_NUMBER"));
    assert_eq!(acceptor.prefix_match("12", "."), Some("FLOAT_NUMBER"));
    assert_eq!(acceptor.prefix_match("ab", "c"), Some("NAME"));
    // STRING is prefix-opaque; nothing else can continue an open quote.
    assert_eq!(acceptor.prefix_match("\"sh", "u"), None);
}

#[test]
fn newlines_inside_parentheses_do_not_indent() {
    let mut acceptor = python();
    let out = acceptor.compute_acceptance("a = f(1,\n\t2)\n");
    let next = out.next.expect("line is complete");
    assert!(next.contains(EOF_TERMINAL));
    assert!(next.contains("NAME"));
    assert!(!next.contains("_TAB"));
}

#[test]
fn generation_loop_reaches_the_unterminated_string() {
    // The decoding-loop shape from the original test bed: grow the text a
    // couple of characters at a time and query after every step.
    let mut acceptor = python();
    let prompt = "def f():\n";
    let generated = "\tif a:\n\t\treturn g(a, 1)\n\tb = 3\n\tc = \"shu";
    let mut out = acceptor.compute_acceptance(prompt);
    let mut end = 0;
    while end < generated.len() {
        end = (end + 2).min(generated.len());
        out = acceptor.compute_acceptance(&format!("{prompt}{}", &generated[..end]));
    }
    assert_eq!(out.partial_lexeme, "\"shu");
    assert_eq!(out.next, None);
}

#[test]
fn backtracking_to_a_shared_prefix_matches_fresh_parsing() {
    let mut acceptor = python();
    acceptor.compute_acceptance("def f():\n\treturn 1\n");
    let rewound = acceptor.compute_acceptance("def g(x):\n");
    let fresh = python().compute_acceptance("def g(x):\n");
    assert_eq!(rewound, fresh);
}

#[test]
fn lalr_and_lr_kinds_answer_identically() {
    let grammar = common::python_like();
    let mut lalr = Lr1Acceptor::new(&grammar, AutomatonKind::Lalr1).unwrap();
    let mut lr = Lr1Acceptor::new(&grammar, AutomatonKind::Lr1).unwrap();
    for text in ["def f():\n", "def f():\n\ta = 1 + 2\n", "a=\"shu"] {
        assert_eq!(lalr.compute_acceptance(text), lr.compute_acceptance(text));
    }
}

#[test]
fn grammar_descriptions_load_from_json() {
    let json = r#"{
        "productions": "%start expr\n%token NUMBER PLUS\n%%\nexpr: expr PLUS NUMBER | NUMBER ;\n",
        "terminals": [
            {"name": "PLUS", "kind": "literal", "pattern": "+"},
            {"name": "NUMBER", "kind": "regex", "pattern": "[0-9]+"},
            {"name": "WS", "kind": "regex", "pattern": "[ \t]+"}
        ],
        "skip": ["WS"]
    }"#;
    let grammar = Grammar::from_json(json).unwrap();
    assert_eq!(grammar.indentation.tab, "_TAB");
    assert!(grammar.prefix_opaque.contains(&"STRING".to_string()));
    let mut acceptor = Lr1Acceptor::new(&grammar, AutomatonKind::Lalr1).unwrap();
    let out = acceptor.compute_acceptance("1 + 2");
    assert!(out.next.expect("complete").contains("PLUS"));
}

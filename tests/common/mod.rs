#![allow(dead_code)]

use grammar_stepper::{Grammar, IndentationConfig, TerminalDef};

/// A Python-flavored block grammar: assignments, calls, sums, `if`/`def`
/// compounds with tab-indented suites.
pub fn python_like() -> Grammar {
    let productions = "\
%start file_input
%token NAME DEC_NUMBER FLOAT_NUMBER STRING DEF IF RETURN PLUS EQUAL COLON COMMA LPAR RPAR _NL _INDENT _DEDENT
%%
file_input: stmts ;
stmts: stmts stmt | stmt ;
stmt: simple_stmt | compound_stmt ;
simple_stmt: small_stmt _NL ;
small_stmt: NAME EQUAL expr | RETURN expr | expr ;
expr: expr PLUS term | term ;
term: atom | atom LPAR args RPAR ;
atom: NAME | DEC_NUMBER | FLOAT_NUMBER | STRING | LPAR expr RPAR ;
args: | arg_list ;
arg_list: arg_list COMMA expr | expr ;
compound_stmt: if_stmt | func_def ;
if_stmt: IF expr COLON suite ;
func_def: DEF NAME LPAR params RPAR COLON suite ;
params: | param_list ;
param_list: param_list COMMA NAME | NAME ;
suite: _NL _INDENT stmts _DEDENT ;
"
    .to_string();
    Grammar {
        productions,
        terminals: vec![
            TerminalDef::literal("DEF", "def"),
            TerminalDef::literal("IF", "if"),
            TerminalDef::literal("RETURN", "return"),
            TerminalDef::literal("PLUS", "+"),
            TerminalDef::literal("EQUAL", "="),
            TerminalDef::literal("COLON", ":"),
            TerminalDef::literal("COMMA", ","),
            TerminalDef::literal("LPAR", "("),
            TerminalDef::literal("RPAR", ")"),
            TerminalDef::regex("NAME", "[a-zA-Z_][a-zA-Z0-9_]*"),
            TerminalDef::regex("FLOAT_NUMBER", r"[0-9]+\.[0-9]+"),
            TerminalDef::regex("DEC_NUMBER", "[0-9]+"),
            TerminalDef::regex("STRING", r#""[^"\\\n]*(\\.[^"\\\n]*)*""#),
            TerminalDef::regex("_NL", r"(\r?\n[\t ]*)+"),
            TerminalDef::regex("WS", r"[ \t]+"),
            TerminalDef::regex("COMMENT", r"#[^\n]*"),
        ],
        skip: vec!["WS".to_string(), "COMMENT".to_string()],
        prefix_opaque: vec![
            "_NL".to_string(),
            "COMMENT".to_string(),
            "STRING".to_string(),
            "IMAG_NUMBER".to_string(),
        ],
        indentation: IndentationConfig::default(),
    }
}

/// Flat arithmetic sums, no indentation in play.
pub fn calc() -> Grammar {
    Grammar {
        productions: "\
%start expr
%token NUMBER PLUS
%%
expr: expr PLUS NUMBER | NUMBER ;
"
        .to_string(),
        terminals: vec![
            TerminalDef::literal("PLUS", "+"),
            TerminalDef::regex("NUMBER", "[0-9]+"),
            TerminalDef::regex("WS", "[ \t]+"),
        ],
        skip: vec!["WS".to_string()],
        prefix_opaque: vec![],
        indentation: IndentationConfig::default(),
    }
}

//! End-to-end grammar tests over the public API.
//!
//! Trees are inspected through their ESTree JSON, the same shape consumers see.

use esparse::{Node, ParseOptions};
use serde_json::{json, Value};

fn tree(source: &str, options: &ParseOptions) -> Value {
    let program = esparse::parse(source, options).unwrap_or_else(|e| panic!("{source:?}: {e}"));
    serde_json::to_value(&program).unwrap()
}

fn script(source: &str) -> Value {
    tree(source, &ParseOptions::default())
}

fn expr(source: &str) -> Value {
    script(source)["body"][0]["expression"].clone()
}

fn error(source: &str, options: &ParseOptions) -> String {
    match esparse::parse(source, options) {
        Ok(_) => panic!("{source:?} should not parse"),
        Err(e) => e.description,
    }
}

// ============================================================================
// Expressions
// ============================================================================

#[test]
fn test_default_precedence() {
    let e = expr("a * b << c");
    assert_eq!(e["operator"], "<<");
    assert_eq!(e["left"]["operator"], "*");

    let e = expr("a || b && c | d");
    assert_eq!(e["type"], "LogicalExpression");
    assert_eq!(e["operator"], "||");
    assert_eq!(e["right"]["operator"], "&&");
    assert_eq!(e["right"]["right"]["type"], "BinaryExpression");
}

#[test]
fn test_precedence_override() {
    let options = ParseOptions::default().with_operator_precedence(|op| (op == "<<").then_some(16));
    let program = tree("a * b << c", &options);
    let e = &program["body"][0]["expression"];
    assert_eq!(e["operator"], "*");
    assert_eq!(e["right"]["operator"], "<<");
}

/// Operator nesting with every position dropped, for comparing trees.
fn shape(e: &Value) -> Value {
    match e["type"].as_str() {
        Some("BinaryExpression" | "LogicalExpression") => {
            json!([shape(&e["left"]), e["operator"], shape(&e["right"])])
        }
        _ => e["name"].clone(),
    }
}

#[test]
fn test_parentheses_ignore_the_table() {
    let shifted = ParseOptions::default().with_operator_precedence(|op| (op == "<<").then_some(16));
    for options in [ParseOptions::default(), shifted] {
        let program = tree("a * (b << c); (a * b) << c", &options);
        assert_eq!(shape(&program["body"][0]["expression"]), json!(["a", "*", ["b", "<<", "c"]]));
        assert_eq!(shape(&program["body"][1]["expression"]), json!([["a", "*", "b"], "<<", "c"]));
    }
}

#[test]
fn test_and_or_mix_freely() {
    let e = expr("a && b || c");
    assert_eq!(e["type"], "LogicalExpression");
    assert_eq!(e["operator"], "||");
    assert_eq!(e["left"]["type"], "LogicalExpression");
    assert_eq!(e["left"]["operator"], "&&");
    assert_eq!(shape(&expr("a || b && c")), json!(["a", "||", ["b", "&&", "c"]]));

    let lifted = ParseOptions::default().with_operator_precedence(|op| (op == "??").then_some(10));
    assert_eq!(error("a ?? b || c", &lifted), "Unexpected token ||");
    assert_eq!(error("a && b ?? c", &lifted), "Unexpected token ??");
}

#[test]
fn test_exponent_is_right_associative() {
    let e = expr("a ** b ** c");
    assert_eq!(e["left"]["name"], "a");
    assert_eq!(e["right"]["operator"], "**");
    assert_eq!(error("-a ** b", &ParseOptions::default()), "Unexpected token **");
}

#[test]
fn test_nullish_cannot_mix_with_logical() {
    let options = ParseOptions::default();
    assert_eq!(error("a && b ?? c", &options), "Unexpected token ??");
    assert_eq!(error("a ?? b || c", &options), "Unexpected token ||");
    assert_eq!(expr("(a && b) ?? c")["operator"], "??");

    // Equal strengths do not make the mix legal.
    let flat = ParseOptions::default().with_operator_precedence(|op| matches!(op, "??" | "||" | "&&").then_some(6));
    assert_eq!(error("a || b ?? c", &flat), "Unexpected token ??");
}

#[test]
fn test_arrow_versus_sequence() {
    let e = expr("(a, b) => a");
    assert_eq!(e["type"], "ArrowFunctionExpression");
    assert_eq!(e["params"].as_array().unwrap().len(), 2);
    assert_eq!(e["expression"], true);

    let e = expr("(a, b)");
    assert_eq!(e["type"], "SequenceExpression");

    let e = expr("({ x = 1, ...r }) => x");
    assert_eq!(e["params"][0]["type"], "ObjectPattern");
    assert_eq!(e["params"][0]["properties"][0]["value"]["type"], "AssignmentPattern");
    assert_eq!(e["params"][0]["properties"][1]["type"], "RestElement");

    let e = expr("async (x) => await x");
    assert_eq!(e["async"], true);
    assert_eq!(e["body"]["type"], "AwaitExpression");

    let e = expr("async(x)");
    assert_eq!(e["type"], "CallExpression");
    assert_eq!(e["callee"]["name"], "async");
}

#[test]
fn test_cover_grammar_errors() {
    let options = ParseOptions::default();
    assert_eq!(error("({ a = 1 })", &options), "Unexpected token =");
    assert_eq!(error("(x, x) => 1", &options), "Duplicate parameter name not allowed in this context");
    assert_eq!(error("1 = 2", &options), "Invalid left-hand side in assignment");
    assert_eq!(error("(a + b) => 1", &options), "Unexpected token =>");
}

#[test]
fn test_optional_chain() {
    let e = expr("a?.b.c()");
    assert_eq!(e["type"], "ChainExpression");
    assert_eq!(e["expression"]["type"], "CallExpression");
    assert_eq!(e["expression"]["callee"]["object"]["optional"], true);

    assert_eq!(error("a?.b`t`", &ParseOptions::default()), "Invalid tagged template on optional chain");
}

#[test]
fn test_templates_and_regex() {
    let e = expr("tag`a${b}c`");
    assert_eq!(e["type"], "TaggedTemplateExpression");
    let quasis = e["quasi"]["quasis"].as_array().unwrap();
    assert_eq!(quasis.len(), 2);
    assert_eq!(quasis[0]["value"]["cooked"], "a");
    assert_eq!(quasis[1]["tail"], true);

    let e = expr("x = /[/]+/g");
    assert_eq!(e["right"]["regex"], json!({"pattern": "[/]+", "flags": "g"}));
}

#[test]
fn test_classes() {
    let program = script("class A extends B { static s() {} *m() {} get x() { return 1 } set x(v) {} constructor() { super() } }");
    let class = &program["body"][0];
    assert_eq!(class["type"], "ClassDeclaration");
    assert_eq!(class["superClass"]["name"], "B");
    let body = class["body"]["body"].as_array().unwrap();
    assert_eq!(body[0]["static"], true);
    assert_eq!(body[1]["value"]["generator"], true);
    assert_eq!(body[2]["kind"], "get");
    assert_eq!(body[3]["kind"], "set");
    assert_eq!(body[4]["kind"], "constructor");

    let options = ParseOptions::default();
    assert_eq!(error("class A { constructor() {} constructor() {} }", &options), "A class may only have one constructor");
    assert_eq!(error("class A { static prototype() {} }", &options), "Classes may not have static property named prototype");
}

#[test]
fn test_generators_and_async() {
    let program = script("function* g() { yield* h(); } async function f() { for await (const x of y) {} }");
    let g = &program["body"][0];
    assert_eq!(g["generator"], true);
    assert_eq!(g["body"]["body"][0]["expression"]["delegate"], true);
    let f = &program["body"][1];
    assert_eq!(f["async"], true);
    assert_eq!(f["body"]["body"][0]["await"], true);
}

#[test]
fn test_directives_and_strict_mode() {
    let program = script("'use strict'; x");
    assert_eq!(program["body"][0]["directive"], "use strict");
    assert_eq!(error("'use strict'; with (a) {}", &ParseOptions::default()), "Strict mode code may not include a with statement");
    assert_eq!(error("'use strict'; 010", &ParseOptions::default()), "Octal literals are not allowed in strict mode.");
    assert_eq!(error("function f(a = 1) { 'use strict' }", &ParseOptions::default()), "Illegal 'use strict' directive in function with non-simple parameter list");
}

// ============================================================================
// Modules
// ============================================================================

#[test]
fn test_module_items() {
    let program = esparse::parse_module(
        "import d, * as ns from 'm'; export const x = 1; export * from 'n'; export default class {}",
        &ParseOptions::default(),
    )
    .unwrap();
    assert_eq!(program.body().len(), 4);
    let json = serde_json::to_value(&program).unwrap();
    assert_eq!(json["sourceType"], "module");
    assert_eq!(json["body"][0]["specifiers"][1]["type"], "ImportNamespaceSpecifier");
    assert_eq!(json["body"][2]["source"]["value"], "n");
    assert_eq!(json["body"][3]["declaration"]["type"], "ClassDeclaration");
}

#[test]
fn test_module_is_strict() {
    let module = ParseOptions::new().with_module();
    assert_eq!(error("var yield;", &module), "Use of future reserved word in strict mode");
    assert_eq!(error("delete x;", &module), "Delete of an unqualified identifier in strict mode.");
}

// ============================================================================
// JSX
// ============================================================================

#[test]
fn test_jsx_namespaced_element() {
    let options = ParseOptions::default().with_jsx(true);
    let program = tree("<a:b x={1}>{y}</a:b>", &options);
    let el = &program["body"][0]["expression"];
    assert_eq!(el["type"], "JSXElement");
    assert_eq!(el["openingElement"]["name"]["type"], "JSXNamespacedName");
    assert_eq!(el["openingElement"]["name"]["namespace"]["name"], "a");
    assert_eq!(el["openingElement"]["attributes"][0]["value"]["expression"]["value"], 1);
    assert_eq!(el["children"][0]["type"], "JSXExpressionContainer");
    assert_eq!(el["closingElement"]["name"]["name"]["name"], "b");
}

#[test]
fn test_jsx_member_names_must_match() {
    let options = ParseOptions::default().with_jsx(true);
    let program = tree("<A.B.C />", &options);
    let name = &program["body"][0]["expression"]["openingElement"]["name"];
    assert_eq!(name["type"], "JSXMemberExpression");
    assert_eq!(name["object"]["type"], "JSXMemberExpression");
    assert_eq!(name["property"]["name"], "C");

    assert_eq!(
        error("<A.B></A.C>", &options),
        "Expected corresponding JSX closing tag for A.B"
    );
}

// ============================================================================
// Locations
// ============================================================================

fn assert_nested(node: &Node, len: u32) {
    assert!(node.span.start <= node.span.end && node.span.end <= len, "{:?}", node.kind);
    node.for_each_child(&mut |child| {
        assert!(node.span.covers(child.span), "{:?} escapes {:?}", child.span, node.span);
        assert_nested(child, len);
    });
}

#[test]
fn test_child_ranges_nest() {
    let source = r#"
const { a, b: [c = 1, ...d] } = obj;
label: for (let i = 0; i < 10; i++) { if (i % 2) continue label; else break; }
class K { static x() { return `t${a}` } async *m(p = () => {}) { yield await p?.(q); } }
try { f(new G(...args)) } catch ({ message }) { throw message } finally { }
export default (x) => ({ ...x, [k]: void 0 });
"#;
    let program = esparse::parse_module(source, &ParseOptions::default()).unwrap();
    assert_nested(&program.root, source.len() as u32);
}

#[test]
fn test_range_and_loc_values() {
    let options = ParseOptions::default().with_range(true).with_loc(true).with_source("in.js");
    let program = tree("\n  foo(bar)", &options);
    let call = &program["body"][0]["expression"];
    assert_eq!(call["range"], json!([3, 11]));
    assert_eq!(call["loc"]["start"], json!({"line": 2, "column": 2}));
    assert_eq!(call["loc"]["end"], json!({"line": 2, "column": 10}));
    assert_eq!(call["loc"]["source"], "in.js");
    assert_eq!(call["arguments"][0]["range"], json!([7, 10]));
}

#[test]
fn test_tokens_are_collected() {
    let options = ParseOptions::default().with_tokens(true);
    let program = esparse::parse("let x = 1", &options).unwrap();
    let tokens = program.tokens.expect("tokens requested");
    let kinds: Vec<String> = tokens
        .iter()
        .map(|t| serde_json::to_value(t).unwrap()["type"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(kinds, ["Keyword", "Identifier", "Punctuator", "Numeric"]);
}

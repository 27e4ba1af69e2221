//! AST node types.
//!
//! A single [`Node`] type wraps a [`NodeKind`] tagged variant. Serializing a
//! node with serde produces the ESTree JSON shape: a `type` discriminant, the
//! kind-specific fields, then the optional `range`, `loc` and comment arrays.

use serde::{Serialize, Serializer};

use crate::error::ParseError;
use crate::options::SourceType;
use crate::span::{SourceLocation, Span};
use crate::token::{RegexParts, TokenEntry};

/// Identity of a finalized node within one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NodeId(pub u32);

/// A syntax tree node.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    #[serde(skip)]
    pub id: NodeId,
    #[serde(skip)]
    pub span: Span,
    #[serde(flatten)]
    pub kind: NodeKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leading_comments: Option<Vec<Comment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trailing_comments: Option<Vec<Comment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inner_comments: Option<Vec<Comment>>,
}

// =============================================================================
// Traversal
// =============================================================================

/// Shared body of `for_each_child` and `for_each_child_mut`.
macro_rules! walk_children {
    ($node:expr, $f:expr, $($m:tt)?) => {{
        let f = $f;
        macro_rules! one {
            ($x:expr) => { f($x) };
        }
        macro_rules! opt {
            ($x:expr) => { if let Some(x) = $x { f(x) } };
        }
        macro_rules! list {
            ($x:expr) => { for x in $x { f(x) } };
        }
        macro_rules! holes {
            ($x:expr) => { for x in $x { if let Some(x) = x { f(x) } } };
        }
        match & $($m)? $node.kind {
            NodeKind::Program { body, .. }
            | NodeKind::BlockStatement { body }
            | NodeKind::ClassBody { body } => list!(body),
            NodeKind::ArrayExpression { elements } | NodeKind::ArrayPattern { elements } => holes!(elements),
            NodeKind::ObjectExpression { properties } | NodeKind::ObjectPattern { properties } => list!(properties),
            NodeKind::Property { key, value, .. } | NodeKind::MethodDefinition { key, value, .. } => {
                one!(key);
                one!(value);
            }
            NodeKind::FunctionExpression { id, params, body, .. }
            | NodeKind::ArrowFunctionExpression { id, params, body, .. }
            | NodeKind::FunctionDeclaration { id, params, body, .. } => {
                opt!(id);
                list!(params);
                one!(body);
            }
            NodeKind::ClassExpression { id, super_class, body }
            | NodeKind::ClassDeclaration { id, super_class, body } => {
                opt!(id);
                opt!(super_class);
                one!(body);
            }
            NodeKind::TemplateLiteral { quasis, expressions } => {
                list!(quasis);
                list!(expressions);
            }
            NodeKind::TaggedTemplateExpression { tag, quasi } => {
                one!(tag);
                one!(quasi);
            }
            NodeKind::MemberExpression { object, property, .. }
            | NodeKind::JsxMemberExpression { object, property } => {
                one!(object);
                one!(property);
            }
            NodeKind::CallExpression { callee, arguments, .. } | NodeKind::NewExpression { callee, arguments } => {
                one!(callee);
                list!(arguments);
            }
            NodeKind::ChainExpression { expression }
            | NodeKind::ExpressionStatement { expression }
            | NodeKind::Directive { expression, .. }
            | NodeKind::JsxExpressionContainer { expression } => one!(expression),
            NodeKind::MetaProperty { meta, property } => {
                one!(meta);
                one!(property);
            }
            NodeKind::SpreadElement { argument }
            | NodeKind::RestElement { argument }
            | NodeKind::AwaitExpression { argument }
            | NodeKind::ThrowStatement { argument }
            | NodeKind::JsxSpreadAttribute { argument }
            | NodeKind::UpdateExpression { argument, .. }
            | NodeKind::UnaryExpression { argument, .. } => one!(argument),
            NodeKind::BinaryExpression { left, right, .. }
            | NodeKind::LogicalExpression { left, right, .. }
            | NodeKind::AssignmentExpression { left, right, .. }
            | NodeKind::AssignmentPattern { left, right } => {
                one!(left);
                one!(right);
            }
            NodeKind::ConditionalExpression { test, consequent, alternate } => {
                one!(test);
                one!(consequent);
                one!(alternate);
            }
            NodeKind::YieldExpression { argument, .. } | NodeKind::ReturnStatement { argument } => opt!(argument),
            NodeKind::SequenceExpression { expressions } => list!(expressions),
            NodeKind::ArrowParameterPlaceholder { params, .. } => list!(params),
            NodeKind::IfStatement { test, consequent, alternate } => {
                one!(test);
                one!(consequent);
                opt!(alternate);
            }
            NodeKind::LabeledStatement { label, body } => {
                one!(label);
                one!(body);
            }
            NodeKind::BreakStatement { label } | NodeKind::ContinueStatement { label } => opt!(label),
            NodeKind::WithStatement { object, body } => {
                one!(object);
                one!(body);
            }
            NodeKind::SwitchStatement { discriminant, cases } => {
                one!(discriminant);
                list!(cases);
            }
            NodeKind::SwitchCase { test, consequent } => {
                opt!(test);
                list!(consequent);
            }
            NodeKind::TryStatement { block, handler, finalizer } => {
                one!(block);
                opt!(handler);
                opt!(finalizer);
            }
            NodeKind::CatchClause { param, body } => {
                opt!(param);
                one!(body);
            }
            NodeKind::WhileStatement { test, body } => {
                one!(test);
                one!(body);
            }
            NodeKind::DoWhileStatement { body, test } => {
                one!(body);
                one!(test);
            }
            NodeKind::ForStatement { init, test, update, body } => {
                opt!(init);
                opt!(test);
                opt!(update);
                one!(body);
            }
            NodeKind::ForInStatement { left, right, body, .. } | NodeKind::ForOfStatement { left, right, body, .. } => {
                one!(left);
                one!(right);
                one!(body);
            }
            NodeKind::VariableDeclaration { declarations, .. } => list!(declarations),
            NodeKind::VariableDeclarator { id, init } => {
                one!(id);
                opt!(init);
            }
            NodeKind::ImportDeclaration { specifiers, source } => {
                list!(specifiers);
                one!(source);
            }
            NodeKind::ImportSpecifier { local, imported } => {
                one!(local);
                one!(imported);
            }
            NodeKind::ImportDefaultSpecifier { local } | NodeKind::ImportNamespaceSpecifier { local } => one!(local),
            NodeKind::ExportNamedDeclaration { declaration, specifiers, source } => {
                opt!(declaration);
                list!(specifiers);
                opt!(source);
            }
            NodeKind::ExportDefaultDeclaration { declaration } => one!(declaration),
            NodeKind::ExportAllDeclaration { source } => one!(source),
            NodeKind::ExportSpecifier { local, exported } => {
                one!(local);
                one!(exported);
            }
            NodeKind::JsxElement { opening_element, children, closing_element } => {
                one!(opening_element);
                list!(children);
                opt!(closing_element);
            }
            NodeKind::JsxFragment { opening_fragment, children, closing_fragment } => {
                one!(opening_fragment);
                list!(children);
                one!(closing_fragment);
            }
            NodeKind::JsxOpeningElement { name, attributes, .. } => {
                one!(name);
                list!(attributes);
            }
            NodeKind::JsxClosingElement { name } => one!(name),
            NodeKind::JsxNamespacedName { namespace, name } => {
                one!(namespace);
                one!(name);
            }
            NodeKind::JsxAttribute { name, value } => {
                one!(name);
                opt!(value);
            }
            NodeKind::Identifier { .. }
            | NodeKind::Literal { .. }
            | NodeKind::ThisExpression
            | NodeKind::Super
            | NodeKind::Import
            | NodeKind::TemplateElement { .. }
            | NodeKind::EmptyStatement
            | NodeKind::DebuggerStatement
            | NodeKind::JsxOpeningFragment
            | NodeKind::JsxClosingFragment
            | NodeKind::JsxIdentifier { .. }
            | NodeKind::JsxEmptyExpression
            | NodeKind::JsxText { .. } => {}
        }
    }};
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self {
            id: NodeId::default(),
            span,
            kind,
            range: None,
            loc: None,
            leading_comments: None,
            trailing_comments: None,
            inner_comments: None,
        }
    }

    /// Same position, identity and comments, different kind.
    pub(crate) fn with_kind(self, kind: NodeKind) -> Self {
        Self { kind, ..self }
    }

    /// Name of an `Identifier` node.
    pub fn identifier_name(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Identifier { name } => Some(name),
            _ => None,
        }
    }

    pub fn is_identifier(&self) -> bool {
        matches!(self.kind, NodeKind::Identifier { .. })
    }

    /// Visit direct children.
    pub fn for_each_child(&self, f: &mut dyn FnMut(&Node)) {
        walk_children!(self, f,);
    }

    /// Visit direct children mutably.
    pub fn for_each_child_mut(&mut self, f: &mut dyn FnMut(&mut Node)) {
        walk_children!(self, f, mut);
    }
}

/// The `Program` node plus the optional capture arrays.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Program {
    #[serde(flatten)]
    pub root: Node,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<Vec<Comment>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tokens: Option<Vec<TokenEntry>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ParseError>>,
}

impl Program {
    pub fn body(&self) -> &[Node] {
        match &self.root.kind {
            NodeKind::Program { body, .. } => body,
            _ => &[],
        }
    }

    pub fn source_type(&self) -> SourceType {
        match &self.root.kind {
            NodeKind::Program { source_type, .. } => *source_type,
            _ => SourceType::Script,
        }
    }

    /// ESTree JSON value.
    pub fn to_json(&self) -> Result<serde_json::Value, serde_json::Error> {
        serde_json::to_value(self)
    }
}

// =============================================================================
// Comments
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommentKind {
    Line,
    Block,
}

/// A source comment.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comment {
    #[serde(rename = "type")]
    pub kind: CommentKind,
    pub value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub loc: Option<SourceLocation>,
}

// =============================================================================
// Literals
// =============================================================================

/// Value of a `Literal` node.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralValue {
    Null,
    Boolean(bool),
    Number(f64),
    String(String),
    /// Regular expressions have no portable value; serialized as `null`.
    RegExp,
}

impl Serialize for LiteralValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            LiteralValue::Null | LiteralValue::RegExp => serializer.serialize_none(),
            LiteralValue::Boolean(b) => serializer.serialize_bool(*b),
            LiteralValue::Number(n) => {
                // Integral values print without a fraction, as JSON.stringify does.
                if n.fract() == 0.0 && n.abs() < 9_007_199_254_740_992.0 {
                    serializer.serialize_i64(*n as i64)
                } else {
                    serializer.serialize_f64(*n)
                }
            }
            LiteralValue::String(s) => serializer.serialize_str(s),
        }
    }
}

/// `value` of a `TemplateElement`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemplateValue {
    pub raw: String,
    pub cooked: Option<String>,
}

// =============================================================================
// Operators
// =============================================================================

macro_rules! operator_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            pub fn from_str(text: &str) -> Option<Self> {
                match text {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }
    };
}

operator_enum! {
    /// Unary operators.
    UnaryOp {
        Minus => "-",
        Plus => "+",
        Not => "!",
        BitNot => "~",
        Typeof => "typeof",
        Void => "void",
        Delete => "delete",
    }
}

operator_enum! {
    /// Binary and logical operators.
    BinaryOp {
        Add => "+",
        Sub => "-",
        Mul => "*",
        Div => "/",
        Mod => "%",
        Pow => "**",
        Eq => "==",
        NotEq => "!=",
        StrictEq => "===",
        StrictNotEq => "!==",
        Lt => "<",
        LtEq => "<=",
        Gt => ">",
        GtEq => ">=",
        BitOr => "|",
        BitXor => "^",
        BitAnd => "&",
        Shl => "<<",
        Shr => ">>",
        UShr => ">>>",
        And => "&&",
        Or => "||",
        NullishCoalesce => "??",
        In => "in",
        Instanceof => "instanceof",
    }
}

impl BinaryOp {
    /// `&&`, `||` and `??` build `LogicalExpression`s.
    pub fn is_logical(self) -> bool {
        matches!(self, BinaryOp::And | BinaryOp::Or | BinaryOp::NullishCoalesce)
    }
}

operator_enum! {
    /// Assignment operators.
    AssignOp {
        Assign => "=",
        AddAssign => "+=",
        SubAssign => "-=",
        MulAssign => "*=",
        DivAssign => "/=",
        ModAssign => "%=",
        PowAssign => "**=",
        ShlAssign => "<<=",
        ShrAssign => ">>=",
        UShrAssign => ">>>=",
        BitOrAssign => "|=",
        BitXorAssign => "^=",
        BitAndAssign => "&=",
        AndAssign => "&&=",
        OrAssign => "||=",
        NullishAssign => "??=",
    }
}

operator_enum! {
    /// Update operators.
    UpdateOp {
        Increment => "++",
        Decrement => "--",
    }
}

operator_enum! {
    /// Variable declaration kind.
    VarKind {
        Var => "var",
        Let => "let",
        Const => "const",
    }
}

operator_enum! {
    /// Object property kind.
    PropertyKind {
        Init => "init",
        Get => "get",
        Set => "set",
    }
}

operator_enum! {
    /// Class method kind.
    MethodKind {
        Constructor => "constructor",
        Method => "method",
        Get => "get",
        Set => "set",
    }
}

// =============================================================================
// Node kinds
// =============================================================================

/// Every syntax kind, tagged by its ESTree `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum NodeKind {
    // === Program ===
    Program {
        body: Vec<Node>,
        source_type: SourceType,
    },

    // === Expressions ===
    Identifier {
        name: String,
    },
    Literal {
        value: LiteralValue,
        raw: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        regex: Option<RegexParts>,
    },
    ThisExpression,
    Super,
    Import,
    ArrayExpression {
        elements: Vec<Option<Node>>,
    },
    ObjectExpression {
        properties: Vec<Node>,
    },
    Property {
        key: Box<Node>,
        computed: bool,
        value: Box<Node>,
        kind: PropertyKind,
        method: bool,
        shorthand: bool,
    },
    FunctionExpression {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
        generator: bool,
        expression: bool,
        #[serde(rename = "async")]
        is_async: bool,
    },
    ArrowFunctionExpression {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
        generator: bool,
        expression: bool,
        #[serde(rename = "async")]
        is_async: bool,
    },
    ClassExpression {
        id: Option<Box<Node>>,
        super_class: Option<Box<Node>>,
        body: Box<Node>,
    },
    TemplateLiteral {
        quasis: Vec<Node>,
        expressions: Vec<Node>,
    },
    TemplateElement {
        value: TemplateValue,
        tail: bool,
    },
    TaggedTemplateExpression {
        tag: Box<Node>,
        quasi: Box<Node>,
    },
    MemberExpression {
        computed: bool,
        object: Box<Node>,
        property: Box<Node>,
        optional: bool,
    },
    CallExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
        optional: bool,
    },
    NewExpression {
        callee: Box<Node>,
        arguments: Vec<Node>,
    },
    ChainExpression {
        expression: Box<Node>,
    },
    MetaProperty {
        meta: Box<Node>,
        property: Box<Node>,
    },
    SpreadElement {
        argument: Box<Node>,
    },
    UpdateExpression {
        operator: UpdateOp,
        argument: Box<Node>,
        prefix: bool,
    },
    UnaryExpression {
        operator: UnaryOp,
        argument: Box<Node>,
        prefix: bool,
    },
    AwaitExpression {
        argument: Box<Node>,
    },
    BinaryExpression {
        operator: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    LogicalExpression {
        operator: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    ConditionalExpression {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Box<Node>,
    },
    YieldExpression {
        argument: Option<Box<Node>>,
        delegate: bool,
    },
    AssignmentExpression {
        operator: AssignOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    SequenceExpression {
        expressions: Vec<Node>,
    },
    /// Parenthesized list awaiting `=>`; never left in a finished tree.
    #[serde(rename = "ArrowParameterPlaceHolder")]
    ArrowParameterPlaceholder {
        params: Vec<Node>,
        #[serde(rename = "async")]
        is_async: bool,
    },

    // === Patterns ===
    ArrayPattern {
        elements: Vec<Option<Node>>,
    },
    ObjectPattern {
        properties: Vec<Node>,
    },
    RestElement {
        argument: Box<Node>,
    },
    AssignmentPattern {
        left: Box<Node>,
        right: Box<Node>,
    },

    // === Statements ===
    BlockStatement {
        body: Vec<Node>,
    },
    EmptyStatement,
    ExpressionStatement {
        expression: Box<Node>,
    },
    /// Prologue directive such as `"use strict";`.
    #[serde(rename = "ExpressionStatement")]
    Directive {
        expression: Box<Node>,
        directive: String,
    },
    IfStatement {
        test: Box<Node>,
        consequent: Box<Node>,
        alternate: Option<Box<Node>>,
    },
    LabeledStatement {
        label: Box<Node>,
        body: Box<Node>,
    },
    BreakStatement {
        label: Option<Box<Node>>,
    },
    ContinueStatement {
        label: Option<Box<Node>>,
    },
    WithStatement {
        object: Box<Node>,
        body: Box<Node>,
    },
    SwitchStatement {
        discriminant: Box<Node>,
        cases: Vec<Node>,
    },
    SwitchCase {
        test: Option<Box<Node>>,
        consequent: Vec<Node>,
    },
    ReturnStatement {
        argument: Option<Box<Node>>,
    },
    ThrowStatement {
        argument: Box<Node>,
    },
    TryStatement {
        block: Box<Node>,
        handler: Option<Box<Node>>,
        finalizer: Option<Box<Node>>,
    },
    CatchClause {
        param: Option<Box<Node>>,
        body: Box<Node>,
    },
    WhileStatement {
        test: Box<Node>,
        body: Box<Node>,
    },
    DoWhileStatement {
        body: Box<Node>,
        test: Box<Node>,
    },
    ForStatement {
        init: Option<Box<Node>>,
        test: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Box<Node>,
    },
    ForInStatement {
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
        each: bool,
    },
    ForOfStatement {
        #[serde(rename = "await")]
        is_await: bool,
        left: Box<Node>,
        right: Box<Node>,
        body: Box<Node>,
    },
    DebuggerStatement,

    // === Declarations ===
    FunctionDeclaration {
        id: Option<Box<Node>>,
        params: Vec<Node>,
        body: Box<Node>,
        generator: bool,
        expression: bool,
        #[serde(rename = "async")]
        is_async: bool,
    },
    VariableDeclaration {
        declarations: Vec<Node>,
        kind: VarKind,
    },
    VariableDeclarator {
        id: Box<Node>,
        init: Option<Box<Node>>,
    },
    ClassDeclaration {
        id: Option<Box<Node>>,
        super_class: Option<Box<Node>>,
        body: Box<Node>,
    },
    ClassBody {
        body: Vec<Node>,
    },
    MethodDefinition {
        key: Box<Node>,
        computed: bool,
        value: Box<Node>,
        kind: MethodKind,
        #[serde(rename = "static")]
        is_static: bool,
    },

    // === Modules ===
    ImportDeclaration {
        specifiers: Vec<Node>,
        source: Box<Node>,
    },
    ImportSpecifier {
        local: Box<Node>,
        imported: Box<Node>,
    },
    ImportDefaultSpecifier {
        local: Box<Node>,
    },
    ImportNamespaceSpecifier {
        local: Box<Node>,
    },
    ExportNamedDeclaration {
        declaration: Option<Box<Node>>,
        specifiers: Vec<Node>,
        source: Option<Box<Node>>,
    },
    ExportDefaultDeclaration {
        declaration: Box<Node>,
    },
    ExportAllDeclaration {
        source: Box<Node>,
    },
    ExportSpecifier {
        local: Box<Node>,
        exported: Box<Node>,
    },

    // === JSX ===
    #[serde(rename = "JSXElement")]
    JsxElement {
        opening_element: Box<Node>,
        children: Vec<Node>,
        closing_element: Option<Box<Node>>,
    },
    #[serde(rename = "JSXFragment")]
    JsxFragment {
        opening_fragment: Box<Node>,
        children: Vec<Node>,
        closing_fragment: Box<Node>,
    },
    #[serde(rename = "JSXOpeningElement")]
    JsxOpeningElement {
        name: Box<Node>,
        self_closing: bool,
        attributes: Vec<Node>,
    },
    #[serde(rename = "JSXClosingElement")]
    JsxClosingElement {
        name: Box<Node>,
    },
    #[serde(rename = "JSXOpeningFragment")]
    JsxOpeningFragment,
    #[serde(rename = "JSXClosingFragment")]
    JsxClosingFragment,
    #[serde(rename = "JSXIdentifier")]
    JsxIdentifier {
        name: String,
    },
    #[serde(rename = "JSXNamespacedName")]
    JsxNamespacedName {
        namespace: Box<Node>,
        name: Box<Node>,
    },
    #[serde(rename = "JSXMemberExpression")]
    JsxMemberExpression {
        object: Box<Node>,
        property: Box<Node>,
    },
    #[serde(rename = "JSXAttribute")]
    JsxAttribute {
        name: Box<Node>,
        value: Option<Box<Node>>,
    },
    #[serde(rename = "JSXSpreadAttribute")]
    JsxSpreadAttribute {
        argument: Box<Node>,
    },
    #[serde(rename = "JSXExpressionContainer")]
    JsxExpressionContainer {
        expression: Box<Node>,
    },
    #[serde(rename = "JSXEmptyExpression")]
    JsxEmptyExpression,
    #[serde(rename = "JSXText")]
    JsxText {
        value: String,
        raw: String,
    },
}

impl NodeKind {
    pub fn is_empty_block(&self) -> bool {
        matches!(self, NodeKind::BlockStatement { body } if body.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str, start: u32) -> Node {
        Node::new(
            NodeKind::Identifier { name: name.into() },
            Span::new(start, start + name.len() as u32),
        )
    }

    #[test]
    fn test_node_json_shape() {
        let mut node = ident("x", 0);
        node.range = Some([0, 1]);
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Identifier", "name": "x", "range": [0, 1]}));
    }

    #[test]
    fn test_renamed_fields() {
        let arrow = Node::new(
            NodeKind::ArrowFunctionExpression {
                id: None,
                params: vec![],
                body: Box::new(ident("a", 6)),
                generator: false,
                expression: true,
                is_async: true,
            },
            Span::new(0, 7),
        );
        let json = serde_json::to_value(&arrow).unwrap();
        assert_eq!(json["type"], "ArrowFunctionExpression");
        assert_eq!(json["async"], true);
        assert!(json["id"].is_null());

        let jsx = Node::new(
            NodeKind::JsxOpeningElement {
                name: Box::new(Node::new(NodeKind::JsxIdentifier { name: "a".into() }, Span::new(1, 2))),
                self_closing: true,
                attributes: vec![],
            },
            Span::new(0, 5),
        );
        let json = serde_json::to_value(&jsx).unwrap();
        assert_eq!(json["type"], "JSXOpeningElement");
        assert_eq!(json["selfClosing"], true);
        assert_eq!(json["name"]["type"], "JSXIdentifier");
    }

    #[test]
    fn test_literal_values() {
        let json = serde_json::to_value(LiteralValue::Number(42.0)).unwrap();
        assert_eq!(json.to_string(), "42");
        let json = serde_json::to_value(LiteralValue::Number(1.5)).unwrap();
        assert_eq!(json.to_string(), "1.5");
        assert!(serde_json::to_value(LiteralValue::RegExp).unwrap().is_null());
    }

    #[test]
    fn test_directive_serializes_as_statement() {
        let node = Node::new(
            NodeKind::Directive {
                expression: Box::new(ident("x", 0)),
                directive: "use strict".into(),
            },
            Span::new(0, 13),
        );
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "ExpressionStatement");
        assert_eq!(json["directive"], "use strict");
    }

    #[test]
    fn test_operators() {
        assert_eq!(BinaryOp::from_str(">>>"), Some(BinaryOp::UShr));
        assert!(BinaryOp::NullishCoalesce.is_logical());
        assert!(!BinaryOp::BitOr.is_logical());
        assert_eq!(AssignOp::from_str("??="), Some(AssignOp::NullishAssign));
        assert_eq!(serde_json::to_value(UnaryOp::Typeof).unwrap(), "typeof");
    }

    #[test]
    fn test_for_each_child() {
        let node = Node::new(
            NodeKind::BinaryExpression {
                operator: BinaryOp::Add,
                left: Box::new(ident("a", 0)),
                right: Box::new(ident("b", 4)),
            },
            Span::new(0, 5),
        );
        let mut names = Vec::new();
        node.for_each_child(&mut |child| names.push(child.identifier_name().unwrap_or("").to_string()));
        assert_eq!(names, vec!["a", "b"]);
    }

    #[test]
    fn test_for_each_child_mut() {
        let mut node = Node::new(
            NodeKind::ArrayExpression {
                elements: vec![Some(ident("a", 1)), None],
            },
            Span::new(0, 5),
        );
        node.for_each_child_mut(&mut |child| child.range = Some(child.span.range()));
        match &node.kind {
            NodeKind::ArrayExpression { elements } => {
                assert_eq!(elements[0].as_ref().unwrap().range, Some([1, 2]));
            }
            _ => unreachable!(),
        }
    }
}

use crate::diagnostic::Span;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Less,
    Greater,
    LessEq,
    GreaterEq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Less => "<",
            BinaryOp::Greater => ">",
            BinaryOp::LessEq => "<=",
            BinaryOp::GreaterEq => ">=",
        }
    }

    pub fn is_arithmetic(self) -> bool {
        matches!(self, BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div)
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// A type annotation as written in source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeExpr {
    Named { name: String, span: Span },
    Generic { name: String, arg: Box<TypeExpr>, span: Span },
}

impl TypeExpr {
    pub fn span(&self) -> Span {
        match self {
            TypeExpr::Named { span, .. } | TypeExpr::Generic { span, .. } => *span,
        }
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named { name, .. } => f.write_str(name),
            TypeExpr::Generic { name, arg, .. } => write!(f, "{}[{}]", name, arg),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub annotation: Option<TypeExpr>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FunctionDef {
    pub name: String,
    pub params: Vec<Param>,
    pub return_type: Option<TypeExpr>,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Literal {
    Number { value: f64, is_float: bool },
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Pattern {
    Literal(Literal),
    Wildcard,
    Binding(String),
    TypedBinding { name: String, annotation: TypeExpr },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCase {
    pub pattern: Pattern,
    pub pattern_span: Span,
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum NodeKind {
    NumberLiteral {
        value: f64,
        is_float: bool,
    },
    StringLiteral(String),
    Variable(String),
    Assignment {
        name: String,
        annotation: Option<TypeExpr>,
        value: Box<Node>,
    },
    BinaryOp {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    FunctionDef(FunctionDef),
    FunctionCall {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    IfBranch {
        condition: Box<Node>,
        then_body: Vec<Node>,
        else_body: Option<Vec<Node>>,
    },
    PatternMatch {
        subject: Box<Node>,
        cases: Vec<MatchCase>,
    },
    SpawnBlock(Vec<Node>),
    PrintStatement(Box<Node>),
    Return(Option<Box<Node>>),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::NumberLiteral { .. } => "NumberLiteral",
            NodeKind::StringLiteral(_) => "StringLiteral",
            NodeKind::Variable(_) => "Variable",
            NodeKind::Assignment { .. } => "Assignment",
            NodeKind::BinaryOp { .. } => "BinaryOp",
            NodeKind::FunctionDef(_) => "FunctionDef",
            NodeKind::FunctionCall { .. } => "FunctionCall",
            NodeKind::IfBranch { .. } => "IfBranch",
            NodeKind::PatternMatch { .. } => "PatternMatch",
            NodeKind::SpawnBlock(_) => "SpawnBlock",
            NodeKind::PrintStatement(_) => "PrintStatement",
            NodeKind::Return(_) => "Return",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Self { kind, span }
    }
}

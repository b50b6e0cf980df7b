//! Python abstract syntax tree
//!
//! A tagged-variant tree mirroring the node classes of Python's `ast`
//! module. [`NodeKind::type_name`] returns the exact class name, which is
//! what fingerprints and token sequences are keyed on.
//!
//! Only the payloads the diff engine reads are retained: declared names,
//! identifiers, attribute names. Literal values are dropped.

use serde::{Deserialize, Serialize};

/// Expression context of a `Name`, `Attribute`, `Subscript`, `Starred`,
/// `List` or `Tuple`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExprContext {
    /// Read
    Load,
    /// Assignment target
    Store,
    /// `del` target
    Del,
}

impl ExprContext {
    /// Python class name
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            ExprContext::Load => "Load",
            ExprContext::Store => "Store",
            ExprContext::Del => "Del",
        }
    }
}

/// Operator nodes (`boolop`, `operator`, `unaryop`, `cmpop`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum Operator {
    And,
    Or,
    Add,
    Sub,
    Mult,
    MatMult,
    Div,
    Mod,
    Pow,
    LShift,
    RShift,
    BitOr,
    BitXor,
    BitAnd,
    FloorDiv,
    Invert,
    Not,
    UAdd,
    USub,
    Eq,
    NotEq,
    Lt,
    LtE,
    Gt,
    GtE,
    Is,
    IsNot,
    In,
    NotIn,
}

impl Operator {
    /// Python class name
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Operator::And => "And",
            Operator::Or => "Or",
            Operator::Add => "Add",
            Operator::Sub => "Sub",
            Operator::Mult => "Mult",
            Operator::MatMult => "MatMult",
            Operator::Div => "Div",
            Operator::Mod => "Mod",
            Operator::Pow => "Pow",
            Operator::LShift => "LShift",
            Operator::RShift => "RShift",
            Operator::BitOr => "BitOr",
            Operator::BitXor => "BitXor",
            Operator::BitAnd => "BitAnd",
            Operator::FloorDiv => "FloorDiv",
            Operator::Invert => "Invert",
            Operator::Not => "Not",
            Operator::UAdd => "UAdd",
            Operator::USub => "USub",
            Operator::Eq => "Eq",
            Operator::NotEq => "NotEq",
            Operator::Lt => "Lt",
            Operator::LtE => "LtE",
            Operator::Gt => "Gt",
            Operator::GtE => "GtE",
            Operator::Is => "Is",
            Operator::IsNot => "IsNot",
            Operator::In => "In",
            Operator::NotIn => "NotIn",
        }
    }

    /// Binary operator from its source token (`+`, `//`, ...)
    ///
    /// Augmented forms (`+=`) are accepted too.
    #[must_use]
    pub fn binary(token: &str) -> Option<Self> {
        let token = token.strip_suffix('=').unwrap_or(token);
        Some(match token {
            "+" => Operator::Add,
            "-" => Operator::Sub,
            "*" => Operator::Mult,
            "@" => Operator::MatMult,
            "/" => Operator::Div,
            "%" => Operator::Mod,
            "**" => Operator::Pow,
            "<<" => Operator::LShift,
            ">>" => Operator::RShift,
            "|" => Operator::BitOr,
            "^" => Operator::BitXor,
            "&" => Operator::BitAnd,
            "//" => Operator::FloorDiv,
            _ => return None,
        })
    }

    /// Unary operator from its source token
    #[must_use]
    pub fn unary(token: &str) -> Option<Self> {
        Some(match token {
            "+" => Operator::UAdd,
            "-" => Operator::USub,
            "~" => Operator::Invert,
            "not" => Operator::Not,
            _ => return None,
        })
    }

    /// Boolean operator from its source token
    #[must_use]
    pub fn boolean(token: &str) -> Option<Self> {
        match token {
            "and" => Some(Operator::And),
            "or" => Some(Operator::Or),
            _ => None,
        }
    }

    /// Comparison operator from its source tokens, space separated
    #[must_use]
    pub fn comparison(token: &str) -> Option<Self> {
        Some(match token {
            "==" => Operator::Eq,
            "!=" => Operator::NotEq,
            "<" => Operator::Lt,
            "<=" => Operator::LtE,
            ">" => Operator::Gt,
            ">=" => Operator::GtE,
            "is" => Operator::Is,
            "is not" => Operator::IsNot,
            "in" => Operator::In,
            "not in" => Operator::NotIn,
            _ => return None,
        })
    }
}

/// Node variants, one per Python `ast` class the lowering emits
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(missing_docs)]
pub enum NodeKind {
    Module,

    // Statements
    FunctionDef { name: String },
    AsyncFunctionDef { name: String },
    ClassDef { name: String },
    Return,
    Delete,
    Assign,
    AugAssign,
    AnnAssign,
    For,
    AsyncFor,
    While,
    If,
    With,
    AsyncWith,
    Match,
    Raise,
    Try,
    TryStar,
    Assert,
    Import,
    ImportFrom,
    Global,
    Nonlocal,
    Expr,
    Pass,
    Break,
    Continue,
    TypeAlias,

    // Expressions
    BoolOp,
    NamedExpr,
    BinOp,
    UnaryOp,
    Lambda,
    IfExp,
    Dict,
    Set,
    ListComp,
    SetComp,
    DictComp,
    GeneratorExp,
    Await,
    Yield,
    YieldFrom,
    Compare,
    Call,
    FormattedValue,
    JoinedStr,
    Constant,
    Attribute { attr: String },
    Subscript,
    Starred,
    Name { id: String },
    List,
    Tuple,
    Slice,

    // Patterns
    MatchValue,
    MatchSingleton,
    MatchSequence,
    MatchMapping,
    MatchClass,
    MatchStar,
    MatchAs,
    MatchOr,

    // Auxiliary
    Arguments,
    Arg { name: String },
    Keyword { arg: Option<String> },
    Alias { name: String },
    WithItem,
    Comprehension,
    ExceptHandler { name: Option<String> },
    MatchCase,

    // Type parameters
    TypeVar,
    ParamSpec,
    TypeVarTuple,

    Context(ExprContext),
    Op(Operator),
}

impl NodeKind {
    /// Python `ast` class name of this node
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeKind::Module => "Module",
            NodeKind::FunctionDef { .. } => "FunctionDef",
            NodeKind::AsyncFunctionDef { .. } => "AsyncFunctionDef",
            NodeKind::ClassDef { .. } => "ClassDef",
            NodeKind::Return => "Return",
            NodeKind::Delete => "Delete",
            NodeKind::Assign => "Assign",
            NodeKind::AugAssign => "AugAssign",
            NodeKind::AnnAssign => "AnnAssign",
            NodeKind::For => "For",
            NodeKind::AsyncFor => "AsyncFor",
            NodeKind::While => "While",
            NodeKind::If => "If",
            NodeKind::With => "With",
            NodeKind::AsyncWith => "AsyncWith",
            NodeKind::Match => "Match",
            NodeKind::Raise => "Raise",
            NodeKind::Try => "Try",
            NodeKind::TryStar => "TryStar",
            NodeKind::Assert => "Assert",
            NodeKind::Import => "Import",
            NodeKind::ImportFrom => "ImportFrom",
            NodeKind::Global => "Global",
            NodeKind::Nonlocal => "Nonlocal",
            NodeKind::Expr => "Expr",
            NodeKind::Pass => "Pass",
            NodeKind::Break => "Break",
            NodeKind::Continue => "Continue",
            NodeKind::TypeAlias => "TypeAlias",
            NodeKind::BoolOp => "BoolOp",
            NodeKind::NamedExpr => "NamedExpr",
            NodeKind::BinOp => "BinOp",
            NodeKind::UnaryOp => "UnaryOp",
            NodeKind::Lambda => "Lambda",
            NodeKind::IfExp => "IfExp",
            NodeKind::Dict => "Dict",
            NodeKind::Set => "Set",
            NodeKind::ListComp => "ListComp",
            NodeKind::SetComp => "SetComp",
            NodeKind::DictComp => "DictComp",
            NodeKind::GeneratorExp => "GeneratorExp",
            NodeKind::Await => "Await",
            NodeKind::Yield => "Yield",
            NodeKind::YieldFrom => "YieldFrom",
            NodeKind::Compare => "Compare",
            NodeKind::Call => "Call",
            NodeKind::FormattedValue => "FormattedValue",
            NodeKind::JoinedStr => "JoinedStr",
            NodeKind::Constant => "Constant",
            NodeKind::Attribute { .. } => "Attribute",
            NodeKind::Subscript => "Subscript",
            NodeKind::Starred => "Starred",
            NodeKind::Name { .. } => "Name",
            NodeKind::List => "List",
            NodeKind::Tuple => "Tuple",
            NodeKind::Slice => "Slice",
            NodeKind::MatchValue => "MatchValue",
            NodeKind::MatchSingleton => "MatchSingleton",
            NodeKind::MatchSequence => "MatchSequence",
            NodeKind::MatchMapping => "MatchMapping",
            NodeKind::MatchClass => "MatchClass",
            NodeKind::MatchStar => "MatchStar",
            NodeKind::MatchAs => "MatchAs",
            NodeKind::MatchOr => "MatchOr",
            NodeKind::Arguments => "arguments",
            NodeKind::Arg { .. } => "arg",
            NodeKind::Keyword { .. } => "keyword",
            NodeKind::Alias { .. } => "alias",
            NodeKind::WithItem => "withitem",
            NodeKind::Comprehension => "comprehension",
            NodeKind::ExceptHandler { .. } => "ExceptHandler",
            NodeKind::MatchCase => "match_case",
            NodeKind::TypeVar => "TypeVar",
            NodeKind::ParamSpec => "ParamSpec",
            NodeKind::TypeVarTuple => "TypeVarTuple",
            NodeKind::Context(ctx) => ctx.name(),
            NodeKind::Op(op) => op.name(),
        }
    }
}

/// A tree node: its kind plus children in source order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    kind: NodeKind,
    children: Vec<Node>,
}

impl Node {
    /// Create leaf node
    #[inline]
    #[must_use]
    pub fn leaf(kind: NodeKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
        }
    }

    /// Create node with children
    #[inline]
    #[must_use]
    pub fn new(kind: NodeKind, children: Vec<Node>) -> Self {
        Self { kind, children }
    }

    /// Node kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Python `ast` class name
    #[inline]
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Children in source order
    #[inline]
    #[must_use]
    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Total nodes in this subtree, self included
    #[must_use]
    pub fn size(&self) -> usize {
        let mut pending = vec![self];
        let mut count = 0;
        while let Some(node) = pending.pop() {
            count += 1;
            pending.extend(&node.children);
        }
        count
    }
}

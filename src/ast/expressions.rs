use crate::ast::Position;

/// An expression node.
///
/// The set is closed: a rule is literals, variable references, and function
/// calls, nothing else. Every variant carries the position of its first
/// token so errors raised later (validation, evaluation) can still point
/// into the source. Once built, a tree is never mutated; the same parsed
/// rule can be evaluated against any number of devices, concurrently.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Str(StringLiteral),
    Number(NumberLiteral),
    Bool(BoolLiteral),
    Variable(Variable),
    Call(FunctionCall),
}

impl Expr {
    /// The source position of this node.
    pub fn pos(&self) -> Position {
        match self {
            Expr::Str(n) => n.pos,
            Expr::Number(n) => n.pos,
            Expr::Bool(n) => n.pos,
            Expr::Variable(n) => n.pos,
            Expr::Call(n) => n.pos,
        }
    }
}

/// A string literal.
#[derive(Debug, Clone, PartialEq)]
pub struct StringLiteral {
    pub pos: Position,
    pub value: String,
    /// True for single-quoted raw strings.
    pub raw: bool,
}

/// A number literal, already resolved to base units.
///
/// `value` is in bytes when a size suffix was present (`100GiB`), otherwise
/// the literal value unchanged. `raw` keeps the original spelling and
/// `unit` the suffix, for diagnostics and display.
#[derive(Debug, Clone, PartialEq)]
pub struct NumberLiteral {
    pub pos: Position,
    pub value: f64,
    pub raw: String,
    pub unit: String,
}

/// A boolean literal.
#[derive(Debug, Clone, PartialEq)]
pub struct BoolLiteral {
    pub pos: Position,
    pub value: bool,
}

/// A variable reference (`@type`, `@size`, ...).
///
/// `name` is stored without the `@` prefix and is resolved against the
/// device context only at evaluation time.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub pos: Position,
    pub name: String,
}

/// A predicate call with its ordered arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionCall {
    pub pos: Position,
    pub name: String,
    pub args: Vec<Expr>,
}

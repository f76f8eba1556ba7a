//! # Device selection language - Abstract Syntax Tree
//!
//! Token and expression types for the selection language, shared by the
//! lexer, parser, validator, and evaluator.
//!
//! The language is a single expression per rule:
//!
//! ```text
//! and(eq(@type, 'nvme'), ge(@size, 100GiB), ne(@vendor, 'seagate'))
//! ```
//!
//! - **[tokens]** - Lexical tokens and source positions
//! - **[expressions]** - Expression nodes (literals, variables, calls)
//!
//! Expressions form a closed set with no operators, no statements, and no
//! user-defined anything: a rule is a pure predicate over one device's
//! attributes. Trees are immutable after parsing and carry positions on
//! every node for error reporting.

pub mod expressions;
pub mod tokens;

pub use expressions::{BoolLiteral, Expr, FunctionCall, NumberLiteral, StringLiteral, Variable};
pub use tokens::{Position, Token, TokenKind};

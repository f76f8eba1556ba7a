//! Tree-walking evaluator: Expression x DeviceContext -> Value.

use std::cmp::Ordering;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use regex::Regex;

use crate::ast::{Expr, FunctionCall, Variable};
use crate::device::DeviceContext;
use crate::errors::EvalError;
use crate::units;
use crate::value::{Value, ValueKind};

/// Maximum regex pattern length, checked before compilation.
pub const MAX_REGEX_PATTERN_LENGTH: usize = 1000;

/// Upper bound on a single regex match. A safety net only: the `regex`
/// crate guarantees linear-time matching, and pattern length and input size
/// are already capped.
pub const REGEX_TIMEOUT: Duration = Duration::from_millis(100);

/// The fixed predicate set.
///
/// Single source of truth for function names: the evaluator dispatches
/// through it and the validator checks against it, so the two cannot
/// drift. Lookup is case-insensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Func {
    And,
    Or,
    Not,
    In,
    Re,
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Func {
    pub const ALL: [Func; 11] = [
        Func::And,
        Func::Or,
        Func::Not,
        Func::In,
        Func::Re,
        Func::Eq,
        Func::Ne,
        Func::Gt,
        Func::Ge,
        Func::Lt,
        Func::Le,
    ];

    pub fn lookup(name: &str) -> Option<Func> {
        match name.to_lowercase().as_str() {
            "and" => Some(Func::And),
            "or" => Some(Func::Or),
            "not" => Some(Func::Not),
            "in" => Some(Func::In),
            "re" => Some(Func::Re),
            "eq" => Some(Func::Eq),
            "ne" => Some(Func::Ne),
            "gt" => Some(Func::Gt),
            "ge" => Some(Func::Ge),
            "lt" => Some(Func::Lt),
            "le" => Some(Func::Le),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Func::And => "and",
            Func::Or => "or",
            Func::Not => "not",
            Func::In => "in",
            Func::Re => "re",
            Func::Eq => "eq",
            Func::Ne => "ne",
            Func::Gt => "gt",
            Func::Ge => "ge",
            Func::Lt => "lt",
            Func::Le => "le",
        }
    }
}

/// Evaluates expressions against one device context.
pub struct Evaluator<'a> {
    ctx: &'a DeviceContext,
}

impl<'a> Evaluator<'a> {
    pub fn new(ctx: &'a DeviceContext) -> Self {
        Evaluator { ctx }
    }

    /// Evaluate an expression to a value.
    pub fn eval(&self, expr: &Expr) -> Result<Value, EvalError> {
        match expr {
            Expr::Str(n) => Ok(Value::Str(n.value.clone())),
            Expr::Number(n) => Ok(Value::Number(n.value)),
            Expr::Bool(n) => Ok(Value::Bool(n.value)),
            Expr::Variable(v) => self.eval_variable(v),
            Expr::Call(f) => self.eval_function(f),
        }
    }

    fn eval_variable(&self, v: &Variable) -> Result<Value, EvalError> {
        match self.ctx.resolve_variable(&v.name) {
            Ok(val) => Ok(val),
            // The context has no position to report; attach the node's.
            Err(EvalError::UnknownVariable { name, .. }) => {
                Err(EvalError::UnknownVariable { pos: v.pos, name })
            }
            Err(e) => Err(e),
        }
    }

    /// Dispatch a call by case-insensitive name.
    ///
    /// Unknown names fail here, lazily: a call skipped by short-circuiting
    /// is never looked up, whether or not validation ran beforehand.
    fn eval_function(&self, f: &FunctionCall) -> Result<Value, EvalError> {
        let func = match Func::lookup(&f.name) {
            Some(func) => func,
            None => {
                return Err(EvalError::UnknownFunction {
                    pos: f.pos,
                    name: f.name.clone(),
                });
            }
        };

        match func {
            Func::And => self.eval_and(f),
            Func::Or => self.eval_or(f),
            Func::Not => self.eval_not(f),
            Func::In => self.eval_in(f),
            Func::Re => self.eval_re(f),
            Func::Eq | Func::Ne | Func::Gt | Func::Ge | Func::Lt | Func::Le => {
                self.eval_comparison(f, func)
            }
        }
    }

    /// and(a, b, c, ...): variadic, short-circuits at the first falsy
    /// argument. Zero arguments is the identity: true.
    fn eval_and(&self, f: &FunctionCall) -> Result<Value, EvalError> {
        for arg in &f.args {
            let val = self.eval(arg)?;
            if !val.as_bool() {
                return Ok(Value::Bool(false)); // short-circuit
            }
        }
        Ok(Value::Bool(true))
    }

    /// or(a, b, c, ...): variadic, short-circuits at the first truthy
    /// argument. Zero arguments is the identity: false.
    fn eval_or(&self, f: &FunctionCall) -> Result<Value, EvalError> {
        for arg in &f.args {
            let val = self.eval(arg)?;
            if val.as_bool() {
                return Ok(Value::Bool(true)); // short-circuit
            }
        }
        Ok(Value::Bool(false))
    }

    fn eval_not(&self, f: &FunctionCall) -> Result<Value, EvalError> {
        if f.args.len() != 1 {
            return Err(EvalError::eval(
                f.pos,
                format!("not() expects 1 argument, got {}", f.args.len()),
            ));
        }

        let val = self.eval(&f.args[0])?;
        Ok(Value::Bool(!val.as_bool()))
    }

    /// in(x, y, z, ...): true if x value-equals any of the candidates.
    fn eval_in(&self, f: &FunctionCall) -> Result<Value, EvalError> {
        if f.args.len() < 2 {
            return Err(EvalError::eval(
                f.pos,
                format!("in() expects at least 2 arguments, got {}", f.args.len()),
            ));
        }

        let needle = self.eval(&f.args[0])?;

        for candidate in &f.args[1..] {
            let candidate = self.eval(candidate)?;
            if values_equal(&needle, &candidate) {
                return Ok(Value::Bool(true));
            }
        }
        Ok(Value::Bool(false))
    }

    /// re(pattern, value): case-insensitive regex match.
    fn eval_re(&self, f: &FunctionCall) -> Result<Value, EvalError> {
        if f.args.len() != 2 {
            return Err(EvalError::eval(
                f.pos,
                format!("re() expects 2 arguments, got {}", f.args.len()),
            ));
        }

        let pattern = self.eval(&f.args[0])?.as_string();

        if pattern.chars().count() > MAX_REGEX_PATTERN_LENGTH {
            return Err(EvalError::eval(
                f.args[0].pos(),
                format!(
                    "regex pattern exceeds maximum length of {} characters",
                    MAX_REGEX_PATTERN_LENGTH
                ),
            ));
        }

        let value = self.eval(&f.args[1])?.as_string();

        let re = Regex::new(&format!("(?i){}", pattern)).map_err(|e| {
            EvalError::eval(f.args[0].pos(), format!("invalid regex pattern: {}", e))
        })?;

        match match_with_timeout(re, value, REGEX_TIMEOUT) {
            Some(matched) => Ok(Value::Bool(matched)),
            None => Err(EvalError::eval(
                f.args[0].pos(),
                format!(
                    "regex evaluation failed: timed out after {:?}",
                    REGEX_TIMEOUT
                ),
            )),
        }
    }

    /// eq, ne, gt, ge, lt, le. Equality and ordering use different
    /// coercion rules; ne/ge/le are derived from eq/gt/lt rather than
    /// implemented separately.
    fn eval_comparison(&self, f: &FunctionCall, func: Func) -> Result<Value, EvalError> {
        if f.args.len() != 2 {
            return Err(EvalError::eval(
                f.pos,
                format!("{}() expects 2 arguments, got {}", func.name(), f.args.len()),
            ));
        }

        let left = self.eval(&f.args[0])?;
        let right = self.eval(&f.args[1])?;

        if func == Func::Eq {
            return Ok(Value::Bool(values_equal(&left, &right)));
        }
        if func == Func::Ne {
            return Ok(Value::Bool(!values_equal(&left, &right)));
        }

        let cmp = compare_values(&left, &right, f)?;

        let result = match func {
            Func::Gt => cmp == Ordering::Greater,
            Func::Ge => cmp != Ordering::Less,
            Func::Lt => cmp == Ordering::Less,
            Func::Le => cmp != Ordering::Greater,
            _ => unreachable!("non-ordering func in comparison"),
        };
        Ok(Value::Bool(result))
    }
}

/// Run a regex match bounded by a timeout.
///
/// The `regex` crate has no cooperative cancellation, so the match runs on
/// its own thread raced against the clock. On timeout the thread is
/// abandoned, not cancelled: it finishes on its own and its send lands in a
/// dropped channel. One orphaned thread per timed-out match is the cost;
/// linear-time matching plus the pattern-length cap keeps that path cold.
fn match_with_timeout(re: Regex, input: String, timeout: Duration) -> Option<bool> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(re.is_match(&input));
    });
    rx.recv_timeout(timeout).ok()
}

/// Value equality: numbers numerically, booleans as booleans, everything
/// else as case-insensitive strings.
fn values_equal(a: &Value, b: &Value) -> bool {
    if a.kind() == ValueKind::Number && b.kind() == ValueKind::Number {
        return a.as_number() == b.as_number();
    }

    if a.kind() == ValueKind::Bool && b.kind() == ValueKind::Bool {
        return a.as_bool() == b.as_bool();
    }

    a.as_string().to_lowercase() == b.as_string().to_lowercase()
}

/// Three-way ordering for gt/ge/lt/le.
///
/// Both numbers: numeric. One number, one string: the string is parsed as a
/// sized number (units allowed) and compared numerically; a string that
/// does not parse fails loudly rather than ordering as zero. Anything else:
/// lexicographic.
fn compare_values(a: &Value, b: &Value, f: &FunctionCall) -> Result<Ordering, EvalError> {
    let a_num = a.kind() == ValueKind::Number;
    let b_num = b.kind() == ValueKind::Number;

    if a_num && b_num {
        return Ok(total_order(a.as_number(), b.as_number()));
    }

    if a_num || b_num {
        let mut an = a.as_number();
        let mut bn = b.as_number();

        if a_num && b.kind() == ValueKind::Str {
            bn = parse_comparand(&b.as_string(), &f.args[1])?;
        } else if b_num && a.kind() == ValueKind::Str {
            an = parse_comparand(&a.as_string(), &f.args[0])?;
        }

        return Ok(total_order(an, bn));
    }

    Ok(a.as_string().cmp(&b.as_string()))
}

/// Parse a string being ordered against a number, through the units table.
fn parse_comparand(s: &str, arg: &Expr) -> Result<f64, EvalError> {
    match units::parse_number_with_unit(s) {
        Ok((n, _)) => Ok(n),
        Err(_) => Err(EvalError::Type {
            pos: arg.pos(),
            expected: ValueKind::Number,
            got: ValueKind::Str,
        }),
    }
}

fn total_order(a: f64, b: f64) -> Ordering {
    if a < b {
        Ordering::Less
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

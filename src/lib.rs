//! disksel - a device-selection expression language.
//!
//! Operators describe which physical disks on a host are eligible for a
//! role with a small declarative expression, evaluated once per device:
//!
//! ```text
//! and(eq(@type, 'nvme'), ge(@size, 100GiB), re('^/dev', @devnode), ne(@vendor, 'seagate'))
//! ```
//!
//! Rules are parsed once into an immutable tree, optionally validated
//! against the fixed function/variable allow-lists at authoring time, and
//! then matched against device descriptors:
//!
//! ```
//! use disksel::{match_device, parse, validate, Device};
//!
//! let rule = parse("and(eq(@type, 'nvme'), ge(@size, 100GiB))").unwrap();
//! validate(&rule).unwrap();
//!
//! let device = Device {
//!     id: "nvme0n1".to_string(),
//!     model: "Samsung 970 EVO Plus".to_string(),
//!     size: 256 * 1024 * 1024 * 1024,
//!     device_type: "nvme".to_string(),
//!     ..Default::default()
//! };
//!
//! assert!(match_device(&rule, &device, "stor-01").unwrap());
//! ```
//!
//! Any error from matching means "rule rejected", not "device excluded":
//! a rule that fails on one device is broken for the whole fleet.

pub mod ast;
pub mod device;
pub mod errors;
pub mod evaluator;
pub mod lexer;
pub mod parser;
pub mod units;
pub mod validator;
pub mod value;

#[cfg(feature = "cli")]
pub mod cli;

pub use ast::{Expr, Position, Token, TokenKind};
pub use device::{Device, DeviceContext, Var};
pub use errors::{EvalError, ParseError};
pub use evaluator::{Evaluator, Func};
pub use lexer::Lexer;
pub use parser::Parser;
pub use value::{Value, ValueKind};

/// Parse a rule and return its expression tree.
pub fn parse(input: &str) -> Result<Expr, ParseError> {
    Parser::new(input)?.parse()
}

/// Check a parsed rule for unknown function and variable names without
/// evaluating it.
pub fn validate(expr: &Expr) -> Result<(), EvalError> {
    validator::validate(expr)
}

/// Evaluate a rule against a single device.
pub fn match_device(expr: &Expr, device: &Device, hostname: &str) -> Result<bool, EvalError> {
    let ctx = DeviceContext::new(device.clone(), hostname);
    let result = Evaluator::new(&ctx).eval(expr)?;
    Ok(result.as_bool())
}

/// Filter a device list with a rule, preserving input order.
///
/// Stops at the first error: an expression that fails on one device
/// indicates the rule itself is unusable.
pub fn match_devices(
    expr: &Expr,
    devices: &[Device],
    hostname: &str,
) -> Result<Vec<Device>, EvalError> {
    let mut matched = Vec::new();

    for device in devices {
        if match_device(expr, device, hostname)? {
            matched.push(device.clone());
        }
    }

    Ok(matched)
}

/// The stable device path a match would resolve for this device, using the
/// same fallback chain as evaluation (`@devnode`).
pub fn get_device_path(device: &Device) -> String {
    DeviceContext::new(device.clone(), "").path
}

/// All known function names.
pub fn known_functions() -> Vec<&'static str> {
    Func::ALL.iter().map(|f| f.name()).collect()
}

/// All known variable names, without the `@` prefix.
pub fn known_variables() -> Vec<&'static str> {
    Var::ALL.iter().map(|v| v.name()).collect()
}

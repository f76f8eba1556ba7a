//! Execute disksel operations against JSON device input.

use super::{devices_from_json, CliError};
use crate::{get_device_path, match_devices, parse, validate, Device};

/// Options for the match command
#[derive(Debug, Clone, Default)]
pub struct MatchOptions {
    /// The selection expression
    pub expression: String,
    /// JSON array of device descriptors
    pub devices_json: String,
    /// Host name the rule is evaluated as
    pub hostname: String,
}

/// Parse and validate an expression without evaluating it.
pub fn execute_check(expression: &str) -> Result<(), CliError> {
    let expr = parse(expression)?;
    validate(&expr)?;
    Ok(())
}

/// Parse, validate, and run an expression over the supplied devices,
/// returning the matching ones in input order.
pub fn execute_match(options: &MatchOptions) -> Result<Vec<Device>, CliError> {
    let expr = parse(&options.expression)?;
    validate(&expr)?;

    let json: serde_json::Value = serde_json::from_str(&options.devices_json)?;
    let devices = devices_from_json(&json)?;

    Ok(match_devices(&expr, &devices, &options.hostname)?)
}

/// Derive the stable device path for every supplied device.
pub fn execute_paths(devices_json: &str) -> Result<Vec<(Device, String)>, CliError> {
    let json: serde_json::Value = serde_json::from_str(devices_json)?;
    let devices = devices_from_json(&json)?;

    Ok(devices
        .into_iter()
        .map(|d| {
            let path = get_device_path(&d);
            (d, path)
        })
        .collect())
}

/// Shorten a qualified host name to its first label.
pub fn short_hostname(name: &str) -> &str {
    match name.find('.') {
        Some(idx) if idx > 0 => &name[..idx],
        _ => name,
    }
}

#[test]
fn test_short_hostname() {
    assert_eq!(short_hostname("stor-01.example.com"), "stor-01");
    assert_eq!(short_hostname("stor-01"), "stor-01");
    assert_eq!(short_hostname(".weird"), ".weird");
}

//! Device descriptors and the per-evaluation context.

use crate::ast::Position;
use crate::errors::EvalError;
use crate::value::Value;

/// One physical disk as reported by the disk-enumeration collaborator.
///
/// `device_id` and `device_path` are the optional stable identifiers
/// (`/dev/disk/by-id/...`, `/dev/disk/by-path/...` suffixes); `id` is the
/// bare kernel name (`sda`, `vdc`). Sizes are bytes.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Device {
    pub id: String,
    pub device_id: String,
    pub device_path: String,
    pub model: String,
    pub size: u64,
    pub device_type: String,
}

/// The read-only snapshot a rule is evaluated against: one device's
/// attributes plus the evaluating host's name.
///
/// Built fresh per match call and discarded afterwards; never shared or
/// mutated across evaluations.
#[derive(Debug, Clone)]
pub struct DeviceContext {
    pub device: Device,
    pub hostname: String,
    /// Computed stable device path, see [`DeviceContext::new`].
    pub path: String,
}

impl DeviceContext {
    /// Build a context, deriving the stable device path.
    ///
    /// Preference order matches what the provisioning pipeline will open:
    /// a by-id path when the device has a stable id, else a by-path entry,
    /// else the bare device node.
    pub fn new(device: Device, hostname: impl Into<String>) -> Self {
        let path = if !device.device_id.is_empty() {
            format!("/dev/disk/by-id/{}", device.device_id)
        } else if !device.device_path.is_empty() {
            format!("/dev/disk/by-path/{}", device.device_path)
        } else {
            format!("/dev/{}", device.id)
        };

        DeviceContext {
            device,
            hostname: hostname.into(),
            path,
        }
    }

    /// Resolve a rule variable against this context.
    ///
    /// Supported variables:
    ///   - `@type`: device type, lowercased (sata, nvme, virtio, ...)
    ///   - `@vendor`: vendor extracted from the model string, lowercased
    ///   - `@model`: full model string, lowercased
    ///   - `@size`: size in bytes
    ///   - `@devnode`: the derived stable device path
    ///   - `@host`: the evaluating host name, unmodified
    ///
    /// Unknown names fail; the caller owns the source position and patches
    /// it onto the error.
    pub fn resolve_variable(&self, name: &str) -> Result<Value, EvalError> {
        let var = Var::lookup(name).ok_or_else(|| EvalError::UnknownVariable {
            pos: Position::default(),
            name: format!("@{}", name),
        })?;
        Ok(self.resolve(var))
    }

    /// Resolve an already-validated variable.
    pub fn resolve(&self, var: Var) -> Value {
        match var {
            Var::Type => Value::Str(self.device.device_type.to_lowercase()),
            Var::Vendor => Value::Str(extract_vendor(&self.device.model).to_lowercase()),
            Var::Model => Value::Str(self.device.model.to_lowercase()),
            Var::Size => Value::Number(self.device.size as f64),
            Var::Devnode => Value::Str(self.path.clone()),
            Var::Host => Value::Str(self.hostname.clone()),
        }
    }
}

/// The fixed variable set.
///
/// Single source of truth for variable names: the validator checks against
/// it and the evaluator resolves through it, so the two cannot drift.
/// Lookup is case-insensitive, like function names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Var {
    Type,
    Vendor,
    Model,
    Size,
    Devnode,
    Host,
}

impl Var {
    pub const ALL: [Var; 6] = [
        Var::Type,
        Var::Vendor,
        Var::Model,
        Var::Size,
        Var::Devnode,
        Var::Host,
    ];

    pub fn lookup(name: &str) -> Option<Var> {
        match name.to_lowercase().as_str() {
            "type" => Some(Var::Type),
            "vendor" => Some(Var::Vendor),
            "model" => Some(Var::Model),
            "size" => Some(Var::Size),
            "devnode" => Some(Var::Devnode),
            "host" => Some(Var::Host),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Var::Type => "type",
            Var::Vendor => "vendor",
            Var::Model => "model",
            Var::Size => "size",
            Var::Devnode => "devnode",
            Var::Host => "host",
        }
    }
}

/// Extract the vendor from a model string: the first whitespace-delimited
/// token, falling back to the first underscore-delimited one.
///
/// ```text
/// "Samsung 970 EVO Plus" -> "Samsung"
/// "WDC_WD10EZEX"         -> "WDC"
/// "QEMU HARDDISK"        -> "QEMU"
/// ```
fn extract_vendor(model: &str) -> &str {
    let model = model.trim();
    if model.is_empty() {
        return "";
    }

    if let Some(idx) = model.find([' ', '\t']) {
        if idx > 0 {
            return &model[..idx];
        }
    }

    if let Some(idx) = model.find('_') {
        if idx > 0 {
            return &model[..idx];
        }
    }

    model
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_extraction() {
        assert_eq!(extract_vendor("Samsung 970 EVO Plus"), "Samsung");
        assert_eq!(extract_vendor("WDC_WD10EZEX"), "WDC");
        assert_eq!(extract_vendor("single"), "single");
        assert_eq!(extract_vendor(""), "");
        assert_eq!(extract_vendor("  "), "");
    }

    #[test]
    fn test_path_fallback_chain() {
        let by_id = DeviceContext::new(
            Device {
                id: "sda".to_string(),
                device_id: "nvme-X".to_string(),
                device_path: "pci-0000:00:1f.2".to_string(),
                ..Default::default()
            },
            "host",
        );
        assert_eq!(by_id.path, "/dev/disk/by-id/nvme-X");

        let by_path = DeviceContext::new(
            Device {
                id: "sda".to_string(),
                device_path: "pci-0000:00:1f.2".to_string(),
                ..Default::default()
            },
            "host",
        );
        assert_eq!(by_path.path, "/dev/disk/by-path/pci-0000:00:1f.2");

        let bare = DeviceContext::new(
            Device {
                id: "vdc".to_string(),
                ..Default::default()
            },
            "host",
        );
        assert_eq!(bare.path, "/dev/vdc");
    }
}

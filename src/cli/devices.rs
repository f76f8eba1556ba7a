//! JSON <-> Device conversion for the CLI boundary.
//!
//! Device descriptors arrive as a JSON array from whatever enumerates the
//! disks. Missing string fields default to empty, a missing size to 0;
//! anything that is not an object is rejected.

use super::CliError;
use crate::Device;

/// Decode a JSON array of device descriptors.
pub fn devices_from_json(v: &serde_json::Value) -> Result<Vec<Device>, CliError> {
    let arr = v
        .as_array()
        .ok_or_else(|| CliError::Device("expected a JSON array of devices".to_string()))?;

    arr.iter().map(device_from_json).collect()
}

fn device_from_json(v: &serde_json::Value) -> Result<Device, CliError> {
    let obj = v
        .as_object()
        .ok_or_else(|| CliError::Device("expected a JSON object".to_string()))?;

    let string_field = |name: &str| -> String {
        obj.get(name)
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string()
    };

    Ok(Device {
        id: string_field("id"),
        device_id: string_field("device_id"),
        device_path: string_field("device_path"),
        model: string_field("model"),
        size: obj.get("size").and_then(|v| v.as_u64()).unwrap_or(0),
        device_type: string_field("type"),
    })
}

/// Encode a device back to the same JSON shape.
pub fn device_to_json(d: &Device) -> serde_json::Value {
    let mut obj = serde_json::Map::new();
    obj.insert("id".to_string(), d.id.clone().into());
    obj.insert("device_id".to_string(), d.device_id.clone().into());
    obj.insert("device_path".to_string(), d.device_path.clone().into());
    obj.insert("model".to_string(), d.model.clone().into());
    obj.insert("size".to_string(), d.size.into());
    obj.insert("type".to_string(), d.device_type.clone().into());
    serde_json::Value::Object(obj)
}

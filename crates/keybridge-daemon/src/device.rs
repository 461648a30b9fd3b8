//! Input device enumeration

use std::path::{Path, PathBuf};

use anyhow::Result;
use evdev::Device;

/// Information about an input device
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
    pub vendor: u16,
    pub product: u16,
    pub keyboard: bool,
}

impl DeviceInfo {
    /// Get vendor:product string (e.g., "3434:0361")
    pub fn vendor_product(&self) -> String {
        format!("{:04x}:{:04x}", self.vendor, self.product)
    }
}

fn is_event_node(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with("event"))
        .unwrap_or(false)
}

/// Enumerate all readable `/dev/input/event*` devices, sorted by path
pub fn enumerate_devices() -> Result<Vec<DeviceInfo>> {
    enumerate_devices_in(Path::new("/dev/input"))
}

pub(crate) fn enumerate_devices_in(dir: &Path) -> Result<Vec<DeviceInfo>> {
    let mut devices = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if !is_event_node(&path) {
            continue;
        }

        match Device::open(&path) {
            Ok(device) => {
                let id = device.input_id();
                devices.push(DeviceInfo {
                    name: device.name().unwrap_or("Unknown").to_string(),
                    vendor: id.vendor(),
                    product: id.product(),
                    keyboard: is_keyboard(&device),
                    path,
                });
            }
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    devices.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(devices)
}

/// Check if a device is a keyboard
pub fn is_keyboard(device: &Device) -> bool {
    device
        .supported_events()
        .contains(evdev::EventType::KEY)
        && device
            .supported_keys()
            .map(|keys| keys.contains(evdev::Key::KEY_A))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vendor_product_is_zero_padded_hex() {
        let info = DeviceInfo {
            path: PathBuf::from("/dev/input/event3"),
            name: "Test Keyboard".to_string(),
            vendor: 0x3434,
            product: 0x61,
            keyboard: true,
        };
        assert_eq!(info.vendor_product(), "3434:0061");
    }

    #[test]
    fn test_only_event_nodes_are_considered() {
        assert!(is_event_node(Path::new("/dev/input/event0")));
        assert!(!is_event_node(Path::new("/dev/input/mice")));
        assert!(!is_event_node(Path::new("/dev/input/by-id")));
    }

    #[test]
    fn test_unopenable_nodes_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("event0"), b"not a device").unwrap();
        std::fs::write(dir.path().join("mouse0"), b"").unwrap();

        let devices = enumerate_devices_in(dir.path()).unwrap();
        assert!(devices.is_empty());
    }
}

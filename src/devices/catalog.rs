//! Enumeration of the serial devices connected to the host.

use log::{debug, trace};
use serialport::{SerialPortInfo, SerialPortType};

use crate::error::Result;

//==============================================================================
// Public Interface
//==============================================================================

/// One serial endpoint exposed by the operating system.
///
/// Devices are built fresh on every enumeration so that the list always
/// reflects what is plugged in right now.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Device {
    /// The device path, e.g. `/dev/ttyUSB0` or `COM3`.
    pub path: String,
    pub description: String,
    pub hardware_id: String,
}

/// Devices sorted by path. The position of a device in this list is the index
/// shown to the user when selecting a device.
pub type DeviceList = Vec<Device>;

/// A way of asking the operating system for its serial devices.
pub trait Enumerator {
    /// Whether this backend can also report symlinked aliases of devices.
    fn supports_aliases(&self) -> bool;

    /// Query the operating system. The result does not need to be sorted.
    fn enumerate(&self, include_aliases: bool) -> Result<Vec<Device>>;
}

/// Lists devices through an [`Enumerator`] and keeps them in a deterministic
/// order.
#[derive(Debug)]
pub struct DeviceCatalog<E: Enumerator = SystemEnumerator> {
    enumerator: E,
    aliases_supported: bool,
}

impl DeviceCatalog<SystemEnumerator> {
    /// A catalog backed by the enumerator of the platform `bcf` was built for.
    pub fn system() -> Self {
        Self::new(SystemEnumerator::default())
    }
}

impl<E: Enumerator> DeviceCatalog<E> {
    /// Creates the catalog, probing the alias capability of the backend once.
    pub fn new(enumerator: E) -> Self {
        let aliases_supported = enumerator.supports_aliases();
        debug!("device aliases supported: {}", aliases_supported);
        Self {
            enumerator,
            aliases_supported,
        }
    }

    pub fn aliases_supported(&self) -> bool {
        self.aliases_supported
    }

    /// Returns the connected devices sorted by path.
    ///
    /// When aliases are requested but not supported by the backend, the plain
    /// list of devices is returned instead.
    pub fn list_devices(&self, include_aliases: bool) -> Result<DeviceList> {
        if include_aliases && !self.aliases_supported {
            debug!("device aliases are not supported here, listing devices only");
        }
        let mut devices = self
            .enumerator
            .enumerate(include_aliases && self.aliases_supported)?;
        devices.sort_by(|a, b| a.path.cmp(&b.path));
        trace!("{} device(s) found", devices.len());
        Ok(devices)
    }
}

impl From<SerialPortInfo> for Device {
    fn from(info: SerialPortInfo) -> Self {
        let (description, hardware_id) = match info.port_type {
            SerialPortType::UsbPort(usb) => {
                let description = usb
                    .product
                    .clone()
                    .or_else(|| usb.manufacturer.clone())
                    .unwrap_or_else(|| NOT_AVAILABLE.into());
                let mut hardware_id = format!("USB VID:PID={:04X}:{:04X}", usb.vid, usb.pid);
                if let Some(serial) = &usb.serial_number {
                    hardware_id.push_str(" SER=");
                    hardware_id.push_str(serial);
                }
                (description, hardware_id)
            }
            SerialPortType::PciPort => (NOT_AVAILABLE.into(), "PCI".into()),
            SerialPortType::BluetoothPort => (NOT_AVAILABLE.into(), "BLUETOOTH".into()),
            SerialPortType::Unknown => (NOT_AVAILABLE.into(), NOT_AVAILABLE.into()),
        };
        Device {
            path: info.port_name,
            description,
            hardware_id,
        }
    }
}

//==============================================================================
// Platform backends
//==============================================================================

#[cfg(unix)]
pub use unix::UnixEnumerator as SystemEnumerator;
#[cfg(not(unix))]
pub use generic::PortsEnumerator as SystemEnumerator;

#[cfg(unix)]
mod unix {
    use std::{fs, path::Path};

    use log::{debug, trace};

    use super::{serialport_devices, Device, Enumerator};
    use crate::error::Result;

    /// Directories searched for symlinks to serial devices: `/dev` itself,
    /// where udev rules usually put named links such as `/dev/ttyBigClown`,
    /// and the stable links maintained by udev on Linux.
    const ALIAS_DIRS: [&str; 3] = ["/dev", "/dev/serial/by-id", "/dev/serial/by-path"];

    /// Lists devices with `serialport` and adds the symlinks pointing at them
    /// on request.
    #[derive(Debug, Default)]
    pub struct UnixEnumerator;

    impl Enumerator for UnixEnumerator {
        fn supports_aliases(&self) -> bool {
            true
        }

        fn enumerate(&self, include_aliases: bool) -> Result<Vec<Device>> {
            let mut devices = serialport_devices()?;
            if include_aliases {
                let dirs: Vec<&Path> = ALIAS_DIRS.iter().map(Path::new).collect();
                let aliases = collect_aliases(&devices, &dirs);
                devices.extend(aliases);
            }
            Ok(devices)
        }
    }

    /// Finds the symlinks directly inside `dirs` resolving to one of
    /// `devices`. Missing or unreadable directories are skipped.
    pub(super) fn collect_aliases(devices: &[Device], dirs: &[&Path]) -> Vec<Device> {
        let mut aliases = vec![];
        for dir in dirs {
            let entries = match fs::read_dir(dir) {
                Ok(entries) => entries,
                Err(e) => {
                    debug!("skipping {}: {}", dir.display(), e);
                    continue;
                }
            };
            for entry in entries.filter_map(|e| e.ok()) {
                let is_link = entry
                    .file_type()
                    .map(|t| t.is_symlink())
                    .unwrap_or(false);
                if !is_link {
                    continue;
                }
                let link = entry.path();
                let target = match fs::canonicalize(&link) {
                    Ok(target) => target,
                    Err(e) => {
                        trace!("dangling link {}: {}", link.display(), e);
                        continue;
                    }
                };
                let target = target.to_string_lossy();
                if let Some(device) = devices.iter().find(|d| d.path == target) {
                    aliases.push(Device {
                        path: link.to_string_lossy().into_owned(),
                        description: format!("link to {}", device.path),
                        hardware_id: device.hardware_id.clone(),
                    });
                }
            }
        }
        aliases
    }
}

#[cfg(not(unix))]
mod generic {
    use super::{serialport_devices, Device, Enumerator};
    use crate::error::Result;

    /// Lists devices with `serialport`; there is no notion of aliases.
    #[derive(Debug, Default)]
    pub struct PortsEnumerator;

    impl Enumerator for PortsEnumerator {
        fn supports_aliases(&self) -> bool {
            false
        }

        fn enumerate(&self, _include_aliases: bool) -> Result<Vec<Device>> {
            serialport_devices()
        }
    }
}

//==============================================================================
// Private stuff
//==============================================================================

const NOT_AVAILABLE: &str = "n/a";

fn serialport_devices() -> Result<Vec<Device>> {
    let ports = serialport::available_ports()?;
    Ok(ports.into_iter().map(Device::from).collect())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;
    use std::cell::Cell;

    struct FixedEnumerator {
        paths: Vec<&'static str>,
        aliases: bool,
        asked_for_aliases: Cell<Option<bool>>,
    }

    impl FixedEnumerator {
        fn new(paths: Vec<&'static str>, aliases: bool) -> Self {
            Self {
                paths,
                aliases,
                asked_for_aliases: Cell::new(None),
            }
        }
    }

    impl Enumerator for FixedEnumerator {
        fn supports_aliases(&self) -> bool {
            self.aliases
        }

        fn enumerate(&self, include_aliases: bool) -> Result<Vec<Device>> {
            self.asked_for_aliases.set(Some(include_aliases));
            Ok(self
                .paths
                .iter()
                .map(|p| Device {
                    path: (*p).into(),
                    description: "n/a".into(),
                    hardware_id: "n/a".into(),
                })
                .collect())
        }
    }

    fn paths(devices: &[Device]) -> Vec<&str> {
        devices.iter().map(|d| d.path.as_str()).collect()
    }

    #[test]
    fn devices_are_sorted_by_path() {
        let catalog = DeviceCatalog::new(FixedEnumerator::new(
            vec!["/dev/ttyUSB1", "/dev/ttyACM0", "/dev/ttyUSB0"],
            false,
        ));
        let devices = catalog.list_devices(false).unwrap();
        assert_eq!(
            paths(&devices),
            vec!["/dev/ttyACM0", "/dev/ttyUSB0", "/dev/ttyUSB1"]
        );
        // Same topology, same answer.
        assert_eq!(catalog.list_devices(false).unwrap(), devices);
    }

    #[test]
    fn alias_request_without_support_falls_back() {
        let catalog = DeviceCatalog::new(FixedEnumerator::new(vec!["COM3"], false));
        assert!(!catalog.aliases_supported());
        let devices = catalog.list_devices(true).unwrap();
        assert_eq!(paths(&devices), vec!["COM3"]);
        assert_eq!(catalog.enumerator.asked_for_aliases.get(), Some(false));
    }

    #[test]
    fn alias_request_with_support_is_forwarded() {
        let catalog = DeviceCatalog::new(FixedEnumerator::new(vec!["/dev/ttyS0"], true));
        catalog.list_devices(true).unwrap();
        assert_eq!(catalog.enumerator.asked_for_aliases.get(), Some(true));
    }

    #[test]
    fn usb_port_info_is_described() {
        let device = Device::from(SerialPortInfo {
            port_name: "/dev/ttyUSB0".into(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x0403,
                pid: 0x6015,
                serial_number: Some("DN01ABCD".into()),
                manufacturer: Some("FTDI".into()),
                product: Some("FT231X USB UART".into()),
            }),
        });
        assert_eq!(device.path, "/dev/ttyUSB0");
        assert_eq!(device.description, "FT231X USB UART");
        assert_eq!(device.hardware_id, "USB VID:PID=0403:6015 SER=DN01ABCD");
    }

    #[test]
    fn unknown_port_info_has_placeholders() {
        let device = Device::from(SerialPortInfo {
            port_name: "/dev/ttyS0".into(),
            port_type: SerialPortType::Unknown,
        });
        assert_eq!(device.description, "n/a");
        assert_eq!(device.hardware_id, "n/a");
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_to_known_devices_become_aliases() {
        use std::{fs, os::unix::fs::symlink};

        // `root` plays `/dev`: the device node, a named link next to it, and
        // a `by-id` directory of stable links.
        let root = tempfile::tempdir().unwrap();
        let target = root.path().join("ttyUSB0");
        fs::write(&target, b"").unwrap();
        let target = fs::canonicalize(&target).unwrap();
        symlink("ttyUSB0", root.path().join("ttyBigClown")).unwrap();
        fs::write(root.path().join("null"), b"").unwrap();
        let by_id = root.path().join("by-id");
        fs::create_dir(&by_id).unwrap();
        symlink(&target, by_id.join("usb-FTDI_DN01ABCD-if00-port0")).unwrap();
        symlink(root.path().join("nowhere"), by_id.join("dangling")).unwrap();

        let devices = vec![Device {
            path: target.to_string_lossy().into_owned(),
            description: "FT231X USB UART".into(),
            hardware_id: "USB VID:PID=0403:6015".into(),
        }];
        let missing = root.path().join("by-path");
        let dirs = [root.path(), by_id.as_path(), missing.as_path()];
        let mut aliases = unix::collect_aliases(&devices, &dirs);
        aliases.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(aliases.len(), 2);
        assert!(aliases[0].path.ends_with("by-id/usb-FTDI_DN01ABCD-if00-port0"));
        assert_eq!(
            aliases[1].path,
            root.path().join("ttyBigClown").to_string_lossy()
        );
        for alias in &aliases {
            assert_eq!(alias.description, format!("link to {}", target.display()));
            assert_eq!(alias.hardware_id, "USB VID:PID=0403:6015");
        }
    }
}

use std::ffi::OsStr;
use std::io;
use std::path::Path;

use super::{ChangeRecord, DeviceBackend, DeviceHandle, EventSocket, ScanEntry};

/// Name of the netlink group udevd rebroadcasts processed events on
pub const UDEV_EVENT_SOURCE: &str = "udev";

/// libudev-backed implementation
///
/// Holds one `udev` library context. Every device handle and monitor socket
/// created from it keeps its own reference, so dropping the backend never
/// invalidates them.
pub struct UdevBackend {
    udev: udev::Udev,
}

impl UdevBackend {
    pub fn open() -> io::Result<Self> {
        let udev = udev::Udev::new()?;
        Ok(Self { udev })
    }
}

impl std::fmt::Debug for UdevBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("UdevBackend")
    }
}

impl DeviceBackend for UdevBackend {
    type Device = udev::Device;
    type Socket = udev::MonitorSocket;

    fn scan(&self) -> io::Result<Vec<ScanEntry<udev::Device>>> {
        let mut enumerator = udev::Enumerator::with_udev(self.udev.clone())?;
        // The device iterator opens every listed syspath itself and leaves
        // out the ones that vanished before it got to them
        let entries = enumerator
            .scan_devices()?
            .map(|device| ScanEntry {
                syspath: device.syspath().to_path_buf(),
                device: Ok(device),
            })
            .collect();
        Ok(entries)
    }

    fn open_socket(&self, event_source: &str) -> io::Result<udev::MonitorSocket> {
        check_event_source(event_source)?;
        // `MonitorBuilder::with_udev` is crate-private in udev 0.8, so the
        // socket gets its own library context via the public constructor
        udev::MonitorBuilder::new()?.listen()
    }
}

/// MonitorBuilder always binds the "udev" group
fn check_event_source(event_source: &str) -> io::Result<()> {
    if event_source != UDEV_EVENT_SOURCE {
        return Err(io::Error::new(
            io::ErrorKind::Unsupported,
            format!("unsupported event source {event_source:?}"),
        ));
    }
    Ok(())
}

impl DeviceHandle for udev::Device {
    fn syspath(&self) -> &Path {
        udev::Device::syspath(self)
    }

    fn visit_properties(&self, visit: &mut dyn FnMut(&OsStr, Option<&OsStr>)) {
        // Entry::value() folds a missing value into "", property_value() does not
        for entry in self.properties() {
            visit(entry.name(), self.property_value(entry.name()));
        }
    }
}

impl DeviceHandle for udev::Event {
    fn syspath(&self) -> &Path {
        udev::Device::syspath(self)
    }

    fn visit_properties(&self, visit: &mut dyn FnMut(&OsStr, Option<&OsStr>)) {
        let device: &udev::Device = self;
        DeviceHandle::visit_properties(device, visit)
    }
}

impl ChangeRecord for udev::Event {
    fn action(&self) -> Option<&OsStr> {
        udev::Device::action(self)
    }
}

impl EventSocket for udev::MonitorSocket {
    type Record = udev::Event;

    fn receive(&mut self) -> Option<udev::Event> {
        self.iter().next()
    }
}

// SPDX-License-Identifier: GPL-3.0-only
//! Device-information library seam
//!
//! These traits describe the operations the crate needs from the library
//! that knows about devices: scan and open every device, read its
//! properties, and open a change-notification socket. [`libudev`] implements
//! them on top of libudev.

pub mod libudev;

#[cfg(test)]
pub(crate) mod fake;

use std::ffi::OsStr;
use std::io;
use std::os::fd::AsRawFd;
use std::path::{Path, PathBuf};

pub use self::libudev::{UDEV_EVENT_SOURCE, UdevBackend};

/// An open device handle
pub trait DeviceHandle {
    fn syspath(&self) -> &Path;

    /// Call `visit` for every property in library order
    ///
    /// The value is `None` when the library lists the name without a value.
    fn visit_properties(&self, visit: &mut dyn FnMut(&OsStr, Option<&OsStr>));
}

/// A device handle received from an event socket
pub trait ChangeRecord: DeviceHandle {
    fn action(&self) -> Option<&OsStr>;
}

/// A bound, receiving change-notification socket
pub trait EventSocket: AsRawFd {
    type Record: ChangeRecord;

    /// Receive one pending record without blocking
    fn receive(&mut self) -> Option<Self::Record>;
}

/// One device found by a scan
///
/// `device` is the handle the scan opened, or why it could not be opened.
#[derive(Debug)]
pub struct ScanEntry<D> {
    pub syspath: PathBuf,
    pub device: io::Result<D>,
}

pub trait DeviceBackend {
    type Device: DeviceHandle;
    type Socket: EventSocket;

    /// Scan every device known to the library, without filters, opening
    /// each one once
    ///
    /// The enumeration session is released before this returns.
    fn scan(&self) -> io::Result<Vec<ScanEntry<Self::Device>>>;

    /// Create a socket bound to `event_source` with receiving enabled
    fn open_socket(&self, event_source: &str) -> io::Result<Self::Socket>;
}

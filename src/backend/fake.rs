//! In-memory backend for tests
//!
//! Devices live in a plain list. The event bus hands every subscriber its own
//! queue plus a Unix socket pair; emitting an event queues a record and writes
//! one byte, so epoll and `AsyncFd` see real readiness per queued record.

use std::cell::{Cell, RefCell};
use std::collections::{HashSet, VecDeque};
use std::ffi::{OsStr, OsString};
use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsRawFd, RawFd};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::rc::{Rc, Weak};

use super::{ChangeRecord, DeviceBackend, DeviceHandle, EventSocket, ScanEntry};

#[derive(Debug, Clone)]
pub(crate) struct FakeDevice {
    syspath: PathBuf,
    properties: Vec<(OsString, Option<OsString>)>,
}

impl FakeDevice {
    pub(crate) fn new(syspath: impl Into<PathBuf>) -> Self {
        Self {
            syspath: syspath.into(),
            properties: Vec::new(),
        }
    }

    pub(crate) fn with(mut self, name: &str, value: &str) -> Self {
        self.properties.push((name.into(), Some(value.into())));
        self
    }

    pub(crate) fn without_value(mut self, name: &str) -> Self {
        self.properties.push((name.into(), None));
        self
    }
}

impl DeviceHandle for FakeDevice {
    fn syspath(&self) -> &Path {
        &self.syspath
    }

    fn visit_properties(&self, visit: &mut dyn FnMut(&OsStr, Option<&OsStr>)) {
        for (name, value) in &self.properties {
            visit(name.as_os_str(), value.as_deref());
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct FakeRecord {
    action: Option<OsString>,
    device: FakeDevice,
}

impl FakeRecord {
    pub(crate) fn new(action: Option<&str>, device: FakeDevice) -> Self {
        Self {
            action: action.map(OsString::from),
            device,
        }
    }
}

impl DeviceHandle for FakeRecord {
    fn syspath(&self) -> &Path {
        self.device.syspath()
    }

    fn visit_properties(&self, visit: &mut dyn FnMut(&OsStr, Option<&OsStr>)) {
        self.device.visit_properties(visit)
    }
}

impl ChangeRecord for FakeRecord {
    fn action(&self) -> Option<&OsStr> {
        self.action.as_deref()
    }
}

struct Subscriber {
    queue: RefCell<VecDeque<FakeRecord>>,
    writer: UnixStream,
}

pub(crate) struct FakeSocket {
    subscriber: Rc<Subscriber>,
    reader: UnixStream,
    /// Reported in place of `reader`; epoll refuses regular files
    unpollable: Option<File>,
}

impl AsRawFd for FakeSocket {
    fn as_raw_fd(&self) -> RawFd {
        match &self.unpollable {
            Some(file) => file.as_raw_fd(),
            None => self.reader.as_raw_fd(),
        }
    }
}

impl EventSocket for FakeSocket {
    type Record = FakeRecord;

    fn receive(&mut self) -> Option<FakeRecord> {
        let mut byte = [0u8; 1];
        match self.reader.read(&mut byte) {
            Ok(1) => self.subscriber.queue.borrow_mut().pop_front(),
            _ => None,
        }
    }
}

#[derive(Default)]
pub(crate) struct FakeBackend {
    devices: RefCell<Vec<FakeDevice>>,
    unopenable: RefCell<HashSet<PathBuf>>,
    subscribers: RefCell<Vec<Weak<Subscriber>>>,
    fail_scan: Cell<bool>,
    fail_socket: Cell<bool>,
    unpollable_socket: Cell<bool>,
    opens: Cell<usize>,
}

impl FakeBackend {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add_device(&self, device: FakeDevice) {
        self.devices.borrow_mut().push(device);
    }

    /// The device still shows up in scans but vanishes before it can be opened
    pub(crate) fn make_unopenable(&self, syspath: &str) {
        self.unopenable.borrow_mut().insert(PathBuf::from(syspath));
    }

    pub(crate) fn fail_scan(&self) {
        self.fail_scan.set(true);
    }

    pub(crate) fn fail_socket(&self) {
        self.fail_socket.set(true);
    }

    /// Sockets open fine but hand out a descriptor no poller accepts
    pub(crate) fn unpollable_socket(&self) {
        self.unpollable_socket.set(true);
    }

    /// Device handles opened so far
    pub(crate) fn opens(&self) -> usize {
        self.opens.get()
    }

    /// Broadcast a change to every live socket
    pub(crate) fn emit(&self, action: &str, device: FakeDevice) {
        let record = FakeRecord::new(Some(action), device);
        let mut subscribers = self.subscribers.borrow_mut();
        subscribers.retain(|subscriber| subscriber.strong_count() > 0);
        for subscriber in subscribers.iter().filter_map(Weak::upgrade) {
            subscriber.queue.borrow_mut().push_back(record.clone());
            (&subscriber.writer)
                .write_all(&[1])
                .expect("fake bus write");
        }
    }

    pub(crate) fn live_sockets(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|subscriber| subscriber.strong_count() > 0)
            .count()
    }
}

impl DeviceBackend for FakeBackend {
    type Device = FakeDevice;
    type Socket = FakeSocket;

    fn scan(&self) -> io::Result<Vec<ScanEntry<FakeDevice>>> {
        if self.fail_scan.get() {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let unopenable = self.unopenable.borrow();
        let entries = self
            .devices
            .borrow()
            .iter()
            .map(|device| {
                self.opens.set(self.opens.get() + 1);
                let opened = if unopenable.contains(&device.syspath) {
                    Err(io::Error::from(io::ErrorKind::NotFound))
                } else {
                    Ok(device.clone())
                };
                ScanEntry {
                    syspath: device.syspath.clone(),
                    device: opened,
                }
            })
            .collect();
        Ok(entries)
    }

    fn open_socket(&self, _event_source: &str) -> io::Result<FakeSocket> {
        if self.fail_socket.get() {
            return Err(io::Error::from(io::ErrorKind::PermissionDenied));
        }
        let (reader, writer) = UnixStream::pair()?;
        reader.set_nonblocking(true)?;
        let subscriber = Rc::new(Subscriber {
            queue: RefCell::new(VecDeque::new()),
            writer,
        });
        self.subscribers.borrow_mut().push(Rc::downgrade(&subscriber));

        let unpollable = if self.unpollable_socket.get() {
            Some(unpollable_file()?)
        } else {
            None
        };
        Ok(FakeSocket {
            subscriber,
            reader,
            unpollable,
        })
    }
}

/// An open regular file that is already unlinked
fn unpollable_file() -> io::Result<File> {
    static NEXT: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);
    let n = NEXT.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("devwatch-fake-{}-{}", std::process::id(), n));
    let file = File::create(&path)?;
    std::fs::remove_file(&path)?;
    Ok(file)
}

// SPDX-License-Identifier: GPL-3.0-only
//! Linux device enumeration and hotplug monitoring over udev
//!
//! [`list`] takes a snapshot of every device the udev database knows about.
//! [`Monitor`] subscribes to the udev event socket and delivers each later
//! change to a [`Listener`] from a single-threaded [`EventLoop`];
//! [`MonitorStream`] delivers the same changes as an async stream.
//!
//! Both need a [`DeviceContext`], created once and lent by reference:
//!
//! ```no_run
//! use devwatch::{DeviceContext, DeviceEvent, EventLoop, Monitor};
//!
//! # fn main() -> anyhow::Result<()> {
//! let context = DeviceContext::create()?;
//! for record in devwatch::list(&context)? {
//!     println!("{}", record.syspath);
//! }
//!
//! let mut event_loop = EventLoop::new()?;
//! let _monitor = Monitor::open(&context, &event_loop.handle(), |event: DeviceEvent| -> anyhow::Result<()> {
//!     println!("{} {}", event.action, event.record.syspath);
//!     Ok(())
//! })?;
//! event_loop.run()?;
//! # Ok(())
//! # }
//! ```

#[macro_use]
extern crate tracing;

pub mod backend;
pub mod config;
pub mod context;
pub mod device;
pub mod enumerate;
pub mod error;
pub mod event_loop;
pub mod monitor;

pub use config::Config;
pub use context::DeviceContext;
pub use device::{DeviceAction, DeviceEvent, DeviceRecord, Properties, PropertyValue};
pub use enumerate::list;
pub use error::{Error, Result};
pub use event_loop::{EventLoop, LoopHandle, SignalStop};
#[cfg(feature = "stream")]
pub use monitor::MonitorStream;
pub use monitor::{Listener, Monitor, MonitorState};

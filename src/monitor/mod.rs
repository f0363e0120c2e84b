// SPDX-License-Identifier: GPL-3.0-only
//! Live device-change subscription
//!
//! A [`Monitor`] owns a udev event socket and its registration with an
//! [`EventLoop`](crate::event_loop::EventLoop). Each readiness notification
//! receives exactly one pending record, decodes it and hands it to the
//! [`Listener`]. Records queued behind it are left for later turns, so
//! delivery follows socket order one event per turn.
//!
//! # Lifecycle
//!
//! ```text
//! open ──▶ Open ──close──▶ Closed
//!                          close ──▶ Err(AlreadyClosed)
//! ```
//!
//! While Open the socket and the registration both exist and point at each
//! other; while Closed neither does. Dropping an Open monitor closes it.
//!
//! Every monitor binds its own socket to the udev multicast group, so
//! independently opened monitors each see every event.

#[cfg(feature = "stream")]
mod stream;

#[cfg(feature = "stream")]
pub use stream::MonitorStream;

use std::cell::RefCell;
use std::os::fd::AsRawFd;
use std::path::PathBuf;
use std::rc::Rc;

use crate::backend::{DeviceBackend, EventSocket, UDEV_EVENT_SOURCE};
use crate::context::DeviceContext;
use crate::device::{DeviceEvent, decode_event};
use crate::error::{Error, Result};
use crate::event_loop::{LoopHandle, ReadyHandler, Token};

/// Receiver of delivered device changes
///
/// An error returned here is treated as a program defect: it is logged and
/// escalated out of the event loop as [`Error::ListenerFault`].
pub trait Listener {
    fn on_event(&mut self, event: DeviceEvent) -> anyhow::Result<()>;
}

impl<F> Listener for F
where
    F: FnMut(DeviceEvent) -> anyhow::Result<()>,
{
    fn on_event(&mut self, event: DeviceEvent) -> anyhow::Result<()> {
        self(event)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MonitorState {
    Open,
    Closed,
}

struct Dispatcher<S> {
    socket: RefCell<Option<S>>,
    listener: RefCell<Box<dyn Listener>>,
}

impl<S: EventSocket> ReadyHandler for Dispatcher<S> {
    fn on_readable(&self) -> Result<()> {
        let event = {
            let mut socket = self.socket.borrow_mut();
            let Some(socket) = socket.as_mut() else {
                trace!("Readiness on a closed monitor, ignoring");
                return Ok(());
            };
            match socket.receive() {
                Some(record) => decode_event(&record),
                None => {
                    warn!(
                        "Monitor socket readable but no record pending, events may have been dropped"
                    );
                    return Ok(());
                }
            }
        };

        debug!("Device {}: {}", event.action, event.record.syspath);

        // The socket borrow is released, so the listener may close the monitor
        let action = event.action.clone();
        let syspath = PathBuf::from(&event.record.syspath);
        self.listener
            .borrow_mut()
            .on_event(event)
            .map_err(|source| {
                error!(
                    "Listener failed on {} event for {}: {:#}",
                    action,
                    syspath.display(),
                    source
                );
                Error::ListenerFault {
                    action,
                    syspath,
                    source,
                }
            })
    }
}

pub struct Monitor<S: EventSocket + 'static> {
    dispatcher: Rc<Dispatcher<S>>,
    handle: LoopHandle,
    token: Token,
}

impl<S: EventSocket + 'static> Monitor<S> {
    /// Subscribe to device changes and start delivering them to `listener`
    ///
    /// Fails with [`Error::Subscription`] if the socket cannot be opened or
    /// registered; in that case nothing is left registered or open.
    pub fn open<B>(
        context: &DeviceContext<B>,
        handle: &LoopHandle,
        listener: impl Listener + 'static,
    ) -> Result<Self>
    where
        B: DeviceBackend<Socket = S>,
    {
        let subscription_error = |source| Error::Subscription {
            event_source: UDEV_EVENT_SOURCE.to_string(),
            source,
        };

        let socket = context
            .backend()
            .open_socket(UDEV_EVENT_SOURCE)
            .map_err(subscription_error)?;
        let fd = socket.as_raw_fd();

        let dispatcher = Rc::new(Dispatcher {
            socket: RefCell::new(Some(socket)),
            listener: RefCell::new(Box::new(listener)),
        });

        let token = match handle.register(fd, dispatcher.clone()) {
            Ok(token) => token,
            Err(Error::EventLoop(source)) => return Err(subscription_error(source)),
            Err(e) => return Err(e),
        };

        info!("Monitor opened on {} (fd {}, {})", UDEV_EVENT_SOURCE, fd, token);

        Ok(Self {
            dispatcher,
            handle: handle.clone(),
            token,
        })
    }

    pub fn state(&self) -> MonitorState {
        if self.dispatcher.socket.borrow().is_some() {
            MonitorState::Open
        } else {
            MonitorState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == MonitorState::Open
    }

    pub fn token(&self) -> Token {
        self.token
    }

    /// Stop delivery and release the socket
    ///
    /// After this returns the listener is never called again for this
    /// monitor. Closing twice returns [`Error::AlreadyClosed`].
    pub fn close(&mut self) -> Result<()> {
        let Some(socket) = self.dispatcher.socket.borrow_mut().take() else {
            return Err(Error::AlreadyClosed);
        };

        // Deregister while the descriptor is still open
        let deregistered = self.handle.deregister(self.token);
        drop(socket);

        info!("Monitor closed ({})", self.token);
        deregistered
    }
}

impl<S: EventSocket + 'static> Drop for Monitor<S> {
    fn drop(&mut self) {
        if self.is_open() {
            if let Err(e) = self.close() {
                warn!("Failed to close monitor on drop: {}", e);
            }
        }
    }
}

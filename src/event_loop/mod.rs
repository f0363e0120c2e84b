// SPDX-License-Identifier: GPL-3.0-only
//! Single-threaded readiness event loop
//!
//! The loop owns an epoll instance and a table of registrations. Each
//! registration pairs a descriptor with a [`ReadyHandler`]; every turn waits
//! once and calls `on_readable` once per ready registration. Nothing here
//! blocks except the wait itself.
//!
//! # Faults
//!
//! A handler error ends the turn immediately and is returned from
//! [`EventLoop::turn`] (and [`EventLoop::run`]) unchanged. Registrations are
//! left in place, so the owner of each registration is still responsible for
//! releasing it.

mod poller;
mod signals;

pub use poller::Poller;
pub use signals::SignalStop;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::os::fd::RawFd;
use std::rc::Rc;
use std::time::Duration;

use crate::error::Result;

/// Identifies one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Token(u64);

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Receiver of readiness notifications
pub trait ReadyHandler {
    /// The registered descriptor is readable
    fn on_readable(&self) -> Result<()>;
}

struct Registration {
    fd: RawFd,
    handler: Rc<dyn ReadyHandler>,
}

struct Shared {
    poller: Poller,
    registrations: RefCell<HashMap<Token, Registration>>,
    next_token: Cell<u64>,
    stopped: Cell<bool>,
}

pub struct EventLoop {
    shared: Rc<Shared>,
}

/// Cloneable handle for registering with an [`EventLoop`]
#[derive(Clone)]
pub struct LoopHandle {
    shared: Rc<Shared>,
}

impl EventLoop {
    pub fn new() -> Result<Self> {
        Ok(Self {
            shared: Rc::new(Shared {
                poller: Poller::new()?,
                registrations: RefCell::new(HashMap::new()),
                next_token: Cell::new(0),
                stopped: Cell::new(false),
            }),
        })
    }

    pub fn handle(&self) -> LoopHandle {
        LoopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Wait once and dispatch every ready registration
    ///
    /// Returns the number of handlers invoked. `None` waits until something
    /// becomes ready.
    pub fn turn(&mut self, timeout: Option<Duration>) -> Result<usize> {
        let ready = self.shared.poller.wait(timeout)?;
        let mut dispatched = 0;

        for token in ready.into_iter().map(Token) {
            // Release the table borrow before calling out: handlers may
            // deregister themselves or others.
            let handler = match self.shared.registrations.borrow().get(&token) {
                Some(registration) => registration.handler.clone(),
                None => {
                    trace!("Skipping readiness for deregistered token {}", token);
                    continue;
                }
            };

            handler.on_readable()?;
            dispatched += 1;
        }

        Ok(dispatched)
    }

    /// Turn until [`LoopHandle::stop`] is called or a handler fails
    pub fn run(&mut self) -> Result<()> {
        self.shared.stopped.set(false);
        debug!("Event loop running");

        while !self.shared.stopped.get() {
            self.turn(None)?;
        }

        debug!("Event loop stopped");
        Ok(())
    }

    pub fn registration_count(&self) -> usize {
        self.shared.registrations.borrow().len()
    }
}

impl LoopHandle {
    /// Watch `fd` for readability and call `handler` when it is
    pub fn register(&self, fd: RawFd, handler: Rc<dyn ReadyHandler>) -> Result<Token> {
        let token = Token(self.shared.next_token.get());
        self.shared.poller.add(fd, token.0)?;
        self.shared.next_token.set(token.0 + 1);
        self.shared
            .registrations
            .borrow_mut()
            .insert(token, Registration { fd, handler });
        debug!("Registered fd {} as {}", fd, token);
        Ok(token)
    }

    /// Stop watching the descriptor behind `token`
    ///
    /// The descriptor must still be open.
    pub fn deregister(&self, token: Token) -> Result<()> {
        let registration = self.shared.registrations.borrow_mut().remove(&token);
        match registration {
            Some(registration) => {
                self.shared.poller.delete(registration.fd)?;
                debug!("Deregistered fd {} ({})", registration.fd, token);
            }
            None => warn!("Deregister of unknown token {}", token),
        }
        Ok(())
    }

    pub fn is_registered(&self, token: Token) -> bool {
        self.shared.registrations.borrow().contains_key(&token)
    }

    /// Make [`EventLoop::run`] return after the current turn
    pub fn stop(&self) {
        self.shared.stopped.set(true);
    }
}

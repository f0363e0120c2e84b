// SPDX-License-Identifier: GPL-3.0-only
//! Stopping the loop on process signals

use std::cell::RefCell;
use std::io;
use std::os::fd::{AsFd, AsRawFd};
use std::rc::Rc;

use nix::sys::signal::{SigSet, Signal};
use nix::sys::signalfd::{SfdFlags, SignalFd};

use super::{LoopHandle, ReadyHandler, Token};
use crate::error::Result;

struct StopOnSignal {
    fd: RefCell<SignalFd>,
    handle: LoopHandle,
}

impl ReadyHandler for StopOnSignal {
    fn on_readable(&self) -> Result<()> {
        while let Some(info) = self.fd.borrow_mut().read_signal().map_err(io::Error::from)? {
            match Signal::try_from(info.ssi_signo as i32) {
                Ok(signal) => info!("Received {}, stopping", signal),
                Err(_) => info!("Received signal {}, stopping", info.ssi_signo),
            }
            self.handle.stop();
        }
        Ok(())
    }
}

/// Stops an [`EventLoop`](super::EventLoop) when one of a set of signals arrives
///
/// The signals are blocked on the calling thread and read from a signalfd
/// registered with the loop, so `run` returns normally and the caller gets to
/// close its monitors. Dropping the guard removes the registration; the
/// signals stay blocked.
pub struct SignalStop {
    handle: LoopHandle,
    token: Token,
}

impl SignalStop {
    pub fn install(handle: &LoopHandle, signals: &[Signal]) -> Result<Self> {
        let mut mask = SigSet::empty();
        for signal in signals {
            mask.add(*signal);
        }
        mask.thread_block().map_err(io::Error::from)?;

        let fd = SignalFd::with_flags(&mask, SfdFlags::SFD_NONBLOCK | SfdFlags::SFD_CLOEXEC)
            .map_err(io::Error::from)?;
        let raw_fd = fd.as_fd().as_raw_fd();
        let token = handle.register(
            raw_fd,
            Rc::new(StopOnSignal {
                fd: RefCell::new(fd),
                handle: handle.clone(),
            }),
        )?;

        debug!("Stopping on {:?} (fd {}, {})", signals, raw_fd, token);
        Ok(Self {
            handle: handle.clone(),
            token,
        })
    }

    pub fn token(&self) -> Token {
        self.token
    }
}

impl Drop for SignalStop {
    fn drop(&mut self) {
        if let Err(e) = self.handle.deregister(self.token) {
            warn!("Failed to remove signal registration: {}", e);
        }
    }
}

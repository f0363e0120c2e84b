// SPDX-License-Identifier: GPL-3.0-only
//! Device-information context
//!
//! Created once by the application's composition root and lent by reference
//! to every enumeration and every monitor. Nothing mutates it after creation.

use crate::backend::{DeviceBackend, UdevBackend};
use crate::error::{Error, Result};

#[derive(Debug)]
pub struct DeviceContext<B = UdevBackend> {
    backend: B,
}

impl DeviceContext<UdevBackend> {
    /// Open the udev library context
    ///
    /// Fails with [`Error::Init`] when libudev cannot be initialised.
    pub fn create() -> Result<Self> {
        let backend = UdevBackend::open().map_err(Error::Init)?;
        info!("Device context created");
        Ok(Self { backend })
    }
}

impl<B: DeviceBackend> DeviceContext<B> {
    pub fn with_backend(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Release the library context
    ///
    /// Consumes the context, so no enumeration or monitor open can still be
    /// borrowing it. Monitors opened earlier keep their own socket alive.
    pub fn shutdown(self) {
        drop(self.backend);
        info!("Device context shut down");
    }
}

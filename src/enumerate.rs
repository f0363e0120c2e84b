// SPDX-License-Identifier: GPL-3.0-only
//! One-shot device enumeration

use crate::backend::{DeviceBackend, ScanEntry};
use crate::context::DeviceContext;
use crate::device::{DeviceRecord, decode_properties};
use crate::error::{Error, Result};

/// Snapshot every device currently known to the library
///
/// Records come back in scan order. A device that disappears between being
/// listed and being opened is skipped; only a failure of the scan itself
/// fails the call.
pub fn list<B: DeviceBackend>(context: &DeviceContext<B>) -> Result<Vec<DeviceRecord>> {
    let entries = context.backend().scan().map_err(Error::Enumeration)?;

    let mut records = Vec::with_capacity(entries.len());
    let mut skipped = 0;

    for ScanEntry { syspath, device } in entries {
        let device = match device {
            Ok(device) => device,
            Err(e) => {
                warn!("Skipping device {}: {}", syspath.display(), e);
                skipped += 1;
                continue;
            }
        };

        records.push(DeviceRecord::new(
            syspath.to_string_lossy(),
            decode_properties(&device),
        ));
    }

    if skipped > 0 {
        info!("Enumerated {} device(s), skipped {}", records.len(), skipped);
    } else {
        debug!("Enumerated {} device(s)", records.len());
    }

    Ok(records)
}

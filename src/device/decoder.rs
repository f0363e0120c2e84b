use crate::backend::{ChangeRecord, DeviceHandle};

use super::{DeviceAction, DeviceEvent, DeviceRecord, Properties, PropertyValue};

/// Build the property mapping of an open device handle
///
/// Entries keep the order the library lists them in. The handle stays owned
/// by the caller.
pub fn decode_properties<D: DeviceHandle + ?Sized>(device: &D) -> Properties {
    let mut properties = Properties::new();
    device.visit_properties(&mut |name, value| {
        let value = match value {
            Some(value) => PropertyValue::Present(value.to_string_lossy().into_owned()),
            None => PropertyValue::Absent,
        };
        properties.insert(name.to_string_lossy(), value);
    });
    properties
}

/// Decode one received change record into an event
pub fn decode_event<R: ChangeRecord + ?Sized>(record: &R) -> DeviceEvent {
    let action = record
        .action()
        .map(|action| DeviceAction::from_raw(&action.to_string_lossy()))
        .unwrap_or_else(|| DeviceAction::Other(String::new()));

    DeviceEvent {
        action,
        record: DeviceRecord::new(
            record.syspath().to_string_lossy(),
            decode_properties(record),
        ),
    }
}

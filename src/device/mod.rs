// SPDX-License-Identifier: GPL-3.0-only
//! Device records and change events
//!
//! A [`DeviceRecord`] is built fresh for every enumerated device and every
//! delivered change, and is owned by whoever receives it. Property values
//! keep the distinction between a name that carries no value
//! ([`PropertyValue::Absent`]) and a name whose value is the empty string.

mod decoder;

pub use decoder::{decode_event, decode_properties};

use std::fmt;

use indexmap::IndexMap;
use serde::ser::{Serialize, Serializer};

/// Value of a single device property
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyValue {
    Present(String),
    /// The name is listed by the device but carries no value
    Absent,
}

impl PropertyValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            PropertyValue::Present(value) => Some(value),
            PropertyValue::Absent => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, PropertyValue::Absent)
    }
}

impl Serialize for PropertyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_str().serialize(serializer)
    }
}

impl From<Option<String>> for PropertyValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(PropertyValue::Absent, PropertyValue::Present)
    }
}

/// Device properties in the order the device-information library listed them
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct Properties {
    entries: IndexMap<String, PropertyValue>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a property, replacing the value in place if the name exists
    pub fn insert(&mut self, name: impl Into<String>, value: PropertyValue) {
        self.entries.insert(name.into(), value);
    }

    /// `None` means the device does not list the name at all
    pub fn get(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

/// Snapshot of one device
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeviceRecord {
    pub syspath: String,
    pub properties: Properties,
}

impl DeviceRecord {
    pub fn new(syspath: impl Into<String>, properties: Properties) -> Self {
        Self {
            syspath: syspath.into(),
            properties,
        }
    }
}

/// Kind of device-lifecycle transition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceAction {
    Add,
    Remove,
    Change,
    Move,
    Bind,
    Unbind,
    Online,
    Offline,
    /// Any action string outside the known set, kept verbatim
    Other(String),
}

impl DeviceAction {
    pub fn from_raw(action: &str) -> Self {
        match action {
            "add" => DeviceAction::Add,
            "remove" => DeviceAction::Remove,
            "change" => DeviceAction::Change,
            "move" => DeviceAction::Move,
            "bind" => DeviceAction::Bind,
            "unbind" => DeviceAction::Unbind,
            "online" => DeviceAction::Online,
            "offline" => DeviceAction::Offline,
            other => DeviceAction::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DeviceAction::Add => "add",
            DeviceAction::Remove => "remove",
            DeviceAction::Change => "change",
            DeviceAction::Move => "move",
            DeviceAction::Bind => "bind",
            DeviceAction::Unbind => "unbind",
            DeviceAction::Online => "online",
            DeviceAction::Offline => "offline",
            DeviceAction::Other(other) => other,
        }
    }
}

impl fmt::Display for DeviceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DeviceAction {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// One delivered device change
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct DeviceEvent {
    pub action: DeviceAction,
    pub record: DeviceRecord,
}

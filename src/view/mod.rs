//! Projection of grouped devices into a visual tree
//!
//! Rendering never fails and never touches the network. An error message
//! replaces the whole device list.

mod html;
mod state;

pub use self::state::LoadState;

use chrono::{DateTime, NaiveDate};

use crate::models::{Device, Property, Thing};

pub const PAGE_TITLE: &str = "Arduino IoT Cloud Devices";
pub const NO_THINGS_PLACEHOLDER: &str = "No things associated with this device";

#[derive(Debug, Clone, PartialEq)]
pub enum Page {
    ErrorBanner(String),
    Loading,
    DeviceList { title: String, devices: Vec<DeviceCard> },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceCard {
    pub name: String,
    pub id_badge: String,
    pub things: ThingsSection,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ThingsSection {
    Placeholder(String),
    Things(Vec<ThingCard>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThingCard {
    pub name: String,
    pub created: String,
    pub properties: Vec<PropertyLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyLine {
    pub name: String,
    pub property_type: String,
    /// Serialized value; `None` when the value is undefined
    pub value: Option<String>,
}

pub fn render(devices: &[Device], error: Option<&str>) -> Page {
    if let Some(message) = error {
        return Page::ErrorBanner(message.to_string());
    }

    Page::DeviceList {
        title: PAGE_TITLE.to_string(),
        devices: devices.iter().map(device_card).collect(),
    }
}

fn device_card(device: &Device) -> DeviceCard {
    let things = if device.things.is_empty() {
        ThingsSection::Placeholder(NO_THINGS_PLACEHOLDER.to_string())
    } else {
        ThingsSection::Things(device.things.iter().map(thing_card).collect())
    };

    DeviceCard {
        name: device.name.clone(),
        id_badge: format!("Device ID: {}", device.id),
        things,
    }
}

fn thing_card(thing: &Thing) -> ThingCard {
    ThingCard {
        name: thing.name.clone(),
        created: thing
            .created_at
            .as_deref()
            .map(locale_date)
            .unwrap_or_default(),
        properties: thing.properties.iter().map(property_line).collect(),
    }
}

fn property_line(property: &Property) -> PropertyLine {
    PropertyLine {
        name: property.name.clone(),
        property_type: property.property_type.clone(),
        value: property.value.as_ref().map(|v| v.display()),
    }
}

/// `M/D/YYYY` in UTC. Unparseable input is shown as-is.
pub fn locale_date(raw: &str) -> String {
    const FORMAT: &str = "%-m/%-d/%Y";

    if let Ok(timestamp) = DateTime::parse_from_rfc3339(raw) {
        return timestamp.naive_utc().format(FORMAT).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.format(FORMAT).to_string();
    }
    raw.to_string()
}

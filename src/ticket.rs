//! Ticket record
//!
//! A ticket is an open-ended JSON object. The five known fields have typed
//! accessors; anything else a caller sends is kept verbatim.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// JSON object used for create payloads and partial updates
pub type Fields = Map<String, Value>;

/// Field names of the known ticket attributes
pub mod field {
    pub const ID: &str = "id";
    pub const EVENT_NAME: &str = "eventName";
    pub const PRICE: &str = "price";
    pub const BUYER: &str = "buyer";
    pub const CREATED_AT: &str = "createdAt";
}

/// An event ticket
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ticket {
    fields: Fields,
}

impl Ticket {
    /// Wrap an arbitrary field map
    pub fn from_fields(fields: Fields) -> Self {
        Self { fields }
    }

    /// Build a ticket from the known fields only
    pub fn new(event_name: impl Into<String>, price: f64) -> Self {
        let mut fields = Fields::new();
        fields.insert(field::EVENT_NAME.to_string(), Value::String(event_name.into()));
        fields.insert(field::PRICE.to_string(), Value::from(price));
        Self { fields }
    }

    pub fn id(&self) -> Option<&str> {
        self.fields.get(field::ID).and_then(Value::as_str)
    }

    pub fn event_name(&self) -> Option<&str> {
        self.fields.get(field::EVENT_NAME).and_then(Value::as_str)
    }

    pub fn price(&self) -> Option<f64> {
        self.fields.get(field::PRICE).and_then(Value::as_f64)
    }

    pub fn buyer(&self) -> Option<&str> {
        self.fields.get(field::BUYER).and_then(Value::as_str)
    }

    /// The raw `createdAt` string as stored
    pub fn created_at(&self) -> Option<&str> {
        self.fields.get(field::CREATED_AT).and_then(Value::as_str)
    }

    /// `createdAt` parsed as a UTC timestamp
    pub fn created_at_time(&self) -> Option<DateTime<Utc>> {
        let raw = self.created_at()?;
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|t| t.with_timezone(&Utc))
    }

    /// Any field by name
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    /// Set a field, replacing any previous value
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.fields.insert(name.into(), value);
    }

    /// Remove a field
    pub fn unset(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    /// Overwrite every field present in `patch`; fields it omits are kept
    pub fn overwrite(&mut self, patch: Fields) {
        for (name, value) in patch {
            self.fields.insert(name, value);
        }
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn into_fields(self) -> Fields {
        self.fields
    }
}

impl From<Fields> for Ticket {
    fn from(fields: Fields) -> Self {
        Self::from_fields(fields)
    }
}

/// Render a timestamp the way tickets store it: RFC 3339, millis, `Z`
pub fn format_timestamp(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

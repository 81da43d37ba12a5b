//! Value objects: typed views over a decoded response body.

use serde_json::{Map, Value};

use crate::store::DataStore;

/// A typed wrapper populated from a decoded JSON object. Implementations
/// bulk-assign their fields in `apply_from_map`; no validation of field types
/// or required fields is performed at this layer.
pub trait ValueObject {
    fn apply_from_map(&mut self, data: &Map<String, Value>);

    /// True iff at least one field was populated.
    fn is_valid(&self) -> bool;
}

/// The generic value object: an untyped field bag with the [`DataStore`]
/// accessors for ad-hoc reads. Useful when an API response has no dedicated
/// struct or when only a couple of fields matter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawVo {
    fields: DataStore,
}

impl RawVo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_map(data: Map<String, Value>) -> Self {
        Self {
            fields: DataStore::from(data),
        }
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn string_or(&self, key: &str, default: &str) -> String {
        self.fields.string_or(key, default)
    }

    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        self.fields.bool_or(key, default)
    }

    pub fn map_or_empty(&self, key: &str) -> Map<String, Value> {
        self.fields.map_or_empty(key)
    }

    pub fn fields(&self) -> &DataStore {
        &self.fields
    }
}

impl ValueObject for RawVo {
    fn apply_from_map(&mut self, data: &Map<String, Value>) {
        self.fields.merge(data.clone());
    }

    fn is_valid(&self) -> bool {
        !self.fields.is_empty()
    }
}

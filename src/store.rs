//! Generic key/value storage backing request data, query data, and value
//! object fields. Reads of unset keys return a caller-supplied (or
//! type-appropriate) default rather than an error.

use serde_json::{Map, Value};

/// A string-keyed bag of JSON values with typed convenience accessors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStore {
    items: Map<String, Value>,
}

impl DataStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.items.get(key)
    }

    /// Read a value, falling back to `default` when the key is unset.
    pub fn get_or(&self, key: &str, default: Value) -> Value {
        self.items.get(key).cloned().unwrap_or(default)
    }

    /// Read a string value; non-string values and unset keys yield `default`.
    pub fn string_or(&self, key: &str, default: &str) -> String {
        match self.items.get(key) {
            Some(Value::String(s)) => s.clone(),
            _ => default.to_string(),
        }
    }

    /// Read a boolean value; non-boolean values and unset keys yield `default`.
    pub fn bool_or(&self, key: &str, default: bool) -> bool {
        match self.items.get(key) {
            Some(Value::Bool(b)) => *b,
            _ => default,
        }
    }

    /// Read a map value; anything else yields an empty map.
    pub fn map_or_empty(&self, key: &str) -> Map<String, Value> {
        match self.items.get(key) {
            Some(Value::Object(map)) => map.clone(),
            _ => Map::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.items.insert(key.into(), value.into());
        self
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.items.remove(key)
    }

    /// Overlay `data` onto the store; existing keys are overwritten.
    pub fn merge(&mut self, data: Map<String, Value>) -> &mut Self {
        for (key, value) in data {
            self.items.insert(key, value);
        }
        self
    }

    /// Discard the current contents and adopt `data` wholesale.
    pub fn replace(&mut self, data: Map<String, Value>) -> &mut Self {
        self.items = data;
        self
    }

    pub fn clear(&mut self) -> &mut Self {
        self.items.clear();
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.items.iter()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.items
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.items
    }
}

impl From<Map<String, Value>> for DataStore {
    fn from(items: Map<String, Value>) -> Self {
        Self { items }
    }
}

impl From<DataStore> for Map<String, Value> {
    fn from(store: DataStore) -> Self {
        store.items
    }
}

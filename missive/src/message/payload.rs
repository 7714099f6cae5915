/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::message::finite_floats::ensure_finite;

/// Key under which non-object serde values are stored.
const VALUE_KEY: &str = "value";

/// The opaque key-value body of an [`Envelope`](crate::Envelope).
///
/// Backed by a JSON object so any serde type can be carried. Struct messages
/// map field-for-field onto keys; unit messages produce an empty payload;
/// any other serde shape is stored under a single `"value"` key.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Payload(Map<String, Value>);

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// Inserts a value, returning the one previously stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Builder-style [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(key, value);
        self
    }

    /// Looks up a raw value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Looks up a value that must be a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    /// Number of keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the payload carries no keys.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Captures the serde representation of `value`.
    ///
    /// # Errors
    ///
    /// Fails when serde refuses the value (for example a map with non-string
    /// keys) or when it contains a NaN or infinite float, which JSON cannot
    /// carry.
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        ensure_finite(value)?;
        Ok(match serde_json::to_value(value)? {
            Value::Object(map) => Self(map),
            Value::Null => Self::new(),
            other => Self::new().with(VALUE_KEY, other),
        })
    }

    /// Rebuilds a serde value from the payload, or `None` if the shape does
    /// not fit `T`.
    pub fn to_deserialized<T: DeserializeOwned>(&self) -> Option<T> {
        if let Ok(value) = serde_json::from_value(Value::Object(self.0.clone())) {
            return Some(value);
        }
        if self.0.is_empty() {
            return serde_json::from_value(Value::Null).ok();
        }
        match (self.0.len(), self.0.get(VALUE_KEY)) {
            (1, Some(inner)) => serde_json::from_value(inner.clone()).ok(),
            _ => None,
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl From<Payload> for Map<String, Value> {
    fn from(payload: Payload) -> Self {
        payload.0
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Moved {
        x: i32,
        y: i32,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Tick;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Celsius(f64);

    #[test]
    fn struct_fields_become_keys() {
        let payload = Payload::from_serializable(&Moved { x: 1, y: -2 }).unwrap();
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get("x"), Some(&Value::from(1)));
        assert_eq!(payload.to_deserialized::<Moved>(), Some(Moved { x: 1, y: -2 }));
    }

    #[test]
    fn unit_struct_uses_empty_payload() {
        let payload = Payload::from_serializable(&Tick).unwrap();
        assert!(payload.is_empty());
        assert_eq!(payload.to_deserialized::<Tick>(), Some(Tick));
    }

    #[test]
    fn scalar_shapes_are_wrapped() {
        let payload = Payload::from_serializable(&Celsius(21.5)).unwrap();
        assert_eq!(payload.get("value"), Some(&Value::from(21.5)));
        assert_eq!(payload.to_deserialized::<Celsius>(), Some(Celsius(21.5)));
    }

    #[test]
    fn non_finite_floats_are_refused() {
        assert!(Payload::from_serializable(&Celsius(f64::NAN)).is_err());
        assert!(Payload::from_serializable(&Celsius(f64::INFINITY)).is_err());
        assert!(Payload::from_serializable(&Celsius(f64::NEG_INFINITY)).is_err());
    }

    #[test]
    fn foreign_shape_does_not_deserialize() {
        let payload = Payload::new().with("content", "hello");
        assert_eq!(payload.get_str("content"), Some("hello"));
        assert_eq!(payload.to_deserialized::<Moved>(), None);
    }
}

//!  QPX Flight Search
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! # JSON field access
//!
//! Side-effect free helpers shared by the result parsers: typed access to the
//! camelCase keys of an API object with per-entity error reporting, and the
//! snake_case dictionary projection every model type exposes.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::SchemaError;

/// A JSON object being turned into `entity`.
///
/// Absent keys and explicit `null`s are treated alike. Required getters fail
/// with [`SchemaError::MissingKey`]; optional getters fall back to their default.
/// A key that is present with the wrong type is always an error.
pub(crate) struct JsonObject<'a> {
    entity: &'static str,
    prefix: Option<String>,
    map: &'a Map<String, Value>,
}

impl<'a> JsonObject<'a> {
    pub(crate) fn new(entity: &'static str, value: &'a Value) -> Result<Self, SchemaError> {
        let map = value
            .as_object()
            .ok_or(SchemaError::NotAnObject { entity })?;
        Ok(Self {
            entity,
            prefix: None,
            map,
        })
    }

    fn key_name(&self, key: &str) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}.{}", prefix, key),
            None => key.to_string(),
        }
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.map.get(key).filter(|v| !v.is_null())
    }

    fn missing(&self, key: &str) -> SchemaError {
        SchemaError::MissingKey {
            entity: self.entity,
            key: self.key_name(key),
        }
    }

    fn invalid(&self, key: &str, expected: &'static str) -> SchemaError {
        SchemaError::InvalidType {
            entity: self.entity,
            key: self.key_name(key),
            expected,
        }
    }

    fn required(&self, key: &str) -> Result<&'a Value, SchemaError> {
        self.get(key).ok_or_else(|| self.missing(key))
    }

    /// Inner object whose keys are reported as `outer.inner` under the same entity.
    pub(crate) fn nested(&self, key: &str) -> Result<JsonObject<'a>, SchemaError> {
        let map = self
            .required(key)?
            .as_object()
            .ok_or_else(|| self.invalid(key, "an object"))?;
        Ok(JsonObject {
            entity: self.entity,
            prefix: Some(self.key_name(key)),
            map,
        })
    }

    pub(crate) fn required_str(&self, key: &str) -> Result<String, SchemaError> {
        self.required(key)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(key, "a string"))
    }

    pub(crate) fn required_u32(&self, key: &str) -> Result<u32, SchemaError> {
        let value = self.required(key)?;
        to_u32(value).ok_or_else(|| self.invalid(key, "a non-negative integer"))
    }

    pub(crate) fn required_array(&self, key: &str) -> Result<&'a [Value], SchemaError> {
        self.required(key)?
            .as_array()
            .map(Vec::as_slice)
            .ok_or_else(|| self.invalid(key, "an array"))
    }

    pub(crate) fn optional_str(&self, key: &str) -> Result<Option<String>, SchemaError> {
        self.get(key)
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(key, "a string"))
            })
            .transpose()
    }

    pub(crate) fn str_or_empty(&self, key: &str) -> Result<String, SchemaError> {
        Ok(self.optional_str(key)?.unwrap_or_default())
    }

    pub(crate) fn optional_u32(&self, key: &str) -> Result<Option<u32>, SchemaError> {
        self.get(key)
            .map(|v| to_u32(v).ok_or_else(|| self.invalid(key, "a non-negative integer")))
            .transpose()
    }

    pub(crate) fn u32_or_zero(&self, key: &str) -> Result<u32, SchemaError> {
        Ok(self.optional_u32(key)?.unwrap_or(0))
    }

    pub(crate) fn optional_bool(&self, key: &str) -> Result<Option<bool>, SchemaError> {
        self.get(key)
            .map(|v| v.as_bool().ok_or_else(|| self.invalid(key, "a boolean")))
            .transpose()
    }

    pub(crate) fn optional_array(&self, key: &str) -> Result<&'a [Value], SchemaError> {
        match self.get(key) {
            Some(v) => v
                .as_array()
                .map(Vec::as_slice)
                .ok_or_else(|| self.invalid(key, "an array")),
            None => Ok(&[]),
        }
    }

    pub(crate) fn str_list_or_empty(&self, key: &str) -> Result<Vec<String>, SchemaError> {
        self.optional_array(key)?
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(key, "an array of strings"))
            })
            .collect()
    }
}

fn to_u32(value: &Value) -> Option<u32> {
    value.as_u64().and_then(|n| u32::try_from(n).ok())
}

/// Map every element of a source array through an entity constructor.
pub(crate) fn parse_each<T>(
    values: &[Value],
    parse: impl Fn(&Value) -> Result<T, SchemaError>,
) -> Result<Vec<T>, SchemaError> {
    values.iter().map(parse).collect()
}

/// Lossless dictionary projection keyed by the Rust field names.
///
/// `from_dict(as_dict(x))` rebuilds an equivalent value. This is not the API's
/// own camelCase schema; use each type's `from_api_json` for that.
pub trait DictProjection: Serialize + DeserializeOwned {
    /// Entity name used in error messages.
    const ENTITY: &'static str;

    /// Model types hold only strings, numbers, options and lists, which always
    /// serialize; a failure would be logged and projected as `null`.
    fn as_dict(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|err| {
            tracing::error!("{} has no dictionary form: {}", Self::ENTITY, err);
            Value::Null
        })
    }

    fn from_dict(dict: Value) -> Result<Self, SchemaError> {
        serde_json::from_value(dict).map_err(|source| SchemaError::Projection {
            entity: Self::ENTITY,
            source,
        })
    }
}

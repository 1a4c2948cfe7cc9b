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

//! # Reference data
//!
//! Flat lookup lists from `trips.data`: airports, aircraft, carriers, cities
//! and taxes. Trips and pricing refer to them by code.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::json_fields::{DictProjection, JsonObject};

/// Which `trips.data` list an entry comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReferenceKind {
    Aircraft,
    Carrier,
    City,
    Tax,
}

impl ReferenceKind {
    /// Key holding the entry's code in the API payload. Taxes use `id`.
    pub fn code_key(self) -> &'static str {
        match self {
            Self::Tax => "id",
            Self::Aircraft | Self::Carrier | Self::City => "code",
        }
    }

    pub fn entity(self) -> &'static str {
        match self {
            Self::Aircraft => "Aircraft",
            Self::Carrier => "Carrier",
            Self::City => "City",
            Self::Tax => "Tax",
        }
    }
}

/// A code/name pair. Equality and hashing use the code only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReferenceEntry {
    pub code: String,
    pub name: String,
}

pub type Aircraft = ReferenceEntry;
pub type Carrier = ReferenceEntry;
pub type City = ReferenceEntry;
pub type Tax = ReferenceEntry;

impl ReferenceEntry {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }

    pub fn from_api_json(kind: ReferenceKind, value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new(kind.entity(), value)?;
        Ok(Self {
            code: obj.required_str(kind.code_key())?,
            name: obj.required_str("name")?,
        })
    }
}

impl PartialEq for ReferenceEntry {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for ReferenceEntry {}

impl Hash for ReferenceEntry {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
    }
}

impl fmt::Display for ReferenceEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl DictProjection for ReferenceEntry {
    const ENTITY: &'static str = "ReferenceEntry";
}

/// An airport and the code of the city it serves.
///
/// `city` is a foreign key into [`crate::SearchResult::cities`]; use
/// [`crate::SearchResult::city_of`] to resolve it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Airport {
    pub code: String,
    pub name: String,
    pub city: String,
}

impl Airport {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("Airport", value)?;
        Ok(Self {
            code: obj.required_str("code")?,
            name: obj.required_str("name")?,
            city: obj.required_str("city")?,
        })
    }
}

impl PartialEq for Airport {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code
    }
}

impl Eq for Airport {}

impl fmt::Display for Airport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

impl DictProjection for Airport {
    const ENTITY: &'static str = "Airport";
}

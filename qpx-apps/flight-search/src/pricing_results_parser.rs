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

//! # Pricing Results Parser
//!
//! Side-effect free decoding of `tripOption[].pricing[]`: per-passenger-type
//! pricing, the fares it is built from, segment-level baggage allowances and
//! the tax breakdown.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::json_fields::{DictProjection, JsonObject, parse_each};

/// Pricing of a trip for one passenger type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default)]
    pub fares: Vec<Fare>,
    #[serde(default)]
    pub segment_pricing: Vec<SegmentPricing>,
    #[serde(default)]
    pub taxes: Vec<TaxPricing>,
    pub base_fare_total: Option<String>,
    pub sale_fare_total: String,
    pub sale_tax_total: String,
    pub sale_total: String,
    #[serde(default)]
    pub adults: u32,
    #[serde(default)]
    pub children: u32,
    #[serde(default)]
    pub infants_in_lap: u32,
    #[serde(default)]
    pub infants_in_seat: u32,
    #[serde(default)]
    pub seniors: u32,
    pub fare_calculation: String,
    pub latest_ticketing_time: String,
    /// Passenger type code, e.g. `ADT`.
    pub for_passenger_type: String,
    pub refundable: Option<bool>,
}

impl Pricing {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("Pricing", value)?;
        let passengers = obj.nested("passengers")?;
        Ok(Self {
            fares: parse_each(obj.required_array("fare")?, Fare::from_api_json)?,
            segment_pricing: parse_each(
                obj.required_array("segmentPricing")?,
                SegmentPricing::from_api_json,
            )?,
            taxes: parse_each(obj.optional_array("tax")?, TaxPricing::from_api_json)?,
            base_fare_total: obj.optional_str("baseFareTotal")?,
            sale_fare_total: obj.required_str("saleFareTotal")?,
            sale_tax_total: obj.required_str("saleTaxTotal")?,
            sale_total: obj.required_str("saleTotal")?,
            adults: passengers.u32_or_zero("adultCount")?,
            children: passengers.u32_or_zero("childCount")?,
            infants_in_lap: passengers.u32_or_zero("infantInLapCount")?,
            infants_in_seat: passengers.u32_or_zero("infantInSeatCount")?,
            seniors: passengers.u32_or_zero("seniorCount")?,
            fare_calculation: obj.required_str("fareCalculation")?,
            latest_ticketing_time: obj.required_str("latestTicketingTime")?,
            for_passenger_type: obj.required_str("ptc")?,
            refundable: obj.optional_bool("refundable")?,
        })
    }

    pub fn passenger_count(&self) -> u64 {
        [
            self.adults,
            self.children,
            self.infants_in_lap,
            self.infants_in_seat,
            self.seniors,
        ]
        .iter()
        .map(|&count| u64::from(count))
        .sum()
    }
}

impl DictProjection for Pricing {
    const ENTITY: &'static str = "Pricing";
}

/// Fare used to price one or more segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fare {
    pub id: String,
    pub carrier_code: String,
    pub origin_city_code: String,
    pub destination_city_code: String,
    pub basis_code: String,
    pub private: Option<bool>,
}

impl Fare {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("Fare", value)?;
        Ok(Self {
            id: obj.required_str("id")?,
            carrier_code: obj.required_str("carrier")?,
            origin_city_code: obj.required_str("origin")?,
            destination_city_code: obj.required_str("destination")?,
            basis_code: obj.required_str("basisCode")?,
            private: obj.optional_bool("private")?,
        })
    }
}

impl PartialEq for Fare {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Fare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl DictProjection for Fare {
    const ENTITY: &'static str = "Fare";
}

/// Links a segment to the fare pricing it, with its free baggage allowance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentPricing {
    pub segment_id: String,
    pub fare_id: String,
    #[serde(default)]
    pub free_baggage: Vec<FreeBaggageOption>,
}

impl SegmentPricing {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("SegmentPricing", value)?;
        Ok(Self {
            segment_id: obj.required_str("segmentId")?,
            fare_id: obj.required_str("fareId")?,
            free_baggage: parse_each(
                obj.optional_array("freeBaggageOption")?,
                FreeBaggageOption::from_api_json,
            )?,
        })
    }
}

impl PartialEq for SegmentPricing {
    fn eq(&self, other: &Self) -> bool {
        self.segment_id == other.segment_id && self.fare_id == other.fare_id
    }
}

impl fmt::Display for SegmentPricing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment_id)
    }
}

impl DictProjection for SegmentPricing {
    const ENTITY: &'static str = "SegmentPricing";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FreeBaggageOption {
    pub pieces: u32,
    #[serde(default)]
    pub bag_descriptors: Vec<BagDescriptor>,
}

impl FreeBaggageOption {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("FreeBaggageOption", value)?;
        Ok(Self {
            pieces: obj.required_u32("pieces")?,
            bag_descriptors: parse_each(
                obj.optional_array("bagDescriptor")?,
                BagDescriptor::from_api_json,
            )?,
        })
    }
}

impl DictProjection for FreeBaggageOption {
    const ENTITY: &'static str = "FreeBaggageOption";
}

/// One type of bag covered by a baggage allowance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BagDescriptor {
    #[serde(default)]
    pub commercial_name: String,
    pub count: u32,
    #[serde(default)]
    pub description: Vec<String>,
    pub subcode: String,
    pub max_kilos: Option<u32>,
    pub kilos_per_piece: Option<u32>,
    pub pounds: Option<u32>,
}

impl BagDescriptor {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("BagDescriptor", value)?;
        Ok(Self {
            commercial_name: obj.str_or_empty("commercialName")?,
            count: obj.required_u32("count")?,
            description: obj.str_list_or_empty("description")?,
            subcode: obj.required_str("subcode")?,
            max_kilos: obj.optional_u32("kilos")?,
            kilos_per_piece: obj.optional_u32("kilosPerPiece")?,
            pounds: obj.optional_u32("pounds")?,
        })
    }
}

impl fmt::Display for BagDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.commercial_name)
    }
}

impl DictProjection for BagDescriptor {
    const ENTITY: &'static str = "BagDescriptor";
}

/// One tax line contributing to the total tax per ticket.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxPricing {
    pub id: Option<String>,
    /// Government charge or carrier surcharge.
    pub charge_type: String,
    pub code: String,
    pub country: Option<String>,
    pub sale_price: String,
}

impl TaxPricing {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("TaxPricing", value)?;
        Ok(Self {
            id: obj.optional_str("id")?,
            charge_type: obj.required_str("chargeType")?,
            code: obj.required_str("code")?,
            country: obj.optional_str("country")?,
            sale_price: obj.required_str("salePrice")?,
        })
    }
}

impl PartialEq for TaxPricing {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for TaxPricing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id.as_deref().unwrap_or(&self.code))
    }
}

impl DictProjection for TaxPricing {
    const ENTITY: &'static str = "TaxPricing";
}

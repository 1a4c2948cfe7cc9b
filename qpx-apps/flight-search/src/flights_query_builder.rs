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

//! # Flights Query Builder
//!
//! Side-effect free construction of the `trips/search` request body.
//! Setters that take free-form input validate it immediately.

use chrono::{NaiveDate, NaiveTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::error::ValidationError;

/// ISO-4217 currency code followed by an amount, e.g. `USD400` or `EUR99.50`.
static MAX_PRICE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{3}[0-9]+(\.[0-9]+)?$").unwrap());

pub const MIN_SOLUTIONS: u32 = 1;
pub const MAX_SOLUTIONS: u32 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cabin {
    Coach,
    PremiumCoach,
    Business,
    First,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Passengers {
    pub adult_count: u32,
    pub child_count: u32,
    pub infant_in_lap_count: u32,
    pub infant_in_seat_count: u32,
    pub senior_count: u32,
}

impl Passengers {
    /// Headcount over every category, widened so `u32::MAX` counts cannot wrap.
    pub fn total(&self) -> u64 {
        [
            self.adult_count,
            self.child_count,
            self.infant_in_lap_count,
            self.infant_in_seat_count,
            self.senior_count,
        ]
        .iter()
        .map(|&count| u64::from(count))
        .sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeWindow {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub earliest_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latest_time: Option<String>,
}

/// One directional leg of the requested itinerary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Slice {
    pub origin: String,
    pub destination: String,
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_stops: Option<u32>,
    /// Minutes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_connection_duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preferred_cabin: Option<Cabin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub permitted_departure_time: Option<TimeWindow>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub permitted_carrier: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub prohibited_carrier: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alliance: Option<String>,
}

impl Slice {
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            date,
            max_stops: None,
            max_connection_duration: None,
            preferred_cabin: None,
            permitted_departure_time: None,
            permitted_carrier: Vec::new(),
            prohibited_carrier: Vec::new(),
            alliance: None,
        }
    }

    pub fn max_stops(mut self, max_stops: u32) -> Self {
        self.max_stops = Some(max_stops);
        self
    }

    pub fn max_connection_duration(mut self, minutes: u32) -> Self {
        self.max_connection_duration = Some(minutes);
        self
    }

    pub fn preferred_cabin(mut self, cabin: Cabin) -> Self {
        self.preferred_cabin = Some(cabin);
        self
    }

    pub fn departure_window(mut self, earliest: Option<NaiveTime>, latest: Option<NaiveTime>) -> Self {
        self.permitted_departure_time = Some(TimeWindow {
            earliest_time: earliest.map(|t| t.format("%H:%M").to_string()),
            latest_time: latest.map(|t| t.format("%H:%M").to_string()),
        });
        self
    }

    pub fn permitted_carriers(mut self, carriers: Vec<String>) -> Self {
        self.permitted_carrier = carriers;
        self
    }

    pub fn prohibited_carriers(mut self, carriers: Vec<String>) -> Self {
        self.prohibited_carrier = carriers;
        self
    }

    pub fn alliance(mut self, alliance: impl Into<String>) -> Self {
        self.alliance = Some(alliance.into());
        self
    }

    /// Same constraints, flown the other way on `date`.
    pub fn reversed(&self, date: NaiveDate) -> Self {
        Self {
            origin: self.destination.clone(),
            destination: self.origin.clone(),
            date,
            ..self.clone()
        }
    }
}

/// A validated search request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    passengers: Passengers,
    slice: Vec<Slice>,
    solutions: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_price: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    sale_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    ticketing_country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refundable: Option<bool>,
}

impl SearchRequest {
    pub fn builder() -> SearchRequestBuilder {
        SearchRequestBuilder {
            passengers: Passengers {
                adult_count: 1,
                ..Default::default()
            },
            slices: Vec::new(),
            solutions: MIN_SOLUTIONS,
            max_price: None,
            sale_country: None,
            ticketing_country: None,
            refundable: None,
        }
    }

    /// The JSON body sent to the API: `{"request": {...}}`.
    pub fn to_json(&self) -> Value {
        json!({ "request": self })
    }

    pub fn adult_count(&self) -> u32 {
        self.passengers.adult_count
    }

    pub fn children_count(&self) -> u32 {
        self.passengers.child_count
    }

    pub fn infant_in_lap_count(&self) -> u32 {
        self.passengers.infant_in_lap_count
    }

    pub fn infant_in_seat_count(&self) -> u32 {
        self.passengers.infant_in_seat_count
    }

    pub fn senior_count(&self) -> u32 {
        self.passengers.senior_count
    }

    pub fn passengers(&self) -> &Passengers {
        &self.passengers
    }

    pub fn slices(&self) -> &[Slice] {
        &self.slice
    }

    pub fn solution_count(&self) -> u32 {
        self.solutions
    }

    pub fn max_price(&self) -> Option<&str> {
        self.max_price.as_deref()
    }

    pub fn sale_country(&self) -> Option<&str> {
        self.sale_country.as_deref()
    }

    pub fn ticketing_country(&self) -> Option<&str> {
        self.ticketing_country.as_deref()
    }

    pub fn refundable(&self) -> Option<bool> {
        self.refundable
    }
}

#[derive(Debug, Clone)]
pub struct SearchRequestBuilder {
    passengers: Passengers,
    slices: Vec<Slice>,
    solutions: u32,
    max_price: Option<String>,
    sale_country: Option<String>,
    ticketing_country: Option<String>,
    refundable: Option<bool>,
}

impl SearchRequestBuilder {
    pub fn adults(mut self, count: u32) -> Self {
        self.passengers.adult_count = count;
        self
    }

    pub fn children(mut self, count: u32) -> Self {
        self.passengers.child_count = count;
        self
    }

    pub fn infants_in_lap(mut self, count: u32) -> Self {
        self.passengers.infant_in_lap_count = count;
        self
    }

    pub fn infants_in_seat(mut self, count: u32) -> Self {
        self.passengers.infant_in_seat_count = count;
        self
    }

    pub fn seniors(mut self, count: u32) -> Self {
        self.passengers.senior_count = count;
        self
    }

    pub fn slice(mut self, slice: Slice) -> Self {
        self.slices.push(slice);
        self
    }

    pub fn max_price(mut self, max_price: &str) -> Result<Self, ValidationError> {
        if !MAX_PRICE_RE.is_match(max_price) {
            return Err(ValidationError::InvalidMaxPrice(max_price.to_string()));
        }
        self.max_price = Some(max_price.to_string());
        Ok(self)
    }

    pub fn solution_count(mut self, count: u32) -> Result<Self, ValidationError> {
        if !(MIN_SOLUTIONS..=MAX_SOLUTIONS).contains(&count) {
            return Err(ValidationError::SolutionCountOutOfRange(count));
        }
        self.solutions = count;
        Ok(self)
    }

    pub fn sale_country(mut self, country: impl Into<String>) -> Self {
        self.sale_country = Some(country.into());
        self
    }

    pub fn ticketing_country(mut self, country: impl Into<String>) -> Self {
        self.ticketing_country = Some(country.into());
        self
    }

    pub fn refundable(mut self, refundable: bool) -> Self {
        self.refundable = Some(refundable);
        self
    }

    pub fn build(self) -> Result<SearchRequest, ValidationError> {
        if self.slices.is_empty() {
            return Err(ValidationError::NoSlices);
        }
        if self.passengers.total() == 0 {
            return Err(ValidationError::NoPassengers);
        }
        let carers =
            u64::from(self.passengers.adult_count) + u64::from(self.passengers.senior_count);
        if u64::from(self.passengers.infant_in_lap_count) > carers {
            return Err(ValidationError::TooManyLapInfants {
                infants: self.passengers.infant_in_lap_count,
                carers,
            });
        }

        Ok(SearchRequest {
            passengers: self.passengers,
            slice: self.slices,
            solutions: self.solutions,
            max_price: self.max_price,
            sale_country: self.sale_country,
            ticketing_country: self.ticketing_country,
            refundable: self.refundable,
        })
    }
}

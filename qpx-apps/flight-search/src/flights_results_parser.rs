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

//! # Flights Results Parser
//!
//! Side-effect free decoding of a `trips/search` response into
//! [`SearchResult`] → [`Trip`] → [`Route`] → [`Segment`] → [`Flight`].
//!
//! The whole graph is built in one pass and is read-only afterwards.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::SchemaError;
use crate::json_fields::{DictProjection, JsonObject, parse_each};
use crate::pricing_results_parser::Pricing;
use crate::reference_data::{Aircraft, Airport, Carrier, City, ReferenceEntry, ReferenceKind, Tax};

/// QPX timestamps carry minutes and an offset but no seconds.
const QPX_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M%:z";

/// Decoded response of one search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub request_id: String,
    pub airports: Vec<Airport>,
    pub aircraft: Vec<Aircraft>,
    pub carriers: Vec<Carrier>,
    pub cities: Vec<City>,
    pub taxes: Vec<Tax>,
    /// Itinerary solutions; as many as `solutions` in the request at most.
    pub trips: Vec<Trip>,
}

impl SearchResult {
    /// Decode `{"trips": {"requestId", "data": {...}, "tripOption": [...]}}`.
    pub fn from_api_json(document: &Value) -> Result<Self, SchemaError> {
        let root = JsonObject::new("SearchResult", document)?;
        let trips = root.nested("trips")?;
        let data = trips.nested("data")?;

        let reference = |key: &str, kind: ReferenceKind| -> Result<Vec<ReferenceEntry>, SchemaError> {
            parse_each(data.required_array(key)?, |v| {
                ReferenceEntry::from_api_json(kind, v)
            })
        };

        Ok(Self {
            request_id: trips.required_str("requestId")?,
            airports: parse_each(data.required_array("airport")?, Airport::from_api_json)?,
            aircraft: reference("aircraft", ReferenceKind::Aircraft)?,
            carriers: reference("carrier", ReferenceKind::Carrier)?,
            cities: reference("city", ReferenceKind::City)?,
            taxes: reference("tax", ReferenceKind::Tax)?,
            trips: parse_each(trips.required_array("tripOption")?, Trip::from_api_json)?,
        })
    }

    pub fn len(&self) -> usize {
        self.trips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trips.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trip> {
        self.trips.iter()
    }

    /// Resolve an airport's city code against [`SearchResult::cities`].
    pub fn city_of(&self, airport: &Airport) -> Option<&City> {
        self.cities.iter().find(|city| city.code == airport.city)
    }

    pub fn carrier(&self, code: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|carrier| carrier.code == code)
    }

    pub fn airport(&self, code: &str) -> Option<&Airport> {
        self.airports.iter().find(|airport| airport.code == code)
    }
}

impl PartialEq for SearchResult {
    fn eq(&self, other: &Self) -> bool {
        self.request_id == other.request_id
    }
}

impl fmt::Display for SearchResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.request_id)
    }
}

impl<'a> IntoIterator for &'a SearchResult {
    type Item = &'a Trip;
    type IntoIter = std::slice::Iter<'a, Trip>;

    fn into_iter(self) -> Self::IntoIter {
        self.trips.iter()
    }
}

impl DictProjection for SearchResult {
    const ENTITY: &'static str = "SearchResult";
}

/// One priced itinerary solution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    /// Total price for all passengers, e.g. `USD69.00`.
    pub total_price: String,
    pub routes: Vec<Route>,
    pub pricing: Vec<Pricing>,
}

impl Trip {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("Trip", value)?;
        Ok(Self {
            id: obj.required_str("id")?,
            total_price: obj.required_str("saleTotal")?,
            routes: parse_each(obj.required_array("slice")?, Route::from_api_json)?,
            pricing: parse_each(obj.required_array("pricing")?, Pricing::from_api_json)?,
        })
    }

    pub fn duration_minutes(&self) -> u32 {
        self.routes.iter().map(|route| route.duration).sum()
    }
}

impl PartialEq for Trip {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Trip {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl DictProjection for Trip {
    const ENTITY: &'static str = "Trip";
}

/// The flights flown for one requested slice.
///
/// Routes are compared and ordered by `duration` alone: two routes of equal
/// duration are equal whatever their segments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    /// Minutes.
    pub duration: u32,
    pub segments: Vec<Segment>,
}

impl Route {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("Route", value)?;
        Ok(Self {
            duration: obj.required_u32("duration")?,
            segments: parse_each(obj.required_array("segment")?, Segment::from_api_json)?,
        })
    }

    pub fn stops(&self) -> usize {
        self.segments
            .iter()
            .map(|segment| segment.flights.len())
            .sum::<usize>()
            .saturating_sub(1)
    }
}

impl PartialEq for Route {
    fn eq(&self, other: &Self) -> bool {
        self.duration == other.duration
    }
}

impl Eq for Route {}

impl PartialOrd for Route {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Route {
    fn cmp(&self, other: &Self) -> Ordering {
        self.duration.cmp(&other.duration)
    }
}

impl DictProjection for Route {
    const ENTITY: &'static str = "Route";
}

/// One or more consecutive legs sold under a single flight number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub id: String,
    /// Minutes.
    pub duration: u32,
    pub cabin: String,
    pub booking_code: String,
    pub booking_code_count: u32,
    pub flight_carrier: String,
    pub flight_number: String,
    pub married_segment_group: String,
    pub flights: Vec<Flight>,
}

impl Segment {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("Segment", value)?;
        let flight = obj.nested("flight")?;
        Ok(Self {
            id: obj.required_str("id")?,
            duration: obj.required_u32("duration")?,
            cabin: obj.required_str("cabin")?,
            booking_code: obj.required_str("bookingCode")?,
            booking_code_count: obj.required_u32("bookingCodeCount")?,
            flight_carrier: flight.required_str("carrier")?,
            flight_number: flight.required_str("number")?,
            married_segment_group: obj.required_str("marriedSegmentGroup")?,
            flights: parse_each(obj.required_array("leg")?, Flight::from_api_json)?,
        })
    }

    /// First flight matching `predicate`.
    ///
    /// ```ignore
    /// let lunch = segment.find_flight(|f| f.meal == "Lunch");
    /// ```
    pub fn find_flight<P>(&self, mut predicate: P) -> Option<&Flight>
    where
        P: FnMut(&Flight) -> bool,
    {
        self.flights.iter().find(|flight| predicate(flight))
    }

    /// Lazily yields every flight matching `predicate`.
    pub fn flights_matching<'a, P>(&'a self, mut predicate: P) -> impl Iterator<Item = &'a Flight> + 'a
    where
        P: FnMut(&Flight) -> bool + 'a,
    {
        self.flights.iter().filter(move |flight| predicate(flight))
    }
}

impl PartialEq for Segment {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl DictProjection for Segment {
    const ENTITY: &'static str = "Segment";
}

/// A single takeoff-to-landing leg.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flight {
    pub id: String,
    /// Aircraft code, see [`SearchResult::aircraft`].
    pub aircraft: String,
    pub departure_time: String,
    pub arrival_time: String,
    /// Minutes.
    pub duration: u32,
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub origin_terminal: String,
    #[serde(default)]
    pub destination_terminal: String,
    pub mileage: u32,
    #[serde(default)]
    pub meal: String,
    pub change_plane: Option<bool>,
    /// On-time performance percentage.
    pub performance: Option<u32>,
}

impl Flight {
    pub fn from_api_json(value: &Value) -> Result<Self, SchemaError> {
        let obj = JsonObject::new("Flight", value)?;
        Ok(Self {
            id: obj.required_str("id")?,
            aircraft: obj.required_str("aircraft")?,
            departure_time: obj.required_str("departureTime")?,
            arrival_time: obj.required_str("arrivalTime")?,
            duration: obj.required_u32("duration")?,
            origin: obj.required_str("origin")?,
            destination: obj.required_str("destination")?,
            origin_terminal: obj.str_or_empty("originTerminal")?,
            destination_terminal: obj.str_or_empty("destinationTerminal")?,
            mileage: obj.required_u32("mileage")?,
            meal: obj.str_or_empty("meal")?,
            change_plane: obj.optional_bool("changePlane")?,
            performance: obj.optional_u32("onTimePerformance")?,
        })
    }

    pub fn departs_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_str(&self.departure_time, QPX_TIME_FORMAT)
    }

    pub fn arrives_at(&self) -> Result<DateTime<FixedOffset>, chrono::ParseError> {
        DateTime::parse_from_str(&self.arrival_time, QPX_TIME_FORMAT)
    }
}

impl PartialEq for Flight {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl fmt::Display for Flight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

impl DictProjection for Flight {
    const ENTITY: &'static str = "Flight";
}

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

//! Integration tests for the response decoder using recorded QPX Express
//! `trips/search` documents.

use std::path::Path;

use qpx_flight_search::{SchemaError, SearchResult};
use serde_json::{Value, json};

/// Load a fixture from tests/fixtures-qpx-responses/.
///
/// Panics if the file is missing or not JSON.
fn load_fixture(name: &str) -> Value {
    let fixture_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures-qpx-responses")
        .join(format!("{}.json", name));
    let text = std::fs::read_to_string(&fixture_path)
        .unwrap_or_else(|e| panic!("read fixture {}: {}", fixture_path.display(), e));
    serde_json::from_str(&text).expect("fixture is valid JSON")
}

#[test]
fn test_one_way_sfo_lax() {
    let result = SearchResult::from_api_json(&load_fixture("sfo_lax")).unwrap();

    assert_eq!(result.request_id, "eBJXPDdjvK4zDogeE0JJp3");
    assert_eq!(result.to_string(), "eBJXPDdjvK4zDogeE0JJp3");
    assert_eq!(result.len(), 1);

    // Source order is kept.
    let airport_codes: Vec<&str> = result.airports.iter().map(|a| a.code.as_str()).collect();
    assert_eq!(airport_codes, ["LAX", "SFO"]);
    assert_eq!(result.aircraft[0].code, "320");
    assert_eq!(result.aircraft[0].name, "Airbus A320");
    assert_eq!(result.carriers[0].to_string(), "Virgin America Inc.");
    let tax_codes: Vec<&str> = result.taxes.iter().map(|t| t.code.as_str()).collect();
    assert_eq!(tax_codes, ["ZP", "XF", "US_001", "AY_001"]);

    let trip = &result.trips[0];
    assert_eq!(trip.id, "faqkIcj6Te2V3Sll2SskwJ001");
    assert_eq!(trip.total_price, "USD69.00");
    assert_eq!(trip.duration_minutes(), 75);

    let route = &trip.routes[0];
    assert_eq!(route.duration, 75);
    assert_eq!(route.stops(), 0);

    let segment = &route.segments[0];
    assert_eq!(segment.id, "G4Yqn7Md2QltVrzT");
    assert_eq!(segment.flight_carrier, "VX");
    assert_eq!(segment.flight_number, "936");
    assert_eq!(segment.booking_code, "Q");
    assert_eq!(segment.booking_code_count, 7);
    assert_eq!(segment.cabin, "COACH");

    let flight = &segment.flights[0];
    assert_eq!(flight.id, "LFaJowO2NvJzM2Vd");
    assert_eq!(flight.aircraft, "320");
    assert_eq!(flight.origin, "SFO");
    assert_eq!(flight.destination, "LAX");
    assert_eq!(flight.origin_terminal, "2");
    assert_eq!(flight.destination_terminal, "3");
    assert_eq!(flight.mileage, 338);
    assert_eq!(flight.performance, Some(80));
    assert_eq!(flight.change_plane, None);
    assert_eq!(flight.meal, "Food and Beverages for Purchase");
    let elapsed = flight.arrives_at().unwrap() - flight.departs_at().unwrap();
    assert_eq!(elapsed.num_minutes(), i64::from(flight.duration));

    let pricing = &trip.pricing[0];
    assert_eq!(pricing.for_passenger_type, "ADT");
    assert_eq!(pricing.adults, 1);
    assert_eq!(pricing.passenger_count(), 1);
    assert_eq!(pricing.base_fare_total.as_deref(), Some("USD52.09"));
    assert_eq!(pricing.sale_total, "USD69.00");
    assert_eq!(pricing.refundable, Some(false));
    assert_eq!(pricing.fares[0].id, "A+yi0+pn2eL1pf3nKwZazHIVDvsw2Ru8zx5LByC/kQaA");
    assert_eq!(pricing.fares[0].basis_code, "QH7NR");
    assert_eq!(pricing.fares[0].private, None);
    assert_eq!(pricing.taxes.len(), 4);
    assert_eq!(pricing.taxes[0].id.as_deref(), Some("US_001"));
    assert_eq!(pricing.taxes[0].sale_price, "USD3.91");

    let segment_pricing = &pricing.segment_pricing[0];
    assert_eq!(segment_pricing.segment_id, segment.id);
    assert_eq!(segment_pricing.fare_id, pricing.fares[0].id);
    let bag = &segment_pricing.free_baggage[0].bag_descriptors[0];
    assert_eq!(bag.to_string(), "UPTO50LB 23KG AND62LI 158LCM");
    assert_eq!(bag.description.len(), 2);
    assert_eq!(bag.max_kilos, None);
}

#[test]
fn test_round_trip_fra_ace_defaults() {
    let result = SearchResult::from_api_json(&load_fixture("fra_ace_roundtrip")).unwrap();
    assert_eq!(result.len(), 2);

    let cheapest = &result.trips[0];
    assert_eq!(cheapest.routes.len(), 2);
    assert_eq!(cheapest.duration_minutes(), 265 + 250);

    // Optional leg fields absent or null fall back to their defaults.
    let outbound = &cheapest.routes[0].segments[0].flights[0];
    assert_eq!(outbound.origin_terminal, "");
    assert_eq!(outbound.destination_terminal, "");
    assert_eq!(outbound.meal, "");
    assert_eq!(outbound.performance, None);
    assert_eq!(outbound.change_plane, None);
    assert_eq!(cheapest.routes[1].segments[0].flights[0].meal, "");

    let pricing = &cheapest.pricing[0];
    assert_eq!(pricing.base_fare_total, None);
    assert_eq!(pricing.refundable, None);
    assert!(pricing.taxes.is_empty());
    assert_eq!((pricing.adults, pricing.children, pricing.seniors), (2, 1, 0));
    assert_eq!(pricing.fares[0].private, Some(true));
    assert_eq!(pricing.fares[1].private, None);

    let bag = &pricing.segment_pricing[0].free_baggage[0].bag_descriptors[0];
    assert_eq!(bag.commercial_name, "");
    assert!(bag.description.is_empty());
    assert!(pricing.segment_pricing[1].free_baggage.is_empty());

    // Connection via Madrid on the second solution.
    let connecting = &result.trips[1].routes[0];
    assert_eq!(connecting.stops(), 1);
    let segment = &connecting.segments[0];
    assert_eq!(segment.flights.len(), 2);
    assert_eq!(segment.flights[1].change_plane, Some(true));
    assert_eq!(
        segment.find_flight(|f| f.origin == "MAD").map(|f| f.id.as_str()),
        Some("LhWj0kq4Fw1kS6hN")
    );
    assert_eq!(segment.flights_matching(|f| f.aircraft == "321").count(), 2);
    assert!(segment.find_flight(|f| f.origin == "ACE").is_none());

    let tax = &result.trips[1].pricing[0].taxes[0];
    assert_eq!(tax.id, None);
    assert_eq!(tax.country, None);
    assert_eq!(tax.code, "JK");
    assert_eq!(result.trips[1].pricing[0].refundable, Some(true));
}

#[test]
fn test_airport_city_is_a_foreign_key() {
    let result = SearchResult::from_api_json(&load_fixture("fra_ace_roundtrip")).unwrap();
    let ace = result.airport("ACE").unwrap();
    assert_eq!(ace.city, "ACE");
    assert_eq!(result.city_of(ace).unwrap().name, "Arrecife");
    assert_eq!(result.carrier("X3").unwrap().name, "TUIfly");
    assert!(result.carrier("LH").is_none());
}

#[test]
fn test_result_iterates_over_trips() {
    let result = SearchResult::from_api_json(&load_fixture("fra_ace_roundtrip")).unwrap();
    let ids: Vec<String> = (&result).into_iter().map(|t| t.to_string()).collect();
    assert_eq!(ids, ["Hq0bNkrzpUcU1MDe8o0pZd001", "Hq0bNkrzpUcU1MDe8o0pZd002"]);

    let mut prices = Vec::new();
    for trip in &result {
        prices.push(trip.total_price.clone());
    }
    assert_eq!(prices, ["EUR212.40", "EUR318.75"]);
}

/// Remove the value at a JSON pointer, e.g. `/trips/requestId`.
fn without(mut document: Value, pointer: &str) -> Value {
    let (parent, key) = pointer.rsplit_once('/').expect("pointer has a parent");
    document
        .pointer_mut(parent)
        .and_then(Value::as_object_mut)
        .expect("parent is an object")
        .remove(key)
        .expect("key exists in fixture");
    document
}

#[test]
fn test_missing_required_keys_are_named() {
    let cases: &[(&str, &str, &str)] = &[
        ("/trips/requestId", "SearchResult", "trips.requestId"),
        ("/trips/tripOption", "SearchResult", "trips.tripOption"),
        ("/trips/data/airport", "SearchResult", "trips.data.airport"),
        ("/trips/data/aircraft", "SearchResult", "trips.data.aircraft"),
        ("/trips/data/carrier", "SearchResult", "trips.data.carrier"),
        ("/trips/data/city", "SearchResult", "trips.data.city"),
        ("/trips/data/tax", "SearchResult", "trips.data.tax"),
        ("/trips/tripOption/0/saleTotal", "Trip", "saleTotal"),
        ("/trips/tripOption/0/slice/0/duration", "Route", "duration"),
        ("/trips/tripOption/0/slice/0/segment/0/bookingCodeCount", "Segment", "bookingCodeCount"),
        ("/trips/tripOption/0/slice/0/segment/0/flight/number", "Segment", "flight.number"),
        ("/trips/tripOption/0/slice/0/segment/0/leg/0/aircraft", "Flight", "aircraft"),
        ("/trips/tripOption/0/pricing/0/ptc", "Pricing", "ptc"),
        ("/trips/tripOption/0/pricing/0/fare/0/basisCode", "Fare", "basisCode"),
        ("/trips/tripOption/0/pricing/0/tax/0/salePrice", "TaxPricing", "salePrice"),
        ("/trips/data/tax/0/id", "Tax", "id"),
        ("/trips/data/airport/1/city", "Airport", "city"),
    ];

    for (pointer, entity, key) in cases {
        let document = without(load_fixture("sfo_lax"), pointer);
        match SearchResult::from_api_json(&document) {
            Err(SchemaError::MissingKey { entity: e, key: k }) => {
                assert_eq!((e, k.as_str()), (*entity, *key), "removing {}", pointer);
            }
            other => panic!("removing {} should fail with MissingKey, got {:?}", pointer, other),
        }
    }
}

#[test]
fn test_wrong_type_is_an_error() {
    let mut document = load_fixture("sfo_lax");
    document["trips"]["tripOption"][0]["slice"][0]["segment"][0]["bookingCodeCount"] = json!("7");
    let err = SearchResult::from_api_json(&document).unwrap_err();
    assert!(matches!(
        err,
        SchemaError::InvalidType { entity: "Segment", ref key, .. } if key == "bookingCodeCount"
    ));
}

#[test]
fn test_empty_trip_list() {
    let mut document = load_fixture("sfo_lax");
    document["trips"]["tripOption"] = json!([]);
    let result = SearchResult::from_api_json(&document).unwrap();
    assert!(result.is_empty());
    assert_eq!(result.airports.len(), 2);
}

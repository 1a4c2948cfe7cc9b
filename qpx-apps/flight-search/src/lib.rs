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

// Library for qpx-flight-search
// Rate-limited QPX Express client and typed trip results

mod error;
mod flights_query_builder;
mod flights_results_parser;
mod flights_search;
mod json_fields;
mod pricing_results_parser;
mod reference_data;

pub use error::{ApiError, SchemaError, SearchError, TransportError, ValidationError};
pub use json_fields::DictProjection;

// Re-export the request model
pub use flights_query_builder::{
    Cabin, MAX_SOLUTIONS, MIN_SOLUTIONS, Passengers, SearchRequest, SearchRequestBuilder, Slice,
    TimeWindow,
};

// Re-export the response model
pub use flights_results_parser::{Flight, Route, SearchResult, Segment, Trip};
pub use pricing_results_parser::{
    BagDescriptor, Fare, FreeBaggageOption, Pricing, SegmentPricing, TaxPricing,
};
pub use reference_data::{Aircraft, Airport, Carrier, City, ReferenceEntry, ReferenceKind, Tax};

// Re-export the client
pub use flights_search::{
    ClientConfig, HttpReply, HttpTransport, Method, QPX_SEARCH_URL, QpxClient, RequestBody,
    WreqTransport,
};

pub use qpx_request_pacing::{RateLimitError, RateLimiter};

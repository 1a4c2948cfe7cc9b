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

//! # Errors
//!
//! Every failure surfaced by the library is a [`SearchError`]. None of them are
//! retried or recovered locally.

use qpx_request_pacing::RateLimitError;
use serde_json::Value;
use thiserror::Error;

/// Top-level error for building, sending and decoding a search.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Caller input was rejected before anything hit the network.
    #[error("invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// The API answered with a non-success status.
    #[error("API error {0}")]
    Api(#[from] ApiError),

    /// The API answered but the document lacks something the model needs.
    #[error("unexpected response shape: {0}")]
    Schema(#[from] SchemaError),

    /// No valid application-level answer was received.
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
}

/// Error returned by the remote service, built from its error envelope:
///
/// ```json
/// {"error": {"code": 400, "message": "Bad Request", "errors": [{"reason": "keyInvalid"}]}}
/// ```
///
/// Formats as `<code>: <message> (<reason>)`, for example `400: Bad Request (keyInvalid)`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{code}: {message} ({reason})")]
pub struct ApiError {
    pub code: i64,
    pub message: String,
    pub reason: String,
}

impl ApiError {
    pub fn new(code: i64, message: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            reason: reason.into(),
        }
    }

    /// Read `error.code`, `error.message` and `error.errors[0].reason`.
    ///
    /// Any part of the envelope that is missing falls back to what the HTTP
    /// layer knows, so a proxy page or an empty body still yields an `ApiError`.
    pub(crate) fn from_envelope(status: u16, envelope: &Value) -> Self {
        let error = &envelope["error"];
        let code = error["code"].as_i64().unwrap_or(i64::from(status));
        let message = error["message"]
            .as_str()
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP status {}", status));
        let reason = error["errors"][0]["reason"]
            .as_str()
            .unwrap_or("unknown")
            .to_string();
        Self {
            code,
            message,
            reason,
        }
    }
}

/// Rejected request-builder or configuration input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("max_price given ('{0}') does not match ISO-4217 format, e.g. USD400.50")]
    InvalidMaxPrice(String),

    #[error("solution_count must be within 1-500, got {0}")]
    SolutionCountOutOfRange(u32),

    #[error("a search needs at least one slice")]
    NoSlices,

    #[error("a search needs at least one passenger")]
    NoPassengers,

    #[error("cannot have more infants in lap ({infants}) than adults and seniors ({carers})")]
    TooManyLapInfants { infants: u32, carers: u64 },

    #[error(transparent)]
    RateLimit(#[from] RateLimitError),
}

/// The response document does not have the shape the model expects.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("missing required key `{key}` while building {entity}")]
    MissingKey { entity: &'static str, key: String },

    #[error("key `{key}` of {entity} should be {expected}")]
    InvalidType {
        entity: &'static str,
        key: String,
        expected: &'static str,
    },

    #[error("{entity} must be a JSON object")]
    NotAnObject { entity: &'static str },

    #[error("cannot rebuild {entity} from its dictionary form: {source}")]
    Projection {
        entity: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl SchemaError {
    /// Name of the key at fault, when there is one.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingKey { key, .. } | Self::InvalidType { key, .. } => Some(key),
            Self::NotAnObject { .. } | Self::Projection { .. } => None,
        }
    }

    /// Entity that was being constructed.
    pub fn entity(&self) -> &'static str {
        match self {
            Self::MissingKey { entity, .. }
            | Self::InvalidType { entity, .. }
            | Self::NotAnObject { entity }
            | Self::Projection { entity, .. } => entity,
        }
    }
}

/// The exchange failed below the application level.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("failed to build HTTP client: {0}")]
    ClientBuild(#[source] wreq::Error),

    #[error("HTTP request failed: {0}")]
    Request(#[from] wreq::Error),

    #[error("failed to start the blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),

    #[error("blocking call made from inside an async runtime, use the async form instead")]
    BlockingInAsyncContext,

    #[error("response body (status {status}) is not valid JSON: {source}")]
    MalformedJson {
        status: u16,
        #[source]
        source: serde_json::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::new(404, "Unknown Endpoint", "NotFound");
        assert_eq!(err.code, 404);
        assert_eq!(err.message, "Unknown Endpoint");
        assert_eq!(err.reason, "NotFound");
        assert_eq!(err.to_string(), "404: Unknown Endpoint (NotFound)");
    }

    #[test]
    fn test_api_error_from_envelope() {
        let envelope = json!({
            "error": {
                "errors": [{"domain": "usageLimits", "reason": "keyInvalid", "message": "Bad Request"}],
                "code": 400,
                "message": "Bad Request"
            }
        });
        let err = ApiError::from_envelope(400, &envelope);
        assert_eq!(err, ApiError::new(400, "Bad Request", "keyInvalid"));
        assert_eq!(err.to_string(), "400: Bad Request (keyInvalid)");
    }

    #[test]
    fn test_api_error_from_partial_envelope() {
        let err = ApiError::from_envelope(503, &Value::Null);
        assert_eq!(err.code, 503);
        assert_eq!(err.message, "HTTP status 503");
        assert_eq!(err.reason, "unknown");

        let err = ApiError::from_envelope(
            403,
            &json!({"error": {"code": 403, "message": "Daily Limit Exceeded", "errors": []}}),
        );
        assert_eq!(err.to_string(), "403: Daily Limit Exceeded (unknown)");
    }

    #[test]
    fn test_schema_error_accessors() {
        let err = SchemaError::MissingKey {
            entity: "Flight",
            key: "aircraft".to_string(),
        };
        assert_eq!(err.key(), Some("aircraft"));
        assert_eq!(err.entity(), "Flight");
        assert_eq!(
            err.to_string(),
            "missing required key `aircraft` while building Flight"
        );
    }

    #[test]
    fn test_negative_quota_is_a_validation_error() {
        let err: SearchError = ValidationError::from(RateLimitError::NegativeQuota(-5)).into();
        assert!(matches!(
            err,
            SearchError::Validation(ValidationError::RateLimit(RateLimitError::NegativeQuota(-5)))
        ));
    }
}

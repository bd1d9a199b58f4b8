// ---------------------------------------------------------------------------
// FlowError: failures while reading venue plans, forecasts and parameters
// ---------------------------------------------------------------------------

use std::fmt;

/// Errors produced by the fallible parsers of the crowd-flow engine.
///
/// None of these escape the engine boundary: `CrowdFlowEngine` logs them and
/// falls back to the built-in demo dataset instead.
#[derive(Debug)]
pub enum FlowError {
    /// The document was not valid JSON or did not match the expected shape.
    Json(serde_json::Error),
    /// A forecast `ds` value could not be parsed as a timestamp.
    Timestamp(String),
    /// Two zones in one plan share an id.
    DuplicateZone(String),
    /// The plan has no zones to draw congestion on.
    EmptyPlan,
    /// A plan coordinate is not finite, or a zone spans more than `f32` can hold.
    InvalidCoordinates(String),
    /// Neither series of the forecast contains a usable point.
    EmptyForecast,
    /// A parameter override is out of range.
    InvalidParams(String),
}

impl fmt::Display for FlowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowError::Json(e) => write!(f, "JSON error: {e}"),
            FlowError::Timestamp(raw) => write!(f, "Unrecognised timestamp: {raw:?}"),
            FlowError::DuplicateZone(id) => write!(f, "Duplicate zone id: {id}"),
            FlowError::EmptyPlan => write!(f, "Venue plan has no zones"),
            FlowError::InvalidCoordinates(id) => write!(f, "Invalid coordinates in {id}"),
            FlowError::EmptyForecast => write!(f, "Forecast has no usable points"),
            FlowError::InvalidParams(msg) => write!(f, "Invalid parameters: {msg}"),
        }
    }
}

impl std::error::Error for FlowError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FlowError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for FlowError {
    fn from(e: serde_json::Error) -> Self {
        FlowError::Json(e)
    }
}

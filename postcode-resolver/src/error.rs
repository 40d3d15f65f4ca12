//! Resolver error types.
//!
//! Every failure a caller can see is one of these. Store errors are
//! classified on the way up: the store's deadline signature becomes
//! [`ResolveError::QueryTimeout`], reference-system failures become the
//! spatial-input variants, and everything else is [`ResolveError::Internal`].

use postcode_spatial::SpatialError;
use std::time::Duration;
use thiserror::Error;

/// Resolver errors.
#[derive(Debug, Error, PartialEq)]
pub enum ResolveError {
    /// Malformed postcode or partial postcode.
    #[error("{kind} '{input}' is not valid.")]
    InvalidFormat { kind: &'static str, input: String },

    /// No matching postcode, area or aggregate.
    #[error("{message}")]
    NotFound { message: String },

    /// A query exceeded its deadline.
    #[error("That query was taking too long to compute (gave up after {elapsed:?}).")]
    QueryTimeout { elapsed: Duration },

    /// The reference system identifier is unknown.
    #[error("Cannot find SRID ({srid}) in spatial_ref_sys")]
    InvalidReferenceSystem { srid: i32 },

    /// The point cannot be reprojected into the store's reference system.
    #[error("Point outside the area geometry")]
    PointOutsideGeometry { srid: i32 },

    /// Any other store failure.
    #[error("internal error: {0}")]
    Internal(#[source] SpatialError),
}

impl ResolveError {
    pub(crate) fn invalid_postcode(input: impl Into<String>) -> Self {
        ResolveError::InvalidFormat {
            kind: "Postcode",
            input: input.into(),
        }
    }

    pub(crate) fn invalid_partial(input: impl Into<String>) -> Self {
        ResolveError::InvalidFormat {
            kind: "Partial postcode",
            input: input.into(),
        }
    }

    pub(crate) fn not_found(message: impl Into<String>) -> Self {
        ResolveError::NotFound {
            message: message.into(),
        }
    }

    /// Classify a store error.
    ///
    /// `elapsed` is how long the failing query ran, reported if the error
    /// turns out to be a deadline.
    pub fn from_store(err: SpatialError, elapsed: Duration) -> Self {
        if err.is_deadline_exceeded() {
            return ResolveError::QueryTimeout { elapsed };
        }
        match err {
            SpatialError::UnknownSrid(srid) => ResolveError::InvalidReferenceSystem { srid },
            SpatialError::PointOutOfBounds { srid, .. } => {
                ResolveError::PointOutsideGeometry { srid }
            }
            other => ResolveError::Internal(other),
        }
    }

    /// HTTP-equivalent status code.
    pub fn status_code(&self) -> u16 {
        match self {
            ResolveError::InvalidFormat { .. }
            | ResolveError::InvalidReferenceSystem { .. }
            | ResolveError::PointOutsideGeometry { .. } => 400,
            ResolveError::NotFound { .. } => 404,
            ResolveError::QueryTimeout { .. } | ResolveError::Internal(_) => 500,
        }
    }

    /// True for [`ResolveError::QueryTimeout`].
    pub fn is_timeout(&self) -> bool {
        matches!(self, ResolveError::QueryTimeout { .. })
    }
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

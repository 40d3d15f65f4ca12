//! Error types for the spatial store.

use thiserror::Error;

/// Spatial store errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SpatialError {
    /// WKT parsing error.
    #[error("WKT parse error: {0}")]
    WktParse(String),

    /// Invalid geometry (empty, non-finite or unusable for containment).
    #[error("Invalid geometry: {0}")]
    InvalidGeometry(String),

    /// The reference system identifier is not known to the store.
    #[error("Cannot find SRID ({0}) in spatial_ref_sys")]
    UnknownSrid(i32),

    /// A coordinate could not be reprojected into the target reference system.
    #[error("Point ({x}, {y}) is outside the area of use of SRID {srid}")]
    PointOutOfBounds { x: f64, y: f64, srid: i32 },

    /// The backend cancelled the statement (statement timeout or user request).
    #[error("canceling statement due to {0}")]
    QueryCanceled(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SpatialError {
    /// True when the error carries the backend's deadline-exceeded signature.
    ///
    /// Both statement timeouts and user-requested cancellation count: the
    /// resolver cancels in-flight queries when its own deadline fires.
    pub fn is_deadline_exceeded(&self) -> bool {
        match self {
            SpatialError::QueryCanceled(reason) => {
                reason.contains("statement timeout") || reason.contains("user request")
            }
            _ => false,
        }
    }
}

/// Result type for spatial operations.
pub type Result<T> = std::result::Result<T, SpatialError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_signature() {
        assert!(SpatialError::QueryCanceled("statement timeout".into()).is_deadline_exceeded());
        assert!(SpatialError::QueryCanceled("user request".into()).is_deadline_exceeded());
        assert!(!SpatialError::QueryCanceled("conflict with recovery".into()).is_deadline_exceeded());
        assert!(!SpatialError::Internal("statement timeout".into()).is_deadline_exceeded());
    }

    #[test]
    fn test_unknown_srid_message() {
        let err = SpatialError::UnknownSrid(1234);
        assert!(err.to_string().contains("Cannot find SRID"));
    }
}

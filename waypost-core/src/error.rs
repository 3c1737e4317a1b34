//! Error type returned by [`QueryEngine`](crate::QueryEngine) operations.

use std::fmt;

use thiserror::Error;

use crate::feature::FeatureId;
use crate::geometry::GeometryError;
use crate::predicates::UnsupportedGeometryError;
use crate::routing::NoRouteError;

/// Why a referenced feature could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundReason {
    /// No record carries the identifier.
    Missing,
    /// The record exists but its geometry is not a point.
    NoPointGeometry,
}

impl fmt::Display for NotFoundReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Missing => "no such feature",
            Self::NoPointGeometry => "feature has no point geometry",
        })
    }
}

/// Errors raised by engine queries.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// A query geometry was malformed.
    #[error("invalid geometry input: {0}")]
    InvalidGeometryInput(#[from] GeometryError),
    /// A predicate was applied to a variant it does not support.
    #[error(transparent)]
    UnsupportedGeometry(#[from] UnsupportedGeometryError),
    /// A referenced feature is missing or unsuitable.
    #[error("feature {id} not found: {reason}")]
    FeatureNotFound {
        /// Requested identifier.
        id: FeatureId,
        /// Why the feature could not be used.
        reason: NotFoundReason,
    },
    /// A route could not be attempted.
    #[error("no route: {0}")]
    NoRoute(#[from] NoRouteError),
    /// Query parameters were out of range.
    #[error("invalid query: {reason}")]
    InvalidQuery {
        /// Description of the rejected parameter.
        reason: String,
    },
    /// The candidate set of a quadratic scan exceeded its cap.
    #[error("candidate set exceeds the limit of {limit} records")]
    CandidateSetTooLarge {
        /// Configured maximum.
        limit: usize,
    },
    /// The engine configuration was rejected.
    #[error("invalid engine configuration: {reason}")]
    InvalidConfig {
        /// Description of the rejected setting.
        reason: String,
    },
}

impl EngineError {
    pub(crate) fn invalid_query(reason: impl Into<String>) -> Self {
        Self::InvalidQuery {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            reason: reason.into(),
        }
    }
}

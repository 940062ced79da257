use std::path::PathBuf;

use thiserror::Error;

/// Convenient result alias for the PharmaRoute library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
///
/// Strategy failures inside the routing chain are not represented here; they
/// are carried as [`crate::routing::FailureReason`] values and absorbed by the
/// chain. Only input validation and candidate-set problems surface to callers.
#[derive(Debug, Error)]
pub enum Error {
    /// A coordinate lies outside the valid latitude/longitude range or is not finite.
    #[error("invalid coordinate ({lat}, {lon}); latitude must be in [-90, 90] and longitude in [-180, 180]")]
    InvalidCoordinate { lat: f64, lon: f64 },

    /// The candidate list was empty or every candidate had invalid coordinates.
    #[error("no routable candidate: the candidate set is empty or every candidate is invalid")]
    NoCandidateRoutable,

    /// Raised when assembly is attempted on a failed strategy result.
    #[error("cannot assemble a route from an unresolved strategy result")]
    UnresolvedRoute,

    /// Raised when the summed segment lengths disagree with the reported distance.
    #[error("route distance mismatch: expected {expected:.3} m, segments sum to {actual:.3} m")]
    RouteDistanceMismatch { expected: f64, actual: f64 },

    /// Raised when a point of interest name could not be found.
    #[error("unknown point of interest: {name}{}", format_suggestions(.suggestions))]
    UnknownPointOfInterest {
        name: String,
        suggestions: Vec<String>,
    },

    /// Dataset could not be located at the resolved path.
    #[error("dataset not found at {path}")]
    DatasetNotFound { path: PathBuf },

    /// No suitable project directories could be resolved for this platform.
    #[error("failed to resolve project directories for the dataset location")]
    ProjectDirsUnavailable,

    /// Raised when a dataset does not carry the expected tables.
    #[error("unsupported dataset schema; expected intersections/roads/pois tables")]
    UnsupportedSchema,

    /// Raised when a configuration value cannot be parsed.
    #[error("invalid configuration value for {key}: {value}")]
    InvalidConfig { key: String, value: String },

    /// Wrapper for SQLite errors.
    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn format_suggestions(suggestions: &[String]) -> String {
    if suggestions.is_empty() {
        String::new()
    } else if suggestions.len() == 1 {
        format!(". Did you mean '{}'?", suggestions[0])
    } else {
        format!(
            ". Did you mean one of: {}?",
            suggestions
                .iter()
                .map(|s| format!("'{}'", s))
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_poi_lists_single_suggestion() {
        let error = Error::UnknownPointOfInterest {
            name: "Pharmacie Centrle".to_string(),
            suggestions: vec!["Pharmacie Centrale".to_string()],
        };
        assert_eq!(
            error.to_string(),
            "unknown point of interest: Pharmacie Centrle. Did you mean 'Pharmacie Centrale'?"
        );
    }

    #[test]
    fn unknown_poi_without_suggestions_has_no_hint() {
        let error = Error::UnknownPointOfInterest {
            name: "Nowhere".to_string(),
            suggestions: Vec::new(),
        };
        assert_eq!(error.to_string(), "unknown point of interest: Nowhere");
    }
}

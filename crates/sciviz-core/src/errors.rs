//! Error types for the sciviz core library.

#[cfg(feature = "python")]
use pyo3::exceptions::{PyIOError, PyKeyError, PyRuntimeError, PyValueError};
#[cfg(feature = "python")]
use pyo3::PyErr;

/// Top-level error enum for the sciviz core library.
///
/// Unsupported nodes and oversize arrays are not errors: the walker turns
/// them into zero records or a placeholder record respectively.
#[derive(Debug, thiserror::Error)]
pub enum SciVizError {
    #[error("Missing key: {0}")]
    MissingKey(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Artifact error: {0}")]
    Artifact(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SciVizError {
    /// True for errors caused by the shape of the uploaded data rather than
    /// by the environment.
    pub fn is_schema_violation(&self) -> bool {
        matches!(
            self,
            SciVizError::MissingKey(_) | SciVizError::InvalidValue(_) | SciVizError::Json(_)
        )
    }
}

#[cfg(feature = "python")]
impl From<SciVizError> for PyErr {
    fn from(err: SciVizError) -> PyErr {
        match &err {
            SciVizError::MissingKey(_) => PyKeyError::new_err(err.to_string()),
            SciVizError::InvalidValue(_) | SciVizError::Json(_) => {
                PyValueError::new_err(err.to_string())
            }
            SciVizError::Io(_) => PyIOError::new_err(err.to_string()),
            SciVizError::Artifact(_) | SciVizError::Render(_) => {
                PyRuntimeError::new_err(err.to_string())
            }
        }
    }
}

pub type SciVizResult<T> = Result<T, SciVizError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_violation_split() {
        assert!(SciVizError::MissingKey("TD".into()).is_schema_violation());
        assert!(SciVizError::InvalidValue("xMax".into()).is_schema_violation());
        assert!(!SciVizError::Artifact("disk full".into()).is_schema_violation());
        let io = std::io::Error::new(std::io::ErrorKind::Other, "boom");
        assert!(!SciVizError::from(io).is_schema_violation());
    }

    #[test]
    fn test_display_names_the_key() {
        let err = SciVizError::MissingKey("events".into());
        assert_eq!(err.to_string(), "Missing key: events");
    }
}

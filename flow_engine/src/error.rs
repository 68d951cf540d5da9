use thiserror::Error;

/// All errors generated in `flow_engine`.
///
/// Malformed individual fields never surface here: they degrade to a default
/// value during normalization. Only structurally invalid input and I/O at the
/// crate boundary produce an error.
#[derive(Debug, Error)]
pub enum FlowError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid project file: {0}")]
    InvalidProject(String),

    #[error("moving average window must be at least {min}, got {got}")]
    InvalidWindow { got: usize, min: usize },

    #[error("dataset not found: {0}")]
    DatasetNotFound(String),

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        struct TestCase {
            input: FlowError,
            expected: &'static str,
        }

        let tests = vec![
            TestCase {
                // TC0: window below minimum
                input: FlowError::InvalidWindow { got: 1, min: 2 },
                expected: "moving average window must be at least 2, got 1",
            },
            TestCase {
                // TC1: project validation failure
                input: FlowError::InvalidProject("top-level JSON is not an array".to_string()),
                expected: "invalid project file: top-level JSON is not an array",
            },
            TestCase {
                // TC2: unknown dataset id
                input: FlowError::DatasetNotFound("spy-1118".to_string()),
                expected: "dataset not found: spy-1118",
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            assert_eq!(test.input.to_string(), test.expected, "TC{} failed", index);
        }
    }
}

use std::error::Error;
use std::fmt;

/// Errors raised by the network engine, its trainers and the data tools.
///
/// Every variant is a local precondition failure surfaced synchronously at
/// the offending call. Nothing is retried internally except the bounded
/// weight-reinitialization loop in [`crate::training::Backpropagation`],
/// which is a training-quality policy rather than error recovery.
#[derive(Debug, Clone, PartialEq)]
pub enum NetworkError {
    /// The operation requires `Network::build()` to have run first.
    NotReady,
    /// A layer declaration or layer chain is structurally invalid.
    InvalidTopology(String),
    /// A supplied vector's length does not match the expected width.
    DimensionMismatch { expected: usize, actual: usize },
    /// Two networks with different flattened weight lengths were bred.
    StructureMismatch { mother: usize, father: usize },
    /// A categorical value was never seen while scanning the dataset.
    UnknownCategory(String),
    /// A value in a continuous column does not parse as a number.
    NotNumeric(String),
    /// A dataset with zero usable rows was supplied.
    EmptyDataset,
    /// A model file deserialized into an inconsistent layer structure.
    MalformedModel(String),
}

impl fmt::Display for NetworkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkError::NotReady => {
                write!(f, "network is not ready - call build() first")
            }
            NetworkError::InvalidTopology(reason) => {
                write!(f, "invalid network topology: {reason}")
            }
            NetworkError::DimensionMismatch { expected, actual } => {
                write!(f, "dimension mismatch: expected {expected} values, got {actual}")
            }
            NetworkError::StructureMismatch { mother, father } => {
                write!(
                    f,
                    "breeding failed - networks have different internal structure \
                     ({mother} vs {father} weights)"
                )
            }
            NetworkError::UnknownCategory(value) => {
                write!(f, "'{value}' was not found among the scanned categories")
            }
            NetworkError::NotNumeric(value) => {
                write!(f, "'{value}' is not a valid number")
            }
            NetworkError::EmptyDataset => {
                write!(f, "dataset contains no samples")
            }
            NetworkError::MalformedModel(reason) => {
                write!(f, "model file is malformed: {reason}")
            }
        }
    }
}

impl Error for NetworkError {}

pub type Result<T> = std::result::Result<T, NetworkError>;

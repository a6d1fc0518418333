use std::fmt;

/// Conditions that abort an alignment call. Functions return
/// `anyhow::Result`; callers can recover the kind with
/// `err.downcast_ref::<AlignError>()`.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignError {
    /// the session holds no datasets
    EmptySession,
    /// no dataset carries the requested reference name
    ReferenceNotFound { name: Box<str> },
    /// a factor column has zero variance and cannot be standardized
    DegenerateColumn { dataset: Box<str>, column: usize },
    /// datasets disagree on the number of factor columns
    DimensionMismatch {
        dataset: Box<str>,
        expected: usize,
        found: usize,
    },
    /// a requested factor index is not a column of the loadings
    FactorOutOfRange { factor: usize, num_factors: usize },
    /// a warp could not be estimated from the given populations
    QuantileMappingFailure { reason: Box<str> },
    /// the caller raised the cancellation flag
    Cancelled,
}

impl fmt::Display for AlignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignError::EmptySession => write!(f, "no datasets to align"),
            AlignError::ReferenceNotFound { name } => {
                write!(f, "reference dataset '{}' not found", name)
            }
            AlignError::DegenerateColumn { dataset, column } => write!(
                f,
                "factor {} of dataset '{}' has zero variance",
                column, dataset
            ),
            AlignError::DimensionMismatch {
                dataset,
                expected,
                found,
            } => write!(
                f,
                "dataset '{}' has {} factors, expected {}",
                dataset, found, expected
            ),
            AlignError::FactorOutOfRange {
                factor,
                num_factors,
            } => write!(f, "factor {} out of range (0..{})", factor, num_factors),
            AlignError::QuantileMappingFailure { reason } => {
                write!(f, "quantile mapping failed: {}", reason)
            }
            AlignError::Cancelled => write!(f, "alignment cancelled"),
        }
    }
}

impl std::error::Error for AlignError {}

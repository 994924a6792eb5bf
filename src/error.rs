use std::fmt;

/// An input tuple that failed validation; the record is skipped.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordError {
    MissingTrajectory { id: usize },
    MissingResidue { id: usize },
    MissingGroup { id: usize },
    MissingLabel { id: usize },
    NonFiniteCoordinate { id: usize },
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "malformed record: {self:?}")
    }
}

impl std::error::Error for RecordError {}

#[derive(Debug, Clone, PartialEq)]
pub enum PatternError {
    InconsistentCenterCount { pattern: String },
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InconsistentCenterCount { pattern } => {
                write!(f, "pattern {pattern} has no centers")
            }
        }
    }
}

impl std::error::Error for PatternError {}

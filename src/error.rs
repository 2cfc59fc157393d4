use alloc::string::String;
use core::fmt;

/// Errors returned by document mutation and synchronization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocError {
    /// A change refers to operations this replica has not applied yet.
    ///
    /// Recoverable: hold the change and retry once more changes arrive.
    MissingDependency,
    /// An index or count exceeds the visible text length.
    OutOfBounds {
        /// The offending position.
        index: usize,
        /// The visible length the position was checked against.
        len: usize,
    },
    /// A mark type outside `strong`, `em`, `link`, `comment`.
    UnknownMark(String),
    /// An operation is structurally invalid (missing attributes, unknown
    /// path, or no effect at all).
    MalformedOp(&'static str),
    /// The sync retry loop exceeded its bound. Indicates a corrupt change
    /// stream or an implementation bug, never a transient condition.
    NonConvergence {
        /// Number of re-queue rounds performed before giving up.
        rounds: usize,
    },
}

impl fmt::Display for DocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingDependency => write!(f, "change depends on operations not yet applied"),
            Self::OutOfBounds { index, len } => {
                write!(f, "position {index} out of bounds for visible length {len}")
            }
            Self::UnknownMark(name) => write!(f, "unknown mark type: {name}"),
            Self::MalformedOp(msg) => write!(f, "malformed operation: {msg}"),
            Self::NonConvergence { rounds } => {
                write!(f, "sync failed to converge after {rounds} re-queue rounds")
            }
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DocError {}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, DocError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_messages() {
        assert_eq!(
            DocError::OutOfBounds { index: 7, len: 3 }.to_string(),
            "position 7 out of bounds for visible length 3"
        );
        assert_eq!(
            DocError::UnknownMark("underline".into()).to_string(),
            "unknown mark type: underline"
        );
        assert_eq!(
            DocError::NonConvergence { rounds: 10_001 }.to_string(),
            "sync failed to converge after 10001 re-queue rounds"
        );
    }
}

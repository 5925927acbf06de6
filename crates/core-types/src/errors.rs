use thiserror::Error;

/// Failure taxonomy shared by every step of a run.
///
/// Everything except [`FlowError::Unreachable`] is recoverable: it is caught
/// at the smallest enclosing step and turned into a skip or a failed outcome.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum FlowError {
    /// A wait exceeded its bound.
    #[error("navigation timeout: {0}")]
    NavigationTimeout(String),

    /// Every action strategy failed.
    #[error("action exhausted: {0}")]
    ActionExhausted(String),

    /// The expected roster or table structure is absent.
    #[error("structural mismatch: {0}")]
    StructuralMismatch(String),

    /// Several candidates matched; needs manual resolution.
    #[error("ambiguous match: {0}")]
    AmbiguousMatch(String),

    /// The post-action re-read did not show the expected state.
    #[error("verification failed: {0}")]
    VerificationFailed(String),

    /// The driver reported a transport or protocol fault.
    #[error("driver error: {0}")]
    Driver(String),

    /// The starting document could not be reached at all.
    #[error("starting document unreachable: {0}")]
    Unreachable(String),
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum ErrorKind {
    NavigationTimeout,
    ActionExhausted,
    StructuralMismatch,
    AmbiguousMatch,
    VerificationFailed,
    Driver,
    Unreachable,
}

impl FlowError {
    pub fn navigation_timeout(what: impl Into<String>) -> Self {
        Self::NavigationTimeout(what.into())
    }

    pub fn action_exhausted(what: impl Into<String>) -> Self {
        Self::ActionExhausted(what.into())
    }

    pub fn structural(what: impl Into<String>) -> Self {
        Self::StructuralMismatch(what.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::NavigationTimeout(_) => ErrorKind::NavigationTimeout,
            FlowError::ActionExhausted(_) => ErrorKind::ActionExhausted,
            FlowError::StructuralMismatch(_) => ErrorKind::StructuralMismatch,
            FlowError::AmbiguousMatch(_) => ErrorKind::AmbiguousMatch,
            FlowError::VerificationFailed(_) => ErrorKind::VerificationFailed,
            FlowError::Driver(_) => ErrorKind::Driver,
            FlowError::Unreachable(_) => ErrorKind::Unreachable,
        }
    }

    /// Only an unreachable starting document ends the run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, FlowError::Unreachable(_))
    }

    /// Whether the operator has to look at this before it can progress.
    pub fn needs_operator(&self) -> bool {
        matches!(self, FlowError::AmbiguousMatch(_))
    }
}

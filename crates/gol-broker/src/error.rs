use std::fmt;

/// Protocol-misuse errors (spec.md §7 taxonomy, category 2): fatal to the
/// calling RPC, returned as `BrokerResponse::Error` rather than closing the
/// connection. Mirrors the teacher's hand-rolled `ProtocolError`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerError {
    NotInitialised,
    AlreadyAdmitted,
    EvolveAlreadyInFlight,
    WorkerFailure(String),
    /// Invariant (I1) violation: the world handed to `Initialise` doesn't
    /// match `params.imageWidth x imageHeight`.
    DimensionMismatch(String),
}

impl fmt::Display for BrokerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotInitialised => write!(f, "evolve called before initialise"),
            Self::AlreadyAdmitted => write!(f, "a client session is already admitted"),
            Self::EvolveAlreadyInFlight => write!(f, "an evolve call is already in flight"),
            Self::WorkerFailure(msg) => write!(f, "worker failure: {msg}"),
            Self::DimensionMismatch(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for BrokerError {}

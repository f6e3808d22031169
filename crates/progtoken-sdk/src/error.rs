use thiserror::Error;

use crate::state::BootstrapState;

#[derive(Debug, Error)]
pub enum Error {
    #[error("policy {0} is already registered")]
    DuplicateKey(String),

    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),

    #[error("no registry node covers key {0}")]
    NoCoveringNode(String),

    #[error("inconsistent registry chain: {0}")]
    InconsistentChain(String),

    #[error("stale state: {0}")]
    StaleState(String),

    #[error("no collateral available")]
    NoCollateral,

    #[error("wallet has no spendable outputs")]
    EmptyWallet,

    #[error("network error: {0}")]
    Network(String),

    #[error("timed out after {seconds}s waiting for {what}")]
    Timeout { what: String, seconds: u64 },

    #[error("malformed record: {0}")]
    MalformedRecord(String),

    #[error("submission rejected: {0}")]
    Submission(String),

    #[error("signer error: {0}")]
    Signer(String),

    #[error("bootstrap seed {0} is already spent")]
    ReferenceSpent(String),

    #[error("bootstrap step not allowed in state {0:?}")]
    InvalidBootstrapState(BootstrapState),

    #[error("policy {0} is not registered")]
    UnregisteredPolicy(String),

    #[error("quantity must be non-zero")]
    InvalidAmount,

    #[error("amount overflow")]
    AmountOverflow,

    #[error("validator derivation failed: {0}")]
    Script(String),

    #[error("reference output {0} not found")]
    MissingReference(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification callers use to decide between fixing input,
/// re-planning, remediating resources, or retrying with backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The request itself must change.
    Input,
    /// The live set moved under the plan; re-fetch and re-plan from scratch.
    Consistency,
    /// The wallet lacks something (collateral, outputs).
    Resource,
    /// Safe to retry as-is with backoff.
    Transient,
    /// Not recoverable by this caller.
    Fatal,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DuplicateKey(_)
            | Error::InsufficientBalance { .. }
            | Error::InvalidRecipient(_)
            | Error::UnregisteredPolicy(_)
            | Error::InvalidAmount
            | Error::AmountOverflow => ErrorKind::Input,
            Error::NoCoveringNode(_) | Error::InconsistentChain(_) | Error::StaleState(_) => {
                ErrorKind::Consistency
            }
            Error::NoCollateral | Error::EmptyWallet => ErrorKind::Resource,
            Error::Network(_) | Error::Timeout { .. } => ErrorKind::Transient,
            Error::MalformedRecord(_)
            | Error::Submission(_)
            | Error::Signer(_)
            | Error::ReferenceSpent(_)
            | Error::InvalidBootstrapState(_)
            | Error::Script(_)
            | Error::MissingReference(_)
            | Error::Config(_) => ErrorKind::Fatal,
        }
    }

    /// Whether re-running the whole operation (re-fetch included) may succeed.
    ///
    /// `NoCoveringNode` is reported as a consistency fault but is not retried:
    /// with an intact chain it cannot happen.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::NoCoveringNode(_) => false,
            other => matches!(
                other.kind(),
                ErrorKind::Consistency | ErrorKind::Transient
            ),
        }
    }
}

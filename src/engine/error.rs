//! Error kinds for rule construction, registration, and dispatch.
//!
//! Everything in this crate is synchronous and local: an operation either
//! succeeds or fails immediately, and no retry or backoff logic exists at
//! this layer. Dispatch failures propagate to the caller rather than being
//! swallowed, since a silently-failed dispatch would otherwise look like
//! "no rule matched".

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or conflicting rule-construction arguments, such as both
    /// the singular and plural form of a filter being supplied. Raised at
    /// registration time, never during dispatch, so a bad rule cannot enter
    /// the live set.
    #[error("invalid dialogue state rule: {0}")]
    InvalidSpecification(String),

    /// A dialogue state name was re-registered with a different handler.
    #[error("handler registration is overwriting dialogue state {state:?}")]
    HandlerConflict { state: String },

    /// A context arrived without a usable required field. Surfaced
    /// immediately so bugs in the upstream producer are visible.
    #[error("context has no usable {field:?} field")]
    ContextContractViolation { field: &'static str },

    /// A reserved responder method was called.
    #[error("responder action {method:?} is not supported")]
    UnsupportedAction { method: &'static str },

    /// A matching rule named a dialogue state with no registered handler.
    /// Cannot happen through the public registration path, which always
    /// installs the rule and its handler together.
    #[error("no handler registered for dialogue state {state:?}")]
    MissingHandler { state: String },

    /// Registration was attempted after [`Dispatcher::seal`] closed the
    /// startup phase.
    ///
    /// [`Dispatcher::seal`]: crate::Dispatcher::seal
    #[error("dispatcher is sealed; rules must be registered before serving")]
    RegistrySealed,
}

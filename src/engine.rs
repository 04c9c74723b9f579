//! Rule matching and dispatch engine.
//!
//! This module is the *operational core* of the crate: it owns the rule
//! model, the registry/dispatcher, and the per-dispatch responder, split
//! into focused submodules under `src/engine/` while keeping public paths
//! stable (for example `crate::Dispatcher` and `crate::Rule`).
//!
//! ## How the parts work together
//!
//! At a high level, serving a request is a pipeline:
//!
//! ```text
//! (name, handler, RuleSpec) ──┐
//!                             │  Dispatcher::register      (dispatch.rs)
//!                             │    - Rule::new validates   (rule.rs)
//!                             │    - stable re-sort by specificity
//!                             └──────────────┬─────────────
//!                                            │  seal()
//!                                            v
//! Context ──────────────────── Dispatcher::dispatch ── scan rules ascending,
//!                                            │         first Rule::matches wins
//!                                            v
//!                                 handler(context, slots, responder)
//!                                            │  reply / prompt / respond
//!                                            v      (responder.rs)
//!                                     DispatchOutcome
//! ```
//!
//! Selection is deliberately *least-specific-first with first-match-wins*:
//! the rule sequence is sorted by ascending specificity and the scan stops
//! at the first match, so a broad rule registered earlier shadows narrower
//! ones. Equal-specificity rules keep registration order (the sort is
//! stable), which makes registration order a documented tie-break.
//!
//! ## Responsibilities by module
//!
//! - `rule.rs`: rule construction/validation, entity filter normalization,
//!   match evaluation, and the specificity bit flags.
//! - `dispatch.rs`: the registry lifecycle (open → sealed), the handler
//!   table and its conflict invariant, and selection/invocation.
//! - `responder.rs`: per-dispatch action accumulation, phrasing-variant
//!   choice, and `{key}` slot templating.
//! - `error.rs`: the typed error kinds; everything fails fast, nothing
//!   retries.
//!
//! ## Concurrency
//!
//! One dispatch call is single-threaded end to end; the handler runs
//! in-line with no suspension point. Registration and dispatch share the
//! dispatcher, so deployments that cannot finish registering before serving
//! must wrap it in their own lock; the simpler, recommended policy is to
//! `seal()` after startup and share the sealed dispatcher immutably.

#[path = "engine/dispatch.rs"]
mod dispatch;
#[path = "engine/error.rs"]
mod error;
#[path = "engine/responder.rs"]
mod responder;
#[path = "engine/rule.rs"]
mod rule;

#[cfg(test)]
#[path = "engine/tests.rs"]
mod tests;

pub use dispatch::{Dispatcher, FnHandler, Handler};
pub use error::Error;
pub use responder::{Chooser, Phrase, Responder};
pub use rule::{EntityFilter, EntitySpec, Rule, RuleSpec, SpecificityMask};

extern crate self as parlance;

#[macro_use]
mod macros;
mod api;
mod engine;

pub use api::{ClientAction, Context, DispatchOutcome, Entity, Slots};
pub use engine::{
    Chooser, Dispatcher, EntityFilter, EntitySpec, Error, FnHandler, Handler, Phrase, Responder,
    Rule, RuleSpec, SpecificityMask,
};

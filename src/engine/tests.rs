use super::dispatch::{Dispatcher, FnHandler};
use super::error::Error;
use super::rule::RuleSpec;
use crate::api::Context;
use std::sync::Arc;

fn replying(name: &str, text: &'static str) -> Arc<FnHandler> {
    Arc::new(FnHandler::new(name, move |_ctx, slots, responder| {
        responder.reply(slots, text);
    }))
}

fn reply_text(outcome: &crate::DispatchOutcome, idx: usize) -> &str {
    outcome.client_actions[idx].payload["text"].as_str().unwrap()
}

#[test]
fn broader_rule_shadows_more_specific_one() {
    // domain-only (specificity 1) vs domain+intent (specificity 3),
    // registered in that order: the scan runs ascending, so the broad rule
    // wins even though the other also matches.
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(None, replying("weather", "any weather"), RuleSpec::new().domain("weather"))
        .unwrap();
    dispatcher
        .register(
            None,
            replying("forecast", "the forecast"),
            RuleSpec::new().domain("weather").intent("forecast"),
        )
        .unwrap();
    dispatcher.seal();

    let outcome = dispatcher.dispatch(&Context::new("weather", "forecast")).unwrap();
    assert_eq!(outcome.dialogue_state.as_deref(), Some("weather"));
    assert_eq!(reply_text(&outcome, 0), "any weather");
}

#[test]
fn registration_order_breaks_specificity_ties() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(None, replying("second", "late"), RuleSpec::new().domain("weather"))
        .unwrap();
    dispatcher
        .register(None, replying("first", "early"), RuleSpec::new().domain("weather"))
        .unwrap();

    // Both rules have specificity 1; the one registered first is evaluated
    // first.
    let states: Vec<&str> = dispatcher.rules().iter().map(|r| r.state()).collect();
    assert_eq!(states, vec!["second", "first"]);

    let outcome = dispatcher.dispatch(&Context::new("weather", "forecast")).unwrap();
    assert_eq!(outcome.dialogue_state.as_deref(), Some("second"));
}

#[test]
fn rules_are_kept_sorted_across_registrations() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register(
            None,
            replying("narrow", "narrow"),
            RuleSpec::new().domain("weather").intent("forecast").entities([("city", "Paris")]),
        )
        .unwrap();
    dispatcher.register(None, replying("catchall", "hi"), RuleSpec::new()).unwrap();
    dispatcher
        .register(None, replying("broad", "broad"), RuleSpec::new().domain("weather"))
        .unwrap();

    let scores: Vec<u8> = dispatcher.rules().iter().map(|r| r.specificity().bits()).collect();
    assert_eq!(scores, vec![0, 1, 11]);
}

#[test]
fn conflicting_handler_reregistration_fails() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(None, replying("greet", "hi"), RuleSpec::new().intent("hello")).unwrap();

    let err = dispatcher
        .register(None, replying("greet", "hello there"), RuleSpec::new().intent("hey"))
        .unwrap_err();
    assert!(matches!(err, Error::HandlerConflict { state } if state == "greet"));

    // The failed call left the registry unchanged.
    assert_eq!(dispatcher.rules().len(), 1);
}

#[test]
fn identical_handler_reregistration_is_silent() {
    let handler = replying("greet", "hi");
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(None, handler.clone(), RuleSpec::new().intent("hello")).unwrap();
    dispatcher.register(None, handler, RuleSpec::new().intent("hey")).unwrap();

    // Duplicate predicates are appended, not deduplicated.
    assert_eq!(dispatcher.rules().len(), 2);
}

#[test]
fn reregistering_the_same_rule_is_outcome_idempotent() {
    let handler = replying("greet", "hi");
    let spec = RuleSpec::new().intent("hello");

    let mut dispatcher = Dispatcher::new();
    dispatcher.register(None, handler.clone(), spec.clone()).unwrap();
    let before = dispatcher.dispatch(&Context::new("smalltalk", "hello")).unwrap();

    dispatcher.register(None, handler, spec).unwrap();
    let after = dispatcher.dispatch(&Context::new("smalltalk", "hello")).unwrap();

    assert_eq!(dispatcher.rules().len(), 2);
    assert_eq!(before, after);
}

#[test]
fn state_name_is_derived_from_the_handler() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(None, replying("greet", "hi"), RuleSpec::new()).unwrap();
    assert_eq!(dispatcher.rules()[0].state(), "greet");

    // An explicit name wins over the handler's own.
    dispatcher.register(Some("welcome"), replying("greet2", "hi"), RuleSpec::new()).unwrap();
    assert!(dispatcher.rules().iter().any(|r| r.state() == "welcome"));
}

#[test]
fn anonymous_handler_without_name_is_rejected() {
    let mut dispatcher = Dispatcher::new();
    let err = dispatcher
        .register(None, Arc::new(|_: &Context, _: &mut crate::Slots, _: &mut crate::Responder| {}), RuleSpec::new())
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSpecification(_)));
}

#[test]
fn closures_register_with_an_explicit_name() {
    let mut dispatcher = Dispatcher::new();
    dispatcher
        .register_fn(
            "echo",
            |ctx, slots, responder| {
                slots.insert("intent".to_string(), serde_json::json!(ctx.intent.clone()));
                responder.reply(slots, "you said {intent}");
            },
            RuleSpec::new().domain("smalltalk"),
        )
        .unwrap();

    let outcome = dispatcher.dispatch(&Context::new("smalltalk", "hello")).unwrap();
    assert_eq!(reply_text(&outcome, 0), "you said hello");
}

#[test]
fn no_match_runs_the_default_handler() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(None, replying("greet", "hi"), RuleSpec::new().domain("smalltalk")).unwrap();

    let outcome = dispatcher.dispatch(&Context::new("banking", "transfer")).unwrap();
    assert_eq!(outcome.dialogue_state, None);
    assert!(outcome.client_actions.is_empty());
}

#[test]
fn default_handler_can_be_overridden() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_default_handler(Arc::new(FnHandler::new("", |_ctx, slots, responder| {
        responder.reply(slots, "I did not catch that.");
    })));
    dispatcher.seal();

    let outcome = dispatcher.dispatch(&Context::new("banking", "transfer")).unwrap();
    assert_eq!(outcome.dialogue_state, None);
    assert_eq!(reply_text(&outcome, 0), "I did not catch that.");
}

#[test]
fn sealed_dispatcher_rejects_registration_but_still_dispatches() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(None, replying("greet", "hi"), RuleSpec::new().intent("hello")).unwrap();
    dispatcher.seal();

    let err = dispatcher.register(None, replying("late", "no"), RuleSpec::new()).unwrap_err();
    assert!(matches!(err, Error::RegistrySealed));

    let outcome = dispatcher.dispatch(&Context::new("smalltalk", "hello")).unwrap();
    assert_eq!(outcome.dialogue_state.as_deref(), Some("greet"));
}

#[test]
fn invalid_context_fails_before_any_rule_runs() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.register(None, replying("greet", "hi"), RuleSpec::new()).unwrap();

    let err = dispatcher.dispatch(&Context::new("", "hello")).unwrap_err();
    assert!(matches!(err, Error::ContextContractViolation { field: "domain" }));
}

#[test]
fn invalid_spec_never_enters_the_rule_set() {
    let mut dispatcher = Dispatcher::new();
    let err = dispatcher
        .register(None, replying("greet", "hi"), RuleSpec::new().domain("a").domains(["b"]))
        .unwrap_err();
    assert!(matches!(err, Error::InvalidSpecification(_)));
    assert!(dispatcher.rules().is_empty());
}

#[test]
fn dispatch_uses_the_injected_chooser() {
    let mut dispatcher = Dispatcher::new();
    dispatcher.set_chooser(|len| len - 1);
    dispatcher
        .register_fn(
            "greet",
            |_ctx, slots, responder| responder.reply(slots, ["first", "second", "third"]),
            RuleSpec::new().intent("hello"),
        )
        .unwrap();

    let outcome = dispatcher.dispatch(&Context::new("smalltalk", "hello")).unwrap();
    assert_eq!(reply_text(&outcome, 0), "third");
}

//! Registration and dispatch.
//!
//! The [`Dispatcher`] is the explicit registry object holding the rule
//! sequence and the handler table. Its lifecycle has two phases: open for
//! [`register`](Dispatcher::register) calls at startup, then
//! [`seal`](Dispatcher::seal)-ed before serving. A sealed dispatcher only
//! dispatches, which is why `dispatch` takes `&self` and the whole thing
//! can sit behind an `Arc` once serving starts.
//!
//! Rules are kept sorted by ascending specificity with a stable sort, so
//! equal-specificity rules retain registration order. Selection scans that
//! order and stops at the first match: a broad rule registered earlier can
//! shadow a narrower one, and callers who want a particular priority among
//! equal scores register in that order deliberately.

use super::error::Error;
use super::responder::{Chooser, Responder, random_choice};
use super::rule::{Rule, RuleSpec};
use crate::api::{Context, DispatchOutcome, Slots};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A dialogue state handler: opaque business logic invoked when its rule
/// matches.
///
/// Handlers receive the context read-only, a fresh mutable slot map for
/// template values, and the responder that accumulates their client
/// actions. They are invoked synchronously, in-line with the dispatch call.
pub trait Handler: Send + Sync {
    /// Identifier used as the dialogue state name when a rule is registered
    /// without an explicit one. Anonymous handlers return `""`.
    fn name(&self) -> &str {
        ""
    }

    fn handle(&self, context: &Context, slots: &mut Slots, responder: &mut Responder);
}

/// Any plain closure or function is an (anonymous) handler, so it needs an
/// explicit state name at registration.
impl<F> Handler for F
where
    F: Fn(&Context, &mut Slots, &mut Responder) + Send + Sync,
{
    fn handle(&self, context: &Context, slots: &mut Slots, responder: &mut Responder) {
        self(context, slots, responder)
    }
}

/// Pairs a closure with a name so it can be registered without an explicit
/// state name.
pub struct FnHandler {
    name: String,
    func: Box<dyn Fn(&Context, &mut Slots, &mut Responder) + Send + Sync>,
}

impl FnHandler {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&Context, &mut Slots, &mut Responder) + Send + Sync + 'static,
    {
        FnHandler { name: name.into(), func: Box::new(func) }
    }
}

impl Handler for FnHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle(&self, context: &Context, slots: &mut Slots, responder: &mut Responder) {
        (self.func)(context, slots, responder)
    }
}

/// Holds the registered rules and their handlers, and resolves incoming
/// contexts to a dialogue state.
pub struct Dispatcher {
    /// Sorted by ascending specificity; stable, so insertion order breaks ties.
    rules: Vec<Rule>,
    handlers: HashMap<String, Arc<dyn Handler>>,
    default_handler: Arc<dyn Handler>,
    chooser: Chooser,
    sealed: bool,
}

impl Dispatcher {
    pub fn new() -> Self {
        Dispatcher {
            rules: Vec::new(),
            handlers: HashMap::new(),
            default_handler: Arc::new(noop),
            chooser: random_choice,
            sealed: false,
        }
    }

    /// Replace the handler invoked when no rule matches. The builtin
    /// default emits no actions.
    pub fn set_default_handler(&mut self, handler: Arc<dyn Handler>) {
        self.default_handler = handler;
    }

    /// Replace the variant-selection function used by responders built for
    /// dispatch calls. Tests substitute a deterministic one.
    pub fn set_chooser(&mut self, chooser: Chooser) {
        self.chooser = chooser;
    }

    /// Close the registration phase. Further `register` calls fail with
    /// [`Error::RegistrySealed`]; dispatching is unaffected.
    pub fn seal(&mut self) {
        self.sealed = true;
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Registered rules in evaluation order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Register a rule for a dialogue state.
    ///
    /// The state name is `name` if given, otherwise the handler's own
    /// [`Handler::name`]; an anonymous handler with no explicit name is a
    /// configuration error. Multiple rules may share a state name or have
    /// overlapping predicates; duplicates are appended, not deduplicated,
    /// and the first match in sorted order always wins.
    ///
    /// Re-registering a state name with a different handler fails with
    /// [`Error::HandlerConflict`]; re-registering the identical handler
    /// (same `Arc`) is a silent overwrite. On any error the registry is
    /// left unchanged.
    pub fn register(
        &mut self,
        name: Option<&str>,
        handler: Arc<dyn Handler>,
        spec: RuleSpec,
    ) -> Result<(), Error> {
        if self.sealed {
            return Err(Error::RegistrySealed);
        }

        let name = match name {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                let derived = handler.name();
                if derived.is_empty() {
                    return Err(Error::InvalidSpecification(
                        "a state name is required when registering an anonymous handler"
                            .to_string(),
                    ));
                }
                derived.to_string()
            }
        };

        let rule = Rule::new(name.clone(), spec)?;

        if let Some(existing) = self.handlers.get(&name) {
            if !Arc::ptr_eq(existing, &handler) {
                return Err(Error::HandlerConflict { state: name });
            }
        }

        debug!(state = %name, specificity = rule.specificity().bits(), "registered dialogue state rule");
        self.rules.push(rule);
        self.rules.sort_by_key(|r| r.specificity().bits());
        self.handlers.insert(name, handler);
        Ok(())
    }

    /// Convenience wrapper over [`register`](Self::register) for closures,
    /// which always need an explicit state name.
    pub fn register_fn<F>(&mut self, name: &str, func: F, spec: RuleSpec) -> Result<(), Error>
    where
        F: Fn(&Context, &mut Slots, &mut Responder) + Send + Sync + 'static,
    {
        self.register(Some(name), Arc::new(func), spec)
    }

    /// Resolve `context` to a dialogue state, invoke its handler, and
    /// collect the actions it emitted.
    ///
    /// Rules are scanned in ascending specificity order and the first match
    /// wins; later, more specific rules are not considered. When nothing
    /// matches, the default handler runs and the outcome's state is `None`.
    pub fn dispatch(&self, context: &Context) -> Result<DispatchOutcome, Error> {
        context.ensure_contract()?;

        let selected = self.rules.iter().find(|rule| rule.matches(context));

        let (state, handler) = match selected {
            Some(rule) => {
                let handler = self.handlers.get(rule.state()).ok_or_else(|| {
                    Error::MissingHandler { state: rule.state().to_string() }
                })?;
                (Some(rule.state().to_string()), Arc::clone(handler))
            }
            None => (None, Arc::clone(&self.default_handler)),
        };
        debug!(domain = %context.domain, intent = %context.intent, state = ?state, "dispatching context");

        let mut slots = Slots::new();
        let mut responder = Responder::with_chooser(self.chooser);
        handler.handle(context, &mut slots, &mut responder);

        Ok(DispatchOutcome { dialogue_state: state, client_actions: responder.into_actions() })
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("rules", &self.rules)
            .field("handlers", &self.handlers.keys().collect::<Vec<_>>())
            .field("sealed", &self.sealed)
            .finish()
    }
}

fn noop(_: &Context, _: &mut Slots, _: &mut Responder) {}

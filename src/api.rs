use crate::engine::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Named values available for `{key}`-style template substitution in
/// responder text.
///
/// The dispatcher hands every handler a fresh, empty map; handlers fill it
/// (typically from the context's entities) before calling
/// [`Responder::reply`](crate::Responder::reply). Upstream slot population
/// from entity resolution is an external collaborator's job and is not
/// performed here.
pub type Slots = serde_json::Map<String, Value>;

/// An entity recognized in the user's request by the upstream classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Entity type label, e.g. `"city"`.
    #[serde(rename = "type")]
    pub entity_type: String,
    /// Resolved entity value.
    pub value: Value,
}

impl Entity {
    pub fn new(entity_type: impl Into<String>, value: impl Into<Value>) -> Self {
        Entity { entity_type: entity_type.into(), value: value.into() }
    }
}

/// An incoming request descriptor: the domain and intent assigned by the
/// upstream classifier, plus the entities it recognized.
///
/// Contexts are consumed read-only; matching never mutates them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    pub domain: String,
    pub intent: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
}

impl Context {
    pub fn new(domain: impl Into<String>, intent: impl Into<String>) -> Self {
        Context { domain: domain.into(), intent: intent.into(), entities: Vec::new() }
    }

    /// Append a recognized entity (builder-style, useful in tests and demos).
    pub fn with_entity(mut self, entity_type: impl Into<String>, value: impl Into<Value>) -> Self {
        self.entities.push(Entity::new(entity_type, value));
        self
    }

    /// Check the input contract an upstream producer must uphold: `domain`
    /// and `intent` must be non-empty.
    ///
    /// [`Dispatcher::dispatch`](crate::Dispatcher::dispatch) runs this once
    /// per call and propagates the failure instead of silently treating a
    /// malformed context as "no rule matched", so producer bugs surface
    /// where they happen.
    pub fn ensure_contract(&self) -> Result<(), Error> {
        if self.domain.is_empty() {
            return Err(Error::ContextContractViolation { field: "domain" });
        }
        if self.intent.is_empty() {
            return Err(Error::ContextContractViolation { field: "intent" });
        }
        Ok(())
    }
}

/// A structured instruction describing output to present to the end user.
///
/// `payload` is arbitrary structured data; the builtin reply/prompt actions
/// use `{"text": "..."}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientAction {
    pub name: String,
    pub payload: Value,
}

impl ClientAction {
    pub fn new(name: impl Into<String>, payload: Value) -> Self {
        ClientAction { name: name.into(), payload }
    }
}

/// Result from [`Dispatcher::dispatch`](crate::Dispatcher::dispatch).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchOutcome {
    /// Name of the dialogue state whose rule matched, or `None` when the
    /// default handler ran.
    pub dialogue_state: Option<String>,
    /// Actions accumulated by the invoked handler, in call order.
    pub client_actions: Vec<ClientAction>,
}

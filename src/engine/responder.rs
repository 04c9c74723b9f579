//! Per-dispatch response accumulation.
//!
//! A [`Responder`] is created fresh for every dispatch call, handed to the
//! invoked handler, and consumed once the handler returns. It collects
//! [`ClientAction`]s in call order with no deduplication and no reordering.
//!
//! `reply` and `prompt` accept either a single phrasing or a collection of
//! interchangeable phrasings ([`Phrase`]); a collection picks one variant
//! uniformly at random. The randomness is deliberate (phrasing variety for
//! the end user), so the selection function is injectable and tests swap in
//! a deterministic one.

use super::error::Error;
use crate::api::{ClientAction, Slots};
use rand::Rng;
use serde_json::{Value, json};

/// Picks an index in `0..len` when a reply has several phrasings.
/// Called only with `len >= 1`; must return a value below `len`.
pub type Chooser = fn(len: usize) -> usize;

/// Uniform random selection, the default [`Chooser`].
pub(crate) fn random_choice(len: usize) -> usize {
    rand::rng().random_range(0..len)
}

/// Text accepted by [`Responder::reply`] and [`Responder::prompt`]: one
/// phrasing, or several to choose from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phrase {
    One(String),
    Any(Vec<String>),
}

impl From<&str> for Phrase {
    fn from(text: &str) -> Self {
        Phrase::One(text.to_string())
    }
}

impl From<String> for Phrase {
    fn from(text: String) -> Self {
        Phrase::One(text)
    }
}

impl From<Vec<String>> for Phrase {
    fn from(variants: Vec<String>) -> Self {
        Phrase::Any(variants)
    }
}

impl From<Vec<&str>> for Phrase {
    fn from(variants: Vec<&str>) -> Self {
        Phrase::Any(variants.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for Phrase {
    fn from(variants: [&str; N]) -> Self {
        Phrase::Any(variants.into_iter().map(str::to_string).collect())
    }
}

/// Accumulates the client actions a handler emits for one dispatch call.
pub struct Responder {
    actions: Vec<ClientAction>,
    chooser: Chooser,
}

impl Responder {
    /// A responder using the default random variant selection. Mostly
    /// useful for exercising handlers directly in tests; dispatch builds
    /// its own.
    pub fn new() -> Self {
        Self::with_chooser(random_choice)
    }

    pub(crate) fn with_chooser(chooser: Chooser) -> Self {
        Responder { actions: Vec::new(), chooser }
    }

    /// Append a `show-reply` action. A [`Phrase::Any`] input picks one
    /// variant; `{key}` placeholders are then substituted from `slots`.
    pub fn reply(&mut self, slots: &Slots, text: impl Into<Phrase>) {
        self.push_text("show-reply", slots, text.into());
    }

    /// Same as [`reply`](Self::reply), but the action name is `show-prompt`.
    pub fn prompt(&mut self, slots: &Slots, text: impl Into<Phrase>) {
        self.push_text("show-prompt", slots, text.into());
    }

    /// Append an arbitrary caller-supplied action verbatim. This is the
    /// escape hatch beneath `reply`/`prompt`.
    pub fn respond(&mut self, action: ClientAction) {
        self.actions.push(action);
    }

    /// Reserved for a richer list-display action; always fails with
    /// [`Error::UnsupportedAction`].
    pub fn show(&mut self, _items: &[Value]) -> Result<(), Error> {
        Err(Error::UnsupportedAction { method: "show" })
    }

    /// Actions accumulated so far, in call order.
    pub fn actions(&self) -> &[ClientAction] {
        &self.actions
    }

    pub(crate) fn into_actions(self) -> Vec<ClientAction> {
        self.actions
    }

    fn push_text(&mut self, name: &str, slots: &Slots, phrase: Phrase) {
        let chosen = match phrase {
            Phrase::One(text) => text,
            Phrase::Any(mut variants) => {
                if variants.is_empty() {
                    String::new()
                } else {
                    variants.swap_remove((self.chooser)(variants.len()))
                }
            }
        };
        let resolved = render(&chosen, slots);
        self.respond(ClientAction::new(name, json!({ "text": resolved })));
    }
}

impl Default for Responder {
    fn default() -> Self {
        Self::new()
    }
}

/// Substitute `{key}` placeholders from `slots`.
///
/// String slot values are inserted verbatim; other JSON values use their
/// compact rendering. Placeholders with no matching slot are left untouched
/// so a missing slot is visible in the output rather than silently dropped.
fn render(text: &str, slots: &Slots) -> String {
    let re = regex!(r"\{([A-Za-z_][A-Za-z0-9_]*)\}");
    re.replace_all(text, |caps: &regex::Captures<'_>| match slots.get(&caps[1]) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => caps[0].to_string(),
    })
    .into_owned()
}

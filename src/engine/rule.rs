//! Rule model, validation, and match evaluation.
//!
//! A [`Rule`] is an immutable predicate over a [`Context`]: it names a
//! dialogue state and carries up to three optional filters (domains,
//! intents, entities). Construction goes through [`RuleSpec`], which keeps
//! the singular and plural forms of each filter apart so that supplying
//! both can be rejected before a bad rule enters the live set.
//!
//! Entity requirements are a tagged variant ([`EntitySpec`]) rather than a
//! runtime shape check, normalized at construction into one of two stored
//! filters ([`EntityFilter`]): a set of required entity types, or a map of
//! required `type → value` pairs. The two are mutually exclusive.
//!
//! Specificity is a pure function of the configured filters: each category
//! contributes an independent bit (see [`SpecificityMask`]), so any subset
//! of categories yields a unique score and adding a filter never lowers it.

use super::error::Error;
use crate::api::Context;
use std::collections::{BTreeMap, BTreeSet};

bitflags::bitflags! {
    /// Bit weights for the filter categories configured on a rule.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct SpecificityMask: u8 {
        const DOMAIN        = 1 << 0;
        const INTENT        = 1 << 1;
        const ENTITY_TYPES  = 1 << 2;
        const ENTITY_VALUES = 1 << 3;
    }
}

// --- Entity requirements ------------------------------------------------------

/// Entity requirement accepted at rule construction time.
///
/// `From` conversions cover the common shapes so call sites stay short:
/// a single type name, a collection of type names, or `type → value` pairs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntitySpec {
    /// One required entity type.
    Type(String),
    /// A set of required entity types; all must be present in the context.
    Types(BTreeSet<String>),
    /// Required `type → value` pairs; each must be matched exactly.
    Values(BTreeMap<String, String>),
}

impl EntitySpec {
    fn normalize(self) -> EntityFilter {
        match self {
            EntitySpec::Type(t) => EntityFilter::ByType(BTreeSet::from([t])),
            EntitySpec::Types(set) => EntityFilter::ByType(set),
            EntitySpec::Values(map) => EntityFilter::ByValue(map),
        }
    }
}

impl From<&str> for EntitySpec {
    fn from(entity_type: &str) -> Self {
        EntitySpec::Type(entity_type.to_string())
    }
}

impl From<String> for EntitySpec {
    fn from(entity_type: String) -> Self {
        EntitySpec::Type(entity_type)
    }
}

impl From<BTreeSet<String>> for EntitySpec {
    fn from(types: BTreeSet<String>) -> Self {
        EntitySpec::Types(types)
    }
}

impl From<Vec<&str>> for EntitySpec {
    fn from(types: Vec<&str>) -> Self {
        EntitySpec::Types(types.into_iter().map(str::to_string).collect())
    }
}

impl<const N: usize> From<[&str; N]> for EntitySpec {
    fn from(types: [&str; N]) -> Self {
        EntitySpec::Types(types.into_iter().map(str::to_string).collect())
    }
}

impl From<BTreeMap<String, String>> for EntitySpec {
    fn from(values: BTreeMap<String, String>) -> Self {
        EntitySpec::Values(values)
    }
}

impl<const N: usize> From<[(&str, &str); N]> for EntitySpec {
    fn from(pairs: [(&str, &str); N]) -> Self {
        EntitySpec::Values(pairs.into_iter().map(|(t, v)| (t.to_string(), v.to_string())).collect())
    }
}

/// Normalized entity requirement stored on a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntityFilter {
    /// Every required type must appear at least once among the context's
    /// entities; extra types in the context are allowed.
    ByType(BTreeSet<String>),
    /// Every `(type, value)` pair must be satisfied by at least one context
    /// entity with that exact type and value.
    ByValue(BTreeMap<String, String>),
}

// --- Rule specification -------------------------------------------------------

/// Filter specification for a rule, gathered before validation.
///
/// Singular and plural setters are tracked separately; [`Rule::new`] rejects
/// a spec that used both forms of the same category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSpec {
    domain: Option<String>,
    domains: Option<BTreeSet<String>>,
    intent: Option<String>,
    intents: Option<BTreeSet<String>>,
    entity: Option<String>,
    entities: Option<EntitySpec>,
}

impl RuleSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Require the context's domain to equal `domain`.
    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Require the context's domain to be one of `domains`.
    pub fn domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.domains = Some(domains.into_iter().map(Into::into).collect());
        self
    }

    /// Require the context's intent to equal `intent`.
    pub fn intent(mut self, intent: impl Into<String>) -> Self {
        self.intent = Some(intent.into());
        self
    }

    /// Require the context's intent to be one of `intents`.
    pub fn intents<I, S>(mut self, intents: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.intents = Some(intents.into_iter().map(Into::into).collect());
        self
    }

    /// Require a single entity type to be present in the context.
    pub fn entity(mut self, entity_type: impl Into<String>) -> Self {
        self.entity = Some(entity_type.into());
        self
    }

    /// Require entities per an [`EntitySpec`] (types or `type → value` pairs).
    pub fn entities(mut self, spec: impl Into<EntitySpec>) -> Self {
        self.entities = Some(spec.into());
        self
    }
}

// --- Rule ---------------------------------------------------------------------

/// A named, immutable predicate over a [`Context`] plus a derived
/// specificity score.
///
/// Rules never change after construction; the dispatcher owns them and keeps
/// them sorted by ascending specificity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    state: String,
    domains: Option<BTreeSet<String>>,
    intents: Option<BTreeSet<String>>,
    entities: Option<EntityFilter>,
    specificity: SpecificityMask,
}

impl Rule {
    /// Validate `spec` and construct a rule for dialogue state `state`.
    ///
    /// Fails with [`Error::InvalidSpecification`] when the state name is
    /// empty or when both the singular and plural form of a filter category
    /// were supplied.
    pub fn new(state: impl Into<String>, spec: RuleSpec) -> Result<Self, Error> {
        let state = state.into();
        if state.is_empty() {
            return Err(Error::InvalidSpecification(
                "a dialogue state rule needs a non-empty state name".to_string(),
            ));
        }

        let domains = resolve_pair("domain", spec.domain, "domains", spec.domains)?;
        let intents = resolve_pair("intent", spec.intent, "intents", spec.intents)?;
        let entities = match (spec.entity, spec.entities) {
            (Some(_), Some(_)) => return Err(only_one_of("entity", "entities")),
            (Some(t), None) => Some(EntityFilter::ByType(BTreeSet::from([t]))),
            (None, Some(spec)) => Some(spec.normalize()),
            (None, None) => None,
        };

        let mut specificity = SpecificityMask::empty();
        if domains.is_some() {
            specificity |= SpecificityMask::DOMAIN;
        }
        if intents.is_some() {
            specificity |= SpecificityMask::INTENT;
        }
        match &entities {
            Some(EntityFilter::ByType(_)) => specificity |= SpecificityMask::ENTITY_TYPES,
            Some(EntityFilter::ByValue(_)) => specificity |= SpecificityMask::ENTITY_VALUES,
            None => {}
        }

        Ok(Rule { state, domains, intents, entities, specificity })
    }

    /// Name of the dialogue state selected when this rule matches.
    pub fn state(&self) -> &str {
        &self.state
    }

    /// Configured filter categories as bit flags; `bits()` is the integer
    /// specificity score (0–15) used for ordering.
    pub fn specificity(&self) -> SpecificityMask {
        self.specificity
    }

    pub fn domains(&self) -> Option<&BTreeSet<String>> {
        self.domains.as_ref()
    }

    pub fn intents(&self) -> Option<&BTreeSet<String>> {
        self.intents.as_ref()
    }

    pub fn entities(&self) -> Option<&EntityFilter> {
        self.entities.as_ref()
    }

    /// Apply this rule to `context`: true iff every configured filter is
    /// satisfied. Filters not configured are vacuously satisfied, so a rule
    /// with no filters matches everything.
    ///
    /// Pure: same rule and context always produce the same answer.
    pub fn matches(&self, context: &Context) -> bool {
        if let Some(domains) = &self.domains {
            if !domains.contains(&context.domain) {
                return false;
            }
        }

        if let Some(intents) = &self.intents {
            if !intents.contains(&context.intent) {
                return false;
            }
        }

        match &self.entities {
            Some(EntityFilter::ByType(required)) => {
                let present: BTreeSet<&str> =
                    context.entities.iter().map(|e| e.entity_type.as_str()).collect();
                if !required.iter().all(|t| present.contains(t.as_str())) {
                    return false;
                }
            }
            Some(EntityFilter::ByValue(required)) => {
                // Each pair needs its own witness: an entity with the right
                // type but the wrong value does not count, and is never
                // substituted for another pair.
                for (entity_type, value) in required {
                    let satisfied = context
                        .entities
                        .iter()
                        .any(|e| e.entity_type == *entity_type && e.value.as_str() == Some(value));
                    if !satisfied {
                        return false;
                    }
                }
            }
            None => {}
        }

        true
    }
}

fn resolve_pair(
    single_key: &str,
    single: Option<String>,
    plural_key: &str,
    plural: Option<BTreeSet<String>>,
) -> Result<Option<BTreeSet<String>>, Error> {
    match (single, plural) {
        (Some(_), Some(_)) => Err(only_one_of(single_key, plural_key)),
        (Some(value), None) => Ok(Some(BTreeSet::from([value]))),
        (None, plural) => Ok(plural),
    }
}

fn only_one_of(single_key: &str, plural_key: &str) -> Error {
    Error::InvalidSpecification(format!(
        "only one of `{single_key}` and `{plural_key}` may be specified for a dialogue state rule"
    ))
}

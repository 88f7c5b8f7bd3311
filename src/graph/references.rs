//! ID Reference Inference
//!
//! Two phases, kept apart on purpose because a referencer may be declared
//! before its target:
//!
//! 1. **Collect** ([`ReferenceCollector`]): every field named `id` makes its
//!    owner an identity target keyed by lower-cased local name; every field
//!    ending in `id`/`ids` becomes a [`ReferenceCandidate`].
//! 2. **Resolve** ([`resolve`]): candidates are matched against the complete
//!    target map, exactly first and then by substring in either direction.
//!
//! Unresolved candidates are dropped. Schemas are full of external
//! identifiers with no modeled counterpart, so that is never an error.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use tracing::debug;

use super::{local_part, ReferenceEdge, TypeName};

// =============================================================================
// Identity Targets
// =============================================================================

/// What a short name points at
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityTarget {
    Unique(TypeName),
    /// Two or more types share the short name. Permanent.
    Ambiguous,
}

impl IdentityTarget {
    pub fn type_name(&self) -> Option<&TypeName> {
        match self {
            IdentityTarget::Unique(name) => Some(name),
            IdentityTarget::Ambiguous => None,
        }
    }
}

/// Lower-cased short name -> identity target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IdentityTargets {
    targets: BTreeMap<String, IdentityTarget>,
}

impl IdentityTargets {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `type_name` as exposing an `id` field.
    pub fn insert(&mut self, type_name: &str) {
        let short_name = local_part(type_name).to_lowercase();
        match self.targets.entry(short_name) {
            Entry::Vacant(slot) => {
                slot.insert(IdentityTarget::Unique(type_name.to_string()));
            }
            Entry::Occupied(mut slot) => {
                if slot.get().type_name().map(String::as_str) != Some(type_name) {
                    debug!(short_name = %slot.key(), %type_name, "identity target is ambiguous");
                    slot.insert(IdentityTarget::Ambiguous);
                }
            }
        }
    }

    pub fn get(&self, short_name: &str) -> Option<&IdentityTarget> {
        self.targets.get(short_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &IdentityTarget)> {
        self.targets.iter()
    }

    pub fn len(&self) -> usize {
        self.targets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

// =============================================================================
// Field Roles
// =============================================================================

/// How a field name takes part in reference inference
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldRole {
    /// The field is literally `id`
    Identity,
    /// The field names another entity; carries the destination token
    Reference(String),
}

/// Classify a field name by the `id` / `...Id` / `...Ids` convention.
pub fn classify_field(field_name: &str) -> Option<FieldRole> {
    let lower = field_name.to_lowercase();
    if lower == "id" {
        return Some(FieldRole::Identity);
    }
    lower
        .strip_suffix("ids")
        .or_else(|| lower.strip_suffix("id"))
        .map(|token| FieldRole::Reference(token.to_string()))
}

/// A reference field waiting to be matched
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ReferenceCandidate {
    pub referencer: TypeName,
    pub destination_token: String,
    pub via_field: String,
}

// =============================================================================
// Collect Phase
// =============================================================================

/// Accumulates identity targets and reference candidates field by field
#[derive(Debug, Default)]
pub struct ReferenceCollector {
    targets: IdentityTargets,
    candidates: Vec<ReferenceCandidate>,
    fold_underscores: bool,
}

impl ReferenceCollector {
    /// `fold_underscores` removes `_` from destination tokens, so
    /// `donor_id` looks for `donor`.
    pub fn new(fold_underscores: bool) -> Self {
        Self {
            fold_underscores,
            ..Self::default()
        }
    }

    /// Look at one field of a registered type.
    pub fn observe(&mut self, owner: &str, field_name: &str) {
        match classify_field(field_name) {
            Some(FieldRole::Identity) => self.targets.insert(owner),
            Some(FieldRole::Reference(token)) => {
                let token = if self.fold_underscores {
                    token.replace('_', "")
                } else {
                    token
                };
                // A bare `ids` keeps an empty token, which only a lone
                // identity target can satisfy.
                self.candidates.push(ReferenceCandidate {
                    referencer: owner.to_string(),
                    destination_token: token,
                    via_field: field_name.to_string(),
                });
            }
            None => {}
        }
    }

    pub fn finish(self) -> (IdentityTargets, Vec<ReferenceCandidate>) {
        (self.targets, self.candidates)
    }
}

// =============================================================================
// Resolve Phase
// =============================================================================

/// Match candidates against the complete identity target map.
///
/// With `fuzzy` disabled only exact short-name matches produce edges.
pub fn resolve(
    candidates: &[ReferenceCandidate],
    targets: &IdentityTargets,
    fuzzy: bool,
) -> BTreeSet<ReferenceEdge> {
    candidates
        .iter()
        .filter_map(|candidate| {
            let referencee = match_candidate(candidate, targets, fuzzy)?;
            Some(ReferenceEdge {
                referencer: candidate.referencer.clone(),
                referencee: referencee.clone(),
                via_field: candidate.via_field.clone(),
            })
        })
        .collect()
}

fn match_candidate<'t>(
    candidate: &ReferenceCandidate,
    targets: &'t IdentityTargets,
    fuzzy: bool,
) -> Option<&'t TypeName> {
    let token = candidate.destination_token.as_str();

    if let Some(target) = targets.get(token) {
        if target.type_name().is_none() {
            debug!(referencer = %candidate.referencer, %token, "reference to ambiguous target");
        }
        return target.type_name();
    }

    if !fuzzy {
        debug!(referencer = %candidate.referencer, %token, "no exact target");
        return None;
    }

    let partial: Vec<(&String, &IdentityTarget)> = targets
        .iter()
        .filter(|(key, _)| token.contains(key.as_str()) || key.contains(token))
        .collect();

    match partial[..] {
        [(key, target)] => {
            if let Some(name) = target.type_name() {
                debug!(referencer = %candidate.referencer, %token, %key, target = %name, "partial target match");
            }
            target.type_name()
        }
        [] => {
            debug!(referencer = %candidate.referencer, %token, "no target");
            None
        }
        _ => {
            debug!(
                referencer = %candidate.referencer,
                %token,
                matches = partial.len(),
                "ambiguous partial target match"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(referencer: &str, token: &str, field: &str) -> ReferenceCandidate {
        ReferenceCandidate {
            referencer: referencer.to_string(),
            destination_token: token.to_string(),
            via_field: field.to_string(),
        }
    }

    #[test]
    fn test_classify_field() {
        assert_eq!(classify_field("id"), Some(FieldRole::Identity));
        assert_eq!(classify_field("ID"), Some(FieldRole::Identity));
        assert_eq!(
            classify_field("sampleId"),
            Some(FieldRole::Reference("sample".to_string()))
        );
        assert_eq!(
            classify_field("sampleIds"),
            Some(FieldRole::Reference("sample".to_string()))
        );
        assert_eq!(classify_field("name"), None);
    }

    #[test]
    fn test_identity_becomes_ambiguous() {
        let mut targets = IdentityTargets::new();
        targets.insert("a.Foo");
        assert_eq!(
            targets.get("foo"),
            Some(&IdentityTarget::Unique("a.Foo".to_string()))
        );

        // Same type again keeps it unique
        targets.insert("a.Foo");
        assert_eq!(targets.get("foo").and_then(|t| t.type_name()).unwrap(), "a.Foo");

        targets.insert("b.Foo");
        assert_eq!(targets.get("foo"), Some(&IdentityTarget::Ambiguous));

        // No way back
        targets.insert("a.Foo");
        assert_eq!(targets.get("foo"), Some(&IdentityTarget::Ambiguous));
    }

    #[test]
    fn test_collector_folds_underscores() {
        let mut collector = ReferenceCollector::new(true);
        collector.observe("Sample", "donor_id");
        collector.observe("Sample", "_id");
        let (_, candidates) = collector.finish();
        assert_eq!(
            candidates,
            vec![
                candidate("Sample", "donor", "donor_id"),
                candidate("Sample", "", "_id"),
            ]
        );
    }

    #[test]
    fn test_bare_ids_field_is_a_candidate() {
        let mut collector = ReferenceCollector::new(false);
        collector.observe("Batch", "ids");
        collector.observe("Batch", "Id");
        let (targets, candidates) = collector.finish();
        // `Id` is the identity field itself
        assert_eq!(targets.get("batch"), Some(&IdentityTarget::Unique("Batch".to_string())));
        assert_eq!(candidates, vec![candidate("Batch", "", "ids")]);
    }

    #[test]
    fn test_empty_token_needs_a_single_target() {
        let mut targets = IdentityTargets::new();
        targets.insert("Donor");
        let candidates = [candidate("Batch", "", "ids")];

        let edges = resolve(&candidates, &targets, true);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges.iter().next().unwrap().referencee, "Donor");
        assert!(resolve(&candidates, &targets, false).is_empty());

        targets.insert("Sample");
        assert!(resolve(&candidates, &targets, true).is_empty());
    }

    #[test]
    fn test_collector_keeps_underscores_by_default() {
        let mut collector = ReferenceCollector::new(false);
        collector.observe("Sample", "donor_id");
        let (_, candidates) = collector.finish();
        assert_eq!(candidates[0].destination_token, "donor_");
    }

    #[test]
    fn test_exact_match() {
        let mut targets = IdentityTargets::new();
        targets.insert("org.Sample");
        let edges = resolve(&[candidate("X", "sample", "sampleId")], &targets, true);
        assert_eq!(edges.len(), 1);
        let edge = edges.iter().next().unwrap();
        assert_eq!(edge.referencee, "org.Sample");
        assert_eq!(edge.via_field, "sampleId");
    }

    #[test]
    fn test_fuzzy_single_match() {
        let mut targets = IdentityTargets::new();
        targets.insert("Sample");
        let candidates = [candidate("X", "biosample", "biosampleId")];

        let edges = resolve(&candidates, &targets, true);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges.iter().next().unwrap().referencee, "Sample");

        assert!(resolve(&candidates, &targets, false).is_empty());

        targets.insert("BioSampleSet");
        assert!(resolve(&candidates, &targets, true).is_empty());
    }

    #[test]
    fn test_fuzzy_match_in_either_direction() {
        let mut targets = IdentityTargets::new();
        targets.insert("VariantSet");
        let edges = resolve(&[candidate("X", "variant", "variantId")], &targets, true);
        assert_eq!(edges.iter().next().unwrap().referencee, "VariantSet");
    }

    #[test]
    fn test_ambiguous_targets_never_resolve() {
        let mut targets = IdentityTargets::new();
        targets.insert("a.Foo");
        targets.insert("b.Foo");

        assert!(resolve(&[candidate("X", "foo", "fooId")], &targets, true).is_empty());
        // Single partial match on an ambiguous key is still nothing
        assert!(resolve(&[candidate("X", "foobar", "foobarId")], &targets, true).is_empty());
    }

    #[test]
    fn test_ambiguous_exact_key_skips_partial_matching() {
        let mut targets = IdentityTargets::new();
        targets.insert("a.Foo");
        targets.insert("b.Foo");
        targets.insert("FooBar");

        // "foobar" would be the only unambiguous partial hit
        assert!(resolve(&[candidate("X", "foo", "fooId")], &targets, true).is_empty());
    }

    #[test]
    fn test_unmatched_candidate_is_dropped() {
        let mut targets = IdentityTargets::new();
        targets.insert("Donor");
        assert!(resolve(&[candidate("X", "ensembl", "ensemblId")], &targets, true).is_empty());
    }
}

//! Schema Relationship Graph
//!
//! Resolves schema sources into the collections a UML renderer needs:
//!
//! - **types**: every registered type with its fields and display types
//! - **containments**: "has-a" edges found by walking field types
//! - **references**: "points-to" edges inferred from `id` / `...Id` naming
//! - **groupings**: which source each type first came from (optional)
//!
//! Resolution is two-phase. [`registry::collect`] makes one linear pass over
//! all sources; [`references::resolve`] then matches reference candidates
//! against the complete identity target map, so a referencer may be declared
//! before its target.

pub mod normalize;
pub mod references;
pub mod registry;

pub use normalize::{extract_user_types, normalize, to_display_string, NormalizedType, UserTypes};
pub use references::{
    classify_field, FieldRole, IdentityTarget, IdentityTargets, ReferenceCandidate,
    ReferenceCollector,
};
pub use registry::{collect, Collected, RegistryBuilder, TypeRegistry};

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

use crate::error::Result;
use crate::schema::SchemaSource;

/// Fully qualified type name: `namespace.LocalName`, or `LocalName`
pub type TypeName = String;

/// Qualify `name` with `namespace` unless it is already dotted.
pub fn qualify(namespace: Option<&str>, name: &str) -> TypeName {
    match namespace {
        Some(ns) if !ns.is_empty() && !name.contains('.') => format!("{}.{}", ns, name),
        _ => name.to_string(),
    }
}

/// The segment after the last dot
pub fn local_part(type_name: &str) -> &str {
    type_name.rsplit('.').next().unwrap_or(type_name)
}

/// One field of a registered type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldEntry {
    pub name: String,
    /// Canonical rendering, e.g. `union<null,array<Call>>`
    pub type_display: String,
}

/// `owner` has-a `contained` through `via_field`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ContainmentEdge {
    pub owner: TypeName,
    pub contained: TypeName,
    pub via_field: String,
}

/// `referencer` names a `referencee` by identifier in `via_field`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ReferenceEdge {
    pub referencer: TypeName,
    pub referencee: TypeName,
    pub via_field: String,
}

/// Types first registered while processing one source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grouping {
    pub label: String,
    pub types: Vec<TypeName>,
}

/// Knobs for a resolver run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveOptions {
    /// Display user types by local name only
    #[serde(default)]
    pub strip_namespace: bool,
    /// Fall back to substring matching when no exact identity target exists
    #[serde(default = "default_true")]
    pub fuzzy_matching: bool,
    /// Drop `_` from reference tokens (`donor_id` -> `donor`)
    #[serde(default)]
    pub fold_underscores: bool,
    /// Record a grouping per source label
    #[serde(default)]
    pub group_by_source: bool,
}

fn default_true() -> bool {
    true
}

impl Default for ResolveOptions {
    fn default() -> Self {
        Self {
            strip_namespace: false,
            fuzzy_matching: true,
            fold_underscores: false,
            group_by_source: false,
        }
    }
}

/// The resolver's output. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedGraph {
    pub types: TypeRegistry,
    pub containments: BTreeSet<ContainmentEdge>,
    pub references: BTreeSet<ReferenceEdge>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groupings: Vec<Grouping>,
}

impl ResolvedGraph {
    /// Get type count
    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    /// Get edge count (containments plus references)
    pub fn edge_count(&self) -> usize {
        self.containments.len() + self.references.len()
    }

    /// Containment edges leaving `owner`
    pub fn containments_of<'a>(&'a self, owner: &'a str) -> impl Iterator<Item = &'a ContainmentEdge> {
        self.containments.iter().filter(move |edge| edge.owner == owner)
    }

    /// Reference edges leaving `referencer`
    pub fn references_of<'a>(&'a self, referencer: &'a str) -> impl Iterator<Item = &'a ReferenceEdge> {
        self.references.iter().filter(move |edge| edge.referencer == referencer)
    }

    /// SHA-256 of the serialized graph; equal inputs give equal fingerprints
    pub fn fingerprint(&self) -> Result<String> {
        let bytes = serde_json::to_vec(self)?;
        Ok(format!("{:x}", Sha256::digest(&bytes)))
    }
}

/// Stateless entry point; each call starts from empty collections
#[derive(Debug, Clone, Default)]
pub struct Resolver {
    options: ResolveOptions,
}

impl Resolver {
    pub fn new(options: ResolveOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ResolveOptions {
        &self.options
    }

    /// Resolve sources, given in processing order.
    ///
    /// Fails on the first malformed field type; no partial graph is returned.
    pub fn resolve(&self, sources: &[SchemaSource]) -> Result<ResolvedGraph> {
        let collected = collect(sources, &self.options)?;
        let references = references::resolve(
            &collected.candidates,
            &collected.identity_targets,
            self.options.fuzzy_matching,
        );

        info!(
            types = collected.types.len(),
            containments = collected.containments.len(),
            identity_targets = collected.identity_targets.len(),
            candidates = collected.candidates.len(),
            references = references.len(),
            "resolved schema graph"
        );

        Ok(ResolvedGraph {
            types: collected.types,
            containments: collected.containments,
            references,
            groupings: collected.groupings,
        })
    }
}

/// Resolve with the given options
pub fn resolve(sources: &[SchemaSource], options: &ResolveOptions) -> Result<ResolvedGraph> {
    Resolver::new(options.clone()).resolve(sources)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualify() {
        assert_eq!(qualify(Some("org.ga4gh"), "Read"), "org.ga4gh.Read");
        assert_eq!(qualify(Some("org.ga4gh"), "other.Read"), "other.Read");
        assert_eq!(qualify(None, "Read"), "Read");
        assert_eq!(qualify(Some(""), "Read"), "Read");
    }

    #[test]
    fn test_local_part() {
        assert_eq!(local_part("org.ga4gh.Read"), "Read");
        assert_eq!(local_part("Read"), "Read");
    }

    #[test]
    fn test_empty_input() {
        let graph = Resolver::default().resolve(&[]).unwrap();
        assert_eq!(graph.type_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.groupings.is_empty());
    }
}

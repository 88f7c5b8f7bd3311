//! Type Registry
//!
//! Single linear pass over the schema sources. Registers each entity under
//! its fully qualified name (first declaration wins), normalizes its fields,
//! emits containment edges, feeds the reference collector and, when asked,
//! records which source grouping a type first appeared in.

use std::collections::{BTreeSet, HashMap};

use serde::ser::{Serialize, SerializeMap, Serializer};
use tracing::debug;

use crate::error::Result;
use crate::schema::{EntityDecl, SchemaSource};

use super::normalize::normalize;
use super::references::{IdentityTargets, ReferenceCandidate, ReferenceCollector};
use super::{qualify, ContainmentEdge, FieldEntry, Grouping, ResolveOptions, TypeName};

// =============================================================================
// Type Registry
// =============================================================================

/// Registered types and their fields, in registration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeRegistry {
    order: Vec<TypeName>,
    fields: HashMap<TypeName, Vec<FieldEntry>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty field list. Returns `false` if already present.
    pub(crate) fn register(&mut self, type_name: &str) -> bool {
        if self.fields.contains_key(type_name) {
            return false;
        }
        self.order.push(type_name.to_string());
        self.fields.insert(type_name.to_string(), Vec::new());
        true
    }

    pub(crate) fn push_field(&mut self, type_name: &str, entry: FieldEntry) {
        if let Some(fields) = self.fields.get_mut(type_name) {
            fields.push(entry);
        }
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.fields.contains_key(type_name)
    }

    /// Fields of a type, in declaration order
    pub fn get(&self, type_name: &str) -> Option<&[FieldEntry]> {
        self.fields.get(type_name).map(Vec::as_slice)
    }

    /// All types with their fields, in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&TypeName, &[FieldEntry])> {
        self.order
            .iter()
            .filter_map(|name| self.fields.get(name).map(|fields| (name, fields.as_slice())))
    }

    pub fn type_names(&self) -> &[TypeName] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl Serialize for TypeRegistry {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, fields) in self.iter() {
            map.serialize_entry(name, fields)?;
        }
        map.end()
    }
}

// =============================================================================
// Collect Phase
// =============================================================================

/// Everything the first pass produces; reference edges come later
#[derive(Debug, Default)]
pub struct Collected {
    pub types: TypeRegistry,
    pub containments: BTreeSet<ContainmentEdge>,
    pub identity_targets: IdentityTargets,
    pub candidates: Vec<ReferenceCandidate>,
    pub groupings: Vec<Grouping>,
}

/// Folds schema sources into a [`Collected`]
pub struct RegistryBuilder<'o> {
    options: &'o ResolveOptions,
    types: TypeRegistry,
    containments: BTreeSet<ContainmentEdge>,
    references: ReferenceCollector,
    groupings: Vec<Grouping>,
    /// Explicit labels, never handed out to unlabelled sources
    reserved_labels: BTreeSet<String>,
    sources_seen: usize,
}

impl<'o> RegistryBuilder<'o> {
    pub fn new(options: &'o ResolveOptions) -> Self {
        Self {
            options,
            types: TypeRegistry::new(),
            containments: BTreeSet::new(),
            references: ReferenceCollector::new(options.fold_underscores),
            groupings: Vec::new(),
            reserved_labels: BTreeSet::new(),
            sources_seen: 0,
        }
    }

    /// Keep `labels` away from the `source_<n>` names given to unlabelled
    /// sources. Call before adding sources that carry these labels.
    pub fn reserve_labels<'s>(&mut self, labels: impl IntoIterator<Item = &'s str>) {
        self.reserved_labels
            .extend(labels.into_iter().map(str::to_string));
    }

    /// Process one source. Sources must be added in their fixed order.
    pub fn add_source(&mut self, source: &SchemaSource) -> Result<()> {
        let group = if self.options.group_by_source {
            Some(match &source.label {
                Some(label) => {
                    self.reserved_labels.insert(label.clone());
                    self.group_index(label.clone())
                }
                None => self.unlabelled_group(),
            })
        } else {
            None
        };
        self.sources_seen += 1;

        for entity in &source.entities {
            self.add_entity(entity, source.namespace.as_deref(), group)?;
        }
        Ok(())
    }

    fn group_index(&mut self, label: String) -> usize {
        if let Some(index) = self.groupings.iter().position(|g| g.label == label) {
            return index;
        }
        self.groupings.push(Grouping {
            label,
            types: Vec::new(),
        });
        self.groupings.len() - 1
    }

    /// A fresh grouping named after the source's position. Unlabelled
    /// sources never share a grouping.
    fn unlabelled_group(&mut self) -> usize {
        let base = format!("source_{}", self.sources_seen);
        let mut label = base.clone();
        let mut suffix = 1;
        while self.reserved_labels.contains(&label) || self.groupings.iter().any(|g| g.label == label) {
            label = format!("{}_{}", base, suffix);
            suffix += 1;
        }
        self.groupings.push(Grouping {
            label,
            types: Vec::new(),
        });
        self.groupings.len() - 1
    }

    fn add_entity(
        &mut self,
        entity: &EntityDecl,
        default_namespace: Option<&str>,
        group: Option<usize>,
    ) -> Result<()> {
        let namespace = entity.effective_namespace(default_namespace);
        let type_name = qualify(namespace, &entity.name);

        if !self.types.register(&type_name) {
            debug!(%type_name, "skipping duplicate declaration");
            return Ok(());
        }

        if let Some(index) = group {
            self.groupings[index].types.push(type_name.clone());
        }

        for field in entity.resolver_fields() {
            let normalized = normalize(&field.ty, namespace, self.options.strip_namespace)
                .map_err(|e| e.in_field(&type_name, &field.name))?;

            for contained in normalized.user_types {
                self.containments.insert(ContainmentEdge {
                    owner: type_name.clone(),
                    contained,
                    via_field: field.name.clone(),
                });
            }

            self.references.observe(&type_name, &field.name);
            self.types.push_field(
                &type_name,
                FieldEntry {
                    name: field.name,
                    type_display: normalized.display,
                },
            );
        }
        Ok(())
    }

    pub fn finish(self) -> Collected {
        let (identity_targets, candidates) = self.references.finish();
        Collected {
            types: self.types,
            containments: self.containments,
            identity_targets,
            candidates,
            groupings: self.groupings,
        }
    }
}

/// Run the collect phase over all sources in order.
pub fn collect(sources: &[SchemaSource], options: &ResolveOptions) -> Result<Collected> {
    let mut builder = RegistryBuilder::new(options);
    builder.reserve_labels(sources.iter().filter_map(|s| s.label.as_deref()));
    for source in sources {
        builder.add_source(source)?;
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SchemaError;
    use crate::schema::{FieldDecl, TypeExpr};

    fn string_field(name: &str) -> FieldDecl {
        FieldDecl::new(name, TypeExpr::primitive("string"))
    }

    #[test]
    fn test_first_declaration_wins() {
        let first = SchemaSource::new(
            Some("org.ga4gh".into()),
            vec![EntityDecl::record("Read", vec![string_field("id")])],
        );
        let second = SchemaSource::new(
            Some("org.ga4gh".into()),
            vec![EntityDecl::record(
                "Read",
                vec![string_field("other"), string_field("readGroupId")],
            )],
        );

        let collected = collect(&[first, second], &ResolveOptions::default()).unwrap();
        assert_eq!(collected.types.len(), 1);
        let fields = collected.types.get("org.ga4gh.Read").unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "id");
        // The skipped declaration contributes no candidates either
        assert!(collected.candidates.is_empty());
    }

    #[test]
    fn test_containment_per_field() {
        let source = SchemaSource::new(
            None,
            vec![EntityDecl::record(
                "Pair",
                vec![
                    FieldDecl::new("left", TypeExpr::named("Node")),
                    FieldDecl::new("right", TypeExpr::named("Node")),
                    FieldDecl::new(
                        "either",
                        TypeExpr::Union(vec![TypeExpr::named("Node"), TypeExpr::named("Node")]),
                    ),
                ],
            )],
        );

        let collected = collect(&[source], &ResolveOptions::default()).unwrap();
        let fields: Vec<&str> = collected
            .containments
            .iter()
            .map(|edge| edge.via_field.as_str())
            .collect();
        assert_eq!(fields, vec!["either", "left", "right"]);
    }

    #[test]
    fn test_registration_order_is_kept() {
        let source = SchemaSource::new(
            None,
            vec![
                EntityDecl::record("Zeta", Vec::new()),
                EntityDecl::enumeration("Alpha", vec!["A".into()]),
                EntityDecl::record("Mid", Vec::new()),
            ],
        );
        let collected = collect(&[source], &ResolveOptions::default()).unwrap();
        assert_eq!(collected.types.type_names(), &["Zeta", "Alpha", "Mid"]);
        assert_eq!(collected.types.get("Alpha").unwrap()[0].type_display, "string");
    }

    #[test]
    fn test_groupings_follow_first_registration() {
        let options = ResolveOptions {
            group_by_source: true,
            ..ResolveOptions::default()
        };
        let common = SchemaSource::new(None, vec![EntityDecl::record("Position", Vec::new())])
            .with_label("common.avdl");
        let reads = SchemaSource::new(
            None,
            vec![
                EntityDecl::record("Position", Vec::new()),
                EntityDecl::record("ReadAlignment", Vec::new()),
            ],
        )
        .with_label("reads.avdl");

        let collected = collect(&[common, reads], &options).unwrap();
        assert_eq!(collected.groupings.len(), 2);
        assert_eq!(collected.groupings[0].label, "common.avdl");
        assert_eq!(collected.groupings[0].types, vec!["Position"]);
        assert_eq!(collected.groupings[1].types, vec!["ReadAlignment"]);
    }

    #[test]
    fn test_unlabelled_sources_get_distinct_groupings() {
        let options = ResolveOptions {
            group_by_source: true,
            ..ResolveOptions::default()
        };
        let sources = [
            SchemaSource::new(None, vec![EntityDecl::record("A", Vec::new())]),
            SchemaSource::new(None, vec![EntityDecl::record("B", Vec::new())]),
            SchemaSource::new(None, vec![EntityDecl::record("C", Vec::new())]).with_label("source_1"),
        ];

        let collected = collect(&sources, &options).unwrap();
        let labels: Vec<_> = collected.groupings.iter().map(|g| g.label.as_str()).collect();
        assert_eq!(labels, vec!["source_0", "source_1_1", "source_1"]);
        assert_eq!(collected.groupings[1].types, vec!["B"]);
        assert_eq!(collected.groupings[2].types, vec!["C"]);
    }

    #[test]
    fn test_no_groupings_unless_requested() {
        let source = SchemaSource::new(None, vec![EntityDecl::record("Position", Vec::new())])
            .with_label("common.avdl");
        let collected = collect(&[source], &ResolveOptions::default()).unwrap();
        assert!(collected.groupings.is_empty());
    }

    #[test]
    fn test_malformed_field_names_entity_and_field() {
        let source = SchemaSource::new(
            Some("org.ga4gh".into()),
            vec![EntityDecl::record(
                "Call",
                vec![FieldDecl::new(
                    "info",
                    TypeExpr::Composite {
                        kind: "record".into(),
                        inner: None,
                    },
                )],
            )],
        );

        let err = collect(&[source], &ResolveOptions::default()).unwrap_err();
        match err {
            SchemaError::MalformedField { entity, field, kind } => {
                assert_eq!(entity, "org.ga4gh.Call");
                assert_eq!(field, "info");
                assert_eq!(kind, "record");
            }
            other => panic!("Expected MalformedField, got {:?}", other),
        }
    }
}

//! Schema source types
//!
//! The front-end-neutral input of the resolver: one [`SchemaSource`] per
//! protocol file or descriptor file, each holding ordered entity declarations
//! with raw (not yet normalized) field types.

use serde::{Deserialize, Serialize};

/// Kind of a declared entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Avro record/error, protobuf message
    Record,
    /// Avro enum, protobuf enum
    Enum,
}

/// A raw field type expression, possibly nested
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeExpr {
    /// A built-in type name (`string`, `long`, `int64`, ...)
    Primitive(String),
    /// A user-defined type, unqualified or dot-qualified
    Named(String),
    /// A tagged union; elements keep their declared order
    Union(Vec<TypeExpr>),
    /// A structural wrapper around one inner type. Only `array` and `map`
    /// kinds are well formed; anything else fails normalization.
    Composite {
        kind: String,
        inner: Option<Box<TypeExpr>>,
    },
}

impl TypeExpr {
    pub fn primitive(name: impl Into<String>) -> Self {
        TypeExpr::Primitive(name.into())
    }

    pub fn named(name: impl Into<String>) -> Self {
        TypeExpr::Named(name.into())
    }

    pub fn array(items: TypeExpr) -> Self {
        TypeExpr::Composite {
            kind: "array".to_string(),
            inner: Some(Box::new(items)),
        }
    }

    /// Map of string keys to `values`
    pub fn map(values: TypeExpr) -> Self {
        TypeExpr::Composite {
            kind: "map".to_string(),
            inner: Some(Box::new(values)),
        }
    }
}

/// A single field of a record-like entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub ty: TypeExpr,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, ty: TypeExpr) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// A declared entity (record-like or enumeration-like)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDecl {
    /// Local (unqualified) name
    pub name: String,
    /// Namespace override; `None` inherits the source namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub kind: EntityKind,
    /// Record fields in declaration order (empty for enums)
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
    /// Enum symbols in declaration order (empty for records)
    #[serde(default)]
    pub symbols: Vec<String>,
}

impl EntityDecl {
    /// Create a record with the given fields
    pub fn record(name: impl Into<String>, fields: Vec<FieldDecl>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind: EntityKind::Record,
            fields,
            symbols: Vec::new(),
        }
    }

    /// Create an enumeration with the given symbols
    pub fn enumeration(name: impl Into<String>, symbols: Vec<String>) -> Self {
        Self {
            name: name.into(),
            namespace: None,
            kind: EntityKind::Enum,
            fields: Vec::new(),
            symbols,
        }
    }

    /// Set the namespace override
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// The namespace this entity lives in, given its source's default
    pub fn effective_namespace<'a>(&'a self, default: Option<&'a str>) -> Option<&'a str> {
        self.namespace.as_deref().or(default)
    }

    /// Fields as the resolver sees them. Enum symbols become string-typed
    /// fields so they can be displayed like record fields.
    pub fn resolver_fields(&self) -> Vec<FieldDecl> {
        match self.kind {
            EntityKind::Record => self.fields.clone(),
            EntityKind::Enum => self
                .symbols
                .iter()
                .map(|symbol| FieldDecl::new(symbol.clone(), TypeExpr::primitive("string")))
                .collect(),
        }
    }
}

/// One schema source: a protocol file, a descriptor file, or a cluster
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaSource {
    /// Grouping label (cluster name) for this source
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Default namespace for entities without an override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Entity declarations in source order
    pub entities: Vec<EntityDecl>,
}

impl SchemaSource {
    pub fn new(namespace: Option<String>, entities: Vec<EntityDecl>) -> Self {
        Self {
            label: None,
            namespace,
            entities,
        }
    }

    /// Set the grouping label
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_symbols_become_string_fields() {
        let entity = EntityDecl::enumeration("Strand", vec!["POS".into(), "NEG".into()]);
        let fields = entity.resolver_fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "POS");
        assert_eq!(fields[1].ty, TypeExpr::primitive("string"));
    }

    #[test]
    fn test_effective_namespace() {
        let plain = EntityDecl::record("Read", Vec::new());
        assert_eq!(plain.effective_namespace(Some("org.ga4gh")), Some("org.ga4gh"));

        let overridden = plain.in_namespace("org.other");
        assert_eq!(overridden.effective_namespace(Some("org.ga4gh")), Some("org.other"));
        assert_eq!(overridden.effective_namespace(None), Some("org.other"));
    }
}

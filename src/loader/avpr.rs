//! Avro Protocol (AVPR) Front End
//!
//! Reads protocol JSON as emitted by `avro-tools idl` and turns its named
//! types into [`EntityDecl`]s.

use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::error::{Result, SchemaError};
use crate::schema::{EntityDecl, FieldDecl, SchemaSource, TypeExpr};

/// Avro primitive type names
pub const AVRO_PRIMITIVES: &[&str] = &[
    "int", "long", "string", "boolean", "float", "double", "null", "bytes",
];

#[derive(Debug, Clone, Deserialize)]
struct ProtocolJson {
    #[serde(default)]
    namespace: Option<String>,
    #[serde(default)]
    types: Vec<NamedTypeJson>,
}

#[derive(Debug, Clone, Deserialize)]
struct NamedTypeJson {
    name: String,
    #[serde(default)]
    namespace: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    fields: Vec<FieldJson>,
    #[serde(default)]
    symbols: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldJson {
    name: String,
    #[serde(rename = "type")]
    ty: Value,
}

/// Parse protocol JSON. `path` is only used in error messages.
pub fn parse_protocol(content: &str, path: &Path) -> Result<SchemaSource> {
    let protocol: ProtocolJson = serde_json::from_str(content).map_err(|e| SchemaError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let entities = protocol
        .types
        .into_iter()
        .map(|named| {
            let entity = match named.kind.as_str() {
                "enum" => EntityDecl::enumeration(named.name, named.symbols),
                // record, error, fixed: fixed simply has no fields
                _ => EntityDecl::record(
                    named.name,
                    named
                        .fields
                        .iter()
                        .map(|field| FieldDecl::new(field.name.clone(), type_expr(&field.ty)))
                        .collect(),
                ),
            };
            match named.namespace {
                Some(ns) => entity.in_namespace(ns),
                None => entity,
            }
        })
        .collect();

    Ok(SchemaSource::new(protocol.namespace, entities))
}

/// Convert an Avro field type as found in JSON.
///
/// Objects other than `array`/`map` become composites of unknown kind and
/// are rejected later, during normalization.
pub fn type_expr(value: &Value) -> TypeExpr {
    match value {
        Value::String(name) if AVRO_PRIMITIVES.contains(&name.as_str()) => {
            TypeExpr::primitive(name.clone())
        }
        Value::String(name) => TypeExpr::named(name.clone()),
        Value::Array(options) => TypeExpr::Union(options.iter().map(type_expr).collect()),
        Value::Object(object) => {
            let kind = object
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let inner = match kind.as_str() {
                "array" => object.get("items"),
                "map" => object.get("values"),
                _ => None,
            };
            TypeExpr::Composite {
                kind,
                inner: inner.map(|inner| Box::new(type_expr(inner))),
            }
        }
        other => TypeExpr::Composite {
            kind: other.to_string(),
            inner: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::EntityKind;
    use serde_json::json;

    #[test]
    fn test_type_expr_variants() {
        assert_eq!(type_expr(&json!("long")), TypeExpr::primitive("long"));
        assert_eq!(type_expr(&json!("Variant")), TypeExpr::named("Variant"));
        assert_eq!(
            type_expr(&json!(["null", {"type": "array", "items": "Call"}])),
            TypeExpr::Union(vec![
                TypeExpr::primitive("null"),
                TypeExpr::array(TypeExpr::named("Call")),
            ])
        );
        assert_eq!(
            type_expr(&json!({"type": "map", "values": {"type": "array", "items": "string"}})),
            TypeExpr::map(TypeExpr::array(TypeExpr::primitive("string")))
        );
    }

    #[test]
    fn test_inline_record_is_unknown_composite() {
        let expr = type_expr(&json!({"type": "record", "name": "Inline", "fields": []}));
        assert_eq!(
            expr,
            TypeExpr::Composite {
                kind: "record".to_string(),
                inner: None,
            }
        );
    }

    #[test]
    fn test_parse_protocol() {
        let content = json!({
            "protocol": "Reads",
            "namespace": "org.ga4gh",
            "types": [
                {"type": "enum", "name": "Strand", "symbols": ["POS_STRAND", "NEG_STRAND"]},
                {"type": "record", "name": "Position", "namespace": "org.ga4gh.common", "fields": [
                    {"name": "referenceName", "type": "string"},
                    {"name": "strand", "type": "Strand"}
                ]},
                {"type": "fixed", "name": "Md5", "size": 16}
            ],
            "messages": {}
        })
        .to_string();

        let source = parse_protocol(&content, Path::new("reads.avpr")).unwrap();
        assert_eq!(source.namespace.as_deref(), Some("org.ga4gh"));
        assert_eq!(source.entities.len(), 3);
        assert_eq!(source.entities[0].kind, EntityKind::Enum);
        assert_eq!(source.entities[0].symbols.len(), 2);
        assert_eq!(source.entities[1].namespace.as_deref(), Some("org.ga4gh.common"));
        assert_eq!(source.entities[1].fields[1].ty, TypeExpr::named("Strand"));
        assert!(source.entities[2].fields.is_empty());
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = parse_protocol("{not json", Path::new("broken.avpr")).unwrap_err();
        assert!(err.to_string().contains("broken.avpr"));
    }
}

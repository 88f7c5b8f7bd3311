//! Protocol Buffers Descriptor Front End
//!
//! Reads a `google.protobuf.FileDescriptorSet` in its JSON encoding, e.g.
//! from `buf build --as-file-descriptor-set -o set.json`. Each file becomes
//! one [`SchemaSource`] labelled with the file name.
//!
//! Nested messages and enums are flattened into top-level entities in the
//! file's package. Map-entry messages are not entities of their own: fields
//! that use them render as `map<value>`.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, SchemaError};
use crate::graph::{qualify, TypeName};
use crate::schema::{EntityDecl, FieldDecl, SchemaSource, TypeExpr};

// =============================================================================
// Descriptor JSON
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
struct FileDescriptorSetJson {
    #[serde(default)]
    file: Vec<FileDescriptorProtoJson>,
}

#[derive(Debug, Clone, Deserialize)]
struct FileDescriptorProtoJson {
    name: Option<String>,
    package: Option<String>,
    #[serde(default, rename = "messageType", alias = "message_type")]
    message_type: Vec<DescriptorProtoJson>,
    #[serde(default, rename = "enumType", alias = "enum_type")]
    enum_type: Vec<EnumDescriptorProtoJson>,
}

#[derive(Debug, Clone, Deserialize)]
struct DescriptorProtoJson {
    name: String,
    #[serde(default)]
    field: Vec<FieldDescriptorProtoJson>,
    #[serde(default, rename = "nestedType", alias = "nested_type")]
    nested_type: Vec<DescriptorProtoJson>,
    #[serde(default, rename = "enumType", alias = "enum_type")]
    enum_type: Vec<EnumDescriptorProtoJson>,
    #[serde(default)]
    options: Option<MessageOptionsJson>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct MessageOptionsJson {
    #[serde(default, rename = "mapEntry", alias = "map_entry")]
    map_entry: bool,
}

#[derive(Debug, Clone, Deserialize)]
struct FieldDescriptorProtoJson {
    name: String,
    #[serde(default)]
    label: Option<EnumRepr>,
    #[serde(rename = "type")]
    typ: Option<EnumRepr>,
    #[serde(default, rename = "typeName", alias = "type_name")]
    type_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EnumDescriptorProtoJson {
    name: String,
    #[serde(default)]
    value: Vec<EnumValueDescriptorProtoJson>,
}

#[derive(Debug, Clone, Deserialize)]
struct EnumValueDescriptorProtoJson {
    name: String,
}

/// Protobuf enums appear either by name or by number in JSON
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
enum EnumRepr {
    Number(i64),
    Name(String),
}

impl std::fmt::Display for EnumRepr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EnumRepr::Number(n) => write!(f, "{}", n),
            EnumRepr::Name(name) => write!(f, "{}", name),
        }
    }
}

// =============================================================================
// Field Kinds
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Scalar(&'static str),
    /// Message, group, or enum: look at `typeName`
    Reference,
}

const SCALARS: &[(i64, &str)] = &[
    (1, "double"),
    (2, "float"),
    (3, "int64"),
    (4, "uint64"),
    (5, "int32"),
    (6, "fixed64"),
    (7, "fixed32"),
    (8, "bool"),
    (9, "string"),
    (12, "bytes"),
    (13, "uint32"),
    (15, "sfixed32"),
    (16, "sfixed64"),
    (17, "sint32"),
    (18, "sint64"),
];

fn field_kind(repr: &EnumRepr) -> Option<FieldKind> {
    match repr {
        EnumRepr::Number(10 | 11 | 14) => Some(FieldKind::Reference),
        EnumRepr::Number(n) => SCALARS
            .iter()
            .find(|(number, _)| number == n)
            .map(|(_, name)| FieldKind::Scalar(*name)),
        EnumRepr::Name(name) => {
            let bare = name.strip_prefix("TYPE_").unwrap_or(name).to_lowercase();
            match bare.as_str() {
                "group" | "message" | "enum" => Some(FieldKind::Reference),
                _ => SCALARS
                    .iter()
                    .find(|(_, scalar)| *scalar == bare)
                    .map(|(_, name)| FieldKind::Scalar(*name)),
            }
        }
    }
}

fn is_repeated(label: Option<&EnumRepr>) -> bool {
    matches!(label, Some(EnumRepr::Number(3)))
        || matches!(label, Some(EnumRepr::Name(name)) if name == "LABEL_REPEATED")
}

// =============================================================================
// Type Index
// =============================================================================

/// What a fully qualified protobuf name (`.pkg.Outer.Inner`) stands for
#[derive(Debug, Clone)]
enum IndexedType<'d> {
    Entity(TypeName),
    MapEntry(&'d FieldDescriptorProtoJson),
}

type TypeIndex<'d> = HashMap<String, IndexedType<'d>>;

fn proto_path(package: Option<&str>, parents: &[&str], name: &str) -> String {
    let mut path = String::new();
    for segment in package
        .filter(|p| !p.is_empty())
        .into_iter()
        .chain(parents.iter().copied())
        .chain(std::iter::once(name))
    {
        path.push('.');
        path.push_str(segment);
    }
    path
}

fn is_map_entry(message: &DescriptorProtoJson) -> bool {
    let flagged = message.options.as_ref().is_some_and(|o| o.map_entry);
    let shaped = message.name.ends_with("Entry")
        && message.field.len() == 2
        && message.field[0].name == "key"
        && message.field[1].name == "value";
    flagged || shaped
}

fn index_message<'d>(
    index: &mut TypeIndex<'d>,
    package: Option<&str>,
    parents: &mut Vec<&'d str>,
    message: &'d DescriptorProtoJson,
) {
    let path = proto_path(package, parents, &message.name);
    if is_map_entry(message) {
        if let Some(value) = message.field.iter().find(|f| f.name == "value") {
            index.insert(path, IndexedType::MapEntry(value));
        }
        return;
    }
    index.insert(path, IndexedType::Entity(qualify(package, &message.name)));

    parents.push(&message.name);
    for nested_enum in &message.enum_type {
        let path = proto_path(package, parents, &nested_enum.name);
        index.insert(path, IndexedType::Entity(qualify(package, &nested_enum.name)));
    }
    for nested in &message.nested_type {
        index_message(index, package, parents, nested);
    }
    parents.pop();
}

fn build_index(set: &FileDescriptorSetJson) -> TypeIndex<'_> {
    let mut index = TypeIndex::new();
    for file in &set.file {
        let package = file.package.as_deref();
        for en in &file.enum_type {
            index.insert(
                proto_path(package, &[], &en.name),
                IndexedType::Entity(qualify(package, &en.name)),
            );
        }
        let mut parents = Vec::new();
        for message in &file.message_type {
            index_message(&mut index, package, &mut parents, message);
        }
    }
    index
}

// =============================================================================
// Conversion
// =============================================================================

struct Converter<'d, 'p> {
    index: TypeIndex<'d>,
    path: &'p Path,
}

impl Converter<'_, '_> {
    fn field_type(&self, field: &FieldDescriptorProtoJson) -> Result<TypeExpr> {
        let Some(repr) = field.typ.as_ref() else {
            return Err(self.parse_error(format!("field {} has no type", field.name)));
        };

        let base = match field_kind(repr) {
            Some(FieldKind::Scalar(name)) => TypeExpr::primitive(name),
            Some(FieldKind::Reference) => {
                let Some(type_name) = field.type_name.as_deref() else {
                    return Err(self.parse_error(format!("field {} has no typeName", field.name)));
                };
                match self.index.get(type_name) {
                    Some(IndexedType::Entity(name)) => TypeExpr::named(name.clone()),
                    // Map fields are repeated entries; the map itself is the collection
                    Some(IndexedType::MapEntry(value)) => return Ok(TypeExpr::map(self.field_type(value)?)),
                    // Types from files outside the set, e.g. google.protobuf.*
                    None => TypeExpr::named(type_name.trim_start_matches('.')),
                }
            }
            None => TypeExpr::Composite {
                kind: repr.to_string(),
                inner: None,
            },
        };

        if is_repeated(field.label.as_ref()) {
            Ok(TypeExpr::array(base))
        } else {
            Ok(base)
        }
    }

    fn message(&self, message: &DescriptorProtoJson, out: &mut Vec<EntityDecl>) -> Result<()> {
        if is_map_entry(message) {
            return Ok(());
        }

        let fields = message
            .field
            .iter()
            .map(|field| Ok(FieldDecl::new(field.name.clone(), self.field_type(field)?)))
            .collect::<Result<Vec<_>>>()?;
        out.push(EntityDecl::record(message.name.clone(), fields));

        for nested in &message.nested_type {
            self.message(nested, out)?;
        }
        for nested_enum in &message.enum_type {
            out.push(enumeration(nested_enum));
        }
        Ok(())
    }

    fn parse_error(&self, message: String) -> SchemaError {
        SchemaError::Parse {
            path: self.path.to_path_buf(),
            message,
        }
    }
}

fn enumeration(en: &EnumDescriptorProtoJson) -> EntityDecl {
    EntityDecl::enumeration(
        en.name.clone(),
        en.value.iter().map(|v| v.name.clone()).collect(),
    )
}

/// Parse a descriptor set. `path` is only used in error messages.
pub fn parse_descriptor_set(content: &str, path: &Path) -> Result<Vec<SchemaSource>> {
    let set: FileDescriptorSetJson = serde_json::from_str(content).map_err(|e| SchemaError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let converter = Converter {
        index: build_index(&set),
        path,
    };

    let mut sources = Vec::with_capacity(set.file.len());
    for (i, file) in set.file.iter().enumerate() {
        let mut entities = Vec::new();
        for en in &file.enum_type {
            entities.push(enumeration(en));
        }
        for message in &file.message_type {
            converter.message(message, &mut entities)?;
        }

        let label = file.name.clone().unwrap_or_else(|| format!("file_{}", i));
        sources.push(SchemaSource::new(file.package.clone(), entities).with_label(label));
    }
    Ok(sources)
}

//! Type Expression Normalization
//!
//! Turns a raw [`TypeExpr`] into its display string and the user-defined
//! type names it mentions. Everything here is pure: results are returned,
//! never accumulated into caller state.

use crate::error::{Result, SchemaError};
use crate::schema::TypeExpr;

use super::{qualify, TypeName};

/// Display string plus referenced user types for one field type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedType {
    pub display: String,
    pub user_types: Vec<TypeName>,
}

/// Normalize a field type in one call.
///
/// Fails on the first composite whose kind is not `array` or `map`.
pub fn normalize(
    expr: &TypeExpr,
    namespace: Option<&str>,
    strip_namespace: bool,
) -> Result<NormalizedType> {
    let display = to_display_string(expr, strip_namespace)?;
    let user_types = extract_user_types(expr, namespace).collect::<Result<Vec<_>>>()?;
    Ok(NormalizedType {
        display,
        user_types,
    })
}

/// Render a type expression as `union<..>`, `array<..>`, `map<..>` or a name.
///
/// Maps render only their value type; keys are strings by convention.
pub fn to_display_string(expr: &TypeExpr, strip_namespace: bool) -> Result<String> {
    match expr {
        TypeExpr::Primitive(name) => Ok(name.clone()),
        TypeExpr::Named(name) => {
            if strip_namespace {
                Ok(super::local_part(name).to_string())
            } else {
                Ok(name.clone())
            }
        }
        TypeExpr::Union(options) => {
            let rendered = options
                .iter()
                .map(|option| to_display_string(option, strip_namespace))
                .collect::<Result<Vec<_>>>()?;
            Ok(format!("union<{}>", rendered.join(",")))
        }
        TypeExpr::Composite { kind, inner } => {
            let inner = composite_inner(kind, inner.as_deref())?;
            Ok(format!("{}<{}>", kind, to_display_string(inner, strip_namespace)?))
        }
    }
}

/// Lazily walk every user type reachable from `expr`.
///
/// Unqualified names are qualified with `namespace` when one is given.
pub fn extract_user_types<'a>(expr: &'a TypeExpr, namespace: Option<&'a str>) -> UserTypes<'a> {
    UserTypes {
        stack: vec![expr],
        namespace,
    }
}

/// Iterator returned by [`extract_user_types`]
///
/// Yields names in declaration order. After yielding an error it is
/// exhausted.
#[derive(Debug)]
pub struct UserTypes<'a> {
    stack: Vec<&'a TypeExpr>,
    namespace: Option<&'a str>,
}

impl<'a> Iterator for UserTypes<'a> {
    type Item = Result<TypeName>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(expr) = self.stack.pop() {
            match expr {
                TypeExpr::Primitive(_) => {}
                TypeExpr::Named(name) => return Some(Ok(qualify(self.namespace, name))),
                TypeExpr::Union(options) => self.stack.extend(options.iter().rev()),
                TypeExpr::Composite { kind, inner } => match composite_inner(kind, inner.as_deref()) {
                    Ok(inner) => self.stack.push(inner),
                    Err(e) => {
                        self.stack.clear();
                        return Some(Err(e));
                    }
                },
            }
        }
        None
    }
}

impl std::iter::FusedIterator for UserTypes<'_> {}

fn composite_inner<'a>(kind: &str, inner: Option<&'a TypeExpr>) -> Result<&'a TypeExpr> {
    match (kind, inner) {
        ("array" | "map", Some(inner)) => Ok(inner),
        ("array" | "map", None) => Err(SchemaError::InvalidComposite {
            kind: format!("{kind} without inner type"),
        }),
        _ => Err(SchemaError::InvalidComposite {
            kind: kind.to_string(),
        }),
    }
}

//! Schema UML
//!
//! Turns Avro protocol (AVPR) and protobuf descriptor schemas into UML class
//! diagrams rendered as GraphViz DOT.
//!
//! ## Pipeline
//!
//! ```text
//! *.avpr / descriptor.json
//!        │  loader
//!        ▼
//!   SchemaSource[]          (entities + raw field types)
//!        │  graph::Resolver
//!        ▼
//!   ResolvedGraph           (types, containments, references, groupings)
//!        │  render::DotRenderer
//!        ▼
//!   UML .dot
//! ```
//!
//! Containment edges come from walking field types; reference edges are
//! inferred from `id` / `...Id` / `...Ids` field naming.

pub mod annotations;
pub mod config;
pub mod error;
pub mod graph;
pub mod loader;
pub mod render;
pub mod schema;
pub mod urls;

pub use annotations::TypeAnnotations;
pub use config::{DiagramStyle, InputConfig, RenderConfig, UmlConfig};
pub use error::{Result, SchemaError};
pub use graph::{
    resolve, ContainmentEdge, FieldEntry, Grouping, ReferenceEdge, ResolveOptions, ResolvedGraph,
    Resolver, TypeName,
};
pub use render::DotRenderer;
pub use schema::{EntityDecl, EntityKind, FieldDecl, SchemaSource, TypeExpr};

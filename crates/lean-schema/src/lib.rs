mod error;
mod field;
mod graph;
mod schema;

pub use bson::{Bson, Document};
pub use error::SchemaError;
pub use field::{BoxError, DefaultFn, DefaultValue, Field, FieldKind, Generator};
pub use graph::{SchemaGraph, SchemaGraphBuilder, SchemaId};
pub use schema::{ChildMount, MAP_WILDCARD, Schema, SchemaPath};

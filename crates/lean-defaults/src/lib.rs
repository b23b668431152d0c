mod apply;
mod config;
mod descend;
mod error;
mod hooks;
mod index;
mod plugin;
mod registry;
mod selection;

pub use bson::{Bson, Document};
pub use lean_schema as schema;
pub use lean_schema::{Field, Generator, Schema, SchemaGraph, SchemaId};

pub use apply::apply_defaults;
pub use config::{DefaultsOption, LeanOptions, PluginOptions};
pub use descend::{attach, attach_many, attach_one};
pub use error::DefaultsError;
pub use hooks::{HookRegistry, Pipeline, PostHook, Query, QueryContext, QueryOp};
pub use index::{DefaultEntry, DefaultIndex, EntrySource};
pub use plugin::LeanDefaults;
pub use registry::IndexRegistry;
pub use selection::{Selection, SelectionMode};

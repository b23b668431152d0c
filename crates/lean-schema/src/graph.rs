use std::collections::HashSet;
use std::fmt;

use crate::error::SchemaError;
use crate::field::DefaultValue;
use crate::schema::Schema;

/// Identity of a schema inside its [`SchemaGraph`].
///
/// Two structurally identical schemas added separately get distinct ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SchemaId(usize);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "schema#{}", self.0)
    }
}

/// A frozen set of schemas. Mounts may form cycles (a schema mounting itself).
///
/// Built once through [`SchemaGraphBuilder`]; there is no way to mutate a
/// schema after `build()`.
#[derive(Debug)]
pub struct SchemaGraph {
    schemas: Vec<Schema>,
}

impl SchemaGraph {
    pub fn builder() -> SchemaGraphBuilder {
        SchemaGraphBuilder::default()
    }

    pub fn schema(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = SchemaId> + '_ {
        (0..self.schemas.len()).map(SchemaId)
    }
}

#[derive(Debug, Default)]
pub struct SchemaGraphBuilder {
    slots: Vec<Option<Schema>>,
    type_defaults: Vec<(SchemaId, String, DefaultValue)>,
}

impl SchemaGraphBuilder {
    pub fn add(&mut self, schema: Schema) -> SchemaId {
        self.slots.push(Some(schema));
        SchemaId(self.slots.len() - 1)
    }

    /// Add a schema that refers to itself, e.g. a tree node whose children
    /// are nodes of the same shape.
    pub fn add_recursive<F>(&mut self, f: F) -> SchemaId
    where
        F: FnOnce(SchemaId) -> Schema,
    {
        let id = self.declare();
        self.slots[id.0] = Some(f(id));
        id
    }

    /// Reserve an id to be filled in later by [`define`](Self::define).
    /// Needed for mutually recursive schemas.
    pub fn declare(&mut self) -> SchemaId {
        self.slots.push(None);
        SchemaId(self.slots.len() - 1)
    }

    pub fn define(&mut self, id: SchemaId, schema: Schema) -> Result<(), SchemaError> {
        match self.slots.get_mut(id.0) {
            None => Err(SchemaError::UnknownSchema(id)),
            Some(Some(_)) => Err(SchemaError::AlreadyDefined(id)),
            Some(slot) => {
                *slot = Some(schema);
                Ok(())
            }
        }
    }

    /// Attach a default to the type of an already declared path. A default
    /// given in the field declaration still takes precedence.
    pub fn set_type_default(
        &mut self,
        id: SchemaId,
        path: impl Into<String>,
        value: DefaultValue,
    ) -> &mut Self {
        self.type_defaults.push((id, path.into(), value));
        self
    }

    pub fn build(self) -> Result<SchemaGraph, SchemaError> {
        let len = self.slots.len();
        let mut schemas = Vec::with_capacity(len);
        for (i, slot) in self.slots.into_iter().enumerate() {
            let schema = slot.ok_or(SchemaError::Undefined(SchemaId(i)))?;
            validate(SchemaId(i), &schema, len)?;
            schemas.push(schema);
        }

        for (id, path, value) in self.type_defaults {
            let schema = schemas.get_mut(id.0).ok_or(SchemaError::UnknownSchema(id))?;
            let target = schema
                .path_mut(&path)
                .ok_or(SchemaError::UnknownPath { schema: id, path })?;
            target.set_type_default(value);
        }

        Ok(SchemaGraph { schemas })
    }
}

fn validate(id: SchemaId, schema: &Schema, len: usize) -> Result<(), SchemaError> {
    let mut seen = HashSet::new();
    for path in schema.paths() {
        if path.path().is_empty() {
            return Err(SchemaError::EmptyPath { schema: id });
        }
        if path.segments().iter().any(String::is_empty) {
            return Err(SchemaError::EmptySegment {
                schema: id,
                path: path.path().to_string(),
            });
        }
        if !seen.insert(path.path()) {
            return Err(SchemaError::DuplicatePath {
                schema: id,
                path: path.path().to_string(),
            });
        }
    }
    for mount in schema.children() {
        if mount.schema().0 >= len {
            return Err(SchemaError::UnknownMount {
                schema: id,
                path: mount.path().to_string(),
                target: mount.schema(),
            });
        }
    }
    Ok(())
}

use crate::field::{DefaultValue, Field, FieldKind};
use crate::graph::SchemaId;

/// Segment marking the value slot of a map field (`tags.$*`).
pub const MAP_WILDCARD: &str = "$*";

/// One declared path of a schema, in dot notation (`nested.prop`).
#[derive(Debug, Clone)]
pub struct SchemaPath {
    path: String,
    segments: Vec<String>,
    kind: FieldKind,
    declared: Option<DefaultValue>,
    type_default: Option<DefaultValue>,
}

impl SchemaPath {
    fn new(path: String, field: Field) -> Self {
        let segments = path.split('.').map(str::to_string).collect();
        Self {
            path,
            segments,
            kind: field.kind,
            declared: field.declared,
            type_default: field.type_default,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Default given in the field declaration, if any.
    pub fn declared_default(&self) -> Option<&DefaultValue> {
        self.declared.as_ref()
    }

    /// Default attached to the field's type, either implicitly (arrays) or
    /// after declaration via the graph builder.
    pub fn type_default(&self) -> Option<&DefaultValue> {
        self.type_default.as_ref()
    }

    /// True for the value slot of a map field, which is never defaulted.
    pub fn is_wildcard(&self) -> bool {
        self.segments.last().is_some_and(|s| s == MAP_WILDCARD)
    }

    pub(crate) fn set_type_default(&mut self, value: DefaultValue) {
        self.type_default = Some(value);
    }
}

/// A nested schema mounted at a path of its parent.
#[derive(Debug, Clone)]
pub struct ChildMount {
    path: String,
    segments: Vec<String>,
    schema: SchemaId,
}

impl ChildMount {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn schema(&self) -> SchemaId {
        self.schema
    }
}

/// A flat description of one document shape: every declared path plus the
/// child schemas mounted under it.
///
/// Nested plain objects are declared with dotted paths; subdocuments with
/// their own schema are declared with [`Field::embedded`] or
/// [`Field::array_of`], which also register a [`ChildMount`].
#[derive(Debug, Clone, Default)]
pub struct Schema {
    paths: Vec<SchemaPath>,
    children: Vec<ChildMount>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, path: impl Into<String>, field: Field) -> Self {
        let path = path.into();
        if let Some(child) = field.mount {
            self.children.push(ChildMount {
                segments: path.split('.').map(str::to_string).collect(),
                path: path.clone(),
                schema: child,
            });
        }
        let wildcard = (field.kind == FieldKind::Map).then(|| format!("{path}.{MAP_WILDCARD}"));
        self.paths.push(SchemaPath::new(path, field));
        if let Some(wildcard) = wildcard {
            self.paths.push(SchemaPath::new(wildcard, Field::scalar()));
        }
        self
    }

    pub fn paths(&self) -> &[SchemaPath] {
        &self.paths
    }

    pub fn path(&self, name: &str) -> Option<&SchemaPath> {
        self.paths.iter().find(|p| p.path == name)
    }

    pub(crate) fn path_mut(&mut self, name: &str) -> Option<&mut SchemaPath> {
        self.paths.iter_mut().find(|p| p.path == name)
    }

    pub fn children(&self) -> &[ChildMount] {
        &self.children
    }
}

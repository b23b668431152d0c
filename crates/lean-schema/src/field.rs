use std::fmt;
use std::sync::Arc;

use bson::oid::ObjectId;
use bson::{Bson, Document};

use crate::graph::SchemaId;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

type ComputeFn = dyn Fn(&Document) -> Result<Option<Bson>, BoxError> + Send + Sync;

/// A user-supplied default computed from the record that owns the field.
///
/// The function receives the whole record at the schema's nesting level, so
/// it can read sibling fields. Returning `Ok(None)` means "no value": the
/// field is left unset.
#[derive(Clone)]
pub struct DefaultFn(Arc<ComputeFn>);

impl DefaultFn {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Document) -> Result<Option<Bson>, BoxError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    pub fn call(&self, record: &Document) -> Result<Option<Bson>, BoxError> {
        (self.0)(record)
    }
}

impl fmt::Debug for DefaultFn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultFn(..)")
    }
}

/// Built-in value generators. These never see the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Generator {
    /// Current UTC timestamp.
    Now,
    /// A fresh ObjectId.
    ObjectId,
    EmptyArray,
    EmptyDocument,
}

impl Generator {
    pub fn generate(self) -> Bson {
        match self {
            Generator::Now => Bson::DateTime(bson::DateTime::now()),
            Generator::ObjectId => Bson::ObjectId(ObjectId::new()),
            Generator::EmptyArray => Bson::Array(Vec::new()),
            Generator::EmptyDocument => Bson::Document(Document::new()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DefaultValue {
    /// A literal value. `None` is an explicitly declared "undefined" default,
    /// which still counts as a declaration.
    Literal(Option<Bson>),
    Generator(Generator),
    Function(DefaultFn),
}

impl DefaultValue {
    pub fn literal(value: impl Into<Bson>) -> Self {
        DefaultValue::Literal(Some(value.into()))
    }

    pub fn undefined() -> Self {
        DefaultValue::Literal(None)
    }

    pub fn function<F>(f: F) -> Self
    where
        F: Fn(&Document) -> Result<Option<Bson>, BoxError> + Send + Sync + 'static,
    {
        DefaultValue::Function(DefaultFn::new(f))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar,
    Array,
    /// A single nested document.
    Embedded,
    Map,
}

/// Declaration of a single field, consumed by [`Schema::field`](crate::Schema::field).
#[derive(Debug, Clone)]
pub struct Field {
    pub(crate) kind: FieldKind,
    pub(crate) mount: Option<SchemaId>,
    pub(crate) declared: Option<DefaultValue>,
    pub(crate) type_default: Option<DefaultValue>,
}

impl Field {
    fn of_kind(kind: FieldKind) -> Self {
        Self {
            kind,
            mount: None,
            declared: None,
            type_default: None,
        }
    }

    pub fn scalar() -> Self {
        Self::of_kind(FieldKind::Scalar)
    }

    /// An array of scalars. Arrays default to `[]` unless a default is declared.
    pub fn array() -> Self {
        Self {
            type_default: Some(DefaultValue::Generator(Generator::EmptyArray)),
            ..Self::of_kind(FieldKind::Array)
        }
    }

    /// A keyed map. Also declares the `<path>.$*` value path.
    pub fn map() -> Self {
        Self::of_kind(FieldKind::Map)
    }

    /// A single subdocument described by `child`.
    pub fn embedded(child: SchemaId) -> Self {
        Self {
            mount: Some(child),
            ..Self::of_kind(FieldKind::Embedded)
        }
    }

    /// An array of subdocuments described by `child`.
    pub fn array_of(child: SchemaId) -> Self {
        Self {
            mount: Some(child),
            ..Self::array()
        }
    }

    pub fn default(mut self, value: impl Into<Bson>) -> Self {
        self.declared = Some(DefaultValue::literal(value));
        self
    }

    pub fn default_undefined(mut self) -> Self {
        self.declared = Some(DefaultValue::undefined());
        self
    }

    pub fn default_generator(mut self, generator: Generator) -> Self {
        self.declared = Some(DefaultValue::Generator(generator));
        self
    }

    pub fn default_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&Document) -> Result<Option<Bson>, BoxError> + Send + Sync + 'static,
    {
        self.declared = Some(DefaultValue::function(f));
        self
    }

    pub fn kind(&self) -> FieldKind {
        self.kind
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn generators_produce_fresh_values() {
        assert_eq!(Generator::EmptyArray.generate(), Bson::Array(vec![]));
        assert_eq!(Generator::EmptyDocument.generate(), Bson::Document(doc! {}));
        assert!(matches!(Generator::Now.generate(), Bson::DateTime(_)));
        assert_ne!(Generator::ObjectId.generate(), Generator::ObjectId.generate());
    }

    #[test]
    fn array_carries_empty_array_type_default() {
        let field = Field::array();
        assert!(field.declared.is_none());
        assert!(matches!(
            field.type_default,
            Some(DefaultValue::Generator(Generator::EmptyArray))
        ));
    }

    #[test]
    fn declared_undefined_is_a_declaration() {
        let field = Field::array().default_undefined();
        assert!(matches!(field.declared, Some(DefaultValue::Literal(None))));
    }

    #[test]
    fn default_fn_reads_record() {
        let f = DefaultFn::new(|record| Ok(record.get("name").cloned()));
        let value = f.call(&doc! { "name": "Alice" }).unwrap();
        assert_eq!(value, Some(Bson::String("Alice".into())));
        assert_eq!(f.call(&doc! {}).unwrap(), None);
    }
}

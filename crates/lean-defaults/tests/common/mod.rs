#![allow(dead_code)]

use std::sync::Arc;

use bson::oid::ObjectId;
use bson::{Bson, Document, doc};
use lean_defaults::schema::DefaultValue;
use lean_defaults::{
    Field, IndexRegistry, LeanDefaults, LeanOptions, Pipeline, PluginOptions, Query, QueryOp,
    Schema, SchemaGraph, SchemaId, Selection, attach_one,
};

pub const BOB_ID: &str = "5d23fa87d7f8b00011fa25c5";
pub const ALICE_ID: &str = "5d23fa87d7f8b00011fa25c6";

pub struct Fixture {
    pub registry: Arc<IndexRegistry>,
    pub root: SchemaId,
}

impl Fixture {
    pub fn new(builder: lean_defaults::schema::SchemaGraphBuilder, root: SchemaId) -> Self {
        let graph = Arc::new(builder.build().unwrap());
        Self {
            registry: Arc::new(IndexRegistry::new(graph)),
            root,
        }
    }

    /// Defaults for a single record, with the selection derived from `projection`.
    pub fn apply(&self, mut record: Document, projection: Option<Document>) -> Document {
        let selection = projection
            .as_ref()
            .map(Selection::from_projection)
            .unwrap_or_default();
        attach_one(&self.registry, self.root, &mut record, &selection).unwrap();
        record
    }

    pub fn pipeline(&self, options: PluginOptions) -> Pipeline {
        let mut pipeline = Pipeline::new();
        LeanDefaults::new(Arc::clone(&self.registry), self.root, options).register(&mut pipeline);
        pipeline
    }
}

pub fn lean_query(op: QueryOp) -> Query {
    Query::new(op).with_lean(LeanOptions::defaults(true))
}

/// The user schema: literal, array, nested, type-level and function defaults.
pub fn user_schema() -> Fixture {
    let mut builder = SchemaGraph::builder();
    let user = builder.add(
        Schema::new()
            .field("name", Field::scalar())
            .field("country", Field::scalar().default("USA"))
            .field("aliases", Field::array())
            .field("nestedWithoutDefaults.test", Field::scalar())
            .field("defaultWithSchemaTypeFn", Field::scalar())
            .field("nullWithSchemaTypeFn", Field::scalar())
            .field("arrayWithDefault", Field::array().default_undefined())
            .field("nested.prop", Field::scalar().default("Default"))
            .field("nested.other", Field::scalar().default(true))
            .field("nested.noDefault", Field::scalar())
            .field(
                "fnDefault",
                Field::scalar().default_fn(|user| Ok(user.get("name").cloned())),
            )
            .field("oldNullableObj.oldNullableProp", Field::scalar()),
    );
    builder
        .set_type_default(user, "defaultWithSchemaTypeFn", DefaultValue::literal("Test Default"))
        .set_type_default(user, "nullWithSchemaTypeFn", DefaultValue::literal(Bson::Null));
    Fixture::new(builder, user)
}

/// Stored before the schema grew its defaults.
pub fn bob() -> Document {
    doc! {
        "_id": ObjectId::parse_str(BOB_ID).unwrap(),
        "name": "Bob",
        "oldNullableObj": Bson::Null,
    }
}

pub fn alice() -> Document {
    doc! {
        "_id": ObjectId::parse_str(ALICE_ID).unwrap(),
        "name": "Alice",
        "country": "CA",
        "aliases": ["Ally"],
        "nestedWithoutDefaults": { "test": "test" },
        "nested": { "prop": "Prop", "other": false, "noDefault": "Test" },
        "defaultWithSchemaTypeFn": "Value",
        "nullWithSchemaTypeFn": "Value",
        "oldNullableObj": { "oldNullableProp": "Value" },
    }
}

pub fn validate_regular_bob(bob: &Document) {
    assert!(!bob.contains_key("country"));
    assert!(!bob.contains_key("aliases"));
    assert!(!bob.contains_key("arrayWithDefault"));
    assert!(!bob.contains_key("nestedWithoutDefaults"));
    assert!(!bob.contains_key("defaultWithSchemaTypeFn"));
    assert!(!bob.contains_key("nullWithSchemaTypeFn"));
    assert!(!bob.contains_key("nested"));
    assert_eq!(bob.get("oldNullableObj"), Some(&Bson::Null));
}

pub fn validate_bob(bob: &Document) {
    assert_eq!(bob.get_str("country").unwrap(), "USA");
    assert!(bob.get_array("aliases").unwrap().is_empty());
    assert!(!bob.contains_key("arrayWithDefault"));
    assert!(bob.get_document("nestedWithoutDefaults").unwrap().is_empty());
    let nested = bob.get_document("nested").unwrap();
    assert_eq!(nested.get_str("prop").unwrap(), "Default");
    assert!(nested.get_bool("other").unwrap());
    assert!(!nested.contains_key("noDefault"));
    assert_eq!(bob.get_str("fnDefault").unwrap(), "Bob");
    assert_eq!(bob.get_str("defaultWithSchemaTypeFn").unwrap(), "Test Default");
    assert_eq!(bob.get("nullWithSchemaTypeFn"), Some(&Bson::Null));
    assert!(bob.get_document("oldNullableObj").unwrap().is_empty());
}

pub fn validate_alice(alice: &Document) {
    assert_eq!(alice.get_str("country").unwrap(), "CA");
    assert_eq!(alice.get_array("aliases").unwrap().len(), 1);
    assert!(!alice.contains_key("arrayWithDefault"));
    assert_eq!(
        alice.get_document("nestedWithoutDefaults").unwrap(),
        &doc! { "test": "test" }
    );
    assert_eq!(
        alice.get_document("nested").unwrap(),
        &doc! { "prop": "Prop", "other": false, "noDefault": "Test" }
    );
    assert_eq!(alice.get_str("fnDefault").unwrap(), "Alice");
    assert_eq!(alice.get_str("defaultWithSchemaTypeFn").unwrap(), "Value");
    assert_eq!(alice.get_str("nullWithSchemaTypeFn").unwrap(), "Value");
    assert_eq!(
        alice.get_document("oldNullableObj").unwrap(),
        &doc! { "oldNullableProp": "Value" }
    );
}

pub fn by_name<'a>(records: &'a [Bson], name: &str) -> &'a Document {
    records
        .iter()
        .filter_map(Bson::as_document)
        .find(|d| d.get_str("name").ok() == Some(name))
        .unwrap()
}

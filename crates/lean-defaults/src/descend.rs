use bson::{Bson, Document};
use lean_schema::SchemaId;

use crate::apply::{apply_entries, eligible_entries};
use crate::error::DefaultsError;
use crate::registry::IndexRegistry;
use crate::selection::{Selection, join_path};

/// Attach defaults to a query result and, recursively, to every
/// subdocument mounted under it.
///
/// `result` is a single record, an array of records, or null. Records are
/// mutated in place; the value itself is never replaced.
///
/// Descent follows the data, not the schema graph: a schema that mounts
/// itself is only unfolded as deep as the record actually nests, so no
/// visited set is kept and the same child schema may be reached through any
/// number of sibling mounts.
pub fn attach(
    registry: &IndexRegistry,
    schema: SchemaId,
    result: &mut Bson,
    selection: &Selection,
    prefix: &str,
) -> Result<(), DefaultsError> {
    let mut records = Vec::new();
    collect_value(result, &[], &mut records);
    descend(registry, schema, &mut records, selection, prefix)
}

/// [`attach`] for a `findOne`-style result.
pub fn attach_one(
    registry: &IndexRegistry,
    schema: SchemaId,
    record: &mut Document,
    selection: &Selection,
) -> Result<(), DefaultsError> {
    descend(registry, schema, &mut [record], selection, "")
}

/// [`attach`] for a `find`-style result.
pub fn attach_many(
    registry: &IndexRegistry,
    schema: SchemaId,
    records: &mut [Document],
    selection: &Selection,
) -> Result<(), DefaultsError> {
    let mut records: Vec<&mut Document> = records.iter_mut().collect();
    descend(registry, schema, &mut records, selection, "")
}

fn descend(
    registry: &IndexRegistry,
    schema: SchemaId,
    records: &mut [&mut Document],
    selection: &Selection,
    prefix: &str,
) -> Result<(), DefaultsError> {
    if records.is_empty() {
        return Ok(());
    }

    let index = registry.index(schema)?;
    if !index.is_empty() {
        let entries = eligible_entries(&index, selection, prefix);
        if !entries.is_empty() {
            for record in records.iter_mut() {
                apply_entries(record, &entries)?;
            }
        }
    }

    for mount in registry.schema(schema)?.children() {
        let mut children: Vec<&mut Document> = Vec::new();
        for record in records.iter_mut() {
            collect_at_path(record, mount.segments(), &mut children);
        }
        if children.is_empty() {
            continue;
        }
        // Prefixes only feed the projection check.
        let child_prefix = if selection.is_unrestricted() {
            String::new()
        } else {
            join_path(prefix, mount.path())
        };
        descend(registry, mount.schema(), &mut children, selection, &child_prefix)?;
    }
    Ok(())
}

/// Collect every document found at `segments` below `doc`. Arrays met along
/// the way, or at the end, are searched element by element at any depth.
fn collect_at_path<'a>(doc: &'a mut Document, segments: &[String], out: &mut Vec<&'a mut Document>) {
    let Some((first, rest)) = segments.split_first() else {
        out.push(doc);
        return;
    };
    if let Some(value) = doc.get_mut(first) {
        collect_value(value, rest, out);
    }
}

fn collect_value<'a>(value: &'a mut Bson, rest: &[String], out: &mut Vec<&'a mut Document>) {
    match value {
        Bson::Document(doc) => collect_at_path(doc, rest, out),
        Bson::Array(items) => {
            for item in items {
                collect_value(item, rest, out);
            }
        }
        _ => {}
    }
}

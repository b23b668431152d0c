use bson::{Bson, Document};

use crate::error::DefaultsError;
use crate::index::{DefaultEntry, DefaultIndex, EntrySource};
use crate::selection::{Selection, join_path};

/// Write every eligible default of `index` into `record` where the path has
/// no value yet.
///
/// `record` may be a single document or an array of documents (nested
/// arrays included); anything else is left alone. `prefix` is the dotted
/// path at which the schema is mounted in the query result, or `""` at the
/// top level, and only matters for the projection check.
pub fn apply_defaults(
    record: &mut Bson,
    index: &DefaultIndex,
    selection: &Selection,
    prefix: &str,
) -> Result<(), DefaultsError> {
    let entries = eligible_entries(index, selection, prefix);
    if entries.is_empty() {
        return Ok(());
    }
    apply_to_value(record, &entries)
}

/// A default that passed the selection, with the sub-paths its value is cut
/// down to when the selection only reaches it as an ancestor.
#[derive(Debug)]
pub(crate) struct Eligible<'i> {
    entry: &'i DefaultEntry,
    pruning: Vec<Vec<String>>,
}

/// Entries whose full path passes the selection. Depends only on the prefix,
/// so it is computed once per nesting level rather than once per record.
pub(crate) fn eligible_entries<'i>(
    index: &'i DefaultIndex,
    selection: &Selection,
    prefix: &str,
) -> Vec<Eligible<'i>> {
    if selection.is_unrestricted() {
        return index
            .entries()
            .iter()
            .map(|entry| Eligible {
                entry,
                pruning: Vec::new(),
            })
            .collect();
    }
    index
        .entries()
        .iter()
        .filter_map(|entry| {
            let path = join_path(prefix, entry.path());
            selection.is_path_eligible(&path).then(|| Eligible {
                entry,
                pruning: selection.pruning(&path),
            })
        })
        .collect()
}

fn apply_to_value(value: &mut Bson, entries: &[Eligible<'_>]) -> Result<(), DefaultsError> {
    match value {
        Bson::Document(doc) => apply_entries(doc, entries),
        Bson::Array(items) => {
            for item in items {
                apply_to_value(item, entries)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}

pub(crate) fn apply_entries(
    doc: &mut Document,
    entries: &[Eligible<'_>],
) -> Result<(), DefaultsError> {
    for eligible in entries {
        apply_entry(doc, eligible)?;
    }
    Ok(())
}

fn apply_entry(doc: &mut Document, eligible: &Eligible<'_>) -> Result<(), DefaultsError> {
    let entry = eligible.entry;
    let Some((leaf, parents)) = entry.segments().split_last() else {
        return Ok(());
    };

    let Some(container) = container_mut(doc, parents) else {
        return Ok(());
    };
    if !is_missing(container.get(leaf)) {
        return Ok(());
    }

    let mut value = match entry.source() {
        EntrySource::Placeholder | EntrySource::Literal(None) => return Ok(()),
        EntrySource::Literal(Some(value)) => value.clone(),
        EntrySource::Generator(generator) => generator.generate(),
        EntrySource::Compute(f) => {
            let computed = f.call(doc).map_err(|source| DefaultsError::DefaultFn {
                path: entry.path().to_string(),
                source,
            })?;
            match computed {
                Some(value) => value,
                None => return Ok(()),
            }
        }
    };

    for paths in &eligible.pruning {
        match prune(value, paths) {
            Some(pruned) => value = pruned,
            // A scalar cannot host the selected sub-paths.
            None => return Ok(()),
        }
    }

    // The function above may only read the record, so the container is
    // still in place.
    if let Some(container) = container_mut(doc, parents) {
        container.insert(leaf.as_str(), value);
    }
    Ok(())
}

/// Walk to the document holding the last segment, replacing falsy
/// intermediates (`null`, `false`, `0`, `""`) with `{}`. Returns `None` when
/// an intermediate holds a value that cannot host fields.
fn container_mut<'a>(doc: &'a mut Document, parents: &[String]) -> Option<&'a mut Document> {
    let mut current = doc;
    for segment in parents {
        if is_falsy(current.get(segment)) {
            current.insert(segment.as_str(), Document::new());
        }
        current = match current.get_mut(segment) {
            Some(Bson::Document(next)) => next,
            _ => return None,
        };
    }
    Some(current)
}

/// Keep only the dotted `paths` of `value`, looking through arrays.
fn prune(value: Bson, paths: &[String]) -> Option<Bson> {
    match value {
        Bson::Document(doc) => {
            let mut kept = Document::new();
            for (key, value) in doc {
                if paths.iter().any(|p| *p == key) {
                    kept.insert(key, value);
                    continue;
                }
                let below: Vec<String> = paths
                    .iter()
                    .filter_map(|p| p.strip_prefix(key.as_str())?.strip_prefix('.'))
                    .map(str::to_string)
                    .collect();
                if below.is_empty() {
                    continue;
                }
                if let Some(value) = prune(value, &below) {
                    kept.insert(key, value);
                }
            }
            Some(Bson::Document(kept))
        }
        Bson::Array(items) => Some(Bson::Array(
            items.into_iter().filter_map(|item| prune(item, paths)).collect(),
        )),
        _ => None,
    }
}

fn is_missing(value: Option<&Bson>) -> bool {
    matches!(value, None | Some(Bson::Undefined))
}

fn is_falsy(value: Option<&Bson>) -> bool {
    match value {
        None | Some(Bson::Null | Bson::Undefined | Bson::Boolean(false)) => true,
        Some(Bson::Int32(n)) => *n == 0,
        Some(Bson::Int64(n)) => *n == 0,
        Some(Bson::Double(n)) => *n == 0.0 || n.is_nan(),
        Some(Bson::String(s)) => s.is_empty(),
        Some(_) => false,
    }
}

use std::collections::HashMap;

use bson::Bson;
use lean_schema::{DefaultFn, DefaultValue, FieldKind, Generator, Schema, SchemaPath};

/// Where a [`DefaultEntry`] gets its value from.
#[derive(Debug, Clone)]
pub enum EntrySource {
    /// Declared literal. `None` is a declared "undefined": nothing is written.
    Literal(Option<Bson>),
    Generator(Generator),
    /// User function, called with the record that owns the path.
    Compute(DefaultFn),
    /// No value. Exists so the containers above the path get created.
    Placeholder,
}

#[derive(Debug, Clone)]
pub struct DefaultEntry {
    path: String,
    segments: Vec<String>,
    source: EntrySource,
}

impl DefaultEntry {
    fn new(path: &SchemaPath, source: EntrySource) -> Self {
        Self {
            path: path.path().to_string(),
            segments: path.segments().to_vec(),
            source,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn source(&self) -> &EntrySource {
        &self.source
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.source, EntrySource::Placeholder)
    }
}

/// The defaults of one schema, flattened into the order they are applied.
///
/// Real defaults come first in declaration order, followed by placeholders
/// for nested paths whose containers no real default creates.
#[derive(Debug, Clone, Default)]
pub struct DefaultIndex {
    entries: Vec<DefaultEntry>,
}

impl DefaultIndex {
    pub fn build(schema: &Schema) -> Self {
        let mut entries = Vec::new();
        let mut covered = Coverage::default();
        let mut bare: Vec<&SchemaPath> = Vec::new();

        for path in schema.paths() {
            if path.is_wildcard() {
                continue;
            }
            match resolve(path) {
                Some(source) => {
                    covered.insert(path.segments());
                    entries.push(DefaultEntry::new(path, source));
                }
                None if path.segments().len() > 1 => bare.push(path),
                None => {}
            }
        }

        // Longest first, so one placeholder can cover its shallower siblings.
        bare.sort_by(|a, b| b.segments().len().cmp(&a.segments().len()));
        for path in bare {
            let segments = path.segments();
            if covered.contains(&segments[..segments.len() - 1]) {
                continue;
            }
            covered.insert(segments);
            entries.push(DefaultEntry::new(path, EntrySource::Placeholder));
        }

        Self { entries }
    }

    pub fn entries(&self) -> &[DefaultEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn placeholders(&self) -> usize {
        self.entries.iter().filter(|e| e.is_placeholder()).count()
    }
}

/// Declared default, then type default, then `{}` for single subdocuments.
fn resolve(path: &SchemaPath) -> Option<EntrySource> {
    let value = match path.declared_default().or(path.type_default()) {
        Some(value) => value,
        None if path.kind() == FieldKind::Embedded => {
            return Some(EntrySource::Generator(Generator::EmptyDocument));
        }
        None => return None,
    };
    Some(match value {
        DefaultValue::Literal(literal) => EntrySource::Literal(literal.clone()),
        DefaultValue::Generator(generator) => EntrySource::Generator(*generator),
        DefaultValue::Function(f) => EntrySource::Compute(f.clone()),
    })
}

/// Trie of path segments whose containers are already created by some entry.
///
/// Inserting `a.b.c` marks `a`, `a.b` and `a.b.c`.
#[derive(Debug, Default)]
struct Coverage {
    children: HashMap<String, Coverage>,
}

impl Coverage {
    fn insert(&mut self, segments: &[String]) {
        let mut node = self;
        for segment in segments {
            node = node.children.entry(segment.clone()).or_default();
        }
    }

    fn contains(&self, segments: &[String]) -> bool {
        let mut node = self;
        for segment in segments {
            match node.children.get(segment) {
                Some(next) => node = next,
                None => return false,
            }
        }
        true
    }
}

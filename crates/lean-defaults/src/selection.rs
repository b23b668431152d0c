use bson::{Bson, Document};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SelectionMode {
    /// No projection was applied.
    #[default]
    None,
    Inclusive,
    Exclusive,
}

/// The field selection active for one query, used to decide which defaults
/// may be materialized on its result.
///
/// Keys are dotted paths. Matching is by whole segments: `a` covers `a.b`
/// but not `ab`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    mode: SelectionMode,
    keys: Vec<String>,
    /// Optional allow-list on top of the projection, from `defaults: [..]`.
    only: Option<Vec<String>>,
}

enum Marker {
    Include,
    Exclude,
    /// `$slice`, `$elemMatch` and friends. Selects the field without making
    /// the projection inclusive.
    Operator,
    Ignored,
}

fn marker(value: &Bson) -> Marker {
    match value {
        Bson::Boolean(true) => Marker::Include,
        Bson::Boolean(false) => Marker::Exclude,
        Bson::Int32(n) if *n == 0 => Marker::Exclude,
        Bson::Int64(n) if *n == 0 => Marker::Exclude,
        Bson::Double(n) if *n == 0.0 => Marker::Exclude,
        Bson::Document(_) => Marker::Operator,
        Bson::Null | Bson::Undefined => Marker::Ignored,
        _ => Marker::Include,
    }
}

impl Selection {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn inclusive<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(SelectionMode::Inclusive, keys)
    }

    pub fn exclusive<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::with_mode(SelectionMode::Exclusive, keys)
    }

    fn with_mode<I, S>(mode: SelectionMode, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut collected: Vec<String> = Vec::new();
        for key in keys {
            let key = key.into();
            if !collected.contains(&key) {
                collected.push(key);
            }
        }
        Self {
            mode,
            keys: collected,
            only: None,
        }
    }

    /// Derive the selection from a projection document such as
    /// `{ "nested.prop": 1, "aliases": 1 }`.
    ///
    /// `_id` alone never makes a projection inclusive, so `{ _id: 0, a: 1 }`
    /// is inclusive and `{ _id: 0 }` is exclusive. A projection made only of
    /// operators selects nothing in particular and yields mode `None`.
    pub fn from_projection(projection: &Document) -> Self {
        let mut included = Vec::new();
        let mut excluded = Vec::new();
        let mut includes_id = false;
        for (key, value) in projection {
            match marker(value) {
                Marker::Include if key == "_id" => includes_id = true,
                Marker::Include | Marker::Operator => included.push(key.clone()),
                Marker::Exclude => excluded.push(key.clone()),
                Marker::Ignored => {}
            }
        }

        let has_inclusion = projection
            .iter()
            .any(|(key, value)| key != "_id" && matches!(marker(value), Marker::Include));
        if has_inclusion {
            if includes_id {
                included.push("_id".to_string());
            }
            Self::inclusive(included)
        } else if !excluded.is_empty() {
            Self::exclusive(excluded)
        } else if includes_id {
            included.push("_id".to_string());
            Self::inclusive(included)
        } else {
            Self::none()
        }
    }

    /// Restrict defaults to the given paths in addition to the projection.
    pub fn restricted_to<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only = Some(paths.into_iter().map(Into::into).collect());
        self
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn is_selected(&self) -> bool {
        self.mode != SelectionMode::None
    }

    pub fn is_inclusive(&self) -> bool {
        self.mode == SelectionMode::Inclusive
    }

    pub fn is_exclusive(&self) -> bool {
        self.mode == SelectionMode::Exclusive
    }

    /// True when every path is eligible, so callers can skip building
    /// full dotted paths.
    pub fn is_unrestricted(&self) -> bool {
        self.mode == SelectionMode::None && self.only.is_none()
    }

    pub fn is_path_eligible(&self, path: &str) -> bool {
        if let Some(only) = &self.only
            && !only.iter().any(|p| overlaps(p, path))
        {
            return false;
        }
        let matched = || self.keys.iter().any(|key| overlaps(key, path));
        match self.mode {
            SelectionMode::None => true,
            SelectionMode::Inclusive => matched(),
            SelectionMode::Exclusive => !matched(),
        }
    }

    /// Sub-paths an eligible default at `path` is cut down to, one list per
    /// filter that only admits `path` as an ancestor of what it selects.
    /// Empty when the whole value may be written.
    pub(crate) fn pruning(&self, path: &str) -> Vec<Vec<String>> {
        let mut filters = Vec::new();
        if self.is_inclusive()
            && let Some(below) = selected_below(&self.keys, path)
        {
            filters.push(below);
        }
        if let Some(only) = &self.only
            && let Some(below) = selected_below(only, path)
        {
            filters.push(below);
        }
        filters
    }
}

/// `None` when a key covers `path` itself, otherwise the keys below `path`
/// made relative to it.
fn selected_below(keys: &[String], path: &str) -> Option<Vec<String>> {
    if keys.iter().any(|key| is_segment_prefix(key, path)) {
        return None;
    }
    Some(
        keys.iter()
            .filter_map(|key| key.strip_prefix(path)?.strip_prefix('.'))
            .map(str::to_string)
            .collect(),
    )
}

/// Either path is a whole-segment prefix of the other.
pub(crate) fn overlaps(a: &str, b: &str) -> bool {
    is_segment_prefix(a, b) || is_segment_prefix(b, a)
}

fn is_segment_prefix(prefix: &str, path: &str) -> bool {
    path.starts_with(prefix)
        && (path.len() == prefix.len() || path.as_bytes()[prefix.len()] == b'.')
}

pub(crate) fn join_path(prefix: &str, path: &str) -> String {
    if prefix.is_empty() {
        path.to_string()
    } else {
        format!("{prefix}.{path}")
    }
}

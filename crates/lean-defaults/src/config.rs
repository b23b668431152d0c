use bson::Document;
use serde::{Deserialize, Serialize};

use crate::error::DefaultsError;

/// Options given once, when the plugin is registered for a schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginOptions {
    /// Apply defaults to lean results unless a query says otherwise.
    pub defaults: bool,
}

/// The `defaults` value of a query's lean options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DefaultsOption {
    Enabled(bool),
    /// Only default these dotted paths (and the containers they need).
    Paths(Vec<String>),
}

/// Per-query lean options. Keys belonging to other lean plugins are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeanOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defaults: Option<DefaultsOption>,
}

impl LeanOptions {
    pub fn defaults(enabled: bool) -> Self {
        Self {
            defaults: Some(DefaultsOption::Enabled(enabled)),
        }
    }

    pub fn paths<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            defaults: Some(DefaultsOption::Paths(
                paths.into_iter().map(Into::into).collect(),
            )),
        }
    }

    /// Parse the options document a caller passed to `lean(...)`.
    pub fn from_document(doc: &Document) -> Result<Self, DefaultsError> {
        Ok(bson::from_document(doc.clone())?)
    }
}

#[cfg(test)]
mod tests {
    use bson::doc;

    use super::*;

    #[test]
    fn plugin_options_default_off() {
        assert!(!PluginOptions::default().defaults);
        let parsed: PluginOptions = bson::from_document(doc! {}).unwrap();
        assert_eq!(parsed, PluginOptions::default());
    }

    #[test]
    fn parses_boolean_defaults() {
        let opts = LeanOptions::from_document(&doc! { "defaults": true }).unwrap();
        assert_eq!(opts, LeanOptions::defaults(true));
        let opts = LeanOptions::from_document(&doc! { "defaults": false }).unwrap();
        assert_eq!(opts, LeanOptions::defaults(false));
    }

    #[test]
    fn parses_path_list() {
        let opts =
            LeanOptions::from_document(&doc! { "defaults": ["country", "nested.prop"] }).unwrap();
        assert_eq!(opts, LeanOptions::paths(["country", "nested.prop"]));
    }

    #[test]
    fn ignores_other_lean_plugins() {
        let opts = LeanOptions::from_document(&doc! { "virtuals": true, "getters": true }).unwrap();
        assert_eq!(opts.defaults, None);
    }

    #[test]
    fn rejects_malformed_defaults() {
        let err = LeanOptions::from_document(&doc! { "defaults": "yes" }).unwrap_err();
        assert!(matches!(err, DefaultsError::Options(_)));
    }
}

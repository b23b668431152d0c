use std::sync::Arc;

use bson::Bson;
use lean_schema::SchemaId;
use tracing::{debug, trace};

use crate::config::{DefaultsOption, PluginOptions};
use crate::descend::attach;
use crate::error::DefaultsError;
use crate::hooks::{HookRegistry, PostHook, QueryContext, QueryOp};
use crate::registry::IndexRegistry;
use crate::selection::Selection;

/// Applies schema defaults to lean query results of one root schema.
pub struct LeanDefaults {
    registry: Arc<IndexRegistry>,
    schema: SchemaId,
    options: PluginOptions,
}

impl LeanDefaults {
    pub fn new(registry: Arc<IndexRegistry>, schema: SchemaId, options: PluginOptions) -> Self {
        Self {
            registry,
            schema,
            options,
        }
    }

    /// Install a post hook on every find-style operation.
    pub fn register<H: HookRegistry + ?Sized>(self, hooks: &mut H) {
        let plugin = Arc::new(self);
        for op in QueryOp::ALL {
            let plugin = Arc::clone(&plugin);
            let hook: PostHook = Arc::new(move |ctx: &dyn QueryContext, result: &mut Bson| {
                plugin.run(ctx, result)
            });
            hooks.post(op, hook);
        }
        debug!(schema = %plugin.schema, defaults = plugin.options.defaults, "registered lean defaults");
    }

    /// Apply defaults to `result` if the query asks for them.
    pub fn run(&self, ctx: &dyn QueryContext, result: &mut Bson) -> Result<(), DefaultsError> {
        let Some(selection) = self.selection_for(ctx) else {
            return Ok(());
        };
        attach(&self.registry, self.schema, result, &selection, "")
    }

    /// `None` when this query should be left alone. An explicit per-query
    /// setting always wins over the plugin option.
    fn selection_for(&self, ctx: &dyn QueryContext) -> Option<Selection> {
        let Some(lean) = ctx.lean() else {
            trace!(op = %ctx.op(), "hydrated query, skipping defaults");
            return None;
        };
        let selection = || {
            ctx.projection()
                .map(Selection::from_projection)
                .unwrap_or_default()
        };
        match &lean.defaults {
            Some(DefaultsOption::Enabled(true)) => Some(selection()),
            Some(DefaultsOption::Paths(paths)) => Some(selection().restricted_to(paths.iter().cloned())),
            None if self.options.defaults => Some(selection()),
            Some(DefaultsOption::Enabled(false)) | None => {
                trace!(op = %ctx.op(), "defaults disabled for query");
                None
            }
        }
    }
}

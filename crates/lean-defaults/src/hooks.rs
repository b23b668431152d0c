use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use bson::{Bson, Document};

use crate::config::LeanOptions;
use crate::error::DefaultsError;

/// Query operations whose results can be post-processed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOp {
    Find,
    FindOne,
    FindOneAndUpdate,
    FindOneAndRemove,
    FindOneAndDelete,
}

impl QueryOp {
    pub const ALL: [QueryOp; 5] = [
        QueryOp::Find,
        QueryOp::FindOne,
        QueryOp::FindOneAndUpdate,
        QueryOp::FindOneAndRemove,
        QueryOp::FindOneAndDelete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            QueryOp::Find => "find",
            QueryOp::FindOne => "findOne",
            QueryOp::FindOneAndUpdate => "findOneAndUpdate",
            QueryOp::FindOneAndRemove => "findOneAndRemove",
            QueryOp::FindOneAndDelete => "findOneAndDelete",
        }
    }
}

impl fmt::Display for QueryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a post hook can see of the query that produced a result.
pub trait QueryContext {
    fn op(&self) -> QueryOp;

    /// Lean options, or `None` when the query hydrates full documents.
    fn lean(&self) -> Option<&LeanOptions>;

    /// The projection the query was run with, if any.
    fn projection(&self) -> Option<&Document>;
}

/// Runs after the plain-object conversion and mutates the result in place.
pub type PostHook =
    Arc<dyn Fn(&dyn QueryContext, &mut Bson) -> Result<(), DefaultsError> + Send + Sync>;

pub trait HookRegistry {
    fn post(&mut self, op: QueryOp, hook: PostHook);
}

/// Minimal query pipeline: post hooks per operation, run in registration
/// order.
#[derive(Default)]
pub struct Pipeline {
    post: HashMap<QueryOp, Vec<PostHook>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn hook_count(&self, op: QueryOp) -> usize {
        self.post.get(&op).map_or(0, Vec::len)
    }

    /// Run the hooks registered for `ctx.op()`, stopping at the first error.
    pub fn run_post(&self, ctx: &dyn QueryContext, result: &mut Bson) -> Result<(), DefaultsError> {
        if let Some(hooks) = self.post.get(&ctx.op()) {
            for hook in hooks {
                hook(ctx, result)?;
            }
        }
        Ok(())
    }
}

impl HookRegistry for Pipeline {
    fn post(&mut self, op: QueryOp, hook: PostHook) {
        self.post.entry(op).or_default().push(hook);
    }
}

/// A query as seen by post hooks.
#[derive(Debug, Clone)]
pub struct Query {
    op: QueryOp,
    lean: Option<LeanOptions>,
    projection: Option<Document>,
}

impl Query {
    pub fn new(op: QueryOp) -> Self {
        Self {
            op,
            lean: None,
            projection: None,
        }
    }

    pub fn with_lean(mut self, options: LeanOptions) -> Self {
        self.lean = Some(options);
        self
    }

    pub fn with_projection(mut self, projection: Document) -> Self {
        self.projection = Some(projection);
        self
    }
}

impl QueryContext for Query {
    fn op(&self) -> QueryOp {
        self.op
    }

    fn lean(&self) -> Option<&LeanOptions> {
        self.lean.as_ref()
    }

    fn projection(&self) -> Option<&Document> {
        self.projection.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use bson::doc;

    use super::*;

    #[test]
    fn hooks_run_in_order_for_their_op_only() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut pipeline = Pipeline::new();
        for tag in ["first", "second"] {
            let calls = Arc::clone(&calls);
            pipeline.post(
                QueryOp::FindOne,
                Arc::new(move |ctx: &dyn QueryContext, _: &mut Bson| -> Result<(), DefaultsError> {
                    calls.lock().unwrap().push((ctx.op(), tag));
                    Ok(())
                }),
            );
        }
        assert_eq!(pipeline.hook_count(QueryOp::FindOne), 2);
        assert_eq!(pipeline.hook_count(QueryOp::Find), 0);

        let mut result = Bson::Document(doc! {});
        pipeline.run_post(&Query::new(QueryOp::Find), &mut result).unwrap();
        assert!(calls.lock().unwrap().is_empty());

        pipeline.run_post(&Query::new(QueryOp::FindOne), &mut result).unwrap();
        assert_eq!(
            *calls.lock().unwrap(),
            [(QueryOp::FindOne, "first"), (QueryOp::FindOne, "second")]
        );
    }

    #[test]
    fn query_exposes_options() {
        let query = Query::new(QueryOp::Find)
            .with_lean(LeanOptions::defaults(true))
            .with_projection(doc! { "a": 1 });
        assert_eq!(query.op(), QueryOp::Find);
        assert_eq!(query.lean(), Some(&LeanOptions::defaults(true)));
        assert_eq!(query.projection(), Some(&doc! { "a": 1 }));
        assert_eq!(QueryOp::FindOneAndDelete.to_string(), "findOneAndDelete");
    }
}

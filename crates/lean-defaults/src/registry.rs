use std::sync::Arc;

use arc_swap::ArcSwapOption;
use lean_schema::{Schema, SchemaGraph, SchemaId};
use tracing::debug;

use crate::error::DefaultsError;
use crate::index::DefaultIndex;

/// Lazily built [`DefaultIndex`] per schema of a graph.
///
/// Each slot is published once with compare-and-swap. Two threads racing on
/// the first use of a schema both build, one wins, and the other adopts the
/// winner's index; readers never see a partially built index. Nothing is
/// ever invalidated: the graph is frozen.
pub struct IndexRegistry {
    graph: Arc<SchemaGraph>,
    slots: Vec<ArcSwapOption<DefaultIndex>>,
}

impl IndexRegistry {
    pub fn new(graph: Arc<SchemaGraph>) -> Self {
        let slots = (0..graph.len()).map(|_| ArcSwapOption::empty()).collect();
        Self { graph, slots }
    }

    pub fn graph(&self) -> &SchemaGraph {
        &self.graph
    }

    pub(crate) fn schema(&self, id: SchemaId) -> Result<&Schema, DefaultsError> {
        self.graph.schema(id).ok_or(DefaultsError::UnknownSchema(id))
    }

    /// The index for `id`, building it on first use.
    pub fn index(&self, id: SchemaId) -> Result<Arc<DefaultIndex>, DefaultsError> {
        let slot = self
            .slots
            .get(id.index())
            .ok_or(DefaultsError::UnknownSchema(id))?;
        if let Some(index) = slot.load_full() {
            return Ok(index);
        }

        let built = Arc::new(DefaultIndex::build(self.schema(id)?));
        let empty: Option<Arc<DefaultIndex>> = None;
        let previous = slot.compare_and_swap(&empty, Some(Arc::clone(&built)));
        match &*previous {
            Some(winner) => Ok(Arc::clone(winner)),
            None => {
                debug!(
                    schema = %id,
                    entries = built.len(),
                    placeholders = built.placeholders(),
                    "built default index"
                );
                Ok(built)
            }
        }
    }

    pub fn is_built(&self, id: SchemaId) -> bool {
        self.slots
            .get(id.index())
            .is_some_and(|slot| slot.load().is_some())
    }
}

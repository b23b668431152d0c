use crate::graph::SchemaId;

#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{0} was declared but never defined")]
    Undefined(SchemaId),
    #[error("{0} is already defined")]
    AlreadyDefined(SchemaId),
    #[error("{0} does not belong to this graph")]
    UnknownSchema(SchemaId),
    #[error("{schema} mounts unknown {target} at `{path}`")]
    UnknownMount {
        schema: SchemaId,
        path: String,
        target: SchemaId,
    },
    #[error("{schema} declares an empty path")]
    EmptyPath { schema: SchemaId },
    #[error("{schema} declares `{path}` with an empty segment")]
    EmptySegment { schema: SchemaId, path: String },
    #[error("{schema} declares `{path}` more than once")]
    DuplicatePath { schema: SchemaId, path: String },
    #[error("{schema} has no path `{path}`")]
    UnknownPath { schema: SchemaId, path: String },
}

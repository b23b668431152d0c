use lean_schema::{BoxError, SchemaId};

#[derive(Debug, thiserror::Error)]
pub enum DefaultsError {
    #[error("default for `{path}` failed: {source}")]
    DefaultFn {
        path: String,
        #[source]
        source: BoxError,
    },
    #[error("{0} is not part of the registry's schema graph")]
    UnknownSchema(SchemaId),
    #[error("invalid lean options: {0}")]
    Options(#[from] bson::de::Error),
}

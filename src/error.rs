use query_builder::BuildError;
use record_stream::TransformError;
use tables_api::TransportError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TablesError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("error building query: {0}")]
    Query(#[from] BuildError),

    #[error(transparent)]
    Transform(#[from] TransformError),

    #[error("failed to deserialize query result: {0}")]
    Decode(#[source] serde_json::Error),
}

impl TablesError {
    /// True when the request was cancelled before a response was accepted.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Cancelled))
    }
}

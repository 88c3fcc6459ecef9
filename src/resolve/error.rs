use thiserror::Error;

/// Failure to build a usable [`Document`](super::document::Document) from a
/// fetched page. Probe-level trouble is never an error: a probe that cannot
/// run simply contributes zero candidates.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("page body is empty")]
    EmptyDocument,

    #[error("page contains no recognizable markup")]
    UnparseableMarkup,
}

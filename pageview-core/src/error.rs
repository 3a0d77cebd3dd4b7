use thiserror::Error;

/// Failures surfaced by the view layer.
#[derive(Debug, Error)]
pub enum ViewError {
    /// The operation needs an open document, a positive zoom or a
    /// non-empty viewport.
    #[error("invalid view state: {0}")]
    InvalidState(&'static str),

    /// A page's text or link data could not be produced by the backend.
    #[error("page {page} is unavailable")]
    ResourceUnavailable {
        page: usize,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0} is empty")]
    EmptyCollection(&'static str),
}

pub type ViewResult<T> = std::result::Result<T, ViewError>;

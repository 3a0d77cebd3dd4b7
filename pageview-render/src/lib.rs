//! Collaborators that put real documents behind the `pageview-core` traits:
//! a pdfium-backed document provider and a thread-pool search worker.

#[cfg(feature = "pdf")]
mod pdfium;
mod search;

#[cfg(feature = "pdf")]
pub use pdfium::{PdfiumDocument, PdfiumProvider, PDFIUM_LIBRARY_ENV};
pub use search::PooledSearchWorker;

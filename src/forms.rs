//! Form processing pipeline.
//!
//! See [`FormProcessor`] for the entry point.

pub use formwork_forms::*;

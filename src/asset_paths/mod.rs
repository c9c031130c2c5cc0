//! Helpers for normalising manifest references and resolving them against search roots.
//!
//! Filtering external references, expanding candidate paths and walking the ordered search roots
//! live in separate submodules so each step can be tested on its own.

mod candidates;
mod filters;
mod resolve;

pub use candidates::generate_asset_candidates;
pub use filters::is_external_reference;
pub use resolve::SearchRoots;

//! Name-reconciliation engine.
//!
//! Matching is exact on a normalized key:
//! 1. [`NameNormalizer`] canonicalizes display names into [`NormalizedKey`]s.
//! 2. [`DirectoryIndex`] files every directory record under its keys.
//! 3. [`Matcher`] looks each roster member up and classifies the outcome.

pub mod index;
pub mod matcher;
pub mod normalizer;

pub use index::DirectoryIndex;
pub use matcher::Matcher;
pub use normalizer::{NameNormalizer, NormalizedKey};

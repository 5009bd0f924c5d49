//! Rule source schema with serde deserialization.
//!
//! A rule source is either a bare ordered list of rules or a document with
//! `rules`, plus optional `templates` (message bodies, with per-store
//! overrides) and `stores` (store profiles exposed to templates).

mod document;
mod rule;

pub use document::*;
pub use rule::*;

#[cfg(test)]
mod tests;

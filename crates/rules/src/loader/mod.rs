//! Rule Store: loads an ordered rule set from a YAML source, validates it
//! against the registries and keeps the active set for the engine.
//!
//! A source either validates completely or is rejected completely. Reloads
//! swap the active set only after the new source has validated.

mod core;
mod error;


pub use self::core::{RuleSet, RuleStore};
pub use self::error::{Result, RuleError};

//! Scopables and their registry
//!
//! A scopable is a named scoping dimension (`ScopableByCity`,
//! `ScopableByRegion`) that turns keywords into identifiers of its scoping
//! type. Scopables are registered once at startup and looked up by name.

mod dimension;
mod registry;

pub use dimension::{binding_key, valid_keyword, DimensionRef, ScopingDimension, SCOPABLE_PREFIX};
pub use registry::ScopableRegistry;

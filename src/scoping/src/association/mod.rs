//! Association inference between scoped entity types and scopables
//!
//! A scoped type exposes its relationship fields as metadata; for each
//! scopable it opts into, the binding is inferred from the scoping type's
//! singular and plural names, or set explicitly when inference would be
//! ambiguous.

mod binding;
mod entity;

pub use binding::{infer_association_name, AssociationBindings, BindingStats};
pub use entity::{associated_ids, AssociationValue, RelationshipField, ScopedEntity};

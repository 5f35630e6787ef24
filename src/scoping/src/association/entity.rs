//! Relationship metadata exposed by scoped entity types

use tracing::warn;

use crate::error::{Result, ScopingError};
use crate::types::{IdSet, ScopeId};

/// A relationship field declared by an entity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipField {
    /// Field name (e.g. `city`, `cities`)
    pub name: &'static str,
    /// Name of the related type (e.g. `City`)
    pub related_type: &'static str,
}

impl RelationshipField {
    pub const fn new(name: &'static str, related_type: &'static str) -> Self {
        Self { name, related_type }
    }
}

/// Value read from a relationship field of an instance
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssociationValue {
    /// Single relationship with no value (null link)
    Unset,
    /// Single related instance
    One {
        type_name: &'static str,
        id: ScopeId,
    },
    /// Collection of related instances, projected to their identifiers
    Many(Vec<ScopeId>),
    /// Anything else; the payload describes what was found
    Unsupported(&'static str),
}

impl AssociationValue {
    /// Single related instance of `type_name`
    pub fn one(type_name: &'static str, id: impl Into<ScopeId>) -> Self {
        Self::One {
            type_name,
            id: id.into(),
        }
    }

    /// Optional single related instance
    pub fn optional<V: Into<ScopeId>>(type_name: &'static str, id: Option<V>) -> Self {
        match id {
            Some(id) => Self::one(type_name, id),
            None => Self::Unset,
        }
    }

    /// Collection of related identifiers
    pub fn many<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScopeId>,
    {
        Self::Many(ids.into_iter().map(Into::into).collect())
    }
}

/// A domain type that can be scoped
///
/// The type declares the scopables it opts into and its relationship
/// metadata; the engine infers from the metadata which field links the type
/// to each scopable's scoping type.
///
/// ```rust,ignore
/// impl ScopedEntity for Report {
///     const TYPE_NAME: &'static str = "Report";
///     const SCOPABLES: &'static [&'static str] = &["ScopableByCity"];
///     const RELATIONSHIPS: &'static [RelationshipField] = &[
///         RelationshipField::new("city", "City"),
///         RelationshipField::new("author", "User"),
///     ];
///
///     fn scope_id(&self) -> Option<ScopeId> {
///         Some(self.id.into())
///     }
///
///     fn association(&self, name: &str) -> AssociationValue {
///         match name {
///             "city" => AssociationValue::optional("City", self.city_id),
///             _ => AssociationValue::Unsupported("unknown association"),
///         }
///     }
/// }
/// ```
pub trait ScopedEntity: Send + Sync + 'static {
    /// Type name used in messages and for self-scoping detection
    ///
    /// Bindings are keyed on the Rust type, so two types sharing a name
    /// never share a binding.
    const TYPE_NAME: &'static str;

    /// Names of the scopables this type opts into
    const SCOPABLES: &'static [&'static str];

    /// Declared relationship fields
    const RELATIONSHIPS: &'static [RelationshipField];

    /// Association name fixed at the type level, bypassing inference
    fn association_override(_dimension: &str) -> Option<&'static str> {
        None
    }

    /// Identifier of this instance
    fn scope_id(&self) -> Option<ScopeId>;

    /// Read a relationship field of this instance
    fn association(&self, name: &str) -> AssociationValue;
}

/// Identifiers of the scoping instances an entity is associated with
///
/// A report linked to city 32 yields `{32}`; a product available in three
/// cities yields the three city ids. An unset link yields the empty set.
pub fn associated_ids<T: ScopedEntity>(
    instance: &T,
    association: &str,
    dimension: &str,
    scoping_type: &str,
) -> Result<IdSet> {
    match instance.association(association) {
        AssociationValue::Unset => Ok(IdSet::new()),
        AssociationValue::One { type_name, id } if type_name == scoping_type => {
            Ok(IdSet::from([id]))
        }
        AssociationValue::Many(ids) => Ok(ids.into_iter().collect()),
        other => {
            warn!(
                entity_type = T::TYPE_NAME,
                dimension,
                association,
                found = ?other,
                "Association did not yield {} instances",
                scoping_type
            );
            Err(ScopingError::MisconfiguredAssociation {
                entity_type: T::TYPE_NAME.to_string(),
                dimension: dimension.to_string(),
                association: association.to_string(),
                scoping_type: scoping_type.to_string(),
            })
        }
    }
}

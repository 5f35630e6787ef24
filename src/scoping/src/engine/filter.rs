//! Storage-neutral collection filters
//!
//! Collection scoping first decides *how* a collection must be restricted
//! ([`ScopeFilter`]) and then lets the collection apply it
//! ([`ScopedCollection`]). A SQL adapter turns the plan into joins and
//! `WHERE` clauses; the in-memory adapter for `Vec<T>` evaluates it row by
//! row.

use std::fmt;

use crate::association::{associated_ids, ScopedEntity};
use crate::error::Result;
use crate::types::IdSet;

/// How the association is joined
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinKind {
    /// Only rows with a matching associated instance
    Inner,
    /// Every row, including rows without an associated instance
    LeftOuter,
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inner => write!(f, "INNER JOIN"),
            Self::LeftOuter => write!(f, "LEFT OUTER JOIN"),
        }
    }
}

/// How a collection is restricted for a keyword
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeFilter {
    /// No restriction at all
    Unrestricted,

    /// Rows whose own identifier is in the set (self-scoping)
    Ids(IdSet),

    /// Rows restricted through an association
    ///
    /// Unbounded keywords produce a `LeftOuter` join with no identifiers so
    /// rows without an associated instance stay in; bounded keywords produce
    /// an `Inner` join restricted to `ids`, which drops them.
    Association {
        /// Scopable the filter was built for
        dimension: String,
        /// Relationship field joined through
        association: String,
        /// Type on the other side of the join
        scoping_type: String,
        /// Join flavour
        join: JoinKind,
        /// Allowed identifiers, `None` when unbounded
        ids: Option<IdSet>,
    },
}

impl ScopeFilter {
    /// Association filter for a bounded keyword
    pub fn bounded_association(
        dimension: impl Into<String>,
        association: impl Into<String>,
        scoping_type: impl Into<String>,
        ids: IdSet,
    ) -> Self {
        Self::Association {
            dimension: dimension.into(),
            association: association.into(),
            scoping_type: scoping_type.into(),
            join: JoinKind::Inner,
            ids: Some(ids),
        }
    }

    /// Association filter for an unbounded keyword
    pub fn unbounded_association(
        dimension: impl Into<String>,
        association: impl Into<String>,
        scoping_type: impl Into<String>,
    ) -> Self {
        Self::Association {
            dimension: dimension.into(),
            association: association.into(),
            scoping_type: scoping_type.into(),
            join: JoinKind::LeftOuter,
            ids: None,
        }
    }

    /// Whether every row passes
    pub fn is_unrestricted(&self) -> bool {
        matches!(self, Self::Unrestricted)
    }

    /// Whether a single entity passes the filter
    pub fn admits<T: ScopedEntity>(&self, entity: &T) -> Result<bool> {
        match self {
            Self::Unrestricted => Ok(true),
            Self::Ids(ids) => Ok(entity.scope_id().is_some_and(|id| ids.contains(&id))),
            Self::Association { ids: None, .. } => Ok(true),
            Self::Association {
                dimension,
                association,
                scoping_type,
                ids: Some(ids),
                ..
            } => {
                let own = associated_ids(entity, association, dimension, scoping_type)?;
                Ok(!own.is_disjoint(ids))
            }
        }
    }
}

impl fmt::Display for ScopeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unrestricted => write!(f, "unrestricted"),
            Self::Ids(ids) => write!(f, "id IN ({})", join_ids(ids)),
            Self::Association {
                association,
                join,
                ids: None,
                ..
            } => write!(f, "{join} {association}"),
            Self::Association {
                association,
                join,
                ids: Some(ids),
                ..
            } => write!(f, "{join} {association} ON {association}.id IN ({})", join_ids(ids)),
        }
    }
}

fn join_ids(ids: &IdSet) -> String {
    ids.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
}

/// A collection of scoped entities that can apply a [`ScopeFilter`]
pub trait ScopedCollection: Sized {
    /// Entity type held by the collection
    type Entity: ScopedEntity;

    /// Restrict the collection
    fn apply_filter(self, filter: &ScopeFilter) -> Result<Self>;
}

/// In-memory adapter: each row is kept at most once
impl<T: ScopedEntity> ScopedCollection for Vec<T> {
    type Entity = T;

    fn apply_filter(self, filter: &ScopeFilter) -> Result<Self> {
        if filter.is_unrestricted() {
            return Ok(self);
        }

        let mut kept = Vec::with_capacity(self.len());
        for entity in self {
            if filter.admits(&entity)? {
                kept.push(entity);
            }
        }
        Ok(kept)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::association::{AssociationValue, RelationshipField};
    use crate::types::{id_set, ScopeId};

    #[derive(Debug, Clone, PartialEq)]
    struct Report {
        id: i64,
        city_id: Option<i64>,
    }

    impl ScopedEntity for Report {
        const TYPE_NAME: &'static str = "Report";
        const SCOPABLES: &'static [&'static str] = &["ScopableByCity"];
        const RELATIONSHIPS: &'static [RelationshipField] =
            &[RelationshipField::new("city", "City")];

        fn scope_id(&self) -> Option<ScopeId> {
            Some(self.id.into())
        }

        fn association(&self, name: &str) -> AssociationValue {
            match name {
                "city" => AssociationValue::optional("City", self.city_id),
                _ => AssociationValue::Unsupported("unknown association"),
            }
        }
    }

    fn reports() -> Vec<Report> {
        vec![
            Report { id: 1, city_id: Some(1) },
            Report { id: 2, city_id: Some(2) },
            Report { id: 3, city_id: None },
        ]
    }

    fn ids_of(reports: &[Report]) -> Vec<i64> {
        reports.iter().map(|r| r.id).collect()
    }

    #[test]
    fn test_unbounded_keeps_null_links() {
        let filter = ScopeFilter::unbounded_association("ScopableByCity", "city", "City");
        let scoped = reports().apply_filter(&filter).unwrap();
        assert_eq!(ids_of(&scoped), vec![1, 2, 3]);
    }

    #[test]
    fn test_bounded_drops_null_links() {
        let filter =
            ScopeFilter::bounded_association("ScopableByCity", "city", "City", id_set([1]));
        let scoped = reports().apply_filter(&filter).unwrap();
        assert_eq!(ids_of(&scoped), vec![1]);
    }

    #[test]
    fn test_self_scoping_ids() {
        let scoped = reports().apply_filter(&ScopeFilter::Ids(id_set([2]))).unwrap();
        assert_eq!(ids_of(&scoped), vec![2]);
    }

    #[test]
    fn test_misconfigured_association_propagates() {
        let filter =
            ScopeFilter::bounded_association("ScopableByCity", "owner", "City", id_set([1]));
        assert!(reports().apply_filter(&filter).is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(ScopeFilter::Unrestricted.to_string(), "unrestricted");
        assert_eq!(ScopeFilter::Ids(id_set([7])).to_string(), "id IN (7)");
        assert_eq!(
            ScopeFilter::unbounded_association("ScopableByCity", "city", "City").to_string(),
            "LEFT OUTER JOIN city"
        );
        assert_eq!(
            ScopeFilter::bounded_association("ScopableByCity", "city", "City", id_set([1, 2]))
                .to_string(),
            "INNER JOIN city ON city.id IN (1, 2)"
        );
    }
}

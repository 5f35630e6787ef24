//! Core scoping types

use serde::{Deserialize, Serialize};
use std::any::Any;
use std::collections::BTreeSet;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// Reserved keyword meaning "no restriction"
pub const ALL_KEYWORD: &str = "all";

/// Identifier of a scoping entity (a city id, a region UUID, ...)
///
/// Untagged on the wire: integers stay integers, strings that parse as a
/// UUID become `Uuid`, everything else is `Text`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScopeId {
    /// Integer primary key
    Int(i64),
    /// UUID primary key
    Uuid(Uuid),
    /// Any other textual key
    Text(String),
}

impl fmt::Display for ScopeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{n}"),
            Self::Uuid(u) => write!(f, "{u}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

impl From<i64> for ScopeId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<i32> for ScopeId {
    fn from(n: i32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<u32> for ScopeId {
    fn from(n: u32) -> Self {
        Self::Int(i64::from(n))
    }
}

impl From<Uuid> for ScopeId {
    fn from(u: Uuid) -> Self {
        Self::Uuid(u)
    }
}

impl From<String> for ScopeId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ScopeId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

/// Set of scoping entity identifiers
pub type IdSet = BTreeSet<ScopeId>;

/// Collect anything convertible into an [`IdSet`]
pub fn id_set<I, V>(ids: I) -> IdSet
where
    I: IntoIterator<Item = V>,
    V: Into<ScopeId>,
{
    ids.into_iter().map(Into::into).collect()
}

/// Outcome of resolving a keyword
///
/// `Unbounded` is not the same as an enumerated set of every identifier:
/// collection scoping keeps rows with no association value only when the
/// result is unbounded. An empty `Ids` set matches nothing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolvedScope {
    /// Every instance of the scoping type
    Unbounded,
    /// Exactly these identifiers
    Ids(IdSet),
}

impl ResolvedScope {
    /// The unbounded result
    pub fn unbounded() -> Self {
        Self::Unbounded
    }

    /// A bounded result over the given identifiers
    pub fn ids<I, V>(ids: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ScopeId>,
    {
        Self::Ids(id_set(ids))
    }

    /// A bounded result that matches nothing
    pub fn empty() -> Self {
        Self::Ids(IdSet::new())
    }

    /// Whether the result is unbounded
    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }

    /// Whether the result is bounded and empty
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Ids(ids) if ids.is_empty())
    }

    /// The enumerated identifiers, if bounded
    pub fn as_ids(&self) -> Option<&IdSet> {
        match self {
            Self::Unbounded => None,
            Self::Ids(ids) => Some(ids),
        }
    }

    /// Whether a single identifier is covered
    pub fn contains(&self, id: &ScopeId) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Ids(ids) => ids.contains(id),
        }
    }

    /// Whether any of `ids` is covered
    pub fn intersects(&self, ids: &IdSet) -> bool {
        match self {
            Self::Unbounded => true,
            Self::Ids(resolved) => !resolved.is_disjoint(ids),
        }
    }
}

impl fmt::Display for ResolvedScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unbounded => write!(f, "unbounded"),
            Self::Ids(ids) => {
                let rendered: Vec<String> = ids.iter().map(ToString::to_string).collect();
                write!(f, "{{{}}}", rendered.join(", "))
            }
        }
    }
}

/// Scoping keyword supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Keyword {
    /// The reserved `all` keyword (matched case-insensitively)
    All,
    /// Any other keyword, passed verbatim to the resolver
    Named(String),
}

impl Keyword {
    /// Parse a raw keyword, recognising reserved keywords
    pub fn parse(raw: &str) -> Self {
        if raw.eq_ignore_ascii_case(ALL_KEYWORD) {
            Self::All
        } else {
            Self::Named(raw.to_string())
        }
    }

    /// Whether this keyword bypasses resolution
    pub fn is_reserved(&self) -> bool {
        matches!(self, Self::All)
    }

    /// Keyword text (normalised for reserved keywords)
    pub fn as_str(&self) -> &str {
        match self {
            Self::All => ALL_KEYWORD,
            Self::Named(name) => name,
        }
    }
}

impl FromStr for Keyword {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<&str> for Keyword {
    fn from(s: &str) -> Self {
        Self::parse(s)
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Principal on whose behalf a keyword is resolved
///
/// The engine never looks inside; resolvers downcast to whatever principal
/// type the application authenticates.
#[derive(Clone, Default)]
pub struct Requester {
    principal: Option<Arc<dyn Any + Send + Sync>>,
}

impl Requester {
    /// Wrap an authenticated principal
    pub fn new<P: Any + Send + Sync>(principal: P) -> Self {
        Self {
            principal: Some(Arc::new(principal)),
        }
    }

    /// Wrap an already shared principal
    pub fn from_arc(principal: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            principal: Some(principal),
        }
    }

    /// A requester without a principal
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Whether no principal is attached
    pub fn is_anonymous(&self) -> bool {
        self.principal.is_none()
    }

    /// Borrow the principal as a concrete type
    pub fn downcast_ref<P: Any>(&self) -> Option<&P> {
        self.principal.as_deref()?.downcast_ref::<P>()
    }
}

impl fmt::Debug for Requester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Requester")
            .field("anonymous", &self.is_anonymous())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserved_keyword_is_case_insensitive() {
        assert_eq!(Keyword::parse("all"), Keyword::All);
        assert_eq!(Keyword::parse("ALL"), Keyword::All);
        assert_eq!(Keyword::parse("All"), Keyword::All);
        assert_eq!(Keyword::parse("allowed"), Keyword::Named("allowed".to_string()));
        assert_eq!(Keyword::parse("ALL").as_str(), "all");
    }

    #[test]
    fn test_resolved_scope_intersection() {
        let instance = id_set([2, 3]);

        assert!(ResolvedScope::ids([3, 4]).intersects(&instance));
        assert!(!ResolvedScope::ids([5, 6]).intersects(&instance));
        assert!(!ResolvedScope::ids([3]).intersects(&IdSet::new()));
        assert!(ResolvedScope::unbounded().intersects(&IdSet::new()));
    }

    #[test]
    fn test_empty_and_unbounded_are_distinct() {
        let empty = ResolvedScope::empty();
        let unbounded = ResolvedScope::unbounded();

        assert!(empty.is_empty());
        assert!(!empty.is_unbounded());
        assert!(unbounded.is_unbounded());
        assert!(!unbounded.is_empty());
        assert_ne!(empty, unbounded);
        assert!(unbounded.as_ids().is_none());
    }

    #[test]
    fn test_scope_id_wire_format() {
        let ids: Vec<ScopeId> =
            serde_json::from_str(r#"[42, "67e55044-10b1-426f-9247-bb680e5fe0c8", "hq"]"#).unwrap();

        assert_eq!(ids[0], ScopeId::Int(42));
        assert!(matches!(ids[1], ScopeId::Uuid(_)));
        assert_eq!(ids[2], ScopeId::Text("hq".to_string()));
    }

    #[test]
    fn test_resolved_scope_display() {
        assert_eq!(ResolvedScope::ids([1, 2]).to_string(), "{1, 2}");
        assert_eq!(ResolvedScope::unbounded().to_string(), "unbounded");
    }

    #[test]
    fn test_requester_downcast() {
        #[derive(Debug, PartialEq)]
        struct User {
            id: u32,
        }

        let requester = Requester::new(User { id: 7 });
        assert_eq!(requester.downcast_ref::<User>(), Some(&User { id: 7 }));
        assert!(requester.downcast_ref::<String>().is_none());
        assert!(Requester::anonymous().downcast_ref::<User>().is_none());
        assert!(Requester::anonymous().is_anonymous());
    }
}

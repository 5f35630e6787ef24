//! Scopable definitions and the keyword resolver contract

use async_trait::async_trait;
use heck::ToSnakeCase;
use std::sync::Arc;

use crate::error::{Result, ScopingError};
use crate::types::{Keyword, Requester, ResolvedScope};

/// Prefix stripped from a scopable name to find its scoping type
pub const SCOPABLE_PREFIX: &str = "ScopableBy";

/// Shared handle to a registered scopable
pub type DimensionRef = Arc<dyn ScopingDimension>;

/// A scoping dimension ("scopable"), e.g. `ScopableByCity`
///
/// Implementors provide the keyword logic for their domain. Both resolver
/// methods default to [`ScopingError::ResolverNotImplemented`], so a
/// scopable that forgets one fails loudly on first use instead of denying
/// or allowing silently.
///
/// Resolution must not mutate state the engine can observe. Resolvers may
/// read from a store; store failures should be wrapped with
/// [`ScopingError::resolver_failed`].
#[async_trait]
pub trait ScopingDimension: Send + Sync {
    /// Unique, stable name (e.g. `ScopableByCity`)
    fn name(&self) -> &str;

    /// Name of the type whose identifiers keywords resolve to
    ///
    /// Derived from the name by default: `ScopableByCity` → `City`.
    fn scoping_type(&self) -> &str {
        let name = self.name();
        name.strip_prefix(SCOPABLE_PREFIX)
            .filter(|rest| !rest.is_empty())
            .unwrap_or(name)
    }

    /// Keywords the requester may use with this scopable
    async fn available_keywords(&self, _requester: &Requester) -> Result<Vec<String>> {
        Err(ScopingError::ResolverNotImplemented {
            dimension: self.name().to_string(),
            operation: "available_keywords",
        })
    }

    /// Resolve a keyword into the identifiers of the scoping type it grants
    async fn resolve_keyword(
        &self,
        _keyword: &str,
        _requester: &Requester,
    ) -> Result<ResolvedScope> {
        Err(ScopingError::ResolverNotImplemented {
            dimension: self.name().to_string(),
            operation: "resolve_keyword",
        })
    }
}

/// Name under which the association binding of a scopable is known
///
/// `ScopableByCity` → `scopable_by_city_association_name`
pub fn binding_key(dimension: &dyn ScopingDimension) -> String {
    format!(
        "scopable_by_{}_association_name",
        dimension.scoping_type().to_snake_case()
    )
}

/// Whether `keyword` may be used with `dimension` by `requester`
///
/// Reserved keywords are always valid and never reach the scopable.
pub async fn valid_keyword(
    dimension: &dyn ScopingDimension,
    keyword: &str,
    requester: &Requester,
) -> Result<bool> {
    if Keyword::parse(keyword).is_reserved() {
        return Ok(true);
    }

    let available = dimension.available_keywords(requester).await?;
    Ok(available.iter().any(|k| k == keyword))
}

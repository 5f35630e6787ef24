//! Error types for the scoping engine

use thiserror::Error;

/// Scoping engine errors
///
/// Apart from `ResolverFailed`, `InvalidInput` and `Internal`, every variant
/// describes a deployment bug. None of them may be turned into a plain
/// "not in scope" answer by callers.
#[derive(Debug, Error)]
pub enum ScopingError {
    /// The entity type opts into none of the registered scopables
    #[error(
        "{entity_type} has no applicable scopables. Declare the scopables \
         the type opts into in its ScopedEntity implementation"
    )]
    NoApplicableDimension { entity_type: String },

    /// The entity type opts into other scopables but not this one
    #[error("{entity_type} is not scopable by {dimension}")]
    DimensionNotApplicable {
        entity_type: String,
        dimension: String,
    },

    /// More than one relationship field matches the scoping type
    #[error(
        "{entity_type} has ambiguous association names {candidates:?} for {dimension}. \
         Use set_association_name (or association_override) to define \
         {binding_key} manually"
    )]
    AmbiguousAssociationName {
        entity_type: String,
        dimension: String,
        candidates: Vec<String>,
        binding_key: String,
    },

    /// No relationship field matches the scoping type
    #[error("{entity_type} is not associated with {scoping_type} for {dimension}")]
    NoAssociationFound {
        entity_type: String,
        dimension: String,
        scoping_type: String,
    },

    /// The association yielded something other than one scoping instance
    /// or a collection of identifiers
    #[error(
        "{entity_type} has a misconfigured association for {dimension}. \
         Make sure that {association} returns either an instance of \
         {scoping_type} or a collection of {scoping_type} identifiers"
    )]
    MisconfiguredAssociation {
        entity_type: String,
        dimension: String,
        association: String,
        scoping_type: String,
    },

    /// The scopable does not implement part of the resolver contract
    #[error("{dimension} must implement {operation}")]
    ResolverNotImplemented {
        dimension: String,
        operation: &'static str,
    },

    /// No scopable is registered under this name
    #[error("Unknown scopable: {0}")]
    UnknownDimension(String),

    /// A different scopable is already registered under this name
    #[error("A different scopable is already registered as {0}")]
    DuplicateDimensionName(String),

    /// Keyword validation is enabled and the keyword is not offered
    #[error("Keyword '{keyword}' is not available for {dimension}")]
    UnknownKeyword { dimension: String, keyword: String },

    /// The resolver itself failed (store error, cancellation, ...)
    #[error("Keyword resolution failed for {dimension}: {source}")]
    ResolverFailed {
        dimension: String,
        #[source]
        source: anyhow::Error,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ScopingError {
    /// Wrap a resolver-side failure
    pub fn resolver_failed(dimension: impl Into<String>, source: impl Into<anyhow::Error>) -> Self {
        Self::ResolverFailed {
            dimension: dimension.into(),
            source: source.into(),
        }
    }

    /// Whether this error is a scoping misconfiguration rather than a
    /// runtime failure of a collaborator
    pub fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::NoApplicableDimension { .. }
                | Self::DimensionNotApplicable { .. }
                | Self::AmbiguousAssociationName { .. }
                | Self::NoAssociationFound { .. }
                | Self::MisconfiguredAssociation { .. }
                | Self::ResolverNotImplemented { .. }
                | Self::UnknownDimension(_)
                | Self::DuplicateDimensionName(_)
        )
    }
}

/// Result type for scoping operations
pub type Result<T> = std::result::Result<T, ScopingError>;

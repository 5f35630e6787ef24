//! # CretoAI Scoping Engine
//!
//! Decides whether a requester's granted scope covers a resource instance.
//!
//! ## Features
//!
//! - **Scopables**: named scoping dimensions (`ScopableByCity`,
//!   `ScopableByRegion`) registered once at startup
//! - **Keyword resolution**: each scopable turns a keyword and a requester
//!   into identifiers of its scoping type, or "unbounded"
//! - **Association inference**: the field linking an entity type to a
//!   scoping type is inferred from relationship metadata and cached
//! - **Membership checks** by set intersection
//! - **Collection scoping** through storage-neutral filter plans
//!
//! ## Example
//!
//! ```rust,ignore
//! use cretoai_scoping::{Requester, ScopingEngine};
//! use std::sync::Arc;
//!
//! let engine = ScopingEngine::new();
//! engine.register(Arc::new(ScopableByCity::default()))?;
//!
//! let report = Report { id: 1, city_id: Some(42) };
//! let requester = Requester::new(current_user);
//!
//! if engine.is_within_scope(&report, "hq", "ScopableByCity", &requester).await? {
//!     println!("Report is within scope");
//! }
//!
//! let visible = engine
//!     .apply_scope(all_reports, "hq", "ScopableByCity", &requester)
//!     .await?;
//! ```

pub mod association;
pub mod config;
pub mod engine;
pub mod error;
pub mod inflect;
pub mod scopable;
pub mod types;

pub use async_trait::async_trait;

// Re-export commonly used types
pub use association::{AssociationValue, RelationshipField, ScopedEntity};
pub use config::ScopingConfig;
pub use engine::{JoinKind, ScopeFilter, ScopedCollection, ScopingEngine, ScopingMetrics};
pub use error::{Result, ScopingError};
pub use inflect::{EnglishInflector, Inflector};
pub use scopable::{DimensionRef, ScopableRegistry, ScopingDimension};
pub use types::{id_set, IdSet, Keyword, Requester, ResolvedScope, ScopeId, ALL_KEYWORD};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

//! Shared fixtures for scoping integration tests
//!
//! Models a small reporting domain: cities, reports filed in one city,
//! products available in many cities, and a few deliberately broken types.

#![allow(dead_code)]

use cretoai_scoping::{
    async_trait, AssociationValue, RelationshipField, Requester, ResolvedScope, Result,
    ScopeId, ScopedEntity, ScopingConfig, ScopingDimension, ScopingEngine, ScopingError,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

pub const BY_CITY: &str = "ScopableByCity";
pub const BY_REGION: &str = "ScopableByRegion";

/// Install a test subscriber honouring `RUST_LOG`
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Principals
// ============================================================================

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub city_id: i64,
    pub supervised_city_ids: Vec<i64>,
}

pub fn requester(city_id: i64, supervised: &[i64]) -> Requester {
    Requester::new(User {
        id: 1,
        city_id,
        supervised_city_ids: supervised.to_vec(),
    })
}

// ============================================================================
// Scopables
// ============================================================================

/// Resolves city keywords and counts how often it was asked
#[derive(Default)]
pub struct ScopableByCity {
    calls: AtomicUsize,
}

impl ScopableByCity {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScopingDimension for ScopableByCity {
    fn name(&self) -> &str {
        BY_CITY
    }

    async fn available_keywords(&self, _requester: &Requester) -> Result<Vec<String>> {
        Ok(["hq", "own", "supervised", "everywhere", "nowhere", "flaky"]
            .iter()
            .map(|k| k.to_string())
            .collect())
    }

    async fn resolve_keyword(&self, keyword: &str, requester: &Requester) -> Result<ResolvedScope> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let user = requester.downcast_ref::<User>();
        match keyword {
            "hq" => Ok(ResolvedScope::ids([42])),
            "own" => Ok(ResolvedScope::ids(user.map(|u| u.city_id))),
            "supervised" => Ok(ResolvedScope::ids(
                user.map(|u| u.supervised_city_ids.clone()).unwrap_or_default(),
            )),
            "everywhere" => Ok(ResolvedScope::unbounded()),
            "flaky" => Err(ScopingError::resolver_failed(
                BY_CITY,
                std::io::Error::new(std::io::ErrorKind::TimedOut, "city store timed out"),
            )),
            _ => Ok(ResolvedScope::empty()),
        }
    }
}

/// Registered without implementing the resolver contract
pub struct ScopableByRegion;

#[async_trait]
impl ScopingDimension for ScopableByRegion {
    fn name(&self) -> &str {
        BY_REGION
    }
}

// ============================================================================
// Entities
// ============================================================================

macro_rules! no_id {
    () => {
        fn scope_id(&self) -> Option<ScopeId> {
            None
        }
    };
}

/// Self-scoping type
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub id: i64,
}

impl ScopedEntity for City {
    const TYPE_NAME: &'static str = "City";
    const SCOPABLES: &'static [&'static str] = &[BY_CITY];
    const RELATIONSHIPS: &'static [RelationshipField] =
        &[RelationshipField::new("reports", "Report")];

    fn scope_id(&self) -> Option<ScopeId> {
        Some(self.id.into())
    }

    fn association(&self, _name: &str) -> AssociationValue {
        AssociationValue::Unsupported("city has no scoping association")
    }
}

/// Filed in at most one city
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub id: i64,
    pub city_id: Option<i64>,
}

impl Report {
    pub fn new(id: i64, city_id: Option<i64>) -> Self {
        Self { id, city_id }
    }
}

impl ScopedEntity for Report {
    const TYPE_NAME: &'static str = "Report";
    const SCOPABLES: &'static [&'static str] = &[BY_CITY];
    const RELATIONSHIPS: &'static [RelationshipField] = &[
        RelationshipField::new("author", "User"),
        RelationshipField::new("city", "City"),
    ];

    fn scope_id(&self) -> Option<ScopeId> {
        Some(self.id.into())
    }

    fn association(&self, name: &str) -> AssociationValue {
        match name {
            "city" => AssociationValue::optional("City", self.city_id),
            "author" => AssociationValue::one("User", 1),
            _ => AssociationValue::Unsupported("unknown association"),
        }
    }
}

/// Available in many cities
#[derive(Debug, Clone, PartialEq)]
pub struct Product {
    pub id: i64,
    pub city_ids: Vec<i64>,
}

impl ScopedEntity for Product {
    const TYPE_NAME: &'static str = "Product";
    const SCOPABLES: &'static [&'static str] = &[BY_CITY];
    const RELATIONSHIPS: &'static [RelationshipField] =
        &[RelationshipField::new("cities", "City")];

    fn scope_id(&self) -> Option<ScopeId> {
        Some(self.id.into())
    }

    fn association(&self, name: &str) -> AssociationValue {
        match name {
            "cities" => AssociationValue::many(self.city_ids.clone()),
            _ => AssociationValue::Unsupported("unknown association"),
        }
    }
}

/// Both `city` and `cities`: inference is ambiguous
pub struct Announcement {
    pub city_id: i64,
    pub extra_city_ids: Vec<i64>,
}

impl ScopedEntity for Announcement {
    const TYPE_NAME: &'static str = "Announcement";
    const SCOPABLES: &'static [&'static str] = &[BY_CITY];
    const RELATIONSHIPS: &'static [RelationshipField] = &[
        RelationshipField::new("city", "City"),
        RelationshipField::new("cities", "City"),
    ];

    no_id!();

    fn association(&self, name: &str) -> AssociationValue {
        match name {
            "city" => AssociationValue::one("City", self.city_id),
            "cities" => AssociationValue::many(self.extra_city_ids.clone()),
            _ => AssociationValue::Unsupported("unknown association"),
        }
    }
}

/// Opts into cities but has no relationship to them
pub struct Memo;

impl ScopedEntity for Memo {
    const TYPE_NAME: &'static str = "Memo";
    const SCOPABLES: &'static [&'static str] = &[BY_CITY];
    const RELATIONSHIPS: &'static [RelationshipField] =
        &[RelationshipField::new("author", "User")];

    no_id!();

    fn association(&self, _name: &str) -> AssociationValue {
        AssociationValue::Unset
    }
}

/// Linked through a field inference cannot find; declares an override
pub struct Office {
    pub headquarters_id: i64,
}

impl ScopedEntity for Office {
    const TYPE_NAME: &'static str = "Office";
    const SCOPABLES: &'static [&'static str] = &[BY_CITY];
    const RELATIONSHIPS: &'static [RelationshipField] =
        &[RelationshipField::new("headquarters", "City")];

    fn association_override(dimension: &str) -> Option<&'static str> {
        (dimension == BY_CITY).then_some("headquarters")
    }

    no_id!();

    fn association(&self, name: &str) -> AssociationValue {
        match name {
            "headquarters" => AssociationValue::one("City", self.headquarters_id),
            _ => AssociationValue::Unsupported("unknown association"),
        }
    }
}

/// `city` yields a plain attribute instead of a city
pub struct Broken;

impl ScopedEntity for Broken {
    const TYPE_NAME: &'static str = "Broken";
    const SCOPABLES: &'static [&'static str] = &[BY_CITY];
    const RELATIONSHIPS: &'static [RelationshipField] =
        &[RelationshipField::new("city", "City")];

    no_id!();

    fn association(&self, _name: &str) -> AssociationValue {
        AssociationValue::Unsupported("string attribute")
    }
}

/// Opts into nothing
pub struct Note;

impl ScopedEntity for Note {
    const TYPE_NAME: &'static str = "Note";
    const SCOPABLES: &'static [&'static str] = &[];
    const RELATIONSHIPS: &'static [RelationshipField] =
        &[RelationshipField::new("city", "City")];

    no_id!();

    fn association(&self, _name: &str) -> AssociationValue {
        AssociationValue::Unset
    }
}

/// Scoped by region only
pub struct Site {
    pub region_id: i64,
}

impl ScopedEntity for Site {
    const TYPE_NAME: &'static str = "Site";
    const SCOPABLES: &'static [&'static str] = &[BY_REGION];
    const RELATIONSHIPS: &'static [RelationshipField] = &[
        RelationshipField::new("region", "Region"),
        RelationshipField::new("city", "City"),
    ];

    no_id!();

    fn association(&self, name: &str) -> AssociationValue {
        match name {
            "region" => AssociationValue::one("Region", self.region_id),
            _ => AssociationValue::Unsupported("unknown association"),
        }
    }
}

// ============================================================================
// Engine
// ============================================================================

/// Engine with both scopables registered, plus the city scopable handle
pub fn engine_with(config: ScopingConfig) -> (ScopingEngine, Arc<ScopableByCity>) {
    init_tracing();

    let engine = ScopingEngine::with_config(config);
    let by_city = Arc::new(ScopableByCity::default());
    engine
        .register(by_city.clone())
        .expect("register ScopableByCity");
    engine
        .register(Arc::new(ScopableByRegion))
        .expect("register ScopableByRegion");

    (engine, by_city)
}

pub fn engine() -> (ScopingEngine, Arc<ScopableByCity>) {
    engine_with(ScopingConfig::default())
}

//! Provider Search - facility search backend with profile match scoring
//!
//! Given a zip code, search radius and contact id, this service queries an
//! OData-style CRM for facility accounts inside a geographic bounding box,
//! compares each facility's clinical/residential profile options against
//! the contact's stated preferences, scores the matches with externally
//! configured rules, and returns a ranked provider list enriched with
//! media URLs.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{
    bounding_box, extract_options, match_criteria, partition_rules, resolve_friendly_names,
    score_criteria, SearchEngine, SearchError,
};
pub use models::{
    Account, Contact, GeoPoint, GeoRange, MatchScoringRule, OptionMap, ProfileCriteria,
    ProfileKind, ProviderResponse, ProviderSearchRequest, ProviderSearchResponse,
};

// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    Account, Contact, GeoPoint, GeoRange, MatchScoringRule, OptionMap, ProfileCriteria,
    ProfileKind, ProviderMedia,
};
pub use requests::ProviderSearchRequest;
pub use responses::{ErrorResponse, HealthResponse, ProviderResponse, ProviderSearchResponse};

// Service exports
pub mod dataverse;
pub mod geocode;
pub mod identity;
pub mod media;

use thiserror::Error;

pub use dataverse::DataverseClient;
pub use geocode::GeocodeClient;
pub use identity::{AuthError, IdentityClient};
pub use media::MediaStorageClient;

/// Errors shared by the upstream data services
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid response format: {0}")]
    InvalidResponse(String),
}

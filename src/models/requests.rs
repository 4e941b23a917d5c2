use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to search for providers around a zip code
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProviderSearchRequest {
    #[validate(length(min = 1))]
    #[serde(alias = "zipCode", rename = "zip")]
    pub zip: String,
    #[validate(range(min = 1))]
    #[serde(alias = "milesRadius", rename = "radius")]
    pub radius: u32,
    #[validate(length(min = 1))]
    #[serde(alias = "contact_id", rename = "contactId")]
    pub contact_id: String,
    #[serde(default = "default_result_count")]
    #[serde(alias = "result_count", rename = "resultCount")]
    pub result_count: u16,
}

fn default_result_count() -> u16 {
    10
}

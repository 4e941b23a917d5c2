use serde::{Deserialize, Serialize};
use crate::models::domain::{Account, ProfileCriteria, ProviderMedia};

/// URL-encode a nullable string field at the point of assignment.
///
/// The response contract percent-encodes every string field even though the
/// payload is JSON; downstream consumers depend on it.
fn encode(value: Option<&str>) -> Option<String> {
    value.map(|v| urlencoding::encode(v).into_owned())
}

/// One ranked provider row in the search response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderResponse {
    pub id: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub fax: Option<String>,
    #[serde(rename = "emailAddress")]
    pub email_address: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub city: Option<String>,
    #[serde(rename = "stateOrProvince")]
    pub state_or_province: Option<String>,
    #[serde(rename = "postalCode")]
    pub postal_code: Option<String>,
    pub headline: Option<String>,
    #[serde(rename = "currentPromotion")]
    pub current_promotion: Option<String>,
    #[serde(rename = "shortDescription")]
    pub short_description: Option<String>,
    #[serde(rename = "longDescription")]
    pub long_description: Option<String>,
    #[serde(rename = "mediaUrls")]
    pub media_urls: Vec<ProviderMedia>,
    #[serde(rename = "profileScore")]
    pub profile_score: i32,
    #[serde(rename = "matchedProfileCriteria")]
    pub matched_profile_criteria: Vec<ProfileCriteria>,
    #[serde(rename = "unmatchedProfileCriteria")]
    pub unmatched_profile_criteria: Vec<ProfileCriteria>,
}

impl ProviderResponse {
    /// Build a response row from an account's display fields. Criteria,
    /// score and media are filled in by the orchestrator.
    pub fn from_account(account: &Account) -> Self {
        Self {
            id: urlencoding::encode(&account.account_id).into_owned(),
            name: encode(account.name.as_deref()),
            phone: encode(account.phone.as_deref()),
            fax: encode(account.fax.as_deref()),
            email_address: encode(account.email.as_deref()),
            address1: encode(account.address1.as_deref()),
            address2: encode(account.address2.as_deref()),
            city: encode(account.city.as_deref()),
            state_or_province: encode(account.state_or_province.as_deref()),
            postal_code: encode(account.postal_code.as_deref()),
            headline: encode(account.headline.as_deref()),
            current_promotion: encode(account.current_promotions.as_deref()),
            short_description: encode(account.short_description.as_deref()),
            long_description: encode(account.long_description.as_deref()),
            media_urls: Vec::new(),
            profile_score: 0,
            matched_profile_criteria: Vec::new(),
            unmatched_profile_criteria: Vec::new(),
        }
    }

    /// Fixed demo record returned when no account survives filtering.
    /// Preserved as a documented fallback of the search contract.
    pub fn fallback() -> Self {
        Self {
            id: uuid::Uuid::nil().to_string(),
            name: encode(Some("Test Provider")),
            phone: encode(Some("000-000-0000")),
            fax: encode(Some("000-000-0000")),
            email_address: encode(Some("test@xyz.test")),
            address1: encode(Some("123 Main Street")),
            address2: encode(Some("Unit 500")),
            city: encode(Some("Phoenix")),
            state_or_province: encode(Some("AZ")),
            postal_code: encode(Some("85254")),
            headline: encode(Some("This is a headline")),
            current_promotion: encode(Some("This is the current promotion")),
            short_description: encode(Some("This is a short description")),
            long_description: encode(Some("This is a long description")),
            media_urls: Vec::new(),
            profile_score: 100,
            matched_profile_criteria: vec![ProfileCriteria::new("Onsite LPN")],
            unmatched_profile_criteria: vec![ProfileCriteria::new("Onsite Pharmacy")],
        }
    }
}

/// Envelope for the provider search endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderSearchResponse {
    pub error: bool,
    #[serde(rename = "errorMessage", skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub providers: Vec<ProviderResponse>,
}

impl ProviderSearchResponse {
    pub fn ok(providers: Vec<ProviderResponse>) -> Self {
        Self {
            error: false,
            error_message: None,
            providers,
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            error: true,
            error_message: Some(message),
            providers: Vec::new(),
        }
    }
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response for malformed requests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

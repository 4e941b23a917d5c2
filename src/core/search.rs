use crate::core::{geo, matcher, profile, scoring};
use crate::models::{
    Account, Contact, GeoPoint, GeoRange, MatchScoringRule, OptionMap, ProfileKind,
    ProviderMedia, ProviderResponse,
};
use crate::services::{AuthError, StoreError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

/// Service-to-service credential exchange
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn acquire_token(&self) -> Result<String, AuthError>;
}

/// Narrow read interface over the OData-style entity store.
///
/// One production adapter (DataverseClient) and one in-memory test double;
/// the bearer token is attached to every call rather than held by the
/// store, so a single client serves all requests.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn query(
        &self,
        token: &str,
        entity_set: &str,
        select: &[&str],
        filter: Option<&str>,
    ) -> Result<Vec<Value>, StoreError>;

    async fn query_by_id(
        &self,
        token: &str,
        entity_set: &str,
        select: &[&str],
        id: &str,
    ) -> Result<Value, StoreError>;
}

/// Postal-code geocoding
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn locate(&self, postal_code: &str) -> Result<GeoPoint, StoreError>;
}

/// Media listing for a record's storage folder
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn list_urls(&self, folder_key: &str) -> Result<Vec<String>, StoreError>;
}

/// Search pipeline failure taxonomy.
///
/// ContactNotFound and NoAccounts are recoverable at the route level (404
/// responses); everything else aborts the request as a hard failure. No
/// partial results accompany any error.
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("authentication failed: {0}")]
    Auth(#[from] AuthError),

    #[error("contact {0} not found")]
    ContactNotFound(String),

    #[error("no accounts found within {radius} miles of zip {zip}")]
    NoAccounts { zip: String, radius: u32 },

    #[error("no coordinates found for zip {0}")]
    ZipNotFound(String),

    #[error("upstream request failed: {0}")]
    Upstream(String),
}

impl From<StoreError> for SearchError {
    fn from(err: StoreError) -> Self {
        SearchError::Upstream(err.to_string())
    }
}

const ACCOUNT_ENTITY_SET: &str = "accounts";
const CONTACT_ENTITY_SET: &str = "contacts";
const CLINICAL_PROFILE_ENTITY_SET: &str = "nsat_clinicalprofiles";
const RESIDENTIAL_PROFILE_ENTITY_SET: &str = "nsat_residentialprofiles";
const SCORING_RULE_ENTITY_SET: &str = "nsat_matchscoringrules";

const ACCOUNT_SELECT: &[&str] = &[
    "name",
    "accountid",
    "telephone1",
    "address1_fax",
    "emailaddress1",
    "address1_line1",
    "address1_line2",
    "address1_city",
    "address1_stateorprovince",
    "address1_postalcode",
    "nsat_headline",
    "nsat_shortdescription",
    "nsat_longdescription",
    "address1_latitude",
    "address1_longitude",
    "_nsat_clinicalprofile_value",
    "_nsat_residentialprofile_value",
    "nsat_currentpromotions",
];

const CONTACT_SELECT: &[&str] = &[
    "contactid",
    "_nsat_clinicalprofile_value",
    "_nsat_residentialprofile_value",
    "fullname",
];

const RULE_SELECT: &[&str] = &[
    "nsat_profilefield",
    "nsat_score",
    "nsat_optionalmatch",
    "nsat_targetprofiletype",
    "nsat_profilefieldfriendlyname",
];

/// Account filter: bounding box plus active status
fn account_filter(range: &GeoRange) -> String {
    format!(
        "address1_latitude le {} and address1_latitude ge {} \
         and address1_longitude le {} and address1_longitude ge {} \
         and statecode eq 0",
        range.latitude_max, range.latitude_min, range.longitude_max, range.longitude_min
    )
}

/// Sequences one provider search: authenticate, fetch, match, score, rank.
///
/// All upstream calls are issued sequentially and awaited one at a time;
/// any failure aborts the whole request. Collaborators are trait objects so
/// the full pipeline runs against in-memory fakes in tests.
pub struct SearchEngine {
    identity: Arc<dyn TokenSource>,
    store: Arc<dyn EntityStore>,
    geocoder: Arc<dyn Geocoder>,
    media: Arc<dyn MediaStore>,
}

impl SearchEngine {
    pub fn new(
        identity: Arc<dyn TokenSource>,
        store: Arc<dyn EntityStore>,
        geocoder: Arc<dyn Geocoder>,
        media: Arc<dyn MediaStore>,
    ) -> Self {
        Self {
            identity,
            store,
            geocoder,
            media,
        }
    }

    /// Run the full search pipeline and return ranked provider rows.
    pub async fn search(
        &self,
        zip: &str,
        radius_miles: u32,
        contact_id: &str,
        result_count: usize,
    ) -> Result<Vec<ProviderResponse>, SearchError> {
        // The contact id is encoded here because the entity store
        // interpolates record ids verbatim. The zip stays raw; the geocoding
        // client encodes it exactly once when it builds its query string.
        let contact_id = urlencoding::encode(contact_id).into_owned();

        info!("Authenticating with the entity store");
        let token = self.identity.acquire_token().await?;
        debug!("Bearer token established");

        info!("Retrieving contact {}", contact_id);
        let contact = self.get_contact(&token, &contact_id).await?;
        info!("Contact retrieved with profile options");

        info!("Geocoding zip {} with radius {} miles", zip, radius_miles);
        let point = self.locate_zip(zip).await?;
        let range = geo::bounding_box(point, radius_miles);
        debug!(
            "Bounding box lat [{}, {}] lon [{}, {}]",
            range.latitude_min, range.latitude_max, range.longitude_min, range.longitude_max
        );

        let accounts = self.get_accounts(&token, &range).await?;
        if accounts.is_empty() {
            return Err(SearchError::NoAccounts {
                zip: zip.to_string(),
                radius: radius_miles,
            });
        }
        info!("{} accounts retrieved within the search radius", accounts.len());

        info!("Retrieving match scoring rules");
        let rules = self.get_scoring_rules(&token).await?;
        let (clinical_rules, residential_rules) = scoring::partition_rules(&rules);
        info!(
            "{} scoring rules loaded ({} clinical, {} residential)",
            rules.len(),
            clinical_rules.len(),
            residential_rules.len()
        );

        let mut providers = Vec::new();

        for account in accounts.iter().filter(|a| a.has_both_profiles()) {
            let mut provider = ProviderResponse::from_account(account);

            let (mut matched_clinical, mut unmatched_clinical) =
                matcher::match_criteria(&account.clinical_options, &contact.clinical_options);
            let (mut matched_residential, mut unmatched_residential) = matcher::match_criteria(
                &account.residential_options,
                &contact.residential_options,
            );

            // Score before friendly-name substitution; scoring always uses
            // the raw attribute name.
            let score = scoring::score_criteria(&matched_clinical, &clinical_rules)
                + scoring::score_criteria(&matched_residential, &residential_rules);

            scoring::resolve_friendly_names(&mut matched_clinical, &clinical_rules);
            scoring::resolve_friendly_names(&mut unmatched_clinical, &clinical_rules);
            scoring::resolve_friendly_names(&mut matched_residential, &residential_rules);
            scoring::resolve_friendly_names(&mut unmatched_residential, &residential_rules);

            provider.matched_profile_criteria.append(&mut matched_clinical);
            provider.matched_profile_criteria.append(&mut matched_residential);
            provider.unmatched_profile_criteria.append(&mut unmatched_clinical);
            provider
                .unmatched_profile_criteria
                .append(&mut unmatched_residential);
            provider.profile_score = score;

            provider.media_urls = self.get_media(account).await?;

            debug!(
                "Account {} scored {} ({} matched, {} unmatched)",
                account.account_id,
                provider.profile_score,
                provider.matched_profile_criteria.len(),
                provider.unmatched_profile_criteria.len()
            );

            providers.push(provider);
        }

        if providers.is_empty() {
            // Documented fallback: a fixed demo record rather than an empty
            // list.
            info!("No accounts with both profiles; returning fallback provider");
            return Ok(vec![ProviderResponse::fallback()]);
        }

        providers.sort_by(|a, b| b.profile_score.cmp(&a.profile_score));
        providers.truncate(result_count);

        info!("Returning {} ranked providers", providers.len());
        Ok(providers)
    }

    async fn get_contact(&self, token: &str, contact_id: &str) -> Result<Contact, SearchError> {
        let record = self
            .store
            .query_by_id(token, CONTACT_ENTITY_SET, CONTACT_SELECT, contact_id)
            .await
            .map_err(|err| match err {
                StoreError::NotFound(_) => SearchError::ContactNotFound(contact_id.to_string()),
                other => other.into(),
            })?;

        let mut contact: Contact = serde_json::from_value(record)
            .map_err(|err| SearchError::Upstream(format!("malformed contact record: {}", err)))?;

        if let Some(profile_id) = contact.clinical_profile_id.clone() {
            contact.clinical_options = self
                .get_profile_options(token, ProfileKind::Clinical, &profile_id, false)
                .await?;
        }
        if let Some(profile_id) = contact.residential_profile_id.clone() {
            contact.residential_options = self
                .get_profile_options(token, ProfileKind::Residential, &profile_id, false)
                .await?;
        }

        Ok(contact)
    }

    async fn locate_zip(&self, zip: &str) -> Result<GeoPoint, SearchError> {
        self.geocoder.locate(zip).await.map_err(|err| match err {
            StoreError::NotFound(_) => SearchError::ZipNotFound(zip.to_string()),
            other => other.into(),
        })
    }

    async fn get_accounts(
        &self,
        token: &str,
        range: &GeoRange,
    ) -> Result<Vec<Account>, SearchError> {
        let filter = account_filter(range);
        let records = self
            .store
            .query(token, ACCOUNT_ENTITY_SET, ACCOUNT_SELECT, Some(&filter))
            .await?;

        let mut accounts = Vec::with_capacity(records.len());
        for record in records {
            let account: Account = serde_json::from_value(record).map_err(|err| {
                SearchError::Upstream(format!("malformed account record: {}", err))
            })?;
            accounts.push(account);
        }

        // Per-account profile fetches, one remote call per profile type.
        for account in accounts.iter_mut() {
            if let Some(profile_id) = account.clinical_profile_id.clone() {
                account.clinical_options = self
                    .get_profile_options(token, ProfileKind::Clinical, &profile_id, true)
                    .await?;
            }
            if let Some(profile_id) = account.residential_profile_id.clone() {
                account.residential_options = self
                    .get_profile_options(token, ProfileKind::Residential, &profile_id, true)
                    .await?;
            }
        }

        Ok(accounts)
    }

    async fn get_profile_options(
        &self,
        token: &str,
        kind: ProfileKind,
        profile_id: &str,
        include_false: bool,
    ) -> Result<OptionMap, SearchError> {
        let entity_set = match kind {
            ProfileKind::Clinical => CLINICAL_PROFILE_ENTITY_SET,
            ProfileKind::Residential => RESIDENTIAL_PROFILE_ENTITY_SET,
        };

        let record = self
            .store
            .query_by_id(token, entity_set, &[], profile_id)
            .await?;

        Ok(profile::extract_options(&record, include_false))
    }

    async fn get_scoring_rules(&self, token: &str) -> Result<Vec<MatchScoringRule>, SearchError> {
        let records = self
            .store
            .query(token, SCORING_RULE_ENTITY_SET, RULE_SELECT, Some("statecode eq 0"))
            .await?;

        let mut rules = Vec::with_capacity(records.len());
        for record in records {
            let rule: MatchScoringRule = serde_json::from_value(record).map_err(|err| {
                SearchError::Upstream(format!("malformed scoring rule: {}", err))
            })?;
            rules.push(rule);
        }

        Ok(rules)
    }

    async fn get_media(&self, account: &Account) -> Result<Vec<ProviderMedia>, SearchError> {
        let folder_key = account.media_folder_key();
        let urls = self.media.list_urls(&folder_key).await?;

        if urls.is_empty() {
            // Sentinel for "no media found".
            return Ok(vec![ProviderMedia::placeholder()]);
        }

        Ok(urls.iter().map(|url| ProviderMedia::new(url)).collect())
    }
}

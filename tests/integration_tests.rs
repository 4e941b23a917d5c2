// End-to-end tests for the search pipeline over in-memory collaborators

use async_trait::async_trait;
use provider_search::core::{
    EntityStore, Geocoder, MediaStore, SearchEngine, SearchError, TokenSource,
};
use provider_search::models::GeoPoint;
use provider_search::services::{AuthError, GeocodeClient, StoreError};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

struct FakeIdentity;

#[async_trait]
impl TokenSource for FakeIdentity {
    async fn acquire_token(&self) -> Result<String, AuthError> {
        Ok("test-token".to_string())
    }
}

struct FakeGeocoder;

#[async_trait]
impl Geocoder for FakeGeocoder {
    async fn locate(&self, _postal_code: &str) -> Result<GeoPoint, StoreError> {
        Ok(GeoPoint {
            latitude: 33.4942,
            longitude: -111.9261,
        })
    }
}

/// In-memory entity store backing all four entity sets
#[derive(Default)]
struct FakeStore {
    contacts: HashMap<String, Value>,
    profiles: HashMap<String, Value>,
    accounts: Vec<Value>,
    rules: Vec<Value>,
}

#[async_trait]
impl EntityStore for FakeStore {
    async fn query(
        &self,
        token: &str,
        entity_set: &str,
        _select: &[&str],
        _filter: Option<&str>,
    ) -> Result<Vec<Value>, StoreError> {
        assert_eq!(token, "test-token");
        match entity_set {
            "accounts" => Ok(self.accounts.clone()),
            "nsat_matchscoringrules" => Ok(self.rules.clone()),
            other => Err(StoreError::Api(format!("unexpected entity set {}", other))),
        }
    }

    async fn query_by_id(
        &self,
        token: &str,
        entity_set: &str,
        _select: &[&str],
        id: &str,
    ) -> Result<Value, StoreError> {
        assert_eq!(token, "test-token");
        let record = match entity_set {
            "contacts" => self.contacts.get(id),
            "nsat_clinicalprofiles" | "nsat_residentialprofiles" => self.profiles.get(id),
            _ => None,
        };
        record
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("{}({})", entity_set, id)))
    }
}

#[derive(Default)]
struct FakeMedia {
    folders: HashMap<String, Vec<String>>,
}

#[async_trait]
impl MediaStore for FakeMedia {
    async fn list_urls(&self, folder_key: &str) -> Result<Vec<String>, StoreError> {
        Ok(self.folders.get(folder_key).cloned().unwrap_or_default())
    }
}

fn engine(store: FakeStore, media: FakeMedia) -> SearchEngine {
    SearchEngine::new(
        Arc::new(FakeIdentity),
        Arc::new(store),
        Arc::new(FakeGeocoder),
        Arc::new(media),
    )
}

fn account(id: &str, name: &str, clinical: Option<&str>, residential: Option<&str>) -> Value {
    json!({
        "accountid": id,
        "name": name,
        "telephone1": "480-555-0100",
        "address1_city": "Scottsdale",
        "address1_stateorprovince": "AZ",
        "address1_postalcode": "85251",
        "_nsat_clinicalprofile_value": clinical,
        "_nsat_residentialprofile_value": residential,
    })
}

fn rule(field: &str, score: i32, raw_kind: i64, friendly: &str) -> Value {
    json!({
        "nsat_profilefield": field,
        "nsat_score": score,
        "nsat_optionalmatch": false,
        "nsat_targetprofiletype": raw_kind,
        "nsat_profilefieldfriendlyname": friendly,
    })
}

const CLINICAL: i64 = 100000001;
const RESIDENTIAL: i64 = 100000000;

fn store_with_contact() -> FakeStore {
    let mut store = FakeStore::default();
    store.contacts.insert(
        "contact-1".to_string(),
        json!({
            "contactid": "contact-1",
            "fullname": "Searching User",
            "_nsat_clinicalprofile_value": "cp-contact",
            "_nsat_residentialprofile_value": "rp-contact",
        }),
    );
    store
}

#[tokio::test]
async fn test_search_ranks_by_score_descending() {
    let mut store = store_with_contact();
    store.profiles.insert(
        "cp-contact".to_string(),
        json!({"onsiteLPN": true, "woundCare": true}),
    );
    store.profiles.insert("rp-contact".to_string(), json!({"pool": true}));

    // Strong facility matches everything the contact wants.
    store.profiles.insert(
        "cp-strong".to_string(),
        json!({"onsiteLPN": true, "woundCare": true}),
    );
    store.profiles.insert("rp-strong".to_string(), json!({"pool": true}));

    // Weak facility disagrees on wound care and has no pool declared.
    store.profiles.insert(
        "cp-weak".to_string(),
        json!({"onsiteLPN": true, "woundCare": false}),
    );
    store.profiles.insert("rp-weak".to_string(), json!({"theater": true}));

    store.accounts = vec![
        account("a-weak", "Weak Facility", Some("cp-weak"), Some("rp-weak")),
        account("a-strong", "Strong Facility", Some("cp-strong"), Some("rp-strong")),
    ];
    store.rules = vec![
        rule("onsiteLPN", 10, CLINICAL, "Onsite LPN"),
        rule("woundCare", 5, CLINICAL, "Wound Care"),
        rule("pool", 3, RESIDENTIAL, "Pool"),
    ];

    let providers = engine(store, FakeMedia::default())
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap();

    assert_eq!(providers.len(), 2);
    assert_eq!(providers[0].name.as_deref(), Some("Strong%20Facility"));
    assert_eq!(providers[0].profile_score, 18);
    assert_eq!(providers[1].name.as_deref(), Some("Weak%20Facility"));
    assert_eq!(providers[1].profile_score, 10);

    // Weak facility's wound care disagreement shows up as unmatched.
    let unmatched: Vec<&str> = providers[1]
        .unmatched_profile_criteria
        .iter()
        .map(|c| c.attribute_name.as_str())
        .collect();
    assert_eq!(unmatched, vec!["woundCare"]);
}

#[tokio::test]
async fn test_truncates_to_result_count() {
    let mut store = store_with_contact();
    store.profiles.insert("cp-contact".to_string(), json!({"onsiteLPN": true}));
    store.profiles.insert("rp-contact".to_string(), json!({}));

    for i in 0..5 {
        let cp = format!("cp-{}", i);
        let rp = format!("rp-{}", i);
        store.profiles.insert(cp.clone(), json!({"onsiteLPN": true}));
        store.profiles.insert(rp.clone(), json!({}));
        store.accounts.push(account(
            &format!("a-{}", i),
            &format!("Facility {}", i),
            Some(cp.as_str()),
            Some(rp.as_str()),
        ));
    }
    store.rules = vec![rule("onsiteLPN", 10, CLINICAL, "")];

    let providers = engine(store, FakeMedia::default())
        .search("85251", 25, "contact-1", 2)
        .await
        .unwrap();

    assert_eq!(providers.len(), 2);
}

#[tokio::test]
async fn test_no_preferences_and_all_false_facility_still_listed() {
    let mut store = store_with_contact();
    // Contact profiles exist but contain no true values, so the extracted
    // preference maps are empty.
    store.profiles.insert(
        "cp-contact".to_string(),
        json!({"onsiteLPN": false, "woundCare": false}),
    );
    store.profiles.insert("rp-contact".to_string(), json!({"pool": false}));

    store.profiles.insert(
        "cp-1".to_string(),
        json!({"onsiteLPN": false, "woundCare": false}),
    );
    store.profiles.insert("rp-1".to_string(), json!({"pool": false}));
    store.accounts = vec![account("a-1", "All False Facility", Some("cp-1"), Some("rp-1"))];
    store.rules = vec![rule("onsiteLPN", 10, CLINICAL, "")];

    let providers = engine(store, FakeMedia::default())
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap();

    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].profile_score, 0);
    assert!(providers[0].matched_profile_criteria.is_empty());
    assert!(providers[0].unmatched_profile_criteria.is_empty());
}

#[tokio::test]
async fn test_accounts_without_both_profiles_are_excluded() {
    let mut store = store_with_contact();
    store.profiles.insert("cp-contact".to_string(), json!({"onsiteLPN": true}));
    store.profiles.insert("rp-contact".to_string(), json!({}));

    store.profiles.insert("cp-1".to_string(), json!({"onsiteLPN": true}));
    store.profiles.insert("rp-1".to_string(), json!({}));
    store.accounts = vec![
        account("a-full", "Full Profile", Some("cp-1"), Some("rp-1")),
        account("a-partial", "Clinical Only", Some("cp-1"), None),
        account("a-none", "No Profiles", None, None),
    ];
    store.rules = vec![rule("onsiteLPN", 10, CLINICAL, "")];

    let providers = engine(store, FakeMedia::default())
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap();

    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].name.as_deref(), Some("Full%20Profile"));
}

#[tokio::test]
async fn test_fallback_provider_when_nothing_survives_filtering() {
    let mut store = store_with_contact();
    store.profiles.insert("cp-contact".to_string(), json!({"onsiteLPN": true}));
    store.profiles.insert("rp-contact".to_string(), json!({}));
    store.profiles.insert("cp-1".to_string(), json!({"onsiteLPN": true}));

    // Accounts exist in range but none carries both profile references.
    store.accounts = vec![account("a-partial", "Clinical Only", Some("cp-1"), None)];
    store.rules = vec![];

    let providers = engine(store, FakeMedia::default())
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap();

    assert_eq!(providers.len(), 1);
    assert_eq!(providers[0].id, "00000000-0000-0000-0000-000000000000");
    assert_eq!(providers[0].profile_score, 100);
    assert_eq!(providers[0].matched_profile_criteria[0].attribute_name, "Onsite%20LPN");
    assert_eq!(
        providers[0].unmatched_profile_criteria[0].attribute_name,
        "Onsite%20Pharmacy"
    );
}

#[tokio::test]
async fn test_empty_account_query_is_not_found() {
    // The contact profile fetches happen before the account query.
    let mut store = store_with_contact();
    store.profiles.insert("cp-contact".to_string(), json!({}));
    store.profiles.insert("rp-contact".to_string(), json!({}));

    let err = engine(store, FakeMedia::default())
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::NoAccounts { .. }));
}

#[tokio::test]
async fn test_missing_contact_is_not_found() {
    let store = FakeStore::default();

    let err = engine(store, FakeMedia::default())
        .search("85251", 25, "missing-contact", 10)
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::ContactNotFound(_)));
}

#[tokio::test]
async fn test_media_urls_attached_with_empty_sentinel() {
    let mut store = store_with_contact();
    store.profiles.insert("cp-contact".to_string(), json!({"onsiteLPN": true}));
    store.profiles.insert("rp-contact".to_string(), json!({}));

    store.profiles.insert("cp-1".to_string(), json!({"onsiteLPN": true}));
    store.profiles.insert("rp-1".to_string(), json!({}));
    store.accounts = vec![
        account("AB-12", "With Media", Some("cp-1"), Some("rp-1")),
        account("CD-34", "Without Media", Some("cp-1"), Some("rp-1")),
    ];
    store.rules = vec![];

    let mut media = FakeMedia::default();
    // Folder key is the account id lower-cased with hyphens removed.
    media.folders.insert(
        "ab12".to_string(),
        vec!["https://cdn.test/ab12/front.jpg".to_string()],
    );

    let providers = engine(store, media)
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap();

    let with_media = providers
        .iter()
        .find(|p| p.name.as_deref() == Some("With%20Media"))
        .unwrap();
    assert_eq!(with_media.media_urls.len(), 1);
    assert_eq!(
        with_media.media_urls[0].url_value,
        "https%3A%2F%2Fcdn.test%2Fab12%2Ffront.jpg"
    );

    let without_media = providers
        .iter()
        .find(|p| p.name.as_deref() == Some("Without%20Media"))
        .unwrap();
    assert_eq!(without_media.media_urls.len(), 1);
    assert_eq!(without_media.media_urls[0].url_value, "");
}

#[tokio::test]
async fn test_space_bearing_zip_encoded_once_for_geocoding() {
    let mut server = mockito::Server::new_async().await;
    // Only the single-encoded location matches; a double-encoded request
    // (location=K1A%25200B1) would miss the mock and fail the pipeline.
    let mock = server
        .mock("GET", "/geocode?key=k-1&location=K1A%200B1")
        .with_status(200)
        .with_body(
            r#"{"results": [{"locations": [{"latLng": {"lat": 45.4215, "lng": -75.6972}}]}]}"#,
        )
        .create_async()
        .await;

    let mut store = store_with_contact();
    store.profiles.insert("cp-contact".to_string(), json!({}));
    store.profiles.insert("rp-contact".to_string(), json!({}));

    let geocoder = GeocodeClient::new(format!("{}/geocode", server.url()), "k-1".to_string());
    let engine = SearchEngine::new(
        Arc::new(FakeIdentity),
        Arc::new(store),
        Arc::new(geocoder),
        Arc::new(FakeMedia::default()),
    );

    // No accounts configured; the geocoder is still reached first.
    let err = engine
        .search("K1A 0B1", 25, "contact-1", 10)
        .await
        .unwrap_err();

    assert!(matches!(err, SearchError::NoAccounts { .. }));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_search_is_idempotent() {
    fn build_store() -> FakeStore {
        let mut store = store_with_contact();
        store.profiles.insert(
            "cp-contact".to_string(),
            json!({"onsiteLPN": true, "woundCare": true}),
        );
        store.profiles.insert("rp-contact".to_string(), json!({"pool": true}));
        store.profiles.insert(
            "cp-1".to_string(),
            json!({"onsiteLPN": true, "woundCare": false, "catheterCare": true}),
        );
        store.profiles.insert("rp-1".to_string(), json!({"pool": true, "theater": false}));
        store.accounts = vec![account("a-1", "Facility", Some("cp-1"), Some("rp-1"))];
        store.rules = vec![
            rule("onsiteLPN", 10, CLINICAL, "Onsite LPN"),
            rule("pool", 3, RESIDENTIAL, "Pool"),
        ];
        store
    }

    let first = engine(build_store(), FakeMedia::default())
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap();
    let second = engine(build_store(), FakeMedia::default())
        .search("85251", 25, "contact-1", 10)
        .await
        .unwrap();

    assert_eq!(
        serde_json::to_value(&first).unwrap(),
        serde_json::to_value(&second).unwrap()
    );
    assert_eq!(first[0].profile_score, 13);
}

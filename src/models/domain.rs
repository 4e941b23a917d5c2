use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Flattened profile record: attribute name -> declared/requested flag.
///
/// A BTreeMap keeps iteration order deterministic (sorted by key), so the
/// matched/unmatched criteria lists come out in a reproducible order.
pub type OptionMap = BTreeMap<String, bool>;

/// Geocoded location of a zip code
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// Rectangular lat/long search area derived from a GeoPoint and a radius
#[derive(Debug, Clone, Copy)]
pub struct GeoRange {
    pub latitude_min: f64,
    pub latitude_max: f64,
    pub longitude_min: f64,
    pub longitude_max: f64,
}

/// Profile category a scoring rule or option map belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileKind {
    Residential,
    Clinical,
}

impl ProfileKind {
    /// Dataverse option-set raw values for nsat_targetprofiletype
    pub const RAW_RESIDENTIAL: i64 = 100000000;
    pub const RAW_CLINICAL: i64 = 100000001;

    /// Map an option-set raw value to a profile kind. Unknown values belong
    /// to neither category and their rules never contribute to a score.
    pub fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            Self::RAW_RESIDENTIAL => Some(ProfileKind::Residential),
            Self::RAW_CLINICAL => Some(ProfileKind::Clinical),
            _ => None,
        }
    }
}

/// Candidate facility account from the CRM `accounts` entity set.
///
/// Field names mirror the Dataverse columns selected by the account query.
/// The two option maps are not part of the wire record; they are attached
/// after the per-profile follow-up fetches and never mutated afterwards.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Account {
    #[serde(rename = "accountid")]
    pub account_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(rename = "telephone1", default)]
    pub phone: Option<String>,
    #[serde(rename = "address1_fax", default)]
    pub fax: Option<String>,
    #[serde(rename = "emailaddress1", default)]
    pub email: Option<String>,
    #[serde(rename = "address1_line1", default)]
    pub address1: Option<String>,
    #[serde(rename = "address1_line2", default)]
    pub address2: Option<String>,
    #[serde(rename = "address1_city", default)]
    pub city: Option<String>,
    #[serde(rename = "address1_stateorprovince", default)]
    pub state_or_province: Option<String>,
    #[serde(rename = "address1_postalcode", default)]
    pub postal_code: Option<String>,
    #[serde(rename = "nsat_headline", default)]
    pub headline: Option<String>,
    #[serde(rename = "nsat_currentpromotions", default)]
    pub current_promotions: Option<String>,
    #[serde(rename = "nsat_shortdescription", default)]
    pub short_description: Option<String>,
    #[serde(rename = "nsat_longdescription", default)]
    pub long_description: Option<String>,
    #[serde(rename = "address1_latitude", default)]
    pub latitude: Option<f64>,
    #[serde(rename = "address1_longitude", default)]
    pub longitude: Option<f64>,
    #[serde(rename = "_nsat_clinicalprofile_value", default)]
    pub clinical_profile_id: Option<String>,
    #[serde(rename = "_nsat_residentialprofile_value", default)]
    pub residential_profile_id: Option<String>,
    #[serde(skip)]
    pub clinical_options: OptionMap,
    #[serde(skip)]
    pub residential_options: OptionMap,
}

impl Account {
    /// An account only participates in matching when both profile
    /// references are set.
    pub fn has_both_profiles(&self) -> bool {
        self.clinical_profile_id.is_some() && self.residential_profile_id.is_some()
    }

    /// Folder key for the media store: account id with hyphens removed,
    /// lower-cased.
    pub fn media_folder_key(&self) -> String {
        self.account_id.replace('-', "").to_lowercase()
    }
}

/// Searching user from the CRM `contacts` entity set.
///
/// Option maps hold only true-valued attributes: a contact expresses
/// affirmative preferences, while an account exposes its full option
/// surface including explicit false values.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Contact {
    #[serde(rename = "contactid")]
    pub contact_id: String,
    #[serde(rename = "fullname", default)]
    pub full_name: Option<String>,
    #[serde(rename = "_nsat_clinicalprofile_value", default)]
    pub clinical_profile_id: Option<String>,
    #[serde(rename = "_nsat_residentialprofile_value", default)]
    pub residential_profile_id: Option<String>,
    #[serde(skip)]
    pub clinical_options: OptionMap,
    #[serde(skip)]
    pub residential_options: OptionMap,
}

/// Externally configured weight for one profile attribute.
///
/// Loaded once per search from `nsat_matchscoringrules` and treated as a
/// read-only lookup table. Field lookups are case-insensitive.
#[derive(Debug, Clone, Deserialize)]
pub struct MatchScoringRule {
    #[serde(rename = "nsat_profilefield")]
    pub field: String,
    #[serde(rename = "nsat_score")]
    pub score: i32,
    #[serde(rename = "nsat_optionalmatch", default)]
    pub optional_match: bool,
    #[serde(rename = "nsat_targetprofiletype")]
    pub target_profile_type: i64,
    #[serde(
        rename = "nsat_profilefieldfriendlyname",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub friendly_name: String,
}

impl MatchScoringRule {
    pub fn kind(&self) -> Option<ProfileKind> {
        ProfileKind::from_raw(self.target_profile_type)
    }

    pub fn applies_to(&self, attribute_name: &str) -> bool {
        self.field.eq_ignore_ascii_case(attribute_name)
    }
}

/// A null friendly name on the wire is normalized to an empty string.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.unwrap_or_default())
}

/// One matched or unmatched profile attribute in a search result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileCriteria {
    #[serde(rename = "attributeName")]
    pub attribute_name: String,
    #[serde(rename = "friendlyName", skip_serializing_if = "Option::is_none")]
    pub friendly_name: Option<String>,
}

impl ProfileCriteria {
    /// Attribute names are URL-encoded at the point of assignment, matching
    /// the response contract.
    pub fn new(attribute_name: &str) -> Self {
        Self {
            attribute_name: urlencoding::encode(attribute_name).into_owned(),
            friendly_name: None,
        }
    }
}

/// One media entry for a provider. An empty urlValue is the sentinel for
/// "no media found".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderMedia {
    #[serde(rename = "urlValue")]
    pub url_value: String,
}

impl ProviderMedia {
    pub fn new(url: &str) -> Self {
        Self {
            url_value: urlencoding::encode(url).into_owned(),
        }
    }

    pub fn placeholder() -> Self {
        Self {
            url_value: String::new(),
        }
    }
}

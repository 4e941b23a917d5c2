// Core algorithm exports
pub mod geo;
pub mod matcher;
pub mod profile;
pub mod scoring;
pub mod search;

pub use geo::bounding_box;
pub use matcher::match_criteria;
pub use profile::extract_options;
pub use scoring::{partition_rules, resolve_friendly_names, score_criteria};
pub use search::{EntityStore, Geocoder, MediaStore, SearchEngine, SearchError, TokenSource};

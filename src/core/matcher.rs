use crate::models::{OptionMap, ProfileCriteria};

/// Compare a facility's declared options against a contact's stated
/// preferences for one profile category.
///
/// Only keys the facility declares are considered. A key the contact has
/// also expressed lands in `matched` when the values agree and `unmatched`
/// when they differ; keys the contact never expressed are skipped entirely.
/// A contact with no stated preferences matches nothing and has nothing
/// unmatched.
///
/// The facility map iterates in key order, so output is deterministic for
/// identical inputs.
pub fn match_criteria(
    facility_options: &OptionMap,
    contact_options: &OptionMap,
) -> (Vec<ProfileCriteria>, Vec<ProfileCriteria>) {
    if contact_options.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let mut matched = Vec::new();
    let mut unmatched = Vec::new();

    for (attribute, declared) in facility_options {
        match contact_options.get(attribute) {
            Some(requested) if requested == declared => {
                matched.push(ProfileCriteria::new(attribute));
            }
            Some(_) => {
                unmatched.push(ProfileCriteria::new(attribute));
            }
            None => {}
        }
    }

    (matched, unmatched)
}

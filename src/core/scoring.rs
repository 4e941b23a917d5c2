use crate::models::{MatchScoringRule, ProfileCriteria, ProfileKind};

/// Split the scoring-rule table into its clinical and residential subsets.
///
/// Rules with an unrecognized target profile type fall into neither subset
/// and never contribute to a score.
pub fn partition_rules(
    rules: &[MatchScoringRule],
) -> (Vec<&MatchScoringRule>, Vec<&MatchScoringRule>) {
    let clinical = rules
        .iter()
        .filter(|r| r.kind() == Some(ProfileKind::Clinical))
        .collect();
    let residential = rules
        .iter()
        .filter(|r| r.kind() == Some(ProfileKind::Residential))
        .collect();

    (clinical, residential)
}

/// Sum the configured weights for the matched criteria of one category.
///
/// Every rule whose field equals the criterion's attribute name
/// (case-insensitively) contributes its score; duplicate-field rules all
/// count. A criterion with no rule contributes zero.
pub fn score_criteria(matched: &[ProfileCriteria], rules: &[&MatchScoringRule]) -> i32 {
    matched
        .iter()
        .map(|criterion| {
            rules
                .iter()
                .filter(|rule| rule.applies_to(&criterion.attribute_name))
                .map(|rule| rule.score)
                .sum::<i32>()
        })
        .sum()
}

/// Rewrite criteria with display names from the scoring-rule table.
///
/// The first rule whose field matches supplies the friendly name; criteria
/// with no matching rule are left unset. Display-only: scoring always uses
/// the raw attribute name and runs before this substitution.
pub fn resolve_friendly_names(criteria: &mut [ProfileCriteria], rules: &[&MatchScoringRule]) {
    for criterion in criteria.iter_mut() {
        if let Some(rule) = rules
            .iter()
            .find(|rule| rule.applies_to(&criterion.attribute_name))
        {
            criterion.friendly_name = Some(urlencoding::encode(&rule.friendly_name).into_owned());
        }
    }
}

//! Ranking catalog policy
//!
//! The catalog maps sentiment labels to numeric ranks. Two reserved values
//! never reach the classifier: `0` (unranked) and `999` (not applicable).

use crate::models::Ranking;

/// Reserved rank for "unranked"
pub const UNRANKED_VALUE: i32 = 0;

/// Reserved rank for "not applicable"
pub const NOT_APPLICABLE_VALUE: i32 = 999;

/// Placeholder substituted in the prompt template
pub const RANKINGS_PLACEHOLDER: &str = "{rankings}";

/// Check whether a ranking is one of the reserved sentinels
pub fn is_sentinel(ranking: &Ranking) -> bool {
    ranking.ranking_value == UNRANKED_VALUE || ranking.ranking_value == NOT_APPLICABLE_VALUE
}

/// Rankings the classifier may choose from, in catalog order
pub fn allowed_rankings(catalog: &[Ranking]) -> Vec<&Ranking> {
    catalog.iter().filter(|r| !is_sentinel(r)).collect()
}

/// Comma-separated list of allowed labels
pub fn label_list(catalog: &[Ranking]) -> String {
    allowed_rankings(catalog)
        .iter()
        .map(|r| r.ranking_name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Substitute the allowed labels into `template` and append the review
pub fn render_prompt(template: &str, catalog: &[Ranking], review: &str) -> String {
    let base = template.replace(RANKINGS_PLACEHOLDER, &label_list(catalog));
    format!("{base}{review}")
}

/// Resolve a classifier label to its ranking by exact match
///
/// Only allowed (non-sentinel) rankings are considered.
pub fn resolve_label(catalog: &[Ranking], label: &str) -> Option<Ranking> {
    allowed_rankings(catalog)
        .into_iter()
        .find(|r| r.ranking_name == label)
        .cloned()
}

/// Default catalog, used to seed empty in-memory stores
pub fn default_catalog() -> Vec<Ranking> {
    vec![
        Ranking::new("Excellent", 1),
        Ranking::new("Good", 2),
        Ranking::new("Okay", 3),
        Ranking::new("Bad", 4),
        Ranking::new("Terrible", 5),
        Ranking::new("Not_Ranked", NOT_APPLICABLE_VALUE),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn catalog() -> Vec<Ranking> {
        vec![
            Ranking::new("Unranked", UNRANKED_VALUE),
            Ranking::new("Positive", 10),
            Ranking::new("Neutral", 20),
            Ranking::new("Negative", 30),
            Ranking::new("Not_Ranked", NOT_APPLICABLE_VALUE),
        ]
    }

    #[test]
    fn test_label_list_excludes_sentinels() {
        assert_eq!(label_list(&catalog()), "Positive,Neutral,Negative");
    }

    #[test]
    fn test_render_prompt_replaces_every_placeholder() {
        let prompt = render_prompt(
            "Pick one of {rankings}. Only answer with {rankings}.\nReview: ",
            &catalog(),
            "Loved it",
        );

        assert_eq!(
            prompt,
            "Pick one of Positive,Neutral,Negative. Only answer with Positive,Neutral,Negative.\nReview: Loved it"
        );
    }

    #[test]
    fn test_resolve_label() {
        assert_eq!(
            resolve_label(&catalog(), "Positive"),
            Some(Ranking::new("Positive", 10))
        );
        assert_eq!(resolve_label(&catalog(), "positive"), None);
        assert_eq!(resolve_label(&catalog(), "Not_Ranked"), None);
        assert_eq!(resolve_label(&catalog(), ""), None);
    }

    #[test]
    fn test_default_catalog_has_allowed_labels() {
        assert_eq!(allowed_rankings(&default_catalog()).len(), 5);
    }

    proptest! {
        #[test]
        fn prop_sentinels_never_offered(values in proptest::collection::vec(0i32..1000, 0..20)) {
            let catalog: Vec<Ranking> = values
                .iter()
                .enumerate()
                .map(|(i, v)| Ranking::new(format!("L{i}"), *v))
                .collect();

            for ranking in allowed_rankings(&catalog) {
                prop_assert!(ranking.ranking_value != UNRANKED_VALUE);
                prop_assert!(ranking.ranking_value != NOT_APPLICABLE_VALUE);
            }
        }

        #[test]
        fn prop_offered_labels_resolve_to_their_value(values in proptest::collection::vec(1i32..999, 1..20)) {
            let catalog: Vec<Ranking> = values
                .iter()
                .enumerate()
                .map(|(i, v)| Ranking::new(format!("L{i}"), *v))
                .collect();

            for ranking in &catalog {
                let resolved = resolve_label(&catalog, &ranking.ranking_name);
                prop_assert_eq!(resolved.as_ref(), Some(ranking));
            }
        }
    }
}

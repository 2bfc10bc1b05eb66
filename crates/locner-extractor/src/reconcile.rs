//! Span reconciliation
//!
//! Merges candidate spans from the gazetteer, the type vocabulary and the
//! sequence labeler into one ordered list of non-overlapping findings.
//!
//! Priority is fixed: exact_match > type_match > model. A candidate is
//! admitted only if it does not intersect a span already claimed by its own
//! tier or a more trusted one. Within a tier, longer candidates are tried
//! first, ties going to the earlier start.

use std::collections::BTreeMap;

use locner_core::{EntityType, Finding, Prediction, Source, Span};

use crate::lexicon::Lexicon;

/// Disjoint set of claimed intervals, keyed by start offset
#[derive(Debug, Default)]
pub struct ClaimedSpans {
    by_start: BTreeMap<usize, usize>,
}

impl ClaimedSpans {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `span` intersects any claimed interval
    pub fn overlaps(&self, span: Span) -> bool {
        // Claimed intervals are disjoint, so the one starting closest
        // before `span.end` is the only candidate for an intersection.
        self.by_start
            .range(..span.end)
            .next_back()
            .is_some_and(|(_, &end)| end > span.start)
    }

    /// Claim `span` unless it is empty or intersects a claimed interval
    pub fn try_claim(&mut self, span: Span) -> bool {
        if span.is_empty() || self.overlaps(span) {
            return false;
        }
        self.by_start.insert(span.start, span.end);
        true
    }

    pub fn len(&self) -> usize {
        self.by_start.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_start.is_empty()
    }
}

/// A span proposed by one of the producers
#[derive(Debug, Clone)]
struct Candidate {
    span: Span,
    entity_type: EntityType,
    score: Option<f32>,
}

/// Reconcile lexicon matches and model predictions for `text`
pub fn reconcile(
    text: &str,
    gazetteer: &Lexicon,
    types: &Lexicon,
    predictions: &[Prediction],
) -> Vec<Finding> {
    let mut claimed = ClaimedSpans::new();
    let mut findings = Vec::new();

    let places = gazetteer
        .find(text)
        .into_iter()
        .map(|span| Candidate {
            span,
            entity_type: EntityType::Loc,
            score: None,
        })
        .collect();
    admit_tier(text, places, Source::ExactMatch, &mut claimed, &mut findings);

    let type_words = types
        .find(text)
        .into_iter()
        .map(|span| Candidate {
            span,
            entity_type: EntityType::Type,
            score: None,
        })
        .collect();
    admit_tier(text, type_words, Source::TypeMatch, &mut claimed, &mut findings);

    let predicted = predictions
        .iter()
        .filter(|p| {
            let valid = p.span().slice(text).is_some();
            if !valid {
                tracing::warn!(
                    label = %p.label,
                    start = p.start,
                    end = p.end,
                    "Discarding prediction with invalid offsets"
                );
            }
            valid
        })
        .map(|p| Candidate {
            span: p.span(),
            entity_type: EntityType::Model(p.label.clone()),
            score: p.score,
        })
        .collect();
    admit_tier(text, predicted, Source::Model, &mut claimed, &mut findings);

    sort_findings(&mut findings);
    findings
}

fn admit_tier(
    text: &str,
    mut candidates: Vec<Candidate>,
    source: Source,
    claimed: &mut ClaimedSpans,
    findings: &mut Vec<Finding>,
) {
    // Stable, so equal spans keep producer order
    candidates.sort_by(|a, b| {
        b.span
            .len()
            .cmp(&a.span.len())
            .then(a.span.start.cmp(&b.span.start))
    });

    for candidate in candidates {
        if !claimed.try_claim(candidate.span) {
            continue;
        }
        if let Some(finding) = Finding::from_span(text, candidate.span, candidate.entity_type, source)
        {
            findings.push(finding.with_score(candidate.score));
        }
    }
}

/// Ascending start, then longer span first, then source priority
pub fn sort_findings(findings: &mut [Finding]) {
    findings.sort_by(|a, b| {
        a.start
            .cmp(&b.start)
            .then(b.span().len().cmp(&a.span().len()))
            .then(a.source.rank().cmp(&b.source.rank()))
    });
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::MatchOptions;
    use proptest::prelude::*;

    fn lexicon(entries: &[&str]) -> Lexicon {
        Lexicon::from_entries(entries, MatchOptions::default()).unwrap()
    }

    fn prediction(text: &str, needle: &str, label: &str) -> Prediction {
        let start = text.find(needle).unwrap();
        Prediction {
            text: needle.to_string(),
            label: label.to_string(),
            start,
            end: start + needle.len(),
            score: Some(0.9),
        }
    }

    fn summary(findings: &[Finding]) -> Vec<(&str, &str, Source)> {
        findings
            .iter()
            .map(|f| (f.text.as_str(), f.entity_type.as_str(), f.source))
            .collect()
    }

    #[test]
    fn test_travel_narrative() {
        let text = "I visited Kathmandu and Pokhara last summer. The hotel was near Thamel Chowk.";
        let gazetteer = lexicon(&["Kathmandu", "Pokhara", "Thamel Chowk"]);
        let types = lexicon(&["hotel"]);

        let findings = reconcile(text, &gazetteer, &types, &[]);

        assert_eq!(
            summary(&findings),
            vec![
                ("Kathmandu", "LOC", Source::ExactMatch),
                ("Pokhara", "LOC", Source::ExactMatch),
                ("hotel", "TYPE", Source::TypeMatch),
                ("Thamel Chowk", "LOC", Source::ExactMatch),
            ]
        );
        for finding in &findings {
            assert_eq!(&text[finding.start..finding.end], finding.text);
        }
    }

    #[test]
    fn test_empty_input() {
        let findings = reconcile("", &lexicon(&["Kathmandu"]), &lexicon(&["hotel"]), &[]);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_no_matches() {
        let findings = reconcile(
            "Nothing to see here.",
            &lexicon(&["Kathmandu"]),
            &lexicon(&["hotel"]),
            &[],
        );
        assert!(findings.is_empty());
    }

    #[test]
    fn test_model_prediction_dropped_under_gazetteer_match() {
        let text = "Flying into Kathmandu tomorrow";
        let predictions = vec![
            prediction(text, "Kathmandu", "GPE"),
            prediction(text, "into Kathmandu", "LOC"),
        ];

        let findings = reconcile(text, &lexicon(&["Kathmandu"]), &lexicon(&["hotel"]), &predictions);

        assert_eq!(summary(&findings), vec![("Kathmandu", "LOC", Source::ExactMatch)]);
    }

    #[test]
    fn test_type_word_inside_place_name_is_dropped() {
        let text = "We stayed at Lakeside Hotel by the lake.";
        let gazetteer = lexicon(&["Lakeside Hotel"]);
        let types = lexicon(&["Hotel", "lake"]);

        let findings = reconcile(text, &gazetteer, &types, &[]);

        assert_eq!(
            summary(&findings),
            vec![
                ("Lakeside Hotel", "LOC", Source::ExactMatch),
                ("lake", "TYPE", Source::TypeMatch),
            ]
        );
    }

    #[test]
    fn test_model_fills_gaps() {
        let text = "The river near Bhaktapur was calm";
        let predictions = vec![
            prediction(text, "river", "LOC"),
            prediction(text, "Bhaktapur", "GPE"),
        ];

        let findings = reconcile(text, &lexicon(&["Pokhara"]), &lexicon(&["river"]), &predictions);

        assert_eq!(
            summary(&findings),
            vec![
                ("river", "TYPE", Source::TypeMatch),
                ("Bhaktapur", "GPE", Source::Model),
            ]
        );
        assert_eq!(findings[0].score, None);
        assert_eq!(findings[1].score, Some(0.9));
    }

    #[test]
    fn test_longest_gazetteer_entry_wins() {
        let text = "Welcome to New York City";
        let gazetteer = lexicon(&["York", "New York", "York City"]);

        let findings = reconcile(text, &gazetteer, &lexicon(&["x"]), &[]);

        // "York City" is one byte longer than "New York"
        assert_eq!(summary(&findings), vec![("York City", "LOC", Source::ExactMatch)]);

        let findings = reconcile("New York", &lexicon(&["York", "New York"]), &lexicon(&["x"]), &[]);
        assert_eq!(summary(&findings), vec![("New York", "LOC", Source::ExactMatch)]);
    }

    #[test]
    fn test_adjacent_spans_both_kept() {
        let text = "ThamelChowk";
        let gazetteer = lexicon(&["Thamel"]);
        let types = lexicon(&["Chowk"]);

        let findings = reconcile(text, &gazetteer, &types, &[]);

        assert_eq!(
            summary(&findings),
            vec![
                ("Thamel", "LOC", Source::ExactMatch),
                ("Chowk", "TYPE", Source::TypeMatch),
            ]
        );
    }

    #[test]
    fn test_invalid_predictions_discarded() {
        let text = "Zürich lake";
        let predictions = vec![
            Prediction {
                text: "Z".to_string(),
                label: "LOC".to_string(),
                start: 0,
                end: 2, // inside 'ü'
                score: None,
            },
            Prediction {
                text: "lake".to_string(),
                label: "LOC".to_string(),
                start: 8,
                end: 40,
                score: None,
            },
            Prediction {
                text: String::new(),
                label: "LOC".to_string(),
                start: 3,
                end: 3,
                score: None,
            },
        ];

        let findings = reconcile(text, &lexicon(&["x"]), &lexicon(&["y"]), &predictions);
        assert!(findings.is_empty());
    }

    #[test]
    fn test_finding_text_comes_from_input() {
        let text = "Visit Patan";
        let predictions = vec![Prediction {
            text: "patan".to_string(),
            label: "LOC".to_string(),
            start: 6,
            end: 11,
            score: None,
        }];

        let findings = reconcile(text, &lexicon(&["x"]), &lexicon(&["y"]), &predictions);
        assert_eq!(findings[0].text, "Patan");
    }

    #[test]
    fn test_claimed_spans() {
        let mut claimed = ClaimedSpans::new();
        assert!(claimed.try_claim(Span::new(5, 10)));
        assert!(!claimed.try_claim(Span::new(9, 12)));
        assert!(!claimed.try_claim(Span::new(0, 6)));
        assert!(!claimed.try_claim(Span::new(6, 7)));
        assert!(!claimed.try_claim(Span::new(0, 20)));
        assert!(claimed.try_claim(Span::new(10, 12)));
        assert!(claimed.try_claim(Span::new(0, 5)));
        assert!(!claimed.try_claim(Span::new(3, 3)));
        assert_eq!(claimed.len(), 3);
    }

    #[test]
    fn test_sort_findings_tie_break() {
        let mut findings = vec![
            Finding {
                text: "ab".to_string(),
                start: 0,
                end: 2,
                entity_type: EntityType::Model("LOC".to_string()),
                source: Source::Model,
                score: None,
            },
            Finding {
                text: "abc".to_string(),
                start: 0,
                end: 3,
                entity_type: EntityType::Type,
                source: Source::TypeMatch,
                score: None,
            },
            Finding {
                text: "ab".to_string(),
                start: 0,
                end: 2,
                entity_type: EntityType::Loc,
                source: Source::ExactMatch,
                score: None,
            },
        ];

        sort_findings(&mut findings);

        let order: Vec<Source> = findings.iter().map(|f| f.source).collect();
        assert_eq!(order, vec![Source::TypeMatch, Source::ExactMatch, Source::Model]);
    }

    fn arb_predictions(max_len: usize) -> impl Strategy<Value = Vec<Prediction>> {
        prop::collection::vec(
            (0..=max_len, 0..=max_len, prop::sample::select(vec!["LOC", "GPE"])),
            0..6,
        )
        .prop_map(|raw| {
            raw.into_iter()
                .map(|(a, b, label)| Prediction {
                    text: String::new(),
                    label: label.to_string(),
                    start: a.min(b),
                    end: a.max(b),
                    score: None,
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn prop_findings_disjoint_ordered_and_faithful(
            text in "[ab c]{0,24}",
            places in prop::collection::vec("[abc]{1,3}", 1..4),
            words in prop::collection::vec("[ab ]{1,3}", 1..4),
            predictions in arb_predictions(24),
        ) {
            let gazetteer = Lexicon::from_entries(&places, MatchOptions::default()).unwrap();
            let types = Lexicon::from_entries(&words, MatchOptions::default()).unwrap();

            let findings = reconcile(&text, &gazetteer, &types, &predictions);

            for finding in &findings {
                prop_assert!(finding.start < finding.end);
                prop_assert_eq!(&text[finding.start..finding.end], finding.text.as_str());
            }
            for pair in findings.windows(2) {
                prop_assert!(pair[0].end <= pair[1].start);
            }

            let again = reconcile(&text, &gazetteer, &types, &predictions);
            prop_assert_eq!(findings, again);
        }

        #[test]
        fn prop_gazetteer_entry_always_found(
            prefix in "[xy ]{0,8}",
            suffix in "[xy ]{0,8}",
        ) {
            let text = format!("{prefix}Pokhara{suffix}");
            let gazetteer = lexicon(&["Pokhara"]);
            let types = lexicon(&["y"]);
            let start = prefix.len();
            let predictions = vec![Prediction {
                text: "Pokhara".to_string(),
                label: "GPE".to_string(),
                start,
                end: start + 7,
                score: None,
            }];

            let findings = reconcile(&text, &gazetteer, &types, &predictions);

            prop_assert!(findings.iter().any(|f| f.text == "Pokhara"
                && f.entity_type == EntityType::Loc
                && f.source == Source::ExactMatch));
            prop_assert!(findings.iter().all(|f| f.source != Source::Model));
        }
    }
}

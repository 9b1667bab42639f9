//! Association rules derived from frequent itemsets.
//!
//! Every frequent itemset with at least two genres is split in every way
//! into a non-empty antecedent and consequent. Because support is
//! anti-monotone, both halves are themselves frequent, so their counts are
//! already known and no further pass over the matrix is needed.

use crate::apriori::FrequentItemsets;
use crate::error::{MiningError, Result};
use crate::params::{check_confidence, check_lift};
use data_loader::Genre;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use tracing::{debug, info, instrument};

/// Largest itemset whose splits are enumerated with a u64 mask
const MAX_SPLIT_ITEMS: usize = 63;

/// antecedent => consequent, with the usual interest measures
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    pub antecedent: Vec<Genre>,
    pub consequent: Vec<Genre>,
    pub antecedent_support: f64,
    pub consequent_support: f64,
    /// Support of antecedent ∪ consequent
    pub support: f64,
    pub confidence: f64,
    pub lift: f64,
    pub leverage: f64,
    /// Infinite when confidence is 1
    pub conviction: f64,
}

impl Rule {
    /// True when every antecedent genre is in `genres`
    pub fn antecedent_within(&self, genres: &BTreeSet<Genre>) -> bool {
        self.antecedent.iter().all(|g| genres.contains(g))
    }

    pub fn antecedent_contains(&self, genre: &Genre) -> bool {
        self.antecedent.contains(genre)
    }
}

/// Canonical rule order: lift desc, confidence desc, shorter antecedent
/// first, then antecedent and consequent genre names
pub fn compare_rules(a: &Rule, b: &Rule) -> Ordering {
    b.lift
        .total_cmp(&a.lift)
        .then_with(|| b.confidence.total_cmp(&a.confidence))
        .then_with(|| a.antecedent.len().cmp(&b.antecedent.len()))
        .then_with(|| a.antecedent.cmp(&b.antecedent))
        .then_with(|| a.consequent.cmp(&b.consequent))
}

/// Generate rules with confidence >= `min_confidence` and lift >= `min_lift`
#[instrument(skip(itemsets), fields(itemsets = itemsets.len()))]
pub fn generate_rules(
    itemsets: &FrequentItemsets,
    min_confidence: f64,
    min_lift: f64,
) -> Result<Vec<Rule>> {
    check_confidence(min_confidence)?;
    check_lift(min_lift)?;

    let n = itemsets.num_transactions() as f64;
    let mut rules = Vec::new();

    for itemset in itemsets.itemsets().iter().filter(|s| s.len() >= 2) {
        let items = itemset.columns();
        if items.len() > MAX_SPLIT_ITEMS {
            return Err(MiningError::ItemsetTooLarge { size: items.len() });
        }

        let full: u64 = (1u64 << items.len()) - 1;
        for mask in 1..full {
            let mut antecedent = Vec::new();
            let mut consequent = Vec::new();
            for (bit, &item) in items.iter().enumerate() {
                if mask & (1u64 << bit) != 0 {
                    antecedent.push(item);
                } else {
                    consequent.push(item);
                }
            }

            let (Some(count_a), Some(count_c)) =
                (itemsets.count_of(&antecedent), itemsets.count_of(&consequent))
            else {
                debug!("Missing subset count for {:?}; skipping split", items);
                continue;
            };

            let antecedent_support = count_a as f64 / n;
            let consequent_support = count_c as f64 / n;
            let confidence = itemset.count as f64 / count_a as f64;
            let lift = confidence / consequent_support;

            if confidence < min_confidence || lift < min_lift {
                continue;
            }

            let conviction = if confidence >= 1.0 {
                f64::INFINITY
            } else {
                (1.0 - consequent_support) / (1.0 - confidence)
            };

            rules.push(Rule {
                antecedent: itemsets.genres_for(&antecedent),
                consequent: itemsets.genres_for(&consequent),
                antecedent_support,
                consequent_support,
                support: itemset.support,
                confidence,
                lift,
                leverage: itemset.support - antecedent_support * consequent_support,
                conviction,
            });
        }
    }

    rules.sort_by(compare_rules);
    info!(
        "Generated {} rules (min_confidence {}, min_lift {})",
        rules.len(),
        min_confidence,
        min_lift
    );
    Ok(rules)
}

/// Averages shown next to the rule table
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RuleSummary {
    pub count: usize,
    pub mean_support: f64,
    pub mean_confidence: f64,
    pub mean_lift: f64,
}

impl RuleSummary {
    /// `None` for an empty rule set
    pub fn from_rules(rules: &[Rule]) -> Option<Self> {
        if rules.is_empty() {
            return None;
        }
        let n = rules.len() as f64;
        Some(Self {
            count: rules.len(),
            mean_support: rules.iter().map(|r| r.support).sum::<f64>() / n,
            mean_confidence: rules.iter().map(|r| r.confidence).sum::<f64>() / n,
            mean_lift: rules.iter().map(|r| r.lift).sum::<f64>() / n,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apriori::frequent_itemsets;
    use data_loader::GenreMatrix;

    fn matrix(movies: &[&[&str]]) -> GenreMatrix {
        let sets: Vec<BTreeSet<Genre>> = movies
            .iter()
            .map(|genres| genres.iter().map(|&g| Genre::from(g)).collect())
            .collect();
        GenreMatrix::from_genre_sets(sets.iter().enumerate().map(|(i, s)| (i as u32 + 1, s)))
    }

    fn genres(names: &[&str]) -> Vec<Genre> {
        names.iter().map(|&n| Genre::from(n)).collect()
    }

    fn scenario_rules(min_confidence: f64, min_lift: f64) -> Vec<Rule> {
        let m = matrix(&[
            &["Action", "Comedy"],
            &["Action"],
            &["Comedy", "Drama"],
            &["Action", "Comedy"],
        ]);
        let itemsets = frequent_itemsets(&m, 0.25, None).unwrap();
        generate_rules(&itemsets, min_confidence, min_lift).unwrap()
    }

    #[test]
    fn test_rule_metrics() {
        let rules = scenario_rules(0.1, 0.0);
        let rule = rules
            .iter()
            .find(|r| r.antecedent == genres(&["Action"]) && r.consequent == genres(&["Comedy"]))
            .unwrap();

        assert_eq!(rule.support, 0.5);
        assert_eq!(rule.antecedent_support, 0.75);
        assert!((rule.confidence - 2.0 / 3.0).abs() < 1e-12);
        assert!((rule.lift - (2.0 / 3.0) / 0.75).abs() < 1e-12);
        assert!((rule.leverage - (0.5 - 0.75 * 0.75)).abs() < 1e-12);
    }

    #[test]
    fn test_full_confidence_has_infinite_conviction() {
        let rules = scenario_rules(0.1, 0.0);
        let rule = rules
            .iter()
            .find(|r| r.antecedent == genres(&["Drama"]))
            .unwrap();
        assert_eq!(rule.consequent, genres(&["Comedy"]));
        assert_eq!(rule.confidence, 1.0);
        assert!(rule.conviction.is_infinite());
    }

    #[test]
    fn test_sides_are_disjoint_and_nonempty() {
        for rule in scenario_rules(0.1, 0.0) {
            assert!(!rule.antecedent.is_empty());
            assert!(!rule.consequent.is_empty());
            assert!(rule.antecedent.iter().all(|g| !rule.consequent.contains(g)));
        }
    }

    #[test]
    fn test_thresholds_filter_rules() {
        let all = scenario_rules(0.1, 0.0);
        assert_eq!(all.len(), 4);

        let confident = scenario_rules(0.9, 0.0);
        assert!(confident.iter().all(|r| r.confidence >= 0.9));
        assert_eq!(confident.len(), 1);

        let lifted = scenario_rules(0.1, 1.0);
        assert!(lifted.iter().all(|r| r.lift >= 1.0));
    }

    #[test]
    fn test_rules_are_sorted() {
        let rules = scenario_rules(0.1, 0.0);
        for pair in rules.windows(2) {
            assert_ne!(compare_rules(&pair[0], &pair[1]), Ordering::Greater);
        }
        // Drama => Comedy has the highest lift (1 / 0.75)
        assert_eq!(rules[0].antecedent, genres(&["Drama"]));
    }

    #[test]
    fn test_invalid_confidence_rejected() {
        let m = matrix(&[&["Action"]]);
        let itemsets = frequent_itemsets(&m, 0.5, None).unwrap();
        assert!(matches!(
            generate_rules(&itemsets, 1.5, 0.0),
            Err(MiningError::InvalidParameter { name: "min_confidence", .. })
        ));
    }

    #[test]
    fn test_antecedent_within() {
        let rules = scenario_rules(0.1, 0.0);
        let movie: BTreeSet<Genre> = genres(&["Action", "Drama"]).into_iter().collect();
        let matching: Vec<&Rule> = rules.iter().filter(|r| r.antecedent_within(&movie)).collect();
        assert!(!matching.is_empty());
        assert!(matching.iter().all(|r| r.antecedent.iter().all(|g| movie.contains(g))));
    }

    #[test]
    fn test_summary() {
        assert!(RuleSummary::from_rules(&[]).is_none());
        let rules = scenario_rules(0.1, 0.0);
        let summary = RuleSummary::from_rules(&rules).unwrap();
        assert_eq!(summary.count, rules.len());
        assert!(summary.mean_confidence > 0.0 && summary.mean_confidence <= 1.0);
    }
}

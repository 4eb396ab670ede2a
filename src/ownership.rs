use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::models::{
    CorporateControl, OwnerCount, OwnerTally, OwnershipSummary, PatternClassSummary, PatternHits,
    PortfolioBucket, PropertyRecord, RankedOwner,
};
use crate::patterns::{self, NamePattern};

pub const DEFAULT_TOP_OWNERS: usize = 20;
pub const DISTRIBUTION_BUCKETS: usize = 20;
pub const CONCENTRATION_OWNERS: usize = 10;
pub const CORPORATE_OWNERS_LISTED: usize = 15;

pub fn count_by_owner(records: &[PropertyRecord]) -> OwnerCount {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut tallies: Vec<OwnerTally> = Vec::new();

    for record in records {
        match positions.get(record.owner.as_str()) {
            Some(&position) => tallies[position].properties += 1,
            None => {
                positions.insert(record.owner.as_str(), tallies.len());
                tallies.push(OwnerTally {
                    owner: record.owner.clone(),
                    properties: 1,
                });
            }
        }
    }

    OwnerCount::from_tallies(tallies)
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternMatches {
    pub label: String,
    pub by_needle: Vec<PatternHits>,
    pub owners: Vec<OwnerTally>,
}

impl PatternMatches {
    pub fn properties(&self) -> usize {
        self.owners.iter().map(|tally| tally.properties).sum()
    }
}

/// Collects, per needle, the owners whose name contains it. An owner hit by
/// several needles appears once in `owners`, in `OwnerCount` order.
pub fn classify_patterns(owner_counts: &OwnerCount, pattern: &NamePattern) -> PatternMatches {
    let upper_names: Vec<(String, &OwnerTally)> = owner_counts
        .iter()
        .map(|tally| (tally.owner.to_uppercase(), tally))
        .collect();

    let by_needle: Vec<PatternHits> = pattern
        .needles
        .iter()
        .map(|needle| {
            let hits: Vec<OwnerTally> = upper_names
                .iter()
                .filter(|(upper, _)| upper.contains(needle))
                .map(|(_, tally)| (*tally).clone())
                .collect();
            PatternHits {
                pattern: needle.to_string(),
                owners: hits,
            }
        })
        .collect();

    let owners: Vec<OwnerTally> = upper_names
        .iter()
        .filter(|(upper, _)| pattern.matches_upper(upper))
        .map(|(_, tally)| (*tally).clone())
        .collect();

    PatternMatches {
        label: pattern.label.to_string(),
        by_needle,
        owners,
    }
}

pub fn summarize(owner_counts: &OwnerCount, top_n: usize) -> OwnershipSummary {
    let multi: Vec<&OwnerTally> = owner_counts
        .iter()
        .filter(|tally| tally.properties > 1)
        .collect();

    let pattern_classes = patterns::CLASSIFICATION
        .iter()
        .map(|pattern| {
            let matches = classify_patterns(owner_counts, pattern);
            PatternClassSummary {
                properties: matches.properties(),
                label: matches.label,
                owners: matches.owners,
                by_pattern: matches.by_needle,
            }
        })
        .collect();

    OwnershipSummary {
        total_records: owner_counts.total(),
        unique_owners: owner_counts.len(),
        multi_property_owners: multi.len(),
        multi_property_holdings: multi.iter().map(|tally| tally.properties).sum(),
        pattern_classes,
        top_owners: top_owners(owner_counts, top_n),
        top10_share: concentration_ratio(owner_counts, CONCENTRATION_OWNERS),
        corporate_control: corporate_control(owner_counts),
    }
}

fn percent_of(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}

/// Share of all properties, in percent, held by the `n` largest owners.
pub fn concentration_ratio(owner_counts: &OwnerCount, n: usize) -> f64 {
    let held: usize = owner_counts.iter().take(n).map(|tally| tally.properties).sum();
    percent_of(held, owner_counts.total())
}

pub fn corporate_control(owner_counts: &OwnerCount) -> CorporateControl {
    let corporate: Vec<&OwnerTally> = owner_counts
        .iter()
        .filter(|tally| patterns::is_corporate_owner(&tally.owner))
        .collect();
    let properties = corporate.iter().map(|tally| tally.properties).sum();

    CorporateControl {
        owners: corporate
            .iter()
            .take(CORPORATE_OWNERS_LISTED)
            .map(|tally| (*tally).clone())
            .collect(),
        corporate_owners: corporate.len(),
        properties,
        percentage: percent_of(properties, owner_counts.total()),
    }
}

pub fn top_owners(owner_counts: &OwnerCount, n: usize) -> Vec<RankedOwner> {
    owner_counts
        .iter()
        .take(n)
        .enumerate()
        .map(|(idx, tally)| RankedOwner {
            rank: idx + 1,
            owner: tally.owner.clone(),
            properties: tally.properties,
        })
        .collect()
}

/// How many owners hold a portfolio of each size, most common size first.
pub fn portfolio_size_distribution(owner_counts: &OwnerCount, limit: usize) -> Vec<PortfolioBucket> {
    let mut by_size: BTreeMap<usize, usize> = BTreeMap::new();
    for tally in owner_counts.iter() {
        *by_size.entry(tally.properties).or_insert(0) += 1;
    }

    let mut buckets: Vec<PortfolioBucket> = by_size
        .into_iter()
        .map(|(portfolio_size, owners)| PortfolioBucket {
            portfolio_size,
            owners,
        })
        .collect();
    buckets.sort_by(|a, b| b.owners.cmp(&a.owners));
    buckets.truncate(limit);
    buckets
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(owner: &str) -> PropertyRecord {
        PropertyRecord {
            owner: owner.to_string(),
            sale_date: None,
            latitude: None,
            longitude: None,
            extra: Default::default(),
        }
    }

    fn records(owners: &[(&str, usize)]) -> Vec<PropertyRecord> {
        owners.iter()
            .flat_map(|(owner, n)| std::iter::repeat_with(move || record(owner)).take(*n))
            .collect()
    }

    #[test]
    fn counts_sum_to_record_total() {
        let input = records(&[("A", 3), ("B", 1), ("C", 5), ("A", 2)]);
        let counts = count_by_owner(&input);
        assert_eq!(counts.total(), input.len());
        let a = counts.iter().find(|tally| tally.owner == "A").unwrap();
        assert_eq!(a.properties, 5);
        assert!(counts.iter().all(|tally| !tally.owner.is_empty()));
    }

    #[test]
    fn orders_by_count_then_first_appearance() {
        let counts = count_by_owner(&records(&[("B", 2), ("A", 2), ("C", 4), ("D", 1)]));
        let owners: Vec<&str> = counts.iter().map(|t| t.owner.as_str()).collect();
        assert_eq!(owners, vec!["C", "B", "A", "D"]);
    }

    #[test]
    fn does_not_normalize_owner_names() {
        let counts = count_by_owner(&records(&[("ACME LLC", 1), ("ACME LLC ", 1), ("acme llc", 1)]));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn classification_deduplicates_owners_across_needles() {
        let counts = count_by_owner(&records(&[
            ("ACME CORPORATION INC", 4),
            ("BETA CORP", 2),
            ("JOHN SMITH", 1),
        ]));
        let matches = classify_patterns(&counts, &patterns::CORPORATE);

        let by_needle: Vec<(&str, usize)> = matches
            .by_needle
            .iter()
            .map(|hits| (hits.pattern.as_str(), hits.owners.len()))
            .collect();
        assert_eq!(by_needle, vec![("CORP", 2), ("INC", 1), ("CORPORATION", 1)]);

        let owners: Vec<&str> = matches.owners.iter().map(|t| t.owner.as_str()).collect();
        assert_eq!(owners, vec!["ACME CORPORATION INC", "BETA CORP"]);
        assert_eq!(matches.properties(), 6);
    }

    #[test]
    fn classification_is_repeatable() {
        let counts = count_by_owner(&records(&[("X HOLDINGS", 3), ("Y VENTURES", 2)]));
        let first = classify_patterns(&counts, &patterns::SHELL);
        let second = classify_patterns(&counts, &patterns::SHELL);
        assert_eq!(first.owners, second.owners);
        assert_eq!(first.by_needle, second.by_needle);
    }

    #[test]
    fn summary_reports_concentration() {
        let counts = count_by_owner(&records(&[
            ("ABC PROPERTIES LLC", 5),
            ("MAPLE L.L.C", 2),
            ("ACME INC", 3),
            ("JOHN SMITH", 1),
            ("JANE DOE", 1),
        ]));
        let summary = summarize(&counts, 3);

        assert_eq!(summary.total_records, 12);
        assert_eq!(summary.unique_owners, 5);
        assert_eq!(summary.multi_property_owners, 3);
        assert_eq!(summary.multi_property_holdings, 10);
        assert!(summary.multi_property_owners <= summary.unique_owners);
        assert!(summary.multi_property_holdings <= summary.total_records);

        let classes: Vec<(&str, usize, usize)> = summary
            .pattern_classes
            .iter()
            .map(|c| (c.label.as_str(), c.owners.len(), c.properties))
            .collect();
        assert_eq!(
            classes,
            vec![
                ("LLC entities", 2, 7),
                ("Corporate entities", 1, 3),
                ("Potential shell companies", 1, 5),
            ]
        );

        let top: Vec<(usize, &str)> = summary
            .top_owners
            .iter()
            .map(|r| (r.rank, r.owner.as_str()))
            .collect();
        assert_eq!(
            top,
            vec![(1, "ABC PROPERTIES LLC"), (2, "ACME INC"), (3, "MAPLE L.L.C")]
        );
    }

    #[test]
    fn summary_keeps_the_per_pattern_breakdown() {
        let counts = count_by_owner(&records(&[("ELM L.L.C", 2), ("OAK LLC", 1)]));
        let summary = summarize(&counts, DEFAULT_TOP_OWNERS);
        let llc = &summary.pattern_classes[0];

        assert_eq!(llc.by_pattern.len(), 2);
        assert_eq!(llc.by_pattern[0].pattern, "LLC");
        assert_eq!(llc.by_pattern[0].owners[0].owner, "OAK LLC");
        assert_eq!(llc.by_pattern[1].pattern, "L.L.C");
        assert_eq!(llc.by_pattern[1].owners[0].owner, "ELM L.L.C");
    }

    #[test]
    fn top_ten_share_of_all_properties() {
        let mut owners: Vec<(String, usize)> = (0..10).map(|i| (format!("BIG {i}"), 5)).collect();
        owners.extend((0..50).map(|i| (format!("SMALL {i}"), 1)));
        let borrowed: Vec<(&str, usize)> = owners.iter().map(|(o, n)| (o.as_str(), *n)).collect();
        let counts = count_by_owner(&records(&borrowed));

        assert!((concentration_ratio(&counts, CONCENTRATION_OWNERS) - 50.0).abs() < 1e-9);
        assert!((concentration_ratio(&counts, 100) - 100.0).abs() < 1e-9);
        assert_eq!(concentration_ratio(&count_by_owner(&[]), CONCENTRATION_OWNERS), 0.0);
    }

    #[test]
    fn corporate_control_counts_suffix_matches() {
        let counts = count_by_owner(&records(&[
            ("MAPLE HOLDINGS", 6),
            ("SMITH FAMILY TRUST", 2),
            ("HOLDINGS OF JOHN DOE", 1),
            ("JANE DOE", 1),
        ]));
        let control = corporate_control(&counts);

        assert_eq!(control.corporate_owners, 2);
        assert_eq!(control.properties, 8);
        assert!((control.percentage - 80.0).abs() < 1e-9);
        let owners: Vec<&str> = control.owners.iter().map(|t| t.owner.as_str()).collect();
        assert_eq!(owners, vec!["MAPLE HOLDINGS", "SMITH FAMILY TRUST"]);
    }

    #[test]
    fn distribution_counts_owners_per_portfolio_size() {
        let counts = count_by_owner(&records(&[
            ("A", 1),
            ("B", 1),
            ("C", 1),
            ("D", 2),
            ("E", 2),
            ("F", 7),
        ]));
        let buckets = portfolio_size_distribution(&counts, 2);
        assert_eq!(
            buckets,
            vec![
                PortfolioBucket { portfolio_size: 1, owners: 3 },
                PortfolioBucket { portfolio_size: 2, owners: 2 },
            ]
        );
    }

    #[test]
    fn empty_input_yields_empty_summary() {
        let counts = count_by_owner(&[]);
        let summary = summarize(&counts, DEFAULT_TOP_OWNERS);
        assert_eq!(summary.unique_owners, 0);
        assert!(summary.top_owners.is_empty());
        assert!(portfolio_size_distribution(&counts, DISTRIBUTION_BUCKETS).is_empty());
    }
}

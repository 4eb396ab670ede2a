use std::collections::HashMap;

use crate::error::AnalysisWarning;
use crate::models::{
    AcquisitionSpan, AcquisitionTiming, BulkPurchase, OwnerCount, PropertyRecord, TemporalSummary,
    YearMonth,
};

pub const BULK_PURCHASE_THRESHOLD: usize = 3;
pub const TIMING_OWNERS: usize = 10;

/// Owner/month groups with at least `threshold` dated purchases, largest
/// first. Groups with equal counts stay in the order they were discovered.
pub fn bulk_purchases(records: &[PropertyRecord], threshold: usize) -> Vec<BulkPurchase> {
    let mut positions: HashMap<(&str, YearMonth), usize> = HashMap::new();
    let mut groups: Vec<BulkPurchase> = Vec::new();

    for record in records {
        let Some(date) = record.sale_date else {
            continue;
        };
        let key = (record.owner.as_str(), YearMonth::of(date));
        match positions.get(&key) {
            Some(&position) => groups[position].count += 1,
            None => {
                positions.insert(key, groups.len());
                groups.push(BulkPurchase {
                    owner: record.owner.clone(),
                    month: key.1,
                    count: 1,
                });
            }
        }
    }

    groups.retain(|group| group.count >= threshold);
    groups.sort_by(|a, b| b.count.cmp(&a.count));
    groups
}

pub fn acquisition_span(records: &[PropertyRecord], owner: &str) -> Option<AcquisitionSpan> {
    let mut dates = records
        .iter()
        .filter(|record| record.owner == owner)
        .filter_map(|record| record.sale_date);

    let first = dates.next()?;
    let (earliest, latest, dated_records) = dates.fold((first, first, 1), |(lo, hi, n), date| {
        (lo.min(date), hi.max(date), n + 1)
    });

    if dated_records < 2 {
        return None;
    }

    Some(AcquisitionSpan {
        earliest,
        latest,
        dated_records,
    })
}

pub fn analyze(
    records: &[PropertyRecord],
    owner_counts: &OwnerCount,
    threshold: usize,
) -> Result<TemporalSummary, AnalysisWarning> {
    let dated_records = records.iter().filter(|r| r.sale_date.is_some()).count();
    let excluded_records = records.len() - dated_records;

    log::info!(
        "{dated_records} properties with sale dates, {excluded_records} excluded from temporal analysis"
    );
    if dated_records == 0 {
        return Err(AnalysisWarning::NoDatedRecords);
    }

    let acquisition_timing = owner_counts
        .iter()
        .take(TIMING_OWNERS)
        .filter_map(|tally| {
            acquisition_span(records, &tally.owner).map(|span| AcquisitionTiming {
                owner: tally.owner.clone(),
                span,
            })
        })
        .collect();

    Ok(TemporalSummary {
        dated_records,
        excluded_records,
        threshold,
        bulk_purchases: bulk_purchases(records, threshold),
        acquisition_timing,
    })
}

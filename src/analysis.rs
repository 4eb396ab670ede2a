use serde::Serialize;

use crate::error::AnalysisWarning;
use crate::loader::{Dataset, LoadStats};
use crate::models::{
    DataQualityFlags, OwnerCount, OwnershipSummary, PortfolioBucket, PricingSummary,
    RiskAssessment, TemporalSummary,
};
use crate::ownership::{self, DISTRIBUTION_BUCKETS};
use crate::pricing;
use crate::risk;
use crate::temporal::{self, BULK_PURCHASE_THRESHOLD};

/// Every computed summary for one dataset, ready to be rendered or exported.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub source: String,
    pub columns: Vec<String>,
    pub load_stats: LoadStats,
    #[serde(skip)]
    pub owner_counts: OwnerCount,
    pub ownership: OwnershipSummary,
    pub distribution: Vec<PortfolioBucket>,
    pub temporal: Option<TemporalSummary>,
    pub pricing: Option<PricingSummary>,
    pub flags: DataQualityFlags,
    pub risk: Vec<RiskAssessment>,
    #[serde(serialize_with = "serialize_warnings")]
    pub warnings: Vec<AnalysisWarning>,
}

pub fn run(dataset: &Dataset, top_n: usize) -> Analysis {
    let owner_counts = ownership::count_by_owner(&dataset.records);
    let ownership = ownership::summarize(&owner_counts, top_n);
    let distribution = ownership::portfolio_size_distribution(&owner_counts, DISTRIBUTION_BUCKETS);

    let mut warnings = Vec::new();
    let temporal =
        match temporal::analyze(&dataset.records, &owner_counts, BULK_PURCHASE_THRESHOLD) {
            Ok(summary) => Some(summary),
            Err(warning) => {
                log::warn!("{warning}");
                warnings.push(warning);
                None
            }
        };

    let pricing = match pricing::analyze(&dataset.records) {
        Ok(summary) => Some(summary),
        Err(warning) => {
            log::warn!("{warning}");
            warnings.push(warning);
            None
        }
    };
    let flags = pricing::data_quality_flags(&dataset.records);

    let risk = risk::score_owners(&owner_counts);
    log::info!(
        "{} owners, {} flagged as high risk",
        owner_counts.len(),
        risk.len()
    );

    Analysis {
        source: dataset.source.display().to_string(),
        columns: dataset.columns.clone(),
        load_stats: dataset.stats.clone(),
        owner_counts,
        ownership,
        distribution,
        temporal,
        pricing,
        flags,
        risk,
        warnings,
    }
}

fn serialize_warnings<S: serde::Serializer>(
    warnings: &[AnalysisWarning],
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(warnings.iter().map(ToString::to_string))
}

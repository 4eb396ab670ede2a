use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyRecord {
    pub owner: String,
    pub sale_date: Option<NaiveDate>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub extra: BTreeMap<String, String>,
}

impl PropertyRecord {
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        Some((self.longitude?, self.latitude?))
    }

    /// A passthrough column, `None` when absent or blank.
    pub fn field(&self, column: &str) -> Option<&str> {
        self.extra
            .get(column)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerTally {
    pub owner: String,
    pub properties: usize,
}

/// Property counts per exact owner string, largest portfolio first.
///
/// Owners with equal counts keep the order in which they were first seen in
/// the source, so every ranking derived from this table is reproducible.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct OwnerCount {
    entries: Vec<OwnerTally>,
}

impl OwnerCount {
    pub fn from_tallies(mut entries: Vec<OwnerTally>) -> Self {
        entries.sort_by(|a, b| b.properties.cmp(&a.properties));
        Self { entries }
    }

    pub fn iter(&self) -> impl Iterator<Item = &OwnerTally> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> usize {
        self.entries.iter().map(|tally| tally.properties).sum()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedOwner {
    pub rank: usize,
    pub owner: String,
    pub properties: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatternHits {
    pub pattern: String,
    pub owners: Vec<OwnerTally>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PatternClassSummary {
    pub label: String,
    pub owners: Vec<OwnerTally>,
    pub properties: usize,
    pub by_pattern: Vec<PatternHits>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CorporateControl {
    pub owners: Vec<OwnerTally>,
    pub corporate_owners: usize,
    pub properties: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct OwnershipSummary {
    pub total_records: usize,
    pub unique_owners: usize,
    pub multi_property_owners: usize,
    pub multi_property_holdings: usize,
    pub pattern_classes: Vec<PatternClassSummary>,
    pub top_owners: Vec<RankedOwner>,
    pub top10_share: f64,
    pub corporate_control: CorporateControl,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortfolioBucket {
    pub portfolio_size: usize,
    pub owners: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BulkPurchase {
    pub owner: String,
    pub month: YearMonth,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AcquisitionSpan {
    pub earliest: NaiveDate,
    pub latest: NaiveDate,
    pub dated_records: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct AcquisitionTiming {
    pub owner: String,
    pub span: AcquisitionSpan,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemporalSummary {
    pub dated_records: usize,
    pub excluded_records: usize,
    pub threshold: usize,
    pub bulk_purchases: Vec<BulkPurchase>,
    pub acquisition_timing: Vec<AcquisitionTiming>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RiskAssessment {
    pub owner: String,
    pub properties: usize,
    pub risk_score: u8,
    pub risk_factors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BelowMarketSale {
    pub owner: String,
    pub address: Option<String>,
    pub sale_date: NaiveDate,
    pub price: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PricingSummary {
    pub valid_sales: usize,
    pub average_price: f64,
    pub median_price: f64,
    pub threshold: f64,
    pub below_market: Vec<BelowMarketSale>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlaggedProperty {
    pub owner: String,
    pub address: Option<String>,
    pub year_built: i64,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DataQualityFlags {
    pub year_built_9999: Vec<FlaggedProperty>,
    pub implausible_year_built: Vec<FlaggedProperty>,
    pub sold_in_1900: usize,
}

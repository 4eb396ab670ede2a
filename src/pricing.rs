use chrono::Datelike;

use crate::error::AnalysisWarning;
use crate::loader::{ADDRESS_COLUMN, SALE_PRICE_COLUMN, YEAR_BUILT_COLUMN};
use crate::models::{
    BelowMarketSale, DataQualityFlags, FlaggedProperty, PricingSummary, PropertyRecord,
};

/// A sale below this fraction of the median price is flagged.
pub const BELOW_MARKET_RATIO: f64 = 0.7;
pub const BELOW_MARKET_SHOWN: usize = 15;
/// Assessor placeholder year used for both unknown sales and unknown builds.
pub const PLACEHOLDER_SALE_YEAR: i32 = 1900;
pub const PLACEHOLDER_YEAR_BUILT: i64 = 9999;
pub const LATEST_YEAR_BUILT: i64 = 2024;

/// Parses a price cell such as `$185,000.00`. Non-numeric cells yield `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != '$' && *c != ',')
        .collect();
    cleaned.parse::<f64>().ok().filter(|price| price.is_finite())
}

pub fn parse_year_built(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>()
        .ok()
        .or_else(|| raw.parse::<f64>().ok().filter(|y| y.is_finite()).map(|y| y.trunc() as i64))
}

fn address(record: &PropertyRecord) -> Option<String> {
    record.field(ADDRESS_COLUMN).map(str::to_string)
}

/// Sales with a positive price and a real (post-1900) sale date.
fn valid_sales(records: &[PropertyRecord]) -> Vec<BelowMarketSale> {
    records
        .iter()
        .filter_map(|record| {
            let price = record.field(SALE_PRICE_COLUMN).and_then(parse_price)?;
            let sale_date = record.sale_date?;
            if price <= 0.0 || sale_date.year() <= PLACEHOLDER_SALE_YEAR {
                return None;
            }
            Some(BelowMarketSale {
                owner: record.owner.clone(),
                address: address(record),
                sale_date,
                price,
            })
        })
        .collect()
}

/// Upper median: the element at `len / 2` of the sorted prices.
fn median(sorted: &[f64]) -> f64 {
    sorted[sorted.len() / 2]
}

pub fn analyze(records: &[PropertyRecord]) -> Result<PricingSummary, AnalysisWarning> {
    let sales = valid_sales(records);
    if sales.is_empty() {
        return Err(AnalysisWarning::NoSalePrices);
    }

    let mut prices: Vec<f64> = sales.iter().map(|sale| sale.price).collect();
    prices.sort_by(f64::total_cmp);
    let average_price = prices.iter().sum::<f64>() / prices.len() as f64;
    let median_price = median(&prices);
    let threshold = median_price * BELOW_MARKET_RATIO;

    let valid_sales = sales.len();
    let mut below_market: Vec<BelowMarketSale> = sales
        .into_iter()
        .filter(|sale| sale.price < threshold)
        .collect();
    below_market.sort_by(|a, b| a.price.total_cmp(&b.price));

    log::info!(
        "{valid_sales} priced sales, {} below {:.0}",
        below_market.len(),
        threshold
    );

    Ok(PricingSummary {
        valid_sales,
        average_price,
        median_price,
        threshold,
        below_market,
    })
}

pub fn data_quality_flags(records: &[PropertyRecord]) -> DataQualityFlags {
    let mut flags = DataQualityFlags::default();

    for record in records {
        if record
            .sale_date
            .is_some_and(|date| date.year() == PLACEHOLDER_SALE_YEAR)
        {
            flags.sold_in_1900 += 1;
        }

        let Some(year_built) = record.field(YEAR_BUILT_COLUMN).and_then(parse_year_built) else {
            continue;
        };
        let flagged = || FlaggedProperty {
            owner: record.owner.clone(),
            address: address(record),
            year_built,
        };
        if year_built == PLACEHOLDER_YEAR_BUILT {
            flags.year_built_9999.push(flagged());
        }
        // 9999 lands in both lists.
        if year_built > LATEST_YEAR_BUILT || year_built == 0 {
            flags.implausible_year_built.push(flagged());
        }
    }

    flags
}

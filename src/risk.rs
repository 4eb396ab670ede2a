use crate::models::{OwnerCount, RiskAssessment};
use crate::patterns::RISK_SIGNALS;

pub const LARGE_PORTFOLIO: usize = 20;
pub const VERY_LARGE_PORTFOLIO: usize = 50;
pub const HIGH_RISK_SCORE: u8 = 3;
pub const MAX_RISK_SCORE: u8 = 6;
pub const REPORTED_OWNERS: usize = 15;

/// Scores a single owner. Returns `None` below the large-portfolio floor.
pub fn assess_owner(owner: &str, properties: usize) -> Option<RiskAssessment> {
    if properties < LARGE_PORTFOLIO {
        return None;
    }

    let mut risk_score = 0u8;
    let mut risk_factors = Vec::new();

    let (points, label) = portfolio_weight(properties);
    risk_score += points;
    risk_factors.push(format!("{label} ({properties} properties)"));

    for (pattern, points) in RISK_SIGNALS.iter() {
        if pattern.matches(owner) {
            risk_score += points;
            risk_factors.push(pattern.label.to_string());
        }
    }

    Some(RiskAssessment {
        owner: owner.to_string(),
        properties,
        risk_score,
        risk_factors,
    })
}

pub fn portfolio_weight(properties: usize) -> (u8, &'static str) {
    match properties {
        p if p >= VERY_LARGE_PORTFOLIO => (3, "very large portfolio"),
        p if p >= LARGE_PORTFOLIO => (2, "large portfolio"),
        _ => (0, "small portfolio"),
    }
}

/// High-risk owners ranked by score. Equal scores keep `OwnerCount` order.
pub fn score_owners(owner_counts: &OwnerCount) -> Vec<RiskAssessment> {
    let mut values: Vec<RiskAssessment> = owner_counts
        .iter()
        .filter_map(|tally| assess_owner(&tally.owner, tally.properties))
        .filter(|assessment| assessment.risk_score >= HIGH_RISK_SCORE)
        .collect();

    values.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    values
}

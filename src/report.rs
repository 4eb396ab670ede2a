use std::fmt::Write;
use std::path::PathBuf;

use crate::analysis::Analysis;
use crate::error::AnalysisWarning;
use crate::models::RiskAssessment;
use crate::ownership::CONCENTRATION_OWNERS;
use crate::patterns;
use crate::pricing::{BELOW_MARKET_RATIO, BELOW_MARKET_SHOWN};
use crate::risk::{MAX_RISK_SCORE, REPORTED_OWNERS};

const RULE_WIDTH: usize = 50;
const SUBRULE_WIDTH: usize = 40;
const SHELL_OWNERS_SHOWN: usize = 10;
const BULK_PURCHASES_SHOWN: usize = 10;
const CORPORATE_OWNERS_SHOWN: usize = 15;

fn heading(output: &mut String, title: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", "=".repeat(RULE_WIDTH));
    let _ = writeln!(output, "{title}");
    let _ = writeln!(output, "{}", "=".repeat(RULE_WIDTH));
}

fn subheading(output: &mut String, title: &str) {
    let _ = writeln!(output);
    let _ = writeln!(output, "{}", "-".repeat(SUBRULE_WIDTH));
    let _ = writeln!(output, "{title}");
    let _ = writeln!(output, "{}", "-".repeat(SUBRULE_WIDTH));
}

pub fn build_report(analysis: &Analysis, charts: &[PathBuf]) -> String {
    let mut output = String::new();

    let stats = &analysis.load_stats;
    let _ = writeln!(
        output,
        "Dataset loaded: {} properties ({} rows read)",
        analysis.ownership.total_records, stats.rows_read
    );
    if stats.skipped_blank_owner > 0 {
        let _ = writeln!(
            output,
            "Rows skipped (blank owner): {}",
            stats.skipped_blank_owner
        );
    }
    let _ = writeln!(output, "Columns: {}", analysis.columns.join(", "));

    write_ownership(&mut output, analysis);
    write_corporate_control(&mut output, analysis);
    write_temporal(&mut output, analysis);
    write_pricing(&mut output, analysis);
    write_data_quality(&mut output, analysis);
    write_risk(&mut output, &analysis.risk, REPORTED_OWNERS);

    heading(&mut output, "ANALYSIS COMPLETE");
    if charts.is_empty() {
        let _ = writeln!(output, "No chart files generated.");
    } else {
        let _ = writeln!(output, "Files generated:");
        for chart in charts {
            let _ = writeln!(output, "- {}", chart.display());
        }
    }

    output
}

fn write_ownership(output: &mut String, analysis: &Analysis) {
    let summary = &analysis.ownership;

    heading(output, "OWNERSHIP CONCENTRATION ANALYSIS");
    let _ = writeln!(output);
    let _ = writeln!(output, "Total unique owners: {}", summary.unique_owners);
    let _ = writeln!(
        output,
        "Owners with multiple properties: {}",
        summary.multi_property_owners
    );
    let _ = writeln!(
        output,
        "Properties owned by multi-property owners: {}",
        summary.multi_property_holdings
    );

    let _ = writeln!(output);
    if analysis.owner_counts.is_empty() {
        let _ = writeln!(output, "No property owners found.");
        return;
    }
    let _ = writeln!(
        output,
        "Top {} Largest Property Owners:",
        summary.top_owners.len()
    );
    for ranked in summary.top_owners.iter() {
        let _ = writeln!(
            output,
            "{:2}. {:3} properties: {}",
            ranked.rank, ranked.properties, ranked.owner
        );
    }

    subheading(output, "SUSPICIOUS OWNERSHIP PATTERNS");
    for class in summary.pattern_classes.iter() {
        if class.label == patterns::SHELL.label {
            continue;
        }
        let _ = writeln!(
            output,
            "{}: {} (owning {} properties)",
            class.label,
            class.owners.len(),
            class.properties
        );
        for hits in class.by_pattern.iter().filter(|hits| !hits.owners.is_empty()) {
            let _ = writeln!(output, "  {}: {} owners", hits.pattern, hits.owners.len());
        }
    }

    if let Some(shell) = summary
        .pattern_classes
        .iter()
        .find(|class| class.label == patterns::SHELL.label && !class.owners.is_empty())
    {
        let _ = writeln!(output);
        let _ = writeln!(
            output,
            "{} (generic names): {}",
            shell.label,
            shell.owners.len()
        );
        for tally in shell.owners.iter().take(SHELL_OWNERS_SHOWN) {
            let _ = writeln!(output, "  - {} properties: {}", tally.properties, tally.owner);
        }
    }
}

fn write_corporate_control(output: &mut String, analysis: &Analysis) {
    let summary = &analysis.ownership;
    let control = &summary.corporate_control;

    subheading(output, "POWER CONCENTRATION");
    let _ = writeln!(
        output,
        "Top {} owners control {:.1}% of all properties",
        CONCENTRATION_OWNERS, summary.top10_share
    );
    let _ = writeln!(
        output,
        "Corporate owners: {} controlling {} properties ({:.1}%)",
        control.corporate_owners, control.properties, control.percentage
    );
    for tally in control.owners.iter().take(CORPORATE_OWNERS_SHOWN) {
        let _ = writeln!(output, "  - {} properties: {}", tally.properties, tally.owner);
    }
}

fn write_pricing(output: &mut String, analysis: &Analysis) {
    heading(output, "BELOW-MARKET SALES");

    let Some(pricing) = analysis.pricing.as_ref() else {
        let _ = writeln!(output, "{}", AnalysisWarning::NoSalePrices);
        return;
    };

    let _ = writeln!(output, "Sales with a price: {}", pricing.valid_sales);
    let _ = writeln!(output, "Average sale price: ${:.0}", pricing.average_price);
    let _ = writeln!(output, "Median sale price: ${:.0}", pricing.median_price);
    let _ = writeln!(
        output,
        "Sales below {:.0}% of median (${:.0}): {}",
        BELOW_MARKET_RATIO * 100.0,
        pricing.threshold,
        pricing.below_market.len()
    );
    for sale in pricing.below_market.iter().take(BELOW_MARKET_SHOWN) {
        let _ = writeln!(
            output,
            "  ${:.0} on {}: {} ({})",
            sale.price,
            sale.sale_date,
            sale.owner,
            sale.address.as_deref().unwrap_or("no address")
        );
    }
}

fn write_data_quality(output: &mut String, analysis: &Analysis) {
    let flags = &analysis.flags;

    subheading(output, "DATA QUALITY FLAGS");
    let _ = writeln!(
        output,
        "Properties with YEAR_BUILT 9999: {}",
        flags.year_built_9999.len()
    );
    let _ = writeln!(
        output,
        "Properties with impossible YEAR_BUILT: {}",
        flags.implausible_year_built.len()
    );
    let _ = writeln!(output, "Sales dated 1900: {}", flags.sold_in_1900);
}

fn write_temporal(output: &mut String, analysis: &Analysis) {
    heading(output, "TEMPORAL ACQUISITION ANALYSIS");

    let Some(temporal) = analysis.temporal.as_ref() else {
        let _ = writeln!(output, "{}", AnalysisWarning::NoDatedRecords);
        return;
    };

    let _ = writeln!(output, "Properties with sale dates: {}", temporal.dated_records);
    let _ = writeln!(
        output,
        "Properties excluded (missing or invalid sale date): {}",
        temporal.excluded_records
    );

    subheading(output, "BULK PURCHASE PATTERNS");
    if temporal.bulk_purchases.is_empty() {
        let _ = writeln!(
            output,
            "No owner bought {}+ properties in the same month.",
            temporal.threshold
        );
    } else {
        let _ = writeln!(
            output,
            "Found {} instances of bulk purchasing ({}+ properties in same month)",
            temporal.bulk_purchases.len(),
            temporal.threshold
        );
        let _ = writeln!(output);
        let _ = writeln!(output, "Top bulk purchase patterns:");
        for group in temporal.bulk_purchases.iter().take(BULK_PURCHASES_SHOWN) {
            let _ = writeln!(
                output,
                "  {} properties in {}: {}",
                group.count, group.month, group.owner
            );
        }
    }

    subheading(output, "ACQUISITION TIMING - TOP 10 OWNERS");
    if temporal.acquisition_timing.is_empty() {
        let _ = writeln!(output, "No top owner has two or more dated purchases.");
    }
    for timing in temporal.acquisition_timing.iter() {
        let _ = writeln!(
            output,
            "{:2} properties ({} to {}): {}",
            timing.span.dated_records,
            timing.span.earliest.format("%Y-%m"),
            timing.span.latest.format("%Y-%m"),
            timing.owner
        );
    }
}

pub fn write_risk(output: &mut String, assessments: &[RiskAssessment], limit: usize) {
    heading(output, "PREDATORY LANDLORD RISK ASSESSMENT");
    let _ = writeln!(
        output,
        "HIGH RISK OWNERS IDENTIFIED: {}",
        assessments.len()
    );
    let _ = writeln!(output, "{}", "-".repeat(60));

    for (idx, assessment) in assessments.iter().take(limit).enumerate() {
        let _ = writeln!(output, "{:2}. {}", idx + 1, assessment.owner);
        let _ = writeln!(output, "    Properties: {}", assessment.properties);
        let _ = writeln!(
            output,
            "    Risk Score: {}/{}",
            assessment.risk_score, MAX_RISK_SCORE
        );
        let _ = writeln!(
            output,
            "    Risk Factors: {}",
            assessment.risk_factors.join(", ")
        );
        let _ = writeln!(output);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis;
    use crate::loader::read_from;
    use std::path::Path;

    fn analysis_for(csv: &str) -> Analysis {
        let dataset = read_from(csv.as_bytes(), Path::new("fixture.csv")).unwrap();
        analysis::run(&dataset, 20)
    }

    fn portfolio_csv() -> String {
        let mut csv = String::from("OWNER,SALE_DATE\n");
        for day in 1..=28 {
            csv.push_str(&format!("ABC PROPERTIES LLC,2021-03-{day:02}\n"));
        }
        for day in 1..=28 {
            csv.push_str(&format!("ABC PROPERTIES LLC,2022-04-{day:02}\n"));
        }
        csv.push_str("NORTH VENTURES,2020-01-01\n");
        csv.push_str("JOHN SMITH,\n");
        csv
    }

    #[test]
    fn report_contains_every_section() {
        let analysis = analysis_for(&portfolio_csv());
        let report = build_report(&analysis, &[PathBuf::from("ownership_distribution.png")]);

        assert!(report.contains("Dataset loaded: 58 properties (58 rows read)"));
        assert!(!report.contains("Rows skipped (blank owner)"));
        assert!(report.contains("  LLC: 1 owners"));
        assert!(report.contains("Top 10 owners control 100.0% of all properties"));
        assert!(report.contains("Corporate owners: 1 controlling 56 properties (96.6%)"));
        assert!(report.contains("OWNERSHIP CONCENTRATION ANALYSIS"));
        assert!(report.contains(" 1.  56 properties: ABC PROPERTIES LLC"));
        assert!(report.contains("LLC entities: 1 (owning 56 properties)"));
        assert!(report.contains("Potential shell companies (generic names): 2"));
        assert!(report.contains("  - 1 properties: NORTH VENTURES"));
        assert!(report.contains("28 properties in 2021-03: ABC PROPERTIES LLC"));
        assert!(report.contains("56 properties (2021-03 to 2022-04): ABC PROPERTIES LLC"));
        assert!(report.contains("HIGH RISK OWNERS IDENTIFIED: 1"));
        assert!(report.contains("Risk Score: 6/6"));
        assert!(report.contains(
            "Risk Factors: very large portfolio (56 properties), generic business name, corporate entity"
        ));
        assert!(report.contains("- ownership_distribution.png"));
    }

    #[test]
    fn report_degrades_without_dates() {
        let analysis = analysis_for("OWNER\nJANE DOE\n");
        let report = build_report(&analysis, &[]);
        assert!(report.contains("no valid sale dates found for temporal analysis"));
        assert!(report.contains("HIGH RISK OWNERS IDENTIFIED: 0"));
        assert!(report.contains("No chart files generated."));
        assert!(!report.contains("Potential shell companies (generic names)"));
        assert!(report.contains("no positive sale prices found for pricing analysis"));
        assert!(report.contains("Corporate owners: 0 controlling 0 properties (0.0%)"));
    }

    #[test]
    fn header_counts_rows_skipped_for_blank_owners() {
        let analysis = analysis_for("OWNER,SALE_DATE
JANE DOE,2020-01-01
,2020-02-01
JOHN ROE,
");
        let report = build_report(&analysis, &[]);
        assert!(report.contains("Dataset loaded: 2 properties (3 rows read)"));
        assert!(report.contains("Rows skipped (blank owner): 1"));
    }

    #[test]
    fn lists_below_market_sales_and_flags() {
        let csv = "\
OWNER,SALE_DATE,SALE_PRICE,YEAR_BUILT,ADDRESS
A,2021-01-01,200000,1950,1 ELM ST
B,2021-02-01,210000,9999,2 ELM ST
C,2021-03-01,\"$90,000\",0,3 ELM ST
D,1900-01-01,1000,1970,4 ELM ST
";
        let report = build_report(&analysis_for(csv), &[]);
        assert!(report.contains("BELOW-MARKET SALES"));
        assert!(report.contains("Sales with a price: 3"));
        assert!(report.contains("Median sale price: $200000"));
        assert!(report.contains("Sales below 70% of median ($140000): 1"));
        assert!(report.contains("  $90000 on 2021-03-01: C (3 ELM ST)"));
        assert!(report.contains("Properties with YEAR_BUILT 9999: 1"));
        assert!(report.contains("Properties with impossible YEAR_BUILT: 2"));
        assert!(report.contains("Sales dated 1900: 1"));
    }

    #[test]
    fn risk_section_respects_limit() {
        let assessments: Vec<RiskAssessment> = (0..20)
            .map(|i| RiskAssessment {
                owner: format!("OWNER {i} LLC"),
                properties: 25,
                risk_score: 3,
                risk_factors: vec!["large portfolio (25 properties)".into(), "corporate entity".into()],
            })
            .collect();

        let mut output = String::new();
        write_risk(&mut output, &assessments, REPORTED_OWNERS);
        assert!(output.contains("HIGH RISK OWNERS IDENTIFIED: 20"));
        assert!(output.contains("15. OWNER 14 LLC"));
        assert!(!output.contains("OWNER 15 LLC"));
    }
}
